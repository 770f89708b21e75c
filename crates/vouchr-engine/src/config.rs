//! Engine tuning.

/// Default stock count at or below which a product is reported as low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 10;

/// Default units per batch call.
pub const DEFAULT_BATCH_CHUNK_SIZE: u32 = 10;

/// Default candidates tried per code before giving up.
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 5;

/// Default cap on units in a single purchase call.
pub const DEFAULT_MAX_UNITS_PER_CALL: u64 = 100;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Stock at or below this count is flagged `is_low_stock`.
    pub low_stock_threshold: u64,

    /// Units issued per batch call.
    pub batch_chunk_size: u32,

    /// Candidates generated per unit before `CodeGenerationExhausted`.
    pub max_code_attempts: u32,

    /// Largest purchase accepted in one transaction. Bigger orders go through
    /// the batch controller.
    pub max_units_per_call: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            batch_chunk_size: DEFAULT_BATCH_CHUNK_SIZE,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
            max_units_per_call: DEFAULT_MAX_UNITS_PER_CALL,
        }
    }
}
