//! Random sources for code generation.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;

use vouchr_core::{CodeFormat, CodeGenerator, RedemptionCode};

/// Produces candidate codes.
///
/// Candidates are not checked for uniqueness here; the coordinator verifies
/// each one against the code store inside its transaction.
pub trait CodeSource: Send + Sync {
    /// Draw one candidate in the given format.
    fn next_code(&self, format: CodeFormat) -> RedemptionCode;
}

/// Draws from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeSource;

impl CodeSource for RandomCodeSource {
    fn next_code(&self, format: CodeFormat) -> RedemptionCode {
        CodeGenerator::new(format).generate(&mut rand::thread_rng())
    }
}

/// Deterministic source for reproducible runs.
#[derive(Debug)]
pub struct SeededCodeSource {
    rng: Mutex<StdRng>,
}

impl SeededCodeSource {
    /// Create a source from a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl CodeSource for SeededCodeSource {
    fn next_code(&self, format: CodeFormat) -> RedemptionCode {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        CodeGenerator::new(format).generate(&mut *rng)
    }
}
