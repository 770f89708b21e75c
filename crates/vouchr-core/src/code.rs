//! Redemption codes and the code generator.
//!
//! Codes are short and human-typeable: a literal family prefix followed by
//! characters drawn from [`ALPHABET`]. Generation is a pure function of the
//! random source and does not guarantee uniqueness; callers check the issued
//! code store before committing and retry on collision.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters a generated code may contain after its prefix.
pub const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Longest code any family produces.
pub const MAX_CODE_LEN: usize = 32;

/// Shape of the codes of one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFormat {
    prefix: &'static str,
    length: usize,
}

impl CodeFormat {
    /// A format with a literal prefix and a fixed total length.
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a const) if the prefix leaves no
    /// room for random characters.
    #[must_use]
    pub const fn new(prefix: &'static str, length: usize) -> Self {
        assert!(prefix.len() < length && length <= MAX_CODE_LEN);
        Self { prefix, length }
    }

    /// The literal prefix.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Total code length, prefix included.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Number of random characters after the prefix.
    #[must_use]
    pub const fn random_len(&self) -> usize {
        self.length - self.prefix.len()
    }

    /// Check whether `candidate` has this format.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        candidate.len() == self.length
            && candidate.starts_with(self.prefix)
            && candidate.bytes().skip(self.prefix.len()).all(|b| ALPHABET.contains(&b))
    }
}

/// Generates codes of one format from any random source.
#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator {
    format: CodeFormat,
}

impl CodeGenerator {
    /// Create a generator for a format.
    #[must_use]
    pub const fn new(format: CodeFormat) -> Self {
        Self { format }
    }

    /// The format this generator produces.
    #[must_use]
    pub const fn format(&self) -> CodeFormat {
        self.format
    }

    /// Draw one code.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> RedemptionCode {
        let mut code = String::with_capacity(self.format.length);
        code.push_str(self.format.prefix);
        for _ in 0..self.format.random_len() {
            let idx = rng.gen_range(0..ALPHABET.len());
            code.push(char::from(ALPHABET[idx]));
        }
        RedemptionCode(code)
    }
}

/// A redeemable code.
///
/// Parsing normalizes to uppercase and trims surrounding whitespace, since
/// codes are typed in by hand.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RedemptionCode(String);

impl RedemptionCode {
    /// Borrow the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for RedemptionCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        if normalized.is_empty() || normalized.len() > MAX_CODE_LEN {
            return Err(CodeError::InvalidLength(normalized.len()));
        }
        if let Some(bad) = normalized.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(CodeError::InvalidCharacter(bad));
        }
        Ok(Self(normalized))
    }
}

impl fmt::Debug for RedemptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedemptionCode({})", self.0)
    }
}

impl fmt::Display for RedemptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RedemptionCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RedemptionCode> for String {
    fn from(code: RedemptionCode) -> Self {
        code.0
    }
}

/// Errors parsing a code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    /// Empty or longer than [`MAX_CODE_LEN`].
    #[error("invalid code length: {0}")]
    InvalidLength(usize),

    /// Contains a character outside `A-Z0-9`.
    #[error("invalid character in code: {0:?}")]
    InvalidCharacter(char),
}
