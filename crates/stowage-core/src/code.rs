//! Code generation for stored files.
//!
//! A `Code` is the service-generated identifier that doubles as the external
//! reference for a file and as the object-key material. It is generated from
//! a UUID v4 (122 random bits), so the collision probability at any realistic
//! record volume is negligible; actual uniqueness is still enforced by the
//! metadata store's unique index, never assumed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

const MAX_CODE_LEN: usize = 64;

/// Validated file code. Lowercase `[a-z0-9-]`, non-empty, at most 64 chars,
/// safe to embed in object keys and URLs without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Code {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AppError::InvalidInput("Code must not be empty".to_string()));
        }
        if s.len() > MAX_CODE_LEN {
            return Err(AppError::InvalidInput(format!(
                "Code must be at most {} characters",
                MAX_CODE_LEN
            )));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(AppError::InvalidInput(format!(
                "Code '{}' contains characters outside [a-z0-9-]",
                s
            )));
        }
        Ok(Code(s.to_string()))
    }
}

impl TryFrom<String> for Code {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}

/// Source of fresh codes. No external state is consulted; implementations
/// draw from an internal entropy source and report `EntropyUnavailable` if
/// that source fails.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> Result<Code, AppError>;
}

/// Default generator: UUID v4 rendered without hyphens.
#[derive(Debug, Clone, Default)]
pub struct UuidCodeGenerator;

impl CodeGenerator for UuidCodeGenerator {
    fn generate(&self) -> Result<Code, AppError> {
        let uuid = Uuid::new_v4();
        Ok(Code(uuid.simple().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_codes_are_valid_and_distinct() {
        let generator = UuidCodeGenerator;
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let code = generator.generate().unwrap();
            assert_eq!(code.as_str().len(), 32);
            assert!(code.as_str().parse::<Code>().is_ok());
            assert!(seen.insert(code));
        }
    }

    #[test]
    fn test_code_rejects_empty() {
        assert!("".parse::<Code>().is_err());
    }

    #[test]
    fn test_code_rejects_unsafe_characters() {
        assert!("Abc".parse::<Code>().is_err());
        assert!("a/b".parse::<Code>().is_err());
        assert!("a b".parse::<Code>().is_err());
        assert!("a..b".parse::<Code>().is_err());
        assert!("a%2f".parse::<Code>().is_err());
    }

    #[test]
    fn test_code_rejects_overlong() {
        let long = "a".repeat(65);
        assert!(long.parse::<Code>().is_err());
        let max = "a".repeat(64);
        assert!(max.parse::<Code>().is_ok());
    }

    #[test]
    fn test_code_roundtrips_through_serde() {
        let code: Code = "abc-123".parse().unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"abc-123\"");
        let back: Code = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<Code>("\"NOT VALID\"").is_err());
    }
}
