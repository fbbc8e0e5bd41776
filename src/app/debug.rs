//! Debug levels and level comparison.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InvalidValueError;

/// How much diagnostic detail the application may expose.
///
/// Levels are ordered `Dev < Test < Beta < Prod`. Configuration may name a
/// level (`"beta"`) or give its numeric code (`1015`); only the ordering is
/// meaningful.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    Dev = 1005,
    Test = 1010,
    Beta = 1015,
    #[default]
    Prod = 1020,
}

impl DebugLevel {
    /// Numeric code of the level.
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Evaluate `self <op> other`.
    ///
    /// Accepted operators: `>`, `>=`, `<`, `<=`, `==`, `===`, `!=`.
    pub fn compare(self, op: &str, other: DebugLevel) -> Result<bool, InvalidValueError> {
        let op: CompareOp = op.parse()?;
        Ok(op.evaluate(self.cmp(&other)))
    }
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DebugLevel::Dev => "dev",
            DebugLevel::Test => "test",
            DebugLevel::Beta => "beta",
            DebugLevel::Prod => "prod",
        };
        f.write_str(name)
    }
}

impl FromStr for DebugLevel {
    type Err = InvalidValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "1005" => Ok(DebugLevel::Dev),
            "test" | "1010" => Ok(DebugLevel::Test),
            "beta" | "1015" => Ok(DebugLevel::Beta),
            "prod" | "1020" => Ok(DebugLevel::Prod),
            _ => Err(InvalidValueError::DebugLevel(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for DebugLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u16),
            Name(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Code(code) => code.to_string(),
            Raw::Name(name) => name,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Comparison operator accepted by [`DebugLevel::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    fn evaluate(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
        }
    }
}

impl FromStr for CompareOp {
    type Err = InvalidValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            "==" | "===" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            other => Err(InvalidValueError::CompareOperator(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(DebugLevel::Dev < DebugLevel::Test);
        assert!(DebugLevel::Test < DebugLevel::Beta);
        assert!(DebugLevel::Beta < DebugLevel::Prod);
        assert_eq!(DebugLevel::default(), DebugLevel::Prod);
        assert_eq!(DebugLevel::Beta.code(), 1015);
    }

    #[test]
    fn test_compare_all_operators() {
        let prod = DebugLevel::Prod;
        let dev = DebugLevel::Dev;
        assert!(prod.compare(">", dev).unwrap());
        assert!(prod.compare(">=", dev).unwrap());
        assert!(prod.compare(">=", prod).unwrap());
        assert!(!prod.compare("<", dev).unwrap());
        assert!(dev.compare("<", prod).unwrap());
        assert!(dev.compare("<=", dev).unwrap());
        assert!(!prod.compare("<=", dev).unwrap());
        assert!(prod.compare("==", prod).unwrap());
        assert!(prod.compare("===", prod).unwrap());
        assert!(!prod.compare("==", dev).unwrap());
        assert!(prod.compare("!=", dev).unwrap());
        assert!(!dev.compare("!=", dev).unwrap());
    }

    #[test]
    fn test_compare_rejects_unknown_operator() {
        assert_eq!(
            DebugLevel::Prod.compare("~=", DebugLevel::Dev),
            Err(InvalidValueError::CompareOperator("~=".into()))
        );
        assert!(DebugLevel::Prod.compare("", DebugLevel::Dev).is_err());
        assert!(DebugLevel::Prod.compare("=>", DebugLevel::Dev).is_err());
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!("DEV".parse::<DebugLevel>().unwrap(), DebugLevel::Dev);
        assert_eq!("1015".parse::<DebugLevel>().unwrap(), DebugLevel::Beta);
        assert!("staging".parse::<DebugLevel>().is_err());
    }
}
