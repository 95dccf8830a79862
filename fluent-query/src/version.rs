//! Server version and the capabilities derived from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// A `major.minor` server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl ServerVersion {
    /// First version with the native `$count` aggregation stage.
    pub const COUNT_STAGE: ServerVersion = ServerVersion::new(3, 4);

    /// Create a version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse `"major.minor[.patch][-suffix]"`.
    pub fn parse(s: &str) -> Result<Self, QueryError> {
        let mut parts = s.trim().split('.');
        let mut next = |what: &str| -> Result<u32, QueryError> {
            let raw = parts.next().unwrap_or("0");
            let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
            digits
                .parse()
                .map_err(|_| QueryError::config(format!("invalid {} version in '{}'", what, s)))
        };
        let major = next("major")?;
        let minor = next("minor")?;
        Ok(Self { major, minor })
    }

    /// Whether the server understands the `$count` stage.
    pub fn supports_count_stage(&self) -> bool {
        *self >= Self::COUNT_STAGE
    }
}

impl Default for ServerVersion {
    fn default() -> Self {
        Self::COUNT_STAGE
    }
}

impl FromStr for ServerVersion {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ServerVersion::parse("3.2.22").unwrap(), ServerVersion::new(3, 2));
        assert_eq!(ServerVersion::parse("7.0.4-rc1").unwrap(), ServerVersion::new(7, 0));
        assert_eq!(ServerVersion::parse("4").unwrap(), ServerVersion::new(4, 0));
        assert!(ServerVersion::parse("x.y").is_err());
    }

    #[test]
    fn test_count_stage_support() {
        assert!(!ServerVersion::new(3, 2).supports_count_stage());
        assert!(ServerVersion::new(3, 4).supports_count_stage());
        assert!(ServerVersion::new(10, 0).supports_count_stage());
    }

    #[test]
    fn test_display() {
        assert_eq!(ServerVersion::new(6, 0).to_string(), "6.0");
        assert_eq!("5.0.1".parse::<ServerVersion>().unwrap().to_string(), "5.0");
    }
}
