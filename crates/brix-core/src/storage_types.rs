use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage strategy selected at startup.
///
/// Defined in core because it is used by both configuration and the storage
/// factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStrategy {
    Local,
    Cloud,
}

impl FromStr for StorageStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageStrategy::Local),
            "cloud" => Ok(StorageStrategy::Cloud),
            _ => Err(anyhow::anyhow!("Invalid storage strategy: {}", s)),
        }
    }
}

impl Display for StorageStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageStrategy::Local => write!(f, "local"),
            StorageStrategy::Cloud => write!(f, "cloud"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        assert_eq!(
            "local".parse::<StorageStrategy>().unwrap(),
            StorageStrategy::Local
        );
        assert_eq!(
            "CLOUD".parse::<StorageStrategy>().unwrap(),
            StorageStrategy::Cloud
        );
        assert!("s3".parse::<StorageStrategy>().is_err());
        assert_eq!(StorageStrategy::Local.to_string(), "local");
    }
}
