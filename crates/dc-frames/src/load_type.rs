//! Load-type tags keying an entity's `data` map.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which statistical view of load data a `data` entry holds.
///
/// `Default` is the raw interval series; the others are 288 aggregates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadType {
    Default,
    Total,
    Average,
    Maximum,
    Minimum,
    Count,
}

impl LoadType {
    pub const ALL: [LoadType; 6] = [
        LoadType::Default,
        LoadType::Total,
        LoadType::Average,
        LoadType::Maximum,
        LoadType::Minimum,
        LoadType::Count,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LoadType::Default => "default",
            LoadType::Total => "total",
            LoadType::Average => "average",
            LoadType::Maximum => "maximum",
            LoadType::Minimum => "minimum",
            LoadType::Count => "count",
        }
    }
}

impl FromStr for LoadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoadType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown load type: {s}"))
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_tag() {
        for t in LoadType::ALL {
            assert_eq!(t.as_str().parse::<LoadType>().unwrap(), t);
        }
        assert!("median".parse::<LoadType>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&LoadType::Maximum).unwrap();
        assert_eq!(json, "\"maximum\"");
    }
}
