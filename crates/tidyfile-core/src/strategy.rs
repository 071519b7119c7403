//! Keep-strategy names.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::TidyError;

/// Policy for choosing the single file to retain from a duplicate group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum KeepStrategy {
    /// Minimum modification time; ties broken by shortest, then lexicographic path.
    #[default]
    KeepOldest,
    /// Maximum modification time; same tie-break as `KeepOldest`.
    KeepNewest,
    /// Fewest path characters; ties broken by oldest, then lexicographic path.
    KeepShortestPath,
    /// First member in discovery order.
    KeepFirst,
}

impl KeepStrategy {
    /// Parse a strategy name, reporting unknown names as configuration errors.
    pub fn parse(name: &str) -> Result<Self, TidyError> {
        Self::from_str(name.trim()).map_err(|_| {
            TidyError::config(format!(
                "unknown keep strategy '{name}' (expected keep_oldest, keep_newest, keep_shortest_path or keep_first)"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_names_round_trip() {
        for strategy in KeepStrategy::iter() {
            assert_eq!(KeepStrategy::parse(&strategy.to_string()).unwrap(), strategy);
        }
        assert_eq!(KeepStrategy::KeepShortestPath.to_string(), "keep_shortest_path");
    }

    #[test]
    fn test_unknown_name_is_configuration_error() {
        let err = KeepStrategy::parse("keep_largest").unwrap_err();
        assert!(matches!(err, TidyError::Configuration { .. }));
    }
}
