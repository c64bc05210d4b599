//! Check modes, filter modes and output routing of check results

use serde::{Deserialize, Serialize};
use std::fmt;

use eightkit_core::{Error, Result, ValueCheck};

/// Whether one value or a list of values is checked per item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    Single,
    Bulk,
}

impl CheckMode {
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "single" => Ok(CheckMode::Single),
            "bulk" => Ok(CheckMode::Bulk),
            other => Err(Error::validation(format!(
                "Invalid mode: {}. Must be 'single' or 'bulk'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckMode::Single => "single",
            CheckMode::Bulk => "bulk",
        }
    }
}

/// Which checked items survive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterMode {
    #[default]
    All,
    Existing,
    NonExisting,
}

impl FilterMode {
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "all" => Ok(FilterMode::All),
            "existing" => Ok(FilterMode::Existing),
            "nonExisting" => Ok(FilterMode::NonExisting),
            other => Err(Error::invalid_parameter(
                "filterMode",
                format!("must be 'all', 'existing' or 'nonExisting', got '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Existing => "existing",
            FilterMode::NonExisting => "nonExisting",
        }
    }

    /// Whether a value with the given existence is kept
    pub fn keeps(&self, exists: bool) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Existing => exists,
            FilterMode::NonExisting => !exists,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How check results reach the node outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckRouting {
    /// Output 0 = existing, output 1 = non-existing; nothing is suppressed
    DualChannelByExistence,
    /// Output 0 only; the filter mode suppresses items
    SingleChannelWithFilter(FilterMode),
}

impl CheckRouting {
    pub fn output_count(&self) -> usize {
        match self {
            CheckRouting::DualChannelByExistence => 2,
            CheckRouting::SingleChannelWithFilter(_) => 1,
        }
    }

    /// Output of a single-value check, `None` when suppressed
    pub fn route(&self, exists: bool) -> Option<usize> {
        match self {
            CheckRouting::DualChannelByExistence => Some(if exists { 0 } else { 1 }),
            CheckRouting::SingleChannelWithFilter(filter) => filter.keeps(exists).then_some(0),
        }
    }

    /// Group bulk checks per output, preserving order.
    ///
    /// Dual routing yields up to two groups and never an empty one. Single
    /// routing yields one filtered group; an empty group only survives
    /// under [`FilterMode::All`].
    pub fn split<'a>(&self, checks: &'a [ValueCheck]) -> Vec<(usize, Vec<&'a ValueCheck>)> {
        match self {
            CheckRouting::DualChannelByExistence => {
                let (existing, missing): (Vec<_>, Vec<_>) = checks.iter().partition(|c| c.exists);
                [(0, existing), (1, missing)]
                    .into_iter()
                    .filter(|(_, group)| !group.is_empty())
                    .collect()
            }
            CheckRouting::SingleChannelWithFilter(filter) => {
                let kept: Vec<_> = checks.iter().filter(|c| filter.keeps(c.exists)).collect();
                if kept.is_empty() && *filter != FilterMode::All {
                    Vec::new()
                } else {
                    vec![(0, kept)]
                }
            }
        }
    }
}
