use serde::{Deserialize, Serialize};
use std::fmt;

/// Which fields a candidate record must carry to be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Category and amount.
    #[default]
    Lenient,
    /// Category, amount, date and transaction id.
    Strict,
}

/// What the extractor does when a body carries no recognizable date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Stamp the record with the processing time.
    #[default]
    Synthesize,
    /// Leave the date empty so the validator rejects the record.
    Reject,
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationPolicy::Lenient => write!(f, "lenient"),
            ValidationPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for ValidationPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(ValidationPolicy::Lenient),
            "strict" => Ok(ValidationPolicy::Strict),
            other => Err(format!("Unknown validation policy: '{other}'")),
        }
    }
}

impl fmt::Display for DatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatePolicy::Synthesize => write!(f, "synthesize"),
            DatePolicy::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for DatePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "synthesize" => Ok(DatePolicy::Synthesize),
            "reject" => Ok(DatePolicy::Reject),
            other => Err(format!("Unknown date policy: '{other}'")),
        }
    }
}
