use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overall performance rating (fixed enumeration).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Excellent,
    Good,
    Satisfactory,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Unsatisfactory,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::Excellent,
        Rating::Good,
        Rating::Satisfactory,
        Rating::NeedsImprovement,
        Rating::Unsatisfactory,
    ];

    /// Label as stored and as submitted by the form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Satisfactory => "Satisfactory",
            Rating::NeedsImprovement => "Needs Improvement",
            Rating::Unsatisfactory => "Unsatisfactory",
        }
    }
}

impl core::fmt::Display for Rating {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown performance rating '{0}'")]
pub struct UnknownRating(pub String);

impl FromStr for Rating {
    type Err = UnknownRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Rating::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRating(s.to_string()))
    }
}
