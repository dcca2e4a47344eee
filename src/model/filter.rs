use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named predicate classifying a task's due date relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBucket {
    #[default]
    All,
    Today,
    Past,
    Tomorrow,
    NextWeek,
    NextMonth,
    TodayOrBefore,
}

impl DateBucket {
    pub const ALL: [DateBucket; 7] = [
        DateBucket::All,
        DateBucket::Today,
        DateBucket::Past,
        DateBucket::Tomorrow,
        DateBucket::NextWeek,
        DateBucket::NextMonth,
        DateBucket::TodayOrBefore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DateBucket::All => "all",
            DateBucket::Today => "today",
            DateBucket::Past => "past",
            DateBucket::Tomorrow => "tomorrow",
            DateBucket::NextWeek => "next_week",
            DateBucket::NextMonth => "next_month",
            DateBucket::TodayOrBefore => "today_or_before",
        }
    }

    /// Like `FromStr`, but unrecognized names select `All`.
    pub fn from_name_lenient(s: &str) -> DateBucket {
        s.parse().unwrap_or(DateBucket::All)
    }
}

impl fmt::Display for DateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown date bucket '{0}'")]
pub struct ParseBucketError(String);

impl FromStr for DateBucket {
    type Err = ParseBucketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        DateBucket::ALL
            .into_iter()
            .find(|b| b.name() == normalized)
            .ok_or_else(|| ParseBucketError(s.to_string()))
    }
}

/// Display filter: three orthogonal knobs, never persisted on tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub bucket: DateBucket,
    /// Case-insensitive substring; empty passes everything
    pub text: String,
    pub exclude_hourly_snooze: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            bucket: DateBucket::All,
            text: String::new(),
            exclude_hourly_snooze: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_names_round_trip() {
        for b in DateBucket::ALL {
            assert_eq!(b.name().parse::<DateBucket>().unwrap(), b);
        }
    }

    #[test]
    fn bucket_accepts_dashes() {
        assert_eq!(
            "next-week".parse::<DateBucket>().unwrap(),
            DateBucket::NextWeek
        );
    }

    #[test]
    fn unknown_bucket_is_lenient_all() {
        assert!("someday".parse::<DateBucket>().is_err());
        assert_eq!(DateBucket::from_name_lenient("someday"), DateBucket::All);
    }
}
