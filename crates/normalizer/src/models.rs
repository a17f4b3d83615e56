use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::timefmt::{serde_duration, serde_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public profile attributes of an issue author, defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub real_name: String,
    pub location: String,
}

/// One harvested support request. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportRequest {
    pub state: IssueState,
    #[serde(with = "serde_timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(with = "serde_timestamp")]
    pub closed_at: Option<NaiveDateTime>,
    pub user_id: String,
    pub real_name: Option<String>,
    pub location: Option<String>,
    pub last_name: String,
    pub first_name: String,
    #[serde(with = "serde_duration")]
    pub duration: Option<Duration>,
    pub duration_days: Option<i64>,
}
