use serde::Deserialize;

use crate::models::IssueState;

/// The subset of an issue object the harvest reads. Timestamps stay as text
/// so that a malformed value degrades to a missing field instead of failing
/// the whole page.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuePayload {
    #[serde(default)]
    pub number: Option<i64>,
    pub state: IssueState,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}
