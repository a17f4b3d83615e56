use anyhow::{anyhow, Result};
use common::text::{non_blank, split_first_name, split_last_name};
use tracing::debug;

use crate::models::{Profile, SupportRequest};
use crate::payloads::{IssuePayload, UserPayload};
use crate::timefmt::{floor_days, parse_timestamp};

pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Applies the profile defaults: the login stands in for a missing display
/// name, and `"Unknown"` for a missing location.
pub fn normalize_user(payload: &UserPayload) -> Profile {
    profile_with_defaults(
        &payload.login,
        payload.name.as_deref(),
        payload.location.as_deref(),
    )
}

pub fn profile_with_defaults(login: &str, name: Option<&str>, location: Option<&str>) -> Profile {
    Profile {
        real_name: non_blank(name).unwrap_or(login).trim().to_string(),
        location: non_blank(location)
            .unwrap_or(UNKNOWN_LOCATION)
            .trim()
            .to_string(),
    }
}

/// Login of the issue author, required for the profile join.
pub fn author_login(payload: &IssuePayload) -> Result<&str> {
    payload
        .user
        .as_ref()
        .map(|user| user.login.as_str())
        .ok_or_else(|| match payload.number {
            Some(number) => anyhow!("issue #{number} has no author"),
            None => anyhow!("issue without number has no author"),
        })
}

/// Builds the export record for one matched issue and its author's profile,
/// including the derived duration and name fields.
pub fn normalize_issue(payload: &IssuePayload, profile: &Profile) -> Result<SupportRequest> {
    let user_id = author_login(payload)?.to_string();
    let created_at = payload.created_at.as_deref().and_then(parse_timestamp);
    let closed_at = payload.closed_at.as_deref().and_then(parse_timestamp);
    if created_at.is_none() {
        debug!(number = ?payload.number, raw = ?payload.created_at, "unparseable created_at");
    }

    let duration = match (created_at, closed_at) {
        (Some(created), Some(closed)) => Some(closed - created),
        _ => None,
    };
    let real_name = Some(profile.real_name.clone());

    Ok(SupportRequest {
        state: payload.state,
        created_at,
        closed_at,
        user_id,
        last_name: split_last_name(real_name.as_deref()),
        first_name: split_first_name(real_name.as_deref()),
        real_name,
        location: Some(profile.location.clone()),
        duration,
        duration_days: duration.map(floor_days),
    })
}
