pub mod labels;
pub mod models;
pub mod payloads;
pub mod timefmt;
pub mod transform;

pub use labels::is_label_match;
pub use models::{IssueState, Profile, SupportRequest};
pub use payloads::{IssuePayload, UserPayload, UserRef};
pub use transform::{normalize_issue, normalize_user};
