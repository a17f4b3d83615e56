pub mod client;
pub mod export;
pub mod metrics;
pub mod profile;
pub mod service;
pub mod transport;

pub use client::{GithubApiError, GithubClient, IssuePage, RestGithubClient};
pub use profile::{profile_source, ProfileSource};
pub use service::{HarvestError, Harvester};
pub use transport::{HttpExec, ReqwestExecutor};
