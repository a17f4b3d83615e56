use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use common::config::HarvesterConfig;
use futures::{StreamExt, TryStreamExt};
use normalizer::transform::author_login;
use normalizer::{is_label_match, normalize_issue, IssuePayload, Profile, SupportRequest};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use crate::client::GithubClient;
use crate::metrics;
use crate::profile::ProfileSource;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("profile lookup failed for {login}")]
    Profile {
        login: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("malformed issue payload at position {index}")]
    Payload {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Full re-scrape of one repository's support requests. Every failure is
/// fatal; nothing is returned unless all pages and profiles were fetched.
pub struct Harvester {
    config: HarvesterConfig,
    client: Arc<dyn GithubClient>,
    profiles: Arc<dyn ProfileSource>,
}

impl Harvester {
    pub fn new(
        config: HarvesterConfig,
        client: Arc<dyn GithubClient>,
        profiles: Arc<dyn ProfileSource>,
    ) -> Self {
        Self {
            config,
            client,
            profiles,
        }
    }

    #[instrument(skip(self), fields(repository = %self.config.repository))]
    pub async fn run_once(&self) -> Result<Vec<SupportRequest>> {
        let issues = self.fetch_all_issues().await?;
        let matched = self.select_matching(issues);
        let records = self.build_record_set(&matched).await?;
        info!(records = records.len(), "harvest complete");
        Ok(records)
    }

    /// Follows `next` links until the tracker stops returning one.
    pub async fn fetch_all_issues(&self) -> Result<Vec<Value>> {
        let mut issues = Vec::new();
        let mut cursor: Option<Url> = None;
        let mut page = 1u32;
        loop {
            let batch = self
                .client
                .list_repo_issues(&self.config.repository, cursor.as_ref(), self.config.per_page)
                .await?;
            metrics::PAGES_FETCHED_TOTAL.inc();
            metrics::ISSUES_SEEN_TOTAL.inc_by(batch.items.len() as u64);
            info!(page, items = batch.items.len(), "fetched issue page");
            issues.extend(batch.items);

            match batch.next {
                Some(next) => {
                    cursor = Some(next);
                    page += 1;
                }
                None => break,
            }
        }
        Ok(issues)
    }

    pub fn select_matching(&self, issues: Vec<Value>) -> Vec<Value> {
        let total = issues.len();
        let matched: Vec<Value> = issues
            .into_iter()
            .filter(|issue| is_label_match(issue, &self.config.label_description))
            .collect();
        metrics::ISSUES_MATCHED_TOTAL.inc_by(matched.len() as u64);
        info!(
            total,
            matched = matched.len(),
            label = %self.config.label_description,
            "filtered issues by first label"
        );
        matched
    }

    /// Joins each matched issue to its author's profile, preserving input
    /// order. Each distinct author is looked up once.
    pub async fn build_record_set(&self, matched: &[Value]) -> Result<Vec<SupportRequest>> {
        let payloads = matched
            .iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value::<IssuePayload>(value.clone())
                    .map_err(|source| HarvestError::Payload { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut logins: Vec<String> = Vec::new();
        for payload in &payloads {
            let login = author_login(payload)?;
            if !logins.iter().any(|seen| seen == login) {
                logins.push(login.to_string());
            }
        }

        let profiles = self.fetch_profiles(logins).await?;
        payloads
            .iter()
            .map(|payload| {
                let login = author_login(payload)?;
                let profile = profiles
                    .get(login)
                    .ok_or_else(|| anyhow::anyhow!("no profile fetched for {login}"))?;
                normalize_issue(payload, profile)
            })
            .collect()
    }

    async fn fetch_profiles(&self, logins: Vec<String>) -> Result<HashMap<String, Profile>> {
        let profiles = self.profiles.clone();
        let concurrency = self.config.profile_concurrency.max(1);
        let fetched: Vec<(String, Profile)> = futures::stream::iter(logins)
            .map(|login| {
                let profiles = profiles.clone();
                async move {
                    match profiles.fetch_profile(&login).await {
                        Ok(profile) => {
                            metrics::PROFILES_FETCHED_TOTAL
                                .with_label_values(&[profiles.kind()])
                                .inc();
                            debug!(login = %login, location = %profile.location, "fetched profile");
                            Ok((login, profile))
                        }
                        Err(source) => Err(HarvestError::Profile { login, source }),
                    }
                }
            })
            .buffered(concurrency)
            .try_collect()
            .await?;
        Ok(fetched.into_iter().collect())
    }
}
