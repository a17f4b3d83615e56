use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use common::config::GithubConfig;
use http::{header, HeaderValue, Request, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::transport::HttpExec;
use crate::metrics;

const JSON_ACCEPT: &str = "application/vnd.github.v3+json";
const HTML_ACCEPT: &str = "text/html";

#[derive(Debug, Error)]
pub enum GithubApiError {
    #[error("github api error: {status} for {endpoint}")]
    Http {
        status: StatusCode,
        endpoint: String,
    },
}

impl GithubApiError {
    pub fn status(status: StatusCode, endpoint: impl Into<String>) -> Self {
        Self::Http {
            status,
            endpoint: endpoint.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match *self {
            GithubApiError::Http { status, .. } => status,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            GithubApiError::Http { endpoint, .. } => endpoint.as_str(),
        }
    }
}

/// One page of the issue listing plus the `rel="next"` target, if any.
#[derive(Debug, Clone)]
pub struct IssuePage {
    pub items: Vec<Value>,
    pub next: Option<Url>,
}

#[async_trait]
pub trait GithubClient: Send + Sync {
    /// Fetches the first page when `cursor` is `None`, otherwise the page the
    /// cursor points at.
    async fn list_repo_issues(
        &self,
        repository: &str,
        cursor: Option<&Url>,
        per_page: u32,
    ) -> Result<IssuePage>;
    async fn get_user(&self, login: &str) -> Result<Value>;
    async fn get_profile_page(&self, login: &str) -> Result<String>;
}

pub struct RestGithubClient {
    exec: Arc<dyn HttpExec>,
    api_base: Url,
    web_base: Url,
    user_agent: String,
    token: Option<String>,
}

impl RestGithubClient {
    pub fn new(exec: Arc<dyn HttpExec>, config: &GithubConfig) -> Result<Self> {
        Ok(Self {
            exec,
            api_base: Url::parse(&config.api_base_url).context("github.api_base_url")?,
            web_base: Url::parse(&config.web_base_url).context("github.web_base_url")?,
            user_agent: config.user_agent.clone(),
            token: config.token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    #[instrument(skip(self, url, accept), fields(url = %url))]
    async fn get(&self, op: &'static str, url: Url, accept: &str) -> Result<Response<Vec<u8>>> {
        let endpoint = url.path().trim_start_matches('/').to_string();
        debug!(endpoint = %endpoint, "Dispatching GitHub request");

        let mut builder = Request::builder()
            .method("GET")
            .uri(url.as_str())
            .header(header::USER_AGENT, self.user_agent.as_str())
            .header(header::ACCEPT, accept);
        if let Some(token) = &self.token {
            builder = builder.header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))?,
            );
        }
        let request = builder.body(Vec::new())?;

        let start = Instant::now();
        let result = self.exec.execute(request).await;
        metrics::REQUEST_LATENCY_SECONDS
            .with_label_values(&[op])
            .observe(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(resp) => resp,
            Err(err) => {
                metrics::REQUEST_FAILURES_TOTAL.with_label_values(&[op]).inc();
                return Err(err.context(format!("requesting {endpoint}")));
            }
        };
        let status = response.status();
        if !status.is_success() {
            metrics::REQUEST_FAILURES_TOTAL.with_label_values(&[op]).inc();
            return Err(GithubApiError::status(status, endpoint).into());
        }
        Ok(response)
    }

    fn join_api(&self, path: &str) -> Result<Url> {
        Ok(self.api_base.join(path)?)
    }

    fn with_query(url: &mut Url, params: &[(&str, String)]) {
        let mut query_pairs = url.query_pairs_mut();
        for (key, val) in params {
            query_pairs.append_pair(key, val);
        }
    }
}

#[async_trait]
impl GithubClient for RestGithubClient {
    async fn list_repo_issues(
        &self,
        repository: &str,
        cursor: Option<&Url>,
        per_page: u32,
    ) -> Result<IssuePage> {
        let url = match cursor {
            Some(next) => next.clone(),
            None => {
                let mut url = self.join_api(&format!("repos/{repository}/issues"))?;
                Self::with_query(
                    &mut url,
                    &[("state", "all".to_string()), ("per_page", per_page.to_string())],
                );
                url
            }
        };

        let response = self.get("issues", url, JSON_ACCEPT).await?;
        let next = response
            .headers()
            .get(header::LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_next_link)
            .map(|target| Url::parse(&target))
            .transpose()
            .context("invalid next link")?;
        let items = match serde_json::from_slice::<Value>(response.body())? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            _ => return Err(anyhow!("expected array response")),
        };
        Ok(IssuePage { items, next })
    }

    async fn get_user(&self, login: &str) -> Result<Value> {
        let url = self.join_api(&format!("users/{login}"))?;
        let response = self.get("user", url, JSON_ACCEPT).await?;
        Ok(serde_json::from_slice(response.body())?)
    }

    async fn get_profile_page(&self, login: &str) -> Result<String> {
        let url = self.web_base.join(login)?;
        let response = self.get("profile_page", url, HTML_ACCEPT).await?;
        Ok(String::from_utf8_lossy(response.body()).into_owned())
    }
}

/// Returns the target of the `rel="next"` entry in an RFC 8288 `Link` header.
pub fn parse_next_link(header: &str) -> Option<String> {
    let mut rest = header;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        let close = after.find('>')?;
        let target = &after[..close];
        let tail = &after[close + 1..];
        let params = tail.find('<').map_or(tail, |next| &tail[..next]);
        let is_next = params.split(';').any(|param| {
            let param = param.trim().trim_end_matches(',').trim();
            param
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"'))
                .map_or(false, |rel| {
                    rel.split_whitespace()
                        .any(|r| r.eq_ignore_ascii_case("next"))
                })
        });
        if is_next {
            return Some(target.to_string());
        }
        rest = tail;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_next_among_several_relations() {
        let header = concat!(
            "<https://api.github.com/repositories/1/issues?page=1>; rel=\"prev\", ",
            "<https://api.github.com/repositories/1/issues?page=3>; rel=\"next\", ",
            "<https://api.github.com/repositories/1/issues?page=9>; rel=\"last\""
        );
        assert_eq!(
            parse_next_link(header).as_deref(),
            Some("https://api.github.com/repositories/1/issues?page=3")
        );
    }

    #[test]
    fn last_page_has_no_next() {
        let header = "<https://api.github.com/x?page=1>; rel=\"first\", <https://api.github.com/x?page=8>; rel=\"prev\"";
        assert_eq!(parse_next_link(header), None);
        assert_eq!(parse_next_link(""), None);
    }

    #[test]
    fn relation_lists_and_unquoted_values() {
        assert_eq!(
            parse_next_link("<https://h/a?page=2>; rel=\"last next\"").as_deref(),
            Some("https://h/a?page=2")
        );
        assert_eq!(
            parse_next_link("<https://h/a?page=2>; rel=next").as_deref(),
            Some("https://h/a?page=2")
        );
    }
}
