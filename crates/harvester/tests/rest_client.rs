use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::config::{GithubConfig, HarvesterConfig, ProfileSourceKind};
use harvester::{profile_source, GithubApiError, GithubClient, Harvester, HttpExec, RestGithubClient};
use http::{header, Request, Response, StatusCode};
use serde_json::json;

const TARGET: &str = "Package name support requests";

struct Canned {
    status: StatusCode,
    link: Option<String>,
    body: String,
}

#[derive(Default)]
struct CannedExec {
    routes: HashMap<String, Canned>,
    seen: Mutex<Vec<(String, Option<String>)>>,
}

impl CannedExec {
    fn route(mut self, path_and_query: &str, status: StatusCode, link: Option<&str>, body: String) -> Self {
        self.routes.insert(
            path_and_query.to_string(),
            Canned {
                status,
                link: link.map(str::to_string),
                body,
            },
        );
        self
    }

    fn seen(&self) -> Vec<(String, Option<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpExec for CannedExec {
    async fn execute(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        let key = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default();
        let auth = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen.lock().unwrap().push((key.clone(), auth));

        let canned = self
            .routes
            .get(&key)
            .ok_or_else(|| anyhow!("no canned response for {key}"))?;
        let mut builder = Response::builder()
            .status(canned.status)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(link) = &canned.link {
            builder = builder.header(header::LINK, link.as_str());
        }
        Ok(builder.body(canned.body.clone().into_bytes())?)
    }
}

fn github_config(token: Option<&str>) -> GithubConfig {
    GithubConfig {
        api_base_url: "http://tracker.test/".into(),
        web_base_url: "http://web.test/".into(),
        token: token.map(str::to_string),
        user_agent: "harvester-tests".into(),
    }
}

fn harvester_config(kind: ProfileSourceKind) -> HarvesterConfig {
    HarvesterConfig {
        repository: "pypi/support".into(),
        label_description: TARGET.into(),
        per_page: 2,
        profile_source: kind,
        profile_concurrency: 1,
        output_path: "unused.csv".into(),
    }
}

fn issue(number: i64, login: &str, description: &str) -> serde_json::Value {
    json!({
        "number": number,
        "state": "open",
        "created_at": "2024-01-01T00:00:00Z",
        "closed_at": null,
        "user": {"login": login},
        "labels": [{"name": "x", "description": description}]
    })
}

fn next_link(page: u32) -> String {
    format!("<http://tracker.test/repositories/1/issues?state=all&per_page=2&page={page}>; rel=\"next\"")
}

fn paged_exec() -> CannedExec {
    CannedExec::default()
        .route(
            "/repos/pypi/support/issues?state=all&per_page=2",
            StatusCode::OK,
            Some(&next_link(2)),
            json!([issue(1, "alice", TARGET), issue(2, "bob", "Other")]).to_string(),
        )
        .route(
            "/repositories/1/issues?state=all&per_page=2&page=2",
            StatusCode::OK,
            Some(&next_link(3)),
            json!([issue(3, "carol", TARGET), issue(4, "alice", TARGET)]).to_string(),
        )
        .route(
            "/repositories/1/issues?state=all&per_page=2&page=3",
            StatusCode::OK,
            None,
            json!([issue(5, "dave", TARGET)]).to_string(),
        )
}

fn build(exec: Arc<CannedExec>, token: Option<&str>, kind: ProfileSourceKind) -> Harvester {
    let client: Arc<dyn GithubClient> =
        Arc::new(RestGithubClient::new(exec, &github_config(token)).expect("client"));
    let profiles = profile_source(kind, client.clone());
    Harvester::new(harvester_config(kind), client, profiles)
}

#[tokio::test]
async fn follows_next_links_until_exhausted() -> Result<()> {
    let exec = Arc::new(paged_exec());
    let harvester = build(exec.clone(), None, ProfileSourceKind::Api);

    let issues = harvester.fetch_all_issues().await?;
    let numbers: Vec<i64> = issues.iter().filter_map(|i| i["number"].as_i64()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(exec.seen().len(), 3);
    Ok(())
}

#[tokio::test]
async fn failing_page_aborts_with_status() {
    let exec = Arc::new(
        CannedExec::default()
            .route(
                "/repos/pypi/support/issues?state=all&per_page=2",
                StatusCode::OK,
                Some(&next_link(2)),
                json!([issue(1, "alice", TARGET)]).to_string(),
            )
            .route(
                "/repositories/1/issues?state=all&per_page=2&page=2",
                StatusCode::BAD_GATEWAY,
                None,
                json!({"message": "upstream"}).to_string(),
            ),
    );
    let harvester = build(exec, None, ProfileSourceKind::Api);

    let err = harvester.fetch_all_issues().await.unwrap_err();
    let api_err = err.downcast_ref::<GithubApiError>().expect("github api error");
    assert_eq!(api_err.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(api_err.endpoint(), "repositories/1/issues");
}

#[tokio::test]
async fn bearer_token_sent_only_when_configured() -> Result<()> {
    let exec = Arc::new(paged_exec());
    build(exec.clone(), Some("s3cret"), ProfileSourceKind::Api)
        .fetch_all_issues()
        .await?;
    assert!(exec
        .seen()
        .iter()
        .all(|(_, auth)| auth.as_deref() == Some("Bearer s3cret")));

    let anonymous = Arc::new(paged_exec());
    build(anonymous.clone(), None, ProfileSourceKind::Api)
        .fetch_all_issues()
        .await?;
    assert!(anonymous.seen().iter().all(|(_, auth)| auth.is_none()));
    Ok(())
}

#[tokio::test]
async fn full_run_over_api_profiles() -> Result<()> {
    let exec = paged_exec()
        .route(
            "/users/alice",
            StatusCode::OK,
            None,
            json!({"login": "alice", "name": "Alice van der Berg", "location": "Utrecht"}).to_string(),
        )
        .route(
            "/users/carol",
            StatusCode::OK,
            None,
            json!({"login": "carol", "name": null, "location": null}).to_string(),
        )
        .route(
            "/users/dave",
            StatusCode::OK,
            None,
            json!({"login": "dave", "name": "Dave", "location": "Lagos"}).to_string(),
        );
    let exec = Arc::new(exec);
    let records = build(exec.clone(), None, ProfileSourceKind::Api)
        .run_once()
        .await?;

    let users: Vec<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(users, vec!["alice", "carol", "alice", "dave"]);
    assert_eq!(records[0].first_name, "Alice");
    assert_eq!(records[0].last_name, "Berg");
    assert_eq!(records[1].real_name.as_deref(), Some("carol"));
    assert_eq!(records[1].location.as_deref(), Some("Unknown"));

    let user_requests = exec
        .seen()
        .iter()
        .filter(|(path, _)| path.starts_with("/users/"))
        .count();
    assert_eq!(user_requests, 3, "each author is looked up once");
    Ok(())
}

#[tokio::test]
async fn full_run_over_profile_pages() -> Result<()> {
    let page = |name: &str, location: &str| {
        format!(
            r#"<html><body><span class="p-name vcard-fullname d-block overflow-hidden">{name}</span>
               <span class="p-label">{location}</span></body></html>"#
        )
    };
    let exec = Arc::new(
        CannedExec::default()
            .route(
                "/repos/pypi/support/issues?state=all&per_page=2",
                StatusCode::OK,
                None,
                json!([issue(1, "alice", TARGET)]).to_string(),
            )
            .route("/alice", StatusCode::OK, None, page("Alice Smith", "Leeds")),
    );
    let records = build(exec, None, ProfileSourceKind::Html).run_once().await?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].real_name.as_deref(), Some("Alice Smith"));
    assert_eq!(records[0].location.as_deref(), Some("Leeds"));
    Ok(())
}
