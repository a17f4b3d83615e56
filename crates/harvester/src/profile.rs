use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use common::config::ProfileSourceKind;
use normalizer::transform::profile_with_defaults;
use normalizer::{normalize_user, Profile, UserPayload};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::client::GithubClient;

/// Where author display names and locations come from. Both sources honour
/// the same defaults.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn fetch_profile(&self, login: &str) -> Result<Profile>;
}

pub fn profile_source(
    kind: ProfileSourceKind,
    client: Arc<dyn GithubClient>,
) -> Arc<dyn ProfileSource> {
    match kind {
        ProfileSourceKind::Api => Arc::new(ApiProfileSource::new(client)),
        ProfileSourceKind::Html => Arc::new(HtmlProfileSource::new(client)),
    }
}

pub struct ApiProfileSource {
    client: Arc<dyn GithubClient>,
}

impl ApiProfileSource {
    pub fn new(client: Arc<dyn GithubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileSource for ApiProfileSource {
    fn kind(&self) -> &'static str {
        "api"
    }

    async fn fetch_profile(&self, login: &str) -> Result<Profile> {
        let value = self.client.get_user(login).await?;
        let payload: UserPayload = serde_json::from_value(value)?;
        Ok(normalize_user(&payload))
    }
}

pub struct HtmlProfileSource {
    client: Arc<dyn GithubClient>,
}

impl HtmlProfileSource {
    pub fn new(client: Arc<dyn GithubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileSource for HtmlProfileSource {
    fn kind(&self) -> &'static str {
        "html"
    }

    async fn fetch_profile(&self, login: &str) -> Result<Profile> {
        let page = self.client.get_profile_page(login).await?;
        Ok(parse_profile_html(&page, login))
    }
}

static FULL_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.p-name.vcard-fullname").expect("invalid selector"));
static LOCATION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.p-label").expect("invalid selector"));

/// Reads the full-name and location spans off a public profile page.
pub fn parse_profile_html(html: &str, login: &str) -> Profile {
    let document = Html::parse_document(html);
    let text_of = |selector: &Selector| {
        document
            .select(selector)
            .next()
            .map(|el| el.text().collect::<String>())
    };
    let name = text_of(&FULL_NAME);
    let location = text_of(&LOCATION);
    profile_with_defaults(login, name.as_deref(), location.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrapes_name_and_location() {
        let html = r#"
            <html><body>
              <h1 class="vcard-names">
                <span class="p-name vcard-fullname d-block overflow-hidden" itemprop="name">
                  Jane Q. Doe
                </span>
              </h1>
              <ul>
                <li itemprop="homeLocation"><span class="p-label">Nairobi, Kenya</span></li>
              </ul>
            </body></html>
        "#;
        let profile = parse_profile_html(html, "jdoe");
        assert_eq!(profile.real_name, "Jane Q. Doe");
        assert_eq!(profile.location, "Nairobi, Kenya");
    }

    #[test]
    fn missing_elements_fall_back() {
        let profile = parse_profile_html("<html><body><p>hi</p></body></html>", "jdoe");
        assert_eq!(profile.real_name, "jdoe");
        assert_eq!(profile.location, "Unknown");
    }

    #[test]
    fn blank_spans_fall_back_like_missing_ones() {
        let html = r#"
            <span class="p-name vcard-fullname d-block overflow-hidden">  </span>
            <span class="p-label">
            </span>
        "#;
        let profile = parse_profile_html(html, "jdoe");
        assert_eq!(profile.real_name, "jdoe");
        assert_eq!(profile.location, "Unknown");
    }
}
