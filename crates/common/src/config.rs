use std::path::Path;

use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::errors::Result;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub harvester: HarvesterConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from_path(".")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/default")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/local")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "GithubConfig::default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "GithubConfig::default_web_base_url")]
    pub web_base_url: String,
    /// Optional personal access token, sent as a bearer token.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "GithubConfig::default_user_agent")]
    pub user_agent: String,
}

impl GithubConfig {
    fn default_api_base_url() -> String {
        "https://api.github.com/".to_string()
    }

    fn default_web_base_url() -> String {
        "https://github.com/".to_string()
    }

    fn default_user_agent() -> String {
        "pep541-harvester".to_string()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base_url: Self::default_api_base_url(),
            web_base_url: Self::default_web_base_url(),
            token: None,
            user_agent: Self::default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSourceKind {
    /// `GET /users/{login}` on the REST API.
    #[default]
    Api,
    /// Scrape the public profile page.
    Html,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterConfig {
    #[serde(default = "HarvesterConfig::default_repository")]
    pub repository: String,
    #[serde(default = "HarvesterConfig::default_label_description")]
    pub label_description: String,
    #[serde(default = "HarvesterConfig::default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub profile_source: ProfileSourceKind,
    #[serde(default = "HarvesterConfig::default_profile_concurrency")]
    pub profile_concurrency: usize,
    #[serde(default = "HarvesterConfig::default_output_path")]
    pub output_path: String,
}

impl HarvesterConfig {
    fn default_repository() -> String {
        "pypi/support".to_string()
    }

    fn default_label_description() -> String {
        "Package name support requests".to_string()
    }

    const fn default_per_page() -> u32 {
        100
    }

    const fn default_profile_concurrency() -> usize {
        1
    }

    fn default_output_path() -> String {
        "support_requests.csv".to_string()
    }
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            repository: Self::default_repository(),
            label_description: Self::default_label_description(),
            per_page: Self::default_per_page(),
            profile_source: ProfileSourceKind::default(),
            profile_concurrency: Self::default_profile_concurrency(),
            output_path: Self::default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PValueAdjustment {
    #[default]
    None,
    Bonferroni,
    Holm,
    Sidak,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default = "AnalyzerConfig::default_input_path")]
    pub input_path: String,
    /// Reference date for open-request waiting times. Defaults to today.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default = "AnalyzerConfig::default_group_column")]
    pub group_column: String,
    #[serde(default = "AnalyzerConfig::default_value_column")]
    pub value_column: String,
    #[serde(default)]
    pub p_adjust: PValueAdjustment,
}

impl AnalyzerConfig {
    fn default_input_path() -> String {
        "support_requests_pred.csv".to_string()
    }

    fn default_group_column() -> String {
        "pred".to_string()
    }

    fn default_value_column() -> String {
        "wait_days".to_string()
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            input_path: Self::default_input_path(),
            as_of: None,
            group_column: Self::default_group_column(),
            value_column: Self::default_value_column(),
            p_adjust: PValueAdjustment::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "ObservabilityConfig::default_log_level")]
    pub log_level: String,
    /// Where the harvester drops its Prometheus text exposition, if anywhere.
    #[serde(default)]
    pub metrics_path: Option<String>,
}

impl ObservabilityConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            metrics_path: None,
        }
    }
}
