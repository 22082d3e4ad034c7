use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::filters::FilterConfig;
use crate::search::{SearchPolicy, DEFAULT_PHRASE_MARKER, FETCH_PAGE_SIZE, RESULTS_PER_KIND};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub getty: GettyConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub bundle: BundleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GettyConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Name of the environment variable holding the API secret.
    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,
    #[serde(default = "default_getty_timeout")]
    pub timeout_secs: u64,
}

impl Default for GettyConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            api_key_env: default_api_key_env(),
            api_secret_env: default_api_secret_env(),
            timeout_secs: default_getty_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.gettyimages.com/v3".to_string()
}
fn default_token_url() -> String {
    "https://authentication.gettyimages.com/oauth2/token".to_string()
}
fn default_api_key_env() -> String {
    "GETTY_API_KEY".to_string()
}
fn default_api_secret_env() -> String {
    "GETTY_API_SECRET".to_string()
}
fn default_getty_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL for the `ollama` provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_extractor_timeout")]
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            timeout_secs: default_extractor_timeout(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_extractor_timeout() -> u64 {
    60
}

impl ExtractorConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_results_per_kind")]
    pub results_per_kind: usize,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_phrase_marker")]
    pub phrase_marker: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            results_per_kind: default_results_per_kind(),
            delay_ms: default_delay_ms(),
            phrase_marker: default_phrase_marker(),
        }
    }
}

fn default_page_size() -> u32 {
    FETCH_PAGE_SIZE
}
fn default_results_per_kind() -> usize {
    RESULTS_PER_KIND
}
fn default_delay_ms() -> u64 {
    1000
}
fn default_phrase_marker() -> String {
    DEFAULT_PHRASE_MARKER.to_string()
}

impl SearchConfig {
    pub fn policy(&self) -> SearchPolicy {
        SearchPolicy {
            page_size: self.page_size,
            results_per_kind: self.results_per_kind,
            delay: std::time::Duration::from_millis(self.delay_ms),
            phrase_marker: self.phrase_marker.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BundleConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_bundle_timeout")]
    pub timeout_secs: u64,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_bundle_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}
fn default_bundle_timeout() -> u64 {
    120
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate search policy
    if config.search.page_size == 0 || config.search.page_size > 100 {
        return Err(Error::Config("search.page_size must be in 1..=100".into()));
    }
    if config.search.results_per_kind == 0 {
        return Err(Error::Config("search.results_per_kind must be >= 1".into()));
    }
    if config.search.results_per_kind > config.search.page_size as usize {
        return Err(Error::Config(
            "search.results_per_kind must not exceed search.page_size".into(),
        ));
    }
    if config.search.phrase_marker.trim().is_empty() {
        return Err(Error::Config("search.phrase_marker must not be empty".into()));
    }

    if config.bundle.concurrency == 0 {
        return Err(Error::Config("bundle.concurrency must be >= 1".into()));
    }

    // Validate extractor
    match config.extractor.provider.as_str() {
        "disabled" => {}
        "openai" | "ollama" => {
            if config.extractor.model.is_none() {
                return Err(Error::Config(format!(
                    "extractor.model must be specified when provider is '{}'",
                    config.extractor.provider
                )));
            }
        }
        other => {
            return Err(Error::Config(format!(
                "Unknown extractor provider: '{}'. Must be disabled, openai, or ollama.",
                other
            )))
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.search.page_size, 30);
        assert_eq!(config.search.results_per_kind, 5);
        assert_eq!(config.search.phrase_marker, "PMCARC");
        assert_eq!(config.extractor.provider, "disabled");
        assert_eq!(config.getty.api_key_env, "GETTY_API_KEY");
        assert!(config.filters.collection_codes().is_none());
    }

    #[test]
    fn filters_section_is_read() {
        let file = write_config(
            r#"
[filters]
variety = true
deadline = true
phrase_augmentation = true
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(config.filters.phrase_augmentation);
        assert_eq!(config.filters.collection_codes().as_deref(), Some("VAR,DLN"));
    }

    #[test]
    fn rejects_unknown_provider() {
        let file = write_config("[extractor]\nprovider = \"bard\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown extractor provider"));
    }

    #[test]
    fn openai_requires_model() {
        let file = write_config("[extractor]\nprovider = \"openai\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn results_cap_cannot_exceed_page_size() {
        let file = write_config("[search]\npage_size = 3\nresults_per_kind = 5\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_config(Path::new("/nonexistent/shotlist.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
