//! Configuration management for flowdoc.
//!
//! Parses `flowdoc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every section is
//! optional; relative paths resolve against the directory of the config file.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! URL-valued strings support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.base_url`
//! - `search.library_url`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override publish directory.
    pub docs_dir: Option<PathBuf>,
    /// Override site base URL.
    pub base_url: Option<String>,
    /// Override Pass 2 worker count.
    pub workers: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "flowdoc.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model input paths (relative strings from TOML).
    model: ModelConfigRaw,
    /// Site identity.
    pub site: SiteConfig,
    /// Output paths (relative strings from TOML).
    output: OutputConfigRaw,
    /// Search index configuration (relative strings from TOML).
    search: SearchConfigRaw,
    /// Build tuning.
    pub build: BuildConfig,

    /// Resolved model configuration (set after loading).
    #[serde(skip)]
    pub model_resolved: ModelConfig,
    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Resolved search configuration (set after loading).
    #[serde(skip)]
    pub search_resolved: SearchConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ModelConfigRaw {
    actions: Option<String>,
    search_action: Option<String>,
    page_template: Option<String>,
}

/// Resolved model input paths.
#[derive(Debug, Default)]
pub struct ModelConfig {
    /// Action tree YAML.
    pub actions: PathBuf,
    /// YAML of the action appended as the last child of the root.
    pub search_action: Option<PathBuf>,
    /// Page template YAML.
    pub page_template: PathBuf,
}

/// Site identity.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Container name. Names the top-level folder of the generated site.
    pub name: String,
    /// Absolute URL the publish directory is served from.
    pub base_url: String,
    /// Sub-path of the generated site copied to the publish directory.
    pub subpath: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "flow".to_owned(),
            base_url: String::new(),
            subpath: None,
        }
    }
}

impl SiteConfig {
    /// Effective sub-path, `name` unless configured.
    #[must_use]
    pub fn subpath(&self) -> &str {
        self.subpath.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    staging_dir: Option<String>,
    docs_dir: Option<String>,
    keep: Option<Vec<String>>,
}

/// Resolved output configuration.
#[derive(Debug, Default)]
pub struct OutputConfig {
    /// Staging area for content, pages and the materialized site.
    pub staging_dir: PathBuf,
    /// Publish directory.
    pub docs_dir: PathBuf,
    /// Glob patterns, relative to `docs_dir`, that survive cleanup.
    pub keep: Vec<String>,
}

impl OutputConfig {
    /// Root of the materialized container (`<staging>/site`).
    #[must_use]
    pub fn site_dir(&self) -> PathBuf {
        self.staging_dir.join("site")
    }
}

fn default_keep() -> Vec<String> {
    vec![
        "CNAME".to_owned(),
        "favicon.ico".to_owned(),
        "images/**".to_owned(),
    ]
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SearchConfigRaw {
    script: Option<String>,
    library_url: Option<String>,
    exclude: Option<Vec<String>>,
    documents_file: Option<String>,
    variable: Option<String>,
}

/// Resolved search index configuration.
#[derive(Debug)]
pub struct SearchConfig {
    /// Page-local search activation script, inlined into every page head.
    pub script: PathBuf,
    /// Search library loaded by every page.
    pub library_url: String,
    /// Glob patterns of pages excluded from the search index.
    pub exclude: Vec<String>,
    /// Generated search documents script at the publish root.
    pub documents_file: String,
    /// Global variable the search documents are assigned to.
    pub variable: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from("model/search.js"),
            library_url: "https://unpkg.com/lunr/lunr.js".to_owned(),
            exclude: vec!["search.html".to_owned()],
            documents_file: "search-documents.js".to_owned(),
            variable: "searchDocuments".to_owned(),
        }
    }
}

/// Build tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Pass 2 concurrency.
    pub workers: usize,
    /// Overall deadline in seconds.
    pub timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(1, std::num::NonZero::get),
            timeout_secs: 600,
        }
    }
}

impl BuildConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.base_url`").
        field: String,
        /// Error message (e.g., "${`DOCS_URL`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn require_globs(patterns: &[String], field: &str) -> Result<(), ConfigError> {
    for pattern in patterns {
        glob::Pattern::new(pattern).map_err(|e| {
            ConfigError::Validation(format!("{field} has invalid pattern {pattern:?}: {e}"))
        })?;
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `flowdoc.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(docs_dir) = &settings.docs_dir {
            self.output_resolved.docs_dir.clone_from(docs_dir);
        }
        if let Some(base_url) = &settings.base_url {
            self.site.base_url.clone_from(base_url);
        }
        if let Some(workers) = settings.workers {
            self.build.workers = workers;
        }
    }

    /// Get the validated site base URL without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `site.base_url` is not set.
    pub fn require_base_url(&self) -> Result<&str, ConfigError> {
        require_non_empty(&self.site.base_url, "site.base_url")?;
        require_http_url(&self.site.base_url, "site.base_url")?;
        Ok(self.site.base_url.trim_end_matches('/'))
    }

    /// Directory of the materialized site copied to the publish directory.
    ///
    /// The sub-path is split on `/` and joined component-wise.
    #[must_use]
    pub fn publish_source(&self) -> PathBuf {
        self.site
            .subpath()
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.output_resolved.site_dir(), |dir, segment| dir.join(segment))
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            model: ModelConfigRaw::default(),
            site: SiteConfig::default(),
            output: OutputConfigRaw::default(),
            search: SearchConfigRaw::default(),
            build: BuildConfig::default(),
            model_resolved: ModelConfig::default(),
            output_resolved: OutputConfig::default(),
            search_resolved: SearchConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file. An empty `site.base_url`
    /// passes here; commands that need it call [`Config::require_base_url`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_site()?;
        require_globs(&self.output_resolved.keep, "output.keep")?;
        require_globs(&self.search_resolved.exclude, "search.exclude")?;
        require_http_url(&self.search_resolved.library_url, "search.library_url")?;
        require_non_empty(&self.search_resolved.documents_file, "search.documents_file")?;
        require_non_empty(&self.search_resolved.variable, "search.variable")?;

        if self.build.workers == 0 {
            return Err(ConfigError::Validation(
                "build.workers must be greater than 0".to_owned(),
            ));
        }
        if self.build.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "build.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site.name, "site.name")?;
        if self.site.name.contains('/') {
            return Err(ConfigError::Validation(
                "site.name cannot contain '/'".to_owned(),
            ));
        }
        if !self.site.base_url.is_empty() {
            require_http_url(&self.site.base_url, "site.base_url")?;
        }
        if self.site.subpath().split('/').any(|s| s == "..") {
            return Err(ConfigError::Validation(
                "site.subpath cannot contain '..'".to_owned(),
            ));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.base_url = expand::expand_env(&self.site.base_url, "site.base_url")?;

        if let Some(ref url) = self.search.library_url {
            self.search.library_url = Some(expand::expand_env(url, "search.library_url")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        let search_action = match &self.model.search_action {
            Some(path) => Some(config_dir.join(path)),
            None => Some(config_dir.join("model/search-action.yml")).filter(|p| p.exists()),
        };
        self.model_resolved = ModelConfig {
            actions: resolve(self.model.actions.as_deref(), "model/actions.yml"),
            search_action,
            page_template: resolve(self.model.page_template.as_deref(), "model/page-template.yml"),
        };

        self.output_resolved = OutputConfig {
            staging_dir: resolve(self.output.staging_dir.as_deref(), "target/model-doc"),
            docs_dir: resolve(self.output.docs_dir.as_deref(), "docs"),
            keep: self.output.keep.clone().unwrap_or_else(default_keep),
        };

        let defaults = SearchConfig::default();
        self.search_resolved = SearchConfig {
            script: resolve(self.search.script.as_deref(), "model/search.js"),
            library_url: self.search.library_url.clone().unwrap_or(defaults.library_url),
            exclude: self.search.exclude.clone().unwrap_or(defaults.exclude),
            documents_file: self
                .search
                .documents_file
                .clone()
                .unwrap_or(defaults.documents_file),
            variable: self.search.variable.clone().unwrap_or(defaults.variable),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));

        assert_eq!(config.site.name, "flow");
        assert_eq!(config.site.subpath(), "flow");
        assert_eq!(
            config.model_resolved.actions,
            PathBuf::from("/test/model/actions.yml")
        );
        assert_eq!(
            config.output_resolved.staging_dir,
            PathBuf::from("/test/target/model-doc")
        );
        assert_eq!(config.output_resolved.docs_dir, PathBuf::from("/test/docs"));
        assert_eq!(
            config.output_resolved.keep,
            vec!["CNAME", "favicon.ico", "images/**"]
        );
        assert_eq!(config.search_resolved.exclude, vec!["search.html"]);
        assert_eq!(config.search_resolved.variable, "searchDocuments");
        assert_eq!(config.build.timeout_secs, 600);
        assert!(config.build.workers > 0);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.site.name, "flow");
        assert!(config.site.base_url.is_empty());
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[model]
actions = "flow/actions.yml"

[output]
docs_dir = "public"
keep = ["CNAME"]

[search]
exclude = ["search.html", "drafts/**"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.model_resolved.actions,
            PathBuf::from("/project/flow/actions.yml")
        );
        assert_eq!(
            config.model_resolved.page_template,
            PathBuf::from("/project/model/page-template.yml")
        );
        assert_eq!(
            config.output_resolved.docs_dir,
            PathBuf::from("/project/public")
        );
        assert_eq!(config.output_resolved.keep, vec!["CNAME"]);
        assert_eq!(
            config.output_resolved.site_dir(),
            PathBuf::from("/project/target/model-doc/site")
        );
        assert_eq!(
            config.search_resolved.exclude,
            vec!["search.html", "drafts/**"]
        );
    }

    #[test]
    fn test_search_action_default_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let mut config: Config = toml::from_str("").unwrap();

        config.resolve_paths(dir.path());
        assert!(config.model_resolved.search_action.is_none());

        std::fs::create_dir_all(dir.path().join("model")).unwrap();
        std::fs::write(dir.path().join("model/search-action.yml"), "text: Search").unwrap();
        config.resolve_paths(dir.path());
        assert_eq!(
            config.model_resolved.search_action,
            Some(dir.path().join("model/search-action.yml"))
        );
    }

    #[test]
    fn test_publish_source_joins_subpath_with_slash() {
        let toml = r#"
[site]
name = "demo"
subpath = "demo/flow"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/p"));

        assert_eq!(
            config.publish_source(),
            PathBuf::from("/p/target/model-doc/site/demo/flow")
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[site]\nbase_url = \"https://docs.example.org/flow/\"\n\n[build]\nworkers = 2\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.build.workers, 2);
        assert_eq!(
            config.require_base_url().unwrap(),
            "https://docs.example.org/flow"
        );
        assert_eq!(config.output_resolved.docs_dir, dir.path().join("docs"));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = Config::load(Some(Path::new("/nonexistent/flowdoc.toml")), None);

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let settings = CliSettings {
            docs_dir: Some(PathBuf::from("/out")),
            base_url: Some("https://example.com".to_owned()),
            workers: Some(3),
        };

        config.apply_cli_settings(&settings);

        assert_eq!(config.output_resolved.docs_dir, PathBuf::from("/out"));
        assert_eq!(config.site.base_url, "https://example.com");
        assert_eq!(config.build.workers, 3);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.output_resolved.docs_dir, PathBuf::from("/test/docs"));
        assert!(config.site.base_url.is_empty());
    }

    #[test]
    fn test_expand_env_vars_base_url() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TEST_FLOWDOC_BASE_URL", "https://docs.test.com");
        }

        let toml = r#"
[site]
base_url = "${TEST_FLOWDOC_BASE_URL}/demo"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.site.base_url, "https://docs.test.com/demo");

        unsafe {
            std::env::remove_var("TEST_FLOWDOC_BASE_URL");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MISSING_VAR_FLOWDOC_TEST");
        }

        let toml = r#"
[site]
base_url = "${MISSING_VAR_FLOWDOC_TEST}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("site.base_url"));
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_require_base_url_missing() {
        let config = Config::default_with_base(Path::new("/test"));

        let err = config.require_base_url().unwrap_err();

        assert!(err.to_string().contains("site.base_url cannot be empty"));
    }

    #[test]
    fn test_validate_base_url_invalid_scheme() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.site.base_url = "ftp://example.com".to_owned();

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_validate_workers_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.build.workers = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_timeout_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.build.timeout_secs = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_keep_glob() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.output_resolved.keep = vec!["images/[".to_owned()];

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("output.keep"));
    }

    #[test]
    fn test_validate_subpath_parent_rejected() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.site.subpath = Some("../outside".to_owned());

        assert!(config.validate().is_err());
    }
}
