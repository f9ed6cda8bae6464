use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{BRANCH_REF_PREFIX, CONFIG_FILE_NAME, DEFAULT_MODEL};
use crate::error::DiffwiseError;

/// Optional settings loaded from `.diffwise.toml`.
///
/// Supports layered resolution: action inputs / CLI flags > config file >
/// defaults. Secrets never live here; tokens only come from the action
/// inputs.
///
/// # Examples
///
/// ```
/// use diffwise_core::DiffwiseConfig;
///
/// let config = DiffwiseConfig::default();
/// assert_eq!(config.llm.model, "gpt-3.5-turbo");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffwiseConfig {
    /// Completion endpoint settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl DiffwiseConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DiffwiseError::Io`] if the file cannot be read, or
    /// [`DiffwiseError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, DiffwiseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DiffwiseError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use diffwise_core::DiffwiseConfig;
    ///
    /// let toml = r#"
    /// [llm]
    /// model = "gpt-4o-mini"
    /// "#;
    /// let config = DiffwiseConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.llm.model, "gpt-4o-mini");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DiffwiseError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the config for a run.
    ///
    /// An explicit path must exist. Without one, `.diffwise.toml` in
    /// `repo_root` is used when present and defaults otherwise.
    pub fn discover(explicit: Option<&Path>, repo_root: &Path) -> Result<Self, DiffwiseError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = repo_root.join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Completion endpoint configuration.
///
/// # Examples
///
/// ```
/// use diffwise_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-3.5-turbo");
/// assert_eq!(config.timeout_secs, 120);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key, filled from the `openai_token` input.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Custom base URL for OpenAI-compatible providers.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Raw inputs of an action run, as handed over by the runner.
///
/// Empty strings are treated as absent: the runner sets `INPUT_*` to an
/// empty value for inputs the workflow did not provide.
#[derive(Debug, Clone, Default)]
pub struct ActionInputs {
    /// `github_token` input.
    pub github_token: Option<String>,
    /// `openai_token` input.
    pub openai_token: Option<String>,
    /// `openai_model` input.
    pub openai_model: Option<String>,
    /// `GITHUB_REPOSITORY`, `owner/repo`.
    pub repository: Option<String>,
    /// `GITHUB_REF`, e.g. `refs/heads/feature-x`.
    pub git_ref: Option<String>,
    /// `GITHUB_API_URL`, for GitHub Enterprise.
    pub api_url: Option<String>,
}

/// Everything one run needs to know about its environment.
///
/// Built once at start-up and passed to every stage, so no component reads
/// the process environment on its own.
#[derive(Clone)]
pub struct ActionConfig {
    /// Token for the GitHub API.
    pub github_token: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch the run was triggered on.
    pub branch: String,
    /// GitHub API base URL, `None` for github.com.
    pub api_url: Option<String>,
    /// Completion endpoint settings, with the API key filled in.
    pub llm: LlmConfig,
}

impl ActionConfig {
    /// Validate raw inputs and merge them over the file config.
    ///
    /// # Errors
    ///
    /// Returns [`DiffwiseError::Config`] when a required input is missing or
    /// the repository is not `owner/repo`, and [`DiffwiseError::InvalidRef`]
    /// when the ref does not name a branch.
    ///
    /// # Examples
    ///
    /// ```
    /// use diffwise_core::{ActionConfig, ActionInputs, DiffwiseConfig};
    ///
    /// let inputs = ActionInputs {
    ///     github_token: Some("ghp_x".into()),
    ///     openai_token: Some("sk-x".into()),
    ///     repository: Some("octocat/hello-world".into()),
    ///     git_ref: Some("refs/heads/feature-x".into()),
    ///     ..ActionInputs::default()
    /// };
    /// let config = ActionConfig::resolve(inputs, DiffwiseConfig::default()).unwrap();
    /// assert_eq!(config.branch, "feature-x");
    /// assert_eq!(config.llm.model, "gpt-3.5-turbo");
    /// ```
    pub fn resolve(inputs: ActionInputs, file: DiffwiseConfig) -> Result<Self, DiffwiseError> {
        let github_token = required(inputs.github_token, "github_token")?;
        let openai_token = required(inputs.openai_token, "openai_token")?;

        let repository = required(inputs.repository, "GITHUB_REPOSITORY")?;
        let (owner, repo) = split_repository(&repository)?;

        let git_ref = required(inputs.git_ref, "GITHUB_REF")?;
        let branch = parse_branch_ref(&git_ref)?;

        let mut llm = file.llm;
        if let Some(model) = non_empty(inputs.openai_model) {
            llm.model = model;
        }
        llm.api_key = Some(openai_token);

        Ok(Self {
            github_token,
            owner,
            repo,
            branch,
            api_url: non_empty(inputs.api_url),
            llm,
        })
    }

    /// Head filter for the pull request search, `owner:branch`.
    pub fn head_filter(&self) -> String {
        format!("{}:{}", self.owner, self.branch)
    }
}

impl fmt::Debug for ActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_url", &self.api_url)
            .field("llm", &self.llm)
            .finish_non_exhaustive()
    }
}

/// Extract the branch name from a `refs/heads/<branch>` ref.
///
/// # Errors
///
/// Returns [`DiffwiseError::InvalidRef`] for tags, pull request merge refs,
/// and anything else that does not name a branch.
///
/// # Examples
///
/// ```
/// use diffwise_core::parse_branch_ref;
///
/// assert_eq!(parse_branch_ref("refs/heads/feature/login").unwrap(), "feature/login");
/// assert!(parse_branch_ref("refs/tags/v1.0.0").is_err());
/// ```
pub fn parse_branch_ref(git_ref: &str) -> Result<String, DiffwiseError> {
    match git_ref.strip_prefix(BRANCH_REF_PREFIX) {
        Some(branch) if !branch.is_empty() => Ok(branch.to_string()),
        _ => Err(DiffwiseError::InvalidRef(git_ref.to_string())),
    }
}

fn split_repository(repository: &str) -> Result<(String, String), DiffwiseError> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(DiffwiseError::Config(format!(
            "invalid repository '{repository}', expected owner/repo"
        ))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, name: &str) -> Result<String, DiffwiseError> {
    non_empty(value)
        .ok_or_else(|| DiffwiseError::Config(format!("input required and not supplied: {name}")))
}
