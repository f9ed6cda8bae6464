/// Errors that can occur during a diffwise run.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary converts to a `miette::Report` at the boundary and
/// marks the action run as failed.
///
/// # Examples
///
/// ```
/// use diffwise_core::DiffwiseError;
///
/// let err = DiffwiseError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DiffwiseError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(diffwise::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(diffwise::config),
        help("action inputs are read from INPUT_GITHUB_TOKEN, INPUT_OPENAI_TOKEN and INPUT_OPENAI_MODEL")
    )]
    Config(String),

    /// The current ref does not name a branch.
    #[error("invalid branch reference '{0}', expected refs/heads/<branch>")]
    #[diagnostic(
        code(diffwise::invalid_ref),
        help("run the action from a workflow that checks out a branch")
    )]
    InvalidRef(String),

    /// A git command could not be run or exited non-zero.
    #[error("git error: {0}")]
    #[diagnostic(code(diffwise::git))]
    Git(String),

    /// The completion endpoint answered with an error status.
    ///
    /// `code` and `kind` come from the provider's error body when it has one.
    #[error("completion API error {status}: {message}")]
    #[diagnostic(code(diffwise::completion_api))]
    CompletionApi {
        /// HTTP status code.
        status: u16,
        /// Provider error code, e.g. `invalid_api_key`.
        code: Option<String>,
        /// Provider error type, e.g. `insufficient_quota`.
        kind: Option<String>,
        /// Human-readable message.
        message: String,
    },

    /// Any other failure talking to the completion endpoint.
    #[error("LLM error: {0}")]
    #[diagnostic(code(diffwise::llm))]
    Llm(String),

    /// GitHub API failure.
    #[error("GitHub error: {0}")]
    #[diagnostic(code(diffwise::github))]
    GitHub(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(diffwise::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(diffwise::toml))]
    Toml(#[from] toml::de::Error),
}
