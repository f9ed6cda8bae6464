use std::path::PathBuf;

use clap::Parser;
use miette::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use diffwise_core::{ActionConfig, ActionInputs, DiffwiseConfig, DiffwiseError, RunOutcome};
use diffwise_review::actions::ActionsRuntime;
use diffwise_review::git::GitDiff;
use diffwise_review::github::GitHubClient;
use diffwise_review::llm::LlmClient;
use diffwise_review::pipeline::ReviewPipeline;

#[derive(Parser)]
#[command(
    name = "diffwise",
    version,
    about = "Ask an LLM to review a pull request and keep one bot comment up to date",
    long_about = "Ask an LLM to review a pull request and keep one bot comment up to date.\n\n\
                   Diffs HEAD against origin/main, sends the diff to an OpenAI-compatible\n\
                   chat completion endpoint, and creates or updates a single comment on the\n\
                   open pull request for the current branch.\n\n\
                   Inside GitHub Actions every option is read from the environment\n\
                   (INPUT_GITHUB_TOKEN, INPUT_OPENAI_TOKEN, INPUT_OPENAI_MODEL,\n\
                   GITHUB_REPOSITORY, GITHUB_REF, GITHUB_OUTPUT).\n\n\
                   Examples:\n  \
                     diffwise                                  Run as a GitHub Action step\n  \
                     diffwise --ref refs/heads/feat --dry-run  Print the review locally"
)]
struct Cli {
    /// Token for the GitHub API
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Token for the completion API
    #[arg(long, env = "INPUT_OPENAI_TOKEN", hide_env_values = true)]
    openai_token: Option<String>,

    /// Model identifier (default: gpt-3.5-turbo)
    #[arg(long, env = "INPUT_OPENAI_MODEL")]
    openai_model: Option<String>,

    /// Repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Ref the run was triggered on, e.g. refs/heads/feature-x
    #[arg(long = "ref", env = "GITHUB_REF")]
    git_ref: Option<String>,

    /// GitHub API base URL, for GitHub Enterprise
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// File step outputs are appended to (stdout when unset)
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,

    /// Checkout to diff (default: current directory)
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Path to configuration file (default: <repo>/.diffwise.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the review instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn inputs(&self) -> ActionInputs {
        ActionInputs {
            github_token: self.github_token.clone(),
            openai_token: self.openai_token.clone(),
            openai_model: self.openai_model.clone(),
            repository: self.repository.clone(),
            git_ref: self.git_ref.clone(),
            api_url: self.api_url.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let in_actions = std::env::var_os("GITHUB_ACTIONS").is_some();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!in_actions)
                .with_target(false),
        )
        .with(filter)
        .init();
}

async fn run(cli: &Cli, runtime: &ActionsRuntime) -> Result<RunOutcome, DiffwiseError> {
    let file_config = DiffwiseConfig::discover(cli.config.as_deref(), &cli.repo)?;
    let config = ActionConfig::resolve(cli.inputs(), file_config)?;
    tracing::debug!(?config, "configuration resolved");

    let diff = GitDiff::new(&cli.repo);
    let llm = LlmClient::new(&config.llm)?;
    let github = GitHubClient::new(
        &config.github_token,
        &config.owner,
        &config.repo,
        config.api_url.as_deref(),
    )?;

    ReviewPipeline::new(&config, &diff, &llm, &github, runtime)
        .dry_run(cli.dry_run)
        .run()
        .await
}

fn report(outcome: &RunOutcome, runtime: &ActionsRuntime) {
    match outcome {
        RunOutcome::NoDifferences | RunOutcome::NoPullRequest { .. } => {}
        RunOutcome::DryRun { feedback } => println!("{feedback}"),
        RunOutcome::Published { pr_number, outcome } => {
            runtime.notice(&format!(
                "Review posted on #{pr_number} (comment {})",
                outcome.comment_id()
            ));
        }
    }
}

fn log_failure(err: &DiffwiseError) {
    match err {
        DiffwiseError::CompletionApi {
            status,
            code,
            kind,
            message,
        } => tracing::error!(
            status,
            code = code.as_deref().unwrap_or("-"),
            kind = kind.as_deref().unwrap_or("-"),
            "completion API request failed: {message}"
        ),
        other => tracing::error!("review run failed: {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = ActionsRuntime::new(cli.output_file.clone());
    match run(&cli, &runtime).await {
        Ok(outcome) => {
            report(&outcome, &runtime);
            Ok(())
        }
        Err(err) => {
            log_failure(&err);
            runtime.set_failed(&err.to_string());
            Err(err.into())
        }
    }
}
