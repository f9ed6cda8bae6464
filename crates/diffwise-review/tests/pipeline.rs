//! End-to-end runs of the review pipeline against fake stages.
//!
//! No process is spawned and no network is touched: the diff, the model and
//! GitHub are all in-memory fakes that record every call.

use std::sync::Mutex;

use async_trait::async_trait;

use diffwise_core::{
    AccountKind, ActionConfig, ActionInputs, CommentAuthor, DiffwiseConfig, DiffwiseError,
    IssueComment, PublishOutcome, RunOutcome,
};
use diffwise_review::actions::ActionsRuntime;
use diffwise_review::git::DiffSource;
use diffwise_review::github::PullRequestTracker;
use diffwise_review::llm::{ChatMessage, CompletionClient};
use diffwise_review::pipeline::ReviewPipeline;

const DIFF: &str = "diff --git a/src/lib.rs b/src/lib.rs\n\
                    @@ -1,3 +1,3 @@\n \
                    fn answer() -> u32 {\n\
                    -    41\n\
                    +    42\n \
                    }\n";

struct FakeDiff(String);

#[async_trait]
impl DiffSource for FakeDiff {
    async fn diff(&self) -> Result<String, DiffwiseError> {
        Ok(self.0.clone())
    }
}

struct FailingDiff;

#[async_trait]
impl DiffSource for FailingDiff {
    async fn diff(&self) -> Result<String, DiffwiseError> {
        Err(DiffwiseError::Git(
            "git fetch failed (exit status: 128): couldn't find remote ref main".into(),
        ))
    }
}

/// A model that answers every request with the same reply.
struct FakeModel {
    reply: Result<Option<String>, (u16, String)>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl FakeModel {
    fn replying(text: &str) -> Self {
        Self {
            reply: Ok(Some(text.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(status: u16, message: &str) -> Self {
        Self {
            reply: Err((status, message.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for FakeModel {
    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<Option<String>, DiffwiseError> {
        let prompt = messages
            .into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push((model.to_string(), prompt));
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err((status, message)) => Err(DiffwiseError::CompletionApi {
                status: *status,
                code: Some("rate_limit_exceeded".into()),
                kind: Some("requests".into()),
                message: message.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    OpenPullRequests(String),
    ListComments(u64),
    UpdateComment(u64, String),
    CreateComment(u64, String),
}

/// In-memory GitHub with a fixed set of open pull requests and comments.
struct FakeGitHub {
    open: Vec<u64>,
    comments: Vec<IssueComment>,
    calls: Mutex<Vec<Call>>,
}

impl FakeGitHub {
    fn new(open: Vec<u64>, comments: Vec<IssueComment>) -> Self {
        Self {
            open,
            comments,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestTracker for FakeGitHub {
    async fn open_pull_requests(&self, head: &str) -> Result<Vec<u64>, DiffwiseError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::OpenPullRequests(head.to_string()));
        Ok(self.open.clone())
    }

    async fn list_comments(&self, pr_number: u64) -> Result<Vec<IssueComment>, DiffwiseError> {
        self.calls.lock().unwrap().push(Call::ListComments(pr_number));
        Ok(self.comments.clone())
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<(), DiffwiseError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::UpdateComment(comment_id, body.to_string()));
        Ok(())
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<u64, DiffwiseError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::CreateComment(pr_number, body.to_string()));
        Ok(1001)
    }
}

fn config() -> ActionConfig {
    ActionConfig::resolve(
        ActionInputs {
            github_token: Some("ghp_test".into()),
            openai_token: Some("sk-test".into()),
            openai_model: Some("gpt-4o-mini".into()),
            repository: Some("octocat/hello-world".into()),
            git_ref: Some("refs/heads/feature-x".into()),
            api_url: None,
        },
        DiffwiseConfig::default(),
    )
    .unwrap()
}

fn comment(id: u64, kind: AccountKind, body: &str) -> IssueComment {
    IssueComment {
        id,
        body: body.into(),
        author: CommentAuthor {
            login: match kind {
                AccountKind::Bot => "github-actions[bot]".into(),
                _ => "octocat".into(),
            },
            kind,
        },
    }
}

#[tokio::test]
async fn new_comment_on_first_review() {
    let config = config();
    let diff = FakeDiff(DIFF.into());
    let model = FakeModel::replying("Looks fine.");
    let github = FakeGitHub::new(vec![42], vec![comment(5, AccountKind::User, "LGTM")]);
    let runtime = ActionsRuntime::default();

    let outcome = ReviewPipeline::new(&config, &diff, &model, &github, &runtime)
        .run()
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Published {
            pr_number: 42,
            outcome: PublishOutcome::Created { comment_id: 1001 },
        }
    );
    assert_eq!(
        github.calls(),
        vec![
            Call::OpenPullRequests("octocat:feature-x".into()),
            Call::ListComments(42),
            Call::CreateComment(42, "<!-- GPT-BOT-COMMENT -->\nLooks fine.".into()),
        ]
    );
}

#[tokio::test]
async fn existing_bot_comment_is_updated() {
    let config = config();
    let diff = FakeDiff(DIFF.into());
    let model = FakeModel::replying("  Off-by-one in answer().\n");
    let github = FakeGitHub::new(
        vec![42],
        vec![
            comment(5, AccountKind::User, "<!-- GPT-BOT-COMMENT --> copied by a human"),
            comment(6, AccountKind::Bot, "<!-- GPT-BOT-COMMENT -->\nprevious review"),
        ],
    );
    let runtime = ActionsRuntime::default();

    let outcome = ReviewPipeline::new(&config, &diff, &model, &github, &runtime)
        .run()
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Published {
            pr_number: 42,
            outcome: PublishOutcome::Updated { comment_id: 6 },
        }
    );
    let calls = github.calls();
    assert!(calls.contains(&Call::UpdateComment(
        6,
        "<!-- GPT-BOT-COMMENT -->\nOff-by-one in answer().".into()
    )));
    assert!(
        !calls.iter().any(|c| matches!(c, Call::CreateComment(..))),
        "must not create a second comment: {calls:?}"
    );
}

#[tokio::test]
async fn prompt_carries_diff_and_model() {
    let config = config();
    let diff = FakeDiff(DIFF.into());
    let model = FakeModel::replying("ok");
    let github = FakeGitHub::new(vec![42], vec![]);
    let runtime = ActionsRuntime::default();

    ReviewPipeline::new(&config, &diff, &model, &github, &runtime)
        .run()
        .await
        .unwrap();

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let (model_name, prompt) = &prompts[0];
    assert_eq!(model_name, "gpt-4o-mini");
    assert!(prompt.starts_with(
        "Check this PR code, find logic issues that are not easily found by SonarQube, order them by severity."
    ));
    assert!(prompt.contains(DIFF));
}

#[tokio::test]
async fn empty_diff_skips_every_remote_call() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("github_output");
    let config = config();
    let diff = FakeDiff(String::new());
    let model = FakeModel::replying("unused");
    let github = FakeGitHub::new(vec![42], vec![]);
    let runtime = ActionsRuntime::new(Some(output.clone()));

    let outcome = ReviewPipeline::new(&config, &diff, &model, &github, &runtime)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::NoDifferences);
    assert_eq!(model.calls(), 0);
    assert!(github.calls().is_empty());
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "feedback=No differences found.\n"
    );
}

#[tokio::test]
async fn whitespace_only_diff_counts_as_empty() {
    let config = config();
    let diff = FakeDiff("\n\n".into());
    let model = FakeModel::replying("unused");
    let github = FakeGitHub::new(vec![], vec![]);
    let runtime = ActionsRuntime::default();

    let outcome = ReviewPipeline::new(&config, &diff, &model, &github, &runtime)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::NoDifferences);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn no_open_pull_request_stops_before_comments() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("github_output");
    let config = config();
    let diff = FakeDiff(DIFF.into());
    let model = FakeModel::replying("Looks fine.");
    let github = FakeGitHub::new(vec![], vec![]);
    let runtime = ActionsRuntime::new(Some(output.clone()));

    let outcome = ReviewPipeline::new(&config, &diff, &model, &github, &runtime)
        .run()
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::NoPullRequest {
            branch: "feature-x".into()
        }
    );
    assert_eq!(
        github.calls(),
        vec![Call::OpenPullRequests("octocat:feature-x".into())]
    );
    assert!(!output.exists(), "no output is set when the PR is missing");
}

#[tokio::test]
async fn first_of_several_pull_requests_gets_the_comment() {
    let config = config();
    let diff = FakeDiff(DIFF.into());
    let model = FakeModel::replying("Looks fine.");
    let github = FakeGitHub::new(vec![7, 8], vec![]);
    let runtime = ActionsRuntime::default();

    let outcome = ReviewPipeline::new(&config, &diff, &model, &github, &runtime)
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Published { pr_number: 7, .. }));
}

#[tokio::test]
async fn dry_run_never_touches_github() {
    let config = config();
    let diff = FakeDiff(DIFF.into());
    let model = FakeModel::replying("Looks fine.");
    let github = FakeGitHub::new(vec![42], vec![]);
    let runtime = ActionsRuntime::default();

    let outcome = ReviewPipeline::new(&config, &diff, &model, &github, &runtime)
        .dry_run(true)
        .run()
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::DryRun {
            feedback: "Looks fine.".into()
        }
    );
    assert!(github.calls().is_empty());
}

#[tokio::test]
async fn completion_error_is_fatal_and_nothing_is_posted() {
    let config = config();
    let diff = FakeDiff(DIFF.into());
    let model = FakeModel::failing(429, "Rate limit reached");
    let github = FakeGitHub::new(vec![42], vec![]);
    let runtime = ActionsRuntime::default();

    let err = ReviewPipeline::new(&config, &diff, &model, &github, &runtime)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, DiffwiseError::CompletionApi { status: 429, .. }));
    assert!(github.calls().is_empty());
}

#[tokio::test]
async fn git_failure_is_fatal_before_any_request() {
    let config = config();
    let model = FakeModel::replying("unused");
    let github = FakeGitHub::new(vec![42], vec![]);
    let runtime = ActionsRuntime::default();

    let err = ReviewPipeline::new(&config, &FailingDiff, &model, &github, &runtime)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, DiffwiseError::Git(_)));
    assert_eq!(model.calls(), 0);
    assert!(github.calls().is_empty());
}

#[test]
fn malformed_ref_fails_while_resolving_config() {
    let err = ActionConfig::resolve(
        ActionInputs {
            github_token: Some("ghp_test".into()),
            openai_token: Some("sk-test".into()),
            repository: Some("octocat/hello-world".into()),
            git_ref: Some("refs/tags/v1.0.0".into()),
            ..ActionInputs::default()
        },
        DiffwiseConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, DiffwiseError::InvalidRef(_)));
}
