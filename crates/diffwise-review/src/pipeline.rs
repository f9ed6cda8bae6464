use diffwise_core::constants::{BASE_BRANCH, BASE_REMOTE, FEEDBACK_OUTPUT, NO_DIFF_FEEDBACK};
use diffwise_core::{ActionConfig, DiffwiseError, RunOutcome};
use tracing::info;

use crate::actions::ActionsRuntime;
use crate::git::DiffSource;
use crate::github::{find_pull_request, PullRequestTracker};
use crate::llm::CompletionClient;
use crate::prompt::request_review;
use crate::publish::publish_feedback;

/// One review run, from diff to published comment.
///
/// Every stage is injected so tests can swap in fakes. Stages run strictly
/// in order and the first error ends the run.
pub struct ReviewPipeline<'a> {
    config: &'a ActionConfig,
    diff: &'a dyn DiffSource,
    llm: &'a dyn CompletionClient,
    tracker: &'a dyn PullRequestTracker,
    runtime: &'a ActionsRuntime,
    dry_run: bool,
}

impl<'a> ReviewPipeline<'a> {
    /// Wire a pipeline from its stages.
    pub fn new(
        config: &'a ActionConfig,
        diff: &'a dyn DiffSource,
        llm: &'a dyn CompletionClient,
        tracker: &'a dyn PullRequestTracker,
        runtime: &'a ActionsRuntime,
    ) -> Self {
        Self {
            config,
            diff,
            llm,
            tracker,
            runtime,
            dry_run: false,
        }
    }

    /// Stop after generating the review instead of publishing it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run every stage.
    ///
    /// An empty diff sets the `feedback` output and ends the run before any
    /// remote call. A branch without an open pull request ends it with a
    /// warning after the review was generated.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage.
    pub async fn run(&self) -> Result<RunOutcome, DiffwiseError> {
        let branch = &self.config.branch;
        info!(%branch, remote = BASE_REMOTE, base = BASE_BRANCH, "computing diff");

        let diff = self.diff.diff().await?;
        if diff.trim().is_empty() {
            info!("{NO_DIFF_FEEDBACK}");
            self.runtime.set_output(FEEDBACK_OUTPUT, NO_DIFF_FEEDBACK)?;
            return Ok(RunOutcome::NoDifferences);
        }

        let feedback = request_review(self.llm, &self.config.llm.model, &diff).await?;

        if self.dry_run {
            info!("dry run, not publishing");
            return Ok(RunOutcome::DryRun { feedback });
        }

        let Some(pr_number) = find_pull_request(self.tracker, &self.config.owner, branch).await?
        else {
            self.runtime
                .warning(&format!("No open pull request found for branch {branch}"));
            return Ok(RunOutcome::NoPullRequest {
                branch: branch.clone(),
            });
        };

        let outcome = publish_feedback(self.tracker, pr_number, &feedback).await?;
        Ok(RunOutcome::Published { pr_number, outcome })
    }
}
