//! Fixed values shared by every stage of a run.

/// Hidden marker prefixed to every comment diffwise writes.
///
/// Used both to tag ownership and to find the previous comment on a rerun.
pub const COMMENT_MARKER: &str = "<!-- GPT-BOT-COMMENT -->";

/// Model used when neither the action input nor `.diffwise.toml` names one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Remote the base branch is fetched from.
pub const BASE_REMOTE: &str = "origin";

/// Branch every pull request is diffed against.
pub const BASE_BRANCH: &str = "main";

/// Lines of context git may merge between neighbouring hunks.
pub const INTER_HUNK_CONTEXT: u32 = 1000;

/// Prefix a `GITHUB_REF` must carry for the run to have a branch.
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Name of the action output set when there is nothing to review.
pub const FEEDBACK_OUTPUT: &str = "feedback";

/// Value of [`FEEDBACK_OUTPUT`] when the diff is empty.
pub const NO_DIFF_FEEDBACK: &str = "No differences found.";

/// Config file looked up in the repository root when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = ".diffwise.toml";
