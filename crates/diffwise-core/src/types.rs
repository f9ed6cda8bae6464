use serde::{Deserialize, Serialize};

use crate::constants::COMMENT_MARKER;

/// Kind of account that wrote a comment.
///
/// # Examples
///
/// ```
/// use diffwise_core::AccountKind;
///
/// assert_eq!(AccountKind::from_api("Bot"), AccountKind::Bot);
/// assert_eq!(AccountKind::from_api("User"), AccountKind::User);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// A human account.
    User,
    /// A GitHub App or `github-actions[bot]`.
    Bot,
    /// An organization account.
    Organization,
    /// Any type GitHub adds later.
    Other(String),
}

impl AccountKind {
    /// Map the `type` field of a GitHub user object.
    pub fn from_api(value: &str) -> Self {
        match value {
            "User" => Self::User,
            "Bot" => Self::Bot,
            "Organization" => Self::Organization,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Author of an issue comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    /// Login, e.g. `github-actions[bot]`.
    pub login: String,
    /// Account type.
    pub kind: AccountKind,
}

/// A comment on a pull request's conversation tab.
///
/// # Examples
///
/// ```
/// use diffwise_core::{AccountKind, CommentAuthor, IssueComment};
///
/// let comment = IssueComment {
///     id: 7,
///     body: "<!-- GPT-BOT-COMMENT -->\nLooks fine.".into(),
///     author: CommentAuthor {
///         login: "github-actions[bot]".into(),
///         kind: AccountKind::Bot,
///     },
/// };
/// assert!(comment.is_bot_review());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    /// Comment id.
    pub id: u64,
    /// Markdown body, empty when GitHub omits it.
    pub body: String,
    /// Who wrote it.
    pub author: CommentAuthor,
}

impl IssueComment {
    /// Whether this is a review comment written by diffwise.
    ///
    /// Both conditions are required: a human quoting the marker does not
    /// make their comment ours.
    pub fn is_bot_review(&self) -> bool {
        self.author.kind == AccountKind::Bot && self.body.contains(COMMENT_MARKER)
    }
}

/// What publishing did on the pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "action")]
pub enum PublishOutcome {
    /// A new comment was created.
    Created {
        /// Id of the new comment.
        comment_id: u64,
    },
    /// An earlier diffwise comment was overwritten.
    Updated {
        /// Id of the overwritten comment.
        comment_id: u64,
    },
}

impl PublishOutcome {
    /// Id of the comment that now holds the review.
    pub fn comment_id(&self) -> u64 {
        match self {
            Self::Created { comment_id } | Self::Updated { comment_id } => *comment_id,
        }
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
pub enum RunOutcome {
    /// The branch has no changes against the base; nothing was requested.
    NoDifferences,
    /// A review was generated but no open pull request uses the branch.
    NoPullRequest {
        /// Branch that was searched for.
        branch: String,
    },
    /// A review was generated and printed instead of published.
    DryRun {
        /// The generated review.
        feedback: String,
    },
    /// The review was published on a pull request.
    Published {
        /// Pull request number.
        pr_number: u64,
        /// Whether a comment was created or updated.
        outcome: PublishOutcome,
    },
}
