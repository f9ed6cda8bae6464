use async_trait::async_trait;
use diffwise_core::{AccountKind, CommentAuthor, DiffwiseError, IssueComment};
use octocrab::models::CommentId;
use tracing::{debug, info, warn};

/// The parts of the GitHub API a run talks to.
///
/// Bound to one repository at construction.
#[async_trait]
pub trait PullRequestTracker: Send + Sync {
    /// Numbers of open pull requests whose head is `head` (`owner:branch`),
    /// in the order the API returns them.
    async fn open_pull_requests(&self, head: &str) -> Result<Vec<u64>, DiffwiseError>;

    /// Every comment on the pull request's conversation, oldest first.
    async fn list_comments(&self, pr_number: u64) -> Result<Vec<IssueComment>, DiffwiseError>;

    /// Replace the body of an existing comment.
    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<(), DiffwiseError>;

    /// Create a comment and return its id.
    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<u64, DiffwiseError>;
}

/// GitHub client for locating pull requests and managing comments.
///
/// # Examples
///
/// ```no_run
/// use diffwise_review::github::GitHubClient;
///
/// # async fn demo() {
/// let client = GitHubClient::new("ghp_xxxx", "octocat", "hello-world", None).unwrap();
/// # }
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a client for `owner/repo`.
    ///
    /// `api_url` overrides `https://api.github.com`, for GitHub Enterprise.
    ///
    /// # Errors
    ///
    /// Returns [`DiffwiseError::GitHub`] if the URL is invalid or the client
    /// cannot be built.
    pub fn new(
        token: &str,
        owner: &str,
        repo: &str,
        api_url: Option<&str>,
    ) -> Result<Self, DiffwiseError> {
        let mut builder = octocrab::Octocrab::builder().personal_token(token.to_string());
        if let Some(url) = api_url {
            builder = builder
                .base_uri(url)
                .map_err(|e| DiffwiseError::GitHub(format!("invalid API URL '{url}': {e}")))?;
        }
        let octocrab = builder
            .build()
            .map_err(|e| DiffwiseError::GitHub(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PullRequestTracker for GitHubClient {
    async fn open_pull_requests(&self, head: &str) -> Result<Vec<u64>, DiffwiseError> {
        debug!(head, "listing open pull requests");
        let page = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .list()
            .state(octocrab::params::State::Open)
            .head(head.to_string())
            .per_page(100)
            .send()
            .await
            .map_err(|e| DiffwiseError::GitHub(format!("failed to list pull requests: {e}")))?;

        Ok(page.items.into_iter().map(|pr| pr.number).collect())
    }

    async fn list_comments(&self, pr_number: u64) -> Result<Vec<IssueComment>, DiffwiseError> {
        debug!(pr_number, "listing comments");
        let first = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .list_comments(pr_number)
            .per_page(100)
            .send()
            .await
            .map_err(|e| DiffwiseError::GitHub(format!("failed to list comments: {e}")))?;
        let comments = self
            .octocrab
            .all_pages(first)
            .await
            .map_err(|e| DiffwiseError::GitHub(format!("failed to page comments: {e}")))?;

        Ok(comments
            .into_iter()
            .map(|c| IssueComment {
                id: c.id.0,
                body: c.body.unwrap_or_default(),
                author: CommentAuthor {
                    login: c.user.login,
                    kind: AccountKind::from_api(&c.user.r#type),
                },
            })
            .collect())
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<(), DiffwiseError> {
        self.octocrab
            .issues(&self.owner, &self.repo)
            .update_comment(CommentId(comment_id), body)
            .await
            .map_err(|e| {
                DiffwiseError::GitHub(format!("failed to update comment {comment_id}: {e}"))
            })?;
        Ok(())
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<u64, DiffwiseError> {
        let comment = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .create_comment(pr_number, body)
            .await
            .map_err(|e| {
                DiffwiseError::GitHub(format!("failed to comment on #{pr_number}: {e}"))
            })?;
        Ok(comment.id.0)
    }
}

/// Find the open pull request for `branch` of `owner`.
///
/// Returns `Ok(None)` when there is none. When several open pull requests
/// share the head branch the first one returned by the API is used and the
/// ambiguity is logged.
pub async fn find_pull_request(
    tracker: &dyn PullRequestTracker,
    owner: &str,
    branch: &str,
) -> Result<Option<u64>, DiffwiseError> {
    let head = format!("{owner}:{branch}");
    let numbers = tracker.open_pull_requests(&head).await?;

    match numbers.as_slice() {
        [] => Ok(None),
        [only] => {
            info!(pr_number = only, %head, "found pull request");
            Ok(Some(*only))
        }
        [first, ..] => {
            warn!(
                pr_number = first,
                candidates = ?numbers,
                %head,
                "several open pull requests share this branch, using the first"
            );
            Ok(Some(*first))
        }
    }
}
