//! Git backend for mdcatalog
//!
//! Every write to the store is recorded as a commit, so the catalog's history
//! (which product was added, which category was created for it) is the git log.

use git2::{Repository as Git2Repo, Signature};
use std::path::Path;

/// Git repository wrapper
pub struct Repository {
    inner: Git2Repo,
    author_name: String,
    author_email: String,
}

impl Repository {
    /// Open an existing repository or initialize a new one.
    ///
    /// The author is only used when the repository's git config has no
    /// `user.name`/`user.email`.
    pub fn open_or_init(path: &Path, author_name: &str, author_email: &str) -> crate::Result<Self> {
        let inner = match Git2Repo::open(path) {
            Ok(repo) => repo,
            Err(_) => {
                let repo = Git2Repo::init(path)?;
                Self::create_initial_commit(&repo, author_name, author_email)?;
                tracing::info!(path = ?path, "initialized catalog repository");
                repo
            }
        };

        Ok(Self {
            inner,
            author_name: author_name.to_string(),
            author_email: author_email.to_string(),
        })
    }

    fn create_initial_commit(repo: &Git2Repo, name: &str, email: &str) -> crate::Result<()> {
        let sig = Signature::now(name, email)?;
        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        repo.commit(Some("HEAD"), &sig, &sig, "Initialize catalog", &tree, &[])?;

        Ok(())
    }

    /// Stage everything and commit it with a message
    pub fn commit(&self, message: &str) -> crate::Result<git2::Oid> {
        let sig = self.signature()?;
        let mut index = self.inner.index()?;

        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        // pick up deletions as well as additions
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let parent = self.inner.head()?.peel_to_commit()?;

        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;

        tracing::debug!(%oid, message, "committed");
        Ok(oid)
    }

    /// Get the current HEAD commit hash
    pub fn head_hash(&self) -> crate::Result<String> {
        let commit = self.inner.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    /// Number of commits reachable from HEAD
    pub fn commit_count(&self) -> crate::Result<usize> {
        let mut walk = self.inner.revwalk()?;
        walk.push_head()?;
        Ok(walk.count())
    }

    /// Check if there are uncommitted changes
    pub fn has_changes(&self) -> crate::Result<bool> {
        let statuses = self.inner.statuses(None)?;
        Ok(!statuses.is_empty())
    }

    fn signature(&self) -> crate::Result<Signature<'static>> {
        self.inner
            .signature()
            .or_else(|_| Signature::now(&self.author_name, &self.author_email))
            .map_err(Into::into)
    }
}
