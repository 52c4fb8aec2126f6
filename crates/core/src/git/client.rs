//! Local Git repository operations via `git2`.

use std::path::{Path, PathBuf};

use git2::{ErrorCode, IndexAddOption, Oid, PushOptions, RemoteCallbacks, Repository, Signature};
use tracing::{debug, info, instrument, warn};

use crate::errors::GitError;

/// Outcome of a push attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// The branch was pushed to the remote.
    Pushed,
    /// The repository has no such remote configured; push skipped.
    NoRemote,
}

/// High-level Git client wrapping a `git2::Repository`.
///
/// This is the single adapter through which the integrator touches version
/// control: init, stage, commit, tag, push, and upstream clone/update.
pub struct GitClient {
    repo: Repository,
    repo_path: PathBuf,
}

impl GitClient {
    /// Open an existing Git repository at `repo_path`.
    pub fn open<P: AsRef<Path>>(repo_path: P) -> Result<Self, GitError> {
        let path = repo_path.as_ref();
        debug!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path).map_err(|e| GitError::InitFailed {
            path: path.display().to_string(),
            detail: e.message().to_string(),
        })?;
        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    /// Open the repository at `path`, initializing a fresh one (creating
    /// the directory) if none exists. Idempotent.
    pub fn open_or_init<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let path = path.as_ref();
        match Repository::open(path) {
            Ok(repo) => Ok(Self {
                repo,
                repo_path: path.to_path_buf(),
            }),
            Err(_) => {
                info!(path = %path.display(), "initializing new repository");
                std::fs::create_dir_all(path).map_err(|e| GitError::InitFailed {
                    path: path.display().to_string(),
                    detail: e.to_string(),
                })?;
                let repo = Repository::init(path).map_err(|e| GitError::InitFailed {
                    path: path.display().to_string(),
                    detail: e.message().to_string(),
                })?;
                Ok(Self {
                    repo,
                    repo_path: path.to_path_buf(),
                })
            }
        }
    }

    /// Clone `url` to `path`, or fetch + fast-forward if already cloned.
    #[instrument(fields(url = %url, path = %path.display()))]
    pub fn clone_or_update(url: &str, path: &Path) -> Result<Self, GitError> {
        if path.join(".git").exists() {
            let client = Self::open(path)?;
            client.fetch_fast_forward("origin")?;
            return Ok(client);
        }
        info!("cloning upstream repository");
        let repo = Repository::clone(url, path)?;
        info!("clone completed");
        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Fetch from `remote_name` and fast-forward the current branch.
    #[instrument(skip(self))]
    pub fn fetch_fast_forward(&self, remote_name: &str) -> Result<(), GitError> {
        let mut remote = self.repo.find_remote(remote_name)?;
        remote.fetch(&[] as &[&str], None, None)?;

        let branch = self.current_branch()?;
        let fetch_head_ref = format!("refs/remotes/{}/{}", remote_name, branch);
        let fetch_commit = self
            .repo
            .find_reference(&fetch_head_ref)
            .map_err(|_| GitError::RefNotFound(fetch_head_ref.clone()))?
            .peel_to_commit()?;

        let head_ref = self.repo.head()?;
        if head_ref.is_branch() {
            let name = head_ref.name().unwrap_or("HEAD").to_string();
            let mut head_ref_mut = self.repo.find_reference(&name)?;
            head_ref_mut.set_target(fetch_commit.id(), "integrator: fast-forward update")?;
            self.repo.set_head(&name)?;
            self.repo
                .checkout_head(Some(git2::build::CheckoutBuilder::new().force()))?;
        }
        info!(remote = remote_name, "upstream updated");
        Ok(())
    }

    /// Stage the given relative paths.
    pub fn stage<I, S>(&self, paths: I) -> Result<(), GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(Path::new(path.as_ref()))?;
        }
        index.write()?;
        Ok(())
    }

    /// Stage every change in the working tree.
    pub fn stage_all(&self) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }

    /// Commit the staged index. Parent is HEAD when one exists.
    #[instrument(skip(self, message))]
    pub fn commit(
        &self,
        message: &str,
        author_name: &str,
        author_email: &str,
    ) -> Result<Oid, GitError> {
        let mut index = self.repo.index()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;
        let signature = Signature::now(author_name, author_email)
            .map_err(|e| GitError::CommitFailed(e.message().to_string()))?;
        let parent_commit = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();
        let oid = self
            .repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &parents,
            )
            .map_err(|e| GitError::CommitFailed(e.message().to_string()))?;
        info!(sha = %oid, "created commit");
        Ok(oid)
    }

    /// `true` if the working tree or index differ from HEAD.
    pub fn is_dirty(&self) -> Result<bool, GitError> {
        let statuses = self.repo.statuses(None)?;
        Ok(statuses.iter().any(|s| !s.status().is_ignored()))
    }

    /// Whether the repository has a remote named `name`.
    pub fn has_remote(&self, name: &str) -> Result<bool, GitError> {
        match self.repo.find_remote(name) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Push the current branch to `remote_name`.
    ///
    /// A missing remote is not an error: the commit stands locally and the
    /// push is skipped. Rejections and transport failures surface as
    /// [`GitError`]; the caller decides how loudly to report them.
    #[instrument(skip(self))]
    pub fn push(&self, remote_name: &str) -> Result<PushStatus, GitError> {
        let mut remote = match self.repo.find_remote(remote_name) {
            Ok(remote) => remote,
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!(remote = remote_name, "no remote configured, skipping push");
                return Ok(PushStatus::NoRemote);
            }
            Err(e) => return Err(e.into()),
        };

        let branch = self.current_branch()?;
        let mut callbacks = RemoteCallbacks::new();
        let push_error = std::sync::Arc::new(std::sync::Mutex::new(None::<String>));
        let push_error_clone = push_error.clone();
        callbacks.push_update_reference(move |refname, status| {
            if let Some(msg) = status {
                warn!(refname, msg, "push rejected");
                if let Ok(mut slot) = push_error_clone.lock() {
                    *slot = Some(msg.to_string());
                }
            }
            Ok(())
        });

        let mut push_opts = PushOptions::new();
        push_opts.remote_callbacks(callbacks);
        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
        remote.push(&[&refspec], Some(&mut push_opts))?;

        let rejection = push_error.lock().ok().and_then(|mut slot| slot.take());
        if let Some(detail) = rejection {
            return Err(GitError::PushRejected { branch, detail });
        }
        info!(remote = remote_name, branch, "push completed");
        Ok(PushStatus::Pushed)
    }

    /// Create an annotated tag on HEAD.
    #[instrument(skip(self, message))]
    pub fn tag(
        &self,
        name: &str,
        message: &str,
        tagger_name: &str,
        tagger_email: &str,
    ) -> Result<(), GitError> {
        let head = self.repo.head()?.peel(git2::ObjectType::Commit)?;
        let tagger = Signature::now(tagger_name, tagger_email)?;
        self.repo.tag(name, &head, &tagger, message, false)?;
        info!(tag = name, "created release tag");
        Ok(())
    }

    /// List all tag names.
    pub fn list_tags(&self) -> Result<Vec<String>, GitError> {
        let names = self.repo.tag_names(None)?;
        Ok(names
            .iter()
            .flatten()
            .map(|s| s.to_string())
            .collect())
    }

    /// Return the SHA of HEAD.
    pub fn head_sha(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        let commit = head.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    /// The shorthand name of the current branch.
    pub fn current_branch(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        head.shorthand()
            .map(|s| s.to_string())
            .ok_or_else(|| GitError::RefNotFound("HEAD".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit_file(client: &GitClient, rel: &str, content: &str) -> Oid {
        std::fs::write(client.repo_path().join(rel), content).unwrap();
        client.stage([rel]).unwrap();
        client
            .commit("test commit", "Test", "test@test.com")
            .unwrap()
    }

    #[test]
    fn test_open_or_init_creates_missing_repo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh/custom-content");
        assert!(!path.exists());

        let client = GitClient::open_or_init(&path).unwrap();
        assert!(path.join(".git").exists());

        // Second call is a no-op open.
        drop(client);
        GitClient::open_or_init(&path).unwrap();
    }

    #[test]
    fn test_open_missing_repo_fails() {
        assert!(matches!(
            GitClient::open("/nonexistent/repo"),
            Err(GitError::InitFailed { .. })
        ));
    }

    #[test]
    fn test_stage_and_commit() {
        let dir = tempfile::tempdir().unwrap();
        let client = GitClient::open_or_init(dir.path()).unwrap();
        let oid = commit_file(&client, "hello.yml", "hello: world");
        assert!(!oid.is_zero());
        assert_eq!(client.head_sha().unwrap(), oid.to_string());
    }

    #[test]
    fn test_push_without_remote_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let client = GitClient::open_or_init(dir.path()).unwrap();
        commit_file(&client, "f.yml", "x");
        assert_eq!(client.push("origin").unwrap(), PushStatus::NoRemote);
        assert!(!client.has_remote("origin").unwrap());
    }

    #[test]
    fn test_push_to_local_bare_remote() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("remote.git");
        git2::Repository::init_bare(&bare).unwrap();

        let work = dir.path().join("work");
        let client = GitClient::open_or_init(&work).unwrap();
        client
            .repo
            .remote("origin", bare.to_str().unwrap())
            .unwrap();
        commit_file(&client, "f.yml", "x");

        assert_eq!(client.push("origin").unwrap(), PushStatus::Pushed);
        assert!(client.has_remote("origin").unwrap());
    }

    #[test]
    fn test_tag_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let client = GitClient::open_or_init(dir.path()).unwrap();
        commit_file(&client, "f.yml", "x");
        client
            .tag("26.8.0", "release 26.8.0", "Test", "test@test.com")
            .unwrap();
        assert_eq!(client.list_tags().unwrap(), vec!["26.8.0"]);
    }

    #[test]
    fn test_is_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let client = GitClient::open_or_init(dir.path()).unwrap();
        commit_file(&client, "f.yml", "x");
        assert!(!client.is_dirty().unwrap());
        std::fs::write(dir.path().join("g.yml"), "y").unwrap();
        assert!(client.is_dirty().unwrap());
    }
}
