//! Job workspace management.
//!
//! A [`JobWorkspace`] owns the output root. Every job gets one durable
//! directory named after its [`JobId`] directly under that root, plus a
//! scratch directory that exists only while [`JobWorkspace::with_scratch`]
//! runs.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use mt_core::{Error, JobId};
use tempfile::TempDir;

use crate::job::Job;

/// Prefix of every scratch directory.
pub const SCRATCH_PREFIX: &str = "mediatranscript-";

/// Allocates durable job directories and ephemeral scratch space.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    output_root: PathBuf,
    scratch_root: Option<PathBuf>,
}

impl JobWorkspace {
    /// Open a workspace rooted at `output_root`, creating the root if needed.
    pub fn new(output_root: impl Into<PathBuf>) -> mt_core::Result<Self> {
        let output_root = output_root.into();
        std::fs::create_dir_all(&output_root).map_err(|e| {
            Error::Workspace(format!(
                "cannot create output root {}: {e}",
                output_root.display()
            ))
        })?;
        Ok(Self {
            output_root,
            scratch_root: None,
        })
    }

    /// Builder: create scratch directories under `root` instead of the OS
    /// temp directory.
    pub fn with_scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch_root = root;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Durable directory of `id` (whether or not it exists).
    pub fn job_dir(&self, id: &JobId) -> PathBuf {
        self.output_root.join(id.as_str())
    }

    /// Allocate a new job and create its durable directory.
    ///
    /// The directory is created with `create_dir`, so an identifier that
    /// already exists on disk is reported instead of silently reused.
    pub async fn create_job(&self) -> mt_core::Result<Job> {
        let id = JobId::new();
        let dir = self.job_dir(&id);
        tokio::fs::create_dir(&dir).await.map_err(|e| {
            Error::Workspace(format!("cannot create job directory {}: {e}", dir.display()))
        })?;
        tracing::debug!(job_id = %id, dir = %dir.display(), "job directory created");
        Ok(Job::new(id, dir))
    }

    /// Run `f` with a fresh scratch directory that is removed afterwards.
    ///
    /// Removal happens on every exit path: `f` returning `Ok` or `Err`, a
    /// panic unwinding through this call, or the returned future being
    /// dropped before completion.
    pub async fn with_scratch<F, Fut, T>(&self, f: F) -> mt_core::Result<T>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = mt_core::Result<T>>,
    {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let scratch: TempDir = match self.scratch_root {
            Some(ref root) => std::fs::create_dir_all(root).and_then(|()| builder.tempdir_in(root)),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::Workspace(format!("cannot create scratch directory: {e}")))?;

        let path = scratch.path().to_path_buf();
        tracing::trace!(scratch = %path.display(), "scratch acquired");

        let result = f(path.clone()).await;

        if let Err(e) = scratch.close() {
            tracing::warn!("failed to remove scratch directory {}: {e}", path.display());
        }
        result
    }

    /// Guard that removes the durable directory of `id` when dropped,
    /// unless [`JobDirGuard::disarm`] is called first.
    ///
    /// Covers the exits that skip explicit cleanup: a panicking stage and a
    /// run future dropped mid-flight.
    pub fn guard_job(&self, id: &JobId) -> JobDirGuard {
        JobDirGuard {
            dir: Some(self.job_dir(id)),
        }
    }

    /// Remove a job's durable directory and everything in it.
    ///
    /// Idempotent: a directory that is already gone is not an error.
    pub async fn discard_job(&self, id: &JobId) -> mt_core::Result<()> {
        let dir = self.job_dir(id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(job_id = %id, "job directory discarded");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Workspace(format!(
                "cannot remove job directory {}: {e}",
                dir.display()
            ))),
        }
    }

    /// Resolve `file_name` inside the durable directory of `id`.
    ///
    /// Only a single plain file name is accepted, and the canonical result
    /// must still live inside the job directory (symlinks pointing elsewhere
    /// are rejected). Anything else is [`Error::NotFound`].
    pub async fn resolve_artifact(&self, id: &JobId, file_name: &str) -> mt_core::Result<PathBuf> {
        let not_found = || Error::not_found("report", format!("{id}/{file_name}"));

        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(not_found()),
        }

        let job_dir = tokio::fs::canonicalize(self.job_dir(id))
            .await
            .map_err(|_| not_found())?;
        let candidate = tokio::fs::canonicalize(job_dir.join(file_name))
            .await
            .map_err(|_| not_found())?;

        if !candidate.starts_with(&job_dir) {
            tracing::warn!(job_id = %id, file_name, "artifact resolves outside its job directory");
            return Err(not_found());
        }
        let meta = tokio::fs::metadata(&candidate).await.map_err(|_| not_found())?;
        if !meta.is_file() {
            return Err(not_found());
        }
        Ok(candidate)
    }
}

/// Removes a job directory on drop. See [`JobWorkspace::guard_job`].
#[derive(Debug)]
#[must_use = "the job directory is removed as soon as the guard is dropped"]
pub struct JobDirGuard {
    dir: Option<PathBuf>,
}

impl JobDirGuard {
    /// Keep the directory.
    pub fn disarm(mut self) {
        self.dir = None;
    }
}

impl Drop for JobDirGuard {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => tracing::warn!(dir = %dir.display(), "removed job directory of an unfinished run"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::error!("failed to remove job directory {}: {e}", dir.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn workspace() -> (tempfile::TempDir, JobWorkspace) {
        let root = tempfile::tempdir().unwrap();
        let ws = JobWorkspace::new(root.path().join("outputs")).unwrap();
        (root, ws)
    }

    #[tokio::test]
    async fn create_job_makes_directory() {
        let (_root, ws) = workspace();
        let job = ws.create_job().await.unwrap();
        assert!(job.dir().is_dir());
        assert_eq!(job.dir(), ws.job_dir(job.id()));
        assert_eq!(job.dir().parent().unwrap(), ws.output_root());
    }

    #[tokio::test]
    async fn create_job_fails_when_root_vanished() {
        let (root, ws) = workspace();
        std::fs::remove_dir_all(root.path().join("outputs")).unwrap();
        let err = ws.create_job().await.unwrap_err();
        assert_matches!(err, Error::Workspace(_));
    }

    #[tokio::test]
    async fn discard_is_recursive_and_idempotent() {
        let (_root, ws) = workspace();
        let job = ws.create_job().await.unwrap();
        std::fs::create_dir(job.dir().join("nested")).unwrap();
        std::fs::write(job.dir().join("nested").join("x.txt"), b"x").unwrap();

        ws.discard_job(job.id()).await.unwrap();
        assert!(!job.dir().exists());
        ws.discard_job(job.id()).await.unwrap();
    }

    #[tokio::test]
    async fn scratch_removed_on_success_and_error() {
        let (root, ws) = workspace();
        let ws = ws.with_scratch_root(Some(root.path().join("scratch")));

        let seen = ws
            .with_scratch(|dir| async move {
                assert!(dir.is_dir());
                assert!(dir
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .starts_with(SCRATCH_PREFIX));
                std::fs::write(dir.join("audio.wav"), b"RIFF").unwrap();
                Ok::<_, Error>(dir)
            })
            .await
            .unwrap();
        assert!(!seen.exists());

        let mut failed_dir = None;
        let result: mt_core::Result<()> = ws
            .with_scratch(|dir| {
                failed_dir = Some(dir.clone());
                async move { Err(Error::Extraction("boom".into())) }
            })
            .await;
        assert!(result.is_err());
        assert!(!failed_dir.unwrap().exists());
    }

    #[tokio::test]
    async fn scratch_removed_when_future_is_dropped() {
        let (root, ws) = workspace();
        let ws = ws.with_scratch_root(Some(root.path().join("scratch")));
        let (tx, rx) = tokio::sync::oneshot::channel();

        let fut = ws.with_scratch(|dir| async move {
            let _ = tx.send(dir);
            std::future::pending::<mt_core::Result<()>>().await
        });
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(50), fut).await;
        assert!(timed_out.is_err());

        let dir = rx.await.unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn scratch_root_failure_is_a_workspace_error() {
        let (root, ws) = workspace();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let ws = ws.with_scratch_root(Some(blocker.join("scratch")));

        let err = ws
            .with_scratch(|_| async { Ok::<_, Error>(()) })
            .await
            .unwrap_err();
        assert_matches!(err, Error::Workspace(_));
    }

    #[tokio::test]
    async fn job_guard_removes_directory_unless_disarmed() {
        let (_root, ws) = workspace();

        let dropped = ws.create_job().await.unwrap();
        std::fs::write(dropped.dir().join("transcript.txt"), b"partial").unwrap();
        drop(ws.guard_job(dropped.id()));
        assert!(!dropped.dir().exists());

        let kept = ws.create_job().await.unwrap();
        ws.guard_job(kept.id()).disarm();
        assert!(kept.dir().is_dir());

        // Already discarded: dropping the guard is a no-op.
        let gone = ws.create_job().await.unwrap();
        let guard = ws.guard_job(gone.id());
        ws.discard_job(gone.id()).await.unwrap();
        drop(guard);
        assert!(!gone.dir().exists());
    }

    #[tokio::test]
    async fn resolve_artifact_finds_files() {
        let (_root, ws) = workspace();
        let job = ws.create_job().await.unwrap();
        std::fs::write(job.dir().join("report.pdf"), b"%PDF").unwrap();

        let path = ws.resolve_artifact(job.id(), "report.pdf").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn resolve_artifact_rejects_traversal() {
        let (root, ws) = workspace();
        let job = ws.create_job().await.unwrap();
        std::fs::write(root.path().join("secret.txt"), b"secret").unwrap();
        std::fs::create_dir(job.dir().join("sub")).unwrap();

        for name in ["../../secret.txt", "..", "/etc/passwd", "sub", "missing.txt", "", "."] {
            let err = ws.resolve_artifact(job.id(), name).await.unwrap_err();
            assert_eq!(err.http_status(), 404, "{name}");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolve_artifact_rejects_escaping_symlink() {
        let (root, ws) = workspace();
        let job = ws.create_job().await.unwrap();
        let secret = root.path().join("secret.txt");
        std::fs::write(&secret, b"secret").unwrap();
        std::os::unix::fs::symlink(&secret, job.dir().join("link.txt")).unwrap();

        let err = ws.resolve_artifact(job.id(), "link.txt").await.unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn resolve_artifact_of_unknown_job() {
        let (_root, ws) = workspace();
        let err = ws
            .resolve_artifact(&JobId::new(), "report.docx")
            .await
            .unwrap_err();
        assert_matches!(err, Error::NotFound { .. });
    }
}
