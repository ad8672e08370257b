use std::{
    ffi::OsStr,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
    process::{
        Command,
        Output,
        Stdio,
    },
};

use crate::error::FetchError;
use super::{
    FetchRequest,
    GitTransport,
    ObjectFilter,
};

/// Fetches by running the system `git` against the local object store.
pub struct SubprocessTransport {
    program: PathBuf,
    remote_name: String,
}

impl SubprocessTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            remote_name: "origin".to_string(),
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> FetchError {
        FetchError::Spawn {
            program: self.program.display().to_string(),
            msg: e.to_string(),
        }
    }

    fn run(
        &self,
        store: &Path,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
        input: Option<String>,
    ) -> Result<Output, FetchError> {
        let mut command = Command::new(&self.program);
        command
            .arg("--git-dir")
            .arg(store)
            .args(args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        trace!("will run: {command:?}");

        let mut child = command.spawn()
            .map_err(|e| self.spawn_error(e))?;
        if let Some(input) = input {
            // dropping stdin at the end of this block closes the want-list
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes())
                    .map_err(|e| self.spawn_error(e))?;
            }
        }
        let output = child.wait_with_output()
            .map_err(|e| self.spawn_error(e))?;
        let code = output.status.code().unwrap_or(-1);
        trace!("{:?} exit with code {code}", self.program);
        if !output.status.success() {
            return Err(FetchError::NonZero {
                program: self.program.display().to_string(),
                code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    fn config(&self, store: &Path, key: &str, value: &str) -> Result<(), FetchError> {
        self.run(store, ["config", key, value], None)?;
        Ok(())
    }

    // `git fetch --filter` is only accepted against the remote that the
    // repository records as its partial clone source.
    fn register_remote(
        &self,
        url: &str,
        store: &Path,
        filter: Option<ObjectFilter>,
    ) -> Result<(), FetchError> {
        let remote = self.remote_name.as_str();
        self.config(store, &format!("remote.{remote}.url"), url)?;
        self.config(store, &format!("remote.{remote}.promisor"), "true")?;
        if let Some(filter) = filter {
            self.config(store, "core.repositoryformatversion", "1")?;
            self.config(store, "extensions.partialClone", remote)?;
            self.config(
                store,
                &format!("remote.{remote}.partialclonefilter"),
                filter.as_str(),
            )?;
        }
        Ok(())
    }
}

impl Default for SubprocessTransport {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitTransport for SubprocessTransport {
    fn name(&self) -> &str {
        "subprocess"
    }

    fn fetch(
        &self,
        path: &str,
        store: &Path,
        request: &FetchRequest,
    ) -> Result<(), FetchError> {
        self.register_remote(path, store, request.filter)?;

        let mut args = vec![
            "-c".to_string(),
            format!("protocol.version={}", request.protocol_version),
            "-c".to_string(),
            "fetch.negotiationAlgorithm=noop".to_string(),
            "fetch".to_string(),
            "--quiet".to_string(),
            "--no-tags".to_string(),
            "--no-write-fetch-head".to_string(),
            "--recurse-submodules=no".to_string(),
        ];
        if let Some(filter) = request.filter {
            args.push(format!("--filter={filter}"));
        }
        if let Some(depth) = request.depth {
            args.push(format!("--depth={depth}"));
        }
        args.push("--stdin".to_string());
        args.push(self.remote_name.clone());

        let wants = request.wants
            .iter()
            .map(|oid| format!("{oid}\n"))
            .collect::<String>();
        info!(
            "Fetching {} object(s) from <{path}> using {:?}...",
            request.wants.len(),
            self.program,
        );
        self.run(store, &args, Some(wants))?;
        info!("Fetched from <{path}>");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gix::ObjectId;
    use tempfile::TempDir;

    use crate::store::{
        GixStore,
        ObjectStore,
    };

    fn oid() -> ObjectId {
        ObjectId::from_hex(b"8ae6e9af37c8bd78614545d0ab807348fc46dcab").unwrap()
    }

    #[test]
    fn test_missing_program() {
        let store = TempDir::new().unwrap();
        let transport = SubprocessTransport::new("/nonexistent/bin/git");
        let err = transport.fetch(
            "file:///nonexistent",
            store.path(),
            &FetchRequest::objects(vec![oid()]),
        ).unwrap_err();
        assert!(matches!(err, FetchError::Spawn { .. }));
    }

    #[test]
    fn test_unreachable_remote_registers_partial_clone() {
        let root = TempDir::new().unwrap();
        let store = GixStore::open_or_init(root.path().join("store")).unwrap();
        let transport = SubprocessTransport::default();
        let url = test_blobfetch::file_url(&root.path().join("no_such_remote"));
        let err = transport.fetch(
            &url,
            store.path(),
            &FetchRequest::commit_without_blobs(oid()),
        ).unwrap_err();
        match err {
            FetchError::NonZero { program, code, .. } => {
                assert_eq!(program, "git");
                assert_ne!(code, 0);
            }
            _ => panic!("unexpected error {err:?}"),
        }

        let config = std::fs::read_to_string(store.path().join("config"))
            .unwrap()
            .to_lowercase();
        assert!(config.contains(&format!("url = {}", url.to_lowercase())));
        assert!(config.contains("promisor = true"));
        assert!(config.contains("partialclone = origin"));
        assert!(config.contains("partialclonefilter = blob:none"));
    }
}
