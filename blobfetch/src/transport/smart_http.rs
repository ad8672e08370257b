use gix::{
    config::tree::{
        Key,
        Protocol,
    },
    remote::{
        Direction,
        fetch::Shallow,
    },
};
use std::{
    fmt::Display,
    path::Path,
    sync::atomic::AtomicBool,
};

use crate::error::FetchError;
use super::{
    FetchRequest,
    GitTransport,
};

/// Smart HTTP(S) client backed by gix.
///
/// The gix client does not send partial clone filters, so any request
/// carrying one is refused up front rather than silently fetching blobs.
pub struct HttpTransport {
    base: String,
}

impl HttpTransport {
    /// `base` is the `scheme://authority` part of the remote url.
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    fn error(&self, url: &str, e: impl Display) -> FetchError {
        FetchError::Transport {
            transport: self.name().to_string(),
            url: url.to_string(),
            msg: e.to_string(),
        }
    }
}

impl GitTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(
        &self,
        path: &str,
        store: &Path,
        request: &FetchRequest,
    ) -> Result<(), FetchError> {
        let url = format!("{}{}", self.base, path);
        if let Some(filter) = request.filter {
            return Err(FetchError::Unsupported {
                transport: self.name().to_string(),
                feature: format!("the `{filter}` object filter"),
            });
        }
        info!("Fetching {} object(s) from <{url}>...", request.wants.len());

        let version = Protocol::VERSION
            .validated_assignment_fmt(&request.protocol_version.as_u8())
            .map_err(|e| self.error(&url, e))?;
        let repo = gix::open::Options::isolated()
            .open_path_as_is(true)
            .config_overrides([version])
            .open(store)
            .map_err(|e| self.error(&url, e))?
            .to_thread_local();

        let refspecs = request.wants
            .iter()
            .map(|oid| oid.to_hex().to_string())
            .collect::<Vec<_>>();
        let remote = repo
            .remote_at(url.as_str())
            .map_err(|e| self.error(&url, e))?
            .with_refspecs(refspecs.iter().map(String::as_str), Direction::Fetch)
            .map_err(|e| self.error(&url, e))?;
        let shallow = request.depth
            .map(Shallow::DepthAtRemote)
            .unwrap_or(Shallow::NoChange);

        remote
            .connect(Direction::Fetch)
            .map_err(|e| self.error(&url, e))?
            .prepare_fetch(gix::progress::Discard, Default::default())
            .map_err(|e| self.error(&url, e))?
            .with_shallow(shallow)
            .receive(gix::progress::Discard, &AtomicBool::new(false))
            .map_err(|e| self.error(&url, e))?;
        info!("Fetched from <{url}>");
        Ok(())
    }
}
