use http::Uri;
use std::path::{
    Path,
    PathBuf,
};

use crate::error::FetchError;
use super::{
    FetchRequest,
    GitTransport,
    HttpTransport,
    SubprocessTransport,
};

/// A repository url together with the transport chosen for it and the
/// path that transport is to be given.
pub struct Remote {
    url: String,
    path: String,
    transport: Box<dyn GitTransport>,
}

impl Remote {
    pub fn new(
        url: impl Into<String>,
        path: impl Into<String>,
        transport: Box<dyn GitTransport>,
    ) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            transport,
        }
    }

    /// Picks the transport purely from the url scheme: http(s) goes to
    /// the native client, everything else to the `git` executable.
    pub fn resolve(
        url: &str,
        git_program: impl Into<PathBuf>,
    ) -> Result<Self, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                msg: "empty url".to_string(),
            });
        }
        let lowered = url.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            let uri = url.parse::<Uri>()
                .map_err(|e| FetchError::InvalidUrl {
                    url: url.to_string(),
                    msg: e.to_string(),
                })?;
            let (scheme, authority) = match (uri.scheme_str(), uri.authority()) {
                (Some(scheme), Some(authority)) => (scheme, authority),
                _ => return Err(FetchError::InvalidUrl {
                    url: url.to_string(),
                    msg: "missing host".to_string(),
                }),
            };
            let path = uri.path_and_query()
                .map(|p| p.as_str())
                .unwrap_or("/");
            debug!("resolved <{url}> to http transport");
            Ok(Self::new(
                url,
                path,
                Box::new(HttpTransport::new(format!("{scheme}://{authority}"))),
            ))
        }
        else {
            debug!("resolved <{url}> to subprocess transport");
            Ok(Self::new(
                url,
                url,
                Box::new(SubprocessTransport::new(git_program)),
            ))
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn transport(&self) -> &dyn GitTransport {
        self.transport.as_ref()
    }

    pub fn fetch(&self, store: &Path, request: &FetchRequest) -> Result<(), FetchError> {
        self.transport.fetch(&self.path, store, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_https() {
        let remote = Remote::resolve(
            "https://git.example.com:8443/group/repo.git", "git").unwrap();
        assert_eq!(remote.transport().name(), "http");
        assert_eq!(remote.path(), "/group/repo.git");
        assert_eq!(remote.url(), "https://git.example.com:8443/group/repo.git");
    }

    #[test]
    fn test_resolve_http_without_path() {
        let remote = Remote::resolve("http://git.example.com", "git").unwrap();
        assert_eq!(remote.transport().name(), "http");
        assert_eq!(remote.path(), "/");
    }

    #[test]
    fn test_resolve_subprocess() {
        for url in [
            "file:///srv/git/repo.git",
            "/srv/git/repo.git",
            "ssh://git@git.example.com/repo.git",
            "git@git.example.com:repo.git",
            "git://git.example.com/repo.git",
        ] {
            let remote = Remote::resolve(url, "git").unwrap();
            assert_eq!(remote.transport().name(), "subprocess");
            assert_eq!(remote.path(), url);
        }
    }

    #[test]
    fn test_resolve_invalid() {
        assert!(matches!(
            Remote::resolve("", "git"),
            Err(FetchError::InvalidUrl { .. }),
        ));
        assert!(matches!(
            Remote::resolve("https://", "git"),
            Err(FetchError::InvalidUrl { .. }),
        ));
    }
}
