use gix::ObjectId;
use std::path::Path;

use crate::{
    collect::unique_blobs,
    error::FetchError,
    transport::{
        FetchRequest,
        GitTransport,
        Remote,
    },
};

/// Fetches the commit and its trees, without blobs or ancestors.
///
/// Any failure of the resolved transport is followed by exactly one
/// attempt of the same request through `fallback` against the original
/// url.  Returns the name of the transport that succeeded.
pub fn fetch_commit(
    remote: &Remote,
    fallback: &dyn GitTransport,
    store: &Path,
    commit: &ObjectId,
) -> Result<String, FetchError> {
    let request = FetchRequest::commit_without_blobs(*commit);
    info!("Fetching commit {commit} without blobs from <{}>...", remote.url());
    match remote.fetch(store, &request) {
        Ok(()) => Ok(remote.transport().name().to_string()),
        Err(primary) => {
            warn!(
                "`{}` transport failed ({primary}); retrying with `{}`",
                remote.transport().name(),
                fallback.name(),
            );
            match fallback.fetch(remote.url(), store, &request) {
                Ok(()) => Ok(fallback.name().to_string()),
                Err(e) => Err(FetchError::Fallback {
                    primary: Box::new(primary),
                    fallback: Box::new(e),
                }),
            }
        }
    }
}

/// Fetches the listed blobs in full, each id requested once.  Nothing is
/// sent when there is nothing to request.  Returns the number of ids
/// requested.
pub fn fetch_blobs(
    remote: &Remote,
    store: &Path,
    blobs: &[ObjectId],
) -> Result<usize, FetchError> {
    let wants = unique_blobs(blobs);
    if wants.is_empty() {
        info!("No blobs missing, skipping blob fetch");
        return Ok(0);
    }
    let count = wants.len();
    info!("Fetching {count} blob(s) from <{}>...", remote.url());
    remote.fetch(store, &FetchRequest::objects(wants))?;
    Ok(count)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mockall::{
        mock,
        predicate::*,
    };

    use crate::transport::ObjectFilter;

    mock! {
        pub Transport {}
        impl GitTransport for Transport {
            fn name(&self) -> &str;
            fn fetch(
                &self,
                path: &str,
                store: &Path,
                request: &FetchRequest,
            ) -> Result<(), FetchError>;
        }
    }

    pub(crate) const COMMIT: &str = "8ae6e9af37c8bd78614545d0ab807348fc46dcab";

    pub(crate) fn oid(s: &str) -> ObjectId {
        ObjectId::from_hex(s.as_bytes()).unwrap()
    }

    pub(crate) fn named(name: &'static str) -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_name()
            .return_const(name.to_string());
        transport
    }

    fn failure(transport: &str) -> FetchError {
        FetchError::Transport {
            transport: transport.to_string(),
            url: "https://git.example.com/repo.git".to_string(),
            msg: "connection reset".to_string(),
        }
    }

    #[test]
    fn test_fetch_commit_primary() {
        let commit = oid(COMMIT);
        let mut primary = named("primary");
        primary.expect_fetch()
            .times(1)
            .withf(move |path, _, request| {
                path == "/repo.git"
                    && request.wants == vec![commit]
                    && request.filter == Some(ObjectFilter::BlobNone)
                    && request.depth.map(|d| d.get()) == Some(1)
            })
            .returning(|_, _, _| Ok(()));
        let mut fallback = named("fallback");
        fallback.expect_fetch().never();

        let remote = Remote::new(
            "https://git.example.com/repo.git", "/repo.git", Box::new(primary));
        let used = fetch_commit(
            &remote, &fallback, Path::new("/tmp/store"), &commit).unwrap();
        assert_eq!(used, "primary");
    }

    #[test]
    fn test_fetch_commit_fallback_identical_request() {
        let commit = oid(COMMIT);
        let expected = FetchRequest::commit_without_blobs(commit);
        let mut primary = named("primary");
        primary.expect_fetch()
            .times(1)
            .with(always(), eq(Path::new("/tmp/store")), eq(expected.clone()))
            .returning(|_, _, _| Err(failure("primary")));
        let mut fallback = named("fallback");
        fallback.expect_fetch()
            .times(1)
            .with(
                eq("https://git.example.com/repo.git"),
                eq(Path::new("/tmp/store")),
                eq(expected),
            )
            .returning(|_, _, _| Ok(()));

        let remote = Remote::new(
            "https://git.example.com/repo.git", "/repo.git", Box::new(primary));
        let used = fetch_commit(
            &remote, &fallback, Path::new("/tmp/store"), &commit).unwrap();
        assert_eq!(used, "fallback");
    }

    #[test]
    fn test_fetch_commit_fallback_exhausted() {
        let commit = oid(COMMIT);
        let mut primary = named("primary");
        primary.expect_fetch()
            .times(1)
            .returning(|_, _, _| Err(failure("primary")));
        let mut fallback = named("fallback");
        fallback.expect_fetch()
            .times(1)
            .returning(|_, _, _| Err(failure("fallback")));

        let remote = Remote::new(
            "https://git.example.com/repo.git", "/repo.git", Box::new(primary));
        let err = fetch_commit(
            &remote, &fallback, Path::new("/tmp/store"), &commit).unwrap_err();
        assert_eq!(err, FetchError::Fallback {
            primary: Box::new(failure("primary")),
            fallback: Box::new(failure("fallback")),
        });
        assert_eq!(
            err.to_string(),
            "`primary` transport failed to fetch from \
            `https://git.example.com/repo.git`: connection reset; \
            fallback also failed: `fallback` transport failed to fetch from \
            `https://git.example.com/repo.git`: connection reset",
        );
    }

    #[test]
    fn test_fetch_blobs_empty_is_noop() {
        let mut primary = named("primary");
        primary.expect_fetch().never();
        let remote = Remote::new(
            "https://git.example.com/repo.git", "/repo.git", Box::new(primary));
        assert_eq!(fetch_blobs(&remote, Path::new("/tmp/store"), &[]).unwrap(), 0);
    }

    #[test]
    fn test_fetch_blobs_unique_full_request() {
        let b1 = oid("1111111111111111111111111111111111111111");
        let b2 = oid("2222222222222222222222222222222222222222");
        let mut primary = named("primary");
        primary.expect_fetch()
            .times(1)
            .with(
                eq("/repo.git"),
                always(),
                eq(FetchRequest::objects(vec![b2, b1])),
            )
            .returning(|_, _, _| Ok(()));
        let remote = Remote::new(
            "https://git.example.com/repo.git", "/repo.git", Box::new(primary));
        let count = fetch_blobs(
            &remote, Path::new("/tmp/store"), &[b2, b1, b2]).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_fetch_blobs_no_fallback() {
        let b1 = oid("1111111111111111111111111111111111111111");
        let mut primary = named("primary");
        primary.expect_fetch()
            .times(1)
            .returning(|_, _, _| Err(failure("primary")));
        let remote = Remote::new(
            "https://git.example.com/repo.git", "/repo.git", Box::new(primary));
        let err = fetch_blobs(&remote, Path::new("/tmp/store"), &[b1]).unwrap_err();
        assert_eq!(err, failure("primary"));
    }
}
