use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobFetchError {
    #[error("ContentError: {0}")]
    ContentError(#[from] ContentError),
    #[error("FetchError: {0}")]
    FetchError(#[from] FetchError),
    #[error("FilesystemError: {0}")]
    FilesystemError(#[from] FilesystemError),
    #[error("GixError: {0}")]
    GixError(#[from] GixError),
    #[error("ObjectNotFoundError: {0}")]
    ObjectNotFoundError(#[from] ObjectNotFoundError),
    #[error("ValueError: {0}")]
    ValueError(#[from] ValueError),
}

#[derive(Debug, Error)]
pub enum GixError {
    #[error(transparent)]
    ObjectCommit(#[from] gix::object::commit::Error),
    #[error(transparent)]
    ObjectDecode(#[from] gix::objs::decode::Error),
    #[error(transparent)]
    ObjectFind(#[from] gix::object::find::Error),
    #[error(transparent)]
    ObjectTryInto(#[from] gix::object::try_into::Error),
}

#[derive(Debug, PartialEq, Error, Deserialize, Serialize)]
pub enum ContentError {
    #[error("object `{oid}` is a {actual}, expected a {expected}")]
    UnexpectedKind {
        oid: String,
        expected: String,
        actual: String,
    },
}

#[derive(Debug, PartialEq, Error, Deserialize, Serialize)]
pub enum FetchError {
    #[error("invalid repository url `{url}`: {msg}")]
    InvalidUrl {
        url: String,
        msg: String,
    },
    #[error("`{transport}` transport does not support {feature}")]
    Unsupported {
        transport: String,
        feature: String,
    },
    #[error("`{transport}` transport failed to fetch from `{url}`: {msg}")]
    Transport {
        transport: String,
        url: String,
        msg: String,
    },
    #[error("failed to execute `{program}`: {msg}")]
    Spawn {
        program: String,
        msg: String,
    },
    #[error("`{program}` exited with code {code}: {stderr}")]
    NonZero {
        program: String,
        code: i32,
        stderr: String,
    },
    #[error("{primary}; fallback also failed: {fallback}")]
    Fallback {
        primary: Box<FetchError>,
        fallback: Box<FetchError>,
    },
}

#[derive(Debug, PartialEq, Error, Deserialize, Serialize)]
pub enum FilesystemError {
    #[error("cannot create directory `{path}`: {msg}")]
    CreateDir {
        path: String,
        msg: String,
    },
    #[error("cannot initialize bare object store at `{path}`: {msg}")]
    InitStore {
        path: String,
        msg: String,
    },
    #[error("cannot open object store at `{path}`: {msg}")]
    OpenStore {
        path: String,
        msg: String,
    },
}

#[derive(Debug, PartialEq, Error, Deserialize, Serialize)]
pub enum ObjectNotFoundError {
    #[error("commit `{oid}` is not in the local object store")]
    Commit {
        oid: String,
    },
    #[error("tree `{oid}` is not in the local object store")]
    Tree {
        oid: String,
    },
}

#[derive(Debug, PartialEq, Error, Deserialize, Serialize)]
pub enum ValueError {
    #[error("`{value}` is not a valid object id: {msg}")]
    InvalidObjectId {
        value: String,
        msg: String,
    },
}
