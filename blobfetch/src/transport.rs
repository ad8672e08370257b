use gix::ObjectId;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    num::NonZeroU32,
    path::Path,
};

use crate::error::FetchError;

mod smart_http;
mod resolve;
mod subprocess;

pub use smart_http::HttpTransport;
pub use resolve::Remote;
pub use subprocess::SubprocessTransport;

/// Server-side object filters understood by the fetchers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ObjectFilter {
    BlobNone,
}

impl ObjectFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlobNone => "blob:none",
        }
    }
}

impl fmt::Display for ObjectFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ProtocolVersion {
    V2,
}

impl ProtocolVersion {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::V2 => 2,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub wants: Vec<ObjectId>,
    pub filter: Option<ObjectFilter>,
    pub depth: Option<NonZeroU32>,
    pub protocol_version: ProtocolVersion,
}

impl FetchRequest {
    /// Exactly the commit and its trees: no blobs, no ancestors.
    pub fn commit_without_blobs(commit: ObjectId) -> Self {
        Self {
            wants: vec![commit],
            filter: Some(ObjectFilter::BlobNone),
            depth: NonZeroU32::new(1),
            protocol_version: ProtocolVersion::V2,
        }
    }

    /// Exactly the listed objects, in full.
    pub fn objects(wants: Vec<ObjectId>) -> Self {
        Self {
            wants,
            filter: None,
            depth: None,
            protocol_version: ProtocolVersion::V2,
        }
    }
}

/// A client able to fetch an arbitrary want-list from a remote into the
/// local object store at `store`.  The `path` is whatever the resolver
/// produced alongside the transport.
pub trait GitTransport {
    fn name(&self) -> &str;
    fn fetch(
        &self,
        path: &str,
        store: &Path,
        request: &FetchRequest,
    ) -> Result<(), FetchError>;
}
