use gix::ObjectId;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    path::PathBuf,
};

use crate::{
    collect::{
        collect_missing_blobs,
        unique_blobs,
    },
    config::FetchConfig,
    error::BlobFetchError,
    fetch::{
        fetch_blobs,
        fetch_commit,
    },
    store::{
        GixStore,
        ObjectStore,
    },
    transport::{
        GitTransport,
        Remote,
        SubprocessTransport,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Stage {
    StoreCreated,
    CommitFetched,
    BlobsIdentified,
    BlobsFetched,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Outcome {
    pub directory: PathBuf,
    pub commit: String,
    pub tree: String,
    pub transport: String,
    pub blobs: Vec<String>,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fetched {} blobs into {}",
            self.blobs.len(),
            self.directory.display(),
        )
    }
}

pub struct PartialFetch<'a, S: ObjectStore> {
    store: &'a S,
    remote: &'a Remote,
    fallback: &'a dyn GitTransport,
    stage: Stage,
}

impl<'a, S: ObjectStore> PartialFetch<'a, S> {
    pub fn new(
        store: &'a S,
        remote: &'a Remote,
        fallback: &'a dyn GitTransport,
    ) -> Self {
        Self {
            store,
            remote,
            fallback,
            stage: Stage::StoreCreated,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        info!("{:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    pub fn run(&mut self, commit: &ObjectId) -> Result<Outcome, BlobFetchError> {
        let result = self.execute(commit);
        if let Err(e) = &result {
            error!("partial fetch of {commit} failed: {e}");
            self.advance(Stage::Failed);
        }
        result
    }

    fn execute(&mut self, commit: &ObjectId) -> Result<Outcome, BlobFetchError> {
        let store = self.store;
        let transport = fetch_commit(self.remote, self.fallback, store.path(), commit)?;
        self.advance(Stage::CommitFetched);

        let tree = store.commit_tree(commit)?;
        let wants = unique_blobs(&collect_missing_blobs(store, &tree)?);
        self.advance(Stage::BlobsIdentified);

        fetch_blobs(self.remote, store.path(), &wants)?;
        self.advance(Stage::BlobsFetched);

        Ok(Outcome {
            directory: store.path().to_path_buf(),
            commit: commit.to_string(),
            tree: tree.to_string(),
            transport,
            blobs: wants.iter().map(ToString::to_string).collect(),
        })
    }
}

/// Both phases against the configured remote: the commit and its trees,
/// then whichever of its blobs the store still lacks.
pub fn partial_fetch(config: &FetchConfig) -> Result<Outcome, BlobFetchError> {
    let store = GixStore::open_or_init(&config.target)?;
    let remote = Remote::resolve(&config.url, &config.git_program)?;
    let fallback = SubprocessTransport::new(&config.git_program);
    PartialFetch::new(&store, &remote, &fallback).run(&config.commit)
}
