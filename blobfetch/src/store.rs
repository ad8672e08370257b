use gix::{
    ObjectId,
    Repository,
    ThreadSafeRepository,
    object::Kind,
    objs::tree::{
        self,
        EntryMode,
    },
};
use std::path::{
    Path,
    PathBuf,
};

use crate::error::{
    BlobFetchError,
    ContentError,
    FilesystemError,
    GixError,
    ObjectNotFoundError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Submodule,
}

impl From<EntryMode> for EntryKind {
    fn from(mode: EntryMode) -> Self {
        match mode.kind() {
            tree::EntryKind::Tree => Self::Directory,
            tree::EntryKind::Commit => Self::Submodule,
            tree::EntryKind::Blob
            | tree::EntryKind::BlobExecutable
            | tree::EntryKind::Link => Self::File,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
    pub oid: ObjectId,
}

/// The read side of a local object store, as needed to decide which
/// blobs a commit still lacks.
pub trait ObjectStore {
    fn path(&self) -> &Path;
    fn contains(&self, oid: &ObjectId) -> bool;
    /// The root tree of the commit, which must already be present.
    fn commit_tree(&self, commit: &ObjectId) -> Result<ObjectId, BlobFetchError>;
    /// Entries of the tree in their stored order.
    fn tree_entries(&self, tree: &ObjectId) -> Result<Vec<TreeEntry>, BlobFetchError>;
}

pub struct GixStore {
    path: PathBuf,
    repo: Repository,
}

fn unexpected_kind(oid: &ObjectId, expected: Kind, actual: Kind) -> ContentError {
    ContentError::UnexpectedKind {
        oid: oid.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

impl GixStore {
    /// Creates the directory and a bare repository inside it, or reopens
    /// the bare repository already there from an earlier run.
    pub fn open_or_init(path: impl Into<PathBuf>) -> Result<Self, FilesystemError> {
        let path = path.into();
        std::fs::create_dir_all(&path)
            .map_err(|e| FilesystemError::CreateDir {
                path: path.display().to_string(),
                msg: e.to_string(),
            })?;
        let repo = if path.join("HEAD").is_file() {
            info!("Found existing object store at {path:?}, reusing...");
            gix::open::Options::isolated()
                .open_path_as_is(true)
                .open(&path)
                .map_err(|e| FilesystemError::OpenStore {
                    path: path.display().to_string(),
                    msg: e.to_string(),
                })?
        }
        else {
            info!("Initializing bare object store at {path:?}...");
            ThreadSafeRepository::init_opts(
                &path,
                gix::create::Kind::Bare,
                gix::create::Options::default(),
                gix::open::Options::isolated(),
            )
                .map_err(|e| FilesystemError::InitStore {
                    path: path.display().to_string(),
                    msg: e.to_string(),
                })?
        };
        Ok(Self {
            path,
            repo: repo.to_thread_local(),
        })
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }
}

impl ObjectStore for GixStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn contains(&self, oid: &ObjectId) -> bool {
        self.repo.has_object(oid)
    }

    fn commit_tree(&self, commit: &ObjectId) -> Result<ObjectId, BlobFetchError> {
        let object = self.repo
            .try_find_object(*commit)
            .map_err(GixError::from)?
            .ok_or_else(|| ObjectNotFoundError::Commit {
                oid: commit.to_string(),
            })?;
        if object.kind != Kind::Commit {
            return Err(unexpected_kind(commit, Kind::Commit, object.kind).into());
        }
        let tree_id = object
            .try_into_commit().map_err(GixError::from)?
            .tree_id().map_err(GixError::from)?
            .detach();
        debug!("commit {commit} has root tree {tree_id}");
        Ok(tree_id)
    }

    fn tree_entries(&self, tree: &ObjectId) -> Result<Vec<TreeEntry>, BlobFetchError> {
        let object = self.repo
            .try_find_object(*tree)
            .map_err(GixError::from)?
            .ok_or_else(|| ObjectNotFoundError::Tree {
                oid: tree.to_string(),
            })?;
        if object.kind != Kind::Tree {
            return Err(unexpected_kind(tree, Kind::Tree, object.kind).into());
        }
        let object = object.try_into_tree().map_err(GixError::from)?;
        let decoded = object.decode().map_err(GixError::from)?;
        let entries = decoded.entries
            .iter()
            .map(|entry| TreeEntry {
                name: entry.filename.to_string(),
                kind: entry.mode.into(),
                oid: entry.oid.to_owned(),
            })
            .collect();
        Ok(entries)
    }
}
