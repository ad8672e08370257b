use gix::ObjectId;
use std::path::PathBuf;

use crate::error::ValueError;

pub fn parse_object_id(value: &str) -> Result<ObjectId, ValueError> {
    ObjectId::from_hex(value.trim().as_bytes())
        .map_err(|e| ValueError::InvalidObjectId {
            value: value.to_string(),
            msg: e.to_string(),
        })
}

/// Everything one partial fetch needs.  The target directory is always
/// explicit here; choosing a default is left to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchConfig {
    pub url: String,
    pub commit: ObjectId,
    pub target: PathBuf,
    pub git_program: PathBuf,
}

impl FetchConfig {
    pub fn new(
        url: impl Into<String>,
        commit: &str,
        target: impl Into<PathBuf>,
    ) -> Result<Self, ValueError> {
        Ok(Self {
            url: url.into(),
            commit: parse_object_id(commit)?,
            target: target.into(),
            git_program: PathBuf::from("git"),
        })
    }

    pub fn with_git_program(mut self, git_program: impl Into<PathBuf>) -> Self {
        self.git_program = git_program.into();
        self
    }
}
