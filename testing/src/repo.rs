use std::{
    fs::OpenOptions,
    io::Write,
    path::Path,
    str::FromStr,
};
use tempfile::TempDir;
use gix::{
    ObjectId,
    Repository,
    objs::tree,
};

pub enum GitObj<'a> {
    Blob(&'a str, &'a str),
    /// A blob entry naming an object id that is never written.
    Absent(&'a str, &'a str),
    Commit(&'a str, &'a str),
    Tree(&'a str, Vec<GitObj<'a>>),
}

/// A bare repository with nothing in it, inside a fresh tempdir unless
/// a target is given.
pub fn repo_init(
    target: Option<&Path>,
) -> anyhow::Result<(Option<TempDir>, Repository)> {
    let tempdir = match target {
        Some(_) => None,
        None => Some(tempfile::tempdir()?)
    };
    let repo = gix::ThreadSafeRepository::init_opts(
        target.unwrap_or_else(|| tempdir.as_ref().unwrap().path()),
        gix::create::Kind::Bare,
        gix::create::Options::default(),
        gix::open::Options::isolated(),
    )?.to_thread_local();
    Ok((tempdir, repo))
}

/// Lets `git upload-pack` in this repository honour object filters and
/// wants naming arbitrary objects, as partial fetches need.
pub fn allow_partial_serving(repo: &Repository) -> anyhow::Result<()> {
    let mut config = OpenOptions::new()
        .append(true)
        .open(repo.path().join("config"))?;
    config.write_all(b"\
        [uploadpack]\n\
        \tallowFilter = true\n\
        \tallowAnySHA1InWant = true\n\
    ")?;
    Ok(())
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

pub fn tree_from_objects(
    repo: &Repository,
    gitobjs: Vec<GitObj>,
) -> anyhow::Result<ObjectId> {
    let mut tree = gix::objs::Tree::empty();
    for gitobj in gitobjs {
        match gitobj {
            GitObj::Blob(name, contents) => {
                let oid = repo.write_blob(
                    contents.trim_start_matches('\n').as_bytes())?.into();
                tree.entries.push(tree::Entry {
                    mode: tree::EntryKind::Blob.into(),
                    oid: oid,
                    filename: name.into(),
                });
            },
            GitObj::Absent(name, oid) => {
                tree.entries.push(tree::Entry {
                    mode: tree::EntryKind::Blob.into(),
                    oid: ObjectId::from_str(oid)?,
                    filename: name.into(),
                });
            },
            GitObj::Commit(name, oid) => {
                tree.entries.push(tree::Entry {
                    mode: tree::EntryKind::Commit.into(),
                    oid: ObjectId::from_str(oid)?,
                    filename: name.into(),
                });
            },
            GitObj::Tree(name, objects) => {
                let oid = tree_from_objects(repo, objects)?;
                tree.entries.push(tree::Entry {
                    mode: tree::EntryKind::Tree.into(),
                    oid: oid,
                    filename: name.into(),
                });
            }
        }
    }
    tree.entries.sort();
    Ok(repo.write_object(tree)?.detach())
}

/// Commits a tree built from the objects onto `HEAD`, on top of the
/// current head commit if there is one.
pub fn commit_from_objects(
    repo: &Repository,
    timestamp: Option<i64>,
    objects: Vec<GitObj>,
) -> anyhow::Result<ObjectId> {
    let parents = repo.head_id()
        .ok()
        .map(|id| id.detach())
        .into_iter()
        .collect::<Vec<_>>();
    let signature = gix::actor::Signature {
        name: "user".into(), email: "user@example.com".into(),
        time: match timestamp {
            None => gix::date::Time::now_utc(),
            Some(t) => gix::date::Time::new(t.try_into()?, 0),
        }
    };
    Ok(repo.commit_as(
        &signature,
        &signature,
        "HEAD",
        "commit",
        tree_from_objects(repo, objects)?,
        parents,
    )?.detach())
}

/// The id of the object at `path` within `commit`.
pub fn path_id(
    repo: &Repository,
    commit: &ObjectId,
    path: &str,
) -> anyhow::Result<ObjectId> {
    Ok(repo.rev_parse_single(format!("{commit}:{path}").as_str())?.detach())
}

#[test]
fn smoke_test_commit_from_objects() -> anyhow::Result<()> {
    let (td, repo) = repo_init(None)?;
    let first = commit_from_objects(&repo, Some(1666666666), vec![
        GitObj::Blob("some_file", "a blob"),
        GitObj::Tree("some_dir", vec![
            GitObj::Blob("file1", "file1 in some_dir"),
            GitObj::Absent("file2", "0123456789012345678012345678012345678901"),
        ]),
    ])?;
    let second = commit_from_objects(&repo, Some(1666666700), vec![
        GitObj::Blob("new_file", "\na new_file\n"),
    ])?;
    assert_eq!(repo.head_id()?.detach(), second);
    let parents = repo.find_object(second)?
        .try_into_commit()?
        .parent_ids()
        .map(|id| id.detach())
        .collect::<Vec<_>>();
    assert_eq!(parents, vec![first]);

    let absent = path_id(&repo, &first, "some_dir/file2")?;
    assert_eq!(absent.to_string(), "0123456789012345678012345678012345678901");
    assert!(!repo.has_object(absent));
    assert!(repo.has_object(path_id(&repo, &first, "some_file")?));

    allow_partial_serving(&repo)?;
    let config = std::fs::read_to_string(td.unwrap().path().join("config"))?;
    assert!(config.contains("allowFilter = true"));
    Ok(())
}
