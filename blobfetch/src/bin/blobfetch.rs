use clap::Parser;
use std::{
    io::{self, Write},
    path::PathBuf,
};

use blobfetch::{
    FetchConfig,
    partial_fetch,
};

/// Fetch a single commit and its trees without blobs, then fetch exactly
/// the blobs those trees reference that are still missing locally.
#[derive(Debug, Parser)]
struct Cli {
    /// Url of the remote repository.
    repo_url: String,
    /// The 40 character hex id of the commit to fetch.
    commit: String,
    /// Directory for the local bare object store; a new temporary
    /// directory is created when omitted.
    #[clap(short = 't', long = "target", value_name = "BLOBFETCH_TARGET", env = "BLOBFETCH_TARGET")]
    target: Option<PathBuf>,
    /// The git executable used by the subprocess transport.
    #[clap(long = "git", value_name = "BLOBFETCH_GIT", env = "BLOBFETCH_GIT", default_value = "git")]
    git: PathBuf,
    #[clap(short = 'j', long = "json")]
    json: bool,
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn default_target() -> io::Result<PathBuf> {
    Ok(tempfile::Builder::new()
        .prefix("blobfetch-partial-")
        .tempdir()?
        .keep())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    stderrlog::new()
        .module(module_path!())
        .verbosity(args.verbose as usize + 1)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let target = match args.target {
        Some(target) => target,
        None => default_target()?,
    };
    let config = FetchConfig::new(args.repo_url, &args.commit, target)?
        .with_git_program(args.git);
    log::debug!("using {config:?}");

    let outcome = partial_fetch(&config)?;
    if args.json {
        let mut writer = io::stdout();
        serde_json::to_writer(&mut writer, &outcome)?;
        writer.write_all(b"\n")?;
    }
    else {
        println!("{outcome}");
    }
    Ok(())
}
