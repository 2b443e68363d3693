use anyhow::Result;
use clap::Args;
use mosaic_core::{DEFAULT_STORE_DIR, DiskStore, ResourceStore};
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(disable_version_flag = true)]
pub struct Subcommand {
	/// cache directory, defaults to $MOSAIC_CACHE_DIR or "mosaic_cache" in the temp folder
	#[arg(long, value_name = "DIR")]
	cache_dir: Option<PathBuf>,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let path = arguments.cache_dir.clone().unwrap_or_else(|| DEFAULT_STORE_DIR.to_path_buf());
	DiskStore::new(&path)?.clear()?;
	eprintln!("cleared cache at {path:?}");
	Ok(())
}
