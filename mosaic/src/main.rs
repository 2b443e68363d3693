mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Render an image as a mosaic of fetched color tiles
	Render(tools::render::Subcommand),

	/// Remove all resources kept in the disk cache
	ClearCache(tools::clear_cache::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Render(arguments) => tools::render::run(arguments),
		Commands::ClearCache(arguments) => tools::clear_cache::run(arguments),
	}
}

#[cfg(test)]
mod tests {
	use crate::{Cli, run};
	use anyhow::Result;
	use clap::Parser;

	pub fn run_command(arg_vec: Vec<&str>) -> Result<String> {
		let cli = Cli::try_parse_from(arg_vec)?;
		let msg = format!("{cli:?}");
		run(cli)?;
		Ok(msg)
	}

	#[test]
	fn help() {
		let err = run_command(vec!["mosaic"]).unwrap_err().to_string();
		assert!(err.starts_with("Turns images into mosaics built from remotely fetched color tiles."));
		assert!(err.contains("\nUsage: mosaic [OPTIONS] <COMMAND>"));
	}

	#[test]
	fn version() {
		let err = run_command(vec!["mosaic", "-V"]).unwrap_err().to_string();
		assert!(err.starts_with("mosaic "));
	}

	#[test]
	fn render_subcommand() {
		let output = run_command(vec!["mosaic", "render"]).unwrap_err().to_string();
		assert!(output.starts_with("Render an image as a mosaic of fetched color tiles"));
	}

	#[test]
	fn clear_cache_subcommand() {
		let output = run_command(vec!["mosaic", "clear-cache", "--help"]).unwrap_err().to_string();
		assert!(output.starts_with("Remove all resources kept in the disk cache"));
	}
}
