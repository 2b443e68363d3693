use anyhow::{Result, ensure};
use clap::Args;
use mosaic::CanvasRenderer;
use mosaic_core::{
	Bitmap, DEFAULT_FETCH_LIMIT, DEFAULT_STORE_DIR, HttpTransport, IncompleteRowPolicy,
	MosaicSession, PixelSource, StoreType, TileSize, cpu_count, resolver::DEFAULT_TEMPLATE,
};
use std::{path::PathBuf, sync::Arc};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// image to turn into a mosaic (png or jpeg)
	#[arg(required = true)]
	input: PathBuf,

	/// where to write the mosaic, the format follows the extension
	#[arg(required = true)]
	output: PathBuf,

	/// base URL of the server providing the color tiles
	#[arg(long, short, default_value = "http://localhost:8765")]
	server: String,

	/// path of a color tile on the server, "{color}" is replaced by "rrggbb"
	#[arg(long, default_value = DEFAULT_TEMPLATE)]
	template: String,

	/// number of parallel workers computing tile colors, 0 computes on the main task
	/// defaults to the number of CPUs
	#[arg(long, short, verbatim_doc_comment)]
	workers: Option<usize>,

	/// maximum number of concurrent requests to the server
	#[arg(long, default_value_t = DEFAULT_FETCH_LIMIT)]
	fetch_limit: usize,

	#[arg(long, default_value_t = TileSize::DEFAULT_EDGE)]
	tile_width: u32,

	#[arg(long, default_value_t = TileSize::DEFAULT_EDGE)]
	tile_height: u32,

	/// scale the input down to at most this width before tiling
	#[arg(long)]
	max_width: Option<u32>,

	/// directory of the tile cache, defaults to $MOSAIC_CACHE_DIR or "mosaic_cache" in the temp folder
	#[arg(long, value_name = "DIR", conflicts_with = "no_persist")]
	cache_dir: Option<PathBuf>,

	/// keep fetched tiles in memory only
	#[arg(long)]
	no_persist: bool,

	/// render rows with missing tiles anyway, leaving the gaps transparent
	#[arg(long)]
	flush_incomplete: bool,
}

impl Subcommand {
	fn store_type(&self) -> StoreType {
		if self.no_persist {
			StoreType::new_memory()
		} else {
			StoreType::Disk(self.cache_dir.clone().unwrap_or_else(|| DEFAULT_STORE_DIR.to_path_buf()))
		}
	}

	fn incomplete_rows(&self) -> IncompleteRowPolicy {
		if self.flush_incomplete {
			IncompleteRowPolicy::Flush
		} else {
			IncompleteRowPolicy::Stall
		}
	}
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let tile_size = TileSize::new(arguments.tile_width, arguments.tile_height);
	ensure!(tile_size.width > 0 && tile_size.height > 0, "tile size must not be zero, got {tile_size}");

	eprintln!("render {:?} to {:?}", arguments.input, arguments.output);
	let bitmap = Bitmap::open(&arguments.input, arguments.max_width)?;
	let (width, height) = (bitmap.width(), bitmap.height());

	let transport = Arc::new(HttpTransport::from_str(&arguments.server)?);
	let session = MosaicSession::builder(transport)
		.store_type(arguments.store_type())
		.tile_size(tile_size)
		.fetch_limit(arguments.fetch_limit)
		.template(&arguments.template)
		.incomplete_rows(arguments.incomplete_rows())
		.build()?;
	let renderer = CanvasRenderer::attach(session.events(), width, height);

	let workers = arguments.workers.unwrap_or_else(cpu_count);
	log::debug!("rendering {width}x{height} pixels with {workers} workers");
	let report = session.start(Arc::new(bitmap), workers).await?;

	if !report.is_complete() {
		log::warn!(
			"{} of {} rows could not be completed, {} tiles skipped, {} tiles failed",
			report.rows - report.rows_rendered,
			report.rows,
			report.tiles_skipped,
			report.tiles_failed
		);
	}
	renderer.save(&arguments.output)?;
	eprintln!("{report}");

	Ok(())
}
