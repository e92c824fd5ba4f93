use std::{
	collections::HashMap,
	fs::{
		self,
		File
	},
	path::{
		Path,
		PathBuf
	}
};

use anyhow::{
	Context,
	Result
};

use clap::{
	Args,
	Parser,
	Subcommand
};

use log::warn;

use tilekit_compiler::{
	compile,
	precision_losses
};
use tilekit_core::{
	color::Rgba32,
	config::{
		Config,
		Mode
	},
	tileset::{
		CompiledTileset,
		DecompiledTileset
	}
};
use tilekit_emit::{
	emit_attributes,
	emit_metatiles_bin,
	emit_palette,
	emit_tiles_png,
	emit_zeroed_palette
};
use tilekit_import::{
	attributes::parse_attributes_csv,
	behaviors::parse_behavior_header,
	png_import::import_layered_tiles_from_pngs
};

#[derive(Parser)]
#[command(
	name = "tilekit",
	about = "Compiles layered tile art into hardware tileset artifacts",
	version
)]
struct Cli {
	/// Enable verbose logging to stderr
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Compile a primary tileset
	CompilePrimary {
		#[command(flatten)]
		options: CompileOptions,

		/// Source directory holding bottom.png, middle.png, top.png and an
		/// optional attributes.csv
		src: PathBuf,
		/// Metatile behaviors C header
		behaviors: PathBuf,
	},
	/// Compile a secondary tileset against its paired primary
	CompileSecondary {
		#[command(flatten)]
		options: CompileOptions,

		/// Secondary source directory
		src: PathBuf,
		/// Paired primary source directory
		primary_src: PathBuf,
		/// Metatile behaviors C header
		behaviors: PathBuf,
	},
}

#[derive(Args)]
struct CompileOptions {
	/// Output directory
	#[arg(short, long, default_value = ".")]
	output: PathBuf,

	/// Transparency color, as R,G,B
	#[arg(long, value_parser = parse_rgb, default_value = "255,0,255")]
	transparency_color: Rgba32,

	/// Compile as a dual-layer tileset (8 tiles per metatile)
	#[arg(long)]
	dual_layer: bool,

	/// Override the primary-set tile capacity
	#[arg(long)]
	tiles_primary: Option<usize>,
	/// Override the total tile capacity
	#[arg(long)]
	tiles_total: Option<usize>,
	/// Override the primary-set metatile capacity
	#[arg(long)]
	metatiles_primary: Option<usize>,
	/// Override the total metatile capacity
	#[arg(long)]
	metatiles_total: Option<usize>,
	/// Override the primary-set palette count
	#[arg(long)]
	pals_primary: Option<usize>,
	/// Override the total palette count
	#[arg(long)]
	pals_total: Option<usize>,
	/// Override the palette assignment recursion limit
	#[arg(long)]
	max_recurses: Option<usize>,

	/// Warn when two authored colors collapse to one hardware color
	#[arg(long = "Wcolor-precision-loss")]
	warn_color_precision_loss: bool,
}

impl CompileOptions {
	fn to_config(&self, mode: Mode) -> Config {
		let mut config = Config::default();
		config.mode = mode;
		config.transparency_color = self.transparency_color;
		config.tiles_per_metatile = if self.dual_layer { 8 } else { 12 };
		if let Some(tiles) = self.tiles_primary {
			config.tiles_in_primary = tiles;
		}
		if let Some(tiles) = self.tiles_total {
			config.tiles_total = tiles;
		}
		if let Some(metatiles) = self.metatiles_primary {
			config.metatiles_in_primary = metatiles;
		}
		if let Some(metatiles) = self.metatiles_total {
			config.metatiles_total = metatiles;
		}
		if let Some(palettes) = self.pals_primary {
			config.palettes_in_primary = palettes;
		}
		if let Some(palettes) = self.pals_total {
			config.palettes_total = palettes;
		}
		if let Some(budget) = self.max_recurses {
			config.max_recurse_count = budget;
		}
		config
	}
}

fn parse_rgb(field: &str) -> Result<Rgba32, String> {
	let parts: Vec<&str> = field.split(',').map(str::trim).collect();
	if parts.len() != 3 {
		return Err(String::from("expected R,G,B"));
	}
	let mut channels = [0u8; 3];
	for (channel, part) in channels.iter_mut().zip(&parts) {
		*channel = part.parse().map_err(|_| format!("invalid channel value `{}'", part))?;
	}
	Ok(Rgba32::opaque(channels[0], channels[1], channels[2]))
}

fn load_behaviors(path: &Path) -> Result<HashMap<String, u8>> {
	let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
	let (behaviors, _) = parse_behavior_header(file)?;
	Ok(behaviors)
}

fn import_source(
	src: &Path,
	behavior_map: &HashMap<String, u8>,
	options: &CompileOptions,
) -> Result<DecompiledTileset> {
	let attributes_path = src.join("attributes.csv");
	let attributes = if attributes_path.exists() {
		let file = File::open(&attributes_path)
			.with_context(|| format!("could not open {}", attributes_path.display()))?;
		parse_attributes_csv(file, behavior_map)?
	} else {
		warn!("{}: no attributes.csv, metatile attributes default to zero", src.display());
		HashMap::new()
	};

	let open = |name: &str| {
		File::open(src.join(name)).with_context(|| format!("could not open {}", src.join(name).display()))
	};
	let decompiled = import_layered_tiles_from_pngs(
		open("bottom.png")?,
		open("middle.png")?,
		open("top.png")?,
		&attributes,
		options.transparency_color,
		options.dual_layer,
	)?;
	Ok(decompiled)
}

fn report_precision_losses(options: &CompileOptions, decompiled: &DecompiledTileset) {
	if !options.warn_color_precision_loss {
		return;
	}
	for loss in precision_losses(options.transparency_color, decompiled) {
		warn!(
			"color precision loss: {} and {} both collapse to hardware color {:#06x}",
			loss.first, loss.second, loss.collapsed.bgr
		);
	}
}

fn emit_outputs(
	output: &Path,
	config: &Config,
	compiled: &CompiledTileset,
	decompiled: &DecompiledTileset,
) -> Result<()> {
	fs::create_dir_all(output)?;
	let palettes_dir = output.join("palettes");
	fs::create_dir_all(&palettes_dir)?;
	for slot in 0..config.palettes_total {
		let mut file = File::create(palettes_dir.join(format!("{:02}.pal", slot)))?;
		match compiled.palettes.get(slot) {
			Some(palette) => emit_palette(&mut file, palette)?,
			None => emit_zeroed_palette(&mut file)?,
		}
	}

	let tiles = File::create(output.join("tiles.png"))?;
	emit_tiles_png(tiles, compiled)?;

	let mut metatiles = File::create(output.join("metatiles.bin"))?;
	emit_metatiles_bin(&mut metatiles, compiled)?;

	let mut attributes = File::create(output.join("metatile_attributes.bin"))?;
	emit_attributes(&mut attributes, &decompiled.attributes)?;
	Ok(())
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	let default_filter = if cli.verbose { "debug" } else { "warn" };
	env_logger::Builder::from_env(env_logger::Env::new().filter_or("TILEKIT_LOG", default_filter))
		.format_timestamp(None)
		.init();

	match &cli.command {
		Command::CompilePrimary {
			options,
			src,
			behaviors,
		} => {
			let behavior_map = load_behaviors(behaviors)?;
			let config = options.to_config(Mode::Primary);
			let decompiled = import_source(src, &behavior_map, options)?;
			report_precision_losses(options, &decompiled);
			let compiled = compile(&config, &decompiled, None)?;
			emit_outputs(&options.output, &config, &compiled, &decompiled)
		}
		Command::CompileSecondary {
			options,
			src,
			primary_src,
			behaviors,
		} => {
			let behavior_map = load_behaviors(behaviors)?;

			let primary_config = options.to_config(Mode::Primary);
			let primary_input = import_source(primary_src, &behavior_map, options)?;
			let primary = compile(&primary_config, &primary_input, None)
				.context("paired primary tileset failed to compile")?;

			let config = options.to_config(Mode::Secondary);
			let decompiled = import_source(src, &behavior_map, options)?;
			report_precision_losses(options, &decompiled);
			let compiled = compile(&config, &decompiled, Some(&primary))?;
			emit_outputs(&options.output, &config, &compiled, &decompiled)
		}
	}
}
