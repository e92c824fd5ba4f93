pub mod error;

mod assign;
mod colorset;
mod normalize;
mod tiles;

use std::collections::HashSet;

use indexmap::{
	IndexMap,
	IndexSet
};

use log::{
	debug,
	info
};

use tilekit_core::{
	color::{
		Bgr15,
		Rgba32,
		ALPHA_OPAQUE
	},
	config::{
		Config,
		Mode
	},
	tile::HwPalette,
	tileset::{
		Assignment,
		CompiledTileset,
		DecompiledTileset
	}
};

use crate::{
	assign::{
		assign,
		AssignState
	},
	colorset::{
		build_color_index,
		match_color_sets,
		ColorSet
	},
	normalize::normalize,
	tiles::{
		assign_tiles_primary,
		assign_tiles_secondary
	}
};

pub use error::CompileError;

/// Two authored colors that collapse to one hardware color under 8-to-5-bit
/// channel reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrecisionLoss {
	pub first: Rgba32,
	pub second: Rgba32,
	pub collapsed: Bgr15,
}

/// Compiles an authored tile stream into hardware tiles, palettes and
/// assignments. In secondary mode the paired primary tileset's palettes, tiles
/// and color registry are reused rather than duplicated.
pub fn compile(
	config: &Config,
	decompiled: &DecompiledTileset,
	paired_primary: Option<&CompiledTileset>,
) -> Result<CompiledTileset, CompileError> {
	let primary = match (config.mode, paired_primary) {
		(Mode::Secondary, Some(primary)) => {
			if primary.palettes.len() != config.palettes_in_primary {
				return Err(CompileError::PairedPrimaryMismatch {
					got: primary.palettes.len(),
					expected: config.palettes_in_primary,
				});
			}
			Some(primary)
		}
		(Mode::Secondary, None) => {
			return Err(CompileError::Internal("secondary compile without a paired primary tileset"))
		}
		(Mode::Primary, _) => None,
	};

	let metatile_count = decompiled.tiles.len() / config.tiles_per_metatile;
	let metatile_cap = match config.mode {
		Mode::Primary => config.metatiles_in_primary,
		Mode::Secondary => config.metatiles_in_secondary(),
	};
	if metatile_count > metatile_cap {
		return Err(CompileError::TooManyMetatiles {
			got: metatile_count,
			max: metatile_cap,
		});
	}

	let palette_count = match config.mode {
		Mode::Primary => config.palettes_in_primary,
		Mode::Secondary => config.palettes_total,
	};
	let mut compiled = CompiledTileset::default();
	compiled.palettes = vec![HwPalette::default(); palette_count];
	compiled.assignments = vec![Assignment::default(); decompiled.tiles.len()];

	// normalize in input order, tagging each tile with its stream index
	let mut normalized = Vec::with_capacity(decompiled.tiles.len());
	for (index, tile) in decompiled.tiles.iter().enumerate() {
		normalized.push((index, normalize(config.transparency_color, tile)?));
	}
	debug!("normalized {} tiles", normalized.len());

	let empty_seed = IndexSet::new();
	let seed = primary.map(|p| &p.color_index).unwrap_or(&empty_seed);
	let color_index = build_color_index(config, &normalized, seed)?;
	debug!("color-index registry holds {} colors", color_index.len());

	let (tagged, distinct) = match_color_sets(&color_index, normalized)?;
	debug!("{} distinct color sets", distinct.len());

	// small sets first; the stable sort keeps first-appearance order among
	// sets of equal size
	let mut unassigned = distinct;
	unassigned.sort_by_key(ColorSet::count);

	// project the paired primary's palettes through the shared registry so
	// the assigner can recognise tiles those palettes already cover
	let mut primary_palette_sets = Vec::new();
	if let Some(primary) = primary {
		for palette in &primary.palettes {
			let mut set = ColorSet::new();
			for slot in 1..palette.size {
				let index = color_index
					.get_index_of(&palette.colors[slot])
					.ok_or(CompileError::Internal("primary palette color missing from color-index registry"))?;
				set.set(index);
			}
			primary_palette_sets.push(set);
		}
	}

	let new_palette_count = match config.mode {
		Mode::Primary => config.palettes_in_primary,
		Mode::Secondary => config.palettes_in_secondary(),
	};
	let state = AssignState {
		palettes: vec![ColorSet::new(); new_palette_count],
		unassigned: unassigned,
	};
	let mut solution = Vec::with_capacity(new_palette_count);
	let mut recurse_count = 0;
	if !assign(config.max_recurse_count, &mut recurse_count, state, &mut solution, &primary_palette_sets)? {
		return Err(CompileError::AssignmentImpossible);
	}
	info!("palette assignment solved in {} recursive calls", recurse_count);

	let transparency = Bgr15::from_rgba(config.transparency_color);
	if let Some(primary) = primary {
		// the primary's palettes come over verbatim; new palettes fill the tail
		for (dst, src) in compiled.palettes.iter_mut().zip(&primary.palettes) {
			*dst = *src;
		}
		for (offset, set) in solution.iter().enumerate() {
			let palette = &mut compiled.palettes[config.palettes_in_primary + offset];
			materialize_palette(palette, set, &color_index, transparency)?;
		}
	} else {
		for (palette, set) in compiled.palettes.iter_mut().zip(&solution) {
			materialize_palette(palette, set, &color_index, transparency)?;
		}
	}

	compiled.color_index = color_index;
	if let Some(primary) = primary {
		assign_tiles_secondary(config, &mut compiled, primary, &tagged, &primary_palette_sets, &solution)?;
	} else {
		assign_tiles_primary(config, &mut compiled, &tagged, &solution)?;
	}

	Ok(compiled)
}

/// Fills one hardware palette from its assigned color set: transparency in
/// slot 0, then the set's colors in ascending global-index order.
fn materialize_palette(
	palette: &mut HwPalette,
	set: &ColorSet,
	color_index: &IndexSet<Bgr15>,
	transparency: Bgr15,
) -> Result<(), CompileError> {
	palette.colors[0] = transparency;
	let mut slot = 1;
	for index in set.ones() {
		let color = color_index
			.get_index(index)
			.ok_or(CompileError::Internal("assigned color index out of registry range"))?;
		palette.colors[slot] = *color;
		slot += 1;
	}
	palette.size = slot;
	Ok(())
}

/// Scans the authored tiles for distinct colors that collapse to one hardware
/// color. The compile itself accepts such collapses silently; callers can
/// surface them as a diagnostic. Pairs are reported once, in encounter order.
pub fn precision_losses(transparency: Rgba32, decompiled: &DecompiledTileset) -> Vec<PrecisionLoss> {
	let mut first_seen: IndexMap<Bgr15, Rgba32> = IndexMap::new();
	let mut reported: HashSet<(Rgba32, Rgba32)> = HashSet::new();
	let mut losses = Vec::new();
	for tile in &decompiled.tiles {
		for pixel in &tile.pixels {
			if pixel.is_transparent(transparency) || pixel.alpha != ALPHA_OPAQUE {
				continue;
			}
			let bgr = Bgr15::from_rgba(*pixel);
			match first_seen.get(&bgr) {
				None => {
					first_seen.insert(bgr, *pixel);
				}
				Some(&first) if first != *pixel => {
					if reported.insert((first, *pixel)) {
						losses.push(PrecisionLoss {
							first: first,
							second: *pixel,
							collapsed: bgr,
						});
					}
				}
				Some(_) => {}
			}
		}
	}
	losses
}
