use indexmap::IndexSet;

use tilekit_core::{
	config::Config,
	tile::{
		HwPalette,
		HwTile,
		PAL_SIZE,
		TILE_NUM_PIX
	},
	tileset::{
		Assignment,
		CompiledTileset
	}
};

use crate::{
	colorset::ColorSet,
	error::CompileError,
	normalize::NormalizedTile
};

/// Rewrites a normalized tile's pixels as indices into the hardware palette it
/// was assigned to. Every tile-local color must already be in that palette.
pub fn make_tile(norm: &NormalizedTile, palette: &HwPalette) -> Result<HwTile, CompileError> {
	let mut slot_map = [0u8; PAL_SIZE];
	for i in 1..norm.palette.size {
		let color = norm.palette.colors[i];
		let pos = palette.colors[1..]
			.iter()
			.position(|&c| c == color)
			.ok_or(CompileError::Internal("normalized color missing from assigned hardware palette"))?;
		slot_map[i] = (pos + 1) as u8;
	}

	let mut tile = HwTile::TRANSPARENT;
	for i in 0..TILE_NUM_PIX {
		tile.color_indexes[i] = slot_map[norm.pixels[i] as usize];
	}
	Ok(tile)
}

/// Materializes and deduplicates the tiles of a primary compilation. Tile 0 is
/// forced to the all-transparent tile on palette 0.
pub fn assign_tiles_primary(
	config: &Config,
	compiled: &mut CompiledTileset,
	tagged: &[(usize, NormalizedTile, ColorSet)],
	solution: &[ColorSet],
) -> Result<(), CompileError> {
	let mut tile_indexes: IndexSet<HwTile> = IndexSet::new();
	tile_indexes.insert(HwTile::TRANSPARENT);
	compiled.tiles.push(HwTile::TRANSPARENT);
	compiled.palette_index_of_tile.push(0);

	for (index, norm, color_set) in tagged {
		let palette_index = solution
			.iter()
			.position(|palette| color_set.subset_of(palette))
			.ok_or(CompileError::Internal("tile color set not covered by any assigned palette"))?;
		let tile = make_tile(norm, &compiled.palettes[palette_index])?;
		let (tile_index, inserted) = tile_indexes.insert_full(tile);
		if inserted {
			compiled.tiles.push(tile);
			if compiled.tiles.len() > config.tiles_in_primary {
				return Err(CompileError::TooManyTiles {
					got: compiled.tiles.len(),
					max: config.tiles_in_primary,
				});
			}
			compiled.palette_index_of_tile.push(palette_index);
		}
		compiled.assignments[*index] = Assignment {
			tile_index: tile_index,
			palette_index: palette_index,
			hflip: norm.hflip,
			vflip: norm.vflip,
		};
	}
	compiled.tile_indexes = tile_indexes;
	Ok(())
}

/// Materializes the tiles of a secondary compilation. Tiles already present in
/// the paired primary are referenced by their primary index; fresh tiles go in
/// the secondary table and are addressed past the primary tile capacity.
pub fn assign_tiles_secondary(
	config: &Config,
	compiled: &mut CompiledTileset,
	primary: &CompiledTileset,
	tagged: &[(usize, NormalizedTile, ColorSet)],
	primary_palette_sets: &[ColorSet],
	solution: &[ColorSet],
) -> Result<(), CompileError> {
	let mut tile_indexes: IndexSet<HwTile> = IndexSet::new();
	for (index, norm, color_set) in tagged {
		// palette indices run over the combined space: primary slots, then new
		let palette_index = primary_palette_sets
			.iter()
			.chain(solution)
			.position(|palette| color_set.subset_of(palette))
			.ok_or(CompileError::Internal("tile color set not covered by any assigned palette"))?;
		let tile = make_tile(norm, &compiled.palettes[palette_index])?;

		let tile_index = match primary.tile_index_of(&tile) {
			Some(primary_index) => primary_index,
			None => {
				let (secondary_index, inserted) = tile_indexes.insert_full(tile);
				if inserted {
					compiled.tiles.push(tile);
					if compiled.tiles.len() > config.tiles_in_secondary() {
						return Err(CompileError::TooManyTiles {
							got: compiled.tiles.len(),
							max: config.tiles_in_secondary(),
						});
					}
					compiled.palette_index_of_tile.push(palette_index);
				}
				secondary_index + config.tiles_in_primary
			}
		};
		compiled.assignments[*index] = Assignment {
			tile_index: tile_index,
			palette_index: palette_index,
			hflip: norm.hflip,
			vflip: norm.vflip,
		};
	}
	compiled.tile_indexes = tile_indexes;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tilekit_core::color::{
		Bgr15,
		RGBA_BLUE,
		RGBA_GREEN,
		RGBA_MAGENTA,
		RGBA_RED
	};
	use crate::normalize::NormalizedPalette;

	fn hw_palette(colors: &[Bgr15]) -> HwPalette {
		let mut palette = HwPalette::default();
		palette.colors[0] = Bgr15::from_rgba(RGBA_MAGENTA);
		for (i, &color) in colors.iter().enumerate() {
			palette.colors[i + 1] = color;
		}
		palette.size = colors.len() + 1;
		palette
	}

	#[test]
	fn test_make_tile_remaps_through_palette() {
		// local order green-then-red, hardware order red-then-green
		let mut local = NormalizedPalette::new(RGBA_MAGENTA);
		local.colors[1] = Bgr15::from_rgba(RGBA_GREEN);
		local.colors[2] = Bgr15::from_rgba(RGBA_RED);
		local.size = 3;
		let mut pixels = [0u8; 64];
		pixels[10] = 1;
		pixels[11] = 2;
		let norm = NormalizedTile {
			palette: local,
			pixels: pixels,
			hflip: false,
			vflip: false,
		};

		let hw = hw_palette(&[Bgr15::from_rgba(RGBA_RED), Bgr15::from_rgba(RGBA_GREEN)]);
		let tile = make_tile(&norm, &hw).unwrap();
		assert_eq!(tile.color_indexes[10], 2);
		assert_eq!(tile.color_indexes[11], 1);
		assert_eq!(tile.color_indexes[0], 0);
	}

	#[test]
	fn test_make_tile_rejects_unassigned_color() {
		let mut local = NormalizedPalette::new(RGBA_MAGENTA);
		local.colors[1] = Bgr15::from_rgba(RGBA_BLUE);
		local.size = 2;
		let norm = NormalizedTile {
			palette: local,
			pixels: [0; 64],
			hflip: false,
			vflip: false,
		};

		let hw = hw_palette(&[Bgr15::from_rgba(RGBA_RED)]);
		assert!(matches!(
			make_tile(&norm, &hw),
			Err(CompileError::Internal(_))
		));
	}
}
