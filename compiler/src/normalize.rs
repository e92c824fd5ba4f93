use tilekit_core::{
	color::{
		Bgr15,
		Rgba32,
		ALPHA_OPAQUE
	},
	tile::{
		RgbaTile,
		PAL_SIZE,
		TILE_NUM_PIX,
		TILE_SIDE_LENGTH
	}
};

use crate::error::CompileError;

/// A tile-local palette. Slot 0 holds the transparency color; slots 1.. fill
/// in the order colors are first seen, which drives flip tie-breaking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NormalizedPalette {
	pub size: usize,
	pub colors: [Bgr15; PAL_SIZE],
}

impl NormalizedPalette {
	pub fn new(transparency: Rgba32) -> NormalizedPalette {
		let mut colors = [Bgr15::default(); PAL_SIZE];
		colors[0] = Bgr15::from_rgba(transparency);
		NormalizedPalette {
			size: 1,
			colors: colors,
		}
	}
}

/// A tile in canonical flip form: pixels are indices into the tile-local
/// palette, and the recorded flips recover the authored orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NormalizedTile {
	pub palette: NormalizedPalette,
	pub pixels: [u8; TILE_NUM_PIX],
	pub hflip: bool,
	pub vflip: bool,
}

impl NormalizedTile {
	pub fn transparent(&self) -> bool {
		self.pixels.iter().all(|&i| i == 0)
	}
}

/// Inserts an authored color into a tile-local palette, converting it to
/// hardware form and deduplicating. Returns the color's palette slot.
pub fn insert_rgba(
	transparency: Rgba32,
	palette: &mut NormalizedPalette,
	rgba: Rgba32,
) -> Result<u8, CompileError> {
	if rgba.is_transparent(transparency) {
		return Ok(0);
	}
	if rgba.alpha != ALPHA_OPAQUE {
		return Err(CompileError::InvalidAlpha(rgba.alpha));
	}

	let bgr = Bgr15::from_rgba(rgba);
	// slot 0 is reserved, search only the occupied tail
	if let Some(pos) = palette.colors[1..palette.size].iter().position(|&c| c == bgr) {
		return Ok((pos + 1) as u8);
	}
	if palette.size == PAL_SIZE {
		return Err(CompileError::TileHasTooManyColors);
	}
	palette.colors[palette.size] = bgr;
	palette.size += 1;
	Ok((palette.size - 1) as u8)
}

/// Builds the candidate normalized tile for one flip choice. A different flip
/// choice may turn out to be the true normal form.
pub fn candidate(
	transparency: Rgba32,
	rgba: &RgbaTile,
	hflip: bool,
	vflip: bool,
) -> Result<NormalizedTile, CompileError> {
	let mut tile = NormalizedTile {
		palette: NormalizedPalette::new(transparency),
		pixels: [0; TILE_NUM_PIX],
		hflip: hflip,
		vflip: vflip,
	};

	for row in 0..TILE_SIDE_LENGTH {
		for col in 0..TILE_SIDE_LENGTH {
			let src_row = if vflip { TILE_SIDE_LENGTH - 1 - row } else { row };
			let src_col = if hflip { TILE_SIDE_LENGTH - 1 - col } else { col };
			tile.pixels[row * TILE_SIDE_LENGTH + col] =
				insert_rgba(transparency, &mut tile.palette, rgba.pixel(src_row, src_col))?;
		}
	}

	Ok(tile)
}

/// Normalizes a tile: of the four flip candidates, keep the one whose pixel
/// sequence is lexicographically smallest. Two authored tiles that differ only
/// by a flip therefore collapse to the same normal form.
pub fn normalize(transparency: Rgba32, rgba: &RgbaTile) -> Result<NormalizedTile, CompileError> {
	let no_flips = candidate(transparency, rgba, false, false)?;

	// transparent tiles are common in metatiles and trivially in normal form
	if no_flips.transparent() {
		return Ok(no_flips);
	}

	let mut normal = no_flips;
	for (hflip, vflip) in [(true, false), (false, true), (true, true)] {
		let flipped = candidate(transparency, rgba, hflip, vflip)?;
		if flipped.pixels < normal.pixels {
			normal = flipped;
		}
	}
	Ok(normal)
}
