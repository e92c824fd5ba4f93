use indexmap::IndexSet;

use crate::{
	color::Bgr15,
	tile::{
		HwPalette,
		HwTile,
		RgbaTile
	}
};

/// Which drawing layers of a metatile hold content. Drives the attribute word's layer bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayerType {
	/// Content on the middle and top layers.
	#[default]
	Normal,
	/// Content on the bottom and middle layers.
	Covered,
	/// Content on the bottom and top layers.
	Split,
	/// Content may sit on all three layers; only valid for triple-layer tilesets.
	Triple,
}

impl LayerType {
	/// The layer bits of the attribute word. The target format predates
	/// triple-layer tilesets, which share the normal encoding.
	pub const fn bits(self) -> u16 {
		match self {
			LayerType::Normal => 0,
			LayerType::Covered => 1,
			LayerType::Split => 2,
			LayerType::Triple => 0,
		}
	}
}

/// Per-metatile metadata carried from the attributes CSV to the attributes emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
	pub behavior: u8,
	pub terrain_type: u8,
	pub encounter_type: u8,
	pub layer_type: LayerType,
}

/// The authored tile stream, partitioned by metatile in import order.
#[derive(Clone, Debug, Default)]
pub struct DecompiledTileset {
	pub tiles: Vec<RgbaTile>,
	/// One entry per metatile; empty for freestanding imports.
	pub attributes: Vec<Attributes>,
}

/// How one authored tile position is realised in the compiled tileset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
	pub tile_index: usize,
	pub palette_index: usize,
	pub hflip: bool,
	pub vflip: bool,
}

/// A fully compiled tileset, ready for the emitters. `tile_indexes` and
/// `color_index` also seed a paired secondary compilation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledTileset {
	pub tiles: Vec<HwTile>,
	/// The palette slot each compiled tile was materialised against.
	pub palette_index_of_tile: Vec<usize>,
	pub palettes: Vec<HwPalette>,
	pub assignments: Vec<Assignment>,
	/// Deduplication table; set position is the compiled tile index.
	pub tile_indexes: IndexSet<HwTile>,
	/// Color-index registry; set position is the global color index.
	pub color_index: IndexSet<Bgr15>,
}

impl CompiledTileset {
	pub fn tile_index_of(&self, tile: &HwTile) -> Option<usize> {
		self.tile_indexes.get_index_of(tile)
	}

	pub fn color_index_of(&self, color: Bgr15) -> Option<usize> {
		self.color_index.get_index_of(&color)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::color::{
		Rgba32,
		RGBA_GREEN,
		RGBA_RED
	};

	#[test]
	fn test_lookup_tables_track_insertion_order() {
		let mut compiled = CompiledTileset::default();
		compiled.tile_indexes.insert(HwTile::TRANSPARENT);
		let mut tile = HwTile::TRANSPARENT;
		tile.color_indexes[0] = 1;
		compiled.tile_indexes.insert(tile);

		assert_eq!(compiled.tile_index_of(&HwTile::TRANSPARENT), Some(0));
		assert_eq!(compiled.tile_index_of(&tile), Some(1));

		compiled.color_index.insert(Bgr15::from_rgba(RGBA_RED));
		compiled.color_index.insert(Bgr15::from_rgba(RGBA_GREEN));
		assert_eq!(compiled.color_index_of(Bgr15::from_rgba(RGBA_GREEN)), Some(1));
		assert_eq!(compiled.color_index_of(Bgr15::from_rgba(Rgba32::opaque(1, 2, 3))), None);
	}
}
