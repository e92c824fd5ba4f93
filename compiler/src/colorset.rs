use bitvec::prelude::*;

use indexmap::IndexSet;

use tilekit_core::{
	color::Bgr15,
	config::{
		Config,
		Mode
	},
	tile::PAL_SIZE
};

use crate::{
	error::CompileError,
	normalize::{
		NormalizedPalette,
		NormalizedTile
	}
};

/// Ceiling on distinct colors across a compilation: 15 usable slots in each of
/// 16 addressable hardware palettes.
pub const MAX_UNIQUE_COLORS: usize = 240;

/// A set of global color indices. Backed by whole words so that union,
/// intersection, containment and popcount all run word-parallel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorSet {
	bits: BitArr!(for MAX_UNIQUE_COLORS, in u64, Lsb0),
}

impl ColorSet {
	pub fn new() -> ColorSet {
		ColorSet {
			bits: BitArray::ZERO,
		}
	}

	pub fn set(&mut self, index: usize) {
		self.bits.set(index, true);
	}

	pub fn test(&self, index: usize) -> bool {
		self.bits[index]
	}

	pub fn count(&self) -> usize {
		self.bits.count_ones()
	}

	pub fn union(&self, other: &ColorSet) -> ColorSet {
		let mut out = *self;
		for (word, rhs) in out.bits.as_raw_mut_slice().iter_mut().zip(other.bits.as_raw_slice()) {
			*word |= rhs;
		}
		out
	}

	pub fn intersect_count(&self, other: &ColorSet) -> usize {
		self.bits
			.as_raw_slice()
			.iter()
			.zip(other.bits.as_raw_slice())
			.map(|(a, b)| (a & b).count_ones() as usize)
			.sum()
	}

	/// True when every color in `self` is also in `other`.
	pub fn subset_of(&self, other: &ColorSet) -> bool {
		self.bits
			.as_raw_slice()
			.iter()
			.zip(other.bits.as_raw_slice())
			.all(|(a, b)| a & !b == 0)
	}

	/// Ascending iterator over the global indices present in the set.
	pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
		self.bits.iter_ones()
	}
}

/// Builds the color-index registry: every distinct non-transparent hardware
/// color, in first-seen order, optionally seeded by a paired primary registry
/// so shared colors keep their primary indices.
pub fn build_color_index(
	config: &Config,
	normalized: &[(usize, NormalizedTile)],
	seed: &IndexSet<Bgr15>,
) -> Result<IndexSet<Bgr15>, CompileError> {
	let mut color_index = seed.clone();
	for (_, tile) in normalized {
		// slot 0 of each tile-local palette is the transparency color
		for i in 1..tile.palette.size {
			color_index.insert(tile.palette.colors[i]);
		}
	}

	let max = match config.mode {
		Mode::Primary => (PAL_SIZE - 1) * config.palettes_in_primary,
		Mode::Secondary => (PAL_SIZE - 1) * config.palettes_total,
	};
	if color_index.len() > max {
		return Err(CompileError::TooManyColors {
			got: color_index.len(),
			max: max,
		});
	}
	Ok(color_index)
}

/// Projects a tile-local palette onto the registry as a color set.
pub fn to_color_set(
	color_index: &IndexSet<Bgr15>,
	palette: &NormalizedPalette,
) -> Result<ColorSet, CompileError> {
	let mut set = ColorSet::new();
	for i in 1..palette.size {
		let index = color_index
			.get_index_of(&palette.colors[i])
			.ok_or(CompileError::Internal("tile color missing from color-index registry"))?;
		set.set(index);
	}
	Ok(set)
}

/// Tags each normalized tile with its color set and collects the distinct sets
/// in first-appearance order. That order is a contract: the assigner's stable
/// sort and the final palette slot order both build on it.
pub fn match_color_sets(
	color_index: &IndexSet<Bgr15>,
	normalized: Vec<(usize, NormalizedTile)>,
) -> Result<(Vec<(usize, NormalizedTile, ColorSet)>, Vec<ColorSet>), CompileError> {
	let mut tagged = Vec::with_capacity(normalized.len());
	let mut distinct: IndexSet<ColorSet> = IndexSet::new();
	for (index, tile) in normalized {
		let set = to_color_set(color_index, &tile.palette)?;
		distinct.insert(set);
		tagged.push((index, tile, set));
	}
	Ok((tagged, distinct.into_iter().collect()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tilekit_core::color::{
		RGBA_BLUE,
		RGBA_CYAN,
		RGBA_GREEN,
		RGBA_MAGENTA,
		RGBA_RED,
		RGBA_YELLOW
	};

	fn registry(colors: &[Bgr15]) -> IndexSet<Bgr15> {
		colors.iter().copied().collect()
	}

	#[test]
	fn test_set_operations_are_consistent() {
		let mut a = ColorSet::new();
		a.set(0);
		a.set(70);
		a.set(239);
		let mut b = ColorSet::new();
		b.set(70);
		b.set(100);

		assert_eq!(a.count(), 3);
		assert_eq!(a.intersect_count(&b), 1);
		let union = a.union(&b);
		assert_eq!(union.count(), 4);
		assert!(a.subset_of(&union));
		assert!(b.subset_of(&union));
		assert!(!a.subset_of(&b));
		assert_eq!(union.ones().collect::<Vec<_>>(), vec![0, 70, 100, 239]);
	}

	#[test]
	fn test_to_color_set_skips_transparency_slot() {
		let index = registry(&[
			Bgr15::from_rgba(RGBA_BLUE),
			Bgr15::from_rgba(RGBA_RED),
			Bgr15::from_rgba(RGBA_GREEN),
			Bgr15::from_rgba(RGBA_CYAN),
			Bgr15::from_rgba(RGBA_YELLOW),
		]);

		let mut palette = NormalizedPalette::new(RGBA_MAGENTA);
		palette.colors[1] = Bgr15::from_rgba(RGBA_YELLOW);
		palette.colors[2] = Bgr15::from_rgba(RGBA_GREEN);
		palette.colors[3] = Bgr15::from_rgba(RGBA_CYAN);
		palette.size = 4;

		let set = to_color_set(&index, &palette).unwrap();
		assert_eq!(set.count(), 3);
		assert!(set.test(4));
		assert!(set.test(2));
		assert!(set.test(3));
		assert!(!set.test(0));
	}

	#[test]
	fn test_registry_seeding_preserves_primary_indices() {
		let seed = registry(&[Bgr15::from_rgba(RGBA_RED), Bgr15::from_rgba(RGBA_GREEN)]);

		let mut palette = NormalizedPalette::new(RGBA_MAGENTA);
		palette.colors[1] = Bgr15::from_rgba(RGBA_GREEN);
		palette.colors[2] = Bgr15::from_rgba(RGBA_BLUE);
		palette.size = 3;
		let tile = NormalizedTile {
			palette: palette,
			pixels: [0; 64],
			hflip: false,
			vflip: false,
		};

		let config = Config::default();
		let index = build_color_index(&config, &[(0, tile)], &seed).unwrap();
		assert_eq!(index.get_index_of(&Bgr15::from_rgba(RGBA_RED)), Some(0));
		assert_eq!(index.get_index_of(&Bgr15::from_rgba(RGBA_GREEN)), Some(1));
		// the one new color appends after the seeded entries
		assert_eq!(index.get_index_of(&Bgr15::from_rgba(RGBA_BLUE)), Some(2));
	}

	#[test]
	fn test_registry_rejects_color_overflow() {
		let mut config = Config::default();
		config.palettes_in_primary = 1;

		// sixteen distinct colors cannot fit one palette's fifteen open slots
		let mut tiles = Vec::new();
		for i in 0..16u8 {
			let mut palette = NormalizedPalette::new(RGBA_MAGENTA);
			palette.colors[1] = Bgr15 { bgr: i as u16 + 1 };
			palette.size = 2;
			tiles.push((
				i as usize,
				NormalizedTile {
					palette: palette,
					pixels: [0; 64],
					hflip: false,
					vflip: false,
				},
			));
		}

		assert_eq!(
			build_color_index(&config, &tiles, &IndexSet::new()),
			Err(CompileError::TooManyColors { got: 16, max: 15 })
		);
	}

	#[test]
	fn test_distinct_sets_keep_first_appearance_order() {
		let index = registry(&[
			Bgr15::from_rgba(RGBA_BLUE),
			Bgr15::from_rgba(RGBA_GREEN),
			Bgr15::from_rgba(RGBA_RED),
		]);

		let mut tiles = Vec::new();
		for colors in [
			vec![RGBA_GREEN, RGBA_RED],
			vec![RGBA_BLUE],
			vec![RGBA_GREEN, RGBA_RED],
		] {
			let mut palette = NormalizedPalette::new(RGBA_MAGENTA);
			for (i, color) in colors.iter().enumerate() {
				palette.colors[i + 1] = Bgr15::from_rgba(*color);
			}
			palette.size = colors.len() + 1;
			tiles.push((
				tiles.len(),
				NormalizedTile {
					palette: palette,
					pixels: [0; 64],
					hflip: false,
					vflip: false,
				},
			));
		}

		let (tagged, distinct) = match_color_sets(&index, tiles).unwrap();
		assert_eq!(tagged.len(), 3);
		// first and third tiles share a set, so only two remain, in first-seen order
		assert_eq!(distinct.len(), 2);
		assert!(distinct[0].test(1));
		assert!(distinct[0].test(2));
		assert!(distinct[1].test(0));
		assert_eq!(tagged[0].2, tagged[2].2);
	}
}
