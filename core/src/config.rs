use crate::color::{
	Rgba32,
	RGBA_MAGENTA
};

/// Whether a compilation builds a standalone primary tileset or extends a paired primary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
	Primary,
	Secondary,
}

/// Capacity limits and knobs for one compile invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
	pub transparency_color: Rgba32,
	pub mode: Mode,
	pub tiles_in_primary: usize,
	pub tiles_total: usize,
	pub metatiles_in_primary: usize,
	pub metatiles_total: usize,
	pub tiles_per_metatile: usize,
	pub palettes_in_primary: usize,
	pub palettes_total: usize,
	/// Hard cap on recursive calls in the palette assignment search.
	pub max_recurse_count: usize,
}

impl Config {
	pub fn tiles_in_secondary(&self) -> usize {
		self.tiles_total - self.tiles_in_primary
	}

	pub fn metatiles_in_secondary(&self) -> usize {
		self.metatiles_total - self.metatiles_in_primary
	}

	pub fn palettes_in_secondary(&self) -> usize {
		self.palettes_total - self.palettes_in_primary
	}
}

impl Default for Config {
	fn default() -> Config {
		Config {
			transparency_color: RGBA_MAGENTA,
			mode: Mode::Primary,
			tiles_in_primary: 512,
			tiles_total: 1024,
			metatiles_in_primary: 512,
			metatiles_total: 1024,
			tiles_per_metatile: 12,
			palettes_in_primary: 6,
			palettes_total: 13,
			max_recurse_count: 2_000_000,
		}
	}
}
