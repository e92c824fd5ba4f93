use std::{
	collections::HashMap,
	io::Read
};

use log::warn;

use tilekit_core::{
	color::Rgba32,
	tile::{
		RgbaTile,
		TILE_SIDE_LENGTH
	},
	tileset::{
		Attributes,
		DecompiledTileset,
		LayerType
	}
};

use crate::ImportError;

pub const METATILE_SIDE_LENGTH: usize = 16;
pub const METATILES_IN_ROW: usize = 8;
pub const LAYER_WIDTH: u32 = (METATILE_SIDE_LENGTH * METATILES_IN_ROW) as u32;

/// A decoded RGBA sheet.
struct Sheet {
	width: usize,
	height: usize,
	pixels: Vec<u8>,
}

impl Sheet {
	fn decode<R>(buf: R) -> Result<Sheet, ImportError>
	where
		R: Read,
	{
		let mut decoder = png::Decoder::new(buf);
		decoder.set_transformations(png::Transformations::normalize_to_color8());
		let mut reader = decoder.read_info()?;
		let mut data = vec![0; reader.output_buffer_size()];
		let info = reader.next_frame(&mut data)?;
		data.truncate(info.buffer_size());

		let pixels = match info.color_type {
			png::ColorType::Rgba => data,
			png::ColorType::Rgb => {
				// no alpha channel in the source, every pixel is opaque
				let mut rgba = Vec::with_capacity(data.len() / 3 * 4);
				for rgb in data.chunks_exact(3) {
					rgba.extend_from_slice(rgb);
					rgba.push(255);
				}
				rgba
			}
			_ => return Err(ImportError::UnsupportedPng("expected an RGB or RGBA image")),
		};

		Ok(Sheet {
			width: info.width as usize,
			height: info.height as usize,
			pixels: pixels,
		})
	}

	/// Cuts the 8x8 tile whose top-left pixel is at (row, col).
	fn tile_at(&self, row: usize, col: usize) -> RgbaTile {
		let mut tile = RgbaTile::uniform(Rgba32::default());
		for tile_row in 0..TILE_SIDE_LENGTH {
			for tile_col in 0..TILE_SIDE_LENGTH {
				let offset = ((row + tile_row) * self.width + col + tile_col) * 4;
				tile.set_pixel(
					tile_row,
					tile_col,
					Rgba32::new(
						self.pixels[offset],
						self.pixels[offset + 1],
						self.pixels[offset + 2],
						self.pixels[offset + 3],
					),
				);
			}
		}
		tile
	}
}

/// Imports a freestanding tile sheet: tiles are cut row-major and carry no
/// metatile attributes.
pub fn import_tiles_from_png<R>(buf: R) -> Result<DecompiledTileset, ImportError>
where
	R: Read,
{
	let sheet = Sheet::decode(buf)?;
	if sheet.width % TILE_SIDE_LENGTH != 0 {
		return Err(ImportError::DimensionIndivisible {
			dimension: "width",
			value: sheet.width as u32,
		});
	}
	if sheet.height % TILE_SIDE_LENGTH != 0 {
		return Err(ImportError::DimensionIndivisible {
			dimension: "height",
			value: sheet.height as u32,
		});
	}

	let width_in_tiles = sheet.width / TILE_SIDE_LENGTH;
	let height_in_tiles = sheet.height / TILE_SIDE_LENGTH;
	let mut tiles = Vec::with_capacity(width_in_tiles * height_in_tiles);
	for index in 0..width_in_tiles * height_in_tiles {
		let row = index / width_in_tiles;
		let col = index % width_in_tiles;
		tiles.push(sheet.tile_at(row * TILE_SIDE_LENGTH, col * TILE_SIDE_LENGTH));
	}

	Ok(DecompiledTileset {
		tiles: tiles,
		attributes: vec![],
	})
}

fn validate_layer(layer: &'static str, sheet: &Sheet) -> Result<(), ImportError> {
	if sheet.width as u32 != LAYER_WIDTH {
		return Err(ImportError::LayerWidthMismatch {
			layer: layer,
			width: sheet.width as u32,
			expected: LAYER_WIDTH,
		});
	}
	if sheet.height % METATILE_SIDE_LENGTH != 0 {
		return Err(ImportError::LayerHeightIndivisible {
			layer: layer,
			height: sheet.height as u32,
		});
	}
	Ok(())
}

/// Imports a layered tileset from its three layer sheets. Each 16x16 metatile
/// contributes its 2x2 subtiles per layer, bottom to top. Triple-layer mode
/// keeps all three layers for every metatile; dual-layer mode infers each
/// metatile's layer type from which layers hold content and keeps those two.
pub fn import_layered_tiles_from_pngs<R>(
	bottom: R,
	middle: R,
	top: R,
	attributes_map: &HashMap<usize, Attributes>,
	transparency: Rgba32,
	dual_layer: bool,
) -> Result<DecompiledTileset, ImportError>
where
	R: Read,
{
	let bottom = Sheet::decode(bottom)?;
	let middle = Sheet::decode(middle)?;
	let top = Sheet::decode(top)?;

	validate_layer("bottom", &bottom)?;
	validate_layer("middle", &middle)?;
	validate_layer("top", &top)?;
	if bottom.height != middle.height || bottom.height != top.height {
		return Err(ImportError::LayerHeightsDiffer {
			bottom: bottom.height as u32,
			middle: middle.height as u32,
			top: top.height as u32,
		});
	}

	let height_in_metatiles = bottom.height / METATILE_SIDE_LENGTH;
	let metatile_count = height_in_metatiles * METATILES_IN_ROW;

	let mut decompiled = DecompiledTileset::default();
	for metatile_index in 0..metatile_count {
		let metatile_row = metatile_index / METATILES_IN_ROW;
		let metatile_col = metatile_index % METATILES_IN_ROW;

		// 2x2 subtiles per layer, row-major
		let mut subtiles = [[RgbaTile::uniform(Rgba32::default()); 4]; 3];
		for (layer_index, sheet) in [&bottom, &middle, &top].into_iter().enumerate() {
			for subtile in 0..4 {
				let row = metatile_row * METATILE_SIDE_LENGTH + (subtile / 2) * TILE_SIDE_LENGTH;
				let col = metatile_col * METATILE_SIDE_LENGTH + (subtile % 2) * TILE_SIDE_LENGTH;
				subtiles[layer_index][subtile] = sheet.tile_at(row, col);
			}
		}

		let layer_type = if dual_layer {
			let mut has_content = [false; 3];
			for (layer_index, layer) in subtiles.iter().enumerate() {
				has_content[layer_index] = layer.iter().any(|tile| !tile.is_transparent(transparency));
			}
			match has_content {
				[true, true, true] => {
					return Err(ImportError::TripleLayerContent {
						metatile: metatile_index,
					})
				}
				[true, false, true] => LayerType::Split,
				[true, _, false] => LayerType::Covered,
				_ => LayerType::Normal,
			}
		} else {
			LayerType::Triple
		};

		// dual-layer metatiles keep only the two layers their type names
		let kept: &[usize] = match layer_type {
			LayerType::Triple => &[0, 1, 2],
			LayerType::Normal => &[1, 2],
			LayerType::Covered => &[0, 1],
			LayerType::Split => &[0, 2],
		};
		for &layer_index in kept {
			decompiled.tiles.extend_from_slice(&subtiles[layer_index]);
		}

		let mut attributes = attributes_map.get(&metatile_index).copied().unwrap_or_default();
		attributes.layer_type = layer_type;
		decompiled.attributes.push(attributes);
	}

	for id in attributes_map.keys() {
		if *id >= metatile_count {
			warn!("attributes entry for metatile {} is out of range, ignored", id);
		}
	}

	Ok(decompiled)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;
	use tilekit_core::color::{
		RGBA_GREEN,
		RGBA_MAGENTA,
		RGBA_RED
	};

	/// Encodes an RGBA PNG in memory.
	fn encode_png(width: usize, height: usize, paint: impl Fn(usize, usize) -> Rgba32) -> Vec<u8> {
		let mut data = Vec::new();
		{
			let mut encoder = png::Encoder::new(&mut data, width as u32, height as u32);
			encoder.set_color(png::ColorType::Rgba);
			encoder.set_depth(png::BitDepth::Eight);
			let mut writer = encoder.write_header().unwrap();
			let mut pixels = Vec::with_capacity(width * height * 4);
			for row in 0..height {
				for col in 0..width {
					let color = paint(row, col);
					pixels.extend_from_slice(&[color.red, color.green, color.blue, color.alpha]);
				}
			}
			writer.write_image_data(&pixels).unwrap();
		}
		data
	}

	fn magenta_png(width: usize, height: usize) -> Vec<u8> {
		encode_png(width, height, |_, _| RGBA_MAGENTA)
	}

	#[test]
	fn test_freestanding_import_cuts_row_major() {
		// 16x8 sheet: red left tile, green right tile
		let data = encode_png(16, 8, |_, col| if col < 8 { RGBA_RED } else { RGBA_GREEN });
		let decompiled = import_tiles_from_png(Cursor::new(data)).unwrap();
		assert_eq!(decompiled.tiles.len(), 2);
		assert_eq!(decompiled.tiles[0].pixel(0, 0), RGBA_RED);
		assert_eq!(decompiled.tiles[1].pixel(0, 0), RGBA_GREEN);
		assert!(decompiled.attributes.is_empty());
	}

	#[test]
	fn test_freestanding_import_checks_dimensions() {
		let data = encode_png(12, 8, |_, _| RGBA_MAGENTA);
		assert!(matches!(
			import_tiles_from_png(Cursor::new(data)),
			Err(ImportError::DimensionIndivisible { dimension: "width", .. })
		));
	}

	#[test]
	fn test_layered_import_orders_layers_bottom_to_top() {
		// one metatile row; metatile 0 has a red bottom-layer pixel and a
		// green top-layer pixel
		let bottom = encode_png(128, 16, |row, col| {
			if row == 0 && col == 0 { RGBA_RED } else { RGBA_MAGENTA }
		});
		let middle = magenta_png(128, 16);
		let top = encode_png(128, 16, |row, col| {
			if row == 8 && col == 8 { RGBA_GREEN } else { RGBA_MAGENTA }
		});

		let decompiled = import_layered_tiles_from_pngs(
			Cursor::new(bottom),
			Cursor::new(middle),
			Cursor::new(top),
			&HashMap::new(),
			RGBA_MAGENTA,
			false,
		)
		.unwrap();

		// 8 metatiles, 12 tiles each, triple-layer keeps every layer
		assert_eq!(decompiled.tiles.len(), 96);
		assert_eq!(decompiled.attributes.len(), 8);
		// bottom subtile 0 leads metatile 0
		assert_eq!(decompiled.tiles[0].pixel(0, 0), RGBA_RED);
		// top subtile 3 closes metatile 0
		assert_eq!(decompiled.tiles[11].pixel(0, 0), RGBA_GREEN);
		assert_eq!(decompiled.attributes[0].layer_type, LayerType::Triple);
	}

	#[test]
	fn test_dual_layer_infers_layer_types() {
		// metatile 0: bottom+middle content (covered); metatile 1: top only
		// (normal); metatile 2: bottom+top (split)
		let bottom = encode_png(128, 16, |_, col| {
			if col < 16 || (32..48).contains(&col) { RGBA_RED } else { RGBA_MAGENTA }
		});
		let middle = encode_png(128, 16, |_, col| {
			if col < 16 { RGBA_GREEN } else { RGBA_MAGENTA }
		});
		let top = encode_png(128, 16, |_, col| {
			if (16..48).contains(&col) { RGBA_GREEN } else { RGBA_MAGENTA }
		});

		let decompiled = import_layered_tiles_from_pngs(
			Cursor::new(bottom),
			Cursor::new(middle),
			Cursor::new(top),
			&HashMap::new(),
			RGBA_MAGENTA,
			true,
		)
		.unwrap();

		// dual-layer keeps two layers per metatile
		assert_eq!(decompiled.tiles.len(), 64);
		assert_eq!(decompiled.attributes[0].layer_type, LayerType::Covered);
		assert_eq!(decompiled.attributes[1].layer_type, LayerType::Normal);
		assert_eq!(decompiled.attributes[2].layer_type, LayerType::Split);
		// wholly transparent metatiles read as normal
		assert_eq!(decompiled.attributes[3].layer_type, LayerType::Normal);
	}

	#[test]
	fn test_dual_layer_rejects_triple_content() {
		let sheet = encode_png(128, 16, |_, col| if col < 16 { RGBA_RED } else { RGBA_MAGENTA });
		let result = import_layered_tiles_from_pngs(
			Cursor::new(sheet.clone()),
			Cursor::new(sheet.clone()),
			Cursor::new(sheet),
			&HashMap::new(),
			RGBA_MAGENTA,
			true,
		);
		assert!(matches!(result, Err(ImportError::TripleLayerContent { metatile: 0 })));
	}

	#[test]
	fn test_layered_import_validates_dimensions() {
		let result = import_layered_tiles_from_pngs(
			Cursor::new(magenta_png(64, 16)),
			Cursor::new(magenta_png(128, 16)),
			Cursor::new(magenta_png(128, 16)),
			&HashMap::new(),
			RGBA_MAGENTA,
			false,
		);
		assert!(matches!(
			result,
			Err(ImportError::LayerWidthMismatch { layer: "bottom", width: 64, .. })
		));

		let result = import_layered_tiles_from_pngs(
			Cursor::new(magenta_png(128, 16)),
			Cursor::new(magenta_png(128, 32)),
			Cursor::new(magenta_png(128, 16)),
			&HashMap::new(),
			RGBA_MAGENTA,
			false,
		);
		assert!(matches!(result, Err(ImportError::LayerHeightsDiffer { .. })));
	}
}
