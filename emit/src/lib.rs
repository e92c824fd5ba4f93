use byteorder::{
	LE,
	WriteBytesExt
};

use std::io::{
	self,
	Write
};

use thiserror::Error;

use tilekit_core::{
	scale5to8,
	tile::{
		HwPalette,
		PAL_SIZE,
		TILE_NUM_PIX,
		TILE_SIDE_LENGTH
	},
	tileset::{
		Attributes,
		CompiledTileset
	}
};

/// Width of the emitted `tiles.png`, in tiles.
pub const TILES_PNG_WIDTH_IN_TILES: usize = 16;

const METATILE_HFLIP_BIT: u16 = 1 << 10;
const METATILE_VFLIP_BIT: u16 = 1 << 11;
const METATILE_PALETTE_SHIFT: u16 = 12;
const ATTRIBUTE_LAYER_SHIFT: u16 = 12;

#[derive(Debug, Error)]
pub enum EmitError {
	#[error("I/O error")]
	Io {
		#[from]
		source: io::Error,
	},
	#[error("PNG encode error")]
	Png {
		#[from]
		source: png::EncodingError,
	},
}

/// Writes one hardware palette as a JASC-PAL file. Slots past the palette's
/// size are zero-filled so every file carries all 16 lines.
pub fn emit_palette<W>(buf: &mut W, palette: &HwPalette) -> io::Result<()>
where
	W: Write,
{
	write!(buf, "JASC-PAL\r\n0100\r\n16\r\n")?;
	for slot in 0..PAL_SIZE {
		if slot < palette.size {
			let color = palette.colors[slot];
			write!(
				buf,
				"{} {} {}\r\n",
				scale5to8(color.red5()),
				scale5to8(color.green5()),
				scale5to8(color.blue5())
			)?;
		} else {
			write!(buf, "0 0 0\r\n")?;
		}
	}
	Ok(())
}

/// Writes the all-zero palette used for slots the compilation never filled.
pub fn emit_zeroed_palette<W>(buf: &mut W) -> io::Result<()>
where
	W: Write,
{
	emit_palette(buf, &HwPalette::default())
}

/// Writes the compiled tiles as an indexed PNG, 16 tiles per row. The PLTE is
/// a 16-step greyscale ramp: the indices are what matter, the colors are only
/// a viewing aid.
pub fn emit_tiles_png<W>(buf: W, tileset: &CompiledTileset) -> Result<(), EmitError>
where
	W: Write,
{
	let rows = tileset.tiles.len().div_ceil(TILES_PNG_WIDTH_IN_TILES);
	let width = TILES_PNG_WIDTH_IN_TILES * TILE_SIDE_LENGTH;
	let height = rows.max(1) * TILE_SIDE_LENGTH;

	let mut greyscale = Vec::with_capacity(PAL_SIZE * 3);
	for i in 0..PAL_SIZE as u8 {
		greyscale.extend_from_slice(&[i * 17, i * 17, i * 17]);
	}

	let mut encoder = png::Encoder::new(buf, width as u32, height as u32);
	encoder.set_color(png::ColorType::Indexed);
	encoder.set_depth(png::BitDepth::Eight);
	encoder.set_palette(greyscale);
	let mut writer = encoder.write_header()?;

	let mut pixels = vec![0u8; width * height];
	for (tile_index, tile) in tileset.tiles.iter().enumerate() {
		let origin_row = (tile_index / TILES_PNG_WIDTH_IN_TILES) * TILE_SIDE_LENGTH;
		let origin_col = (tile_index % TILES_PNG_WIDTH_IN_TILES) * TILE_SIDE_LENGTH;
		for pixel_index in 0..TILE_NUM_PIX {
			let row = origin_row + pixel_index / TILE_SIDE_LENGTH;
			let col = origin_col + pixel_index % TILE_SIDE_LENGTH;
			pixels[row * width + col] = tile.color_indexes[pixel_index];
		}
	}
	writer.write_image_data(&pixels)?;
	Ok(())
}

/// Writes `metatiles.bin`: one little-endian word per assignment, packing the
/// tile index with the flip bits and the palette slot.
pub fn emit_metatiles_bin<W>(buf: &mut W, tileset: &CompiledTileset) -> io::Result<()>
where
	W: WriteBytesExt,
{
	for assignment in &tileset.assignments {
		let mut word = assignment.tile_index as u16;
		if assignment.hflip {
			word |= METATILE_HFLIP_BIT;
		}
		if assignment.vflip {
			word |= METATILE_VFLIP_BIT;
		}
		word |= (assignment.palette_index as u16) << METATILE_PALETTE_SHIFT;
		buf.write_u16::<LE>(word)?;
	}
	Ok(())
}

/// Writes `metatile_attributes.bin`: one little-endian word per metatile with
/// the behavior in the low byte and the layer type in the high bits.
pub fn emit_attributes<W>(buf: &mut W, attributes: &[Attributes]) -> io::Result<()>
where
	W: WriteBytesExt,
{
	for entry in attributes {
		let word = entry.behavior as u16 | entry.layer_type.bits() << ATTRIBUTE_LAYER_SHIFT;
		buf.write_u16::<LE>(word)?;
	}
	Ok(())
}
