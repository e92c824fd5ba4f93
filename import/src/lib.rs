pub mod attributes;
pub mod behaviors;
pub mod png_import;

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
	#[error("I/O error")]
	Io {
		#[from]
		source: io::Error,
	},
	#[error("PNG decode error")]
	Png {
		#[from]
		source: png::DecodingError,
	},
	#[error("unsupported PNG format: {0}")]
	UnsupportedPng(&'static str),
	#[error("{dimension} {value} is not divisible by 8")]
	DimensionIndivisible { dimension: &'static str, value: u32 },
	#[error("{layer} layer is {width} pixels wide, expected {expected}")]
	LayerWidthMismatch {
		layer: &'static str,
		width: u32,
		expected: u32,
	},
	#[error("{layer} layer height {height} is not divisible by 16")]
	LayerHeightIndivisible { layer: &'static str, height: u32 },
	#[error("layer heights differ: bottom {bottom}, middle {middle}, top {top}")]
	LayerHeightsDiffer { bottom: u32, middle: u32, top: u32 },
	#[error("metatile {metatile} has content on all three layers")]
	TripleLayerContent { metatile: usize },
	#[error("invalid attributes CSV header: {0}")]
	AttributesHeader(String),
	#[error("attributes CSV line {line}: {reason}")]
	AttributesRow { line: usize, reason: String },
	#[error("behaviors header line {line}: invalid value `{value}' for {name}")]
	BehaviorValue {
		line: usize,
		name: String,
		value: String,
	},
}
