use thiserror::Error;

/// Failures of a compile invocation. All of these are fatal; the driver never
/// recovers from any of them.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompileError {
	#[error("invalid alpha value: {0}")]
	InvalidAlpha(u8),
	#[error("too many unique colors in tile")]
	TileHasTooManyColors,
	#[error("too many unique colors: {got} > {max}")]
	TooManyColors { got: usize, max: usize },
	#[error("failed to allocate palettes")]
	AssignmentImpossible,
	#[error("palette assignment exceeded recursion limit: {0}")]
	AssignmentBudgetExceeded(usize),
	#[error("too many tiles: {got} > {max}")]
	TooManyTiles { got: usize, max: usize },
	#[error("too many metatiles: {got} > {max}")]
	TooManyMetatiles { got: usize, max: usize },
	#[error("paired primary has {got} palettes, expected {expected}")]
	PairedPrimaryMismatch { got: usize, expected: usize },
	#[error("internal invariant violation: {0}")]
	Internal(&'static str),
}
