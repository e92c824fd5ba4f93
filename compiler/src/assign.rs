use tilekit_core::tile::PAL_SIZE;

use crate::{
	colorset::ColorSet,
	error::CompileError
};

/// Search state for palette assignment. Each branch works on its own copy; a
/// ColorSet is four words, so copies stay cheap.
#[derive(Clone, Debug)]
pub struct AssignState {
	/// One color set per hardware palette under construction.
	pub palettes: Vec<ColorSet>,
	/// Distinct tile color sets not yet covered. Sorted popcount-ascending by
	/// the caller, consumed from the back, so the largest sets go first.
	pub unassigned: Vec<ColorSet>,
}

/// Recursive backtracking packer. Fills `solution` and returns true when every
/// unassigned set is covered, either by a paired-primary palette or by one of
/// the palettes under construction; returns false when every branch prunes.
/// Each invocation counts against the caller's recursion budget.
pub fn assign(
	max_recurse_count: usize,
	recurse_count: &mut usize,
	mut state: AssignState,
	solution: &mut Vec<ColorSet>,
	primary_palettes: &[ColorSet],
) -> Result<bool, CompileError> {
	*recurse_count += 1;
	if *recurse_count > max_recurse_count {
		return Err(CompileError::AssignmentBudgetExceeded(max_recurse_count));
	}

	let to_assign = match state.unassigned.last() {
		Some(set) => *set,
		None => {
			// nothing left to assign, this branch is a solution
			solution.extend_from_slice(&state.palettes);
			return Ok(true);
		}
	};

	/*
	 * A set wholly covered by a paired-primary palette needs no new colors at
	 * all; try those branches first, in primary palette order.
	 */
	for palette in primary_palettes {
		if to_assign.subset_of(palette) {
			let mut next = state.clone();
			next.unassigned.pop();
			if assign(max_recurse_count, recurse_count, next, solution, primary_palettes)? {
				return Ok(true);
			}
		}
	}

	/*
	 * Order the palettes under construction before branching: largest
	 * intersection with `to_assign` first, emptier palette on ties. Branches
	 * that share colors with the incoming set waste no palette slots, so they
	 * are the ones most likely to lead to a packing.
	 */
	state.palettes.sort_by(|a, b| {
		let a_shared = a.intersect_count(&to_assign);
		let b_shared = b.intersect_count(&to_assign);
		b_shared.cmp(&a_shared).then(a.count().cmp(&b.count()))
	});

	for i in 0..state.palettes.len() {
		// one slot of the 16 is reserved for transparency
		if state.palettes[i].union(&to_assign).count() > PAL_SIZE - 1 {
			continue;
		}
		let mut next = state.clone();
		next.unassigned.pop();
		next.palettes[i] = next.palettes[i].union(&to_assign);
		if assign(max_recurse_count, recurse_count, next, solution, primary_palettes)? {
			return Ok(true);
		}
	}

	// every branch pruned
	Ok(false)
}
