use std::{
	collections::HashMap,
	io::{
		BufRead,
		BufReader,
		Read
	}
};

use crate::ImportError;

/// The sentinel the target project assigns to invalid behaviors.
const BEHAVIOR_INVALID: u8 = 0xFF;

/// Scrapes metatile behaviors from a C header. Lines of the shape
/// `#define MB_NAME <value>` are collected; everything else is ignored.
/// Returns the name-to-value map and its reverse for the attributes emitter.
pub fn parse_behavior_header<R>(buf: R) -> Result<(HashMap<String, u8>, HashMap<u8, String>), ImportError>
where
	R: Read,
{
	let mut behaviors = HashMap::new();
	let mut reverse = HashMap::new();

	for (index, line) in BufReader::new(buf).lines().enumerate() {
		let line = line?;
		let tokens: Vec<&str> = line.split_whitespace().collect();
		if tokens.len() != 3 || tokens[0] != "#define" || !tokens[1].starts_with("MB_") {
			continue;
		}
		let name = tokens[1];
		let value = parse_c_number(tokens[2]).ok_or(ImportError::BehaviorValue {
			line: index + 1,
			name: String::from(name),
			value: String::from(tokens[2]),
		})?;
		// skip the invalid-behavior sentinel
		if value != BEHAVIOR_INVALID {
			behaviors.insert(String::from(name), value);
			reverse.insert(value, String::from(name));
		}
	}

	Ok((behaviors, reverse))
}

/// Accepts decimal, `0x` hex, or C-style octal.
fn parse_c_number(token: &str) -> Option<u8> {
	if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
		return u8::from_str_radix(hex, 16).ok();
	}
	if token.len() > 1 && token.starts_with('0') {
		return u8::from_str_radix(&token[1..], 8).ok();
	}
	token.parse().ok()
}
