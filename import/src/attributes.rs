use std::{
	collections::HashMap,
	io::{
		BufRead,
		BufReader,
		Read
	}
};

use log::warn;

use tilekit_core::tileset::Attributes;

use crate::ImportError;

/// Parses a metatile attributes CSV. The header must be `id,behavior` or
/// `id,behavior,terrainType,encounterType`; behaviors may be given by name
/// (resolved through the behavior map) or as a bare number.
pub fn parse_attributes_csv<R>(
	buf: R,
	behavior_map: &HashMap<String, u8>,
) -> Result<HashMap<usize, Attributes>, ImportError>
where
	R: Read,
{
	let mut lines = BufReader::new(buf).lines();
	let header = match lines.next() {
		Some(line) => line?,
		None => return Err(ImportError::AttributesHeader(String::from("empty file"))),
	};
	let columns: Vec<&str> = header.trim().split(',').map(str::trim).collect();
	let full_form = match columns.as_slice() {
		["id", "behavior"] => false,
		["id", "behavior", "terrainType", "encounterType"] => true,
		_ => return Err(ImportError::AttributesHeader(header.clone())),
	};

	let mut attributes: HashMap<usize, Attributes> = HashMap::new();
	for (index, line) in lines.enumerate() {
		let line = line?;
		// header was line 1
		let line_number = index + 2;
		if line.trim().is_empty() {
			continue;
		}
		let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
		if fields.len() != columns.len() {
			return Err(ImportError::AttributesRow {
				line: line_number,
				reason: format!("expected {} fields, found {}", columns.len(), fields.len()),
			});
		}

		let id: usize = fields[0].parse().map_err(|_| ImportError::AttributesRow {
			line: line_number,
			reason: format!("invalid metatile id `{}'", fields[0]),
		})?;
		let behavior = parse_behavior(fields[1], behavior_map).ok_or(ImportError::AttributesRow {
			line: line_number,
			reason: format!("unknown metatile behavior `{}'", fields[1]),
		})?;

		let mut entry = Attributes::default();
		entry.behavior = behavior;
		if full_form {
			entry.terrain_type = parse_number(fields[2]).ok_or(ImportError::AttributesRow {
				line: line_number,
				reason: format!("invalid terrain type `{}'", fields[2]),
			})?;
			entry.encounter_type = parse_number(fields[3]).ok_or(ImportError::AttributesRow {
				line: line_number,
				reason: format!("invalid encounter type `{}'", fields[3]),
			})?;
		}

		if attributes.insert(id, entry).is_some() {
			warn!("attributes CSV line {}: duplicate entry for metatile {}", line_number, id);
		}
	}

	Ok(attributes)
}

fn parse_behavior(field: &str, behavior_map: &HashMap<String, u8>) -> Option<u8> {
	behavior_map.get(field).copied().or_else(|| parse_number(field))
}

/// Accepts decimal or `0x`-prefixed hex.
fn parse_number(field: &str) -> Option<u8> {
	match field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")) {
		Some(hex) => u8::from_str_radix(hex, 16).ok(),
		None => field.parse().ok(),
	}
}
