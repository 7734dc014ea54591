use std::path::Path;

use asset::{AssetEntry, AssetKind};

use crate::error::{self, Result};

/// Builds the `if(path == "<rom-path>") return <index>;`-shaped lookup body
/// (spec §4.E), one branch per asset, in table order. Kept here as plain
/// text generation rather than a `match` because the original's consumer is
/// a runtime that resolves a string literal captured at compile time; the
/// generated fragment is spliced into a template by the caller.
pub fn generate_asset_index_body(entries: &[AssetEntry]) -> String {
	let mut out = String::new();
	for (flat_index, entry) in entries.iter().enumerate() {
		out.push_str(&format!("if path == \"{}\" {{ return {}; }}\n", entry.rom_path, flat_index));
	}
	out
}

/// Script dispatch data: in lieu of linking against user script code (out
/// of scope; scripts are opaque units keyed by UUID), this emits the
/// ordered UUID table a runtime script loader would index by `AssetIndex`
/// serial to find the matching compiled-in update function.
pub fn generate_script_table(entries: &[AssetEntry]) -> String {
	let uuids: Vec<String> = entries
		.iter()
		.filter(|e| e.kind == AssetKind::Script)
		.map(|e| format!("\t0x{:016x},", e.uuid.as_u64()))
		.collect();

	format!(
		"// Auto-generated by the build pipeline. Do not edit.\n\
		 pub static SCRIPT_UUIDS: [u64; {}] = [\n{}\n];\n",
		uuids.len(),
		uuids.join("\n")
	)
}

/// Writes `path` only if its content differs from what's already there, so
/// downstream Make-equivalent build steps only see a changed mtime when the
/// generated source actually changed (spec §4.E, §10 Makefile diffing).
pub fn write_if_changed(path: &Path, contents: &str) -> Result<bool> {
	if let Ok(existing) = error::read_to_string(path) {
		if existing == contents {
			return Ok(false);
		}
	}
	error::write(path, contents.as_bytes())?;
	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use asset::AssetUuid;

	fn entry(rom_path: &str, kind: AssetKind, uuid: u64) -> AssetEntry {
		AssetEntry { uuid: AssetUuid(uuid), kind, rom_path: rom_path.to_string() }
	}

	#[test]
	fn asset_index_body_has_one_branch_per_entry_in_table_order() {
		let entries = vec![
			entry("tex/a.ia8", AssetKind::Image, 1),
			entry("tex/b.ia8", AssetKind::Image, 2),
		];
		let body = generate_asset_index_body(&entries);
		assert!(body.contains("if path == \"tex/a.ia8\" { return 0; }"));
		assert!(body.contains("if path == \"tex/b.ia8\" { return 1; }"));
	}

	#[test]
	fn script_table_only_includes_script_kind_entries() {
		let entries = vec![
			entry("scripts/player.luac", AssetKind::Script, 0xdead_beef),
			entry("tex/a.ia8", AssetKind::Image, 1),
		];
		let table = generate_script_table(&entries);
		assert!(table.contains("SCRIPT_UUIDS: [u64; 1]"));
		assert!(table.contains("0x00000000deadbeef"));
	}

	#[test]
	fn write_if_changed_skips_identical_content() {
		let dir = std::env::temp_dir().join(format!("p64-codegen-test-{}", std::process::id()));
		let path = dir.join("gen.rs");
		error::write(&path, b"same").unwrap();
		assert!(!write_if_changed(&path, "same").unwrap());
		assert!(write_if_changed(&path, "different").unwrap());
		std::fs::remove_dir_all(&dir).ok();
	}
}
