use asset::AssetTableBuilder;
use binfmt::Writer;

use crate::config::ProjectConfig;

const NO_FONT: u16 = 0xffff;
const AUTOLOAD_FONT_SLOTS: usize = 16;

/// Serializes `filesystem/p64/conf`: boot/reset scene ids and up to 16
/// autoload font slots, each an asset index or `0xFFFF` if unused.
pub fn build_conf(project: &ProjectConfig, assets: &AssetTableBuilder) -> Vec<u8> {
	let mut w = Writer::new();
	w.write_u32(project.scene_id_on_boot);
	w.write_u32(project.scene_id_on_reset);

	for slot in 0..AUTOLOAD_FONT_SLOTS {
		let index = project
			.autoload_font_uuids
			.get(slot)
			.and_then(|&uuid| assets.index_of_uuid(asset::AssetUuid(uuid)))
			.map(|idx| idx.serial() as u16)
			.unwrap_or(NO_FONT);
		w.write_u16(index);
	}

	w.into_bytes()
}

#[cfg(test)]
mod tests {
	use super::*;
	use asset::AssetKind;

	#[test]
	fn unused_slots_are_filled_with_sentinel() {
		let project = ProjectConfig {
			name: "demo".into(),
			rom_name: "demo.z64".into(),
			path_n64_inst: String::new(),
			scene_id_on_boot: 1,
			scene_id_on_reset: 1,
			autoload_font_uuids: vec![],
			assets: vec![],
			scenes: vec![],
		};
		let assets = AssetTableBuilder::new();
		let bytes = build_conf(&project, &assets);
		assert_eq!(bytes.len(), 4 + 4 + 16 * 2);
		assert_eq!(u16::from_be_bytes([bytes[8], bytes[9]]), NO_FONT);
	}

	#[test]
	fn resolves_font_uuid_to_its_asset_index() {
		let mut assets = AssetTableBuilder::new();
		let uuid = asset::AssetUuid::for_content_path("fonts/default.ttf");
		let index = assets.add(uuid, AssetKind::Font, "fonts/default.bin");

		let project = ProjectConfig {
			name: "demo".into(),
			rom_name: "demo.z64".into(),
			path_n64_inst: String::new(),
			scene_id_on_boot: 1,
			scene_id_on_reset: 1,
			autoload_font_uuids: vec![uuid.as_u64()],
			assets: vec![],
			scenes: vec![],
		};
		let bytes = build_conf(&project, &assets);
		assert_eq!(u16::from_be_bytes([bytes[8], bytes[9]]), index.serial() as u16);
	}
}
