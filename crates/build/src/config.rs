use serde::Deserialize;

/// `project.json`: top-level project configuration, the root of a project's
/// `.p64proj` tree (spec §6). Mirrors the original's `Project::Conf` fields
/// that the build driver actually reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
	pub name: String,
	pub rom_name: String,
	#[serde(default)]
	pub path_n64_inst: String,
	pub scene_id_on_boot: u32,
	pub scene_id_on_reset: u32,
	/// UUIDs of fonts to autoload at boot, in slot order. The conf file
	/// writer pads this out to 16 entries with `0xFFFF` ("none").
	#[serde(default)]
	pub autoload_font_uuids: Vec<u64>,
	/// Inlined rather than scanned from per-asset files on disk: keeps the
	/// build driver free of manifest-directory conventions the spec leaves
	/// unspecified, at the cost of one flat list instead of a tree scan.
	#[serde(default)]
	pub assets: Vec<AssetConfig>,
	#[serde(default)]
	pub scenes: Vec<SceneConfig>,
}

/// One entry in the project's asset manifest: where an asset lives, what
/// kind it is, and author-set per-asset flags (compression level, resample
/// rate, and so on for the out-of-scope external converters).
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
	pub path: String,
	pub kind: AssetKindConfig,
	#[serde(default)]
	pub exclude: bool,
	#[serde(default)]
	pub flags: serde_json::Value,
	/// For `Model` assets: path (relative to the project's `assets/`
	/// directory) to the intermediate triangle-soup mesh the external model
	/// converter emits, baked into a collision-mesh chunk alongside the
	/// converted asset. Absent for assets with no collision representation.
	#[serde(default)]
	pub collision_source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKindConfig {
	Image,
	Audio,
	Font,
	Model,
	Script,
	GlobalScript,
	Prefab,
}

impl From<AssetKindConfig> for asset::AssetKind {
	fn from(value: AssetKindConfig) -> Self {
		match value {
			AssetKindConfig::Image => asset::AssetKind::Image,
			AssetKindConfig::Audio => asset::AssetKind::Audio,
			AssetKindConfig::Font => asset::AssetKind::Font,
			AssetKindConfig::Model => asset::AssetKind::Model,
			AssetKindConfig::Script => asset::AssetKind::Script,
			AssetKindConfig::GlobalScript => asset::AssetKind::GlobalScript,
			AssetKindConfig::Prefab => asset::AssetKind::Prefab,
		}
	}
}

/// `data/scenes/<id>/conf.json`: per-scene render configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
	pub id: u32,
	pub fb_width: u16,
	pub fb_height: u16,
	#[serde(default)]
	pub clear_color: [u8; 4],
	#[serde(default)]
	pub do_clear_depth: bool,
	#[serde(default)]
	pub do_clear_color: bool,
	#[serde(default)]
	pub fb_format_32bit: bool,
	/// The scene's object tree. The original keeps this in the same
	/// `conf.json` it reads render settings from; there is no separate
	/// hierarchy file in scope here since the scene hierarchy editor UI
	/// producing one is an explicit Non-goal.
	#[serde(default)]
	pub objects: Vec<ObjectConfig>,
}

fn unit_scale() -> [f32; 3] {
	[1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectConfig {
	pub id: u16,
	#[serde(default)]
	pub group: u16,
	#[serde(default)]
	pub flags: u16,
	#[serde(default)]
	pub position: [f32; 3],
	#[serde(default = "unit_scale")]
	pub scale: [f32; 3],
	/// Quaternion as `[i, j, k, w]`; absent means identity rotation.
	#[serde(default)]
	pub rotation: Option<[f32; 4]>,
	#[serde(default)]
	pub components: Vec<ComponentConfig>,
	#[serde(default)]
	pub children: Vec<ObjectConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentConfig {
	Code { script_uuid: u64, flags: u16, #[serde(default)] args: Vec<u8> },
	Model { asset_uuid: u64, layer: u8, flags: u8, material: [u8; 4], #[serde(default)] mesh_filter: Vec<u8> },
	Light { color: [u8; 4], index: u8, light_type: u8, dir: [i8; 3] },
	Camera { vp_offset: [i32; 2], vp_size: [i32; 2], fov: f32, near: f32, far: f32 },
	CollMesh { asset_uuid: u64 },
	CollBody { half_extent: [f32; 3], offset: [f32; 3], flags: u8, mask_read: u8, mask_write: u8 },
	Audio2D { asset_uuid: u64, volume_q16: u16, flags: u8 },
}

const FLAG_CLEAR_DEPTH: u32 = 1 << 0;
const FLAG_CLEAR_COLOR: u32 = 1 << 1;
const FLAG_SCREEN_32BIT: u32 = 1 << 2;

impl SceneConfig {
	pub fn flags(&self) -> u32 {
		let mut flags = 0;
		if self.do_clear_depth {
			flags |= FLAG_CLEAR_DEPTH;
		}
		if self.do_clear_color {
			flags |= FLAG_CLEAR_COLOR;
		}
		if self.fb_format_32bit {
			flags |= FLAG_SCREEN_32BIT;
		}
		flags
	}
}
