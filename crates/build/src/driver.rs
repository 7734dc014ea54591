use std::path::{Path, PathBuf};

use asset::{AssetTableBuilder, AssetUuid};
use math::{Quaternion, UnitQuaternion, Vec3};
use scene::{Component, Object, ObjectId, Scene};

use crate::codegen;
use crate::conf;
use crate::config::{ComponentConfig, ObjectConfig, ProjectConfig, SceneConfig};
use crate::error::{self, Result};
use crate::orchestrator::{bake_collision_mesh, plan_asset_jobs, run_converter, AssetJob};

/// Sentinel asset index emitted in place of a reference that failed to
/// resolve, so one bad link does not halt the whole build (spec §4.C, §7).
const MISSING_ASSET_SENTINEL: u16 = 0xDEAD;

pub struct BuildSummary {
	pub asset_count: usize,
	pub scene_files: Vec<PathBuf>,
	pub asset_table_path: PathBuf,
	pub conf_path: PathBuf,
	pub generated_files_changed: Vec<PathBuf>,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
	let path = project_root.join("project.json");
	let text = error::read_to_string(&path)?;
	serde_json::from_str(&text).map_err(|source| crate::error::BuildError::Json { path, source })
}

/// Runs a full project build: converts out-of-date assets, builds the asset
/// table, serializes every scene, regenerates source glue, and writes the
/// boot configuration. Mirrors `buildProject`'s phase ordering: assets are
/// registered before scenes are walked so component builders can resolve
/// asset UUIDs against a complete table.
pub fn build_project(project_root: &Path) -> Result<BuildSummary> {
	let project = load_project_config(project_root)?;
	let fs_root = project_root.join("filesystem").join("p64");

	let jobs = plan_asset_jobs(project_root, &project.assets);
	let mut assets = AssetTableBuilder::new();
	for job in &jobs {
		build_asset_if_needed(job)?;
		register_asset(&mut assets, job);
	}

	let asset_table_path = fs_root.join("a");
	error::write(&asset_table_path, &assets.build())?;

	let mut scene_files = Vec::new();
	for scene_config in &project.scenes {
		scene_files.extend(build_scene(project_root, &fs_root, scene_config, &assets)?);
	}

	let mut generated_files_changed = Vec::new();
	let asset_map_body = codegen::generate_asset_index_body(assets.entries());
	let asset_header_path = project_root.join("src/p64/assetTable.h");
	if codegen::write_if_changed(&asset_header_path, &asset_map_body)? {
		generated_files_changed.push(asset_header_path);
	}

	let script_table = codegen::generate_script_table(assets.entries());
	let script_table_path = project_root.join("src/p64/scriptTable.rs");
	if codegen::write_if_changed(&script_table_path, &script_table)? {
		generated_files_changed.push(script_table_path);
	}

	let conf_path = fs_root.join("conf");
	error::write(&conf_path, &conf::build_conf(&project, &assets))?;

	log::info!("build done: {} assets, {} scenes", assets.len(), project.scenes.len());

	Ok(BuildSummary {
		asset_count: assets.len(),
		scene_files,
		asset_table_path,
		conf_path,
		generated_files_changed,
	})
}

fn build_asset_if_needed(job: &AssetJob) -> Result<()> {
	if !crate::orchestrator::asset_build_needed(&job.source_path, &job.output_path) {
		return Ok(());
	}
	// The concrete converter binaries (texture/audio/font/model compressors)
	// are external collaborators outside this crate's scope; invocation is
	// left to a caller-supplied policy when one is configured for the kind.
	if let Some(tool) = job.config.flags.get("converter").and_then(|v| v.as_str()) {
		let args = vec![job.source_path.display().to_string(), job.output_path.display().to_string()];
		run_converter(tool, &args, &job.source_path)?;
	}
	if let Some(collision_source) = &job.config.collision_source {
		let source = job.source_path.parent().unwrap_or(Path::new(".")).join(collision_source);
		bake_collision_mesh(&source, &job.output_path)?;
	}
	Ok(())
}

fn register_asset(assets: &mut AssetTableBuilder, job: &AssetJob) -> asset::AssetIndex {
	let uuid = AssetUuid::for_content_path(&job.source_path.display().to_string());
	assets.add(uuid, job.config.kind.into(), job.rom_path.clone())
}

fn resolve_u16(assets: &AssetTableBuilder, uuid: u64) -> u16 {
	match assets.index_of_uuid(AssetUuid(uuid)) {
		Some(idx) => idx.serial() as u16,
		None => {
			log::error!("unresolved asset uuid {uuid:016x}, emitting sentinel");
			MISSING_ASSET_SENTINEL
		}
	}
}

fn unit_quaternion_from_raw(raw: [f32; 4]) -> UnitQuaternion<f32> {
	let [i, j, k, w] = raw;
	let len = (i * i + j * j + k * k + w * w).sqrt();
	if len < 1e-8 {
		return UnitQuaternion::IDENTITY;
	}
	UnitQuaternion::new_unchecked(Quaternion { i: i / len, j: j / len, k: k / len, w: w / len })
}

fn resolve_component(cfg: &ComponentConfig, assets: &AssetTableBuilder) -> Component {
	match cfg {
		ComponentConfig::Code { script_uuid, flags, args } => Component::Code(scene::CodeComponent {
			script_index: resolve_u16(assets, *script_uuid),
			flags: *flags,
			args: args.clone(),
		}),
		ComponentConfig::Model { asset_uuid, layer, flags, material, mesh_filter } => {
			Component::Model(scene::ModelComponent {
				asset_index: resolve_u16(assets, *asset_uuid),
				layer: *layer,
				flags: *flags,
				material: *material,
				mesh_filter: mesh_filter.clone(),
			})
		}
		ComponentConfig::Light { color, index, light_type, dir } => {
			Component::Light(scene::LightComponent { color: *color, index: *index, kind: *light_type, dir: *dir })
		}
		ComponentConfig::Camera { vp_offset, vp_size, fov, near, far } => {
			Component::Camera(scene::CameraComponent {
				vp_offset: *vp_offset,
				vp_size: *vp_size,
				fov: *fov,
				near: *near,
				far: *far,
			})
		}
		ComponentConfig::CollMesh { asset_uuid } => {
			Component::CollMesh(scene::CollMeshComponent { asset_index: resolve_u16(assets, *asset_uuid) })
		}
		ComponentConfig::CollBody { half_extent, offset, flags, mask_read, mask_write } => {
			Component::CollBody(scene::CollBodyComponent {
				half_extent: Vec3::new(half_extent[0], half_extent[1], half_extent[2]),
				offset: Vec3::new(offset[0], offset[1], offset[2]),
				flags: *flags,
				mask_read: *mask_read,
				mask_write: *mask_write,
			})
		}
		ComponentConfig::Audio2D { asset_uuid, volume_q16, flags } => {
			Component::Audio2D(scene::Audio2DComponent {
				asset_index: resolve_u16(assets, *asset_uuid),
				volume_q16: *volume_q16,
				flags: *flags,
			})
		}
	}
}

fn resolve_object(cfg: &ObjectConfig, assets: &AssetTableBuilder) -> Object {
	let mut object = Object::new(ObjectId(cfg.id));
	object.group = cfg.group;
	object.flags = cfg.flags;
	object.position = Vec3::new(cfg.position[0], cfg.position[1], cfg.position[2]);
	object.scale = Vec3::new(cfg.scale[0], cfg.scale[1], cfg.scale[2]);
	object.rotation = cfg.rotation.map(unit_quaternion_from_raw).unwrap_or(UnitQuaternion::IDENTITY);
	object.components = cfg.components.iter().map(|c| resolve_component(c, assets)).collect();
	object.children = cfg.children.iter().map(|c| resolve_object(c, assets)).collect();
	object
}

fn build_scene(
	project_root: &Path,
	fs_root: &Path,
	scene_config: &SceneConfig,
	assets: &AssetTableBuilder,
) -> Result<Vec<PathBuf>> {
	let _ = project_root;
	let mut scene = Scene::new(scene_config.fb_width, scene_config.fb_height);
	scene.flags = scene_config.flags();
	scene.clear_color = scene_config.clear_color;
	scene.objects = scene_config.objects.iter().map(|o| resolve_object(o, assets)).collect();

	let files = scene::build_scene(&scene);

	let base = format!("s{:04}", scene_config.id);
	let header_path = fs_root.join(&base);
	let objects_path = fs_root.join(format!("{base}o"));
	let strings_path = fs_root.join(format!("{base}s"));

	error::write(&header_path, &files.header)?;
	error::write(&objects_path, &files.objects)?;
	error::write(&strings_path, &files.strings)?;

	Ok(vec![header_path, objects_path, strings_path])
}

pub struct CleanArgs {
	pub code: bool,
	pub assets: bool,
	pub engine: bool,
}

impl Default for CleanArgs {
	fn default() -> Self {
		Self { code: true, assets: true, engine: true }
	}
}

/// Removes build output. `code` clears the generated `src/p64` glue,
/// `assets` clears `filesystem/p64`, `engine` is a hook for a downstream
/// Make-equivalent's own clean target (no engine build is driven here).
pub fn clean_project(project_root: &Path, args: &CleanArgs) -> Result<()> {
	if args.assets {
		let fs_root = project_root.join("filesystem").join("p64");
		if fs_root.exists() {
			std::fs::remove_dir_all(&fs_root).map_err(|source| crate::error::BuildError::Io { path: fs_root, source })?;
		}
	}
	if args.code {
		let src_root = project_root.join("src/p64");
		if src_root.exists() {
			std::fs::remove_dir_all(&src_root).map_err(|source| crate::error::BuildError::Io { path: src_root, source })?;
		}
	}
	if args.engine {
		log::debug!("engine clean is a no-op here; the downstream toolchain owns its own build artifacts");
	}
	log::info!("clean done");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use asset::AssetKind;

	#[test]
	fn resolve_u16_returns_sentinel_for_unknown_uuid() {
		let assets = AssetTableBuilder::new();
		assert_eq!(resolve_u16(&assets, 0x1234), MISSING_ASSET_SENTINEL);
	}

	#[test]
	fn resolve_u16_resolves_a_registered_uuid() {
		let mut assets = AssetTableBuilder::new();
		let idx = assets.add(AssetUuid(0x1234), AssetKind::Image, "tex/a.ia8");
		assert_eq!(resolve_u16(&assets, 0x1234), idx.serial() as u16);
	}

	#[test]
	fn unit_quaternion_from_raw_normalizes_non_unit_input() {
		let q = unit_quaternion_from_raw([0.0, 0.0, 0.0, 2.0]);
		assert!((q.w - 1.0).abs() < 1e-6);
	}

	#[test]
	fn unit_quaternion_from_raw_falls_back_to_identity_for_near_zero_input() {
		let q = unit_quaternion_from_raw([0.0, 0.0, 0.0, 0.0]);
		assert_eq!(q.w, 1.0);
	}
}
