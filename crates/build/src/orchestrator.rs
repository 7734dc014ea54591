use std::path::{Path, PathBuf};

use crate::config::AssetConfig;
use crate::error::{BuildError, Result};

/// Rebuild-skip rule for externally-converted assets (component F): a
/// missing output always needs a build; otherwise rebuild only when the
/// source is at least as new as the existing output.
pub fn asset_build_needed(source: &Path, output: &Path) -> bool {
	let Ok(src_mtime) = std::fs::metadata(source).and_then(|m| m.modified()) else {
		return true;
	};
	match std::fs::metadata(output).and_then(|m| m.modified()) {
		Ok(dst_mtime) => src_mtime >= dst_mtime,
		Err(_) => true,
	}
}

/// Invokes an external converter (texture/audio/font/model compressor) for
/// one asset. The orchestrator itself is a pure policy component: it does
/// not know how to convert any particular kind, only when to, and it
/// reports non-zero exits as fatal for that asset's kind (spec §7).
pub fn run_converter(tool: &str, args: &[String], asset_path: &Path) -> Result<()> {
	log::info!("building asset: {}", asset_path.display());
	let status = std::process::Command::new(tool)
		.args(args)
		.status()
		.map_err(|source| BuildError::Io { path: asset_path.to_path_buf(), source })?;
	if !status.success() {
		return Err(BuildError::ConverterFailed { path: asset_path.to_path_buf(), status: status.code().unwrap_or(-1) });
	}
	Ok(())
}

/// One non-excluded asset as the orchestrator sees it: where to read it
/// from, where its converted output should land, and the rom-path the
/// asset table will record for it.
pub struct AssetJob {
	pub config: AssetConfig,
	pub source_path: PathBuf,
	pub output_path: PathBuf,
	pub rom_path: String,
}

/// Bakes a converter-emitted intermediate mesh (the little-endian
/// triangle-soup format `geometry::io::load_mesh` reads) into the
/// collision-mesh chunk spec §4.I/§6 describes as embedded in a model
/// asset. The external model converter owns the rest of that asset's
/// bytes, which is out of scope here, so the chunk is written to a sibling
/// `.coll` file next to the converted output instead of spliced in place.
pub fn bake_collision_mesh(source: &Path, output: &Path) -> Result<()> {
	let mesh = geometry::io::load_mesh(&source.display().to_string());
	let indices: Vec<[u32; 3]> =
		mesh.indices.chunks_exact(3).map(|c| [c[0] as u32, c[1] as u32, c[2] as u32]).collect();
	let coll_mesh = geometry::collision::mesh::CollisionMesh::from_mesh(&mesh, &indices);

	let mut w = binfmt::Writer::new();
	coll_mesh.write_to(&mut w);

	let coll_path = output.with_extension("coll");
	crate::error::write(&coll_path, &w.into_bytes())
}

/// Resolves a project's asset manifest into build jobs in a stable order
/// (declaration order in `project.json`, itself normally authored in
/// path order), skipping excluded entries.
pub fn plan_asset_jobs(project_root: &Path, assets: &[AssetConfig]) -> Vec<AssetJob> {
	assets
		.iter()
		.filter(|a| !a.exclude)
		.map(|a| {
			let source_path = project_root.join("assets").join(&a.path);
			let rom_path = a.path.replace('\\', "/");
			let output_path = project_root.join("filesystem").join(&rom_path);
			AssetJob { config: a.clone(), source_path, output_path, rom_path }
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::AssetKindConfig;
	use std::time::Duration;

	fn scratch_dir(name: &str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!("p64-orchestrator-test-{name}-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		dir
	}

	#[test]
	fn rebuild_needed_when_output_missing() {
		let dir = scratch_dir("missing-output");
		let source = dir.join("a.png");
		std::fs::write(&source, b"x").unwrap();
		assert!(asset_build_needed(&source, &dir.join("a.out")));
		std::fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn rebuild_skipped_when_output_newer_than_source() {
		let dir = scratch_dir("fresh-output");
		let source = dir.join("a.png");
		let output = dir.join("a.out");
		std::fs::write(&source, b"x").unwrap();
		std::thread::sleep(Duration::from_millis(10));
		std::fs::write(&output, b"y").unwrap();
		assert!(!asset_build_needed(&source, &output));
		std::fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn excluded_assets_are_not_planned() {
		let assets = vec![
			AssetConfig {
				path: "tex/a.png".into(),
				kind: AssetKindConfig::Image,
				exclude: true,
				flags: serde_json::Value::Null,
				collision_source: None,
			},
			AssetConfig {
				path: "tex/b.png".into(),
				kind: AssetKindConfig::Image,
				exclude: false,
				flags: serde_json::Value::Null,
				collision_source: None,
			},
		];
		let jobs = plan_asset_jobs(Path::new("/proj"), &assets);
		assert_eq!(jobs.len(), 1);
		assert_eq!(jobs[0].rom_path, "tex/b.png");
	}

	fn write_little_endian_triangle_mesh(path: &Path) {
		let mut bytes = Vec::new();
		bytes.extend_from_slice(&3u32.to_le_bytes()); // vertex_count
		bytes.extend_from_slice(&1u32.to_le_bytes()); // index_count
		let verts = [[-1.0f32, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 0.0, 1.0]];
		for p in verts {
			for c in p {
				bytes.extend_from_slice(&c.to_le_bytes());
			}
			for c in [0.0f32, 1.0, 0.0] {
				bytes.extend_from_slice(&c.to_le_bytes());
			}
		}
		for i in [0u32, 1, 2] {
			bytes.extend_from_slice(&i.to_le_bytes());
		}
		bytes.extend_from_slice(&0u32.to_le_bytes()); // vertex_group_count
		std::fs::write(path, bytes).unwrap();
	}

	#[test]
	fn bake_collision_mesh_writes_a_sibling_coll_file() {
		let dir = scratch_dir("bake-coll");
		let source = dir.join("floor.mesh");
		write_little_endian_triangle_mesh(&source);
		let output = dir.join("floor.t3dm");

		bake_collision_mesh(&source, &output).unwrap();

		let coll_path = output.with_extension("coll");
		let contents = std::fs::read(&coll_path).unwrap();
		assert!(!contents.is_empty());
		std::fs::remove_dir_all(&dir).ok();
	}
}
