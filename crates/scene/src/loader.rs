use binfmt::Reader;
use math::packed::unpack_rotation;
use math::Vec3;
use thiserror::Error;

use crate::component::{Component, ComponentKind};
use crate::object::ObjectId;

#[derive(Debug, Error)]
pub enum SceneLoadError {
	#[error(transparent)]
	Read(#[from] binfmt::ReadError),
	#[error("unknown component kind {0}")]
	UnknownComponentKind(u8),
}

#[derive(Debug, Clone)]
pub struct LoadedObject {
	pub id: ObjectId,
	pub parent_id: Option<ObjectId>,
	pub group: u16,
	pub flags: u16,
	pub position: Vec3,
	pub scale: Vec3,
	pub rotation: math::UnitQuaternion<f32>,
	pub components: Vec<Component>,
}

#[derive(Debug, Clone)]
pub struct LoadedScene {
	pub screen_width: u16,
	pub screen_height: u16,
	pub flags: u32,
	pub clear_color: [u8; 4],
	pub objects: Vec<LoadedObject>,
}

/// Parses the scene header and object stream produced by
/// [`crate::writer::build_scene`]. Scans the object stream once to count
/// objects up front (so the result vector is allocated exactly once,
/// echoing the allocate-then-construct shape of the original loader) and
/// again to actually build each [`LoadedObject`].
pub fn load_scene(header_data: &[u8], object_data: &[u8]) -> Result<LoadedScene, SceneLoadError> {
	let mut header = Reader::new(header_data);
	let screen_width = header.read_u16()?;
	let screen_height = header.read_u16()?;
	let flags = header.read_u32()?;
	let clear_color = [header.read_u8()?, header.read_u8()?, header.read_u8()?, header.read_u8()?];
	let object_count = header.read_u32()? as usize;

	let object_count_scanned = scan_object_count(object_data)?;
	debug_assert_eq!(object_count, object_count_scanned);

	let mut objects = Vec::with_capacity(object_count_scanned);
	let mut r = Reader::new(object_data);
	for _ in 0..object_count_scanned {
		objects.push(read_object(&mut r)?);
	}

	Ok(LoadedScene { screen_width, screen_height, flags, clear_color, objects })
}

fn scan_object_count(object_data: &[u8]) -> Result<usize, SceneLoadError> {
	let mut r = Reader::new(object_data);
	let mut count = 0;
	while r.remaining() > 0 {
		skip_object(&mut r)?;
		count += 1;
	}
	Ok(count)
}

fn skip_object(r: &mut Reader) -> Result<(), SceneLoadError> {
	r.read_u16()?; // flags
	r.read_u16()?; // id
	r.read_u16()?; // group
	r.read_u16()?; // parent id (the original's reserved/padding slot)
	for _ in 0..7 {
		r.read_u32()?; // pos(3) + scale(3) + packed rotation(1), all 4 bytes wide
	}
	loop {
		let kind = r.read_u8()?;
		let words = r.read_u8()?;
		r.read_u16()?; // reserved
		if kind == 0 && words == 0 {
			break;
		}
		r.read_bytes(words as usize * 4)?;
	}
	Ok(())
}

fn read_object(r: &mut Reader) -> Result<LoadedObject, SceneLoadError> {
	// Field order mirrors the original `ObjectEntry` (flags, id, group,
	// reserved); the reserved slot is repurposed to carry the parent id.
	let flags = r.read_u16()?;
	let id = ObjectId(r.read_u16()?);
	let group = r.read_u16()?;
	let parent_raw = r.read_u16()?;
	let parent_id = if parent_raw == 0xffff { None } else { Some(ObjectId(parent_raw)) };
	let position = Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?);
	let scale = Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?);
	let rotation = unpack_rotation(r.read_u32()?);

	let mut components = Vec::new();
	loop {
		let kind_byte = r.read_u8()?;
		let words = r.read_u8()?;
		r.read_u16()?; // reserved
		if kind_byte == 0 && words == 0 {
			break;
		}
		let kind = ComponentKind::from_u8(kind_byte).ok_or(SceneLoadError::UnknownComponentKind(kind_byte))?;
		let payload = r.read_bytes(words as usize * 4)?;
		components.push(Component::parse(kind, payload)?);
	}

	Ok(LoadedObject { id, parent_id, group, flags, position, scale, rotation, components })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::{CollMeshComponent, Component};
	use crate::object::{Object, ObjectId as OId, Scene};
	use crate::writer::build_scene;
	use math::Vec3;

	#[test]
	fn round_trips_a_simple_scene() {
		let mut scene = Scene::new(320, 240);
		let obj = Object::new(OId(1))
			.with_position(Vec3::new(1.0, 2.0, 3.0))
			.with_component(Component::CollMesh(CollMeshComponent { asset_index: 5 }));
		scene.objects.push(obj);

		let files = build_scene(&scene);
		let loaded = load_scene(&files.header, &files.objects).unwrap();

		assert_eq!(loaded.screen_width, 320);
		assert_eq!(loaded.objects.len(), 1);
		assert_eq!(loaded.objects[0].id, ObjectId(1));
		assert!((loaded.objects[0].position.x - 1.0).abs() < 1e-6);
		assert_eq!(loaded.objects[0].components.len(), 1);
	}

	#[test]
	fn parent_child_relationship_survives_round_trip() {
		let mut scene = Scene::new(320, 240);
		let child = Object::new(OId(2)).with_position(Vec3::ZERO);
		let parent = Object::new(OId(1)).with_child(child);
		scene.objects.push(parent);

		let files = build_scene(&scene);
		let loaded = load_scene(&files.header, &files.objects).unwrap();

		assert_eq!(loaded.objects.len(), 2);
		assert_eq!(loaded.objects[0].parent_id, None);
		assert_eq!(loaded.objects[1].parent_id, Some(ObjectId(1)));
	}
}
