use binfmt::Writer;
use math::packed::pack_rotation;

use crate::object::{Object, ObjectId, Scene};

const NO_PARENT: u16 = 0xffff;

/// Output of building a scene: the three sibling binary blobs the original
/// names by the scene id (`s0001`, `s0001o`, `s0001s`). The build driver
/// decides the actual filenames; this crate only produces bytes.
pub struct SceneFiles {
	pub header: Vec<u8>,
	pub objects: Vec<u8>,
	pub strings: Vec<u8>,
}

/// Serializes `scene` into its three binary blobs.
pub fn build_scene(scene: &Scene) -> SceneFiles {
	let mut header = Writer::new();
	header.write_u16(scene.screen_width);
	header.write_u16(scene.screen_height);
	header.write_u32(scene.flags);
	header.write_bytes(&scene.clear_color);
	header.write_u32(scene.object_count());

	let mut objects = Writer::new();
	for root in &scene.objects {
		write_object_tree(&mut objects, root, NO_PARENT);
	}

	// Reserved for per-object debug names; the data model carries no name
	// field today, so the table is emitted empty rather than omitted, to
	// keep the three-file contract stable for future use.
	let mut strings = Writer::new();
	strings.write_u32(0);

	SceneFiles { header: header.into_bytes(), objects: objects.into_bytes(), strings: strings.into_bytes() }
}

fn write_object_tree(w: &mut Writer, object: &Object, parent_id: u16) {
	write_object(w, object, parent_id);
	for child in &object.children {
		write_object_tree(w, child, object.id.0);
	}
}

/// Writes one object's header and component stream. Every component record
/// is `{ kind: u8, words: u8, reserved: u16 }` followed by its payload
/// padded to a 4-byte boundary; a zero header terminates the list.
fn write_object(w: &mut Writer, object: &Object, parent_id: u16) {
	// Field order mirrors the original `ObjectEntry` (flags, id, group,
	// reserved) exactly; the original's reserved/padding slot is repurposed
	// to carry the parent id the tree structure needs, since the original
	// format has no parent pointer at all (objects are a flat, group-tagged
	// list there).
	w.write_u16(object.flags);
	w.write_u16(object.id.0);
	w.write_u16(object.group);
	w.write_u16(parent_id);
	w.write_f32(object.position.x);
	w.write_f32(object.position.y);
	w.write_f32(object.position.z);
	w.write_f32(object.scale.x);
	w.write_f32(object.scale.y);
	w.write_f32(object.scale.z);
	w.write_u32(pack_rotation(object.rotation));

	for component in &object.components {
		let header_offset = w.reserve(4);
		let payload_start = w.position();
		component.build(w);
		w.align(4);
		let words = ((w.position() - payload_start) / 4) as u8;
		w.patch_u8(header_offset, component.kind() as u8);
		w.patch_u8(header_offset + 1, words);
	}

	w.write_u32(0);
}

pub fn object_id(id: u16) -> ObjectId {
	ObjectId(id)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::{Component, CollMeshComponent};
	use math::Vec3;

	#[test]
	fn empty_scene_has_zero_objects() {
		let scene = Scene::new(320, 240);
		let files = build_scene(&scene);
		assert_eq!(files.header.len(), 2 + 2 + 4 + 4 + 4);
	}

	#[test]
	fn object_with_component_serializes_terminator() {
		let mut scene = Scene::new(320, 240);
		let obj = Object::new(ObjectId(1))
			.with_position(Vec3::new(1.0, 2.0, 3.0))
			.with_component(Component::CollMesh(CollMeshComponent { asset_index: 3 }));
		scene.objects.push(obj);

		let files = build_scene(&scene);
		// Last 4 bytes of the object stream must be the zero terminator word.
		let n = files.objects.len();
		assert_eq!(&files.objects[n - 4..], &[0, 0, 0, 0]);
	}
}
