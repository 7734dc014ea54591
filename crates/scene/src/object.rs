use math::{UnitQuaternion, Vec3};

use crate::component::Component;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u16);

/// An authoring-time or loaded scene object: a transform, an optional
/// parent, and the components attached to it. Ownership is single-parent —
/// a child appears in exactly one parent's `children`, mirroring the
/// original's tree rather than a general scene graph.
#[derive(Debug, Clone)]
pub struct Object {
	pub id: ObjectId,
	pub group: u16,
	pub flags: u16,
	pub position: Vec3,
	pub scale: Vec3,
	pub rotation: UnitQuaternion<f32>,
	pub components: Vec<Component>,
	pub children: Vec<Object>,
}

impl Object {
	pub fn new(id: ObjectId) -> Self {
		Self {
			id,
			group: 0,
			flags: 0,
			position: Vec3::ZERO,
			scale: Vec3::ONE,
			rotation: UnitQuaternion::IDENTITY,
			components: Vec::new(),
			children: Vec::new(),
		}
	}

	pub fn with_position(mut self, position: Vec3) -> Self {
		self.position = position;
		self
	}

	pub fn with_component(mut self, component: Component) -> Self {
		self.components.push(component);
		self
	}

	pub fn with_child(mut self, child: Object) -> Self {
		self.children.push(child);
		self
	}
}

/// A scene: its render/clear configuration plus the root objects of its tree.
#[derive(Debug, Clone)]
pub struct Scene {
	pub screen_width: u16,
	pub screen_height: u16,
	pub flags: u32,
	pub clear_color: [u8; 4],
	pub objects: Vec<Object>,
}

impl Scene {
	pub fn new(screen_width: u16, screen_height: u16) -> Self {
		Self { screen_width, screen_height, flags: 0, clear_color: [0, 0, 0, 255], objects: Vec::new() }
	}

	pub fn object_count(&self) -> u32 {
		fn count(objects: &[Object]) -> u32 {
			objects.iter().map(|o| 1 + count(&o.children)).sum()
		}
		count(&self.objects)
	}
}
