use math::Vec3;

/// Axis-aligned bounding box, used both as the BVH's node bound and as the
/// broad-phase bound of a dynamic shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
	pub min: Vec3,
	pub max: Vec3,
}

impl Aabb {
	pub fn empty() -> Aabb {
		Aabb { min: Vec3::splat(f32::MAX), max: Vec3::splat(f32::MIN) }
	}

	pub fn from_points(points: &[Vec3]) -> Aabb {
		let mut aabb = Aabb::empty();
		for &p in points {
			aabb.grow(p);
		}
		aabb
	}

	pub fn grow(&mut self, p: Vec3) {
		for i in 0..3 {
			self.min[i] = self.min[i].min(p[i]);
			self.max[i] = self.max[i].max(p[i]);
		}
	}

	pub fn union(&self, other: &Aabb) -> Aabb {
		let mut r = *self;
		r.grow(other.min);
		r.grow(other.max);
		r
	}

	pub fn center(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}

	pub fn overlaps(&self, other: &Aabb) -> bool {
		for i in 0..3 {
			if self.min[i] > other.max[i] || self.max[i] < other.min[i] {
				return false;
			}
		}
		true
	}

	/// Bound of a sphere of `radius` centered at `center`.
	pub fn of_sphere(center: Vec3, radius: f32) -> Aabb {
		Aabb { min: center - Vec3::splat(radius), max: center + Vec3::splat(radius) }
	}

	/// Bound of an axis-aligned box, `half_extent` per axis, centered at `center`.
	pub fn of_box(center: Vec3, half_extent: Vec3) -> Aabb {
		Aabb { min: center - half_extent, max: center + half_extent }
	}

	/// Expands the box by `amount` on every axis; used to turn a mesh-node
	/// bound into the bound that must be tested against a moving sphere
	/// (Minkowski sum of the node with the sphere).
	pub fn expanded(&self, amount: Vec3) -> Aabb {
		Aabb { min: self.min - amount, max: self.max + amount }
	}

	pub fn contains_point_xz(&self, p: Vec3) -> bool {
		p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
	}
}

bitflags::bitflags! {
	/// Behavior flags for a dynamic collision body (BCS).
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct BcsFlags: u8 {
		/// Shape is a box (half-extent per axis) rather than a sphere (half_extent.y is the radius).
		const BOX      = 1 << 0;
		/// Generates collision events without blocking motion.
		const TRIGGER  = 1 << 1;
		/// Reflects velocity off the mesh instead of sliding to a stop.
		const BOUNCY   = 1 << 2;
		const FIXED_X  = 1 << 3;
		const FIXED_Y  = 1 << 4;
		const FIXED_Z  = 1 << 5;
	}
}

bitflags::bitflags! {
	/// Classification of the surface a BCS last touched, reported back to
	/// gameplay code after a tick.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct HitTriTypes: u8 {
		const FLOOR = 1 << 0;
		const WALL  = 1 << 1;
	}
}

/// A dynamic collision body: a sphere or box that moves under its own
/// velocity and is resolved against static meshes and other bodies each
/// tick. `owner` is an opaque handle the caller assigns (typically a scene
/// object id); this crate never looks inside it.
#[derive(Debug, Clone, Copy)]
pub struct Bcs {
	pub center: Vec3,
	/// Box: half-extent per axis. Sphere: radius stored in `.y`, x/z unused.
	pub half_extent: Vec3,
	pub velocity: Vec3,
	/// Offset from the owning object's position to `center`, preserved across
	/// ticks so the object's transform can be written back from `center`.
	pub parent_offset: Vec3,
	pub owner: u32,
	pub mask_read: u8,
	pub mask_write: u8,
	pub flags: BcsFlags,
	pub hit_tri_types: HitTriTypes,
}

impl Bcs {
	pub fn radius(&self) -> f32 {
		self.half_extent.y
	}

	pub fn is_box(&self) -> bool {
		self.flags.contains(BcsFlags::BOX)
	}

	pub fn aabb(&self) -> Aabb {
		if self.is_box() {
			Aabb::of_box(self.center, self.half_extent)
		} else {
			Aabb::of_sphere(self.center, self.radius())
		}
	}
}

/// Result of a shape-vs-triangle penetration test: the minimum translation
/// that would separate the shape from the triangle.
#[derive(Debug, Clone, Copy)]
pub struct CollInfo {
	pub normal: Vec3,
	pub penetration: f32,
}

/// Result of a vertical ray cast against the floor.
#[derive(Debug, Clone, Copy)]
pub struct RaycastResult {
	pub point: Vec3,
	pub normal: Vec3,
	pub distance: f32,
}

/// Emitted when two dynamic bodies' masks agree they should notice each
/// other. No automatic resolution happens; gameplay code decides what to do.
#[derive(Debug, Clone, Copy)]
pub struct CollEvent {
	pub a: u32,
	pub b: u32,
}

/// A single triangle in object space, with its face normal precomputed.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
	pub v0: Vec3,
	pub v1: Vec3,
	pub v2: Vec3,
	pub normal: Vec3,
}

/// Cosine of the maximum slope angle still classified as walkable floor.
pub const FLOOR_ANGLE: f32 = 0.7;

impl Triangle {
	pub fn is_floor(&self) -> bool {
		self.normal.y > FLOOR_ANGLE
	}

	pub fn aabb(&self) -> Aabb {
		Aabb::from_points(&[self.v0, self.v1, self.v2])
	}
}
