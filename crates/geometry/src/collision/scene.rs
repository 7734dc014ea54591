use std::sync::Arc;

use math::{UnitQuaternion, Vec3};

use super::mesh::{box_vs_triangle, floor_ray_vs_triangle, sphere_vs_triangle, CollisionMesh};
use super::shapes::{Aabb, Bcs, BcsFlags, CollEvent, HitTriTypes, RaycastResult};

const MIN_PENETRATION: f32 = 4e-5;
const MAX_SUBSTEPS: u32 = 10;
const BOUNCE_DAMPING: f32 = 0.8;

/// A placement of a static [`CollisionMesh`] in the scene. Inverse rotation
/// and scale are cached and refreshed via [`MeshInstance::set_transform`],
/// since the mesh's owning object may move or rotate between ticks even
/// though the mesh data itself is immutable.
pub struct MeshInstance {
	pub mesh: Arc<CollisionMesh>,
	pub position: Vec3,
	pub rotation: UnitQuaternion<f32>,
	pub scale: Vec3,
	/// Bodies whose `mask_read` shares a bit with this are affected by it.
	pub mask: u8,
	inv_rotation: UnitQuaternion<f32>,
	inv_scale: Vec3,
}

impl MeshInstance {
	pub fn new(mesh: Arc<CollisionMesh>, position: Vec3, rotation: UnitQuaternion<f32>, scale: Vec3, mask: u8) -> Self {
		let mut instance = Self {
			mesh,
			position,
			rotation,
			scale,
			mask,
			inv_rotation: UnitQuaternion::IDENTITY,
			inv_scale: Vec3::ONE,
		};
		instance.set_transform(position, rotation, scale);
		instance
	}

	pub fn set_transform(&mut self, position: Vec3, rotation: UnitQuaternion<f32>, scale: Vec3) {
		self.position = position;
		self.rotation = rotation;
		self.scale = scale;
		self.inv_rotation = rotation.inv();
		self.inv_scale = Vec3::new(1.0 / scale.x, 1.0 / scale.y, 1.0 / scale.z);
	}

	fn to_local(&self, world: Vec3) -> Vec3 {
		(self.inv_rotation * (world - self.position)).cmul(self.inv_scale)
	}

	fn to_world(&self, local: Vec3) -> Vec3 {
		self.rotation * local.cmul(self.scale) + self.position
	}

	fn to_world_dir(&self, local: Vec3) -> Vec3 {
		self.rotation * local
	}
}

/// Contact state accumulated across every sub-step and mesh instance of a
/// single body's tick. Mirrors the original's `CollInfo`: the response
/// (floor-snap / bounce) reads this once, after sub-stepping finishes,
/// rather than reacting to each individual candidate as it's found.
#[derive(Default)]
struct ContactAccum {
	count: u32,
	/// `.y` holds the local-space normal of the last floor contact; `.x`/`.z`
	/// hold the last wall contact's normal. Not a unit vector in general —
	/// kept exactly as the original assembles it, component by component.
	floor_wall_angle: Vec3,
}

/// Registers mesh instances and dynamic bodies and resolves them each tick:
/// swept body-vs-mesh collision (sub-stepped), mask-gated dynamic-vs-dynamic
/// overlap events (no auto-resolution), and vertical floor raycasts.
#[derive(Default)]
pub struct CollisionScene {
	pub instances: Vec<MeshInstance>,
	pub bodies: Vec<Bcs>,
}

impl CollisionScene {
	pub fn new() -> Self {
		Self::default()
	}

	/// Advances every body by `dt`, resolving penetrations against static
	/// mesh instances and emitting events for dynamic-vs-dynamic overlaps.
	/// Each body's `center` (and `hit_tri_types`) is updated in place; the
	/// caller reads `center - parent_offset` back into its own transform.
	pub fn tick(&mut self, dt: f32) -> Vec<CollEvent> {
		for i in 0..self.bodies.len() {
			let mut body = self.bodies[i];
			self.step_body(&mut body, dt);
			self.bodies[i] = body;
		}

		self.pairwise_events()
	}

	fn step_body(&self, body: &mut Bcs, dt: f32) {
		body.hit_tri_types = HitTriTypes::empty();

		let speed_sq = body.velocity.length_sq();
		let steps = ((speed_sq * 0.8).round() as i32).clamp(1, MAX_SUBSTEPS as i32) as u32;
		let step_dt = dt / steps as f32;

		let mut contact = ContactAccum::default();

		for _ in 0..steps {
			body.center += body.velocity * step_dt;
			self.resolve_against_meshes(body, &mut contact);
		}

		self.apply_contact_response(body, &contact);
	}

	/// Queries every mesh instance once per call and resolves against ALL
	/// surviving BVH candidates (not just the deepest), accumulating into
	/// `contact` rather than reacting immediately. The local-space center is
	/// corrected incrementally, candidate by candidate, before being
	/// transformed back to world space once per instance.
	fn resolve_against_meshes(&self, body: &mut Bcs, contact: &mut ContactAccum) {
		for instance in &self.instances {
			if instance.mask & body.mask_read == 0 {
				continue;
			}

			let mut local_center = instance.to_local(body.center);
			// Half-extent in mesh-local units; uniform scale is assumed for
			// the cheap approximation of dividing by the largest axis.
			let scale_factor = instance.inv_scale.x.max(instance.inv_scale.y).max(instance.inv_scale.z);
			let local_radius = body.radius() * scale_factor;
			let local_he = body.half_extent.cmul(instance.inv_scale);

			let query_bound = if body.is_box() {
				Aabb::of_box(local_center, local_he)
			} else {
				Aabb::of_sphere(local_center, local_radius)
			};

			let mesh = &instance.mesh;
			let is_box = body.is_box();

			mesh.for_each_triangle_in(&query_bound, |_, tri| {
				let hit = if is_box {
					box_vs_triangle(local_center, local_he, &tri)
				} else {
					sphere_vs_triangle(local_center, local_radius, &tri)
				};

				if let Some((local_normal, pen)) = hit {
					if pen <= MIN_PENETRATION {
						return;
					}

					contact.count += 1;

					let hit_floor = local_normal.y > super::shapes::FLOOR_ANGLE;
					body.hit_tri_types |= if hit_floor { HitTriTypes::FLOOR } else { HitTriTypes::WALL };
					if hit_floor {
						contact.floor_wall_angle.y = local_normal.y;
					} else {
						contact.floor_wall_angle.x = local_normal.x;
						contact.floor_wall_angle.z = local_normal.z;
					}

					// `local_normal` points away from the surface, toward the
					// body (see `sphere_vs_triangle`/`box_vs_triangle`), so
					// resolving the overlap means moving further along it.
					local_center += local_normal * pen;
				}
			});

			body.center = instance.to_world(local_center);
		}
	}

	/// Applies the velocity response exactly once per tick, after every
	/// sub-step of [`Self::step_body`] has run, using the fully accumulated
	/// `contact` rather than reacting to each sub-step's candidates in turn.
	fn apply_contact_response(&self, body: &mut Bcs, contact: &ContactAccum) {
		if contact.count == 0 {
			return;
		}

		if body.flags.contains(BcsFlags::BOUNCY) {
			let into_surface = body.velocity.dot(contact.floor_wall_angle);
			body.velocity -= contact.floor_wall_angle * (2.0 * into_surface);
			body.velocity *= BOUNCE_DAMPING;
		} else if body.hit_tri_types.contains(HitTriTypes::FLOOR) {
			if body.velocity.y < 0.0 {
				body.velocity.y = 0.0;
			} else {
				body.hit_tri_types.remove(HitTriTypes::FLOOR);
			}
		}

		if body.flags.contains(BcsFlags::FIXED_X) {
			body.velocity.x = 0.0;
		}
		if body.flags.contains(BcsFlags::FIXED_Y) {
			body.velocity.y = 0.0;
		}
		if body.flags.contains(BcsFlags::FIXED_Z) {
			body.velocity.z = 0.0;
		}
	}

	/// Casts a ray straight down from `origin` and returns the nearest floor
	/// hit within `max_distance` across every registered mesh instance.
	pub fn raycast_floor(&self, origin: Vec3, max_distance: f32) -> Option<RaycastResult> {
		let mut best: Option<RaycastResult> = None;

		for instance in &self.instances {
			let local_origin = instance.to_local(origin);
			instance.mesh.for_each_triangle_in_column(local_origin, |_, tri| {
				if let Some(hit) = floor_ray_vs_triangle(local_origin, max_distance, &tri) {
					let world_point = instance.position + instance.rotation * tri_point_to_world(&instance, hit.point);
					let world_normal = *instance.to_world_dir(hit.normal).normalize();
					let candidate = RaycastResult { point: world_point, normal: world_normal, distance: hit.distance };
					if best.map_or(true, |b| candidate.distance < b.distance) {
						best = Some(candidate);
					}
				}
			});
		}

		best
	}

	fn pairwise_events(&self) -> Vec<CollEvent> {
		let mut events = Vec::new();

		for i in 0..self.bodies.len() {
			for j in (i + 1)..self.bodies.len() {
				let a = &self.bodies[i];
				let b = &self.bodies[j];

				if a.mask_write & b.mask_read == 0 && b.mask_write & a.mask_read == 0 {
					continue;
				}

				if bodies_overlap(a, b) {
					events.push(CollEvent { a: a.owner, b: b.owner });
				}
			}
		}

		events
	}
}

/// Scales a mesh-local point by the instance's (non-inverse) scale; used to
/// bring a raycast hit point back into the mesh's pre-scale local space
/// before rotating/translating into world space.
fn tri_point_to_world(instance: &MeshInstance, local_point: Vec3) -> Vec3 {
	local_point.cmul(instance.scale)
}

fn bodies_overlap(a: &Bcs, b: &Bcs) -> bool {
	match (a.is_box(), b.is_box()) {
		(false, false) => {
			let r = a.radius() + b.radius();
			(a.center - b.center).length_sq() <= r * r
		}
		(true, true) => a.aabb().overlaps(&b.aabb()),
		(false, true) => sphere_vs_box(a.center, a.radius(), b.center, b.half_extent),
		(true, false) => sphere_vs_box(b.center, b.radius(), a.center, a.half_extent),
	}
}

fn sphere_vs_box(sphere_center: Vec3, radius: f32, box_center: Vec3, box_he: Vec3) -> bool {
	let d = sphere_center - box_center;
	let clamped = Vec3::new(d.x.clamp(-box_he.x, box_he.x), d.y.clamp(-box_he.y, box_he.y), d.z.clamp(-box_he.z, box_he.z));
	let closest = box_center + clamped;
	(sphere_center - closest).length_sq() <= radius * radius
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::collision::mesh::CollisionMesh;

	fn flat_mesh() -> Arc<CollisionMesh> {
		let positions = vec![
			Vec3::new(-50.0, 0.0, -50.0),
			Vec3::new(50.0, 0.0, -50.0),
			Vec3::new(50.0, 0.0, 50.0),
			Vec3::new(-50.0, 0.0, 50.0),
		];
		let indices: [[u32; 3]; 2] = [[0, 1, 2], [0, 2, 3]];
		Arc::new(CollisionMesh::build(&positions, &indices, 1.0 / 256.0))
	}

	#[test]
	fn sphere_falling_onto_floor_comes_to_rest() {
		let mut scene = CollisionScene::new();
		scene.instances.push(MeshInstance::new(flat_mesh(), Vec3::ZERO, UnitQuaternion::IDENTITY, Vec3::ONE, 1));
		scene.bodies.push(Bcs {
			center: Vec3::new(0.0, 2.0, 0.0),
			half_extent: Vec3::new(0.0, 0.5, 0.0),
			velocity: Vec3::new(0.0, -5.0, 0.0),
			parent_offset: Vec3::ZERO,
			owner: 1,
			mask_read: 1,
			mask_write: 0,
			flags: BcsFlags::empty(),
			hit_tri_types: HitTriTypes::empty(),
		});

		for _ in 0..200 {
			scene.tick(1.0 / 60.0);
			if scene.bodies[0].velocity.y == 0.0 {
				break;
			}
		}

		assert_eq!(scene.bodies[0].velocity.y, 0.0);
		assert!(scene.bodies[0].hit_tri_types.contains(HitTriTypes::FLOOR));
		assert!(scene.bodies[0].center.y > -0.01);
	}

	/// A floor (`y = 0`) meeting a wall (`x = 5`) at a right angle. A body
	/// overlapping both at once exercises two independent candidates per
	/// resolve call; resolving only the single deepest one would clear
	/// whichever penetration is larger and leave the other one untouched.
	fn floor_and_wall_mesh() -> Arc<CollisionMesh> {
		let positions = vec![
			Vec3::new(-50.0, 0.0, -50.0), // 0 floor
			Vec3::new(50.0, 0.0, -50.0),  // 1
			Vec3::new(50.0, 0.0, 50.0),   // 2
			Vec3::new(-50.0, 0.0, 50.0),  // 3
			Vec3::new(5.0, 0.0, -50.0),   // 4 wall
			Vec3::new(5.0, 50.0, -50.0),  // 5
			Vec3::new(5.0, 50.0, 50.0),   // 6
			Vec3::new(5.0, 0.0, 50.0),    // 7
		];
		let indices: [[u32; 3]; 4] = [[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]];
		Arc::new(CollisionMesh::build(&positions, &indices, 1.0 / 256.0))
	}

	#[test]
	fn sphere_wedged_in_a_floor_wall_corner_clears_penetration_on_both() {
		let mut scene = CollisionScene::new();
		scene.instances.push(MeshInstance::new(floor_and_wall_mesh(), Vec3::ZERO, UnitQuaternion::IDENTITY, Vec3::ONE, 1));
		let radius = 2.0;
		scene.bodies.push(Bcs {
			center: Vec3::new(4.0, 0.3, 0.0),
			half_extent: Vec3::new(0.0, radius, 0.0),
			velocity: Vec3::ZERO,
			parent_offset: Vec3::ZERO,
			owner: 1,
			mask_read: 1,
			mask_write: 0,
			flags: BcsFlags::empty(),
			hit_tri_types: HitTriTypes::empty(),
		});

		scene.tick(1.0 / 60.0);

		let center = scene.bodies[0].center;
		let dist_to_floor = center.y;
		let dist_to_wall = 5.0 - center.x;
		assert!(dist_to_floor >= radius - 1e-3, "floor still penetrated: {dist_to_floor}");
		assert!(dist_to_wall >= radius - 1e-3, "wall still penetrated: {dist_to_wall}");
		assert!(scene.bodies[0].hit_tri_types.contains(HitTriTypes::FLOOR));
		assert!(scene.bodies[0].hit_tri_types.contains(HitTriTypes::WALL));
	}

	#[test]
	fn bouncy_body_reflects_exactly_once_per_tick_despite_many_substeps() {
		let mut scene = CollisionScene::new();
		scene.instances.push(MeshInstance::new(flat_mesh(), Vec3::ZERO, UnitQuaternion::IDENTITY, Vec3::ONE, 1));
		// A large velocity forces MAX_SUBSTEPS sub-steps within this one tick;
		// reflecting once per sub-step instead of once per tick would damp by
		// 0.8 repeatedly and reflect the velocity's sign back and forth.
		scene.bodies.push(Bcs {
			center: Vec3::new(0.0, 0.05, 0.0),
			half_extent: Vec3::new(0.0, 0.5, 0.0),
			velocity: Vec3::new(0.0, -20.0, 0.0),
			parent_offset: Vec3::ZERO,
			owner: 1,
			mask_read: 1,
			mask_write: 0,
			flags: BcsFlags::BOUNCY,
			hit_tri_types: HitTriTypes::empty(),
		});

		scene.tick(1.0 / 60.0);

		// A single reflect-and-damp turns -20 into +16; multiple reflections
		// within the same tick would instead leave the sign and magnitude
		// inconsistent with one bounce.
		assert!((scene.bodies[0].velocity.y - 16.0).abs() < 1e-3, "got {}", scene.bodies[0].velocity.y);
	}

	#[test]
	fn raycast_floor_finds_ground_below_origin() {
		let mut scene = CollisionScene::new();
		scene.instances.push(MeshInstance::new(flat_mesh(), Vec3::ZERO, UnitQuaternion::IDENTITY, Vec3::ONE, 1));

		let hit = scene.raycast_floor(Vec3::new(0.0, 10.0, 0.0), 100.0);
		assert!(hit.is_some());
		assert!((hit.unwrap().point.y).abs() < 0.1);
	}

	#[test]
	fn masked_bodies_still_emit_pairwise_events() {
		let mut scene = CollisionScene::new();
		scene.bodies.push(Bcs {
			center: Vec3::ZERO,
			half_extent: Vec3::new(0.0, 1.0, 0.0),
			velocity: Vec3::ZERO,
			parent_offset: Vec3::ZERO,
			owner: 1,
			mask_read: 0,
			mask_write: 1,
			flags: BcsFlags::empty(),
			hit_tri_types: HitTriTypes::empty(),
		});
		scene.bodies.push(Bcs {
			center: Vec3::new(0.5, 0.0, 0.0),
			half_extent: Vec3::new(0.0, 1.0, 0.0),
			velocity: Vec3::ZERO,
			parent_offset: Vec3::ZERO,
			owner: 2,
			mask_read: 1,
			mask_write: 0,
			flags: BcsFlags::empty(),
			hit_tri_types: HitTriTypes::empty(),
		});

		let events = scene.pairwise_events();
		assert_eq!(events.len(), 1);
	}
}
