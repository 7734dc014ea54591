use math::packed::{dequantize_normal, dequantize_position, quantize_normal, quantize_position};
use math::Vec3;

use super::bvh::Bvh;
use super::shapes::{Aabb, RaycastResult, Triangle};
use crate::mesh::Mesh;

/// A static triangle mesh used for collision, quantized to `i16` per
/// component to keep the resident data small; `coll_scale` converts a
/// quantized vertex back to object-space units.
pub struct CollisionMesh {
	pub coll_scale: f32,
	verts: Vec<[i16; 3]>,
	normals: Vec<[i16; 3]>,
	indices: Vec<[u16; 3]>,
	bvh: Bvh,
}

impl CollisionMesh {
	/// Builds a collision mesh from an authoring-time triangle soup (object
	/// space, `f32`). `coll_scale` should be chosen so the mesh's extent fits
	/// `i16` after dividing by it; callers typically derive it from the
	/// mesh's bounding box.
	pub fn build(positions: &[Vec3], indices: &[[u32; 3]], coll_scale: f32) -> CollisionMesh {
		let inv_scale = 1.0 / coll_scale;
		let verts: Vec<[i16; 3]> = positions.iter().map(|&p| quantize_position(p, inv_scale)).collect();

		let mut tri_indices = Vec::with_capacity(indices.len());
		let mut normals = Vec::with_capacity(indices.len());
		let mut tri_aabbs = Vec::with_capacity(indices.len());

		for &[a, b, c] in indices {
			let pa = positions[a as usize];
			let pb = positions[b as usize];
			let pc = positions[c as usize];
			let normal = *(pb - pa).cross(pc - pa).normalize();

			tri_indices.push([a as u16, b as u16, c as u16]);
			normals.push(quantize_normal(normal));
			tri_aabbs.push(Aabb::from_points(&[pa, pb, pc]));
		}

		let bvh = Bvh::build(&tri_aabbs);

		CollisionMesh { coll_scale, verts, normals, indices: tri_indices, bvh }
	}

	/// Builds a collision mesh from an authoring-time [`Mesh`] (as read by
	/// [`crate::io::load_mesh`]), choosing `coll_scale` from the mesh's own
	/// bounding box so its extent just fits the `i16` quantization range.
	pub fn from_mesh(mesh: &Mesh, indices: &[[u32; 3]]) -> CollisionMesh {
		let positions: Vec<Vec3> = mesh.vertices.iter().map(|v| v.p).collect();
		let bounds = positions.iter().fold(Aabb::empty(), |mut acc, &p| {
			acc.grow(p);
			acc
		});
		let extent = bounds.max - bounds.min;
		let max_extent = extent.x.max(extent.y).max(extent.z).max(1e-6);
		let coll_scale = max_extent / i16::MAX as f32;

		CollisionMesh::build(&positions, indices, coll_scale)
	}

	/// Serializes this mesh as the collision-mesh chunk embedded in a model
	/// asset: `tri-count, vert-count, coll-scale, indices, normals, verts`,
	/// followed by the BVH's flattened node array and triangle-index
	/// permutation. Field order matches the runtime loader's fixed offsets.
	pub fn write_to(&self, w: &mut binfmt::Writer) {
		w.write_u32(self.tri_count() as u32);
		w.write_u32(self.vert_count() as u32);
		w.write_f32(self.coll_scale);

		for [a, b, c] in &self.indices {
			w.write_u16(*a);
			w.write_u16(*b);
			w.write_u16(*c);
		}
		for n in &self.normals {
			w.write_i16(n[0]);
			w.write_i16(n[1]);
			w.write_i16(n[2]);
		}
		for v in &self.verts {
			w.write_i16(v[0]);
			w.write_i16(v[1]);
			w.write_i16(v[2]);
		}

		w.write_u32(self.bvh.nodes.len() as u32);
		for node in &self.bvh.nodes {
			w.write_f32(node.aabb.min.x);
			w.write_f32(node.aabb.min.y);
			w.write_f32(node.aabb.min.z);
			w.write_f32(node.aabb.max.x);
			w.write_f32(node.aabb.max.y);
			w.write_f32(node.aabb.max.z);
			w.write_u32(node.start);
			w.write_u32(node.count);
			w.write_u32(node.right);
		}
		for &tri in &self.bvh.tri_indices {
			w.write_u32(tri);
		}
	}

	pub fn tri_count(&self) -> usize {
		self.indices.len()
	}

	pub fn vert_count(&self) -> usize {
		self.verts.len()
	}

	pub fn vertex(&self, i: usize) -> Vec3 {
		dequantize_position(self.verts[i], self.coll_scale)
	}

	pub fn triangle(&self, tri: usize) -> Triangle {
		let [a, b, c] = self.indices[tri];
		let v0 = self.vertex(a as usize);
		let v1 = self.vertex(b as usize);
		let v2 = self.vertex(c as usize);
		let normal = dequantize_normal(self.normals[tri]);
		Triangle { v0, v1, v2, normal }
	}

	pub fn bvh(&self) -> &Bvh {
		&self.bvh
	}

	pub fn for_each_triangle_in(&self, bound: &Aabb, mut visit: impl FnMut(usize, Triangle)) {
		self.bvh.query_aabb(bound, |tri| visit(tri as usize, self.triangle(tri as usize)));
	}

	pub fn for_each_triangle_in_column(&self, xz: Vec3, mut visit: impl FnMut(usize, Triangle)) {
		self.bvh.query_column(xz, |tri| visit(tri as usize, self.triangle(tri as usize)));
	}
}

/// Closest point on triangle `tri` to `p`, by clamped-barycentric projection
/// with an edge fallback when the projection falls outside the triangle.
pub fn closest_point_on_triangle(p: Vec3, tri: &Triangle) -> Vec3 {
	let (a, b, c) = (tri.v0, tri.v1, tri.v2);
	let ab = b - a;
	let ac = c - a;
	let ap = p - a;

	let d1 = ab.dot(ap);
	let d2 = ac.dot(ap);
	if d1 <= 0.0 && d2 <= 0.0 {
		return a;
	}

	let bp = p - b;
	let d3 = ab.dot(bp);
	let d4 = ac.dot(bp);
	if d3 >= 0.0 && d4 <= d3 {
		return b;
	}

	let vc = d1 * d4 - d3 * d2;
	if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
		let v = d1 / (d1 - d3);
		return a + ab * v;
	}

	let cp = p - c;
	let d5 = ab.dot(cp);
	let d6 = ac.dot(cp);
	if d6 >= 0.0 && d5 <= d6 {
		return c;
	}

	let vb = d5 * d2 - d1 * d6;
	if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
		let w = d2 / (d2 - d6);
		return a + ac * w;
	}

	let va = d3 * d6 - d5 * d4;
	if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
		let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
		return b + (c - b) * w;
	}

	let denom = 1.0 / (va + vb + vc);
	let v = vb * denom;
	let w = vc * denom;
	a + ab * v + ac * w
}

/// Sphere-vs-triangle overlap test, returning the separation axis and
/// penetration depth if the sphere at `center` with `radius` overlaps `tri`.
pub fn sphere_vs_triangle(center: Vec3, radius: f32, tri: &Triangle) -> Option<(Vec3, f32)> {
	let closest = closest_point_on_triangle(center, tri);
	let delta = center - closest;
	let dist_sq = delta.length_sq();
	if dist_sq >= radius * radius {
		return None;
	}

	let dist = dist_sq.sqrt();
	let normal = if dist > 1e-6 { delta * (1.0 / dist) } else { tri.normal };
	Some((normal, radius - dist))
}

/// Axis-aligned box (half-extent `he`, centered at `center`) vs triangle,
/// via the separating axis theorem over the box's 3 face normals, the
/// triangle's face normal, and the 9 edge cross products.
pub fn box_vs_triangle(center: Vec3, he: Vec3, tri: &Triangle) -> Option<(Vec3, f32)> {
	let verts = [tri.v0 - center, tri.v1 - center, tri.v2 - center];
	let edges = [verts[1] - verts[0], verts[2] - verts[1], verts[0] - verts[2]];

	let box_axes = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)];

	let mut best_axis = Vec3::ZERO;
	let mut best_overlap = f32::MAX;

	let mut test_axis = |axis: Vec3| -> bool {
		let len_sq = axis.length_sq();
		if len_sq < 1e-10 {
			return true;
		}
		let axis = axis * (1.0 / len_sq.sqrt());

		let box_radius = he.x * axis.x.abs() + he.y * axis.y.abs() + he.z * axis.z.abs();
		let projections = [verts[0].dot(axis), verts[1].dot(axis), verts[2].dot(axis)];
		let tri_min = projections[0].min(projections[1]).min(projections[2]);
		let tri_max = projections[0].max(projections[1]).max(projections[2]);

		if tri_min > box_radius || tri_max < -box_radius {
			return false;
		}

		// Overlap of [tri_min, tri_max] with [-box_radius, box_radius].
		let overlap = box_radius.min(tri_max) - (-box_radius).max(tri_min);
		if overlap < best_overlap {
			best_overlap = overlap;
			best_axis = if (tri_min + tri_max) * 0.5 < 0.0 { -axis } else { axis };
		}

		true
	};

	for &axis in &box_axes {
		if !test_axis(axis) {
			return None;
		}
	}
	if !test_axis(tri.normal) {
		return None;
	}
	for &box_axis in &box_axes {
		for &edge in &edges {
			if !test_axis(box_axis.cross(edge)) {
				return None;
			}
		}
	}

	Some((best_axis, best_overlap.max(0.0)))
}

/// Vertical ray cast downward from `origin` against `tri`, for floor
/// detection. Only considers triangles facing upward enough to count as
/// floor (`tri.is_floor()`).
pub fn floor_ray_vs_triangle(origin: Vec3, max_distance: f32, tri: &Triangle) -> Option<RaycastResult> {
	if !tri.is_floor() {
		return None;
	}

	// Plane: normal . (p - v0) = 0, ray: p = origin + t * (0, -1, 0).
	if tri.normal.y.abs() < 1e-8 {
		return None;
	}
	let t = (tri.v0 - origin).dot(tri.normal) / Vec3::new(0.0, -1.0, 0.0).dot(tri.normal);
	if t < 0.0 || t > max_distance {
		return None;
	}

	let point = origin + Vec3::new(0.0, -1.0, 0.0) * t;

	// Barycentric containment check in the XZ-projected triangle.
	if !point_in_triangle_xz(point, tri) {
		return None;
	}

	Some(RaycastResult { point, normal: tri.normal, distance: t })
}

fn point_in_triangle_xz(p: Vec3, tri: &Triangle) -> bool {
	let sign = |a: Vec3, b: Vec3, c: Vec3| (c.x - a.x) * (b.z - a.z) - (b.x - a.x) * (c.z - a.z);

	let d1 = sign(p, tri.v0, tri.v1);
	let d2 = sign(p, tri.v1, tri.v2);
	let d3 = sign(p, tri.v2, tri.v0);

	let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
	let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

	!(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn flat_floor_tri() -> Triangle {
		Triangle {
			v0: Vec3::new(-10.0, 0.0, -10.0),
			v1: Vec3::new(10.0, 0.0, -10.0),
			v2: Vec3::new(0.0, 0.0, 10.0),
			normal: Vec3::new(0.0, 1.0, 0.0),
		}
	}

	#[test]
	fn sphere_resting_on_floor_is_detected() {
		let tri = flat_floor_tri();
		let hit = sphere_vs_triangle(Vec3::new(0.0, 0.4, 0.0), 0.5, &tri);
		assert!(hit.is_some());
		let (normal, pen) = hit.unwrap();
		assert!(normal.y > 0.9);
		assert!(pen > 0.0 && pen < 0.2);
	}

	#[test]
	fn sphere_far_above_floor_does_not_collide() {
		let tri = flat_floor_tri();
		assert!(sphere_vs_triangle(Vec3::new(0.0, 5.0, 0.0), 0.5, &tri).is_none());
	}

	#[test]
	fn floor_raycast_hits_directly_below() {
		let tri = flat_floor_tri();
		let hit = floor_ray_vs_triangle(Vec3::new(0.0, 5.0, 0.0), 100.0, &tri);
		assert!(hit.is_some());
		assert!((hit.unwrap().distance - 5.0).abs() < 1e-4);
	}

	#[test]
	fn floor_raycast_misses_outside_triangle() {
		let tri = flat_floor_tri();
		assert!(floor_ray_vs_triangle(Vec3::new(50.0, 5.0, 50.0), 100.0, &tri).is_none());
	}

	#[test]
	fn box_resting_on_floor_is_detected() {
		let tri = flat_floor_tri();
		let hit = box_vs_triangle(Vec3::new(0.0, 0.4, 0.0), Vec3::splat(0.5), &tri);
		assert!(hit.is_some());
	}

	#[test]
	fn box_far_above_floor_does_not_collide() {
		let tri = flat_floor_tri();
		assert!(box_vs_triangle(Vec3::new(0.0, 5.0, 0.0), Vec3::splat(0.5), &tri).is_none());
	}

	#[test]
	fn from_mesh_bakes_a_queryable_collision_mesh() {
		let mut builder = crate::mesh::MeshBuilder::new();
		let a = builder.add_vertex([-1.0, 0.0, -1.0]);
		let b = builder.add_vertex([1.0, 0.0, -1.0]);
		let c = builder.add_vertex([0.0, 0.0, 1.0]);
		builder.add_triangle(a, b, c);
		let mesh = builder.build();

		let indices = vec![[a as u32, b as u32, c as u32]];
		let coll_mesh = CollisionMesh::from_mesh(&mesh, &indices);

		assert_eq!(coll_mesh.tri_count(), 1);
		assert_eq!(coll_mesh.vert_count(), 3);

		let mut w = binfmt::Writer::new();
		coll_mesh.write_to(&mut w);
		let bytes = w.into_bytes();
		assert!(!bytes.is_empty());

		let tri = coll_mesh.triangle(0);
		assert!(sphere_vs_triangle(Vec3::new(0.0, 0.1, 0.0), 0.5, &tri).is_some());
	}
}
