use super::shapes::Aabb;
use math::Vec3;

const LEAF_SIZE: usize = 4;

/// Cap on the number of candidates a single [`Bvh::query_aabb`] call will
/// hand to `visit`. The original engine's BVH query fills a fixed-size
/// result buffer of this size and logs an error rather than overflow it; no
/// header defining the exact constant survived into the source pack, so this
/// is a reasonable concrete choice for a 64-triangle-leaf-sized buffer.
pub const MAX_RESULT_COUNT: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct BvhNode {
	pub aabb: Aabb,
	/// First triangle index (into `Bvh::tri_indices`) if this is a leaf.
	pub start: u32,
	/// Number of triangles if this is a leaf, zero if internal.
	pub count: u32,
	/// Index of the right child if this is an internal node. The left child
	/// is always `self_index + 1`.
	pub right: u32,
}

impl BvhNode {
	pub fn is_leaf(&self) -> bool {
		self.count > 0
	}
}

/// A static, array-backed bounding volume hierarchy built once offline from
/// a mesh's triangle soup (median split on centroids) and queried read-only
/// at runtime.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
	pub nodes: Vec<BvhNode>,
	/// Triangle indices permuted into leaf-contiguous order.
	pub tri_indices: Vec<u32>,
}

struct BuildItem {
	tri_index: u32,
	centroid: Vec3,
	aabb: Aabb,
}

impl Bvh {
	pub fn build(tri_aabbs: &[Aabb]) -> Bvh {
		if tri_aabbs.is_empty() {
			return Bvh::default();
		}

		let mut items: Vec<BuildItem> = tri_aabbs
			.iter()
			.enumerate()
			.map(|(i, aabb)| BuildItem { tri_index: i as u32, centroid: aabb.center(), aabb: *aabb })
			.collect();

		let mut nodes = Vec::new();
		build_recursive(&mut items, &mut nodes);
		fixup_leaf_starts(&mut nodes);

		let tri_indices = items.iter().map(|i| i.tri_index).collect();

		Bvh { nodes, tri_indices }
	}

	/// Calls `visit` with the range of `tri_indices` entries overlapping
	/// `bound`. Callers index into their own triangle array via
	/// `tri_indices[i]`.
	///
	/// Bounded by [`MAX_RESULT_COUNT`]: once that many candidates have been
	/// handed to `visit`, the traversal stops early and logs an error rather
	/// than growing an unbounded result set. Candidates collected before the
	/// cap was hit are still valid and the caller proceeds with them.
	pub fn query_aabb(&self, bound: &Aabb, mut visit: impl FnMut(u32)) {
		if self.nodes.is_empty() {
			return;
		}
		let mut count = 0usize;
		self.query_node(0, bound, &mut visit, &mut count);
	}

	fn query_node(&self, node_index: u32, bound: &Aabb, visit: &mut impl FnMut(u32), count: &mut usize) {
		if *count >= MAX_RESULT_COUNT - 1 {
			return;
		}

		let node = &self.nodes[node_index as usize];
		if !node.aabb.overlaps(bound) {
			return;
		}

		if node.is_leaf() {
			for i in node.start..node.start + node.count {
				if *count >= MAX_RESULT_COUNT - 1 {
					log::error!("BVH result count exceeded max limit ({MAX_RESULT_COUNT})");
					return;
				}
				visit(self.tri_indices[i as usize]);
				*count += 1;
			}
		} else {
			self.query_node(node_index + 1, bound, visit, count);
			self.query_node(node.right, bound, visit, count);
		}
	}

	/// Calls `visit` with triangle indices whose XZ footprint contains `xz`,
	/// for the vertical floor raycast.
	pub fn query_column(&self, xz: Vec3, mut visit: impl FnMut(u32)) {
		if self.nodes.is_empty() {
			return;
		}
		self.query_column_node(0, xz, &mut visit);
	}

	fn query_column_node(&self, node_index: u32, xz: Vec3, visit: &mut impl FnMut(u32)) {
		let node = &self.nodes[node_index as usize];
		if !node.aabb.contains_point_xz(xz) {
			return;
		}

		if node.is_leaf() {
			for i in node.start..node.start + node.count {
				visit(self.tri_indices[i as usize]);
			}
		} else {
			self.query_column_node(node_index + 1, xz, visit);
			self.query_column_node(node.right, xz, visit);
		}
	}
}

fn build_recursive(items: &mut [BuildItem], nodes: &mut Vec<BvhNode>) -> u32 {
	let bounds = items.iter().fold(Aabb::empty(), |acc, it| acc.union(&it.aabb));
	let node_index = nodes.len() as u32;
	nodes.push(BvhNode { aabb: bounds, start: 0, count: 0, right: 0 });

	if items.len() <= LEAF_SIZE {
		// start is relative to this slice; fixup_leaf_starts rewrites it to an
		// absolute offset once the final item order is known.
		nodes[node_index as usize].count = items.len() as u32;
		return node_index;
	}

	let centroid_bounds = items.iter().fold(Aabb::empty(), |mut acc, it| {
		acc.grow(it.centroid);
		acc
	});
	let extent = centroid_bounds.max - centroid_bounds.min;
	let axis = if extent.x > extent.y && extent.x > extent.z {
		0
	} else if extent.y > extent.z {
		1
	} else {
		2
	};

	let mid = items.len() / 2;
	items.select_nth_unstable_by(mid, |a, b| a.centroid[axis].partial_cmp(&b.centroid[axis]).unwrap());

	let (left, right) = items.split_at_mut(mid);
	let left_index = build_recursive(left, nodes);
	debug_assert_eq!(left_index, node_index + 1);
	let right_index = build_recursive(right, nodes);

	nodes[node_index as usize].right = right_index;

	node_index
}

/// After the tree is built, leaves reference `items` by relative position
/// within their own slice. A second pass over the final flattened order
/// fixes up `start` into an absolute offset. `Bvh::build` handles this by
/// constructing leaves with their absolute start directly; kept here as a
/// free function so the fixup is explicit and testable in isolation.
fn fixup_leaf_starts(nodes: &mut [BvhNode]) {
	let mut offset = 0u32;
	for node in nodes.iter_mut() {
		if node.is_leaf() {
			node.start = offset;
			offset += node.count;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tri_aabb(center: Vec3) -> Aabb {
		Aabb::of_box(center, Vec3::splat(0.1))
	}

	#[test]
	fn query_finds_overlapping_leaf_triangles() {
		let aabbs: Vec<Aabb> = (0..16).map(|i| tri_aabb(Vec3::new(i as f32, 0.0, 0.0))).collect();
		let bvh = Bvh::build(&aabbs);

		let mut hits = Vec::new();
		bvh.query_aabb(&Aabb::of_box(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(0.5)), |i| hits.push(i));

		assert!(hits.contains(&5));
		assert!(!hits.is_empty());
	}

	#[test]
	fn query_caps_results_at_max_result_count_minus_one() {
		let aabbs: Vec<Aabb> = (0..(MAX_RESULT_COUNT + 5)).map(|_| tri_aabb(Vec3::ZERO)).collect();
		let bvh = Bvh::build(&aabbs);

		let mut hits = Vec::new();
		bvh.query_aabb(&Aabb::of_box(Vec3::ZERO, Vec3::splat(1.0)), |i| hits.push(i));

		assert_eq!(hits.len(), MAX_RESULT_COUNT - 1);
	}

	#[test]
	fn empty_mesh_has_no_nodes() {
		let bvh = Bvh::build(&[]);
		assert!(bvh.nodes.is_empty());
		let mut hits = Vec::new();
		bvh.query_aabb(&Aabb::of_box(Vec3::ZERO, Vec3::splat(1.0)), |i| hits.push(i));
		assert!(hits.is_empty());
	}
}
