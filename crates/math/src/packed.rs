//! Compact encodings shared by the build pipeline (writer) and the runtime
//! (reader): a 32-bit smallest-three quaternion and 16-bit signed unit vectors.
//!
//! The quaternion scheme drops the largest-magnitude component (it is always
//! positive after a possible sign flip, since `q` and `-q` represent the same
//! rotation) and stores the other three as 10-bit quantized fractions of
//! `1/sqrt(2)`, the maximum magnitude any non-largest component can have.

use crate::{Quaternion, UnitQuaternion, Vector3};

const SQRT_2_INV: f32 = std::f32::consts::FRAC_1_SQRT_2;

fn s10_to_float(value: u32, offset: f32, scale: f32) -> f32 {
	(value as f32) / 1023.0 * scale + offset
}

fn float_to_s10(value: f32, offset: f32, scale: f32) -> u32 {
	let t = ((value - offset) / scale * 1023.0).round();
	t.clamp(0.0, 1023.0) as u32
}

/// Packs a rotation into the 32-bit largest-component-implicit format used by
/// the object stream (see the object header layout in the scene crate).
pub fn pack_rotation(q: UnitQuaternion<f32>) -> u32 {
	let q = *q;
	let comps = [q.i, q.j, q.k, q.w];

	let mut largest_idx = 0usize;
	let mut largest_abs = comps[0].abs();
	for i in 1..4 {
		if comps[i].abs() > largest_abs {
			largest_abs = comps[i].abs();
			largest_idx = i;
		}
	}

	// Quaternion and its negation describe the same rotation; flip so the
	// dropped (largest) component is positive and need not be sign-encoded.
	let sign = if comps[largest_idx] < 0.0 { -1.0 } else { 1.0 };

	let idx0 = (largest_idx + 1) & 3;
	let idx1 = (largest_idx + 2) & 3;
	let idx2 = (largest_idx + 3) & 3;

	let offset = -SQRT_2_INV;
	let scale = SQRT_2_INV * 2.0;

	let a = float_to_s10(comps[idx0] * sign, offset, scale);
	let b = float_to_s10(comps[idx1] * sign, offset, scale);
	let c = float_to_s10(comps[idx2] * sign, offset, scale);

	((largest_idx as u32) << 30) | (a << 20) | (b << 10) | c
}

/// Inverse of [`pack_rotation`].
pub fn unpack_rotation(bits: u32) -> UnitQuaternion<f32> {
	let largest_idx = ((bits >> 30) & 3) as usize;
	let a = (bits >> 20) & 0x3ff;
	let b = (bits >> 10) & 0x3ff;
	let c = bits & 0x3ff;

	let offset = -SQRT_2_INV;
	let scale = SQRT_2_INV * 2.0;

	let va = s10_to_float(a, offset, scale);
	let vb = s10_to_float(b, offset, scale);
	let vc = s10_to_float(c, offset, scale);

	let largest = (1.0 - va * va - vb * vb - vc * vc).max(0.0).sqrt();

	if largest > 0.9999 {
		return UnitQuaternion::IDENTITY;
	}

	let idx0 = (largest_idx + 1) & 3;
	let idx1 = (largest_idx + 2) & 3;
	let idx2 = (largest_idx + 3) & 3;

	let mut comps = [0.0f32; 4];
	comps[idx0] = va;
	comps[idx1] = vb;
	comps[idx2] = vc;
	comps[largest_idx] = largest;

	UnitQuaternion::new_unchecked(Quaternion { i: comps[0], j: comps[1], k: comps[2], w: comps[3] })
}

/// Scale applied to a mesh's vertex positions so they fit the `i16` range;
/// stored alongside the mesh as `coll_scale` and reapplied at load time.
pub fn quantize_position(p: Vector3<f32>, inv_scale: f32) -> [i16; 3] {
	[
		(p.x * inv_scale).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16,
		(p.y * inv_scale).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16,
		(p.z * inv_scale).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16,
	]
}

pub fn dequantize_position(p: [i16; 3], scale: f32) -> Vector3<f32> {
	Vector3::new(p[0] as f32 * scale, p[1] as f32 * scale, p[2] as f32 * scale)
}

/// Quantizes a unit normal to a 15-bit signed fraction per axis (`i16` with
/// the top bit unused), matching the original's floor-classification scheme
/// where `normal.y > 0x7FFF * FLOOR_ANGLE` marks a walkable surface.
pub fn quantize_normal(n: Vector3<f32>) -> [i16; 3] {
	let q = |v: f32| (v.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
	[q(n.x), q(n.y), q(n.z)]
}

pub fn dequantize_normal(n: [i16; 3]) -> Vector3<f32> {
	let d = |v: i16| v as f32 / i16::MAX as f32;
	Vector3::new(d(n[0]), d(n[1]), d(n[2]))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Unit, Vector3};

	fn approx_eq(a: UnitQuaternion<f32>, b: UnitQuaternion<f32>) -> bool {
		// q and -q represent the same rotation; accept either sign.
		let d1 = (a.i - b.i).abs() + (a.j - b.j).abs() + (a.k - b.k).abs() + (a.w - b.w).abs();
		let d2 = (a.i + b.i).abs() + (a.j + b.j).abs() + (a.k + b.k).abs() + (a.w + b.w).abs();
		d1 < 1e-2 || d2 < 1e-2
	}

	#[test]
	fn identity_round_trips() {
		let packed = pack_rotation(UnitQuaternion::IDENTITY);
		let unpacked = unpack_rotation(packed);
		assert!(approx_eq(unpacked, UnitQuaternion::IDENTITY));
	}

	#[test]
	fn axis_angle_round_trips_within_quantization_error() {
		let q = UnitQuaternion::from_axis_angle(Unit::new_unchecked(Vector3::new(0.0, 1.0, 0.0)), 0.77);
		let packed = pack_rotation(q);
		let unpacked = unpack_rotation(packed);
		assert!(approx_eq(q, unpacked));
	}

	#[test]
	fn position_quantization_is_reversible_within_one_lsb() {
		let scale = 1.0 / 256.0;
		let p = Vector3::new(123.4, -55.0, 8000.0);
		let q = quantize_position(p, 1.0 / scale);
		let back = dequantize_position(q, scale);
		assert!((back - p).length() < scale);
	}
}
