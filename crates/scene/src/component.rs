use binfmt::{Reader, Writer};
use math::Vec3;

/// Tag byte stored in each component record's header. Order is part of the
/// on-disk contract; do not renumber existing variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ComponentKind {
	Code = 0,
	Model = 1,
	Light = 2,
	Camera = 3,
	CollMesh = 4,
	CollBody = 5,
	Audio2D = 6,
}

impl ComponentKind {
	pub fn from_u8(v: u8) -> Option<Self> {
		Some(match v {
			0 => Self::Code,
			1 => Self::Model,
			2 => Self::Light,
			3 => Self::Camera,
			4 => Self::CollMesh,
			5 => Self::CollBody,
			6 => Self::Audio2D,
			_ => return None,
		})
	}
}

#[derive(Debug, Clone)]
pub struct CodeComponent {
	pub script_index: u16,
	pub flags: u16,
	/// Script-declared argument bytes; this crate treats script code as an
	/// opaque unit keyed by `script_index` and never interprets `args`.
	pub args: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ModelComponent {
	pub asset_index: u16,
	pub layer: u8,
	pub flags: u8,
	pub material: [u8; 4],
	pub mesh_filter: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct LightComponent {
	pub color: [u8; 4],
	pub index: u8,
	pub kind: u8,
	pub dir: [i8; 3],
}

#[derive(Debug, Clone, Copy)]
pub struct CameraComponent {
	pub vp_offset: [i32; 2],
	pub vp_size: [i32; 2],
	pub fov: f32,
	pub near: f32,
	pub far: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct CollMeshComponent {
	pub asset_index: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct CollBodyComponent {
	pub half_extent: Vec3,
	pub offset: Vec3,
	pub flags: u8,
	pub mask_read: u8,
	pub mask_write: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct Audio2DComponent {
	pub asset_index: u16,
	pub volume_q16: u16,
	pub flags: u8,
}

#[derive(Debug, Clone)]
pub enum Component {
	Code(CodeComponent),
	Model(ModelComponent),
	Light(LightComponent),
	Camera(CameraComponent),
	CollMesh(CollMeshComponent),
	CollBody(CollBodyComponent),
	Audio2D(Audio2DComponent),
}

impl Component {
	pub fn kind(&self) -> ComponentKind {
		match self {
			Component::Code(_) => ComponentKind::Code,
			Component::Model(_) => ComponentKind::Model,
			Component::Light(_) => ComponentKind::Light,
			Component::Camera(_) => ComponentKind::Camera,
			Component::CollMesh(_) => ComponentKind::CollMesh,
			Component::CollBody(_) => ComponentKind::CollBody,
			Component::Audio2D(_) => ComponentKind::Audio2D,
		}
	}

	/// Writes this component's payload, matching the per-kind layout table.
	/// Called between the record header reservation and its backpatch; see
	/// [`crate::writer::write_object`].
	pub fn build(&self, w: &mut Writer) {
		match self {
			Component::Code(c) => {
				w.write_u16(c.script_index);
				w.write_u16(c.flags);
				w.write_bytes(&c.args);
			}
			Component::Model(c) => {
				w.write_u16(c.asset_index);
				w.write_u8(c.layer);
				w.write_u8(c.flags);
				w.write_bytes(&c.material);
				w.write_u8(c.mesh_filter.len() as u8);
				w.write_bytes(&c.mesh_filter);
			}
			Component::Light(c) => {
				w.write_bytes(&c.color);
				w.write_u8(c.index);
				w.write_u8(c.kind);
				for d in c.dir {
					w.write_i8(d);
				}
			}
			Component::Camera(c) => {
				w.write_i32(c.vp_offset[0]);
				w.write_i32(c.vp_offset[1]);
				w.write_i32(c.vp_size[0]);
				w.write_i32(c.vp_size[1]);
				w.write_f32(c.fov);
				w.write_f32(c.near);
				w.write_f32(c.far);
			}
			Component::CollMesh(c) => {
				w.write_u16(c.asset_index);
				w.write_u16(0);
			}
			Component::CollBody(c) => {
				w.write_f32(c.half_extent.x);
				w.write_f32(c.half_extent.y);
				w.write_f32(c.half_extent.z);
				w.write_f32(c.offset.x);
				w.write_f32(c.offset.y);
				w.write_f32(c.offset.z);
				w.write_u8(c.flags);
				w.write_u8(c.mask_read);
				w.write_u8(c.mask_write);
			}
			Component::Audio2D(c) => {
				w.write_u16(c.asset_index);
				w.write_u16(c.volume_q16);
				w.write_u8(c.flags);
			}
		}
	}

	/// Reconstructs a component from its payload bytes, the runtime
	/// counterpart of [`Component::build`]. `payload` is already sliced to
	/// exactly this record's word-aligned length.
	pub fn parse(kind: ComponentKind, payload: &[u8]) -> Result<Component, binfmt::ReadError> {
		let mut r = Reader::new(payload);
		Ok(match kind {
			ComponentKind::Code => Component::Code(CodeComponent {
				script_index: r.read_u16()?,
				flags: r.read_u16()?,
				args: payload[4..].to_vec(),
			}),
			ComponentKind::Model => {
				let asset_index = r.read_u16()?;
				let layer = r.read_u8()?;
				let flags = r.read_u8()?;
				let material = [r.read_u8()?, r.read_u8()?, r.read_u8()?, r.read_u8()?];
				let count = r.read_u8()? as usize;
				let mesh_filter = r.read_bytes(count)?.to_vec();
				Component::Model(ModelComponent { asset_index, layer, flags, material, mesh_filter })
			}
			ComponentKind::Light => Component::Light(LightComponent {
				color: [r.read_u8()?, r.read_u8()?, r.read_u8()?, r.read_u8()?],
				index: r.read_u8()?,
				kind: r.read_u8()?,
				dir: [r.read_i8()?, r.read_i8()?, r.read_i8()?],
			}),
			ComponentKind::Camera => Component::Camera(CameraComponent {
				vp_offset: [r.read_i32()?, r.read_i32()?],
				vp_size: [r.read_i32()?, r.read_i32()?],
				fov: r.read_f32()?,
				near: r.read_f32()?,
				far: r.read_f32()?,
			}),
			ComponentKind::CollMesh => {
				let asset_index = r.read_u16()?;
				let _padding = r.read_u16()?;
				Component::CollMesh(CollMeshComponent { asset_index })
			}
			ComponentKind::CollBody => Component::CollBody(CollBodyComponent {
				half_extent: Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?),
				offset: Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?),
				flags: r.read_u8()?,
				mask_read: r.read_u8()?,
				mask_write: r.read_u8()?,
			}),
			ComponentKind::Audio2D => Component::Audio2D(Audio2DComponent {
				asset_index: r.read_u16()?,
				volume_q16: r.read_u16()?,
				flags: r.read_u8()?,
			}),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn coll_body_round_trips() {
		let c = CollBodyComponent {
			half_extent: Vec3::new(1.0, 2.0, 3.0),
			offset: Vec3::new(0.1, 0.2, 0.3),
			flags: 0b101,
			mask_read: 1,
			mask_write: 2,
		};
		let mut w = Writer::new();
		Component::CollBody(c).build(&mut w);
		let bytes = w.into_bytes();

		let parsed = Component::parse(ComponentKind::CollBody, &bytes).unwrap();
		match parsed {
			Component::CollBody(p) => {
				assert_eq!(p.flags, 0b101);
				assert_eq!(p.mask_read, 1);
				assert_eq!(p.mask_write, 2);
			}
			_ => panic!("wrong component kind"),
		}
	}

	#[test]
	fn model_round_trips_with_mesh_filter() {
		let c = ModelComponent { asset_index: 7, layer: 1, flags: 0, material: [1, 2, 3, 4], mesh_filter: vec![0, 1, 2] };
		let mut w = Writer::new();
		Component::Model(c).build(&mut w);
		let bytes = w.into_bytes();

		let parsed = Component::parse(ComponentKind::Model, &bytes).unwrap();
		match parsed {
			Component::Model(p) => assert_eq!(p.mesh_filter, vec![0, 1, 2]),
			_ => panic!("wrong component kind"),
		}
	}
}
