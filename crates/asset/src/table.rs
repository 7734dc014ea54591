use std::collections::HashMap;

use binfmt::{Reader, Writer};

use crate::kind::{AssetIndex, AssetKind};
use crate::uuid::AssetUuid;

#[derive(Debug, Clone)]
pub struct AssetEntry {
	pub uuid: AssetUuid,
	pub kind: AssetKind,
	/// Path as it will be addressed on the target filesystem at runtime.
	pub rom_path: String,
}

/// Builds the flat, content-addressed asset table emitted at the end of a
/// build. Assets are appended in build order (all images, then all audio,
/// ...) and each gets an [`AssetIndex`] whose serial is its position among
/// assets of the same kind, matching the runtime's per-kind lookup arrays.
pub struct AssetTableBuilder {
	entries: Vec<AssetEntry>,
	per_kind_count: [u32; AssetKind::COUNT],
	by_uuid: HashMap<u64, AssetIndex>,
	by_rom_path: HashMap<String, AssetIndex>,
}

impl AssetTableBuilder {
	pub fn new() -> Self {
		Self {
			entries: Vec::new(),
			per_kind_count: [0; AssetKind::COUNT],
			by_uuid: HashMap::new(),
			by_rom_path: HashMap::new(),
		}
	}

	/// Registers an asset and returns the index components should store to
	/// refer to it. Calling this twice with the same `uuid` returns the
	/// original index without creating a duplicate entry, so rebuilds stay
	/// idempotent.
	pub fn add(&mut self, uuid: AssetUuid, kind: AssetKind, rom_path: impl Into<String>) -> AssetIndex {
		if let Some(&existing) = self.by_uuid.get(&uuid.as_u64()) {
			return existing;
		}

		let serial = self.per_kind_count[kind.as_u8() as usize];
		self.per_kind_count[kind.as_u8() as usize] += 1;
		let index = AssetIndex::new(kind, serial);

		let rom_path = rom_path.into();
		self.by_uuid.insert(uuid.as_u64(), index);
		self.by_rom_path.insert(rom_path.clone(), index);
		self.entries.push(AssetEntry { uuid, kind, rom_path });

		index
	}

	pub fn index_of_uuid(&self, uuid: AssetUuid) -> Option<AssetIndex> {
		self.by_uuid.get(&uuid.as_u64()).copied()
	}

	pub fn index_of_path(&self, rom_path: &str) -> Option<AssetIndex> {
		self.by_rom_path.get(rom_path).copied()
	}

	pub fn entries(&self) -> &[AssetEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Serializes the table: `count: u32`, then `count` records of
	/// `(path-offset: u32, kind<<24: u32)`, then the null-terminated path
	/// strings. `path-offset` is relative to the start of the table.
	pub fn build(&self) -> Vec<u8> {
		let mut w = Writer::new();

		w.write_u32(self.entries.len() as u32);

		let base_offset = (self.entries.len() as u32) * 8 + 4;
		let mut string_offsets = Vec::with_capacity(self.entries.len());
		let mut running = base_offset;
		for entry in &self.entries {
			string_offsets.push(running);
			running += entry.rom_path.len() as u32 + 1;
		}

		for (entry, &offset) in self.entries.iter().zip(&string_offsets) {
			w.write_u32(offset);
			w.write_u32((entry.kind.as_u8() as u32) << 24);
		}

		for entry in &self.entries {
			w.write_cstr(&entry.rom_path);
		}

		w.into_bytes()
	}
}

/// Runtime view over a serialized asset table. Splits entries into per-kind
/// buckets on load so `AssetIndex::serial` resolves with a direct index
/// rather than a linear scan, mirroring the original `AssetManager`'s
/// per-type entry arrays.
pub struct AssetTable {
	paths: Vec<String>,
	kinds: Vec<AssetKind>,
	per_kind: [Vec<u32>; AssetKind::COUNT],
}

#[derive(Debug, thiserror::Error)]
pub enum AssetTableError {
	#[error("asset table truncated")]
	Truncated(#[from] binfmt::ReadError),
	#[error("asset index {0:?} out of range")]
	OutOfRange(AssetIndex),
}

impl AssetTable {
	pub fn parse(data: &[u8]) -> Result<Self, AssetTableError> {
		let mut r = Reader::new(data);
		let count = r.read_u32()? as usize;

		let mut flat = Vec::with_capacity(count);
		for _ in 0..count {
			let path_offset = r.read_u32()? as usize;
			let kind_and_flags = r.read_u32()?;
			let kind = AssetKind::from_u8((kind_and_flags >> 24) as u8);
			flat.push((path_offset, kind));
		}

		let mut paths = Vec::with_capacity(count);
		let mut kinds = Vec::with_capacity(count);
		let mut per_kind: [Vec<u32>; AssetKind::COUNT] = std::array::from_fn(|_| Vec::new());

		for (i, (offset, kind)) in flat.into_iter().enumerate() {
			let path = r.read_cstr_at(offset)?;
			per_kind[kind.as_u8() as usize].push(i as u32);
			paths.push(path.to_string());
			kinds.push(kind);
		}

		Ok(Self { paths, kinds, per_kind })
	}

	pub fn resolve(&self, index: AssetIndex) -> Result<&str, AssetTableError> {
		let bucket = &self.per_kind[index.kind().as_u8() as usize];
		let flat_index = *bucket.get(index.serial() as usize).ok_or(AssetTableError::OutOfRange(index))?;
		Ok(&self.paths[flat_index as usize])
	}

	pub fn len(&self) -> usize {
		self.paths.len()
	}

	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}

	pub fn kind_of(&self, flat_index: usize) -> AssetKind {
		self.kinds[flat_index]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_through_binary_format() {
		let mut builder = AssetTableBuilder::new();
		let model_idx = builder.add(AssetUuid::for_content_path("a.glb"), AssetKind::Model, "models/a.bin");
		let img_idx = builder.add(AssetUuid::for_content_path("b.png"), AssetKind::Image, "images/b.bin");
		let model2_idx = builder.add(AssetUuid::for_content_path("c.glb"), AssetKind::Model, "models/c.bin");

		assert_eq!(model_idx.serial(), 0);
		assert_eq!(model2_idx.serial(), 1);
		assert_eq!(img_idx.serial(), 0);

		let bytes = builder.build();
		let table = AssetTable::parse(&bytes).unwrap();

		assert_eq!(table.len(), 3);
		assert_eq!(table.resolve(model_idx).unwrap(), "models/a.bin");
		assert_eq!(table.resolve(model2_idx).unwrap(), "models/c.bin");
		assert_eq!(table.resolve(img_idx).unwrap(), "images/b.bin");
	}

	#[test]
	fn adding_same_uuid_twice_is_idempotent() {
		let mut builder = AssetTableBuilder::new();
		let uuid = AssetUuid::for_content_path("a.glb");
		let first = builder.add(uuid, AssetKind::Model, "models/a.bin");
		let second = builder.add(uuid, AssetKind::Model, "models/a.bin");
		assert_eq!(first, second);
		assert_eq!(builder.len(), 1);
	}
}
