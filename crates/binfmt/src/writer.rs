use std::io::{self, Write};
use byteorder::{BigEndian, WriteBytesExt};

/// A growable, randomly-addressable byte buffer for building the on-cart
/// binary formats. Every multi-byte field is big-endian, matching the
/// target's native byte order.
///
/// Writes happen at an internal cursor rather than always at the tail, so a
/// header field can be reserved with zeros, more data appended after it, and
/// the header patched once its final value is known (`reserve`/`patch_*`).
/// [`push_position`]/[`pop_position`] save and restore the cursor for this.
#[derive(Default)]
pub struct Writer {
	buf: Vec<u8>,
	cursor: usize,
	stack: Vec<usize>,
}

impl Writer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.buf.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buf.is_empty()
	}

	pub fn position(&self) -> usize {
		self.cursor
	}

	/// Moves the cursor to `pos`, remembering the previous cursor so
	/// [`pop_position`] can restore it. Writing past the current end of the
	/// buffer zero-extends it.
	pub fn push_position(&mut self, pos: usize) {
		self.stack.push(self.cursor);
		self.cursor = pos;
	}

	pub fn pop_position(&mut self) {
		self.cursor = self.stack.pop().expect("pop_position without matching push_position");
	}

	pub fn seek_end(&mut self) {
		self.cursor = self.buf.len();
	}

	/// Pads with zero bytes until the cursor is a multiple of `align`.
	pub fn align(&mut self, align: usize) {
		debug_assert!(align.is_power_of_two());
		let pad = (align - (self.cursor % align)) % align;
		for _ in 0..pad {
			self.write_u8(0);
		}
	}

	pub fn write_u8(&mut self, v: u8) {
		self.write_all(&[v]).unwrap();
	}

	pub fn write_i8(&mut self, v: i8) {
		self.write_u8(v as u8);
	}

	pub fn write_u16(&mut self, v: u16) {
		WriteBytesExt::write_u16::<BigEndian>(self, v).unwrap();
	}

	pub fn write_i16(&mut self, v: i16) {
		WriteBytesExt::write_i16::<BigEndian>(self, v).unwrap();
	}

	pub fn write_u32(&mut self, v: u32) {
		WriteBytesExt::write_u32::<BigEndian>(self, v).unwrap();
	}

	pub fn write_i32(&mut self, v: i32) {
		WriteBytesExt::write_i32::<BigEndian>(self, v).unwrap();
	}

	pub fn write_u64(&mut self, v: u64) {
		WriteBytesExt::write_u64::<BigEndian>(self, v).unwrap();
	}

	pub fn write_f32(&mut self, v: f32) {
		WriteBytesExt::write_f32::<BigEndian>(self, v).unwrap();
	}

	/// Writes `bytes` verbatim, no length prefix.
	pub fn write_bytes(&mut self, bytes: &[u8]) {
		self.write_all(bytes).unwrap();
	}

	/// Writes a UTF-8 string followed by a single zero byte.
	pub fn write_cstr(&mut self, s: &str) {
		self.write_all(s.as_bytes()).unwrap();
		self.write_u8(0);
	}

	/// Writes `count` zero bytes at the cursor and returns their offset, to
	/// be overwritten later with [`patch_u8`]/[`patch_u16`]/[`patch_u32`]
	/// once the value they hold is known.
	pub fn reserve(&mut self, count: usize) -> usize {
		let offset = self.cursor;
		for _ in 0..count {
			self.write_u8(0);
		}
		offset
	}

	pub fn patch_u8(&mut self, offset: usize, v: u8) {
		self.push_position(offset);
		self.write_u8(v);
		self.pop_position();
	}

	pub fn patch_u16(&mut self, offset: usize, v: u16) {
		self.push_position(offset);
		self.write_u16(v);
		self.pop_position();
	}

	pub fn patch_u32(&mut self, offset: usize, v: u32) {
		self.push_position(offset);
		self.write_u32(v);
		self.pop_position();
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.buf
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.buf
	}

	/// Writes the buffer to `path` by first writing a sibling temp file and
	/// renaming it over the destination, so a build killed mid-write never
	/// leaves a truncated asset on disk.
	pub fn write_to_file_atomic(&self, path: &std::path::Path) -> io::Result<()> {
		let tmp_path = path.with_extension(format!(
			"{}.tmp",
			path.extension().and_then(|e| e.to_str()).unwrap_or("")
		));
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&tmp_path, &self.buf)?;
		std::fs::rename(&tmp_path, path)?;
		Ok(())
	}
}

impl Write for Writer {
	fn write(&mut self, data: &[u8]) -> io::Result<usize> {
		let end = self.cursor + data.len();
		if end > self.buf.len() {
			self.buf.resize(end, 0);
		}
		self.buf[self.cursor..end].copy_from_slice(data);
		self.cursor = end;
		Ok(data.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn append_and_patch() {
		let mut w = Writer::new();
		let count_offset = w.reserve(4);
		w.write_u32(1);
		w.write_u32(2);
		w.write_u32(3);
		w.patch_u32(count_offset, 3);

		let bytes = w.into_bytes();
		assert_eq!(bytes.len(), 16);
		assert_eq!(u32::from_be_bytes(bytes[0..4].try_into().unwrap()), 3);
		assert_eq!(u32::from_be_bytes(bytes[4..8].try_into().unwrap()), 1);
	}

	#[test]
	fn align_pads_with_zeros() {
		let mut w = Writer::new();
		w.write_u8(1);
		w.align(4);
		assert_eq!(w.position(), 4);
		assert_eq!(w.as_bytes(), &[1, 0, 0, 0]);
	}

	#[test]
	fn push_pop_position_round_trips() {
		let mut w = Writer::new();
		w.write_u32(0);
		w.write_u32(0);
		let saved = w.position();
		w.push_position(0);
		w.write_u16(0xbeef);
		w.pop_position();
		assert_eq!(w.position(), saved);
	}
}
