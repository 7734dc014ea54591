use std::io::Cursor;
use byteorder::{BigEndian, ReadBytesExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
	#[error("unexpected end of data at offset {offset}")]
	Eof { offset: usize },
	#[error("string at offset {offset} is not valid UTF-8")]
	InvalidUtf8 { offset: usize },
}

type Result<T> = std::result::Result<T, ReadError>;

/// Reads the big-endian binary formats written by [`crate::Writer`]. Mirrors
/// the byteorder-over-`Cursor` style used for mesh parsing elsewhere in the
/// workspace, generalized to the scene/asset-table layouts.
pub struct Reader<'a> {
	cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		Self { cursor: Cursor::new(data) }
	}

	pub fn position(&self) -> usize {
		self.cursor.position() as usize
	}

	pub fn seek(&mut self, pos: usize) {
		self.cursor.set_position(pos as u64);
	}

	pub fn remaining(&self) -> usize {
		self.cursor.get_ref().len().saturating_sub(self.position())
	}

	pub fn align(&mut self, align: usize) {
		let pos = self.position();
		let pad = (align - (pos % align)) % align;
		self.seek(pos + pad);
	}

	fn eof(&self) -> ReadError {
		ReadError::Eof { offset: self.position() }
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		self.cursor.read_u8().map_err(|_| self.eof())
	}

	pub fn read_i8(&mut self) -> Result<i8> {
		self.cursor.read_i8().map_err(|_| self.eof())
	}

	pub fn read_u16(&mut self) -> Result<u16> {
		self.cursor.read_u16::<BigEndian>().map_err(|_| self.eof())
	}

	pub fn read_i16(&mut self) -> Result<i16> {
		self.cursor.read_i16::<BigEndian>().map_err(|_| self.eof())
	}

	pub fn read_u32(&mut self) -> Result<u32> {
		self.cursor.read_u32::<BigEndian>().map_err(|_| self.eof())
	}

	pub fn read_i32(&mut self) -> Result<i32> {
		self.cursor.read_i32::<BigEndian>().map_err(|_| self.eof())
	}

	pub fn read_u64(&mut self) -> Result<u64> {
		self.cursor.read_u64::<BigEndian>().map_err(|_| self.eof())
	}

	pub fn read_f32(&mut self) -> Result<f32> {
		self.cursor.read_f32::<BigEndian>().map_err(|_| self.eof())
	}

	pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
		let start = self.position();
		let data = *self.cursor.get_ref();
		let end = start + count;
		if end > data.len() {
			return Err(self.eof());
		}
		self.seek(end);
		Ok(&data[start..end])
	}

	/// Reads a null-terminated UTF-8 string starting at the cursor.
	pub fn read_cstr(&mut self) -> Result<&'a str> {
		let start = self.position();
		let data = *self.cursor.get_ref();
		let end = data[start..].iter().position(|&b| b == 0).map(|i| start + i).ok_or_else(|| self.eof())?;
		self.seek(end + 1);
		std::str::from_utf8(&data[start..end]).map_err(|_| ReadError::InvalidUtf8 { offset: start })
	}

	/// Reads a null-terminated UTF-8 string at `offset` without disturbing
	/// the current cursor, for resolving string-table offsets.
	pub fn read_cstr_at(&self, offset: usize) -> Result<&'a str> {
		let data = *self.cursor.get_ref();
		let end = data[offset..].iter().position(|&b| b == 0).map(|i| offset + i).ok_or(ReadError::Eof { offset })?;
		std::str::from_utf8(&data[offset..end]).map_err(|_| ReadError::InvalidUtf8 { offset })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Writer;

	#[test]
	fn round_trips_through_writer() {
		let mut w = Writer::new();
		w.write_u32(42);
		w.write_cstr("hello");
		w.align(4);
		w.write_i16(-7);
		let bytes = w.into_bytes();

		let mut r = Reader::new(&bytes);
		assert_eq!(r.read_u32().unwrap(), 42);
		assert_eq!(r.read_cstr().unwrap(), "hello");
		r.align(4);
		assert_eq!(r.read_i16().unwrap(), -7);
	}

	#[test]
	fn eof_is_reported() {
		let bytes = [0u8, 1];
		let mut r = Reader::new(&bytes);
		assert!(r.read_u32().is_err());
	}
}
