use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use strux_codec::CodecError;
use strux_codec::span;

use crate::PointerView;
use crate::StructView;
use crate::TypedArrayView;
use crate::ViewError;

/// A shared, fixed-size, zero-initialised byte allocation.
///
/// Cloning the handle aliases the same bytes. Every view created over a
/// buffer holds such a clone; none of them owns the bytes exclusively and
/// all of them observe each other's writes.
#[derive(Clone, Default)]
pub struct ArrayBuffer {
	bytes: Rc<RefCell<Box<[u8]>>>,
}

impl ArrayBuffer {
	/// Allocates `byte_length` zeroed bytes.
	pub fn new(byte_length: usize) -> Self {
		Self::from(vec![0u8; byte_length])
	}

	pub fn byte_length(&self) -> usize {
		self.bytes.borrow().len()
	}

	/// Returns `true` when both handles alias the same allocation.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.bytes, &other.bytes)
	}

	/// Copies the whole buffer out.
	pub fn to_vec(&self) -> Vec<u8> {
		self.bytes.borrow().to_vec()
	}

	/// Copies `byte_length` bytes starting at the signed `offset`.
	pub fn read_bytes(&self, offset: i64, byte_length: usize) -> Result<Vec<u8>, CodecError> {
		let bytes = self.bytes.borrow();
		let range = span(bytes.len(), offset, byte_length)?;

		Ok(bytes[range].to_vec())
	}

	/// Overwrites the bytes starting at the signed `offset` with `source`.
	pub fn write_bytes(&self, offset: i64, source: &[u8]) -> Result<(), CodecError> {
		let mut bytes = self.bytes.borrow_mut();
		let range = span(bytes.len(), offset, source.len())?;
		bytes[range].copy_from_slice(source);

		Ok(())
	}

	pub(crate) fn read<R>(&self, read: impl FnOnce(&[u8]) -> R) -> R {
		read(&self.bytes.borrow())
	}

	pub(crate) fn write<R>(&self, write: impl FnOnce(&mut [u8]) -> R) -> R {
		write(&mut self.bytes.borrow_mut())
	}
}

impl From<Vec<u8>> for ArrayBuffer {
	fn from(bytes: Vec<u8>) -> Self {
		Self {
			bytes: Rc::new(RefCell::new(bytes.into_boxed_slice())),
		}
	}
}

impl From<&[u8]> for ArrayBuffer {
	fn from(bytes: &[u8]) -> Self {
		Self::from(bytes.to_vec())
	}
}

impl<const N: usize> From<[u8; N]> for ArrayBuffer {
	fn from(bytes: [u8; N]) -> Self {
		Self::from(bytes.to_vec())
	}
}

impl fmt::Debug for ArrayBuffer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ArrayBuffer")
			.field("byte_length", &self.byte_length())
			.finish()
	}
}

/// The buffer argument accepted by view constructors.
///
/// Anything other than a plain [`ArrayBuffer`] (for example another view
/// over a buffer) converts into the `View` variant and is rejected when the
/// constructor validates its arguments.
#[derive(Clone, Debug)]
pub enum BufferSource {
	Buffer(ArrayBuffer),
	View(&'static str),
}

impl BufferSource {
	pub(crate) fn into_buffer(self) -> Result<ArrayBuffer, ViewError> {
		match self {
			Self::Buffer(buffer) => Ok(buffer),
			Self::View(found) => Err(ViewError::InvalidArgument { found }),
		}
	}
}

impl From<ArrayBuffer> for BufferSource {
	fn from(buffer: ArrayBuffer) -> Self {
		Self::Buffer(buffer)
	}
}

impl From<&ArrayBuffer> for BufferSource {
	fn from(buffer: &ArrayBuffer) -> Self {
		Self::Buffer(buffer.clone())
	}
}

impl From<&TypedArrayView> for BufferSource {
	fn from(_: &TypedArrayView) -> Self {
		Self::View("TypedArrayView")
	}
}

impl From<&StructView> for BufferSource {
	fn from(_: &StructView) -> Self {
		Self::View("StructView")
	}
}

impl From<&PointerView> for BufferSource {
	fn from(_: &PointerView) -> Self {
		Self::View("PointerView")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clones_alias_the_same_bytes() {
		let buffer = ArrayBuffer::new(4);
		let alias = buffer.clone();
		alias.write_bytes(1, &[7, 8]).unwrap();
		assert_eq!(buffer.to_vec(), [0, 7, 8, 0]);
		assert!(buffer.ptr_eq(&alias));
		assert!(!buffer.ptr_eq(&ArrayBuffer::new(4)));
	}

	#[test]
	fn reads_and_writes_are_bounds_checked() {
		let buffer = ArrayBuffer::from([1, 2, 3]);
		assert_eq!(buffer.read_bytes(1, 2).unwrap(), [2, 3]);
		assert!(buffer.read_bytes(2, 2).is_err());
		assert!(buffer.read_bytes(-1, 1).is_err());
		assert!(buffer.write_bytes(3, &[0]).is_err());
		assert_eq!(buffer.to_vec(), [1, 2, 3]);
	}

	#[test]
	fn only_array_buffers_are_accepted() {
		let buffer = ArrayBuffer::new(1);
		assert!(BufferSource::from(&buffer).into_buffer().is_ok());
		assert_eq!(
			BufferSource::View("TypedArrayView").into_buffer().unwrap_err(),
			ViewError::InvalidArgument {
				found: "TypedArrayView"
			}
		);
	}
}
