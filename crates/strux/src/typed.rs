use strux_codec::ByteOrder;

use crate::ArrayBuffer;
use crate::BufferView;
use crate::Scalar;
use crate::ScalarKind;
use crate::ViewError;
use crate::number::ToIntegerOrInfinity;

/// A bounded run of scalars in host byte order.
///
/// Struct members declared with `define_view` read as one of these. Like any
/// view it aliases the buffer, and it is not itself an [`ArrayBuffer`]:
/// passing it where a buffer is expected is an invalid argument.
#[derive(Clone, Debug)]
pub struct TypedArrayView {
	buffer: ArrayBuffer,
	byte_offset: i64,
	kind: ScalarKind,
	length: usize,
}

impl TypedArrayView {
	/// No bounds are checked up front; accesses fault when they leave the
	/// buffer.
	pub fn new(buffer: &ArrayBuffer, byte_offset: i64, kind: ScalarKind, length: usize) -> Self {
		Self {
			buffer: buffer.clone(),
			byte_offset,
			kind,
			length,
		}
	}

	pub fn kind(&self) -> ScalarKind {
		self.kind
	}

	pub fn len(&self) -> usize {
		self.length
	}

	pub fn is_empty(&self) -> bool {
		self.length == 0
	}

	fn offset_of(&self, index: i64) -> Option<i64> {
		let index = usize::try_from(index).ok().filter(|&index| index < self.length)?;
		let relative = index
			.checked_mul(self.kind.byte_length())
			.and_then(|relative| i64::try_from(relative).ok())
			.unwrap_or(i64::MAX);

		Some(self.byte_offset.saturating_add(relative))
	}

	/// Reads element `index`; `None` outside `0..len`.
	pub fn get(&self, index: i64) -> Result<Option<Scalar>, ViewError> {
		let Some(offset) = self.offset_of(index) else {
			return Ok(None);
		};

		let scalar = self
			.buffer
			.read(|bytes| self.kind.read(bytes, offset, ByteOrder::NATIVE))?;
		Ok(Some(scalar))
	}

	/// Writes element `index`, discarding writes outside `0..len`.
	pub fn set(&self, index: i64, value: impl Into<Scalar>) -> Result<(), ViewError> {
		let Some(offset) = self.offset_of(index) else {
			return Ok(());
		};

		let value = value.into();
		self.buffer
			.write(|bytes| self.kind.write(bytes, offset, value, ByteOrder::NATIVE))?;
		Ok(())
	}

	/// Relative indexing from the end for negative indices.
	pub fn at(&self, index: impl ToIntegerOrInfinity) -> Result<Option<Scalar>, ViewError> {
		let relative = index.to_integer_or_infinity();
		let length = self.length as f64;
		let index = if relative >= 0.0 { relative } else { length + relative };

		if index < 0.0 || index >= length {
			return Ok(None);
		}

		self.get(index as i64)
	}

	pub fn iter(&self) -> impl Iterator<Item = Result<Scalar, ViewError>> + '_ {
		(0..self.length as i64).filter_map(|index| self.get(index).transpose())
	}

	pub fn to_vec(&self) -> Result<Vec<Scalar>, ViewError> {
		self.iter().collect()
	}
}

impl BufferView for TypedArrayView {
	fn buffer(&self) -> &ArrayBuffer {
		&self.buffer
	}

	fn byte_offset(&self) -> i64 {
		self.byte_offset
	}

	fn byte_order(&self) -> ByteOrder {
		ByteOrder::NATIVE
	}

	fn byte_length(&self) -> usize {
		self.length.saturating_mul(self.kind.byte_length())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn elements_use_host_order() {
		let buffer = ArrayBuffer::new(6);
		let view = TypedArrayView::new(&buffer, 2, ScalarKind::U16, 2);
		view.set(1, 0x0102_u16).unwrap();

		let expected = 0x0102_u16.to_ne_bytes();
		assert_eq!(&buffer.to_vec()[4..], &expected);
		assert_eq!(view.get(1).unwrap(), Some(Scalar::U16(0x0102)));
		assert_eq!(view.at(-1).unwrap(), Some(Scalar::U16(0x0102)));
		assert_eq!(view.at(-3).unwrap(), None);
		assert_eq!(view.get(2).unwrap(), None);
		assert_eq!(view.byte_length(), 4);
	}

	#[test]
	fn out_of_range_writes_are_discarded() {
		let buffer = ArrayBuffer::new(2);
		let view = TypedArrayView::new(&buffer, 0, ScalarKind::I8, 2);
		view.set(2, 5_i8).unwrap();
		view.set(-1, 5_i8).unwrap();
		view.set(0, -1_i8).unwrap();

		assert_eq!(buffer.to_vec(), [0xff, 0]);
		assert_eq!(view.to_vec().unwrap(), [Scalar::I8(-1), Scalar::I8(0)]);
	}

	#[test]
	fn oversized_lengths_fault_instead_of_overflowing() {
		let buffer = ArrayBuffer::new(8);
		let view = TypedArrayView::new(&buffer, 0, ScalarKind::U64, usize::MAX);

		assert_eq!(view.byte_length(), usize::MAX);
		assert!(view.get(0).unwrap().is_some());
		assert!(matches!(view.get(i64::MAX), Err(ViewError::OutOfBounds(_))));
		assert!(matches!(view.set(i64::MAX, 1_u64), Err(ViewError::OutOfBounds(_))));
		assert_eq!(buffer.to_vec(), [0; 8]);
	}

	#[test]
	fn faults_surface_when_the_view_overruns() {
		let view = TypedArrayView::new(&ArrayBuffer::new(3), 0, ScalarKind::U16, 2);
		assert!(view.get(0).unwrap().is_some());
		assert!(matches!(view.get(1), Err(ViewError::OutOfBounds(_))));
	}
}
