use std::rc::Rc;

use crate::BufferView;
use crate::PointerView;
use crate::Scalar;
use crate::StructView;
use crate::TypedArrayView;

/// What a member or element read produces, and what a write accepts.
///
/// Child views are shared handles: reading the same composite member twice
/// yields the same `Rc`.
#[derive(Clone, Debug)]
pub enum Value {
	Scalar(Scalar),
	Struct(Rc<StructView>),
	Pointer(Rc<PointerView>),
	Typed(Rc<TypedArrayView>),
	/// Raw bytes, read from padding or written into composite members.
	Bytes(Vec<u8>),
}

impl Value {
	pub fn as_scalar(&self) -> Option<Scalar> {
		match self {
			Self::Scalar(scalar) => Some(*scalar),
			_ => None,
		}
	}

	pub fn as_struct(&self) -> Option<&Rc<StructView>> {
		match self {
			Self::Struct(view) => Some(view),
			_ => None,
		}
	}

	pub fn as_pointer(&self) -> Option<&Rc<PointerView>> {
		match self {
			Self::Pointer(view) => Some(view),
			_ => None,
		}
	}

	pub fn as_typed(&self) -> Option<&Rc<TypedArrayView>> {
		match self {
			Self::Typed(view) => Some(view),
			_ => None,
		}
	}

	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Self::Bytes(bytes) => Some(bytes),
			_ => None,
		}
	}

	/// The value as a view over a buffer, for bulk copies.
	pub fn as_buffer_view(&self) -> Option<&dyn BufferView> {
		match self {
			Self::Struct(view) => Some(view.as_ref()),
			Self::Pointer(view) => Some(view.as_ref()),
			Self::Typed(view) => Some(view.as_ref()),
			Self::Scalar(_) | Self::Bytes(_) => None,
		}
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Scalar(_) => "a scalar",
			Self::Struct(_) => "a struct view",
			Self::Pointer(_) => "a pointer view",
			Self::Typed(_) => "a typed array view",
			Self::Bytes(_) => "raw bytes",
		}
	}
}

/// Scalars and bytes compare by value, views by identity.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Scalar(a), Self::Scalar(b)) => a == b,
			(Self::Bytes(a), Self::Bytes(b)) => a == b,
			(Self::Struct(a), Self::Struct(b)) => Rc::ptr_eq(a, b),
			(Self::Pointer(a), Self::Pointer(b)) => Rc::ptr_eq(a, b),
			(Self::Typed(a), Self::Typed(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

macro_rules! impl_value_from_scalar {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Value {
				fn from(value: $ty) -> Self {
					Self::Scalar(value.into())
				}
			}
		)*
	};
}

impl_value_from_scalar!(Scalar, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64, bool);

impl From<Vec<u8>> for Value {
	fn from(bytes: Vec<u8>) -> Self {
		Self::Bytes(bytes)
	}
}

impl From<&[u8]> for Value {
	fn from(bytes: &[u8]) -> Self {
		Self::Bytes(bytes.to_vec())
	}
}

impl From<Rc<StructView>> for Value {
	fn from(view: Rc<StructView>) -> Self {
		Self::Struct(view)
	}
}

impl From<Rc<PointerView>> for Value {
	fn from(view: Rc<PointerView>) -> Self {
		Self::Pointer(view)
	}
}

impl From<Rc<TypedArrayView>> for Value {
	fn from(view: Rc<TypedArrayView>) -> Self {
		Self::Typed(view)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scalars_compare_by_value() {
		assert_eq!(Value::from(3_u8), Value::Scalar(Scalar::U8(3)));
		assert_ne!(Value::from(3_u8), Value::from(3_u16));
		assert_eq!(Value::from(true).as_scalar(), Some(Scalar::Bool(true)));
		assert_eq!(Value::from(vec![1, 2]).as_bytes(), Some(&[1, 2][..]));
		assert!(Value::from(1.5).as_buffer_view().is_none());
	}
}
