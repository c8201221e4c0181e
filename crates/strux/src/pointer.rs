use std::sync::Arc;

use strux_codec::ByteOrder;

use crate::ArrayBuffer;
use crate::BufferSource;
use crate::BufferView;
use crate::Element;
use crate::Member;
use crate::PropertyKey;
use crate::Scalar;
use crate::TypeKind;
use crate::Value;
use crate::ViewError;
use crate::ViewType;
use crate::log;
use crate::number::ToIntegerOrInfinity;
use crate::number::ToLength;
use crate::number::ToOffset;
use crate::view::ViewCore;

const LENGTH: &str = "length";

/// An element-indexed view with a fixed stride.
///
/// Without a length every integer index is a slot, negative ones included,
/// and accesses fault only when they leave the buffer. With a length (a
/// fixed array type, or [`PointerView::with_length`]) indices outside
/// `0..length` read as `None` and writes to them are discarded.
#[derive(Debug)]
pub struct PointerView {
	core: ViewCore,
	length: Option<usize>,
}

impl PointerView {
	/// Creates a view of a pointer or fixed array type. Fixed array types
	/// bring their own length.
	pub fn new(
		ty: &Arc<ViewType>,
		source: impl Into<BufferSource>,
		byte_offset: impl ToOffset,
		little_endian: Option<bool>,
	) -> Result<Self, ViewError> {
		Self::check_indexed(ty)?;
		let core = ViewCore::new(ty, source, byte_offset, little_endian)?;

		Ok(Self::from_core(core, ty.length()))
	}

	/// Creates a bounded view of `length` elements.
	pub fn with_length(
		ty: &Arc<ViewType>,
		source: impl Into<BufferSource>,
		byte_offset: impl ToOffset,
		length: impl ToLength,
		little_endian: Option<bool>,
	) -> Result<Self, ViewError> {
		Self::check_indexed(ty)?;
		let core = ViewCore::new(ty, source, byte_offset, little_endian)?;
		let length = length.to_length()?;

		Ok(Self::from_core(core, Some(length)))
	}

	fn check_indexed(ty: &ViewType) -> Result<(), ViewError> {
		match ty.kind() {
			TypeKind::Pointer | TypeKind::Array => Ok(()),
			TypeKind::Struct | TypeKind::Union => Err(ViewError::mismatch("a pointer or array type", ty.name())),
		}
	}

	pub(crate) fn from_core(core: ViewCore, length: Option<usize>) -> Self {
		Self { core, length }
	}

	pub fn view_type(&self) -> &Arc<ViewType> {
		self.core.ty()
	}

	/// `None` for an unbounded pointer.
	pub fn length(&self) -> Option<usize> {
		self.length
	}

	/// Number of addressable elements; zero for an unbounded pointer.
	pub fn len(&self) -> usize {
		self.length.unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn stride(&self) -> usize {
		self.core.ty().stride()
	}

	pub fn element(&self) -> Option<&Element> {
		self.core.ty().element()
	}

	fn in_bounds(&self, index: i64) -> bool {
		match self.length {
			None => true,
			Some(length) => usize::try_from(index).is_ok_and(|index| index < length),
		}
	}

	/// Reads element `index`. Composite elements return the same child view
	/// on every call.
	pub fn get(&self, index: i64) -> Result<Option<Value>, ViewError> {
		if !self.in_bounds(index) {
			return Ok(None);
		}

		self.core.read_element(index).map(Some)
	}

	/// Writes element `index`. Composite elements copy the source's bytes
	/// into the existing child.
	pub fn set(&self, index: i64, value: impl Into<Value>) -> Result<(), ViewError> {
		if !self.in_bounds(index) {
			log!("discarded write to index {} of `{}`", index, self.core.ty().name());
			return Ok(());
		}

		self.core.write_element(index, &value.into())
	}

	/// Relative indexing: negative indices count back from the end.
	///
	/// The index is coerced to an integer first (fractions truncate, `NaN`
	/// and `false` are zero, numeric strings parse). Unbounded pointers have
	/// no end and always return `None`.
	pub fn at(&self, index: impl ToIntegerOrInfinity) -> Result<Option<Value>, ViewError> {
		let Some(length) = self.length else {
			return Ok(None);
		};

		let relative = index.to_integer_or_infinity();
		let length = length as f64;
		let index = if relative >= 0.0 { relative } else { length + relative };

		if index < 0.0 || index >= length {
			return Ok(None);
		}

		self.get(index as i64)
	}

	/// Reads a property by key: indices address elements, `length` the
	/// bound, any other name the type's member chain. Indices of a fixed
	/// array type resolve through the type's index entries.
	pub fn property(&self, key: impl Into<PropertyKey>) -> Result<Option<Value>, ViewError> {
		match key.into() {
			PropertyKey::Index(index) => {
				if !self.in_bounds(index) {
					return Ok(None);
				}

				match self.index_member(index) {
					Some(member) => self.core.read(&member).map(Some),
					None => self.core.read_element(index).map(Some),
				}
			}
			PropertyKey::Invalid => Ok(None),
			PropertyKey::Named(name) => {
				if let (LENGTH, Some(length)) = (name.as_str(), self.length) {
					return Ok(Some(Value::Scalar(Scalar::U64(length as u64))));
				}

				let member = self.named_member(&name)?;
				self.core.read(&member).map(Some)
			}
		}
	}

	pub fn set_property(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Result<(), ViewError> {
		match key.into() {
			PropertyKey::Index(index) => {
				if !self.in_bounds(index) {
					return self.set(index, value);
				}

				match self.index_member(index) {
					Some(member) => self.core.write(&member, &value.into()),
					None => self.core.write_element(index, &value.into()),
				}
			}
			PropertyKey::Invalid => Ok(()),
			PropertyKey::Named(name) => {
				if name == LENGTH && self.length.is_some() {
					return Err(ViewError::ImmutableField { name });
				}

				let member = self.named_member(&name)?;
				self.core.write(&member, &value.into())
			}
		}
	}

	pub fn has_property(&self, key: impl Into<PropertyKey>) -> bool {
		match key.into() {
			PropertyKey::Index(index) => self.in_bounds(index),
			PropertyKey::Invalid => false,
			PropertyKey::Named(name) => {
				(name == LENGTH && self.length.is_some()) || self.core.ty().member(&name).is_some()
			}
		}
	}

	/// Elements cannot be deleted: returns `false` for an addressable index
	/// and `true`, changing nothing, otherwise.
	pub fn delete_property(&self, key: impl Into<PropertyKey>) -> bool {
		match key.into() {
			PropertyKey::Index(index) => !self.in_bounds(index),
			PropertyKey::Invalid | PropertyKey::Named(_) => true,
		}
	}

	fn index_member(&self, index: i64) -> Option<Arc<Member>> {
		self.core.ty().lookup(&PropertyKey::Index(index))
	}

	fn named_member(&self, name: &str) -> Result<Arc<Member>, ViewError> {
		self.core
			.ty()
			.member(name)
			.ok_or_else(|| ViewError::UnknownMember {
				type_name: self.core.ty().name().to_owned(),
				name: name.to_owned(),
			})
	}

	/// Indices of a bounded view; empty for an unbounded pointer.
	pub fn keys(&self) -> impl Iterator<Item = i64> + use<> {
		0..self.len() as i64
	}

	pub fn iter(&self) -> impl Iterator<Item = Result<Value, ViewError>> + '_ {
		self.keys().map(|index| self.core.read_element(index))
	}

	pub fn to_vec(&self) -> Result<Vec<Value>, ViewError> {
		self.iter().collect()
	}

	/// A fresh view `delta` elements away, with the same type, length and
	/// byte order.
	#[must_use]
	pub fn offset(&self, delta: i64) -> Self {
		let byte_offset = self
			.core
			.byte_offset()
			.saturating_add(delta.saturating_mul(self.stride() as i64));
		let core = ViewCore::at(self.core.ty(), self.core.buffer().clone(), byte_offset, self.core.order());

		Self::from_core(core, self.length)
	}
}

impl BufferView for PointerView {
	fn buffer(&self) -> &ArrayBuffer {
		self.core.buffer()
	}

	fn byte_offset(&self) -> i64 {
		self.core.byte_offset()
	}

	fn byte_order(&self) -> ByteOrder {
		self.core.order()
	}

	/// The bound times the stride, or one element for an unbounded pointer.
	fn byte_length(&self) -> usize {
		match self.length {
			Some(length) => length.saturating_mul(self.stride()),
			None => self.core.ty().byte_length(),
		}
	}
}
