use core::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use bytemuck::Pod;
use strux_codec::ByteOrder;
use strux_codec::span;

use crate::ArrayBuffer;
use crate::BufferSource;
use crate::Element;
use crate::Member;
use crate::MemberKind;
use crate::PointerView;
use crate::Scalar;
use crate::ScalarKind;
use crate::TypeKind;
use crate::TypedArrayView;
use crate::Value;
use crate::ViewError;
use crate::ViewType;
use crate::log;
use crate::number::ToOffset;

/// A typed window into a shared [`ArrayBuffer`].
pub trait BufferView {
	fn buffer(&self) -> &ArrayBuffer;

	/// Signed offset of the view's first byte. It may lie outside the buffer;
	/// only accesses fault.
	fn byte_offset(&self) -> i64;

	/// Byte order used by members without an override.
	fn byte_order(&self) -> ByteOrder;

	fn byte_length(&self) -> usize;

	fn is_little_endian(&self) -> bool {
		self.byte_order().is_little_endian()
	}

	/// Copies the view's bytes out of the buffer.
	fn to_bytes(&self) -> Result<Vec<u8>, ViewError> {
		Ok(self
			.buffer()
			.read_bytes(self.byte_offset(), self.byte_length())?)
	}

	/// Overwrites this view's bytes with the first `byte_length` bytes of
	/// `source`. Overlapping views are handled. Composite setters assign
	/// through this.
	fn copy_from(&self, source: &dyn BufferView) -> Result<(), ViewError> {
		let bytes = source
			.buffer()
			.read_bytes(source.byte_offset(), self.byte_length())?;
		self.buffer().write_bytes(self.byte_offset(), &bytes)?;

		Ok(())
	}

	/// Reads a plain-old-data value from the start of the view.
	fn read_pod<T: Pod>(&self) -> Result<T, ViewError>
	where
		Self: Sized,
	{
		let bytes = self
			.buffer()
			.read_bytes(self.byte_offset(), size_of::<T>())?;

		Ok(bytemuck::pod_read_unaligned(&bytes))
	}

	/// Writes a plain-old-data value at the start of the view. Values wider
	/// than the view are rejected before any byte is written.
	fn write_pod<T: Pod>(&self, value: &T) -> Result<(), ViewError>
	where
		Self: Sized,
	{
		if size_of::<T>() > self.byte_length() {
			return Err(ViewError::range("plain-old-data width", size_of::<T>()));
		}

		self.buffer()
			.write_bytes(self.byte_offset(), bytemuck::bytes_of(value))?;

		Ok(())
	}
}

fn relative(offset: usize) -> i64 {
	i64::try_from(offset).unwrap_or(i64::MAX)
}

/// An untyped run of bytes inside a view, the target of bulk assignment.
struct ByteSpan<'a> {
	buffer: &'a ArrayBuffer,
	byte_offset: i64,
	byte_length: usize,
}

impl BufferView for ByteSpan<'_> {
	fn buffer(&self) -> &ArrayBuffer {
		self.buffer
	}

	fn byte_offset(&self) -> i64 {
		self.byte_offset
	}

	fn byte_order(&self) -> ByteOrder {
		ByteOrder::NATIVE
	}

	fn byte_length(&self) -> usize {
		self.byte_length
	}
}

/// State shared by struct and pointer views: where the view sits, how it
/// decodes, and the child views it has handed out.
#[derive(Debug)]
pub(crate) struct ViewCore {
	ty: Arc<ViewType>,
	buffer: ArrayBuffer,
	byte_offset: i64,
	order: ByteOrder,
	fields: RefCell<HashMap<String, Value>>,
	elements: RefCell<HashMap<i64, Value>>,
}

impl ViewCore {
	pub(crate) fn new(
		ty: &Arc<ViewType>,
		source: impl Into<BufferSource>,
		byte_offset: impl ToOffset,
		little_endian: Option<bool>,
	) -> Result<Self, ViewError> {
		let buffer = source.into().into_buffer()?;
		let byte_offset = byte_offset.to_offset()?;
		let order = little_endian.map_or(ByteOrder::NATIVE, ByteOrder::from_little_endian);

		Ok(Self::at(ty, buffer, byte_offset, order))
	}

	pub(crate) fn at(ty: &Arc<ViewType>, buffer: ArrayBuffer, byte_offset: i64, order: ByteOrder) -> Self {
		Self {
			ty: Arc::clone(ty),
			buffer,
			byte_offset,
			order,
			fields: RefCell::default(),
			elements: RefCell::default(),
		}
	}

	pub(crate) fn ty(&self) -> &Arc<ViewType> {
		&self.ty
	}

	pub(crate) fn buffer(&self) -> &ArrayBuffer {
		&self.buffer
	}

	pub(crate) fn byte_offset(&self) -> i64 {
		self.byte_offset
	}

	pub(crate) fn order(&self) -> ByteOrder {
		self.order
	}

	fn absolute(&self, relative: i64) -> i64 {
		self.byte_offset.saturating_add(relative)
	}

	/// Byte offset of element `index`, relative to the view.
	fn element_offset(&self, index: i64) -> i64 {
		index.saturating_mul(relative(self.ty.stride()))
	}

	fn read_scalar(&self, kind: ScalarKind, relative: i64, order: ByteOrder) -> Result<Scalar, ViewError> {
		let offset = self.absolute(relative);
		Ok(self.buffer.read(|bytes| kind.read(bytes, offset, order))?)
	}

	fn write_scalar(&self, kind: ScalarKind, relative: i64, value: &Value, order: ByteOrder) -> Result<(), ViewError> {
		let Some(scalar) = value.as_scalar() else {
			return Err(ViewError::mismatch("a scalar", value.type_name()));
		};
		let offset = self.absolute(relative);

		Ok(self
			.buffer
			.write(|bytes| kind.write(bytes, offset, scalar, order))?)
	}

	/// Materializes a child view of `ty` at `relative`.
	fn child(&self, ty: &Arc<ViewType>, relative: i64, order: ByteOrder) -> Value {
		let core = Self::at(ty, self.buffer.clone(), self.absolute(relative), order);
		log!(
			"materialized `{}` view at {} in `{}`",
			ty.name(),
			core.byte_offset,
			self.ty.name()
		);

		match ty.kind() {
			TypeKind::Struct | TypeKind::Union => Value::Struct(Rc::new(StructView { core })),
			TypeKind::Pointer | TypeKind::Array => Value::Pointer(Rc::new(PointerView::from_core(core, ty.length()))),
		}
	}

	fn cached_field(&self, name: &str, create: impl FnOnce() -> Value) -> Value {
		if let Some(value) = self.fields.borrow().get(name) {
			return value.clone();
		}

		let value = create();
		self.fields.borrow_mut().insert(name.to_owned(), value.clone());
		value
	}

	/// Reads a member declared on this view's type chain.
	pub(crate) fn read(&self, member: &Member) -> Result<Value, ViewError> {
		let offset = relative(member.byte_offset());
		let order = ByteOrder::resolve(member.endian(), self.order);

		match member.kind() {
			MemberKind::Scalar(kind) => Ok(Value::Scalar(self.read_scalar(*kind, offset, order)?)),
			MemberKind::Padding => Ok(Value::Bytes(
				self.buffer
					.read_bytes(self.absolute(offset), member.byte_length())?,
			)),
			MemberKind::Struct(ty) | MemberKind::Array(ty) => {
				Ok(self.cached_field(member.name(), || self.child(ty, offset, order)))
			}
			MemberKind::View { kind, length } => Ok(self.cached_field(member.name(), || {
				Value::Typed(Rc::new(TypedArrayView::new(
					&self.buffer,
					self.absolute(offset),
					*kind,
					*length,
				)))
			})),
			MemberKind::Element { index } => self.read_element(relative(*index)),
		}
	}

	/// Writes a member declared on this view's type chain.
	pub(crate) fn write(&self, member: &Member, value: &Value) -> Result<(), ViewError> {
		let offset = relative(member.byte_offset());

		match member.kind() {
			MemberKind::Scalar(kind) => {
				let order = ByteOrder::resolve(member.endian(), self.order);
				self.write_scalar(*kind, offset, value, order)
			}
			MemberKind::Padding => Err(ViewError::ImmutableField {
				name: member.name().to_owned(),
			}),
			MemberKind::Struct(_) | MemberKind::Array(_) | MemberKind::View { .. } => {
				self.copy_into(offset, member.byte_length(), value)
			}
			MemberKind::Element { index } => self.write_element(relative(*index), value),
		}
	}

	/// Reads element `index` of this view's element type. Bounds are the
	/// caller's concern; the codec faults outside the buffer.
	pub(crate) fn read_element(&self, index: i64) -> Result<Value, ViewError> {
		let offset = self.element_offset(index);

		match self.element()? {
			Element::Scalar(kind) => Ok(Value::Scalar(self.read_scalar(*kind, offset, self.order)?)),
			Element::Composite(ty) => {
				if let Some(value) = self.elements.borrow().get(&index) {
					return Ok(value.clone());
				}

				let value = self.child(ty, offset, self.order);
				self.elements.borrow_mut().insert(index, value.clone());
				Ok(value)
			}
		}
	}

	pub(crate) fn write_element(&self, index: i64, value: &Value) -> Result<(), ViewError> {
		let offset = self.element_offset(index);

		match self.element()? {
			Element::Scalar(kind) => self.write_scalar(*kind, offset, value, self.order),
			Element::Composite(ty) => self.copy_into(offset, ty.byte_length(), value),
		}
	}

	fn element(&self) -> Result<&Element, ViewError> {
		self.ty
			.element()
			.ok_or_else(|| ViewError::mismatch("an indexed type", self.ty.name()))
	}

	/// Bulk assignment of a composite member: the bytes of a source view, or
	/// raw bytes, replace `byte_length` bytes at `relative`. Child views
	/// already handed out keep their identity and observe the new bytes.
	fn copy_into(&self, relative: i64, byte_length: usize, value: &Value) -> Result<(), ViewError> {
		let target = ByteSpan {
			buffer: &self.buffer,
			byte_offset: self.absolute(relative),
			byte_length,
		};

		match value {
			Value::Bytes(bytes) => {
				let bytes = &bytes[span(bytes.len(), 0, byte_length)?];
				self.buffer.write_bytes(target.byte_offset, bytes)?;
				Ok(())
			}
			other => {
				let Some(source) = other.as_buffer_view() else {
					return Err(ViewError::mismatch("a view or raw bytes", other.type_name()));
				};
				target.copy_from(source)
			}
		}
	}
}

/// A view over a struct or union type with named member access.
///
/// ```
/// use strux::ArrayBuffer;
/// use strux::StructView;
/// use strux::TypeBuilder;
///
/// let mut builder = TypeBuilder::structure("Pair");
/// let mut offset = 0;
/// offset += builder.define_u32("alpha", offset, None);
/// builder.define_u32("beta", offset, None);
/// let pair = builder.finish();
///
/// let buffer = ArrayBuffer::new(8);
/// let view = StructView::new(&pair, &buffer, 0, Some(true))?;
/// view.set_u32("alpha", 0x1234_5678)?;
///
/// assert_eq!(buffer.to_vec(), [0x78, 0x56, 0x34, 0x12, 0, 0, 0, 0]);
/// assert_eq!(view.get_u32("beta")?, 0);
/// # Ok::<(), strux::ViewError>(())
/// ```
#[derive(Debug)]
pub struct StructView {
	core: ViewCore,
}

macro_rules! typed_accessors {
	($($ty:ident => $variant:ident),* $(,)?) => {
		pastey::paste! {
			$(
				#[doc = "Reads a member that decodes to `" $ty "`."]
				pub fn [<get_ $ty>](&self, name: &str) -> Result<$ty, ViewError> {
					match self.get(name)? {
						Value::Scalar(Scalar::$variant(value)) => Ok(value),
						other => Err(ViewError::mismatch(stringify!($ty), other.type_name())),
					}
				}

				#[doc = "Writes a `" $ty "` into a scalar member of any kind."]
				pub fn [<set_ $ty>](&self, name: &str, value: $ty) -> Result<(), ViewError> {
					self.set(name, value)
				}
			)*
		}
	};
}

impl StructView {
	/// Creates a view of `ty` over `source` at `byte_offset`.
	///
	/// `source` must be an [`ArrayBuffer`]. The offset must be a safe
	/// integer (fractions truncate, `NaN` is zero) but is not checked
	/// against the buffer. `little_endian` picks the byte order for members
	/// without an override and defaults to the host order.
	pub fn new(
		ty: &Arc<ViewType>,
		source: impl Into<BufferSource>,
		byte_offset: impl ToOffset,
		little_endian: Option<bool>,
	) -> Result<Self, ViewError> {
		if !matches!(ty.kind(), TypeKind::Struct | TypeKind::Union) {
			return Err(ViewError::mismatch("a struct or union type", ty.name()));
		}

		Ok(Self {
			core: ViewCore::new(ty, source, byte_offset, little_endian)?,
		})
	}

	pub fn view_type(&self) -> &Arc<ViewType> {
		self.core.ty()
	}

	pub fn has(&self, name: &str) -> bool {
		self.core.ty().member(name).is_some()
	}

	pub fn member(&self, name: &str) -> Result<Arc<Member>, ViewError> {
		self.core
			.ty()
			.member(name)
			.ok_or_else(|| ViewError::UnknownMember {
				type_name: self.core.ty().name().to_owned(),
				name: name.to_owned(),
			})
	}

	pub fn members(&self) -> Vec<Arc<Member>> {
		self.core.ty().members()
	}

	/// Reads a member. Composite members return the same child view on
	/// every call.
	pub fn get(&self, name: &str) -> Result<Value, ViewError> {
		let member = self.member(name)?;
		self.core.read(&member)
	}

	/// Writes a member. Scalars wrap to the member's width; composite
	/// members copy the bytes of a view or byte vector.
	pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), ViewError> {
		let member = self.member(name)?;
		self.core.write(&member, &value.into())
	}

	typed_accessors!(
		i8 => I8,
		u8 => U8,
		i16 => I16,
		u16 => U16,
		i32 => I32,
		u32 => U32,
		i64 => I64,
		u64 => U64,
		f32 => F32,
		f64 => F64,
		bool => Bool,
	);

	pub fn get_struct(&self, name: &str) -> Result<Rc<StructView>, ViewError> {
		match self.get(name)? {
			Value::Struct(view) => Ok(view),
			other => Err(ViewError::mismatch("a struct view", other.type_name())),
		}
	}

	pub fn get_array(&self, name: &str) -> Result<Rc<PointerView>, ViewError> {
		match self.get(name)? {
			Value::Pointer(view) => Ok(view),
			other => Err(ViewError::mismatch("a pointer view", other.type_name())),
		}
	}

	pub fn get_view(&self, name: &str) -> Result<Rc<TypedArrayView>, ViewError> {
		match self.get(name)? {
			Value::Typed(view) => Ok(view),
			other => Err(ViewError::mismatch("a typed array view", other.type_name())),
		}
	}
}

impl BufferView for StructView {
	fn buffer(&self) -> &ArrayBuffer {
		self.core.buffer()
	}

	fn byte_offset(&self) -> i64 {
		self.core.byte_offset()
	}

	fn byte_order(&self) -> ByteOrder {
		self.core.order()
	}

	fn byte_length(&self) -> usize {
		self.core.ty().byte_length()
	}
}
