//! Type objects and the registration API that builds them.
//!
//! A [`ViewType`] is the metadata shared by every view of one layout: its
//! own member table, a link to the parent type whose members it inherits,
//! and for pointer and array types the element they index. Types are built
//! once with a [`TypeBuilder`] and are immutable afterwards, apart from the
//! monotonic caches of synthesized index entries and derived array types.

use core::fmt;
use core::fmt::Write as _;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use strux_codec::ByteOrder;

use crate::Member;
use crate::MemberKind;
use crate::PropertyKey;
use crate::ScalarKind;
use crate::ViewError;
use crate::log;
use crate::member::MemberTable;
use crate::number::ToLength;

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
	/// Members occupy disjoint byte ranges.
	Struct,
	/// Members overlap from offset zero.
	Union,
	/// Unbounded element-indexed view.
	Pointer,
	/// Element-indexed view with a fixed length.
	Array,
}

/// The element a pointer or array type indexes.
#[derive(Clone, Debug)]
pub enum Element {
	Scalar(ScalarKind),
	Composite(Arc<ViewType>),
}

impl Element {
	/// Bytes per element.
	pub fn stride(&self) -> usize {
		match self {
			Self::Scalar(kind) => kind.byte_length(),
			Self::Composite(ty) => ty.byte_length(),
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Scalar(kind) => kind.name(),
			Self::Composite(ty) => ty.name(),
		}
	}
}

pub struct ViewType {
	id: u64,
	name: String,
	kind: TypeKind,
	parent: Option<Arc<ViewType>>,
	/// `None` until the type registers a member of its own.
	members: Option<MemberTable>,
	byte_length: usize,
	element: Option<Element>,
	length: Option<usize>,
	index_members: Mutex<HashMap<usize, Arc<Member>>>,
}

impl ViewType {
	fn new(builder: TypeBuilder, byte_length: usize) -> Self {
		Self {
			id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
			name: builder.name,
			kind: builder.kind,
			parent: builder.parent,
			members: builder.members,
			byte_length,
			element: builder.element,
			length: builder.length,
			index_members: Mutex::default(),
		}
	}

	/// Process-unique identifier of this type object.
	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> TypeKind {
		self.kind
	}

	pub fn parent(&self) -> Option<&Arc<ViewType>> {
		self.parent.as_ref()
	}

	/// Declared size of one instance in bytes.
	pub fn byte_length(&self) -> usize {
		self.byte_length
	}

	pub fn element(&self) -> Option<&Element> {
		self.element.as_ref()
	}

	/// Element count of a fixed array type.
	pub fn length(&self) -> Option<usize> {
		self.length
	}

	/// Bytes per element for pointer and array types, the byte length
	/// otherwise.
	pub fn stride(&self) -> usize {
		self.element
			.as_ref()
			.map_or(self.byte_length, Element::stride)
	}

	/// Whether `ancestor` is this type or appears in its parent chain.
	pub fn is_subtype_of(&self, ancestor: &ViewType) -> bool {
		let mut current = Some(self);
		while let Some(ty) = current {
			if ty.id == ancestor.id {
				return true;
			}
			current = ty.parent.as_deref();
		}
		false
	}

	/// Looks `name` up in this type's table, then along the parent chain.
	pub fn member(&self, name: &str) -> Option<Arc<Member>> {
		let mut current = Some(self);
		while let Some(ty) = current {
			if let Some(member) = ty.members.as_ref().and_then(|table| table.get(name)) {
				return Some(Arc::clone(member));
			}
			current = ty.parent.as_deref();
		}
		None
	}

	/// The index entry of a fixed array type, synthesized on first access.
	pub fn member_at(&self, index: usize) -> Option<Arc<Member>> {
		let length = self.length?;
		if index >= length {
			return None;
		}

		let stride = self.stride();
		let mut entries = lock(&self.index_members);
		let entry = entries.entry(index).or_insert_with(|| {
			Arc::new(
				Member::builder()
					.name(index.to_string())
					.byte_offset(index * stride)
					.byte_length(stride)
					.kind(MemberKind::Element { index })
					.build(),
			)
		});

		Some(Arc::clone(entry))
	}

	#[cfg(test)]
	pub(crate) fn index_entry_count(&self) -> usize {
		lock(&self.index_members).len()
	}

	pub fn lookup(&self, key: &PropertyKey) -> Option<Arc<Member>> {
		match key {
			PropertyKey::Named(name) => self.member(name),
			PropertyKey::Index(index) => usize::try_from(*index).ok().and_then(|index| self.member_at(index)),
			PropertyKey::Invalid => None,
		}
	}

	/// Every member visible on this type in declaration order; members
	/// redeclared by a subtype replace the inherited entry.
	pub fn members(&self) -> Vec<Arc<Member>> {
		let mut visible = self
			.parent
			.as_ref()
			.map(|parent| parent.members())
			.unwrap_or_default();

		for member in self.members.iter().flat_map(MemberTable::iter) {
			match visible.iter_mut().find(|seen| seen.name() == member.name()) {
				Some(slot) => *slot = Arc::clone(member),
				None => visible.push(Arc::clone(member)),
			}
		}

		visible
	}

	/// Members this type declares itself.
	pub fn own_members(&self) -> Vec<Arc<Member>> {
		self.members
			.iter()
			.flat_map(MemberTable::iter)
			.cloned()
			.collect()
	}

	/// A human readable layout dump, one line per visible member.
	pub fn describe(&self) -> String {
		let mut out = format!("{:?} {} ({} bytes)", self.kind, self.name, self.byte_length);

		if let Some(element) = &self.element {
			let _ = write!(out, " of {}", element.name());
			if let Some(length) = self.length {
				let _ = write!(out, " x {length}");
			}
		}

		for member in self.members() {
			let start = member.byte_offset();
			let end = start.saturating_add(member.byte_length());
			let _ = write!(out, "\n  {start:>4}..{end:<4} {}: {}", member.name(), member.kind());
			match member.endian() {
				Some(ByteOrder::Little) => out.push_str(" (le)"),
				Some(ByteOrder::Big) => out.push_str(" (be)"),
				None => {}
			}
		}

		out
	}
}

impl fmt::Debug for ViewType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ViewType")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("byte_length", &self.byte_length)
			.finish_non_exhaustive()
	}
}

/// Builds a [`ViewType`] one member at a time.
///
/// Every `define_*` call returns the byte length of the member it
/// registered, so offsets can be threaded through:
///
/// ```
/// use strux::TypeBuilder;
///
/// let mut builder = TypeBuilder::structure("Header");
/// let mut offset = 0;
/// offset += builder.define_u32("magic", offset, None);
/// offset += builder.define_u16("version", offset, None);
/// let header = builder.finish();
///
/// assert_eq!(offset, 6);
/// assert_eq!(header.byte_length(), 6);
/// ```
#[derive(Debug)]
pub struct TypeBuilder {
	name: String,
	kind: TypeKind,
	parent: Option<Arc<ViewType>>,
	members: Option<MemberTable>,
	byte_length: Option<usize>,
	element: Option<Element>,
	length: Option<usize>,
}

macro_rules! define_scalar_members {
	($($method:ident => $kind:ident),* $(,)?) => {
		pastey::paste! {
			$(
				#[doc = "Registers a `" $method "` member and returns its byte length."]
				pub fn [<define_ $method>](
					&mut self,
					name: impl Into<String>,
					byte_offset: usize,
					endian: Option<ByteOrder>,
				) -> usize {
					self.define_scalar(name, byte_offset, ScalarKind::$kind, endian)
				}
			)*
		}
	};
}

impl TypeBuilder {
	fn new(name: impl Into<String>, kind: TypeKind, element: Option<Element>) -> Self {
		Self {
			name: name.into(),
			kind,
			parent: None,
			members: None,
			byte_length: None,
			element,
			length: None,
		}
	}

	pub fn structure(name: impl Into<String>) -> Self {
		Self::new(name, TypeKind::Struct, None)
	}

	pub fn union(name: impl Into<String>) -> Self {
		Self::new(name, TypeKind::Union, None)
	}

	/// A pointer type over `element`. Its members, if any, are read relative
	/// to the pointer's own offset, i.e. through element zero.
	pub fn pointer(name: impl Into<String>, element: Element) -> Self {
		Self::new(name, TypeKind::Pointer, Some(element))
	}

	/// Inherits every member of `parent`. A pointer builder without an
	/// element also inherits the parent's element.
	#[must_use]
	pub fn extends(mut self, parent: &Arc<ViewType>) -> Self {
		if self.element.is_none() && self.kind == TypeKind::Pointer {
			self.element = parent.element.clone();
		}
		self.parent = Some(Arc::clone(parent));
		self
	}

	/// Declares the type's byte length instead of deriving it from the
	/// member extents.
	#[must_use]
	pub fn with_byte_length(mut self, byte_length: usize) -> Self {
		self.byte_length = Some(byte_length);
		self
	}

	/// Adds `member` to this type's own table, creating the table on first
	/// use, and returns the member's byte length.
	pub fn register(&mut self, member: Member) -> usize {
		let byte_length = member.byte_length();
		log!(
			"{}: registering `{}` at {} ({} bytes)",
			self.name,
			member.name(),
			member.byte_offset(),
			byte_length
		);
		self.members.get_or_insert_with(MemberTable::default).insert(member);
		byte_length
	}

	pub fn define_scalar(
		&mut self,
		name: impl Into<String>,
		byte_offset: usize,
		kind: ScalarKind,
		endian: Option<ByteOrder>,
	) -> usize {
		self.register(
			Member::builder()
				.name(name)
				.byte_offset(byte_offset)
				.byte_length(kind.byte_length())
				.endian(endian)
				.kind(MemberKind::Scalar(kind))
				.build(),
		)
	}

	define_scalar_members!(
		i8 => I8,
		u8 => U8,
		i16 => I16,
		u16 => U16,
		i24 => I24,
		u24 => U24,
		i32 => I32,
		u32 => U32,
		i64 => I64,
		u64 => U64,
		f16 => F16,
		f32 => F32,
		f64 => F64,
		bool8 => Bool8,
		bool16 => Bool16,
		bool32 => Bool32,
	);

	/// Reserves `byte_length` bytes that can be read but never assigned.
	pub fn define_padding(&mut self, name: impl Into<String>, byte_offset: usize, byte_length: usize) -> usize {
		self.register(
			Member::builder()
				.name(name)
				.byte_offset(byte_offset)
				.byte_length(byte_length)
				.kind(MemberKind::Padding)
				.build(),
		)
	}

	/// Embeds a struct or union. The child view inherits this view's byte
	/// order unless `endian` overrides it.
	pub fn define_struct(
		&mut self,
		name: impl Into<String>,
		byte_offset: usize,
		ty: &Arc<ViewType>,
		endian: Option<ByteOrder>,
	) -> usize {
		self.define_composite(name, byte_offset, ty, endian)
	}

	/// Embeds a pointer or fixed array type.
	pub fn define_array(
		&mut self,
		name: impl Into<String>,
		byte_offset: usize,
		ty: &Arc<ViewType>,
		endian: Option<ByteOrder>,
	) -> usize {
		self.define_composite(name, byte_offset, ty, endian)
	}

	fn define_composite(
		&mut self,
		name: impl Into<String>,
		byte_offset: usize,
		ty: &Arc<ViewType>,
		endian: Option<ByteOrder>,
	) -> usize {
		let kind = match ty.kind() {
			TypeKind::Struct | TypeKind::Union => MemberKind::Struct(Arc::clone(ty)),
			TypeKind::Pointer | TypeKind::Array => MemberKind::Array(Arc::clone(ty)),
		};

		self.register(
			Member::builder()
				.name(name)
				.byte_offset(byte_offset)
				.byte_length(ty.byte_length())
				.endian(endian)
				.kind(kind)
				.build(),
		)
	}

	/// Exposes `length` scalars of `kind` as a host byte order typed view.
	pub fn define_view(
		&mut self,
		name: impl Into<String>,
		byte_offset: usize,
		kind: ScalarKind,
		length: usize,
	) -> usize {
		self.register(
			Member::builder()
				.name(name)
				.byte_offset(byte_offset)
				.byte_length(kind.byte_length().saturating_mul(length))
				.kind(MemberKind::View { kind, length })
				.build(),
		)
	}

	/// Freezes the builder into a shared type object.
	///
	/// Without an explicit byte length, struct and union types span the
	/// furthest member extent along the whole chain (and at least the
	/// parent's length); pointer types span one element.
	pub fn finish(self) -> Arc<ViewType> {
		let byte_length = self.byte_length.unwrap_or_else(|| self.derived_byte_length());
		let ty = Arc::new(ViewType::new(self, byte_length));

		log!(
			"finished {:?} `{}` ({} bytes, {} own members)",
			ty.kind,
			ty.name,
			ty.byte_length,
			ty.members.as_ref().map_or(0, MemberTable::len)
		);

		ty
	}

	fn derived_byte_length(&self) -> usize {
		if let Some(element) = &self.element {
			return element.stride().saturating_mul(self.length.unwrap_or(1));
		}

		let inherited = self.parent.as_ref().map_or(0, |parent| parent.byte_length());
		self.members
			.iter()
			.flat_map(MemberTable::iter)
			.map(|member| member.byte_offset().saturating_add(member.byte_length()))
			.fold(inherited, usize::max)
	}
}

/// The memoized pointer type over a scalar kind.
pub fn pointer_of(kind: ScalarKind) -> Arc<ViewType> {
	static POINTERS: OnceLock<Mutex<HashMap<ScalarKind, Arc<ViewType>>>> = OnceLock::new();

	let mut pointers = lock(POINTERS.get_or_init(Mutex::default));
	let pointer = pointers
		.entry(kind)
		.or_insert_with(|| TypeBuilder::pointer(format!("{kind}*"), Element::Scalar(kind)).finish());

	Arc::clone(pointer)
}

/// The memoized pointer type over a composite type.
///
/// The pointer inherits `ty`'s members, so named access through the pointer
/// reads element zero. Pointer types are never evicted: once created, the
/// same object is returned for `ty` for the rest of the process.
pub fn pointer_to(ty: &Arc<ViewType>) -> Arc<ViewType> {
	static POINTERS: OnceLock<Mutex<HashMap<u64, Arc<ViewType>>>> = OnceLock::new();

	let mut pointers = lock(POINTERS.get_or_init(Mutex::default));
	let pointer = pointers.entry(ty.id()).or_insert_with(|| {
		TypeBuilder::pointer(format!("{}*", ty.name()), Element::Composite(Arc::clone(ty)))
			.extends(ty)
			.finish()
	});

	Arc::clone(pointer)
}

/// The fixed array type of `length` elements of `pointer`.
///
/// Identical `(pointer, length)` pairs always resolve to the same type
/// object, whether or not an earlier result is still held. Passing a
/// non-pointer type uses [`pointer_to`] of it.
pub fn array_of(pointer: &Arc<ViewType>, length: impl ToLength) -> Result<Arc<ViewType>, ViewError> {
	static ARRAYS: OnceLock<Mutex<HashMap<(u64, usize), Arc<ViewType>>>> = OnceLock::new();

	let length = length.to_length()?;
	let pointer = match pointer.kind() {
		TypeKind::Pointer => Arc::clone(pointer),
		_ => pointer_to(pointer),
	};

	let mut arrays = lock(ARRAYS.get_or_init(Mutex::default));
	if let Some(array) = arrays.get(&(pointer.id(), length)) {
		return Ok(Arc::clone(array));
	}

	let Some(element) = pointer.element.clone() else {
		return Err(ViewError::mismatch("a pointer type", pointer.name()));
	};
	let byte_length = element
		.stride()
		.checked_mul(length)
		.ok_or_else(|| ViewError::range("array byte length", length))?;

	let mut builder = TypeBuilder::new(format!("{}[{length}]", element.name()), TypeKind::Array, Some(element));
	builder.length = Some(length);
	let array = builder.extends(&pointer).with_byte_length(byte_length).finish();
	arrays.insert((pointer.id(), length), Arc::clone(&array));

	Ok(array)
}
