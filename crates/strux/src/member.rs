use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use strux_codec::ByteOrder;
use typed_builder::TypedBuilder;

use crate::ScalarKind;
use crate::ViewType;

/// What a member reads and writes.
#[derive(Clone, Debug)]
pub enum MemberKind {
	Scalar(ScalarKind),
	/// Reserved bytes. Readable as raw bytes, never writable.
	Padding,
	/// A nested struct or union, materialized as a child view.
	Struct(Arc<ViewType>),
	/// A nested pointer or fixed array, materialized as a child view.
	Array(Arc<ViewType>),
	/// A host-order typed view of `length` scalars.
	View { kind: ScalarKind, length: usize },
	/// An index entry synthesized by a fixed array type.
	Element { index: usize },
}

impl fmt::Display for MemberKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Scalar(kind) => write!(f, "{kind}"),
			Self::Padding => f.write_str("padding"),
			Self::Struct(ty) | Self::Array(ty) => f.write_str(ty.name()),
			Self::View { kind, length } => write!(f, "[{kind}; {length}]"),
			Self::Element { index } => write!(f, "element {index}"),
		}
	}
}

/// Layout metadata for one named member of a type.
#[derive(Clone, Debug, TypedBuilder)]
pub struct Member {
	#[builder(setter(into))]
	name: String,
	byte_offset: usize,
	byte_length: usize,
	/// Overrides the owning view's byte order when set.
	#[builder(default)]
	endian: Option<ByteOrder>,
	kind: MemberKind,
}

impl Member {
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Offset relative to the start of the owning view.
	pub fn byte_offset(&self) -> usize {
		self.byte_offset
	}

	pub fn byte_length(&self) -> usize {
		self.byte_length
	}

	pub fn endian(&self) -> Option<ByteOrder> {
		self.endian
	}

	pub fn kind(&self) -> &MemberKind {
		&self.kind
	}
}

/// The members a single type declares itself, in registration order.
#[derive(Clone, Debug, Default)]
pub(crate) struct MemberTable {
	entries: Vec<Arc<Member>>,
	positions: HashMap<String, usize>,
}

impl MemberTable {
	/// Inserts `member`, replacing an earlier entry with the same name in
	/// place.
	pub(crate) fn insert(&mut self, member: Member) {
		let member = Arc::new(member);

		match self.positions.get(member.name()) {
			Some(&position) => self.entries[position] = member,
			None => {
				self.positions
					.insert(member.name().to_owned(), self.entries.len());
				self.entries.push(member);
			}
		}
	}

	pub(crate) fn get(&self, name: &str) -> Option<&Arc<Member>> {
		self.positions
			.get(name)
			.and_then(|&position| self.entries.get(position))
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<Member>> {
		self.entries.iter()
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scalar(name: &str, byte_offset: usize, kind: ScalarKind) -> Member {
		Member::builder()
			.name(name)
			.byte_offset(byte_offset)
			.byte_length(kind.byte_length())
			.kind(MemberKind::Scalar(kind))
			.build()
	}

	#[test]
	fn builder_defaults_to_inherited_endianness() {
		let member = scalar("alpha", 4, ScalarKind::U32);
		assert_eq!(member.name(), "alpha");
		assert_eq!(member.byte_offset(), 4);
		assert_eq!(member.byte_length(), 4);
		assert_eq!(member.endian(), None);
	}

	#[test]
	fn reinsert_replaces_in_place() {
		let mut table = MemberTable::default();
		table.insert(scalar("a", 0, ScalarKind::U8));
		table.insert(scalar("b", 1, ScalarKind::U8));
		table.insert(scalar("a", 2, ScalarKind::U16));

		assert_eq!(table.len(), 2);
		let names: Vec<_> = table.iter().map(|member| member.name().to_owned()).collect();
		assert_eq!(names, ["a", "b"]);
		assert_eq!(table.get("a").map(|member| member.byte_offset()), Some(2));
		assert!(table.get("c").is_none());
	}
}
