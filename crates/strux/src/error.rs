use core::fmt::Display;

use strux_codec::CodecError;

/// Errors produced while defining layouts or accessing views.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ViewError {
	/// The buffer argument is not a contiguous `ArrayBuffer`.
	#[error("expected an ArrayBuffer, got a {found}")]
	InvalidArgument { found: &'static str },

	/// An offset or length lies outside the safe integer range, or is
	/// negative where that is not allowed.
	#[error("{what} {value} is out of range")]
	Range { what: &'static str, value: String },

	/// An access addressed bytes outside the buffer.
	#[error(transparent)]
	OutOfBounds(#[from] CodecError),

	/// A padding member or the `length` of a sized view was assigned.
	#[error("cannot assign to read-only member `{name}`")]
	ImmutableField { name: String },

	#[error("`{type_name}` has no member named `{name}`")]
	UnknownMember { type_name: String, name: String },

	#[error("expected {expected}, found {found}")]
	TypeMismatch { expected: &'static str, found: String },
}

impl ViewError {
	pub(crate) fn range(what: &'static str, value: impl Display) -> Self {
		Self::Range {
			what,
			value: value.to_string(),
		}
	}

	pub(crate) fn mismatch(expected: &'static str, found: impl Display) -> Self {
		Self::TypeMismatch {
			expected,
			found: found.to_string(),
		}
	}
}
