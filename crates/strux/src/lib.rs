#![doc = include_str!("../readme.md")]

mod buffer;
mod error;
mod key;
mod layout;
mod macros;
mod member;
mod number;
mod pointer;
mod scalar;
mod typed;
mod value;
mod view;

pub use bytemuck;
pub use bytemuck::Pod;
pub use bytemuck::Zeroable;
pub use strux_codec;
pub use strux_codec::ByteOrder;
pub use strux_codec::CodecError;
#[cfg(feature = "logs")]
pub use tracing;
pub use typed_builder;

pub use crate::buffer::*;
pub use crate::error::*;
pub use crate::key::*;
pub use crate::layout::*;
pub use crate::member::Member;
pub use crate::member::MemberKind;
pub use crate::number::MAX_SAFE_INTEGER;
pub use crate::number::ToIntegerOrInfinity;
pub use crate::number::ToLength;
pub use crate::number::ToOffset;
pub use crate::number::number_to_string;
pub use crate::number::string_to_number;
pub use crate::pointer::*;
pub use crate::scalar::*;
pub use crate::typed::*;
pub use crate::value::*;
pub use crate::view::BufferView;
pub use crate::view::StructView;

/// Make sure all traits are available.
pub mod prelude {
	pub use super::BufferView;
	pub use super::ToIntegerOrInfinity;
	pub use super::ToLength;
	pub use super::ToOffset;
}
