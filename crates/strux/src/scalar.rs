use core::fmt;

use strux_codec::ByteOrder;
use strux_codec::CodecError;

/// Primitive field kinds with a fixed wire width.
///
/// Boolean kinds are not a distinct wire type: they alias the unsigned
/// integer of their width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
	I8,
	U8,
	I16,
	U16,
	I24,
	U24,
	I32,
	U32,
	I64,
	U64,
	F16,
	F32,
	F64,
	Bool8,
	Bool16,
	Bool32,
}

impl ScalarKind {
	pub const fn byte_length(self) -> usize {
		match self {
			Self::I8 | Self::U8 | Self::Bool8 => 1,
			Self::I16 | Self::U16 | Self::F16 | Self::Bool16 => 2,
			Self::I24 | Self::U24 => 3,
			Self::I32 | Self::U32 | Self::F32 | Self::Bool32 => 4,
			Self::I64 | Self::U64 | Self::F64 => 8,
		}
	}

	pub const fn name(self) -> &'static str {
		match self {
			Self::I8 => "i8",
			Self::U8 => "u8",
			Self::I16 => "i16",
			Self::U16 => "u16",
			Self::I24 => "i24",
			Self::U24 => "u24",
			Self::I32 => "i32",
			Self::U32 => "u32",
			Self::I64 => "i64",
			Self::U64 => "u64",
			Self::F16 => "f16",
			Self::F32 => "f32",
			Self::F64 => "f64",
			Self::Bool8 => "bool8",
			Self::Bool16 => "bool16",
			Self::Bool32 => "bool32",
		}
	}

	/// Reads a value of this kind at the absolute `offset`.
	pub fn read(self, bytes: &[u8], offset: i64, order: ByteOrder) -> Result<Scalar, CodecError> {
		use strux_codec as codec;

		Ok(match self {
			Self::I8 => Scalar::I8(codec::get_i8(bytes, offset, order)?),
			Self::U8 => Scalar::U8(codec::get_u8(bytes, offset, order)?),
			Self::I16 => Scalar::I16(codec::get_i16(bytes, offset, order)?),
			Self::U16 => Scalar::U16(codec::get_u16(bytes, offset, order)?),
			Self::I24 => Scalar::I32(codec::get_i24(bytes, offset, order)?),
			Self::U24 => Scalar::U32(codec::get_u24(bytes, offset, order)?),
			Self::I32 => Scalar::I32(codec::get_i32(bytes, offset, order)?),
			Self::U32 => Scalar::U32(codec::get_u32(bytes, offset, order)?),
			Self::I64 => Scalar::I64(codec::get_i64(bytes, offset, order)?),
			Self::U64 => Scalar::U64(codec::get_u64(bytes, offset, order)?),
			Self::F16 => Scalar::F64(codec::get_f16(bytes, offset, order)?),
			Self::F32 => Scalar::F32(codec::get_f32(bytes, offset, order)?),
			Self::F64 => Scalar::F64(codec::get_f64(bytes, offset, order)?),
			Self::Bool8 => Scalar::Bool(codec::get_u8(bytes, offset, order)? != 0),
			Self::Bool16 => Scalar::Bool(codec::get_u16(bytes, offset, order)? != 0),
			Self::Bool32 => Scalar::Bool(codec::get_u32(bytes, offset, order)? != 0),
		})
	}

	/// Writes `value` at the absolute `offset`, wrapping it to this kind's
	/// width the way fixed-width typed storage does.
	pub fn write(
		self,
		bytes: &mut [u8],
		offset: i64,
		value: Scalar,
		order: ByteOrder,
	) -> Result<(), CodecError> {
		use strux_codec as codec;

		let bits = value.to_bits();

		match self {
			Self::I8 => codec::set_i8(bytes, offset, bits as i8, order),
			Self::U8 => codec::set_u8(bytes, offset, bits as u8, order),
			Self::I16 => codec::set_i16(bytes, offset, bits as i16, order),
			Self::U16 => codec::set_u16(bytes, offset, bits as u16, order),
			Self::I24 => codec::set_i24(bytes, offset, bits as i32, order),
			Self::U24 => codec::set_u24(bytes, offset, bits as u32, order),
			Self::I32 => codec::set_i32(bytes, offset, bits as i32, order),
			Self::U32 => codec::set_u32(bytes, offset, bits as u32, order),
			Self::I64 => codec::set_i64(bytes, offset, bits as i64, order),
			Self::U64 => codec::set_u64(bytes, offset, bits, order),
			Self::F16 => codec::set_f16(bytes, offset, value.to_f64(), order),
			Self::F32 => codec::set_f32(bytes, offset, value.to_f64() as f32, order),
			Self::F64 => codec::set_f64(bytes, offset, value.to_f64(), order),
			Self::Bool8 => codec::set_u8(bytes, offset, value.to_bool().into(), order),
			Self::Bool16 => codec::set_u16(bytes, offset, value.to_bool().into(), order),
			Self::Bool32 => codec::set_u32(bytes, offset, value.to_bool().into(), order),
		}
	}
}

impl fmt::Display for ScalarKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// A primitive value read from or written to a field.
///
/// 24-bit kinds read as `I32`/`U32`, half floats read as `F64`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
	I8(i8),
	U8(u8),
	I16(i16),
	U16(u16),
	I32(i32),
	U32(u32),
	I64(i64),
	U64(u64),
	F32(f32),
	F64(f64),
	Bool(bool),
}

impl Scalar {
	/// The value as a number. 64-bit integers may lose precision.
	pub fn to_f64(self) -> f64 {
		match self {
			Self::I8(v) => f64::from(v),
			Self::U8(v) => f64::from(v),
			Self::I16(v) => f64::from(v),
			Self::U16(v) => f64::from(v),
			Self::I32(v) => f64::from(v),
			Self::U32(v) => f64::from(v),
			Self::I64(v) => v as f64,
			Self::U64(v) => v as f64,
			Self::F32(v) => f64::from(v),
			Self::F64(v) => v,
			Self::Bool(v) => f64::from(u8::from(v)),
		}
	}

	/// The value as a two's complement bit pattern modulo `2^64`.
	///
	/// Floats truncate toward zero first; `NaN` and infinities become zero.
	pub fn to_bits(self) -> u64 {
		match self {
			Self::I8(v) => v as u64,
			Self::U8(v) => u64::from(v),
			Self::I16(v) => v as u64,
			Self::U16(v) => u64::from(v),
			Self::I32(v) => v as u64,
			Self::U32(v) => u64::from(v),
			Self::I64(v) => v as u64,
			Self::U64(v) => v,
			Self::F32(v) => float_to_bits(f64::from(v)),
			Self::F64(v) => float_to_bits(v),
			Self::Bool(v) => u64::from(v),
		}
	}

	/// Truthiness: non-zero numbers are `true`, `NaN` is `false`.
	pub fn to_bool(self) -> bool {
		match self {
			Self::Bool(v) => v,
			Self::F32(v) => v != 0.0 && !v.is_nan(),
			Self::F64(v) => v != 0.0 && !v.is_nan(),
			other => other.to_bits() != 0,
		}
	}
}

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn float_to_bits(value: f64) -> u64 {
	if !value.is_finite() {
		return 0;
	}

	// `%` is exact here: the operand is an integer and the modulus a power of two
	let magnitude = (value.trunc().abs() % TWO_POW_64) as u64;
	if value < 0.0 { magnitude.wrapping_neg() } else { magnitude }
}

macro_rules! impl_scalar_from {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(
			impl From<$ty> for Scalar {
				fn from(value: $ty) -> Self {
					Self::$variant(value)
				}
			}
		)*
	};
}

impl_scalar_from!(
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

impl fmt::Display for Scalar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::I8(v) => write!(f, "{v}"),
			Self::U8(v) => write!(f, "{v}"),
			Self::I16(v) => write!(f, "{v}"),
			Self::U16(v) => write!(f, "{v}"),
			Self::I32(v) => write!(f, "{v}"),
			Self::U32(v) => write!(f, "{v}"),
			Self::I64(v) => write!(f, "{v}"),
			Self::U64(v) => write!(f, "{v}"),
			Self::F32(v) => write!(f, "{v}"),
			Self::F64(v) => write!(f, "{v}"),
			Self::Bool(v) => write!(f, "{v}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn write_then_read(kind: ScalarKind, value: Scalar) -> Scalar {
		let mut bytes = [0u8; 8];
		kind.write(&mut bytes, 0, value, ByteOrder::Little).unwrap();
		kind.read(&bytes, 0, ByteOrder::Little).unwrap()
	}

	#[test]
	fn integers_wrap_to_width() {
		assert_eq!(write_then_read(ScalarKind::U8, Scalar::I32(-1)), Scalar::U8(255));
		assert_eq!(write_then_read(ScalarKind::I8, Scalar::U32(200)), Scalar::I8(-56));
		assert_eq!(write_then_read(ScalarKind::U16, Scalar::I64(65_537)), Scalar::U16(1));
		assert_eq!(write_then_read(ScalarKind::U24, Scalar::I32(-1)), Scalar::U32(0x00ff_ffff));
		assert_eq!(write_then_read(ScalarKind::I24, Scalar::U32(0x00ff_ffff)), Scalar::I32(-1));
		assert_eq!(write_then_read(ScalarKind::U64, Scalar::I8(-1)), Scalar::U64(u64::MAX));
	}

	#[test]
	fn floats_convert_like_typed_storage() {
		assert_eq!(write_then_read(ScalarKind::I32, Scalar::F64(-3.9)), Scalar::I32(-3));
		assert_eq!(write_then_read(ScalarKind::U8, Scalar::F64(257.5)), Scalar::U8(1));
		assert_eq!(write_then_read(ScalarKind::U8, Scalar::F64(-1.0)), Scalar::U8(255));
		assert_eq!(write_then_read(ScalarKind::I16, Scalar::F64(f64::NAN)), Scalar::I16(0));
		assert_eq!(write_then_read(ScalarKind::U32, Scalar::F64(f64::INFINITY)), Scalar::U32(0));
		assert_eq!(write_then_read(ScalarKind::U32, Scalar::F64(4_294_967_296.0 * 3.0 + 5.0)), Scalar::U32(5));
		assert_eq!(write_then_read(ScalarKind::F32, Scalar::U8(3)), Scalar::F32(3.0));
		assert_eq!(write_then_read(ScalarKind::F16, Scalar::F64(0.1)), Scalar::F64(0.099_975_585_937_5));
	}

	#[test]
	fn booleans_alias_integers() {
		assert_eq!(write_then_read(ScalarKind::Bool16, Scalar::Bool(true)), Scalar::Bool(true));
		assert_eq!(write_then_read(ScalarKind::U16, Scalar::Bool(true)), Scalar::U16(1));
		assert_eq!(write_then_read(ScalarKind::Bool8, Scalar::U8(7)), Scalar::Bool(true));
		assert_eq!(write_then_read(ScalarKind::Bool32, Scalar::F64(f64::NAN)), Scalar::Bool(false));

		let mut bytes = [0u8; 4];
		ScalarKind::Bool32
			.write(&mut bytes, 0, Scalar::U32(0x100), ByteOrder::Big)
			.unwrap();
		assert_eq!(bytes, [0, 0, 0, 1]);
		bytes = [0, 2, 0, 0];
		assert_eq!(
			ScalarKind::Bool32.read(&bytes, 0, ByteOrder::Little).unwrap(),
			Scalar::Bool(true)
		);
	}

	#[test]
	fn widths() {
		assert_eq!(ScalarKind::I24.byte_length(), 3);
		assert_eq!(ScalarKind::F16.byte_length(), 2);
		assert_eq!(ScalarKind::Bool32.byte_length(), 4);
		assert_eq!(ScalarKind::U64.to_string(), "u64");
	}
}
