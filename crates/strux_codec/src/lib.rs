#![no_std]

//! Fixed-width byte codecs used by `strux` field accessors.
//!
//! Every accessor takes a signed absolute byte offset and an explicit
//! [`ByteOrder`]. Offsets are checked against the slice on every call and
//! fault with [`CodecError::OutOfBounds`] rather than panicking, so callers
//! can hand through offsets computed from untrusted pointer arithmetic.

use core::ops::Range;

mod float16;

pub use float16::*;

/// Byte order used to encode a multi-byte value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
	Little,
	Big,
}

impl ByteOrder {
	/// The byte order of the host this crate was compiled for.
	pub const NATIVE: Self = if cfg!(target_endian = "little") {
		Self::Little
	} else {
		Self::Big
	};

	pub const fn from_little_endian(little_endian: bool) -> Self {
		if little_endian { Self::Little } else { Self::Big }
	}

	pub const fn is_little_endian(self) -> bool {
		matches!(self, Self::Little)
	}

	/// Picks `preferred` when set, otherwise `fallback`.
	pub const fn resolve(preferred: Option<Self>, fallback: Self) -> Self {
		match preferred {
			Some(order) => order,
			None => fallback,
		}
	}
}

impl Default for ByteOrder {
	fn default() -> Self {
		Self::NATIVE
	}
}

/// Errors raised by the raw codecs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
	#[error("offset {offset} (width {width}) is outside the bounds of a {len} byte buffer")]
	OutOfBounds { offset: i64, width: usize, len: usize },
}

/// Resolves `offset..offset + width` against a buffer of `len` bytes.
pub fn span(len: usize, offset: i64, width: usize) -> Result<Range<usize>, CodecError> {
	let error = CodecError::OutOfBounds { offset, width, len };
	let start = usize::try_from(offset).map_err(|_| error)?;
	let end = start.checked_add(width).ok_or(error)?;

	if end > len {
		return Err(error);
	}

	Ok(start..end)
}

/// Generates `get_<ty>` / `set_<ty>` for each native fixed-width type.
macro_rules! impl_codec {
	($($ty:ident),* $(,)?) => {
		pastey::paste! {
			$(
				#[doc = "Reads a `" $ty "` at `offset` in the given byte order."]
				#[inline]
				pub fn [<get_ $ty>](
					bytes: &[u8],
					offset: i64,
					order: ByteOrder,
				) -> Result<$ty, CodecError> {
					const WIDTH: usize = size_of::<$ty>();
					let range = span(bytes.len(), offset, WIDTH)?;
					let mut raw = [0u8; WIDTH];
					raw.copy_from_slice(&bytes[range]);

					Ok(match order {
						ByteOrder::Little => $ty::from_le_bytes(raw),
						ByteOrder::Big => $ty::from_be_bytes(raw),
					})
				}

				#[doc = "Writes a `" $ty "` at `offset` in the given byte order."]
				#[inline]
				pub fn [<set_ $ty>](
					bytes: &mut [u8],
					offset: i64,
					value: $ty,
					order: ByteOrder,
				) -> Result<(), CodecError> {
					let range = span(bytes.len(), offset, size_of::<$ty>())?;
					let raw = match order {
						ByteOrder::Little => value.to_le_bytes(),
						ByteOrder::Big => value.to_be_bytes(),
					};
					bytes[range].copy_from_slice(&raw);

					Ok(())
				}
			)*
		}
	};
}

impl_codec!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Reads an unsigned 24-bit integer from three single-byte reads.
pub fn get_u24(bytes: &[u8], offset: i64, order: ByteOrder) -> Result<u32, CodecError> {
	span(bytes.len(), offset, 3)?;
	let b0 = u32::from(get_u8(bytes, offset, order)?);
	let b1 = u32::from(get_u8(bytes, offset + 1, order)?);
	let b2 = u32::from(get_u8(bytes, offset + 2, order)?);

	Ok(match order {
		ByteOrder::Little => b0 | (b1 << 8) | (b2 << 16),
		ByteOrder::Big => (b0 << 16) | (b1 << 8) | b2,
	})
}

/// Reads a signed 24-bit integer, sign-extended into an `i32`.
pub fn get_i24(bytes: &[u8], offset: i64, order: ByteOrder) -> Result<i32, CodecError> {
	let raw = get_u24(bytes, offset, order)?;
	Ok(((raw << 8) as i32) >> 8)
}

/// Writes the low 24 bits of `value` as three single-byte writes.
///
/// The whole range is checked up front so a faulting write leaves the buffer
/// untouched.
pub fn set_u24(bytes: &mut [u8], offset: i64, value: u32, order: ByteOrder) -> Result<(), CodecError> {
	span(bytes.len(), offset, 3)?;
	let [lo, mid, hi, _] = value.to_le_bytes();
	let ordered = match order {
		ByteOrder::Little => [lo, mid, hi],
		ByteOrder::Big => [hi, mid, lo],
	};

	for (position, byte) in (0..).zip(ordered) {
		set_u8(bytes, offset + position, byte, order)?;
	}

	Ok(())
}

pub fn set_i24(bytes: &mut [u8], offset: i64, value: i32, order: ByteOrder) -> Result<(), CodecError> {
	set_u24(bytes, offset, value as u32, order)
}

/// Reads an IEEE 754 binary16 value widened to `f64`.
pub fn get_f16(bytes: &[u8], offset: i64, order: ByteOrder) -> Result<f64, CodecError> {
	get_u16(bytes, offset, order).map(decode_float16)
}

/// Writes `value` rounded to the nearest binary16 value.
pub fn set_f16(bytes: &mut [u8], offset: i64, value: f64, order: ByteOrder) -> Result<(), CodecError> {
	set_u16(bytes, offset, encode_float16(value), order)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn native_order_matches_target() {
		assert_eq!(
			ByteOrder::NATIVE.is_little_endian(),
			cfg!(target_endian = "little")
		);
		assert_eq!(ByteOrder::default(), ByteOrder::NATIVE);
	}

	#[test]
	fn resolve_prefers_override() {
		assert_eq!(
			ByteOrder::resolve(Some(ByteOrder::Big), ByteOrder::Little),
			ByteOrder::Big
		);
		assert_eq!(
			ByteOrder::resolve(None, ByteOrder::Little),
			ByteOrder::Little
		);
	}

	#[test]
	fn u32_respects_byte_order() {
		let mut bytes = [0u8; 4];
		set_u32(&mut bytes, 0, 0x1234_5678, ByteOrder::Little).unwrap();
		assert_eq!(bytes, [0x78, 0x56, 0x34, 0x12]);
		set_u32(&mut bytes, 0, 0x1234_5678, ByteOrder::Big).unwrap();
		assert_eq!(bytes, [0x12, 0x34, 0x56, 0x78]);
		assert_eq!(get_u32(&bytes, 0, ByteOrder::Little).unwrap(), 0x7856_3412);
	}

	#[test]
	fn out_of_bounds_faults() {
		let mut bytes = [0u8; 4];
		assert_eq!(
			get_u32(&bytes, 1, ByteOrder::Little),
			Err(CodecError::OutOfBounds {
				offset: 1,
				width: 4,
				len: 4
			})
		);
		assert!(get_u8(&bytes, -1, ByteOrder::Little).is_err());
		assert!(set_u16(&mut bytes, 3, 1, ByteOrder::Big).is_err());
		assert!(get_u64(&bytes, i64::MAX, ByteOrder::Big).is_err());
	}

	#[test]
	fn u24_layout() {
		let mut bytes = [0u8; 3];
		set_u24(&mut bytes, 0, 0x0012_3456, ByteOrder::Little).unwrap();
		assert_eq!(bytes, [0x56, 0x34, 0x12]);
		set_u24(&mut bytes, 0, 0x0012_3456, ByteOrder::Big).unwrap();
		assert_eq!(bytes, [0x12, 0x34, 0x56]);
		assert_eq!(get_u24(&bytes, 0, ByteOrder::Big).unwrap(), 0x0012_3456);
	}

	#[test]
	fn i24_sign_extends() {
		let mut bytes = [0u8; 3];
		set_i24(&mut bytes, 0, -1, ByteOrder::Little).unwrap();
		assert_eq!(bytes, [0xff, 0xff, 0xff]);
		assert_eq!(get_i24(&bytes, 0, ByteOrder::Little).unwrap(), -1);
		assert_eq!(get_u24(&bytes, 0, ByteOrder::Little).unwrap(), 0x00ff_ffff);

		set_i24(&mut bytes, 0, 0x7f_ffff, ByteOrder::Big).unwrap();
		assert_eq!(get_i24(&bytes, 0, ByteOrder::Big).unwrap(), 0x7f_ffff);
		set_i24(&mut bytes, 0, -0x80_0000, ByteOrder::Big).unwrap();
		assert_eq!(bytes, [0x80, 0x00, 0x00]);
		assert_eq!(get_i24(&bytes, 0, ByteOrder::Big).unwrap(), -0x80_0000);
	}

	#[test]
	fn u24_write_is_all_or_nothing() {
		let mut bytes = [0xaa_u8; 4];
		assert!(set_u24(&mut bytes, 2, 0x00ff_ffff, ByteOrder::Little).is_err());
		assert_eq!(bytes, [0xaa; 4]);
	}

	#[test]
	fn f16_accessors() {
		let mut bytes = [0u8; 2];
		set_f16(&mut bytes, 0, 1.0, ByteOrder::Big).unwrap();
		assert_eq!(bytes, [0x3c, 0x00]);
		assert_eq!(get_f16(&bytes, 0, ByteOrder::Big).unwrap(), 1.0);
		assert_eq!(get_f16(&bytes, 0, ByteOrder::Little).unwrap(), decode_float16(0x003c));
	}
}
