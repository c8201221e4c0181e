//! Property-based tests for the raw codecs: round trips in both byte orders,
//! byte-order symmetry, and fault behaviour for arbitrary offsets.

use proptest::prelude::*;
use strux_codec::ByteOrder;
use strux_codec::CodecError;
use strux_codec::decode_float16;
use strux_codec::encode_float16;
use strux_codec::get_f64;
use strux_codec::get_i24;
use strux_codec::get_i64;
use strux_codec::get_u16;
use strux_codec::get_u24;
use strux_codec::get_u32;
use strux_codec::round_float16;
use strux_codec::set_f64;
use strux_codec::set_i24;
use strux_codec::set_i64;
use strux_codec::set_u16;
use strux_codec::set_u24;
use strux_codec::set_u32;

fn byte_order() -> impl Strategy<Value = ByteOrder> {
	prop_oneof![Just(ByteOrder::Little), Just(ByteOrder::Big)]
}

// ---------------------------------------------------------------------------
// Round trips at arbitrary in-bounds offsets
// ---------------------------------------------------------------------------

proptest! {
	#[test]
	fn roundtrip_u32(val: u32, offset in 0i64..12, order in byte_order()) {
		let mut bytes = [0u8; 16];
		set_u32(&mut bytes, offset, val, order).unwrap();
		prop_assert_eq!(get_u32(&bytes, offset, order).unwrap(), val);
	}

	#[test]
	fn roundtrip_i64(val: i64, offset in 0i64..8, order in byte_order()) {
		let mut bytes = [0u8; 16];
		set_i64(&mut bytes, offset, val, order).unwrap();
		prop_assert_eq!(get_i64(&bytes, offset, order).unwrap(), val);
	}

	#[test]
	fn roundtrip_f64_bits(bits: u64, order in byte_order()) {
		let mut bytes = [0u8; 8];
		set_f64(&mut bytes, 0, f64::from_bits(bits), order).unwrap();
		prop_assert_eq!(get_f64(&bytes, 0, order).unwrap().to_bits(), bits);
	}

	#[test]
	fn roundtrip_u24_masks_high_byte(val: u32, order in byte_order()) {
		let mut bytes = [0u8; 3];
		set_u24(&mut bytes, 0, val, order).unwrap();
		prop_assert_eq!(get_u24(&bytes, 0, order).unwrap(), val & 0x00ff_ffff);
	}

	#[test]
	fn roundtrip_i24_in_range(val in -0x80_0000i32..0x80_0000, order in byte_order()) {
		let mut bytes = [0u8; 3];
		set_i24(&mut bytes, 0, val, order).unwrap();
		prop_assert_eq!(get_i24(&bytes, 0, order).unwrap(), val);
	}

	#[test]
	fn byte_orders_are_mirror_images(val: u16) {
		let mut little = [0u8; 2];
		let mut big = [0u8; 2];
		set_u16(&mut little, 0, val, ByteOrder::Little).unwrap();
		set_u16(&mut big, 0, val, ByteOrder::Big).unwrap();
		big.reverse();
		prop_assert_eq!(little, big);
	}
}

// ---------------------------------------------------------------------------
// Faults: any offset outside the buffer reports the request
// ---------------------------------------------------------------------------

proptest! {
	#[test]
	fn out_of_range_offsets_fault(offset in prop_oneof![i64::MIN..0i64, 13i64..i64::MAX]) {
		let bytes = [0u8; 16];
		prop_assert_eq!(
			get_u32(&bytes, offset, ByteOrder::Little),
			Err(CodecError::OutOfBounds { offset, width: 4, len: 16 })
		);
	}
}

// ---------------------------------------------------------------------------
// Half precision: rounding is idempotent and monotonic
// ---------------------------------------------------------------------------

proptest! {
	#[test]
	fn float16_rounding_is_idempotent(value in proptest::num::f64::ANY) {
		let once = round_float16(value);
		let twice = round_float16(once);
		if once.is_nan() {
			prop_assert!(twice.is_nan());
		} else {
			prop_assert_eq!(once.to_bits(), twice.to_bits());
		}
	}

	#[test]
	fn float16_rounding_is_monotonic(a in -70000.0f64..70000.0, b in -70000.0f64..70000.0) {
		let (low, high) = if a <= b { (a, b) } else { (b, a) };
		prop_assert!(round_float16(low) <= round_float16(high));
	}

	#[test]
	fn float16_decode_encode_is_identity(bits: u16) {
		let value = decode_float16(bits);
		prop_assume!(!value.is_nan());
		prop_assert_eq!(encode_float16(value), bits);
	}
}
