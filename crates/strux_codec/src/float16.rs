//! IEEE 754 binary16 conversion.
//!
//! Stable Rust has no native half-precision type, so both directions are
//! done with integer bit manipulation. Encoding rounds to nearest, ties to
//! even, and works directly from the `f64` bits so no double rounding through
//! `f32` can occur.

const F16_SIGN: u16 = 0x8000;
const F16_INFINITY: u16 = 0x7c00;
const F16_QUIET: u16 = 0x0200;
const F16_MANTISSA: u16 = 0x03ff;
const F16_BIAS: i32 = 15;

const F64_BIAS: i32 = 1023;
const F64_EXPONENT_MASK: u64 = 0x7ff;
const F64_MANTISSA_MASK: u64 = (1 << 52) - 1;
const F64_INFINITY: u64 = 0x7ff0_0000_0000_0000;

/// Difference between the `f64` and binary16 mantissa widths.
const MANTISSA_SHIFT: u32 = 52 - 10;

/// Value of the smallest binary16 subnormal, `2^-24`.
const SUBNORMAL_UNIT: f64 = 5.960_464_477_539_062_5e-8;

/// Decodes binary16 bits into the exactly representable `f64`.
///
/// NaNs keep their sign and payload bits.
pub fn decode_float16(bits: u16) -> f64 {
	let sign = u64::from(bits & F16_SIGN) << 48;
	let exponent = (bits >> 10) & 0x1f;
	let mantissa = u64::from(bits & F16_MANTISSA);

	match exponent {
		0 => {
			let magnitude = f64::from(bits & F16_MANTISSA) * SUBNORMAL_UNIT;
			if sign == 0 { magnitude } else { -magnitude }
		}
		0x1f => f64::from_bits(sign | F64_INFINITY | (mantissa << MANTISSA_SHIFT)),
		_ => {
			let biased = (i32::from(exponent) - F16_BIAS + F64_BIAS) as u64;
			f64::from_bits(sign | (biased << 52) | (mantissa << MANTISSA_SHIFT))
		}
	}
}

/// Encodes `value` as binary16 bits, rounding to nearest with ties to even.
///
/// Values beyond the binary16 range become infinity, values below half the
/// smallest subnormal become a signed zero. NaNs stay NaN with the quiet bit
/// set and the top mantissa bits carried over.
pub fn encode_float16(value: f64) -> u16 {
	let bits = value.to_bits();
	let sign = ((bits >> 48) as u16) & F16_SIGN;
	let exponent = ((bits >> 52) & F64_EXPONENT_MASK) as i32;
	let mantissa = bits & F64_MANTISSA_MASK;

	if exponent == F64_EXPONENT_MASK as i32 {
		if mantissa == 0 {
			return sign | F16_INFINITY;
		}
		return sign | F16_INFINITY | F16_QUIET | ((mantissa >> MANTISSA_SHIFT) as u16 & F16_MANTISSA);
	}

	// zero or an f64 subnormal, both far below the binary16 range
	if exponent == 0 {
		return sign;
	}

	let half_exponent = exponent - F64_BIAS + F16_BIAS;
	if half_exponent >= 0x1f {
		return sign | F16_INFINITY;
	}

	let significand = mantissa | (1 << 52);

	if half_exponent > 0 {
		// a carry out of the mantissa bumps the exponent, up to infinity
		let mut half = ((half_exponent as u64) << 10) | ((significand >> MANTISSA_SHIFT) & u64::from(F16_MANTISSA));
		if round_up(significand, MANTISSA_SHIFT) {
			half += 1;
		}
		return sign | half as u16;
	}

	let shift = (MANTISSA_SHIFT as i32 + 1 - half_exponent) as u32;
	if shift > 53 {
		return sign;
	}

	let mut half = significand >> shift;
	if round_up(significand, shift) {
		half += 1;
	}

	sign | half as u16
}

/// Round-to-nearest-even decision for dropping the low `shift` bits.
fn round_up(significand: u64, shift: u32) -> bool {
	let halfway = 1u64 << (shift - 1);
	let remainder = significand & ((1u64 << shift) - 1);

	remainder > halfway || (remainder == halfway && (significand >> shift) & 1 == 1)
}

/// Rounds `value` to the nearest binary16 value and widens it back.
pub fn round_float16(value: f64) -> f64 {
	decode_float16(encode_float16(value))
}

#[cfg(test)]
mod tests {
	use core::f64::consts::PI;

	use super::*;

	#[test]
	fn known_values() {
		assert_eq!(encode_float16(0.0), 0x0000);
		assert_eq!(encode_float16(-0.0), 0x8000);
		assert_eq!(encode_float16(1.0), 0x3c00);
		assert_eq!(encode_float16(-2.0), 0xc000);
		assert_eq!(encode_float16(65504.0), 0x7bff);
		assert_eq!(encode_float16(f64::INFINITY), 0x7c00);
		assert_eq!(encode_float16(f64::NEG_INFINITY), 0xfc00);
		assert_eq!(encode_float16(SUBNORMAL_UNIT), 0x0001);
		assert_eq!(encode_float16(6.103_515_625e-5), 0x0400);
	}

	#[test]
	fn decode_known_values() {
		assert_eq!(decode_float16(0x3c00), 1.0);
		assert_eq!(decode_float16(0x7bff), 65504.0);
		assert_eq!(decode_float16(0x0001), SUBNORMAL_UNIT);
		assert_eq!(decode_float16(0xfc00), f64::NEG_INFINITY);
		assert!(decode_float16(0x7e00).is_nan());
		assert!(decode_float16(0x8000).is_sign_negative());
	}

	#[test]
	fn overflow_rounds_to_infinity() {
		// 65520 is the midpoint between 65504 and the next (unrepresentable) step
		assert_eq!(encode_float16(65519.0), 0x7bff);
		assert_eq!(encode_float16(65520.0), 0x7c00);
		assert_eq!(encode_float16(1e10), 0x7c00);
	}

	#[test]
	fn ties_round_to_even() {
		// 1 + 2^-11 lies exactly between 0x3c00 and 0x3c01
		assert_eq!(encode_float16(1.0 + 2f64.powi(-11)), 0x3c00);
		// 1 + 3 * 2^-11 lies between 0x3c01 and 0x3c02
		assert_eq!(encode_float16(1.0 + 3.0 * 2f64.powi(-11)), 0x3c02);
		// sticky bits below the halfway point force rounding up
		assert_eq!(encode_float16(1.0 + 2f64.powi(-11) + 2f64.powi(-40)), 0x3c01);
	}

	#[test]
	fn subnormal_rounding() {
		assert_eq!(encode_float16(SUBNORMAL_UNIT / 2.0), 0x0000);
		assert_eq!(encode_float16(SUBNORMAL_UNIT * 0.75), 0x0001);
		assert_eq!(encode_float16(SUBNORMAL_UNIT * 1.5), 0x0002);
		assert_eq!(encode_float16(-SUBNORMAL_UNIT * 2.5), 0x8002);
		assert_eq!(encode_float16(f64::MIN_POSITIVE), 0x0000);
	}

	#[test]
	fn nan_propagates() {
		let bits = encode_float16(f64::NAN);
		assert_eq!(bits & F16_INFINITY, F16_INFINITY);
		assert_ne!(bits & F16_MANTISSA, 0);
		assert!(decode_float16(bits).is_nan());
		assert_eq!(encode_float16(-f64::NAN) & F16_SIGN, F16_SIGN);
	}

	#[test]
	fn pi_is_a_fixed_point() {
		let once = round_float16(PI);
		assert_eq!(once, 3.140_625);
		assert_eq!(round_float16(once), once);
		assert_eq!(encode_float16(once), encode_float16(PI));
	}

	#[test]
	fn every_finite_pattern_round_trips() {
		for bits in 0..=u16::MAX {
			let value = decode_float16(bits);
			if value.is_nan() {
				continue;
			}
			assert_eq!(encode_float16(value), bits, "pattern {bits:#06x}");
		}
	}
}
