//! Numeric coercions shared by offsets, lengths, keys and `at()`.
//!
//! These follow the host typed-array rules exactly: `ToIntegerOrInfinity`,
//! `ToIndex`-style length validation, string-to-number parsing and the
//! shortest round-trip number-to-string conversion used to decide whether a
//! key is a canonical numeric string.

use crate::ViewError;

/// Largest integer `n` such that `n` and `n + 1` are both exactly
/// representable as `f64`.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

const MAX_SAFE_INTEGER_F64: f64 = MAX_SAFE_INTEGER as f64;

/// Conversion of a byte offset argument into a signed offset.
///
/// Offsets may be negative; they must lie within `±MAX_SAFE_INTEGER`.
/// Fractional offsets truncate toward zero and `NaN` becomes zero.
pub trait ToOffset {
	fn to_offset(self) -> Result<i64, ViewError>;
}

impl ToOffset for f64 {
	fn to_offset(self) -> Result<i64, ViewError> {
		if self.is_nan() {
			return Ok(0);
		}

		if self.abs() > MAX_SAFE_INTEGER_F64 {
			return Err(ViewError::range("byte offset", self));
		}

		Ok(self.trunc() as i64)
	}
}

impl ToOffset for f32 {
	fn to_offset(self) -> Result<i64, ViewError> {
		f64::from(self).to_offset()
	}
}

/// Conversion of an array length argument into an element count.
///
/// Fractional lengths truncate toward zero, `NaN` becomes zero, negative
/// lengths and lengths beyond `MAX_SAFE_INTEGER` are rejected.
pub trait ToLength {
	fn to_length(self) -> Result<usize, ViewError>;
}

impl ToLength for f64 {
	fn to_length(self) -> Result<usize, ViewError> {
		let integer = self.to_integer_or_infinity();

		if !(0.0..=MAX_SAFE_INTEGER_F64).contains(&integer) {
			return Err(ViewError::range("length", self));
		}

		usize::try_from(integer as u64).map_err(|_| ViewError::range("length", self))
	}
}

macro_rules! impl_integer_coercions {
	($($ty:ty),* $(,)?) => {
		$(
			impl ToOffset for $ty {
				fn to_offset(self) -> Result<i64, ViewError> {
					i64::try_from(self)
						.ok()
						.filter(|offset| offset.unsigned_abs() <= MAX_SAFE_INTEGER as u64)
						.ok_or_else(|| ViewError::range("byte offset", self))
				}
			}

			impl ToLength for $ty {
				fn to_length(self) -> Result<usize, ViewError> {
					i64::try_from(self)
						.ok()
						.filter(|length| (0..=MAX_SAFE_INTEGER).contains(length))
						.and_then(|length| usize::try_from(length).ok())
						.ok_or_else(|| ViewError::range("length", self))
				}
			}

			impl ToIntegerOrInfinity for $ty {
				fn to_integer_or_infinity(&self) -> f64 {
					*self as f64
				}
			}
		)*
	};
}

impl_integer_coercions!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);

/// The `ToIntegerOrInfinity` abstract operation.
pub trait ToIntegerOrInfinity {
	fn to_integer_or_infinity(&self) -> f64;
}

impl ToIntegerOrInfinity for f64 {
	fn to_integer_or_infinity(&self) -> f64 {
		if self.is_nan() {
			return 0.0;
		}
		// `+ 0.0` folds a negative zero into positive zero
		self.trunc() + 0.0
	}
}

impl ToIntegerOrInfinity for f32 {
	fn to_integer_or_infinity(&self) -> f64 {
		f64::from(*self).to_integer_or_infinity()
	}
}

impl ToIntegerOrInfinity for bool {
	fn to_integer_or_infinity(&self) -> f64 {
		if *self { 1.0 } else { 0.0 }
	}
}

impl ToIntegerOrInfinity for str {
	fn to_integer_or_infinity(&self) -> f64 {
		string_to_number(self).to_integer_or_infinity()
	}
}

impl ToIntegerOrInfinity for &str {
	fn to_integer_or_infinity(&self) -> f64 {
		string_to_number(self).to_integer_or_infinity()
	}
}

impl ToIntegerOrInfinity for String {
	fn to_integer_or_infinity(&self) -> f64 {
		string_to_number(self).to_integer_or_infinity()
	}
}

impl<T: ToIntegerOrInfinity> ToIntegerOrInfinity for Option<T> {
	/// A missing argument coerces like `undefined`, which is `NaN`, so zero.
	fn to_integer_or_infinity(&self) -> f64 {
		self.as_ref().map_or(0.0, ToIntegerOrInfinity::to_integer_or_infinity)
	}
}

/// Whitespace and line terminators stripped by string-to-number parsing.
///
/// This is the host's `WhiteSpace` and `LineTerminator` set, not
/// [`char::is_whitespace`]: U+0085 and the other non-`Zs` Unicode spaces
/// are not stripped.
fn is_number_whitespace(c: char) -> bool {
	matches!(
		c,
		'\u{0009}'
			| '\u{000a}'
			| '\u{000b}'
			| '\u{000c}'
			| '\u{000d}'
			| '\u{0020}'
			| '\u{00a0}'
			| '\u{1680}'
			| '\u{2000}'..='\u{200a}'
			| '\u{2028}'
			| '\u{2029}'
			| '\u{202f}'
			| '\u{205f}'
			| '\u{3000}'
			| '\u{feff}'
	)
}

/// Parses a string with the host `StringToNumber` grammar.
///
/// Surrounding whitespace is ignored, the empty string is zero,
/// `Infinity` may be signed, `0x`/`0o`/`0b` prefixes are unsigned integer
/// literals, and anything else that is not a decimal literal is `NaN`.
pub fn string_to_number(input: &str) -> f64 {
	let trimmed = input.trim_matches(is_number_whitespace);

	if trimmed.is_empty() {
		return 0.0;
	}

	match trimmed {
		"Infinity" | "+Infinity" => return f64::INFINITY,
		"-Infinity" => return f64::NEG_INFINITY,
		_ => {}
	}

	let radix = match trimmed.get(..2) {
		Some("0x" | "0X") => Some(16),
		Some("0o" | "0O") => Some(8),
		Some("0b" | "0B") => Some(2),
		_ => None,
	};

	if let Some(radix) = radix {
		return parse_radix_integer(&trimmed[2..], radix);
	}

	if !is_decimal_literal(trimmed) {
		return f64::NAN;
	}

	trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_radix_integer(digits: &str, radix: u32) -> f64 {
	if digits.is_empty() {
		return f64::NAN;
	}

	digits.chars().try_fold(0.0_f64, |value, c| {
		c.to_digit(radix).map(|digit| value * f64::from(radix) + f64::from(digit))
	})
	.unwrap_or(f64::NAN)
}

/// `[+-]? (digits [. digits?]? | . digits) ([eE] [+-]? digits)?`
fn is_decimal_literal(text: &str) -> bool {
	let bytes = text.as_bytes();
	let mut position = 0;

	let skip_sign = |position: &mut usize| {
		if matches!(bytes.get(*position), Some(b'+' | b'-')) {
			*position += 1;
		}
	};
	let skip_digits = |position: &mut usize| {
		let start = *position;
		while bytes.get(*position).is_some_and(u8::is_ascii_digit) {
			*position += 1;
		}
		*position - start
	};

	skip_sign(&mut position);
	let mut digits = skip_digits(&mut position);

	if bytes.get(position) == Some(&b'.') {
		position += 1;
		digits += skip_digits(&mut position);
	}

	if digits == 0 {
		return false;
	}

	if matches!(bytes.get(position), Some(b'e' | b'E')) {
		position += 1;
		skip_sign(&mut position);
		if skip_digits(&mut position) == 0 {
			return false;
		}
	}

	position == bytes.len()
}

/// Formats a number with the host `Number::toString` rules.
///
/// Uses the shortest digit string that round-trips, switching to exponent
/// notation below `1e-6` and from `1e21` upward.
pub fn number_to_string(value: f64) -> String {
	if value.is_nan() {
		return "NaN".to_owned();
	}

	if value == 0.0 {
		return "0".to_owned();
	}

	if value.is_infinite() {
		return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
	}

	if value < 0.0 {
		return format!("-{}", number_to_string(-value));
	}

	// `{:e}` yields the shortest round-trip digits, e.g. `1.2345e3`
	let scientific = format!("{value:e}");
	let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
	let exponent: i32 = exponent.parse().unwrap_or(0);
	let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
	let k = digits.len() as i32;
	let n = exponent + 1;

	if k <= n && n <= 21 {
		format!("{digits}{}", "0".repeat((n - k) as usize))
	} else if 0 < n && n <= 21 {
		let (whole, fraction) = digits.split_at(n as usize);
		format!("{whole}.{fraction}")
	} else if -6 < n && n <= 0 {
		format!("0.{}{digits}", "0".repeat((-n) as usize))
	} else {
		let sign = if n - 1 < 0 { '-' } else { '+' };
		let magnitude = (n - 1).unsigned_abs();
		let (first, rest) = digits.split_at(1);
		if rest.is_empty() {
			format!("{first}e{sign}{magnitude}")
		} else {
			format!("{first}.{rest}e{sign}{magnitude}")
		}
	}
}
