use crate::number::MAX_SAFE_INTEGER;
use crate::number::number_to_string;
use crate::number::string_to_number;

/// A property key resolved once at the call site.
///
/// Indexed views answer `Index` keys with elements and `Named` keys with
/// members. `Invalid` covers canonical numeric strings that can never name an
/// element (`"-0"`, fractions, `NaN`, infinities, unsafe integers): reading
/// them yields nothing and writing them is discarded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
	Named(String),
	Index(i64),
	Invalid,
}

impl PropertyKey {
	/// Classifies a string key by the canonical numeric index rule.
	pub fn parse(key: &str) -> Self {
		match canonical_numeric_index(key) {
			Some(number) => Self::from_numeric(number),
			None => Self::Named(key.to_owned()),
		}
	}

	fn from_numeric(number: f64) -> Self {
		if is_integer_index(number) {
			Self::Index(number as i64)
		} else {
			Self::Invalid
		}
	}

	pub fn as_index(&self) -> Option<i64> {
		match self {
			Self::Index(index) => Some(*index),
			_ => None,
		}
	}
}

/// Returns the numeric value of `key` when it is a canonical numeric string:
/// its number-to-string form equals itself, or it is exactly `"-0"`.
pub fn canonical_numeric_index(key: &str) -> Option<f64> {
	if key == "-0" {
		return Some(-0.0);
	}

	let number = string_to_number(key);
	(number_to_string(number) == key).then_some(number)
}

/// Integral, finite, not negative zero, and within the safe integer range.
fn is_integer_index(number: f64) -> bool {
	number.is_finite()
		&& number.trunc() == number
		&& !(number == 0.0 && number.is_sign_negative())
		&& number.abs() <= MAX_SAFE_INTEGER as f64
}

impl From<&str> for PropertyKey {
	fn from(key: &str) -> Self {
		Self::parse(key)
	}
}

impl From<String> for PropertyKey {
	fn from(key: String) -> Self {
		Self::parse(&key)
	}
}

impl From<&String> for PropertyKey {
	fn from(key: &String) -> Self {
		Self::parse(key)
	}
}

/// A number used as a key goes through its string form first, so `-0.0`
/// addresses element zero while the string `"-0"` addresses nothing.
impl From<f64> for PropertyKey {
	fn from(key: f64) -> Self {
		Self::parse(&number_to_string(key))
	}
}

macro_rules! impl_key_from_integer {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for PropertyKey {
				fn from(key: $ty) -> Self {
					i64::try_from(key)
						.ok()
						.filter(|index| index.unsigned_abs() <= MAX_SAFE_INTEGER as u64)
						.map_or(Self::Invalid, Self::Index)
				}
			}
		)*
	};
}

impl_key_from_integer!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn integer_strings_are_indices() {
		assert_eq!(PropertyKey::parse("0"), PropertyKey::Index(0));
		assert_eq!(PropertyKey::parse("42"), PropertyKey::Index(42));
		assert_eq!(PropertyKey::parse("-1"), PropertyKey::Index(-1));
		assert_eq!(
			PropertyKey::parse("9007199254740991"),
			PropertyKey::Index(MAX_SAFE_INTEGER)
		);
	}

	#[test]
	fn non_canonical_strings_are_names() {
		for key in ["01", "+1", "1.0", " 1", "0x1", "1e3", "", "length", "-", "Infinityx"] {
			assert_eq!(
				PropertyKey::parse(key),
				PropertyKey::Named(key.to_owned()),
				"{key:?} should be a name"
			);
		}
	}

	#[test]
	fn canonical_non_indices_are_invalid() {
		for key in ["-0", "1.5", "NaN", "Infinity", "-Infinity", "1e+21", "9007199254740992"] {
			assert_eq!(PropertyKey::parse(key), PropertyKey::Invalid, "{key:?}");
		}
	}

	#[test]
	fn numbers_convert_through_their_string_form() {
		assert_eq!(PropertyKey::from(-0.0), PropertyKey::Index(0));
		assert_eq!(PropertyKey::from(3.0), PropertyKey::Index(3));
		assert_eq!(PropertyKey::from(0.5), PropertyKey::Invalid);
		assert_eq!(PropertyKey::from(f64::NAN), PropertyKey::Invalid);
		assert_eq!(PropertyKey::from(-7_i32), PropertyKey::Index(-7));
		assert_eq!(PropertyKey::from(u64::MAX), PropertyKey::Invalid);
	}
}
