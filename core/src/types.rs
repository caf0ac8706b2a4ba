//! Parameter values carried by an `Apply` descriptor.
//!
//! # Design
//! The server accepts strings and numbers, either alone or as a list that
//! is sent as repeated query keys. `Scalar` and `ParamValue` spell that out as
//! tagged variants so serialization matches on them exhaustively. Both are
//! untagged in serde so descriptors can be described in plain JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single parameter value as it goes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) => f.write_str(&float_text(*x)),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

/// Shortest round-trip text for `x`, in the form the server parses:
/// `nan`/`inf`, scientific notation with a signed two-digit exponent when
/// the decimal exponent is below -4 or at least 16, otherwise positional
/// with at least one fractional digit.
fn float_text(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let sci = format!("{x:e}");
    if let Some((mantissa, exp)) = sci.split_once('e') {
        if let Ok(exp) = exp.parse::<i32>() {
            if !(-4..16).contains(&exp) {
                let sign = if exp < 0 { '-' } else { '+' };
                return format!("{mantissa}e{sign}{:02}", exp.abs());
            }
        }
    }
    let plain = x.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<&String> for Scalar {
    fn from(s: &String) -> Self {
        Scalar::Str(s.clone())
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl From<f32> for Scalar {
    fn from(x: f32) -> Self {
        Scalar::Float(f64::from(x))
    }
}

macro_rules! scalar_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(n: $t) -> Self {
                    Scalar::Int(i64::from(n))
                }
            }
        )*
    };
}

scalar_from_int!(i8, i16, i32, i64, u8, u16, u32);

// Values past `i64::MAX` keep their digits as text; the wire form is the same.
macro_rules! scalar_from_wide_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(n: $t) -> Self {
                    i64::try_from(n).map_or_else(|_| Scalar::Str(n.to_string()), Scalar::Int)
                }
            }
        )*
    };
}

scalar_from_wide_int!(u64, usize, isize, i128, u128);

/// A parameter value: one scalar, or a list sent as repeated keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    One(Scalar),
    Many(Vec<Scalar>),
}

impl ParamValue {
    /// The scalars this value contributes, in order.
    pub fn values(&self) -> &[Scalar] {
        match self {
            ParamValue::One(v) => std::slice::from_ref(v),
            ParamValue::Many(vs) => vs,
        }
    }
}

macro_rules! param_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(v: $t) -> Self {
                    ParamValue::One(Scalar::from(v))
                }
            }
        )*
    };
}

param_from_scalar!(
    &str, String, &String, f32, f64, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, i128, u128
);

impl From<Scalar> for ParamValue {
    fn from(v: Scalar) -> Self {
        ParamValue::One(v)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for ParamValue {
    fn from(vs: Vec<T>) -> Self {
        ParamValue::Many(vs.into_iter().map(Into::into).collect())
    }
}
