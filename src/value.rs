use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};

/// A literal carried by aggregation options and fallback expressions.
///
/// Numbers keep the distinction between integers and decimals; decimals use
/// exact arithmetic so `@default:0.1` renders back as `0.1`.
///
/// # Examples
///
/// ```
/// use lucene_compiler::Value;
///
/// assert_eq!(Value::parse_literal("42"), Value::Integer(42));
/// assert_eq!(Value::parse_literal("true"), Value::Boolean(true));
/// assert_eq!(Value::parse_literal("0.1").to_string(), "0.1");
/// assert_eq!(Value::parse_literal("myinclude"), Value::String("myinclude".into()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    Boolean(bool),

    Integer(i64),

    /// Exact decimal number
    Decimal(Decimal),

    String(String),
}

impl Value {
    /// Interpret option text the way the request author most likely meant it.
    pub fn parse_literal(text: &str) -> Value {
        match text {
            "true" => return Value::Boolean(true),
            "false" => return Value::Boolean(false),
            "null" => return Value::Null,
            _ => {}
        }

        // Zero-padded text such as `007` is an identifier, not a number
        let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
        if digits.len() > 1
            && digits.starts_with('0')
            && digits[1..].starts_with(|c: char| c.is_ascii_digit())
        {
            return Value::String(text.to_string());
        }

        if let Ok(n) = text.parse::<i64>() {
            return Value::Integer(n);
        }

        if text.chars().any(|c| c.is_ascii_digit())
            && let Ok(d) = Decimal::from_str(text)
        {
            return Value::Decimal(d);
        }

        Value::String(text.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Decimal(d) if d.is_integer() => d.to_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render as a script literal: numbers and booleans bare, strings quoted.
    pub fn to_script_literal(&self) -> String {
        match self {
            Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Decimal(d) => match d.to_f64() {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(&d.to_string()),
            },
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}
