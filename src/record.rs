//! The event records handed to the output by the host pipeline.

use chrono::{DateTime, Utc};
use serde_json;
use std::fmt;
use tagmap::TagMap;

/// A single scalar carried in a `Record` field.
///
/// Event fields are dynamically typed upstream. This is the closed set of
/// types the output understands; the classifier matches on the variant to
/// decide what may become a series name or a tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A UTF-8 string
    String(String),
    /// A signed integer
    Int(i64),
    /// A double precision float
    Float(f64),
    /// A boolean
    Bool(bool),
}

impl Value {
    /// The name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match *self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::String(ref s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Value {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Value {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

/// Record - one structured event to be shipped
///
/// A Record is owned by the host pipeline. The output reads it while
/// building a `Point` and hands it back untouched if delivery has to be
/// retried.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The time the event was observed. Used as the point time unless a
    /// configured time field overrides it.
    pub timestamp: DateTime<Utc>,
    /// The event's key / value content
    pub fields: TagMap<String, Value>,
}

impl Record {
    /// Create a Record with no fields
    pub fn new(timestamp: DateTime<Utc>) -> Record {
        Record {
            timestamp: timestamp,
            fields: TagMap::default(),
        }
    }

    /// Insert a new field into the Record
    ///
    /// If the key was already present the old value is replaced.
    ///
    /// # Examples
    /// ```
    /// extern crate chrono;
    /// extern crate pointcast;
    ///
    /// use chrono::{TimeZone, Utc};
    /// use pointcast::record::{Record, Value};
    ///
    /// # fn main() {
    /// let r = Record::new(Utc.timestamp_opt(0, 0).unwrap())
    ///     .insert_field("host", "a")
    ///     .insert_field("temp", 21);
    ///
    /// assert_eq!(r.fields.get("temp"), Some(&Value::Int(21)));
    /// # }
    /// ```
    pub fn insert_field<S, V>(mut self, key: S, val: V) -> Record
    where
        S: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), val.into());
        self
    }
}

/// Records display as their JSON form, for logging.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use quickcheck::{Arbitrary, Gen};
    use rand::Rng;

    impl Arbitrary for Value {
        fn arbitrary<G: Gen>(g: &mut G) -> Value {
            let i: usize = g.gen();
            match i % 4 {
                0 => Value::String(Arbitrary::arbitrary(g)),
                1 => Value::Int(g.gen()),
                // finite, so points built from it compare equal to themselves
                2 => Value::Float(g.gen_range(-1_000_000.0, 1_000_000.0)),
                _ => Value::Bool(g.gen()),
            }
        }
    }

    #[test]
    fn value_deserializes_untagged() {
        let vals: Vec<Value> =
            ::serde_json::from_str(r#"["a", 21, 21.5, true]"#).unwrap();
        assert_eq!(
            vals,
            vec![
                Value::String("a".into()),
                Value::Int(21),
                Value::Float(21.5),
                Value::Bool(true),
            ]
        );
    }

    #[test]
    fn record_serializes_fields_as_map() {
        let r = Record::new(Utc.timestamp_opt(1000, 0).unwrap())
            .insert_field("temp", 21)
            .insert_field("host", "a");
        let json = ::serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"1970-01-01T00:16:40Z","fields":{"host":"a","temp":21}}"#
        );
    }
}
