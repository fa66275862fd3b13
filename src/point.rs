//! Points, the unit the store ingests.

use chrono::{DateTime, Utc};
use config::TimePrecision;
use record::Value;
use std::error;
use std::fmt;
use tagmap::TagMap;

/// Longest series key, measured as series + tags + field key, the store
/// accepts.
pub const MAX_KEY_LENGTH: usize = 65_535;

/// The earliest timestamp the store accepts, in nanoseconds since the
/// epoch. `i64::MIN` and `i64::MIN + 1` are reserved by the store.
pub const MIN_NANO_TIME: i64 = ::std::i64::MIN + 2;

/// The latest timestamp the store accepts, in nanoseconds since the epoch.
/// `i64::MAX` is reserved by the store.
pub const MAX_NANO_TIME: i64 = ::std::i64::MAX - 1;

/// Reasons a point cannot be built.
#[derive(Clone, Debug, PartialEq)]
pub enum EncodingError {
    /// A point must carry at least one field
    NoFields,
    /// Field keys must not be empty
    EmptyFieldKey,
    /// NaN and +/-Inf cannot be stored
    UnsupportedFloat {
        /// The field key
        key: String,
        /// The offending float
        value: f64,
    },
    /// The timestamp does not fit in signed 64-bit nanoseconds
    TimeOutOfRange(DateTime<Utc>),
    /// The series key for a field is longer than `MAX_KEY_LENGTH`
    KeyTooLong(usize),
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodingError::NoFields => write!(f, "Point without fields is unsupported"),
            EncodingError::EmptyFieldKey => write!(f, "all fields must have non-empty names"),
            EncodingError::UnsupportedFloat { ref key, value } => {
                write!(f, "{} is an unsupported value for field {}", value, key)
            }
            EncodingError::TimeOutOfRange(ref t) => write!(f, "time outside range: {}", t),
            EncodingError::KeyTooLong(sz) => {
                write!(f, "max key length exceeded: {} > {}", sz, MAX_KEY_LENGTH)
            }
        }
    }
}

impl error::Error for EncodingError {}

/// A single point: series name, tags, fields and time.
///
/// Points can only be made through `Point::new` or `encode`, so every Point
/// in hand satisfies the store's constraints.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    series: String,
    tags: TagMap<String, String>,
    fields: TagMap<String, Value>,
    timestamp: DateTime<Utc>,
}

impl Point {
    /// Create a Point, checking it against the store's constraints.
    pub fn new<S>(
        series: S,
        tags: TagMap<String, String>,
        fields: TagMap<String, Value>,
        timestamp: DateTime<Utc>,
    ) -> Result<Point, EncodingError>
    where
        S: Into<String>,
    {
        if fields.is_empty() {
            return Err(EncodingError::NoFields);
        }
        match timestamp.timestamp_nanos_opt() {
            Some(ns) if ns >= MIN_NANO_TIME && ns <= MAX_NANO_TIME => {}
            _ => return Err(EncodingError::TimeOutOfRange(timestamp)),
        }
        for &(ref k, ref v) in fields.iter() {
            if let Value::Float(x) = *v {
                if x.is_nan() || x.is_infinite() {
                    return Err(EncodingError::UnsupportedFloat {
                        key: k.clone(),
                        value: x,
                    });
                }
            }
            if k.is_empty() {
                return Err(EncodingError::EmptyFieldKey);
            }
        }

        let series = series.into();
        let key_len = tags.iter()
            .fold(series.len(), |acc, &(ref k, ref v)| acc + k.len() + v.len() + 2);
        for k in fields.keys() {
            // series key, the "#!~#" separator and the field key
            let sz = key_len + 4 + k.len();
            if sz > MAX_KEY_LENGTH {
                return Err(EncodingError::KeyTooLong(sz));
            }
        }

        Ok(Point {
            series: series,
            tags: tags,
            fields: fields,
            timestamp: timestamp,
        })
    }

    /// The series (measurement) name
    pub fn series(&self) -> &str {
        &self.series
    }

    /// The point's tags
    pub fn tags(&self) -> &TagMap<String, String> {
        &self.tags
    }

    /// The point's fields
    pub fn fields(&self) -> &TagMap<String, Value> {
        &self.fields
    }

    /// The point's time
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Build a Point from a classified record.
///
/// `series` wins when present, otherwise the point goes under
/// `default_series`.
pub fn encode(
    series: Option<String>,
    default_series: &str,
    tags: TagMap<String, String>,
    fields: TagMap<String, Value>,
    timestamp: DateTime<Utc>,
) -> Result<Point, EncodingError> {
    let series = series.unwrap_or_else(|| default_series.to_string());
    Point::new(series, tags, fields, timestamp)
}

/// The points of one write, with the database they go to.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchPoints {
    /// Target database
    pub database: String,
    /// Precision the store should keep the timestamps at
    pub precision: TimePrecision,
    /// The points, in record order
    pub points: Vec<Point>,
}

impl BatchPoints {
    /// Create an empty BatchPoints
    pub fn new<S>(database: S, precision: TimePrecision) -> BatchPoints
    where
        S: Into<String>,
    {
        BatchPoints {
            database: database.into(),
            precision: precision,
            points: Vec::new(),
        }
    }

    /// Append a point
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Number of points in the batch
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the batch holds no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use std::f64;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1000, 0).unwrap()
    }

    fn one_field() -> TagMap<String, Value> {
        let mut fields = TagMap::default();
        fields.insert("value".to_string(), Value::Int(1));
        fields
    }

    #[test]
    fn encode_falls_back_to_default_series() {
        let p = encode(None, "metric", TagMap::default(), one_field(), t0()).unwrap();
        assert_eq!(p.series(), "metric");
        assert_eq!(p.timestamp(), t0());

        let p = encode(
            Some("cpu".into()),
            "metric",
            TagMap::default(),
            one_field(),
            t0(),
        ).unwrap();
        assert_eq!(p.series(), "cpu");
    }

    #[test]
    fn point_without_fields_is_unsupported() {
        let res = encode(None, "metric", TagMap::default(), TagMap::default(), t0());
        assert_eq!(res, Err(EncodingError::NoFields));
    }

    #[test]
    fn non_finite_floats_are_unsupported() {
        for x in &[f64::INFINITY, f64::NEG_INFINITY] {
            let mut fields = one_field();
            fields.insert("bad".to_string(), Value::Float(*x));
            match Point::new("metric", TagMap::default(), fields, t0()) {
                Err(EncodingError::UnsupportedFloat { key, .. }) => assert_eq!(key, "bad"),
                other => panic!("unexpected {:?}", other),
            }
        }

        let mut fields = one_field();
        fields.insert("bad".to_string(), Value::Float(f64::NAN));
        match Point::new("metric", TagMap::default(), fields, t0()) {
            Err(EncodingError::UnsupportedFloat { value, .. }) => assert!(value.is_nan()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_field_key_is_unsupported() {
        let mut fields = one_field();
        fields.insert(String::new(), Value::Bool(true));
        let res = Point::new("metric", TagMap::default(), fields, t0());
        assert_eq!(res, Err(EncodingError::EmptyFieldKey));
    }

    #[test]
    fn time_outside_nanosecond_range() {
        let far = Utc.timestamp_opt(10_000_000_000, 0).unwrap();
        let res = Point::new("metric", TagMap::default(), one_field(), far);
        assert_eq!(res, Err(EncodingError::TimeOutOfRange(far)));

        let early = Utc.timestamp_opt(-10_000_000_000, 0).unwrap();
        let res = Point::new("metric", TagMap::default(), one_field(), early);
        assert_eq!(res, Err(EncodingError::TimeOutOfRange(early)));
    }

    #[test]
    fn reserved_nanosecond_times() {
        for ns in &[::std::i64::MAX, ::std::i64::MIN, ::std::i64::MIN + 1] {
            let t = Utc.timestamp_nanos(*ns);
            let res = Point::new("metric", TagMap::default(), one_field(), t);
            assert_eq!(res, Err(EncodingError::TimeOutOfRange(t)));
        }
        for ns in &[MAX_NANO_TIME, MIN_NANO_TIME] {
            let t = Utc.timestamp_nanos(*ns);
            assert!(Point::new("metric", TagMap::default(), one_field(), t).is_ok());
        }
    }

    #[test]
    fn key_length_is_bounded() {
        let mut tags = TagMap::default();
        tags.insert("host".to_string(), "h".repeat(MAX_KEY_LENGTH));
        match Point::new("metric", tags, one_field(), t0()) {
            Err(EncodingError::KeyTooLong(sz)) => assert!(sz > MAX_KEY_LENGTH),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn batch_points_keep_order() {
        let mut bp = BatchPoints::new("db", TimePrecision::Seconds);
        assert!(bp.is_empty());
        for series in &["a", "b", "c"] {
            bp.add_point(Point::new(*series, TagMap::default(), one_field(), t0()).unwrap());
        }
        assert_eq!(bp.len(), 3);
        let names: Vec<&str> = bp.points.iter().map(|p| p.series()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
