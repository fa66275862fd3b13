//! Non-fatal conditions met while turning records into points.
//!
//! Classification never logs on its own. It hands back `Warning`s and the
//! serializer forwards them to whatever `Diagnostics` the output was built
//! with. `LogDiagnostics` is the one the host normally wants.

use record::Value;
use std::fmt;
use std::sync::Arc;

/// A condition that degrades a record without aborting it.
#[derive(Clone, Debug, PartialEq)]
pub enum Warning {
    /// The measurement key held something other than a string. The default
    /// series name is used and the key is classified like any other.
    UnsupportedSeriesNameType {
        /// The offending key
        key: String,
        /// Its value
        value: Value,
    },
    /// A tag key held a value that cannot become a tag. The key is dropped.
    UnsupportedTagType {
        /// The offending key
        key: String,
        /// Its value
        value: Value,
    },
    /// The configured time precision is not one the time field can be
    /// interpreted in. The record's own timestamp is used.
    UnsupportedTimePrecision(String),
    /// The time field's integer does not name a representable instant. The
    /// record's own timestamp is used.
    TimestampOutOfRange {
        /// The time field key
        key: String,
        /// Its value
        value: i64,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Warning::UnsupportedSeriesNameType { ref key, ref value } => write!(
                f,
                "Unsupported metric name type: {}={}({})",
                key,
                value,
                value.kind()
            ),
            Warning::UnsupportedTagType { ref key, ref value } => write!(
                f,
                "Unsupported tag type: {}={}({})",
                key,
                value,
                value.kind()
            ),
            Warning::UnsupportedTimePrecision(ref precision) => {
                write!(f, "Unsupported time precision: {}", precision)
            }
            Warning::TimestampOutOfRange { ref key, value } => {
                write!(f, "Timestamp out of range: {}={}", key, value)
            }
        }
    }
}

/// Where warnings go.
pub trait Diagnostics {
    /// Surface a single warning.
    fn warn(&self, warning: &Warning);
}

/// Forwards every warning to the `log` facade at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warn(&self, warning: &Warning) {
        warn!("{}", warning);
    }
}

impl<D> Diagnostics for Arc<D>
where
    D: Diagnostics + ?Sized,
{
    fn warn(&self, warning: &Warning) {
        (**self).warn(warning)
    }
}
