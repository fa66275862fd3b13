//! Turning a batch of records into points.

use chrono::{DateTime, TimeZone, Utc};
use classify::Classifier;
use config::{InfluxDBConfig, TimePrecision};
use diagnostics::{Diagnostics, Warning};
use observer::Observer;
use point::{self, EncodingError, Point};
use record::{Record, Value};

/// Maps records to points, one to one and in order.
#[derive(Clone, Debug)]
pub struct Serializer {
    classifier: Classifier,
    default_series: String,
    precision: TimePrecision,
}

impl Serializer {
    /// Create a Serializer from the output configuration
    pub fn new(config: &InfluxDBConfig) -> Serializer {
        Serializer {
            classifier: Classifier::new(
                config.measurement.clone(),
                config.send_as_time.clone(),
                &config.send_as_tags,
            ),
            default_series: config.measurement.clone(),
            precision: config.time_precision.clone(),
        }
    }

    /// The time a record's point will carry.
    ///
    /// An integer in the time field wins, read at the configured precision.
    /// In every other case the record's own timestamp is kept, with a
    /// warning when the field was there but could not be used.
    pub fn timestamp(&self, record: &Record) -> (DateTime<Utc>, Option<Warning>) {
        let key = match self.classifier.time_field() {
            Some(key) => key,
            None => return (record.timestamp, None),
        };
        let v = match record.fields.get(key) {
            Some(&Value::Int(v)) => v,
            _ => return (record.timestamp, None),
        };
        let t = match self.precision {
            TimePrecision::Seconds => Utc.timestamp_opt(v, 0).single(),
            TimePrecision::Milliseconds => Utc.timestamp_millis_opt(v).single(),
            TimePrecision::Other(ref p) => {
                return (
                    record.timestamp,
                    Some(Warning::UnsupportedTimePrecision(p.clone())),
                )
            }
        };
        match t {
            Some(t) => (t, None),
            None => (
                record.timestamp,
                Some(Warning::TimestampOutOfRange {
                    key: key.to_string(),
                    value: v,
                }),
            ),
        }
    }

    /// Build the point for a single record.
    ///
    /// Warnings are handed to `diagnostics` in the order they are met.
    pub fn point<D>(&self, record: &Record, diagnostics: &D) -> Result<Point, EncodingError>
    where
        D: Diagnostics,
    {
        let (ts, warning) = self.timestamp(record);
        if let Some(ref w) = warning {
            diagnostics.warn(w);
        }

        let classified = self.classifier.classify(&record.fields);
        for w in &classified.warnings {
            diagnostics.warn(w);
        }
        debug!(
            "measurement: {}, tags: {:?}, fields: {:?}, ts: {}",
            classified.series.as_ref().unwrap_or(&self.default_series),
            classified.tags,
            classified.fields,
            ts
        );

        point::encode(
            classified.series,
            &self.default_series,
            classified.tags,
            classified.fields,
            ts,
        )
    }

    /// Serialize `records` into points.
    ///
    /// Serialization stops at the first record that cannot be encoded: the
    /// points built up to there are returned and everything from the bad
    /// record on is dropped. The number dropped is always reported to
    /// `observer`, so that `dropped + points.len() == records.len()`.
    pub fn serialize<D, O>(&self, records: &[Record], diagnostics: &D, observer: &O) -> Vec<Point>
    where
        D: Diagnostics,
        O: Observer,
    {
        let mut to = Vec::with_capacity(records.len());

        for record in records {
            match self.point(record, diagnostics) {
                Ok(p) => to.push(p),
                Err(e) => {
                    error!("Encoding event failed with error: {}", e);
                    debug!("Failed record: {}", record);
                    break;
                }
            }
        }

        let dropped = records.len() - to.len();
        observer.dropped(dropped);
        if dropped > 0 {
            info!("Number of dropped points: {}/{}", dropped, records.len());
        }

        to
    }
}
