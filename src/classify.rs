//! Splitting an event's fields into a series name, tags and fields.

use diagnostics::Warning;
use record::Value;
use std::collections::HashSet;
use tagmap::TagMap;

/// The outcome of classifying one record's fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Classified {
    /// Series name read from the measurement key, if it held a string
    pub series: Option<String>,
    /// Fields sent as tags, coerced to strings
    pub tags: TagMap<String, String>,
    /// Everything that is not time, series name or tag
    pub fields: TagMap<String, Value>,
    /// Non-fatal conditions met along the way, in the order met
    pub warnings: Vec<Warning>,
}

/// Decides, key by key, what each field of a record becomes.
///
/// The classifier is pure. It does not log; the warnings it produces travel
/// back with the result.
#[derive(Clone, Debug)]
pub struct Classifier {
    measurement: String,
    time_field: Option<String>,
    tag_fields: HashSet<String>,
}

impl Classifier {
    /// Create a Classifier
    ///
    /// `measurement` is the key whose string value names the series.
    /// `time_field` is skipped entirely. Keys in `tag_fields` are sent as
    /// tags; empty keys there are ignored.
    pub fn new<S>(measurement: S, time_field: Option<String>, tag_fields: &[String]) -> Classifier
    where
        S: Into<String>,
    {
        Classifier {
            measurement: measurement.into(),
            time_field: time_field,
            tag_fields: tag_fields
                .iter()
                .filter(|f| !f.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// The key skipped as the time source, if any
    pub fn time_field(&self) -> Option<&str> {
        self.time_field.as_ref().map(|s| s.as_str())
    }

    /// Classify every key of `fields`.
    ///
    /// A measurement key holding a non-string is warned about and then
    /// treated like any other key, so it may still land in the tags or the
    /// fields.
    pub fn classify(&self, fields: &TagMap<String, Value>) -> Classified {
        let mut res = Classified {
            series: None,
            tags: TagMap::default(),
            fields: TagMap::default(),
            warnings: Vec::new(),
        };

        for &(ref k, ref v) in fields.iter() {
            if self.time_field.as_ref() == Some(k) {
                continue;
            }

            if *k == self.measurement {
                match *v {
                    Value::String(ref name) => {
                        res.series = Some(name.clone());
                        continue;
                    }
                    _ => res.warnings.push(Warning::UnsupportedSeriesNameType {
                        key: k.clone(),
                        value: v.clone(),
                    }),
                }
            }

            if !self.tag_fields.contains(k) {
                res.fields.insert(k.clone(), v.clone());
                continue;
            }

            match *v {
                Value::String(ref s) => {
                    res.tags.insert(k.clone(), s.clone());
                }
                Value::Int(i) => {
                    res.tags.insert(k.clone(), i.to_string());
                }
                _ => res.warnings.push(Warning::UnsupportedTagType {
                    key: k.clone(),
                    value: v.clone(),
                }),
            }
        }

        res
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};
    use record::Value;

    fn classifier() -> Classifier {
        Classifier::new(
            "metric",
            Some("ts".to_string()),
            &["host".to_string(), "code".to_string(), "".to_string()],
        )
    }

    fn fields(pairs: Vec<(&str, Value)>) -> TagMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn splits_tags_and_fields() {
        let c = classifier().classify(&fields(vec![
            ("host", Value::String("a".into())),
            ("temp", Value::Int(21)),
            ("ts", Value::Int(1000)),
        ]));

        assert_eq!(c.series, None);
        assert_eq!(c.tags.get("host"), Some(&"a".to_string()));
        assert_eq!(c.tags.len(), 1);
        assert_eq!(c.fields.get("temp"), Some(&Value::Int(21)));
        assert_eq!(c.fields.len(), 1);
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn integer_tags_are_decimal() {
        let c = classifier().classify(&fields(vec![
            ("code", Value::Int(-404)),
            ("host", Value::Int(7)),
        ]));
        assert_eq!(c.tags.get("code"), Some(&"-404".to_string()));
        assert_eq!(c.tags.get("host"), Some(&"7".to_string()));
        assert!(c.fields.is_empty());
    }

    #[test]
    fn unsupported_tag_types_are_dropped() {
        let c = classifier().classify(&fields(vec![
            ("code", Value::Float(1.5)),
            ("host", Value::Bool(true)),
            ("temp", Value::Float(1.5)),
        ]));
        assert!(c.tags.is_empty());
        assert_eq!(c.fields.len(), 1);
        assert!(!c.fields.contains_key("code"));
        assert!(!c.fields.contains_key("host"));
        assert_eq!(
            c.warnings,
            vec![
                Warning::UnsupportedTagType {
                    key: "code".into(),
                    value: Value::Float(1.5),
                },
                Warning::UnsupportedTagType {
                    key: "host".into(),
                    value: Value::Bool(true),
                },
            ]
        );
    }

    #[test]
    fn string_measurement_names_the_series_and_is_stripped() {
        let c = classifier().classify(&fields(vec![
            ("metric", Value::String("cpu".into())),
            ("value", Value::Float(0.5)),
        ]));
        assert_eq!(c.series, Some("cpu".to_string()));
        assert!(!c.fields.contains_key("metric"));
        assert!(!c.tags.contains_key("metric"));
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn non_string_measurement_falls_through_to_fields() {
        let c = classifier().classify(&fields(vec![
            ("metric", Value::Int(3)),
            ("value", Value::Float(0.5)),
        ]));
        assert_eq!(c.series, None);
        assert_eq!(c.fields.get("metric"), Some(&Value::Int(3)));
        assert_eq!(
            c.warnings,
            vec![Warning::UnsupportedSeriesNameType {
                key: "metric".into(),
                value: Value::Int(3),
            }]
        );
    }

    #[test]
    fn non_string_measurement_falls_through_to_tags() {
        let c = Classifier::new("host", None, &["host".to_string()]).classify(&fields(vec![
            ("host", Value::Int(3)),
            ("value", Value::Float(0.5)),
        ]));
        assert_eq!(c.series, None);
        assert_eq!(c.tags.get("host"), Some(&"3".to_string()));
        assert!(!c.fields.contains_key("host"));
        assert_eq!(c.warnings.len(), 1);
    }

    #[test]
    fn measurement_that_is_also_a_tag_key_prefers_series() {
        let c = Classifier::new("host", None, &["host".to_string()]).classify(&fields(vec![
            ("host", Value::String("a".into())),
            ("value", Value::Float(0.5)),
        ]));
        assert_eq!(c.series, Some("a".to_string()));
        assert!(c.tags.is_empty());
    }

    #[test]
    fn time_field_never_classified() {
        fn inner(v: Value, is_tag: bool, is_measurement: bool) -> TestResult {
            let tags = if is_tag { vec!["ts".to_string()] } else { Vec::new() };
            let measurement = if is_measurement { "ts" } else { "metric" };
            let classifier = Classifier::new(measurement, Some("ts".to_string()), &tags);
            let c = classifier.classify(&fields(vec![("ts", v), ("x", Value::Int(1))]));
            assert!(!c.tags.contains_key("ts"));
            assert!(!c.fields.contains_key("ts"));
            assert_eq!(c.series, None);
            assert!(c.warnings.is_empty());
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(Value, bool, bool) -> TestResult);
    }

    #[test]
    fn classification_is_deterministic() {
        fn inner(pairs: Vec<(String, Value)>) -> TestResult {
            let input: TagMap<String, Value> = pairs.into_iter().collect();
            let lhs = classifier().classify(&input);
            let rhs = classifier().classify(&input);
            assert_eq!(lhs, rhs);
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(Vec<(String, Value)>) -> TestResult);
    }
}
