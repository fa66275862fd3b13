//! Pointcast is an InfluxDB output for event shipping pipelines. It takes the
//! structured events a pipeline collects, turns each into a time-series
//! point and delivers them to the store in batches, handing back to the
//! pipeline whatever the store refused so it can be redelivered.
//!
//! How an event becomes a point:
//!
//!  * The configured `measurement` key, when it holds a string, names the
//!    series. Otherwise the configured `measurement` itself does.
//!  * Keys listed in `send_as_tags` become tags.
//!  * The `send_as_time` key, when it holds an integer, is the point time
//!    at the configured precision. Otherwise the event time is.
//!  * Everything else is a field.
//!
//! The wire protocol is not spoken here. A `transport::Transport` carries
//! the points; the host pipeline supplies one along with its batches and
//! counters.
#![allow(unknown_lints)]
#![deny(trivial_numeric_casts, missing_docs, unstable_features, unused_import_braces)]
extern crate chrono;
extern crate serde;
extern crate serde_json;
extern crate toml;
extern crate url;

#[macro_use]
extern crate log;

#[macro_use]
extern crate serde_derive;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
extern crate rand;
#[cfg(test)]
extern crate tempdir;

pub mod classify;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod observer;
pub mod output;
pub mod point;
pub mod record;
pub mod serializer;
pub mod tagmap;
pub mod transport;
