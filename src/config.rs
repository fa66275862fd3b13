//! Provides the configuration parser for the influxdb output
//!
//! The host pipeline hands the output a TOML table. This module reads that
//! table over the documented defaults and validates the result before any
//! client is built from it.

use std::error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml;
use url::Url;

/// How the integer in the configured time field is interpreted.
#[derive(Clone, Debug, PartialEq)]
pub enum TimePrecision {
    /// Seconds since the epoch, `"s"`
    Seconds,
    /// Milliseconds since the epoch, `"ms"`
    Milliseconds,
    /// Anything else. Accepted by the parser; the time field is ignored with
    /// a warning when records are serialized.
    Other(String),
}

impl TimePrecision {
    /// Interpret a configured precision string.
    pub fn parse(s: &str) -> TimePrecision {
        match s {
            "s" => TimePrecision::Seconds,
            "ms" => TimePrecision::Milliseconds,
            other => TimePrecision::Other(other.to_string()),
        }
    }

    /// The precision as it was configured.
    pub fn as_str(&self) -> &str {
        match *self {
            TimePrecision::Seconds => "s",
            TimePrecision::Milliseconds => "ms",
            TimePrecision::Other(ref s) => s,
        }
    }
}

impl fmt::Display for TimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Redelivery backoff parameters. The host pipeline owns the schedule;
/// the output only carries these values to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Backoff {
    /// Delay before the first redelivery
    pub init: Duration,
    /// Upper bound on the delay between redeliveries
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Backoff {
        Backoff {
            init: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

/// How strictly the remote certificate is checked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VerificationMode {
    /// Verify the certificate chain and hostname
    Full,
    /// Accept any certificate
    None,
}

/// TLS settings for the connection to the store. Plain data; the transport
/// is responsible for applying them.
#[derive(Clone, Debug, PartialEq)]
pub struct TlsConfig {
    /// Whether TLS is used at all
    pub enabled: bool,
    /// PEM files of the authorities trusted to sign the server certificate
    pub certificate_authorities: Vec<PathBuf>,
    /// Client certificate, for mutual TLS
    pub certificate: Option<PathBuf>,
    /// Key of the client certificate
    pub key: Option<PathBuf>,
    /// See `VerificationMode`
    pub verification_mode: VerificationMode,
}

impl Default for TlsConfig {
    fn default() -> TlsConfig {
        TlsConfig {
            enabled: true,
            certificate_authorities: Vec::new(),
            certificate: None,
            key: None,
            verification_mode: VerificationMode::Full,
        }
    }
}

impl TlsConfig {
    /// Check that the TLS settings can be loaded.
    ///
    /// A client certificate and its key come as a pair and every configured
    /// file must exist. Disabled settings are always valid.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.enabled {
            return Ok(());
        }
        match (&self.certificate, &self.key) {
            (&Some(_), &None) => {
                return Err(Error::Tls("ssl.certificate is set but ssl.key is not".into()))
            }
            (&None, &Some(_)) => {
                return Err(Error::Tls("ssl.key is set but ssl.certificate is not".into()))
            }
            _ => {}
        }
        let files = self.certificate_authorities
            .iter()
            .chain(self.certificate.iter())
            .chain(self.key.iter());
        for path in files {
            readable_file(path)?;
        }
        Ok(())
    }
}

fn readable_file(path: &Path) -> Result<(), Error> {
    match fs::metadata(path) {
        Ok(ref md) if md.is_file() => Ok(()),
        Ok(_) => Err(Error::Tls(format!("{} is not a file", path.display()))),
        Err(e) => Err(Error::Tls(format!("could not read {}: {}", path.display(), e))),
    }
}

/// Configuration for the influxdb output
///
/// InfluxDB is a time-series store. Every event the output receives becomes
/// one point: `measurement` and `send_as_tags` decide how the event's fields
/// are split into a series name, tags and fields, and `send_as_time` names
/// the field that, when present, overrides the event time.
#[derive(Clone, Debug, PartialEq)]
pub struct InfluxDBConfig {
    /// Bound on a single write, enforced by the transport
    pub timeout: Duration,
    /// Largest batch the host pipeline should hand the output
    pub bulk_max_size: usize,
    /// Redelivery attempts before the host drops a batch. -1 retries
    /// forever.
    pub max_retries: i64,
    /// TLS settings, `None` when the `ssl` table is absent
    pub tls: Option<TlsConfig>,
    /// See `Backoff`
    pub backoff: Backoff,
    /// Credentials for the store
    pub username: String,
    /// Credentials for the store
    pub password: String,
    /// URL of the store, `http://` or `https://`
    pub addr: String,
    /// The database points are written to
    pub db: String,
    /// Both the event key read as the series name and the series name used
    /// when that key is missing or unusable.
    pub measurement: String,
    /// See `TimePrecision`
    pub time_precision: TimePrecision,
    /// Event keys sent as tags rather than fields
    pub send_as_tags: Vec<String>,
    /// Event key holding the point time, if any
    pub send_as_time: Option<String>,
}

impl Default for InfluxDBConfig {
    fn default() -> InfluxDBConfig {
        InfluxDBConfig {
            timeout: Duration::from_secs(5),
            bulk_max_size: 2048,
            max_retries: 3,
            tls: None,
            backoff: Backoff::default(),
            username: String::new(),
            password: String::new(),
            addr: "http://localhost:8086".to_string(),
            db: "db".to_string(),
            measurement: "metric".to_string(),
            time_precision: TimePrecision::Seconds,
            send_as_tags: Vec::new(),
            send_as_time: None,
        }
    }
}

impl InfluxDBConfig {
    /// Check the configuration for values no client can be built from.
    pub fn validate(&self) -> Result<(), Error> {
        let url = Url::parse(&self.addr).map_err(|e| Error::Invalid {
            key: "addr",
            reason: format!("{}", e),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Invalid {
                key: "addr",
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if url.host_str().is_none() {
            return Err(Error::Invalid {
                key: "addr",
                reason: "no host".into(),
            });
        }
        if self.measurement.is_empty() {
            return Err(Error::Invalid {
                key: "measurement",
                reason: "must not be empty".into(),
            });
        }
        if self.bulk_max_size == 0 {
            return Err(Error::Invalid {
                key: "bulk_max_size",
                reason: "must be positive".into(),
            });
        }
        if self.max_retries < -1 {
            return Err(Error::Invalid {
                key: "max_retries",
                reason: "must be -1 or greater".into(),
            });
        }
        if self.backoff.init > self.backoff.max {
            return Err(Error::Invalid {
                key: "backoff.init",
                reason: "must not exceed backoff.max".into(),
            });
        }
        if let Some(ref tls) = self.tls {
            tls.validate()?;
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum Error {
    /// The buffer is not TOML
    Parse(toml::de::Error),
    /// A key held the wrong TOML type
    WrongType {
        /// The dotted key
        key: &'static str,
        /// What was expected there
        expected: &'static str,
    },
    /// A key held a value out of its domain
    Invalid {
        /// The dotted key
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
    /// The TLS settings cannot be loaded
    Tls(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Parse(ref e) => write!(f, "could not parse config: {}", e),
            Error::WrongType { key, expected } => {
                write!(f, "could not parse {}: expected {}", key, expected)
            }
            Error::Invalid { key, ref reason } => {
                write!(f, "invalid {}: {}", key, reason)
            }
            Error::Tls(ref reason) => write!(f, "invalid ssl settings: {}", reason),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(error::Error + 'static)> {
        match *self {
            Error::Parse(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Error {
        Error::Parse(e)
    }
}

/// Parse the influxdb output configuration from a TOML buffer.
///
/// The buffer holds the output's own table, not the host's whole
/// configuration. The result is validated before it is returned.
pub fn parse_config_file(buffer: &str) -> Result<InfluxDBConfig, Error> {
    let value: toml::Value = toml::from_str(buffer)?;
    let config = parse_table(&value)?;
    config.validate()?;
    Ok(config)
}

/// Read an already parsed TOML table over the defaults.
///
/// Keys that are absent keep their default. No validation is done here,
/// see `InfluxDBConfig::validate`.
pub fn parse_table(value: &toml::Value) -> Result<InfluxDBConfig, Error> {
    let mut res = InfluxDBConfig::default();

    if let Some(v) = value.get("timeout") {
        res.timeout = duration(v, "timeout")?;
    }
    if let Some(v) = value.get("bulk_max_size") {
        let size = integer(v, "bulk_max_size")?;
        if size < 0 {
            return Err(Error::Invalid {
                key: "bulk_max_size",
                reason: "must be positive".into(),
            });
        }
        res.bulk_max_size = size as usize;
    }
    if let Some(v) = value.get("max_retries") {
        res.max_retries = integer(v, "max_retries")?;
    }
    if let Some(bkf) = value.get("backoff") {
        if bkf.as_table().is_none() {
            return Err(Error::WrongType {
                key: "backoff",
                expected: "table",
            });
        }
        if let Some(v) = bkf.get("init") {
            res.backoff.init = duration(v, "backoff.init")?;
        }
        if let Some(v) = bkf.get("max") {
            res.backoff.max = duration(v, "backoff.max")?;
        }
    }
    if let Some(ssl) = value.get("ssl") {
        res.tls = Some(tls(ssl)?);
    }
    if let Some(v) = value.get("username") {
        res.username = string(v, "username")?;
    }
    if let Some(v) = value.get("password") {
        res.password = string(v, "password")?;
    }
    if let Some(v) = value.get("addr") {
        res.addr = string(v, "addr")?;
    }
    if let Some(v) = value.get("db") {
        res.db = string(v, "db")?;
    }
    if let Some(v) = value.get("measurement") {
        res.measurement = string(v, "measurement")?;
    }
    if let Some(v) = value.get("time_precision") {
        res.time_precision = TimePrecision::parse(&string(v, "time_precision")?);
    }
    if let Some(v) = value.get("send_as_tags") {
        res.send_as_tags = strings(v, "send_as_tags")?;
    }
    if let Some(v) = value.get("send_as_time") {
        let key = string(v, "send_as_time")?;
        res.send_as_time = if key.is_empty() { None } else { Some(key) };
    }

    Ok(res)
}

fn tls(ssl: &toml::Value) -> Result<TlsConfig, Error> {
    if ssl.as_table().is_none() {
        return Err(Error::WrongType {
            key: "ssl",
            expected: "table",
        });
    }
    let mut res = TlsConfig::default();
    if let Some(v) = ssl.get("enabled") {
        res.enabled = v.as_bool().ok_or(Error::WrongType {
            key: "ssl.enabled",
            expected: "boolean",
        })?;
    }
    if let Some(v) = ssl.get("certificate_authorities") {
        res.certificate_authorities = strings(v, "ssl.certificate_authorities")?
            .into_iter()
            .map(PathBuf::from)
            .collect();
    }
    if let Some(v) = ssl.get("certificate") {
        res.certificate = Some(PathBuf::from(string(v, "ssl.certificate")?));
    }
    if let Some(v) = ssl.get("key") {
        res.key = Some(PathBuf::from(string(v, "ssl.key")?));
    }
    if let Some(v) = ssl.get("verification_mode") {
        res.verification_mode = match string(v, "ssl.verification_mode")?.as_str() {
            "full" => VerificationMode::Full,
            "none" => VerificationMode::None,
            other => {
                return Err(Error::Invalid {
                    key: "ssl.verification_mode",
                    reason: format!("unknown mode {}", other),
                })
            }
        };
    }
    Ok(res)
}

fn string(v: &toml::Value, key: &'static str) -> Result<String, Error> {
    v.as_str().map(|s| s.to_string()).ok_or(Error::WrongType {
        key: key,
        expected: "string",
    })
}

fn integer(v: &toml::Value, key: &'static str) -> Result<i64, Error> {
    v.as_integer().ok_or(Error::WrongType {
        key: key,
        expected: "integer",
    })
}

fn strings(v: &toml::Value, key: &'static str) -> Result<Vec<String>, Error> {
    let wrong = Error::WrongType {
        key: key,
        expected: "array of strings",
    };
    match v.as_array() {
        Some(arr) => {
            let mut res = Vec::with_capacity(arr.len());
            for s in arr {
                match s.as_str() {
                    Some(s) => res.push(s.to_string()),
                    None => return Err(wrong),
                }
            }
            Ok(res)
        }
        None => Err(wrong),
    }
}

/// Durations are integer or float seconds, or a string of one or more
/// number and unit pairs: `250ms`, `1.5s`, `1m30s`, `1h`. Units are `ns`,
/// `us`, `ms`, `s`, `m` and `h`. A bare number in a string is seconds.
fn duration(v: &toml::Value, key: &'static str) -> Result<Duration, Error> {
    if let Some(secs) = v.as_integer() {
        if secs < 0 {
            return Err(Error::Invalid {
                key: key,
                reason: "must not be negative".into(),
            });
        }
        return Ok(Duration::from_secs(secs as u64));
    }
    if let Some(secs) = v.as_float() {
        return seconds(secs, key);
    }
    let s = match v.as_str() {
        Some(s) => s.trim(),
        None => {
            return Err(Error::WrongType {
                key: key,
                expected: "number or duration string",
            })
        }
    };
    let invalid = |reason: &str| Error::Invalid {
        key: key,
        reason: format!("{} in duration {:?}", reason, s),
    };
    let numeric = |c: char| c.is_digit(10) || c == '.';

    if !s.is_empty() && s.chars().all(&numeric) {
        let secs: f64 = s.parse().map_err(|_| invalid("bad number"))?;
        return seconds(secs, key);
    }

    let mut total = 0.0;
    let mut rest = s;
    if rest.is_empty() {
        return Err(invalid("no value"));
    }
    while !rest.is_empty() {
        let split = rest.find(|c: char| !numeric(c)).unwrap_or(rest.len());
        let (num, tail) = rest.split_at(split);
        let split = tail.find(&numeric).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(split);

        let n: f64 = num.parse().map_err(|_| invalid("bad number"))?;
        let scale = match unit {
            "ns" => 1e-9,
            "us" | "\u{b5}s" | "\u{3bc}s" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid("unknown unit")),
        };
        total += n * scale;
        rest = tail;
    }
    seconds(total, key)
}

fn seconds(secs: f64, key: &'static str) -> Result<Duration, Error> {
    if !secs.is_finite() || secs < 0.0 || secs >= ::std::u64::MAX as f64 {
        return Err(Error::Invalid {
            key: key,
            reason: format!("{} is not a usable number of seconds", secs),
        });
    }
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    Ok(Duration::new(whole as u64, 0) + Duration::from_nanos(u64::from(nanos)))
}
