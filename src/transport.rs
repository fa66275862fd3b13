//! The seam between the output and whatever carries points to the store.
//!
//! The output never speaks the store's wire protocol itself. It hands a
//! `BatchPoints` to a `Connection` obtained from a `Transport` and acts on
//! the outcome.

use config::TlsConfig;
use point::BatchPoints;
use std::error;
use std::fmt;
use std::time::Duration;

/// Where and how to reach the store.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoint {
    /// URL of the store
    pub addr: String,
    /// Credentials, empty when unused
    pub username: String,
    /// Credentials, empty when unused
    pub password: String,
    /// Bound on a single write
    pub timeout: Duration,
    /// TLS settings, if any
    pub tls: Option<TlsConfig>,
}

/// Opens connections to the store.
pub trait Transport {
    /// The open connection type
    type Connection: Connection;

    /// Open a connection to `endpoint`.
    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Connection, Error>;
}

/// An open connection to the store.
pub trait Connection {
    /// Write every point of `batch` as one request. The write either lands
    /// as a whole or fails as a whole.
    fn write(&mut self, batch: &BatchPoints) -> Result<(), Error>;

    /// Release the connection.
    fn close(self) -> Result<(), Error>;
}

/// Transport errors
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The connection could not be established
    Connect(String),
    /// The store rejected or never received a write
    Write(String),
    /// The connection did not close cleanly
    Close(String),
    /// A write was attempted with no open connection
    NotConnected,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Connect(ref e) => write!(f, "could not connect: {}", e),
            Error::Write(ref e) => write!(f, "write failed: {}", e),
            Error::Close(ref e) => write!(f, "close failed: {}", e),
            Error::NotConnected => write!(f, "not connected"),
        }
    }
}

impl error::Error for Error {}
