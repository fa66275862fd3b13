//! Building the influxdb output from its configuration table.
//!
//! The host pipeline registers outputs by name and calls the factory with
//! the output's configuration. What comes back is an output `Group`: the
//! clients plus the batching and retry parameters the host schedules them
//! with.

use client::Client;
use config::{self, Backoff};
use diagnostics::Diagnostics;
use observer::Observer;
use std::error;
use std::fmt;
use toml;
use transport::Transport;

/// The name the output registers under.
pub const NAME: &str = "influxdb";

/// Clients and the delivery parameters the host pipeline uses with them.
pub struct Group<T, O, D>
where
    T: Transport,
{
    /// Largest batch to hand a client
    pub batch_size: usize,
    /// Redelivery attempts before a batch is dropped, -1 for no limit
    pub max_retries: i64,
    /// Delays between redeliveries
    pub backoff: Backoff,
    /// The clients, one per connection
    pub clients: Vec<Client<T, O, D>>,
}

/// Output construction errors
#[derive(Debug)]
pub enum Error {
    /// The configuration table was rejected
    Config(config::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Config(ref e) => write!(f, "could not build {} output: {}", NAME, e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(error::Error + 'static)> {
        match *self {
            Error::Config(ref e) => Some(e),
        }
    }
}

impl From<config::Error> for Error {
    fn from(e: config::Error) -> Error {
        Error::Config(e)
    }
}

/// Build the influxdb output.
///
/// The table is read over the defaults and validated, TLS settings
/// included, before the client is made. The client is not connected; that
/// is up to the host.
pub fn make_influxdb<T, O, D>(
    table: &toml::Value,
    transport: T,
    observer: O,
    diagnostics: D,
) -> Result<Group<T, O, D>, Error>
where
    T: Transport,
    O: Observer,
    D: Diagnostics,
{
    let config = config::parse_table(table)?;
    config.validate()?;

    let client = Client::new(&config, transport, observer, diagnostics);
    debug!("Built output {}", client);

    Ok(Group {
        batch_size: config.bulk_max_size,
        max_retries: config.max_retries,
        backoff: config.backoff,
        clients: vec![client],
    })
}
