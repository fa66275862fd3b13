//! The influxdb client: delivers batches of records to the store.
//!
//! A client is driven by the host pipeline. It is connected once, handed
//! batches one at a time, and closed when the pipeline shuts down. Every
//! batch is answered exactly once: acknowledged, or handed back with the
//! records the host should redeliver.

use config::{InfluxDBConfig, TimePrecision};
use diagnostics::Diagnostics;
use observer::Observer;
use point::BatchPoints;
use record::Record;
use serializer::Serializer;
use std::fmt;
use std::mem;
use transport::{Connection, Endpoint, Error, Transport};

/// A batch of records from the host pipeline, answered exactly once.
pub trait Batch {
    /// The records of the batch, in order
    fn events(&self) -> &[Record];
    /// Every record is done with, delivered or dropped
    fn ack(self);
    /// `events` must be delivered again; the rest of the batch is done with
    fn retry_events(self, events: Vec<Record>);
}

enum State<C> {
    Disconnected,
    Connected(C),
    Closed,
}

/// Delivers batches to the store over a `Transport`.
pub struct Client<T, O, D>
where
    T: Transport,
{
    transport: T,
    endpoint: Endpoint,
    database: String,
    precision: TimePrecision,
    serializer: Serializer,
    observer: O,
    diagnostics: D,
    state: State<T::Connection>,
}

impl<T, O, D> Client<T, O, D>
where
    T: Transport,
    O: Observer,
    D: Diagnostics,
{
    /// Create a new, unconnected, Client.
    pub fn new(config: &InfluxDBConfig, transport: T, observer: O, diagnostics: D) -> Self {
        Client {
            transport: transport,
            endpoint: Endpoint {
                addr: config.addr.clone(),
                username: config.username.clone(),
                password: config.password.clone(),
                timeout: config.timeout,
                tls: config.tls.clone(),
            },
            database: config.db.clone(),
            precision: config.time_precision.clone(),
            serializer: Serializer::new(config),
            observer: observer,
            diagnostics: diagnostics,
            state: State::Disconnected,
        }
    }

    /// Whether the client holds an open connection.
    pub fn is_connected(&self) -> bool {
        match self.state {
            State::Connected(_) => true,
            _ => false,
        }
    }

    /// Open the connection to the store.
    ///
    /// Connecting an already connected client closes the old connection
    /// first. A failure to close it is logged and does not stop the new
    /// connection from being made.
    pub fn connect(&mut self) -> Result<(), Error> {
        debug!("Connect");
        if let State::Connected(old) = mem::replace(&mut self.state, State::Disconnected) {
            if let Err(e) = old.close() {
                warn!("Failed to close previous conn to influxdb: {}", e);
            }
        }
        match self.transport.connect(&self.endpoint) {
            Ok(conn) => {
                self.state = State::Connected(conn);
                info!("Client to influxdb has created: {}", self.endpoint.addr);
                Ok(())
            }
            Err(e) => {
                error!("Failed to create HTTP conn to influxdb: {}", e);
                Err(e)
            }
        }
    }

    /// Close the connection to the store, if one is open.
    pub fn close(&mut self) -> Result<(), Error> {
        debug!("Close connection");
        match mem::replace(&mut self.state, State::Closed) {
            State::Connected(conn) => conn.close(),
            _ => Ok(()),
        }
    }

    /// Deliver a batch.
    ///
    /// On success the batch is acknowledged. When the write fails the
    /// records that made it into the write are handed back to the batch for
    /// redelivery, records dropped during serialization are not, and the
    /// transport error is returned.
    pub fn publish<B>(&mut self, batch: B) -> Result<(), Error>
    where
        B: Batch,
    {
        let outcome = {
            let events = batch.events();
            self.observer.new_batch(events.len());
            self.publish_events(events)
                .map_err(|(failed, err)| (failed.to_vec(), err))
        };
        match outcome {
            Ok(()) => {
                batch.ack();
                Ok(())
            }
            Err((failed, err)) => {
                let n = failed.len();
                batch.retry_events(failed);
                self.observer.failed(n);
                Err(err)
            }
        }
    }

    /// Serialize and write `data`.
    ///
    /// On a failed write the serialized prefix of `data` is returned with
    /// the error; those are the records worth retrying. Writing nothing is
    /// a success and no write is made.
    pub fn publish_events<'a>(&mut self, data: &'a [Record]) -> Result<(), (&'a [Record], Error)> {
        let serialized = self.serializer
            .serialize(data, &self.diagnostics, &self.observer);
        if serialized.is_empty() {
            return Ok(());
        }

        let written = serialized.len();
        let mut bp = BatchPoints::new(self.database.clone(), self.precision.clone());
        for pt in serialized {
            bp.add_point(pt);
        }

        let res = match self.state {
            State::Connected(ref mut conn) => conn.write(&bp),
            _ => Err(Error::NotConnected),
        };

        match res {
            Ok(()) => {
                self.observer.acked(written);
                Ok(())
            }
            Err(err) => {
                let failed = &data[..written];
                error!(
                    "Failed to write {} records to influxdb: {}",
                    failed.len(),
                    err
                );
                for event in failed {
                    debug!("Failed record: {}", event);
                }
                Err((failed, err))
            }
        }
    }
}

impl<T, O, D> fmt::Display for Client<T, O, D>
where
    T: Transport,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "influxdb({})", self.endpoint.addr)
    }
}
