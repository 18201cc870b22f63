//! End-to-end flow: scan, connect, stream, tear down.

use std::fmt;
use std::future::Future;
use std::io::Write;

use crate::adapter::{Advertisement, Central, Link};
use crate::config::Config;
use crate::console::Console;
use crate::session::{self, Connection, Session};
use crate::{monitor, selector, Error};

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The device disconnected or stopped sending notifications.
    Disconnected,
    /// The cancellation future resolved.
    Cancelled,
    /// Nothing usable was found, or an operation failed.
    Aborted(Error),
}

impl Outcome {
    /// Whether the run ended because an operation failed.
    pub fn is_failure(&self) -> bool {
        match self {
            Outcome::Aborted(e) => !e.is_not_found(),
            _ => false,
        }
    }
}

/// The single line reported when a run ends. Empty for cancellation.
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Disconnected => write!(f, "Device disconnected"),
            Outcome::Cancelled => Ok(()),
            Outcome::Aborted(e) if e.is_not_found() => write!(f, "Not found: {}", e),
            Outcome::Aborted(e) => write!(f, "Error: {}", e),
        }
    }
}

enum State<L: Link> {
    Scanning,
    Found(Advertisement),
    Connected(Connection<L>),
    Streaming(Session<L>),
    Finished(Outcome),
}

/// Find a heart rate device, stream its measurements to `console` and
/// disconnect again.
///
/// `cancel` is raced against every step. A session that was opened is always
/// closed before this returns.
pub async fn run<C, W>(
    central: &C,
    config: &Config,
    console: &mut Console<W>,
    cancel: impl Future<Output = ()>,
) -> Outcome
where
    C: Central,
    W: Write,
{
    tokio::pin!(cancel);

    let mut state = State::Scanning;
    loop {
        state = match state {
            State::Scanning => {
                let selected = tokio::select! {
                    _ = &mut cancel => None,
                    selected = selector::select(central, config, console) => Some(selected),
                };
                match selected {
                    Some(Ok(Some(device))) => State::Found(device),
                    Some(Ok(None)) => State::Finished(Outcome::Aborted(Error::DiscoveryTimeout)),
                    Some(Err(e)) => State::Finished(Outcome::Aborted(e)),
                    None => {
                        if let Err(e) = central.stop_scan().await {
                            log::warn!("Failed to stop the scan: {}", e);
                        }
                        State::Finished(Outcome::Cancelled)
                    }
                }
            }
            State::Found(device) => tokio::select! {
                _ = &mut cancel => State::Finished(Outcome::Cancelled),
                connected = session::connect(central, &device) => match connected {
                    Ok(connection) => State::Connected(connection),
                    Err(e) => State::Finished(Outcome::Aborted(e)),
                },
            },
            State::Connected(mut connection) => {
                let resolved = tokio::select! {
                    _ = &mut cancel => None,
                    resolved = session::resolve(connection.link()) => Some(resolved),
                };
                match resolved {
                    Some(Ok((characteristic, notifications))) => State::Streaming(
                        Session::from_parts(connection, characteristic, notifications),
                    ),
                    Some(Err(e)) => {
                        connection.close().await;
                        State::Finished(Outcome::Aborted(e))
                    }
                    None => {
                        connection.close().await;
                        State::Finished(Outcome::Cancelled)
                    }
                }
            }
            State::Streaming(mut session) => {
                let outcome = tokio::select! {
                    _ = &mut cancel => Outcome::Cancelled,
                    streamed = monitor::run(&mut session, console, config.get_poll_interval()) => {
                        match streamed {
                            Ok(()) => Outcome::Disconnected,
                            Err(e) => Outcome::Aborted(e),
                        }
                    }
                };
                session.close().await;
                State::Finished(outcome)
            }
            State::Finished(outcome) => {
                log::info!("Run finished: {:?}", outcome);
                return outcome;
            }
        };
    }
}
