use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no heart rate device found")]
    DiscoveryTimeout,

    #[error("heart rate service not found")]
    ServiceNotFound,

    #[error("heart rate measurement characteristic not found")]
    CharacteristicNotFound,

    /// Failure while connecting, discovering services or subscribing.
    #[error("connection failed: {0}")]
    Connection(#[source] btleplug::Error),

    #[error("bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl Error {
    /// Whether the run ended because something was absent rather than because
    /// an operation raised a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::DiscoveryTimeout | Error::ServiceNotFound | Error::CharacteristicNotFound
        )
    }
}
