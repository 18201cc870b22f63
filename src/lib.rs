//! Stream heart rate values from a BLE heart rate monitor.
//!
//! The first device advertising the Heart Rate service is connected to, its
//! Heart Rate Measurement characteristic is subscribed to, and every valid
//! measurement is written to the console as a bare number on its own line.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hrstream::{Config, Console, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hrstream::Error> {
//!     pretty_env_logger::init();
//!
//!     let config = Config::default().filter_by_name(|name| name.starts_with("Polar"));
//!     let scanner = Scanner::new(config.get_adapter_index()).await?;
//!
//!     let mut console = Console::stdout();
//!     let outcome = hrstream::run(&scanner, &config, &mut console, async {
//!         tokio::signal::ctrl_c().await.ok();
//!     })
//!     .await;
//!     println!("{}", outcome);
//!
//!     Ok(())
//! }
//!```

#![warn(clippy::all, future_incompatible, nonstandard_style, rust_2018_idioms)]

pub use btleplug::api::BDAddr;

pub use adapter::{Advertisement, AdvertisementStream, Central, Link, NotificationStream};
pub use app::{run, Outcome};
pub use config::Config;
pub use console::Console;
pub use device::Device;
pub use error::{Error, Result};
pub use measurement::{decode, HeartRateSample};
pub use scanner::Scanner;
pub use service::{CharacteristicRef, Service};
pub use session::Session;

mod adapter;
mod app;
mod config;
mod console;
mod device;
mod error;
mod scanner;
mod service;
mod session;

mod characteristic;
pub mod common;
pub mod measurement;
pub mod monitor;
pub mod selector;

#[cfg(test)]
mod mock;
