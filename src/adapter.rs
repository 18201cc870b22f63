//! The boundary between the monitor and the Bluetooth stack.
//!
//! [`Central`] scans and connects, [`Link`] is one established connection.
//! The `btleplug` implementations are [`Scanner`](crate::Scanner) and
//! [`Device`](crate::Device).

use std::pin::Pin;

use async_trait::async_trait;
use btleplug::api::BDAddr;
use btleplug::Result;
use futures::Stream;
use uuid::Uuid;

use crate::service::{CharacteristicRef, Service};

pub type AdvertisementStream = Pin<Box<dyn Stream<Item = Advertisement> + Send>>;
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// What a peripheral announced about itself during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: BDAddr,
    pub local_name: Option<String>,
    pub services: Vec<Uuid>,
}

impl Advertisement {
    pub fn advertises(&self, service: Uuid) -> bool {
        self.services.contains(&service)
    }

    /// Local name of the device, or its address if it has none.
    pub fn display_name(&self) -> String {
        match self.local_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.address.to_string(),
        }
    }
}

#[async_trait]
pub trait Central: Send + Sync {
    type Link: Link;

    /// Start scanning. Advertisements are delivered until [`Central::stop_scan`].
    async fn start_scan(&self) -> Result<AdvertisementStream>;

    async fn stop_scan(&self) -> Result<()>;

    async fn connect(&self, address: BDAddr) -> Result<Self::Link>;
}

#[async_trait]
pub trait Link: Clone + Send + Sync + 'static {
    async fn is_connected(&self) -> Result<bool>;

    async fn disconnect(&self) -> Result<()>;

    /// Services of the device, discovering them first if needed.
    async fn services(&self) -> Result<Vec<Service>>;

    async fn subscribe(&self, characteristic: &CharacteristicRef) -> Result<NotificationStream>;
}
