use async_trait::async_trait;
use btleplug::{
    api::{BDAddr, Peripheral as _},
    platform::{Adapter, Peripheral},
    Error, Result,
};

use crate::adapter::{Link, NotificationStream};
use crate::characteristic::Characteristic;
use crate::service::{CharacteristicRef, Service};

/// A connected `btleplug` peripheral.
#[derive(Debug, Clone)]
pub struct Device {
    pub(self) _adapter:    Adapter,
    pub(crate) peripheral: Peripheral,
}

impl Device {
    pub(crate) fn new(adapter: Adapter, peripheral: Peripheral) -> Self {
        Self {
            _adapter: adapter,
            peripheral,
        }
    }

    #[inline]
    pub fn address(&self) -> BDAddr {
        self.peripheral.address()
    }

    async fn characteristic(&self, wanted: &CharacteristicRef) -> Result<Characteristic> {
        if self.peripheral.characteristics().is_empty() {
            self.peripheral.discover_services().await?;
        }

        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == wanted.uuid && c.service_uuid == wanted.service)
            .map(|characteristic| Characteristic {
                peripheral: self.peripheral.clone(),
                characteristic,
            })
            .ok_or_else(|| {
                Error::NotSupported(format!(
                    "characteristic {} not present on {}",
                    wanted.uuid,
                    self.address()
                ))
            })
    }
}

#[async_trait]
impl Link for Device {
    async fn is_connected(&self) -> Result<bool> {
        self.peripheral.is_connected().await
    }

    async fn disconnect(&self) -> Result<()> {
        log::debug!("Disconnecting from {}", self.address());
        self.peripheral.disconnect().await
    }

    async fn services(&self) -> Result<Vec<Service>> {
        let mut services = self.peripheral.services();
        if services.is_empty() {
            log::debug!("Discovering services for {}", self.address());
            self.peripheral.discover_services().await?;
            services = self.peripheral.services();
        }

        Ok(services.iter().map(Service::from).collect())
    }

    async fn subscribe(&self, characteristic: &CharacteristicRef) -> Result<NotificationStream> {
        let characteristic = self.characteristic(characteristic).await?;
        log::debug!(
            "Subscribing to {} on {}",
            characteristic.uuid(),
            self.address()
        );
        characteristic.subscribe().await
    }
}
