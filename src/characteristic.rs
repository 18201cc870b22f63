use btleplug::api::{Characteristic as BtleCharacteristic, Peripheral as _};
use btleplug::platform::Peripheral;
use btleplug::Result;
use futures::StreamExt;
use uuid::Uuid;

use crate::adapter::NotificationStream;

/// A characteristic of a connected `btleplug` peripheral.
#[derive(Clone)]
pub(crate) struct Characteristic {
    pub(crate) peripheral: Peripheral,
    pub(crate) characteristic: BtleCharacteristic,
}

impl Characteristic {
    /// Enable notifications and return the values pushed for this characteristic.
    pub(crate) async fn subscribe(&self) -> Result<NotificationStream> {
        self.peripheral.subscribe(&self.characteristic).await?;

        let stream = self.peripheral.notifications().await?;
        let uuid = self.characteristic.uuid;

        Ok(Box::pin(stream.filter_map(move |n| async move {
            if n.uuid == uuid {
                Some(n.value)
            } else {
                None
            }
        })))
    }

    pub(crate) fn uuid(&self) -> Uuid {
        self.characteristic.uuid
    }
}
