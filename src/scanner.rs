use async_trait::async_trait;
use btleplug::api::{BDAddr, Central as _, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use btleplug::{Error, Result};
use futures::StreamExt;
use stream_cancel::{Trigger, Valved};
use tokio::sync::Mutex;

use crate::adapter::{Advertisement, AdvertisementStream, Central};
use crate::Device;

/// The `btleplug` implementation of [`Central`], bound to one adapter.
pub struct Scanner {
    _manager: Manager,
    adapter: Adapter,
    scan_stopper: Mutex<Option<Trigger>>,
}

impl Scanner {
    /// Open the Bluetooth adapter with the given index.
    pub async fn new(adapter_index: usize) -> Result<Self> {
        let manager = Manager::new().await?;
        let mut adapters = manager.adapters().await?;

        if adapter_index >= adapters.len() {
            return Err(Error::DeviceNotFound);
        }

        let adapter = adapters.swap_remove(adapter_index);

        log::trace!("Using adapter: {:?}", adapter);

        Ok(Self {
            _manager: manager,
            adapter,
            scan_stopper: Mutex::new(None),
        })
    }

    async fn peripheral_by_address(&self, address: BDAddr) -> Result<Peripheral> {
        self.adapter
            .peripherals()
            .await?
            .into_iter()
            .find(|peripheral| peripheral.address() == address)
            .ok_or(Error::DeviceNotFound)
    }
}

/// Read the advertised properties of a peripheral the adapter reported.
async fn advertisement(adapter: &Adapter, id: &PeripheralId) -> Option<Advertisement> {
    let peripheral = adapter.peripheral(id).await.ok()?;
    let properties = peripheral.properties().await.ok().flatten()?;

    Some(Advertisement {
        address: peripheral.address(),
        local_name: properties.local_name,
        services: properties.services,
    })
}

/// Store the trigger of a new scan, ending the stream of the previous one.
fn replace_stopper(slot: &mut Option<Trigger>, trigger: Trigger) {
    if let Some(previous) = slot.replace(trigger) {
        log::info!("Scanner is already started, ending the previous scan.");
        previous.cancel();
    }
}

#[async_trait]
impl Central for Scanner {
    type Link = Device;

    async fn start_scan(&self) -> Result<AdvertisementStream> {
        let mut stopper = self.scan_stopper.lock().await;

        let events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;

        log::info!("Starting the scan");

        let adapter = self.adapter.clone();
        let advertisements: AdvertisementStream =
            Box::pin(events.filter_map(move |event| {
                let adapter = adapter.clone();
                async move {
                    match event {
                        CentralEvent::DeviceDiscovered(id)
                        | CentralEvent::DeviceUpdated(id)
                        | CentralEvent::ServicesAdvertisement { id, .. } => {
                            advertisement(&adapter, &id).await
                        }
                        _ => None,
                    }
                }
            }));

        let (trigger, advertisements) = Valved::new(advertisements);
        replace_stopper(&mut stopper, trigger);

        Ok(Box::pin(advertisements))
    }

    async fn stop_scan(&self) -> Result<()> {
        if let Some(trigger) = self.scan_stopper.lock().await.take() {
            trigger.cancel();
            self.adapter.stop_scan().await?;
            log::info!("Scanner was stopped.");
        } else {
            log::info!("Scanner is already stopped");
        }

        Ok(())
    }

    async fn connect(&self, address: BDAddr) -> Result<Device> {
        let peripheral = self.peripheral_by_address(address).await?;

        if !peripheral.is_connected().await? {
            log::debug!("Connecting to device {}", address);
            peripheral.connect().await?;
        }

        Ok(Device::new(self.adapter.clone(), peripheral))
    }
}
