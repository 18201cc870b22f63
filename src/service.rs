use btleplug::api::Service as BtleService;
use uuid::Uuid;

/// A GATT service exposed by a connected device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub uuid: Uuid,
    pub characteristics: Vec<CharacteristicRef>,
}

impl Service {
    /// Find a characteristic of this service by UUID.
    pub fn characteristic(&self, uuid: Uuid) -> Option<&CharacteristicRef> {
        self.characteristics
            .iter()
            .find(|characteristic| characteristic.uuid == uuid)
    }
}

/// Identifies one characteristic on a connected device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicRef {
    pub service: Uuid,
    pub uuid: Uuid,
}

impl From<&BtleService> for Service {
    fn from(service: &BtleService) -> Self {
        Self {
            uuid: service.uuid,
            characteristics: service
                .characteristics
                .iter()
                .map(|characteristic| CharacteristicRef {
                    service: service.uuid,
                    uuid: characteristic.uuid,
                })
                .collect(),
        }
    }
}

/// Find a service by UUID.
pub fn find_service(services: &[Service], uuid: Uuid) -> Option<&Service> {
    services.iter().find(|service| service.uuid == uuid)
}
