//! Connection lifecycle: connect, resolve the measurement characteristic,
//! subscribe, and disconnect exactly once.

use crate::adapter::{Advertisement, Central, Link, NotificationStream};
use crate::common::{characteristics::HEART_RATE_MEASUREMENT, services::HEART_RATE};
use crate::service::{find_service, CharacteristicRef};
use crate::{Error, Result};

/// Owns an established link until it is closed.
///
/// Dropping a connection that was never closed schedules a disconnect on the
/// current runtime as a last resort. Nothing waits for that disconnect, so
/// owners close the connection explicitly on every path.
pub(crate) struct Connection<L: Link> {
    link: L,
    closed: bool,
}

impl<L: Link> Connection<L> {
    pub(crate) fn new(link: L) -> Self {
        Self {
            link,
            closed: false,
        }
    }

    pub(crate) fn link(&self) -> &L {
        &self.link
    }

    pub(crate) async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match self.link.is_connected().await {
            Ok(false) => log::debug!("Device already disconnected"),
            Ok(true) | Err(_) => match self.link.disconnect().await {
                Ok(()) => log::info!("Disconnected"),
                Err(e) => log::warn!("Failed to disconnect: {}", e),
            },
        }
    }
}

impl<L: Link> Drop for Connection<L> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        log::warn!("Connection dropped without being closed, disconnecting");

        let link = self.link.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = link.disconnect().await {
                        log::warn!("Failed to disconnect: {}", e);
                    }
                });
            }
            Err(_) => log::error!("No runtime available, connection left open"),
        }
    }
}

/// A subscribed heart rate measurement characteristic.
pub struct Session<L: Link> {
    connection: Connection<L>,
    characteristic: CharacteristicRef,
    notifications: NotificationStream,
}

impl<L: Link> Session<L> {
    /// Connect to the advertised device and subscribe to heart rate measurements.
    ///
    /// The connection is closed again if any step after connecting fails.
    pub async fn open<C>(central: &C, device: &Advertisement) -> Result<Self>
    where
        C: Central<Link = L>,
    {
        let mut connection = connect(central, device).await?;

        let resolved = resolve(connection.link()).await;
        match resolved {
            Ok((characteristic, notifications)) => {
                Ok(Self::from_parts(connection, characteristic, notifications))
            }
            Err(e) => {
                connection.close().await;
                Err(e)
            }
        }
    }

    pub(crate) fn from_parts(
        connection: Connection<L>,
        characteristic: CharacteristicRef,
        notifications: NotificationStream,
    ) -> Self {
        log::info!("Subscribed to {}", characteristic.uuid);
        Self {
            connection,
            characteristic,
            notifications,
        }
    }

    pub fn characteristic(&self) -> &CharacteristicRef {
        &self.characteristic
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.link().is_connected().await.unwrap_or(false)
    }

    /// The link and the notification stream, borrowed separately.
    pub(crate) fn parts_mut(&mut self) -> (&L, &mut NotificationStream) {
        (self.connection.link(), &mut self.notifications)
    }

    /// Disconnect if still connected. Safe to call more than once; failures
    /// are logged and never returned.
    pub async fn close(&mut self) {
        self.connection.close().await;
    }
}

/// Establish the link to an advertised device.
pub(crate) async fn connect<C: Central>(
    central: &C,
    device: &Advertisement,
) -> Result<Connection<C::Link>> {
    log::info!("Connecting to {}", device.address);

    let link = central
        .connect(device.address)
        .await
        .map_err(Error::Connection)?;

    Ok(Connection::new(link))
}

/// Find the heart rate measurement characteristic and subscribe to it.
pub(crate) async fn resolve<L: Link>(link: &L) -> Result<(CharacteristicRef, NotificationStream)> {
    let services = link.services().await.map_err(Error::Connection)?;

    let service = find_service(&services, HEART_RATE).ok_or(Error::ServiceNotFound)?;
    let characteristic = *service
        .characteristic(HEART_RATE_MEASUREMENT)
        .ok_or(Error::CharacteristicNotFound)?;

    let notifications = link
        .subscribe(&characteristic)
        .await
        .map_err(Error::Connection)?;

    Ok((characteristic, notifications))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{advertisement, MockCentral, MockLink};
    use crate::service::Service;

    fn heart_rate_device() -> Advertisement {
        advertisement("C0:FF:EE:00:00:01", vec![HEART_RATE])
    }

    async fn open_with(link: MockLink) -> (Result<Session<MockLink>>, MockLink) {
        let central = MockCentral::new(vec![], link.clone());
        (Session::open(&central, &heart_rate_device()).await, link)
    }

    #[tokio::test]
    async fn open_subscribes_to_measurement() {
        let (session, link) = open_with(MockLink::heart_rate()).await;

        let session = session.unwrap();
        assert_eq!(session.characteristic().uuid, HEART_RATE_MEASUREMENT);
        assert!(session.is_connected().await);
        assert_eq!(link.disconnects(), 0);
    }

    #[tokio::test]
    async fn failed_service_discovery_disconnects() {
        let (session, link) = open_with(MockLink::new(None)).await;

        assert!(matches!(session, Err(Error::Connection(_))));
        assert_eq!(link.disconnects(), 1);
        assert!(!link.connected());
    }

    #[tokio::test]
    async fn missing_service_disconnects() {
        let (session, link) = open_with(MockLink::new(Some(vec![]))).await;

        assert!(matches!(session, Err(Error::ServiceNotFound)));
        assert_eq!(link.disconnects(), 1);
    }

    #[tokio::test]
    async fn missing_characteristic_disconnects() {
        let service = Service {
            uuid: HEART_RATE,
            characteristics: vec![],
        };
        let (session, link) = open_with(MockLink::new(Some(vec![service]))).await;

        assert!(matches!(session, Err(Error::CharacteristicNotFound)));
        assert_eq!(link.disconnects(), 1);
    }

    #[tokio::test]
    async fn failed_subscribe_disconnects() {
        let (session, link) = open_with(MockLink::heart_rate().failing_subscribe()).await;

        assert!(matches!(session, Err(Error::Connection(_))));
        assert_eq!(link.disconnects(), 1);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (session, link) = open_with(MockLink::heart_rate()).await;
        let mut session = session.unwrap();

        session.close().await;
        session.close().await;
        drop(session);
        tokio::task::yield_now().await;

        assert_eq!(link.disconnects(), 1);
    }

    #[tokio::test]
    async fn close_skips_disconnect_when_device_is_gone() {
        let (session, link) = open_with(MockLink::heart_rate()).await;
        let mut session = session.unwrap();

        link.drop_connection();
        session.close().await;

        assert_eq!(link.disconnects(), 0);
    }

    #[tokio::test]
    async fn dropping_unclosed_connection_disconnects() {
        let mock = MockLink::heart_rate();
        let central = MockCentral::new(vec![], mock.clone());
        let link = central.connect(heart_rate_device().address).await.unwrap();
        let connection = Connection::new(link);

        drop(connection);
        tokio::task::yield_now().await;

        assert_eq!(mock.disconnects(), 1);
    }
}
