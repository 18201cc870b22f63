//! In-memory [`Central`] and [`Link`] used by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::BDAddr;
use btleplug::{Error, Result};
use futures::{stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::adapter::{Advertisement, AdvertisementStream, Central, Link, NotificationStream};
use crate::common::{characteristics::HEART_RATE_MEASUREMENT, services::HEART_RATE};
use crate::service::{CharacteristicRef, Service};

pub(crate) fn heart_rate_service() -> Service {
    Service {
        uuid: HEART_RATE,
        characteristics: vec![CharacteristicRef {
            service: HEART_RATE,
            uuid: HEART_RATE_MEASUREMENT,
        }],
    }
}

pub(crate) fn advertisement(address: &str, services: Vec<uuid::Uuid>) -> Advertisement {
    Advertisement {
        address: address.parse().unwrap(),
        local_name: None,
        services,
    }
}

#[derive(Default)]
struct LinkState {
    connected: AtomicBool,
    disconnects: AtomicUsize,
    services: Mutex<Option<Vec<Service>>>,
    services_delay: Mutex<Option<Duration>>,
    fail_subscribe: AtomicBool,
    notifications: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

#[derive(Clone)]
pub(crate) struct MockLink {
    state: Arc<LinkState>,
}

impl MockLink {
    /// A link exposing the given services. `None` makes service discovery fail.
    pub(crate) fn new(services: Option<Vec<Service>>) -> Self {
        let state = LinkState::default();
        *state.services.lock().unwrap() = services;
        Self {
            state: Arc::new(state),
        }
    }

    pub(crate) fn heart_rate() -> Self {
        Self::new(Some(vec![heart_rate_service()]))
    }

    pub(crate) fn failing_subscribe(self) -> Self {
        self.state.fail_subscribe.store(true, Ordering::SeqCst);
        self
    }

    /// Service discovery takes `delay` before answering.
    pub(crate) fn slow_services(self, delay: Duration) -> Self {
        *self.state.services_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Sender that feeds the notification stream of the next subscription.
    pub(crate) fn notifier(&self) -> mpsc::UnboundedSender<Vec<u8>> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.state.notifications.lock().unwrap() = Some(rx);
        tx
    }

    /// Simulate the peripheral going away.
    pub(crate) fn drop_connection(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
    }

    pub(crate) fn connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Link for MockLink {
    async fn is_connected(&self) -> Result<bool> {
        Ok(self.connected())
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn services(&self) -> Result<Vec<Service>> {
        let delay = *self.state.services_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.state
            .services
            .lock()
            .unwrap()
            .clone()
            .ok_or(Error::NotConnected)
    }

    async fn subscribe(&self, _characteristic: &CharacteristicRef) -> Result<NotificationStream> {
        if self.state.fail_subscribe.load(Ordering::SeqCst) {
            return Err(Error::NotSupported("notify".to_string()));
        }

        match self.state.notifications.lock().unwrap().take() {
            Some(rx) => Ok(Box::pin(UnboundedReceiverStream::new(rx))),
            None => Ok(Box::pin(stream::pending())),
        }
    }
}

pub(crate) struct MockCentral {
    advertisements: Vec<Advertisement>,
    link: MockLink,
    connected_to: Mutex<Vec<BDAddr>>,
    scan_stops: AtomicUsize,
}

impl MockCentral {
    /// A central that reports `advertisements` once and then stays silent.
    pub(crate) fn new(advertisements: Vec<Advertisement>, link: MockLink) -> Self {
        Self {
            advertisements,
            link,
            connected_to: Mutex::new(Vec::new()),
            scan_stops: AtomicUsize::new(0),
        }
    }

    pub(crate) fn connected_to(&self) -> Vec<BDAddr> {
        self.connected_to.lock().unwrap().clone()
    }

    pub(crate) fn scan_stops(&self) -> usize {
        self.scan_stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Central for MockCentral {
    type Link = MockLink;

    async fn start_scan(&self) -> Result<AdvertisementStream> {
        let found = stream::iter(self.advertisements.clone());
        Ok(Box::pin(found.chain(stream::pending())))
    }

    async fn stop_scan(&self) -> Result<()> {
        self.scan_stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn connect(&self, address: BDAddr) -> Result<MockLink> {
        self.connected_to.lock().unwrap().push(address);
        self.link.state.connected.store(true, Ordering::SeqCst);
        Ok(self.link.clone())
    }
}
