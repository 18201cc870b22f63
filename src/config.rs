use std::env;
use std::str::FromStr;
use std::time::Duration;

use btleplug::api::BDAddr;

use crate::adapter::Advertisement;
use crate::common::services::HEART_RATE;

const ADAPTER_VAR: &str = "HRSTREAM_ADAPTER";
const SCAN_TIMEOUT_VAR: &str = "HRSTREAM_SCAN_TIMEOUT";

pub struct Config {
    /// Index of the Bluetooth adapter to use. The first found adapter is used by default.
    adapter_index: usize,
    /// How long to scan for a heart rate device before giving up.
    scan_timeout: Duration,
    /// How often the connection is checked while streaming.
    poll_interval: Duration,
    /// Filters the found devices based on device address.
    address_filter: Option<Box<dyn Fn(BDAddr) -> bool + Send + Sync>>,
    /// Filters the found devices based on local name.
    name_filter: Option<Box<dyn Fn(&str) -> bool + Send + Sync>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            scan_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(1),
            address_filter: None,
            name_filter: None,
        }
    }
}

impl Config {
    /// Default configuration, overridden by `HRSTREAM_ADAPTER` and
    /// `HRSTREAM_SCAN_TIMEOUT` (seconds) when they are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(index) = env_value(ADAPTER_VAR) {
            config = config.adapter_index(index);
        }
        if let Some(secs) = env_value(SCAN_TIMEOUT_VAR) {
            config = config.scan_timeout(Duration::from_secs(secs));
        }

        config
    }

    /// Index of bluetooth adapter to use
    pub fn adapter_index(mut self, index: usize) -> Self {
        self.adapter_index = index;
        self
    }

    /// Stop scanning after given duration
    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Check whether the device is still connected this often. A zero interval
    /// is ignored.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            log::warn!("Ignoring zero poll interval, keeping {:?}", self.poll_interval);
        } else {
            self.poll_interval = interval;
        }
        self
    }

    /// Filter scanned devices based on the device address
    pub fn filter_by_address(
        mut self,
        func: impl Fn(BDAddr) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.address_filter = Some(Box::new(func));
        self
    }

    /// Filter scanned devices based on the device name
    pub fn filter_by_name(mut self, func: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.name_filter = Some(Box::new(func));
        self
    }

    pub fn get_adapter_index(&self) -> usize {
        self.adapter_index
    }

    pub fn get_scan_timeout(&self) -> Duration {
        self.scan_timeout
    }

    pub fn get_poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Whether an advertisement is a heart rate device that passes the configured filters.
    pub fn matches(&self, advertisement: &Advertisement) -> bool {
        if !advertisement.advertises(HEART_RATE) {
            return false;
        }

        if let Some(filter_by_addr) = self.address_filter.as_ref() {
            if !filter_by_addr(advertisement.address) {
                return false;
            }
        }

        if let Some(filter_by_name) = self.name_filter.as_ref() {
            match advertisement.local_name.as_deref() {
                Some(name) => filter_by_name(name),
                None => false,
            }
        } else {
            true
        }
    }
}

fn env_value<T: FromStr>(var: &str) -> Option<T> {
    let raw = env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}: cannot parse {:?}", var, raw);
            None
        }
    }
}
