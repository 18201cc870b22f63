use std::io::Write;

use futures::StreamExt;
use tokio::time::{timeout_at, Instant};

use crate::adapter::{Advertisement, Central};
use crate::config::Config;
use crate::console::Console;
use crate::Result;

/// Scan for the first heart rate device that passes the configured filters.
///
/// Returns `None` if nothing matched before the scan timeout ran out. Later
/// advertisements are never considered once a device has matched.
pub async fn select<C, W>(
    central: &C,
    config: &Config,
    console: &mut Console<W>,
) -> Result<Option<Advertisement>>
where
    C: Central,
    W: Write,
{
    console.status("Scanning for heart rate devices...")?;

    // A timeout too large to represent never expires.
    let deadline = Instant::now().checked_add(config.get_scan_timeout());
    let mut advertisements = central.start_scan().await?;

    let selected = loop {
        let next = match deadline {
            Some(deadline) => timeout_at(deadline, advertisements.next()).await,
            None => Ok(advertisements.next().await),
        };
        match next {
            Ok(Some(advertisement)) if config.matches(&advertisement) => break Some(advertisement),
            Ok(Some(advertisement)) => {
                log::trace!("Skipping device {}", advertisement.address);
            }
            Ok(None) => {
                log::debug!("Advertisement stream ended");
                break None;
            }
            Err(_) => {
                log::info!("Scan timeout reached");
                break None;
            }
        }
    };

    drop(advertisements);
    if let Err(e) = central.stop_scan().await {
        log::warn!("Failed to stop the scan: {}", e);
    }

    if let Some(advertisement) = &selected {
        log::info!("Found device: {:?}", advertisement);
        console.status(format!(
            "Found heart rate device {}",
            advertisement.display_name()
        ))?;
    }

    Ok(selected)
}
