use std::io::Write;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::{interval_at, Instant};
use tokio_stream::wrappers::IntervalStream;

use crate::adapter::Link;
use crate::console::Console;
use crate::measurement::decode;
use crate::session::Session;
use crate::Result;

/// Write every valid heart rate notification to the console until the device
/// disconnects or stops sending notifications.
///
/// The connection is checked every `poll_interval`. The session is left open;
/// closing it is up to the caller.
pub async fn run<L, W>(
    session: &mut Session<L>,
    console: &mut Console<W>,
    poll_interval: Duration,
) -> Result<()>
where
    L: Link,
    W: Write,
{
    let (link, notifications) = session.parts_mut();
    let mut liveness = IntervalStream::new(interval_at(
        Instant::now() + poll_interval,
        poll_interval,
    ));

    loop {
        tokio::select! {
            notification = notifications.next() => match notification {
                Some(data) => match decode(&data) {
                    Some(sample) => console.sample(sample)?,
                    None => log::trace!("Dropping notification {:02x?}", data),
                },
                None => {
                    log::info!("Notification stream ended");
                    return Ok(());
                }
            },
            Some(_) = liveness.next() => {
                if !link.is_connected().await.unwrap_or(false) {
                    log::info!("Device disconnected");
                    return Ok(());
                }
            }
        }
    }
}
