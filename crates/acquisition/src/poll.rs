//! Async Poll Driver
//!
//! Calls [`AcquisitionReader::drain`] once per block interval on the current task
//! and forwards decoded blocks over a channel.

use crate::config::ReaderConfig;
use crate::decode::SampleBlock;
use crate::device::DeviceChannel;
use crate::error::ReaderError;
use crate::reader::AcquisitionReader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Counters for one poll run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Blocks forwarded
    pub blocks: u64,
    /// Scans forwarded
    pub scans: u64,
    /// Overruns acknowledged
    pub overruns: u64,
}

/// Cooperative poll loop around one reader
#[derive(Debug, Clone)]
pub struct PollLoop {
    interval: Duration,
    max_scans: usize,
    shutdown: Arc<AtomicBool>,
}

impl PollLoop {
    /// Create a loop polling once per block at the configured rate
    pub fn new(config: &ReaderConfig) -> Result<Self, ReaderError> {
        config.validate()?;
        Ok(Self {
            interval: config.polling_interval(),
            max_scans: config.block_size as usize,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that ends the loop when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Polling interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until shutdown or until the receiver is dropped, then stop the reader
    ///
    /// Scans still buffered at shutdown are decoded and forwarded as a final block.
    pub async fn run<D: DeviceChannel>(
        &self,
        reader: &mut AcquisitionReader<D>,
        block_tx: mpsc::Sender<SampleBlock>,
    ) -> Result<PollStats, ReaderError> {
        info!("Starting poll loop, interval {:?}", self.interval);
        let mut stats = PollStats::default();

        while !self.shutdown.load(Ordering::SeqCst) {
            match reader.drain(self.max_scans) {
                Ok(block) => {
                    if !Self::forward(reader, &block_tx, block, &mut stats).await? {
                        debug!("Block receiver dropped, stopping poll loop");
                        reader.stop(false)?;
                        return Ok(stats);
                    }
                }
                Err(e) if e.is_transient() => {}
                Err(e) if e.is_recoverable() => {
                    warn!("Acknowledging overrun: {}", e);
                    reader.acknowledge_overrun()?;
                    stats.overruns += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.interval).await;
        }

        if let Some(block) = reader.stop(true)? {
            Self::forward(reader, &block_tx, block, &mut stats).await?;
        }
        info!(
            "Poll loop stopped: {} blocks, {} scans, {} overruns",
            stats.blocks, stats.scans, stats.overruns
        );
        Ok(stats)
    }

    /// Release if needed and send; `false` when the receiver is gone
    async fn forward<D: DeviceChannel>(
        reader: &mut AcquisitionReader<D>,
        block_tx: &mpsc::Sender<SampleBlock>,
        block: SampleBlock,
        stats: &mut PollStats,
    ) -> Result<bool, ReaderError> {
        if block.is_empty() {
            return Ok(true);
        }
        reader.release(&block)?;
        let scans = block.scans as u64;
        if block_tx.send(block).await.is_err() {
            return Ok(false);
        }
        stats.blocks += 1;
        stats.scans += scans;
        Ok(true)
    }
}
