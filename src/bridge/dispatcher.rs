// File: src/bridge/dispatcher.rs
//
// Fan-out of stream records to concurrent translation tasks.

use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use super::forwarder::{Forwarder, FrameSender};
use super::translate::translate;
use crate::error::BridgeError;
use crate::ris::{decode_record, LineSource, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Forwarded,
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub forwarded: u64,
    pub skipped: u64,
}

/// Runs one translation task per stream record, at most `max_in_flight` at a
/// time. Completion order, and therefore the order frames reach the
/// collector, is not tied to the order records were read.
#[derive(Debug)]
pub struct Dispatcher {
    bgp_id: Ipv4Addr,
    permits: Arc<Semaphore>,
    tasks: JoinSet<Result<Outcome, BridgeError>>,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(bgp_id: Ipv4Addr, max_in_flight: usize) -> Self {
        Dispatcher {
            bgp_id,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            tasks: JoinSet::new(),
            stats: DispatchStats::default(),
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Dispatch records until the first fatal error, which is returned.
    ///
    /// A failed task aborts every outstanding task and drops queued frames.
    /// The end of the stream instead lets in-flight tasks finish and the
    /// forwarder drain before the stream error is returned.
    pub async fn run(&mut self, source: &mut LineSource, mut forwarder: Forwarder) -> BridgeError {
        let sender = forwarder.sender();
        loop {
            tokio::select! {
                biased;

                Some(joined) = self.tasks.join_next() => {
                    if let Err(e) = self.settle(joined) {
                        return self.fail(e, forwarder).await;
                    }
                }
                result = forwarder.stopped() => {
                    let e = match result {
                        Err(e) => e,
                        Ok(_) => BridgeError::ForwarderClosed,
                    };
                    log::error!("forwarder stopped: {}", e);
                    self.tasks.shutdown().await;
                    return e;
                }
                line = source.next_line() => match line {
                    Ok(line) => {
                        if let Err(e) = self.launch(line, sender.clone()).await {
                            return self.fail(e, forwarder).await;
                        }
                    }
                    Err(e) => {
                        log::error!("failed to read message with error: {}", e);
                        drop(sender);
                        return self.drain(e, forwarder).await;
                    }
                },
            }
        }
    }

    async fn launch(&mut self, line: Vec<u8>, sender: FrameSender) -> Result<(), BridgeError> {
        // Blocks the read loop while max_in_flight tasks are running.
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| BridgeError::Task(e.to_string()))?;
        let bgp_id = self.bgp_id;
        self.tasks.spawn(async move {
            let outcome = dispatch_one(&line, bgp_id, &sender).await;
            drop(permit);
            outcome
        });
        Ok(())
    }

    fn settle(
        &mut self,
        joined: Result<Result<Outcome, BridgeError>, JoinError>,
    ) -> Result<(), BridgeError> {
        match joined {
            Ok(Ok(Outcome::Forwarded)) => self.stats.forwarded += 1,
            Ok(Ok(Outcome::Skipped)) => self.stats.skipped += 1,
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(BridgeError::Task(e.to_string())),
        }
        Ok(())
    }

    async fn fail(&mut self, e: BridgeError, forwarder: Forwarder) -> BridgeError {
        log::error!("translation task failed with error: {}, stopping dispatch", e);
        self.tasks.shutdown().await;
        match e {
            // The writer went away; report why.
            BridgeError::ForwarderClosed => match forwarder.close().await {
                Err(cause) => cause,
                Ok(_) => BridgeError::ForwarderClosed,
            },
            e => {
                forwarder.abort();
                e
            }
        }
    }

    async fn drain(&mut self, e: BridgeError, forwarder: Forwarder) -> BridgeError {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(task_error) = self.settle(joined) {
                return self.fail(task_error, forwarder).await;
            }
        }
        match forwarder.close().await {
            Ok(written) => {
                log::info!(
                    "stream ended after {} frames forwarded, {} records skipped ({} written)",
                    self.stats.forwarded,
                    self.stats.skipped,
                    written
                );
                e
            }
            Err(write_error) => write_error,
        }
    }
}

async fn dispatch_one(
    line: &[u8],
    bgp_id: Ipv4Addr,
    sender: &FrameSender,
) -> Result<Outcome, BridgeError> {
    match decode_record(line)? {
        Record::Skip(kind) => {
            log::trace!("skipping {:?} record", kind);
            Ok(Outcome::Skipped)
        }
        Record::Update(event) => {
            let frame = translate(&event, bgp_id)?;
            sender.forward(frame).await?;
            Ok(Outcome::Forwarded)
        }
    }
}
