// File: src/bridge/forwarder.rs
//
// The outbound collector connection. A single writer task owns the stream and
// writes frames one at a time as they come off the queue, so concurrent
// translations never interleave bytes on the wire.

use futures::SinkExt;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bmp::{BmpFrame, BmpFrameCodec};
use crate::error::BridgeError;

type WriterHandle = JoinHandle<Result<u64, BridgeError>>;

/// Cloneable handle used by translation tasks to queue frames.
#[derive(Clone, Debug)]
pub struct FrameSender {
    tx: mpsc::Sender<BmpFrame>,
}

impl FrameSender {
    pub async fn forward(&self, frame: BmpFrame) -> Result<(), BridgeError> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| BridgeError::ForwarderClosed)
    }
}

#[derive(Debug)]
pub struct Forwarder {
    tx: mpsc::Sender<BmpFrame>,
    writer: Option<WriterHandle>,
}

impl Forwarder {
    /// Connect to the BMP collector at `addr` (`host:port`).
    pub async fn connect(addr: &str, queue_depth: usize) -> Result<Forwarder, BridgeError> {
        let socket = TcpStream::connect(addr)
            .await
            .map_err(|e| BridgeError::Connection(format!("{}: {}", addr, e)))?;
        match socket.peer_addr() {
            Ok(peer) => log::info!("connection to bmp {} established", peer),
            Err(_) => log::info!("connection to bmp {} established", addr),
        }
        Ok(Forwarder::spawn(socket, queue_depth))
    }

    pub fn spawn<W>(writer: W, queue_depth: usize) -> Forwarder
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<BmpFrame>(queue_depth);
        let writer = tokio::spawn(write_frames(writer, rx));
        Forwarder {
            tx,
            writer: Some(writer),
        }
    }

    pub fn sender(&self) -> FrameSender {
        FrameSender {
            tx: self.tx.clone(),
        }
    }

    /// Resolves when the writer task stops on its own, which only happens on
    /// a write error while senders are still alive.
    pub async fn stopped(&mut self) -> Result<u64, BridgeError> {
        match self.writer.as_mut() {
            Some(handle) => {
                let result = join_writer(handle).await;
                self.writer = None;
                result
            }
            None => std::future::pending().await,
        }
    }

    /// Stop accepting frames, let the writer drain its queue and return the
    /// number of frames written.
    pub async fn close(mut self) -> Result<u64, BridgeError> {
        drop(self.tx);
        match self.writer.as_mut() {
            Some(handle) => join_writer(handle).await,
            None => Err(BridgeError::ForwarderClosed),
        }
    }

    /// Drop queued frames and stop the writer immediately.
    pub fn abort(self) {
        if let Some(handle) = self.writer {
            handle.abort();
        }
    }
}

async fn join_writer(handle: &mut WriterHandle) -> Result<u64, BridgeError> {
    match handle.await {
        Ok(result) => result,
        Err(e) => Err(BridgeError::Task(e.to_string())),
    }
}

async fn write_frames<W>(writer: W, mut rx: mpsc::Receiver<BmpFrame>) -> Result<u64, BridgeError>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = BmpFrameCodec::frame_it(writer);
    let mut written = 0u64;
    while let Some(frame) = rx.recv().await {
        let len = frame.len();
        if let Err(e) = sink.send(frame).await {
            log::error!("fail to write to bmp collector with error: {}", e);
            return Err(BridgeError::Write(e));
        }
        log::trace!("wrote {} byte frame", len);
        written += 1;
    }
    log::debug!("frame queue closed after {} frames", written);
    Ok(written)
}
