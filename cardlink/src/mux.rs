//! Channel multiplexer
//!
//! Turns the single ordered byte stream of a serial link into two
//! independently consumable logical channels. One background reader task
//! decodes packets off the link and routes each payload onto the queue for
//! its channel; callers drain the queues through the blocking primitives
//! below and write through the shared writer half.
//!
//! Disconnecting drops the queue senders, which wakes every consumer blocked
//! on a queue with [`Error::LinkClosed`] instead of leaving it hanging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, trace, warn};

use cardlink_core::constants::{CARRIAGE_RETURN, LINE_FEED, TRANSFER_LOG_INTERVAL};
use cardlink_core::{Packet, COMMAND_CHANNEL, DATA_CHANNEL, MAX_PAYLOAD_SIZE};
use cardlink_transport::BoxedLink;

use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// Channel multiplexer over one serial link.
///
/// Lives for exactly one connection: constructed by [`start`](Self::start)
/// when the link opens, consumed by [`shutdown`](Self::shutdown) when it
/// closes. A reconnect builds a new multiplexer.
pub struct Multiplexer {
    writer: WriteHalf<BoxedLink>,
    command_rx: mpsc::UnboundedReceiver<Bytes>,
    data_rx: mpsc::UnboundedReceiver<Bytes>,
    command_buf: BytesMut,
    reply_timeout: Option<Duration>,
    upload_delay: Duration,
    transferred: Arc<AtomicU64>,
    shutdown_tx: watch::Sender<bool>,
    reader: JoinHandle<()>,
}

impl Multiplexer {
    /// Split the link and start the background reader task
    pub fn start(link: BoxedLink, config: &SessionConfig) -> Self {
        let (read_half, writer) = tokio::io::split(link);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reader = tokio::spawn(read_loop(read_half, command_tx, data_tx, shutdown_rx));

        Self {
            writer,
            command_rx,
            data_rx,
            command_buf: BytesMut::new(),
            reply_timeout: config.reply_timeout,
            upload_delay: config.upload_delay,
            transferred: Arc::new(AtomicU64::new(0)),
            shutdown_tx,
            reader,
        }
    }

    /// Check whether the background reader is still alive
    pub fn is_running(&self) -> bool {
        !self.reader.is_finished()
    }

    /// Bytes moved so far in the current bulk transfer
    pub fn transfer_progress(&self) -> u64 {
        self.transferred.load(Ordering::Acquire)
    }

    /// Frame and send one packet on the command channel
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.write(COMMAND_CHANNEL, data).await
    }

    /// Frame and send one packet on the data channel
    pub async fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.write(DATA_CHANNEL, data).await
    }

    /// Stream a source over the data channel in paced, packet-sized chunks.
    ///
    /// Reads the source in chunks of at most [`MAX_PAYLOAD_SIZE`] bytes,
    /// frames each chunk as one data-channel packet and pauses for the
    /// configured upload delay between packets so the card's receiver keeps
    /// up. Cooperatively cancellable: a fired abort signal fails the
    /// transfer with [`Error::Aborted`] at the next chunk boundary.
    pub async fn write_data_stream<R>(
        &mut self,
        source: &mut R,
        abort: &mut watch::Receiver<bool>,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut buffer = vec![0u8; MAX_PAYLOAD_SIZE];
        self.transferred.store(0, Ordering::Release);
        let mut chunks: u64 = 0;

        loop {
            let bytes_read = tokio::select! {
                biased;
                _ = aborted(abort) => return Err(Error::Aborted),
                read = source.read(&mut buffer) => read?,
            };
            if bytes_read == 0 {
                break;
            }

            self.write(DATA_CHANNEL, &buffer[..bytes_read]).await?;
            self.transferred.fetch_add(bytes_read as u64, Ordering::AcqRel);

            chunks += 1;
            if chunks % TRANSFER_LOG_INTERVAL == 0 {
                debug!(
                    "Upload progress: {} bytes",
                    self.transferred.load(Ordering::Acquire)
                );
            }

            tokio::select! {
                biased;
                _ = aborted(abort) => return Err(Error::Aborted),
                _ = sleep(self.upload_delay) => {}
            }
        }

        self.writer.flush().await?;
        Ok(())
    }

    /// Blocking read of one CRLF-terminated line from the command channel.
    ///
    /// Reassembles the line across packet boundaries; the returned bytes
    /// exclude the terminator. Honors the configured reply timeout and the
    /// abort signal.
    pub async fn read_command_line(&mut self, abort: &mut watch::Receiver<bool>) -> Result<Bytes> {
        let line = line_on(&mut self.command_rx, &mut self.command_buf, abort);
        match self.reply_timeout {
            Some(limit) => timeout(limit, line)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => line.await,
        }
    }

    /// Non-blocking drain of whatever is currently queued on the data
    /// channel. Suited to bulk responses small enough to buffer in memory.
    pub fn read_data_available(&mut self) -> Bytes {
        let mut out = BytesMut::new();
        while let Ok(chunk) = self.data_rx.try_recv() {
            out.extend_from_slice(&chunk);
        }
        out.freeze()
    }

    /// Stream data-channel payload into a sink until the command-channel
    /// reply line completes, then return the line.
    ///
    /// The reply physically arrives after all data payload for the
    /// operation, so its arrival is the transfer-completion signal.
    pub async fn read_data_until_reply<W>(
        &mut self,
        sink: &mut W,
        abort: &mut watch::Receiver<bool>,
    ) -> Result<Bytes>
    where
        W: AsyncWrite + Unpin,
    {
        self.transferred.store(0, Ordering::Release);
        let mut chunks: u64 = 0;

        loop {
            if let Some(pos) = find_crlf(&self.command_buf) {
                // Payload queued ahead of the reply drains first
                while let Ok(chunk) = self.data_rx.try_recv() {
                    sink.write_all(&chunk).await?;
                    self.transferred
                        .fetch_add(chunk.len() as u64, Ordering::AcqRel);
                }
                sink.flush().await?;

                let line = self.command_buf.split_to(pos).freeze();
                self.command_buf.advance(2);
                return Ok(line);
            }

            tokio::select! {
                biased;
                _ = aborted(abort) => return Err(Error::Aborted),
                chunk = self.data_rx.recv() => {
                    let chunk = chunk.ok_or(Error::LinkClosed)?;
                    sink.write_all(&chunk).await?;
                    self.transferred.fetch_add(chunk.len() as u64, Ordering::AcqRel);

                    chunks += 1;
                    if chunks % TRANSFER_LOG_INTERVAL == 0 {
                        debug!(
                            "Download progress: {} bytes",
                            self.transferred.load(Ordering::Acquire)
                        );
                    }
                }
                chunk = self.command_rx.recv() => {
                    let chunk = chunk.ok_or(Error::LinkClosed)?;
                    self.command_buf.extend_from_slice(&chunk);
                }
            }
        }
    }

    /// Stop the reader task, shut the writer half down and wait for the
    /// reader to finish
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.writer.shutdown().await {
            warn!("Error shutting down link writer: {}", e);
        }

        if self.reader.await.is_err() {
            warn!("Reader task ended abnormally");
        }
    }

    async fn write(&mut self, channel: u8, data: &[u8]) -> Result<()> {
        let packet = Packet::new(channel, Bytes::copy_from_slice(data));
        let bytes = packet.encode()?;

        trace!("Writing {} payload bytes on channel {}", data.len(), channel);

        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Background reader: decode packets and route payloads onto their channel
/// queue until the link fails or shutdown is signalled. Dropping the
/// senders on exit wakes every blocked consumer.
async fn read_loop(
    mut read_half: ReadHalf<BoxedLink>,
    command_tx: mpsc::UnboundedSender<Bytes>,
    data_tx: mpsc::UnboundedSender<Bytes>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let packet = tokio::select! {
            biased;
            _ = shutdown.changed() => {
                trace!("Reader task stopping");
                return;
            }
            packet = Packet::read_from(&mut read_half) => packet,
        };

        match packet {
            Ok(packet) => {
                trace!("Received {}", packet);
                let delivered = match packet.channel {
                    COMMAND_CHANNEL => command_tx.send(packet.payload).is_ok(),
                    DATA_CHANNEL => data_tx.send(packet.payload).is_ok(),
                    other => {
                        // No consumer exists for any other channel
                        warn!("Dropping packet addressed to unused channel {}", other);
                        true
                    }
                };
                if !delivered {
                    trace!("All consumers gone, reader task stopping");
                    return;
                }
            }
            Err(e) => {
                warn!("Link read failed, reader task stopping: {}", e);
                return;
            }
        }
    }
}

/// Resolve once the abort signal fires. A dropped abort handle never fires.
async fn aborted(abort: &mut watch::Receiver<bool>) {
    loop {
        if *abort.borrow_and_update() {
            return;
        }
        if abort.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn line_on(
    rx: &mut mpsc::UnboundedReceiver<Bytes>,
    buf: &mut BytesMut,
    abort: &mut watch::Receiver<bool>,
) -> Result<Bytes> {
    loop {
        if let Some(pos) = find_crlf(buf) {
            let line = buf.split_to(pos).freeze();
            buf.advance(2);
            return Ok(line);
        }

        tokio::select! {
            biased;
            _ = aborted(abort) => return Err(Error::Aborted),
            chunk = rx.recv() => {
                let chunk = chunk.ok_or(Error::LinkClosed)?;
                buf.extend_from_slice(&chunk);
            }
        }
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2)
        .position(|pair| pair == [CARRIAGE_RETURN, LINE_FEED])
}
