//! Card session
//!
//! The command-protocol state machine layered over the multiplexer: builds
//! command lines, interprets status-coded replies, streams file payloads and
//! owns the connection lifecycle.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use cardlink_core::command::{finalize_argument, glob_path};
use cardlink_core::{Command, ConnectionState, ConnectionTracker, Monitor};
use cardlink_transport::{Error as TransportError, Transport};
use cardlink_types::{Response, ResponseBody, Status};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::mux::Multiplexer;

/// Handle for deliberately terminating an in-flight operation.
///
/// Cheap to clone and safe to fire from any task. The interrupted operation
/// resolves to the 426 abort response rather than an error.
#[derive(Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    /// Terminate the operation currently in flight, if any
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

/// A client session with a card.
///
/// Strictly half-duplex at the command level: one command at a time, the
/// next reply line always belongs to the most recent command. The session
/// takes `&mut self` for every operation, which makes that invariant hold
/// by construction.
///
/// # Examples
///
/// ```no_run
/// use cardlink::{CardSession, TcpTransport};
///
/// #[tokio::main]
/// async fn main() -> cardlink::Result<()> {
///     let mut session = CardSession::new(TcpTransport::new("192.168.1.80", 9100));
///
///     session.connect().await?;
///
///     let listing = session.list("/").await?;
///     println!("{}", String::from_utf8_lossy(&listing.body_bytes()));
///
///     session.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct CardSession {
    transport: Box<dyn Transport>,
    mux: Option<Multiplexer>,
    tracker: ConnectionTracker,
    config: SessionConfig,
    abort_tx: Arc<watch::Sender<bool>>,
    abort_rx: watch::Receiver<bool>,
}

impl CardSession {
    /// Create a session over the given transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        let (abort_tx, abort_rx) = watch::channel(false);
        Self {
            transport: Box::new(transport),
            mux: None,
            tracker: ConnectionTracker::new(),
            config: SessionConfig::default(),
            abort_tx: Arc::new(abort_tx),
            abort_rx,
        }
    }

    /// Replace the default configuration
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Handle for aborting the in-flight operation from another task
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            tx: self.abort_tx.clone(),
        }
    }

    /// Current connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.tracker.state()
    }

    /// Check if communication with the card is up
    pub fn is_active(&self) -> bool {
        self.mux.as_ref().is_some_and(Multiplexer::is_running)
            && matches!(
                self.tracker.state(),
                ConnectionState::Connected | ConnectionState::Transferring
            )
    }

    /// Bytes moved so far in the current bulk transfer
    pub fn transfer_progress(&self) -> u64 {
        self.mux.as_ref().map_or(0, Multiplexer::transfer_progress)
    }

    /// Register a monitor for connection state changes
    pub fn add_monitor(&self, monitor: Arc<dyn Monitor>) {
        self.tracker.add_monitor(monitor);
    }

    /// Remove a previously registered monitor
    pub fn remove_monitor(&self, monitor: &Arc<dyn Monitor>) {
        self.tracker.remove_monitor(monitor);
    }

    /// Open the connection with the card. A no-op when already connected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }
        // A multiplexer whose link has died is torn down before reconnecting
        if self.mux.is_some() {
            self.disconnect().await?;
        }

        self.tracker.set_state(ConnectionState::Connecting);

        match self.transport.open().await {
            Ok(link) => {
                self.mux = Some(Multiplexer::start(link, &self.config));
                self.tracker.set_state(ConnectionState::Connected);
                info!("Connected to {}", self.transport.peer());
                Ok(())
            }
            Err(e) => {
                let state = match &e {
                    TransportError::Unavailable(_) => ConnectionState::BluetoothDisabled,
                    TransportError::NotPaired(_) => ConnectionState::CardNotPaired,
                    _ => ConnectionState::Disconnected,
                };
                self.mux = None;
                self.tracker.set_state(state);
                Err(e.into())
            }
        }
    }

    /// Close the connection with the card. Idempotent: always ends in
    /// `Disconnected`.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.tracker.set_state(ConnectionState::Disconnecting);

        if let Some(mux) = self.mux.take() {
            info!("Disconnecting from {}", self.transport.peer());
            mux.shutdown().await;
        }

        self.tracker.set_state(ConnectionState::Disconnected);
        Ok(())
    }

    /// List the contents of a directory on the card
    pub async fn list(&mut self, card_path: &str) -> Result<Response> {
        self.retrieve(Command::List, &glob_path(card_path)).await
    }

    /// Retrieve a file from the card, buffering its contents in memory
    pub async fn get(&mut self, card_path: &str) -> Result<Response> {
        self.retrieve(Command::Retr, card_path).await
    }

    /// Retrieve a file from the card, streaming its contents to a local file
    pub async fn get_to_file(&mut self, card_path: &str, local_path: &Path) -> Result<Response> {
        let mut abort = self.reset_abort();
        let Some(mux) = self.mux.as_mut() else {
            return Err(Error::NotConnected);
        };
        self.tracker.set_state(ConnectionState::Transferring);

        let result = async {
            send_command(mux, Command::Retr, card_path).await?;

            let first = Response::parse(&mux.read_command_line(&mut abort).await?)?;
            if first.status() != Status::DataTransferStarting {
                return Ok(first);
            }

            let mut file = tokio::fs::File::create(local_path).await?;
            let line = mux.read_data_until_reply(&mut file, &mut abort).await?;

            Ok(Response::parse(&line)?
                .with_body(ResponseBody::File(local_path.to_path_buf())))
        }
        .await;

        self.conclude(result).await
    }

    /// Store a file on the card, streaming the source over the data channel
    pub async fn put<R>(&mut self, card_path: &str, source: &mut R) -> Result<Response>
    where
        R: AsyncRead + Unpin,
    {
        let mut abort = self.reset_abort();
        let Some(mux) = self.mux.as_mut() else {
            return Err(Error::NotConnected);
        };
        self.tracker.set_state(ConnectionState::Transferring);

        let result = async {
            send_command(mux, Command::Stor, card_path).await?;

            let first = Response::parse(&mux.read_command_line(&mut abort).await?)?;
            if first.status() != Status::DataTransferStarting {
                // The card refused; the data channel stays untouched
                return Ok(first);
            }

            mux.write_data_stream(source, &mut abort).await?;

            let line = mux.read_command_line(&mut abort).await?;
            Ok(Response::parse(&line)?)
        }
        .await;

        self.conclude(result).await
    }

    /// Delete a file on the card
    pub async fn delete(&mut self, card_path: &str) -> Result<Response> {
        self.call(Command::Dele, card_path).await
    }

    /// Create a directory on the card
    pub async fn create_path(&mut self, card_path: &str) -> Result<Response> {
        self.call(Command::Mkd, card_path).await
    }

    /// Remove a directory on the card
    pub async fn delete_path(&mut self, card_path: &str) -> Result<Response> {
        self.call(Command::Rmd, card_path).await
    }

    /// Rename a file on the card.
    ///
    /// Two-step: `RNFR` names the source; `RNTO` is sent only when the card
    /// answers 350 (awaiting destination). Any other reply short-circuits.
    pub async fn rename(&mut self, from_path: &str, to_path: &str) -> Result<Response> {
        let from_response = self.call(Command::Rnfr, from_path).await?;
        if from_response.status() != Status::AwaitingRename {
            return Ok(from_response);
        }
        self.call(Command::Rnto, to_path).await
    }

    /// Commit an uploaded file, making it durable and visible on the card.
    ///
    /// Required after [`put`](Self::put); the argument carries a local-clock
    /// timestamp the card stamps onto the file.
    pub async fn finalize(&mut self, card_path: &str) -> Result<Response> {
        let argument = finalize_argument(card_path);
        self.call(Command::Srft, &argument).await
    }

    /// One command, one reply line, no data transfer
    async fn call(&mut self, command: Command, argument: &str) -> Result<Response> {
        let mut abort = self.reset_abort();
        let Some(mux) = self.mux.as_mut() else {
            return Err(Error::NotConnected);
        };
        self.tracker.set_state(ConnectionState::Transferring);

        let result = async {
            send_command(mux, command, argument).await?;
            let line = mux.read_command_line(&mut abort).await?;
            Ok(Response::parse(&line)?)
        }
        .await;

        self.conclude(result).await
    }

    /// Command with a data-channel response body buffered in memory
    async fn retrieve(&mut self, command: Command, argument: &str) -> Result<Response> {
        let mut abort = self.reset_abort();
        let Some(mux) = self.mux.as_mut() else {
            return Err(Error::NotConnected);
        };
        self.tracker.set_state(ConnectionState::Transferring);

        let result = async {
            send_command(mux, command, argument).await?;

            let first = Response::parse(&mux.read_command_line(&mut abort).await?)?;
            if first.status() != Status::DataTransferStarting {
                return Ok(first);
            }

            let mut body = Vec::new();
            let line = mux.read_data_until_reply(&mut body, &mut abort).await?;

            Ok(Response::parse(&line)?
                .with_body(ResponseBody::Bytes(Bytes::from(body))))
        }
        .await;

        self.conclude(result).await
    }

    /// Close out an operation: flip state back, convert aborts into the 426
    /// response and tear the connection down on genuine failures.
    async fn conclude(&mut self, result: Result<Response>) -> Result<Response> {
        match result {
            Ok(response) => {
                info!("Card response: '{}'", response.status_message());
                self.tracker.set_state(ConnectionState::Connected);
                Ok(response)
            }
            Err(Error::Aborted) => {
                warn!("Operation aborted");
                self.tracker.set_state(ConnectionState::Connected);
                Ok(Response::abort())
            }
            Err(e) => {
                let _ = self.disconnect().await;
                Err(e)
            }
        }
    }

    fn reset_abort(&self) -> watch::Receiver<bool> {
        self.abort_tx.send_replace(false);
        self.abort_rx.clone()
    }
}

async fn send_command(mux: &mut Multiplexer, command: Command, argument: &str) -> Result<()> {
    debug!("Sending command: '{} {}'", command, argument);
    mux.write_command(&command.line(argument)).await
}
