//! Adapter lifecycle: the public configure/start/stop/connect surface.
//!
//! All mutable lifecycle state lives in a dedicated `BridgeState`
//! guarded by one async mutex; the lock is held only around state
//! transitions (and the initial authentication at start), never across
//! other I/O. Shutdown is a [`CancellationToken`]: cancelling is
//! idempotent, and standalone connection handles carry child tokens so
//! an adapter-wide stop reaches them while their own close stays local.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{AuthIdentity, InboundEvent, RtmClient, RtmConnector, RtmError, RtmSession};
use crate::command::{Command, CommandRegistry};
use crate::config::AdapterConfig;
use crate::roster::UserRoster;
use crate::supervisor::Supervisor;
use crate::AdapterError;

/// Mutable lifecycle state, transitioned as one unit under the
/// bridge's state lock.
#[derive(Default)]
struct BridgeState {
    running: bool,
    client: Option<Arc<dyn RtmClient>>,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

/// The chat adapter: bridges a remote real-time session to registered
/// commands.
///
/// All methods take `&self`; the bridge is intended to live in an
/// `Arc` shared between the hosting framework's control surface and
/// its registration calls.
pub struct RtmBridge {
    connector: Arc<dyn RtmConnector>,
    config: StdMutex<Option<AdapterConfig>>,
    state: Mutex<BridgeState>,
    registry: Arc<CommandRegistry>,
    roster: Arc<UserRoster>,
}

impl RtmBridge {
    /// Create an unconfigured bridge around a wire-client connector.
    pub fn new(connector: Arc<dyn RtmConnector>) -> Self {
        Self {
            connector,
            config: StdMutex::new(None),
            state: Mutex::new(BridgeState::default()),
            registry: Arc::new(CommandRegistry::new()),
            roster: Arc::new(UserRoster::new()),
        }
    }

    /// Store the adapter configuration. Pure configuration: no side
    /// effects beyond replacing any previously stored values.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::MissingToken`] when the credential is
    /// empty.
    pub fn configure(&self, config: AdapterConfig) -> Result<(), AdapterError> {
        if config.token.is_empty() {
            return Err(AdapterError::MissingToken);
        }
        *self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(config);
        Ok(())
    }

    /// Start the managed session: authenticate, open the real-time
    /// session, and spawn the run loop. Idempotent: a running bridge
    /// returns success without opening a second session.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::MissingToken`] when unconfigured,
    /// [`AdapterError::AuthRejected`] when the service rejects the
    /// credential, [`AdapterError::Rtm`] when the session cannot be
    /// opened.
    pub async fn start(&self) -> Result<(), AdapterError> {
        let config = self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(AdapterError::MissingToken)?;

        let mut state = self.state.lock().await;
        if state.running {
            debug!("start called while already running");
            return Ok(());
        }

        let client = self.connector.connect(&config.token, config.debug);
        // The state lock stays held across this initial authentication
        // only; no other I/O happens under it.
        let identity = client
            .authenticate()
            .await
            .map_err(AdapterError::AuthRejected)?;
        info!(
            user_id = %identity.user_id,
            handle = %identity.handle,
            "authenticated with chat service"
        );

        let session = client.open_session().await?;
        let cancel = CancellationToken::new();
        let supervisor = Supervisor {
            identity,
            client: Arc::clone(&client),
            registry: Arc::clone(&self.registry),
            roster: Arc::clone(&self.roster),
            cancel: cancel.clone(),
            refresh_interval: Duration::from_secs(config.refresh_interval_secs),
        };
        let task = tokio::spawn(supervisor.run(session));

        state.client = Some(client);
        state.cancel = Some(cancel);
        state.task = Some(task);
        state.running = true;
        Ok(())
    }

    /// Signal the run loop to terminate and mark the bridge stopped.
    ///
    /// Idempotent; does not block waiting for the loop to exit (the
    /// loop acts on the cancellation at its next wait-point and closes
    /// the session itself).
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        if !state.running {
            debug!("stop called while not running");
            return;
        }
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
        }
        state.task = None;
        state.client = None;
        state.running = false;
        info!("adapter stopped");
    }

    /// Open a standalone session handle, distinct from the managed
    /// run loop. The handle's shutdown signal is a child of the
    /// bridge's: stopping the bridge cancels the handle, while closing
    /// the handle leaves the bridge (and other handles) running.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotRunning`] when the bridge is not
    /// running, [`AdapterError::AuthRejected`] / [`AdapterError::Rtm`]
    /// on authentication or session failure.
    pub async fn connect(&self) -> Result<BridgeConn, AdapterError> {
        let (client, cancel) = {
            let state = self.state.lock().await;
            if !state.running {
                return Err(AdapterError::NotRunning);
            }
            let client = state.client.clone().ok_or(AdapterError::NotRunning)?;
            let cancel = state
                .cancel
                .as_ref()
                .ok_or(AdapterError::NotRunning)?
                .child_token();
            (client, cancel)
        };

        let identity = client
            .authenticate()
            .await
            .map_err(AdapterError::AuthRejected)?;
        let session = client.open_session().await?;
        info!(user_id = %identity.user_id, "standalone connection opened");

        Ok(BridgeConn {
            identity,
            session,
            cancel,
            closed: AtomicBool::new(false),
        })
    }

    /// Register a command. Thread-safe; callable before or after
    /// `start`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::DuplicateCommand`] on a name conflict;
    /// the existing command is kept.
    pub fn register_command(&self, command: Arc<dyn Command>) -> Result<(), AdapterError> {
        self.registry.register(command)
    }

    /// Whether a managed session is currently active.
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }
}

/// A standalone, independently-cancellable session handle returned by
/// [`RtmBridge::connect`].
///
/// The underlying session is closed exactly once: on [`close`], on
/// drop, or when `recv` observes cancellation or stream end —
/// whichever comes first.
///
/// [`close`]: BridgeConn::close
pub struct BridgeConn {
    identity: AuthIdentity,
    session: Box<dyn RtmSession>,
    cancel: CancellationToken,
    closed: AtomicBool,
}

impl std::fmt::Debug for BridgeConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConn")
            .field("identity", &self.identity)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl BridgeConn {
    /// The identity this connection authenticated as.
    pub fn identity(&self) -> &AuthIdentity {
        &self.identity
    }

    /// Wait for the next inbound event. Returns `None` once the handle
    /// is cancelled (locally or by an adapter-wide stop) or the stream
    /// ends; the session is closed before returning in either case.
    pub async fn recv(&mut self) -> Option<InboundEvent> {
        let event = tokio::select! {
            biased;

            () = self.cancel.cancelled() => None,

            event = self.session.next_event() => event,
        };
        if event.is_none() {
            self.close_session();
        }
        event
    }

    /// Send `text` to the given conversation.
    ///
    /// # Errors
    ///
    /// Returns [`RtmError::SessionClosed`] once closed, or the
    /// transport error from the underlying session.
    pub async fn send(&self, text: &str, conversation: &str) -> Result<(), RtmError> {
        self.session.send(text, conversation).await
    }

    /// Cancel this handle and close its session. Idempotent; does not
    /// affect the bridge's managed session or other handles.
    pub fn close(&self) {
        self.cancel.cancel();
        self.close_session();
    }

    fn close_session(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.session.close();
        }
    }
}

impl Drop for BridgeConn {
    fn drop(&mut self) {
        self.close();
    }
}
