//! Shared in-memory fakes for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::client::{
    AuthIdentity, InboundEvent, RtmClient, RtmConnector, RtmError, RtmSession, User,
};
use crate::command::{Command, CommandError};

/// Identity every mock client authenticates as.
pub(crate) fn bot_identity() -> AuthIdentity {
    AuthIdentity {
        user_id: "U42".to_owned(),
        handle: "@bot".to_owned(),
    }
}

/// Per-session observation log shared between a mock session and the
/// test that inspects it.
#[derive(Default)]
pub(crate) struct SessionLog {
    /// Outgoing messages as (text, conversation) pairs, in send order.
    pub sent: Mutex<Vec<(String, String)>>,
    /// Number of times the session was asked to close.
    pub close_calls: AtomicUsize,
}

impl SessionLog {
    /// Whether the session has been closed at least once.
    pub(crate) fn closed(&self) -> bool {
        self.close_calls.load(Ordering::SeqCst) > 0
    }
}

/// In-memory stand-in for a wire session.
pub(crate) struct MockSession {
    pub log: Arc<SessionLog>,
    events: mpsc::UnboundedReceiver<InboundEvent>,
}

impl MockSession {
    /// A session with no event source, for send-only tests.
    pub(crate) fn detached() -> Self {
        let (_tx, rx) = mpsc::unbounded_channel();
        Self {
            log: Arc::new(SessionLog::default()),
            events: rx,
        }
    }
}

#[async_trait]
impl RtmSession for MockSession {
    async fn next_event(&mut self) -> Option<InboundEvent> {
        self.events.recv().await
    }

    async fn send(&self, text: &str, conversation: &str) -> Result<(), RtmError> {
        if self.log.closed() {
            return Err(RtmError::SessionClosed);
        }
        self.log
            .sent
            .lock()
            .expect("sent lock")
            .push((text.to_owned(), conversation.to_owned()));
        Ok(())
    }

    fn close(&self) {
        self.log.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory stand-in for a wire client.
///
/// The first opened session consumes the event feed returned from
/// [`MockClient::new`]; later sessions get fresh channels whose senders
/// land in `extra_senders`. Session logs are collected in open order.
pub(crate) struct MockClient {
    pub identity: AuthIdentity,
    pub users: Mutex<Vec<User>>,
    pub fail_users: AtomicBool,
    pub fail_auth: AtomicBool,
    pub list_calls: AtomicUsize,
    pub sessions: Mutex<Vec<Arc<SessionLog>>>,
    pub extra_senders: Mutex<Vec<mpsc::UnboundedSender<InboundEvent>>>,
    first_events: Mutex<Option<mpsc::UnboundedReceiver<InboundEvent>>>,
}

impl MockClient {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedSender<InboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Arc::new(Self {
            identity: bot_identity(),
            users: Mutex::new(Vec::new()),
            fail_users: AtomicBool::new(false),
            fail_auth: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            sessions: Mutex::new(Vec::new()),
            extra_senders: Mutex::new(Vec::new()),
            first_events: Mutex::new(Some(rx)),
        });
        (client, tx)
    }

    /// Log of the `index`-th opened session.
    pub(crate) fn session_log(&self, index: usize) -> Arc<SessionLog> {
        Arc::clone(&self.sessions.lock().expect("sessions lock")[index])
    }
}

#[async_trait]
impl RtmClient for MockClient {
    async fn authenticate(&self) -> Result<AuthIdentity, RtmError> {
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(RtmError::Auth("invalid token".to_owned()));
        }
        Ok(self.identity.clone())
    }

    async fn open_session(&self) -> Result<Box<dyn RtmSession>, RtmError> {
        let events = match self.first_events.lock().expect("first_events lock").take() {
            Some(rx) => rx,
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                self.extra_senders.lock().expect("senders lock").push(tx);
                rx
            }
        };
        let log = Arc::new(SessionLog::default());
        self.sessions.lock().expect("sessions lock").push(Arc::clone(&log));
        Ok(Box::new(MockSession { log, events }))
    }

    async fn list_users(&self) -> Result<Vec<User>, RtmError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_users.load(Ordering::SeqCst) {
            return Err(RtmError::Transport("user list unavailable".to_owned()));
        }
        Ok(self.users.lock().expect("users lock").clone())
    }
}

/// Connector handing out a fixed mock client, recording each connect.
pub(crate) struct MockConnector {
    pub client: Arc<MockClient>,
    pub connects: Mutex<Vec<(String, bool)>>,
}

impl MockConnector {
    pub(crate) fn new(client: Arc<MockClient>) -> Arc<Self> {
        Arc::new(Self {
            client,
            connects: Mutex::new(Vec::new()),
        })
    }
}

impl RtmConnector for MockConnector {
    fn connect(&self, token: &str, debug: bool) -> Arc<dyn RtmClient> {
        self.connects
            .lock()
            .expect("connects lock")
            .push((token.to_owned(), debug));
        let client: Arc<dyn RtmClient> = self.client.clone();
        client
    }
}

/// Scriptable command recording every invocation.
pub(crate) struct TestCommand {
    name: String,
    response: Result<Vec<u8>, String>,
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl TestCommand {
    pub(crate) fn ok(name: &str, output: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            response: Ok(output.as_bytes().to_vec()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing(name: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            response: Err(message.to_owned()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

impl Command for TestCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn exec(&self, args: &[String]) -> Result<Vec<u8>, CommandError> {
        self.calls.lock().expect("calls lock").push(args.to_vec());
        match &self.response {
            Ok(output) => Ok(output.clone()),
            Err(message) => Err(message.clone().into()),
        }
    }
}

/// Poll `condition` until it holds, failing the test after 5 seconds.
pub(crate) async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Yield repeatedly so spawned tasks get a chance to run.
pub(crate) async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
