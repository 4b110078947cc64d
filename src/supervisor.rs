//! Per-session run loop.
//!
//! One supervisor task owns each live session and multiplexes three
//! wakeup sources: the shutdown signal, the periodic roster refresh
//! timer, and the inbound event stream. Events are handled one at a
//! time on this task, so arrival order is preserved and no two events
//! of a session are ever dispatched concurrently.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{AuthIdentity, EventKind, InboundEvent, RtmClient, RtmSession};
use crate::command::CommandRegistry;
use crate::dispatch;
use crate::roster::UserRoster;

/// Owns one managed session's run loop.
pub(crate) struct Supervisor {
    pub identity: AuthIdentity,
    pub client: Arc<dyn RtmClient>,
    pub registry: Arc<CommandRegistry>,
    pub roster: Arc<UserRoster>,
    pub cancel: CancellationToken,
    pub refresh_interval: Duration,
}

impl Supervisor {
    /// Drive the session until shutdown is signalled, the service
    /// invalidates our credentials, or the event stream ends. The
    /// session is closed on every exit path.
    pub(crate) async fn run(self, mut session: Box<dyn RtmSession>) {
        info!(handle = %self.identity.handle, "session supervisor started");

        // Initial roster fill; the timer covers subsequent rebuilds.
        self.roster.refresh(self.client.as_ref()).await;

        let mut refresh = tokio::time::interval(self.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval's first tick completes immediately; the initial
        // fill above already covered it.
        refresh.tick().await;

        loop {
            let event = tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    info!("shutdown signalled, closing session");
                    break;
                }

                _ = refresh.tick() => {
                    self.roster.refresh(self.client.as_ref()).await;
                    continue;
                }

                event = session.next_event() => event,
            };

            match event {
                None => {
                    info!("event stream ended, closing session");
                    break;
                }
                Some(event) if event.kind == EventKind::InvalidAuth => {
                    warn!("authentication invalidated mid-session, closing session");
                    break;
                }
                Some(event) => self.handle(&event, session.as_ref()).await,
            }
        }

        session.close();
    }

    async fn handle(&self, event: &InboundEvent, session: &dyn RtmSession) {
        debug!(event_id = %event.event_id, kind = ?event.kind, "inbound event");
        dispatch::handle_event(
            event,
            &self.identity,
            &self.registry,
            &self.roster,
            session,
        )
        .await;
    }
}
