//! Event classification and command dispatch.
//!
//! [`parse_args`] decides whether an inbound event is addressed to the
//! adapter and extracts the command line; [`handle_event`] runs the
//! matching command and routes the reply back to the originating
//! conversation.

use tracing::{debug, warn};

use crate::client::{AuthIdentity, EventKind, InboundEvent, RtmSession};
use crate::command::CommandRegistry;
use crate::roster::UserRoster;

/// Conversation identifiers with this prefix denote direct (one-to-one)
/// channels.
const DIRECT_PREFIX: char = 'D';

/// Structured mention syntax for a user identifier.
fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Classify an event and extract its command-line arguments.
///
/// Returns `None` when the event should not be dispatched: not a
/// message, empty text, authored by the adapter itself, not addressed
/// to the adapter, or no command token left after stripping the
/// mention.
pub(crate) fn parse_args(event: &InboundEvent, identity: &AuthIdentity) -> Option<Vec<String>> {
    if event.kind != EventKind::Message || event.text.is_empty() {
        return None;
    }

    // Never react to our own messages.
    if event.sender == identity.user_id {
        return None;
    }

    let by_handle = !identity.handle.is_empty() && event.text.starts_with(&identity.handle);
    let by_mention = event.text.starts_with(&mention(&identity.user_id));
    let direct = event.conversation.starts_with(DIRECT_PREFIX);

    if !direct && !by_handle && !by_mention {
        return None;
    }

    let tokens = event.text.split_whitespace().map(str::to_owned);
    let args: Vec<String> = if by_handle || by_mention {
        // Drop the leading mention token.
        tokens.skip(1).collect()
    } else {
        tokens.collect()
    };

    if args.is_empty() {
        None
    } else {
        Some(args)
    }
}

/// Format the outgoing reply for a command outcome.
///
/// Failures are always attributed (`@name: error executing command:`);
/// successes drop the attribution prefix when the sender's name is
/// unknown or the conversation is a direct channel.
fn reply_text(
    outcome: Result<Vec<u8>, crate::command::CommandError>,
    name: &str,
    conversation: &str,
) -> String {
    match outcome {
        Err(e) => format!("@{name}: error executing command: {e}"),
        Ok(output) => {
            let output = String::from_utf8_lossy(&output).into_owned();
            if name.is_empty() || conversation.starts_with(DIRECT_PREFIX) {
                output
            } else {
                format!("@{name}: {output}")
            }
        }
    }
}

/// Run one inbound event through classification, command lookup,
/// execution, and reply delivery.
///
/// Unrecognized command names are ignored silently; command failures
/// are relayed to the conversation, never propagated.
pub(crate) async fn handle_event(
    event: &InboundEvent,
    identity: &AuthIdentity,
    registry: &CommandRegistry,
    roster: &UserRoster,
    session: &dyn RtmSession,
) {
    let Some(args) = parse_args(event, identity) else {
        return;
    };

    let Some(command) = registry.get(&args[0]) else {
        debug!(command = %args[0], "no matching command registered");
        return;
    };

    let name = roster.name_of(&event.sender);
    debug!(
        event_id = %event.event_id,
        command = %args[0],
        conversation = %event.conversation,
        "dispatching command"
    );

    let text = reply_text(command.exec(&args), &name, &event.conversation);

    if let Err(e) = session.send(&text, &event.conversation).await {
        warn!(error = %e, conversation = %event.conversation, "failed to send reply");
    }
}
