//! The synchronization engine: one aggregate owning the document and the
//! session registry, driven one message at a time.
//!
//! Each connection moves through `Connected` (socket open, no identity) to
//! `Authenticated` (after `LOGIN`) and finally `Closed`. Callers share the
//! engine as a [`SharedEngine`] and hold its lock for the whole handling of
//! a message, fanout included, so the order in which edits are applied is
//! the order in which every participant sees them.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::delta::Delta;
use crate::error::SyncError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::sync::document::Document;
use crate::sync::fanout::{self, Outbox};
use crate::sync::identity::IdentityProvider;
use crate::sync::registry::Registry;
use crate::sync::types::{Identity, Selection, SessionId};

/// The engine behind its serialization lock.
pub type SharedEngine = Arc<Mutex<SyncEngine>>;

/// Lifecycle of one connection as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Authenticated,
    Closed,
}

/// Behaviour switches for the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Tell a sender when its edit was rejected as malformed. Off by
    /// default, in which case rejected edits are only logged.
    pub report_rejected_edits: bool,
}

/// Point-in-time counters, for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub participants: usize,
    pub pending: usize,
    pub revision: usize,
    pub document_length: usize,
}

pub struct SyncEngine {
    document: Document,
    registry: Registry,
    pending: HashMap<SessionId, Outbox>,
    identities: Box<dyn IdentityProvider>,
    options: EngineOptions,
}

impl SyncEngine {
    pub fn new(document: Document, identities: impl IdentityProvider + 'static) -> Self {
        SyncEngine {
            document,
            registry: Registry::new(),
            pending: HashMap::new(),
            identities: Box::new(identities),
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    /// Accepts a new connection in the `Connected` state.
    pub fn connect(&mut self, outbox: Outbox) -> SessionId {
        let mut id = SessionId::new();
        while self.pending.contains_key(&id) || self.registry.contains(id) {
            id = SessionId::new();
        }
        self.pending.insert(id, outbox);
        debug!(session = %id, "connection opened");
        id
    }

    pub fn state(&self, id: SessionId) -> ConnectionState {
        if self.registry.contains(id) {
            ConnectionState::Authenticated
        } else if self.pending.contains_key(&id) {
            ConnectionState::Connected
        } else {
            ConnectionState::Closed
        }
    }

    /// Decodes and handles one text frame from `id`.
    pub fn handle_text(&mut self, id: SessionId, text: &str) -> Result<(), SyncError> {
        let result = match ClientMessage::decode(text) {
            Ok(message) => self.handle(id, message),
            // A bad edit only counts as one from a logged-in participant.
            Err(SyncError::MalformedEdit(error)) => self
                .require_authenticated(id)
                .and(Err(SyncError::MalformedEdit(error))),
            Err(error) => Err(error),
        };
        if let Err(error @ SyncError::MalformedEdit(_)) = &result {
            if self.options.report_rejected_edits {
                self.report_rejection(id, error);
            }
        }
        result
    }

    /// Handles one decoded message from `id`.
    pub fn handle(&mut self, id: SessionId, message: ClientMessage) -> Result<(), SyncError> {
        match message {
            ClientMessage::Login => self.login(id),
            ClientMessage::Change(delta) => self.change(id, delta),
            ClientMessage::UserCursorChanged(selection) => self.move_cursor(id, selection),
        }
    }

    /// Tears down a connection. Only the first call for a given handle has
    /// any effect; a logged-in participant's departure is announced to the
    /// rest exactly once.
    pub fn disconnect(&mut self, id: SessionId) -> bool {
        if self.pending.remove(&id).is_some() {
            debug!(session = %id, "connection closed before login");
            return true;
        }

        let Some(session) = self.registry.leave(id) else {
            return false;
        };
        let delivered = fanout::broadcast(
            self.registry.recipients(None),
            &ServerMessage::UserLeaved { id },
        );
        info!(
            session = %id,
            name = %session.identity.display_name,
            connected_secs = (Utc::now() - session.joined_at).num_seconds(),
            notified = delivered,
            "participant left"
        );
        true
    }

    fn login(&mut self, id: SessionId) -> Result<(), SyncError> {
        let Some(outbox) = self.pending.remove(&id) else {
            return Err(if self.registry.contains(id) {
                SyncError::ProtocolViolation("LOGIN received twice".into())
            } else {
                SyncError::UnknownSession(id)
            });
        };

        let identity = Identity::new(id, self.identities.new_profile());
        let roster = self.registry.list_others(id);
        self.registry.join(identity.clone(), outbox.clone());

        // The joiner learns who it is and who else is here before it gets
        // the document.
        fanout::send_to(id, &outbox, ServerMessage::Authenticated(identity.clone()));
        fanout::send_to(id, &outbox, ServerMessage::UserList(roster));
        fanout::send_to(id, &outbox, ServerMessage::Init(self.document.snapshot()));

        let name = identity.display_name.clone();
        let delivered = fanout::broadcast(
            self.registry.recipients(Some(id)),
            &ServerMessage::UserJoined(identity),
        );
        info!(session = %id, %name, notified = delivered, "participant joined");
        Ok(())
    }

    fn change(&mut self, id: SessionId, delta: Delta) -> Result<(), SyncError> {
        self.require_authenticated(id)?;
        self.document.apply(delta.clone())?;

        let delivered = fanout::broadcast(
            self.registry.recipients(Some(id)),
            &ServerMessage::Change(delta),
        );
        debug!(
            session = %id,
            revision = self.document.revision(),
            notified = delivered,
            "edit accepted"
        );
        Ok(())
    }

    fn move_cursor(&mut self, id: SessionId, selection: Option<Selection>) -> Result<(), SyncError> {
        self.require_authenticated(id)?;
        self.registry.set_selection(id, selection)?;

        fanout::broadcast(
            self.registry.recipients(Some(id)),
            &ServerMessage::UserCursorChanged {
                user_id: id,
                selection,
            },
        );
        Ok(())
    }

    fn require_authenticated(&self, id: SessionId) -> Result<(), SyncError> {
        match self.state(id) {
            ConnectionState::Authenticated => Ok(()),
            ConnectionState::Connected => Err(SyncError::ProtocolViolation(
                "message received before LOGIN".into(),
            )),
            ConnectionState::Closed => Err(SyncError::UnknownSession(id)),
        }
    }

    fn report_rejection(&self, id: SessionId, error: &SyncError) {
        if let Some(session) = self.registry.get(id) {
            fanout::send_to(
                id,
                session.outbox(),
                ServerMessage::Error {
                    code: "MALFORMED_EDIT".into(),
                    message: error.to_string(),
                },
            );
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            participants: self.registry.len(),
            pending: self.pending.len(),
            revision: self.document.revision(),
            document_length: self.document.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::Profile;
    use tokio::sync::mpsc::Receiver;

    fn engine() -> SyncEngine {
        SyncEngine::new(Document::seed("Hello world"), || {
            Profile::new("Test User", "#336699")
        })
    }

    fn connect(engine: &mut SyncEngine) -> (SessionId, Receiver<ServerMessage>) {
        let (outbox, receiver) = Outbox::channel(16);
        (engine.connect(outbox), receiver)
    }

    fn drain(receiver: &mut Receiver<ServerMessage>) -> Vec<ServerMessage> {
        std::iter::from_fn(|| receiver.try_recv().ok()).collect()
    }

    #[test]
    fn test_connection_states() {
        let mut engine = engine();
        let (id, _rx) = connect(&mut engine);
        assert_eq!(engine.state(id), ConnectionState::Connected);

        engine.handle(id, ClientMessage::Login).unwrap();
        assert_eq!(engine.state(id), ConnectionState::Authenticated);

        assert!(engine.disconnect(id));
        assert_eq!(engine.state(id), ConnectionState::Closed);
        assert!(!engine.disconnect(id));
    }

    #[test]
    fn test_login_reply_order() {
        let mut engine = engine();
        let (id, mut rx) = connect(&mut engine);
        engine.handle(id, ClientMessage::Login).unwrap();

        let replies = drain(&mut rx);
        let kinds: Vec<_> = replies.iter().map(ServerMessage::kind).collect();
        assert_eq!(kinds, vec!["AUTHENTICATED", "USER_LIST", "INIT"]);
        match &replies[0] {
            ServerMessage::Authenticated(identity) => {
                assert_eq!(identity.id, id);
                assert_eq!(identity.display_name, "Test User");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(replies[1], ServerMessage::UserList(vec![]));
        assert_eq!(replies[2], ServerMessage::Init(Delta::new().insert("Hello world")));
    }

    #[test]
    fn test_second_login_is_a_violation() {
        let mut engine = engine();
        let (id, _rx) = connect(&mut engine);
        engine.handle(id, ClientMessage::Login).unwrap();
        assert!(matches!(
            engine.handle(id, ClientMessage::Login),
            Err(SyncError::ProtocolViolation(_))
        ));
        assert_eq!(engine.registry().len(), 1);
    }

    #[test]
    fn test_messages_before_login_are_dropped() {
        let mut engine = engine();
        let (early, _early_rx) = connect(&mut engine);
        let (member, mut member_rx) = connect(&mut engine);
        engine.handle(member, ClientMessage::Login).unwrap();
        drain(&mut member_rx);

        let edit = Delta::new().retain(11).insert("?");
        assert!(matches!(
            engine.handle(early, ClientMessage::Change(edit)),
            Err(SyncError::ProtocolViolation(_))
        ));
        assert!(matches!(
            engine.handle(early, ClientMessage::UserCursorChanged(None)),
            Err(SyncError::ProtocolViolation(_))
        ));
        assert_eq!(engine.document().revision(), 0);
        assert!(drain(&mut member_rx).is_empty());
    }

    #[test]
    fn test_unknown_session_is_a_noop() {
        let mut engine = engine();
        let ghost = SessionId::new();
        assert_eq!(
            engine.handle(ghost, ClientMessage::Login),
            Err(SyncError::UnknownSession(ghost))
        );
        assert_eq!(
            engine.handle(ghost, ClientMessage::UserCursorChanged(None)),
            Err(SyncError::UnknownSession(ghost))
        );
        assert!(!engine.disconnect(ghost));
    }

    #[test]
    fn test_disconnect_before_login_is_silent() {
        let mut engine = engine();
        let (member, mut member_rx) = connect(&mut engine);
        engine.handle(member, ClientMessage::Login).unwrap();
        drain(&mut member_rx);

        let (lurker, _lurker_rx) = connect(&mut engine);
        assert!(engine.disconnect(lurker));
        assert!(drain(&mut member_rx).is_empty());
    }

    #[test]
    fn test_rejected_edit_reporting() {
        let mut engine = engine().with_options(EngineOptions {
            report_rejected_edits: true,
        });
        let (id, mut rx) = connect(&mut engine);
        engine.handle(id, ClientMessage::Login).unwrap();
        drain(&mut rx);

        let result = engine.handle_text(id, r#"{"type":"CHANGE","data":{"ops":[{"delete":99}]}}"#);
        assert!(matches!(result, Err(SyncError::MalformedEdit(_))));

        let replies = drain(&mut rx);
        assert_eq!(replies.len(), 1);
        assert!(matches!(&replies[0], ServerMessage::Error { code, .. } if code == "MALFORMED_EDIT"));
    }

    #[test]
    fn test_rejected_edits_are_silent_by_default() {
        let mut engine = engine();
        let (id, mut rx) = connect(&mut engine);
        engine.handle(id, ClientMessage::Login).unwrap();
        drain(&mut rx);

        assert!(engine.handle_text(id, r#"{"type":"CHANGE","data":{"ops":[{"bogus":1}]}}"#).is_err());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_stats() {
        let mut engine = engine();
        let (a, _a_rx) = connect(&mut engine);
        let (_b, _b_rx) = connect(&mut engine);
        engine.handle(a, ClientMessage::Login).unwrap();
        engine
            .handle(a, ClientMessage::Change(Delta::new().retain(11).insert("!")))
            .unwrap();

        assert_eq!(
            engine.stats(),
            EngineStats {
                participants: 1,
                pending: 1,
                revision: 1,
                document_length: 12,
            }
        );
    }
}
