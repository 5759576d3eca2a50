//! Registry of logged-in participants.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::SyncError;
use crate::sync::fanout::Outbox;
use crate::sync::types::{Identity, Peer, Selection, SessionId};

/// One logged-in participant.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub selection: Option<Selection>,
    pub joined_at: DateTime<Utc>,
    outbox: Outbox,
}

impl Session {
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    fn as_peer(&self) -> Peer {
        Peer {
            user: self.identity.clone(),
            selection: self.selection,
        }
    }
}

/// Logged-in sessions keyed by their connection token.
///
/// Membership changes and selection updates are the only mutations; the
/// registry never touches the document.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<SessionId, Session>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a participant under its identity's token.
    pub fn join(&mut self, identity: Identity, outbox: Outbox) -> SessionId {
        let id = identity.id;
        self.sessions.insert(
            id,
            Session {
                identity,
                selection: None,
                joined_at: Utc::now(),
                outbox,
            },
        );
        id
    }

    /// Removes a session. Leaving twice is a no-op.
    pub fn leave(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn set_selection(
        &mut self,
        id: SessionId,
        selection: Option<Selection>,
    ) -> Result<(), SyncError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(SyncError::UnknownSession(id))?;
        session.selection = selection;
        Ok(())
    }

    /// Roster of everyone except `excluding`, in no particular order.
    pub fn list_others(&self, excluding: SessionId) -> Vec<Peer> {
        self.sessions
            .iter()
            .filter(|(id, _)| **id != excluding)
            .map(|(_, session)| session.as_peer())
            .collect()
    }

    /// Outboxes of every session except `except`.
    pub fn recipients(
        &self,
        except: Option<SessionId>,
    ) -> impl Iterator<Item = (SessionId, &Outbox)> + '_ {
        self.sessions
            .iter()
            .filter(move |(id, _)| Some(**id) != except)
            .map(|(id, session)| (*id, &session.outbox))
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::Profile;

    fn identity(name: &str) -> Identity {
        Identity::new(SessionId::new(), Profile::new(name, "#123456"))
    }

    fn join(registry: &mut Registry, name: &str) -> SessionId {
        let (outbox, _receiver) = Outbox::channel(4);
        registry.join(identity(name), outbox)
    }

    #[test]
    fn test_join_and_leave() {
        let mut registry = Registry::new();
        let alice = join(&mut registry, "Alice");
        assert!(registry.contains(alice));
        assert_eq!(registry.len(), 1);

        assert!(registry.leave(alice).is_some());
        assert!(registry.leave(alice).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_others_excludes_caller() {
        let mut registry = Registry::new();
        let alice = join(&mut registry, "Alice");
        let bob = join(&mut registry, "Bob");

        let roster = registry.list_others(bob);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].user.id, alice);
        assert_eq!(roster[0].selection, None);
    }

    #[test]
    fn test_set_selection() {
        let mut registry = Registry::new();
        let alice = join(&mut registry, "Alice");
        let bob = join(&mut registry, "Bob");

        registry.set_selection(alice, Some(Selection::new(3, 2))).unwrap();
        assert_eq!(registry.get(alice).unwrap().selection, Some(Selection::new(3, 2)));
        assert_eq!(registry.list_others(bob)[0].selection, Some(Selection::new(3, 2)));

        let stale = SessionId::new();
        assert_eq!(
            registry.set_selection(stale, None),
            Err(SyncError::UnknownSession(stale))
        );
    }

    #[test]
    fn test_recipients_exclusion() {
        let mut registry = Registry::new();
        let alice = join(&mut registry, "Alice");
        let bob = join(&mut registry, "Bob");

        let ids: Vec<_> = registry.recipients(Some(alice)).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![bob]);
        assert_eq!(registry.recipients(None).count(), 2);
    }
}
