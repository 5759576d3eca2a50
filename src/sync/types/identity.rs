//! Participant identity and roster entries.

use serde::{Deserialize, Serialize};

use crate::sync::types::{Selection, SessionId};

/// Display attributes handed out by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub display_name: String,
    pub color: String,
}

impl Profile {
    pub fn new(display_name: impl Into<String>, color: impl Into<String>) -> Self {
        Profile {
            display_name: display_name.into(),
            color: color.into(),
        }
    }
}

/// Who a participant is, fixed for the lifetime of their connection.
///
/// The display name travels as `name` on the wire, which is what the editor
/// front-end reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: SessionId,
    #[serde(rename = "name")]
    pub display_name: String,
    pub color: String,
}

impl Identity {
    pub fn new(id: SessionId, profile: Profile) -> Self {
        Identity {
            id,
            display_name: profile.display_name,
            color: profile.color,
        }
    }
}

/// One entry of the roster sent to a joining participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub user: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
}
