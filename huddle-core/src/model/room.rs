use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ModelError;

/// Longest room id accepted, in bytes.
pub const MAX_ROOM_ID_LEN: usize = 128;

/// Opaque, caller-chosen room identifier (a URL path segment).
///
/// Rooms have no creation step: any valid id names a room, which comes into
/// existence the first time somebody joins it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, ModelError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ModelError::InvalidRoomId("room id is empty".to_owned()));
        }
        if raw.len() > MAX_ROOM_ID_LEN {
            return Err(ModelError::InvalidRoomId(format!(
                "room id is longer than {MAX_ROOM_ID_LEN} bytes"
            )));
        }
        if raw.chars().any(|c| c == '/' || c.is_control()) {
            return Err(ModelError::InvalidRoomId(
                "room id contains '/' or control characters".to_owned(),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
