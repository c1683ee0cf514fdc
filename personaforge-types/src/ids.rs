//! Newtype identifiers used across the pipeline.
//!
//! Keeping these as distinct types (rather than passing bare `String`s
//! around) is what makes a persona-scoping bug visible at the type level
//! instead of at query time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(PersonaId);
string_id!(UserId);
string_id!(ChannelId);
string_id!(MessageId);
string_id!(TurnId);
string_id!(SessionId);
string_id!(TopicId);
string_id!(ContextId);
string_id!(AttributionId);

/// Key identifying one logical conversation thread: the unit of ordering
/// guarantees in §5 (serial processing per `(user_id, channel_id)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub user_id: UserId,
    pub channel_id: ChannelId,
}

impl ConversationKey {
    pub fn new(user_id: UserId, channel_id: ChannelId) -> Self {
        Self { user_id, channel_id }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.channel_id)
    }
}
