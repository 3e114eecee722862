//! Common types used throughout the matchmaking engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for chat participants (opaque chat id)
pub type UserId = i64;

/// Unique identifier for a committed pairing
pub type PairId = Uuid;

/// Declared gender of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = crate::error::MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(crate::error::MatchmakingError::InvalidProfileInput {
                field: "gender".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Other => write!(f, "other"),
        }
    }
}

/// Declared partner preference of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Male,
    Female,
    Any,
}

impl Preference {
    /// Whether this preference accepts the given gender
    pub fn accepts(&self, gender: Gender) -> bool {
        match self {
            Preference::Any => true,
            Preference::Male => gender == Gender::Male,
            Preference::Female => gender == Gender::Female,
        }
    }
}

impl FromStr for Preference {
    type Err = crate::error::MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Preference::Male),
            "female" => Ok(Preference::Female),
            "any" => Ok(Preference::Any),
            _ => Err(crate::error::MatchmakingError::InvalidProfileInput {
                field: "preference".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Preference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preference::Male => write!(f, "male"),
            Preference::Female => write!(f, "female"),
            Preference::Any => write!(f, "any"),
        }
    }
}

/// Connection state of a participant
///
/// A partner id exists exactly when the user is `Connected`; the pairing
/// commit path keeps the relation symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Waiting,
    Connected { partner: UserId },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, ConnectionState::Waiting)
    }

    pub fn partner(&self) -> Option<UserId> {
        match self {
            ConnectionState::Connected { partner } => Some(*partner),
            _ => None,
        }
    }
}

/// Multi-step input capture state, orthogonal to the connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Idle,
    AwaitingGender,
    AwaitingPreference,
    AwaitingInterests,
}

impl Default for ConversationState {
    fn default() -> Self {
        ConversationState::Idle
    }
}

/// A chat participant record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub connection: ConnectionState,
    pub gender: Option<Gender>,
    pub preference: Option<Preference>,
    pub interests: BTreeSet<String>,
    pub blocked_peers: BTreeSet<UserId>,
    pub report_count: u32,
    pub conversation: ConversationState,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl User {
    /// Create a fresh user record with defaults (lazy materialization)
    pub fn new(id: UserId) -> Self {
        let now = crate::utils::current_timestamp();
        Self {
            id,
            connection: ConnectionState::Idle,
            gender: None,
            preference: None,
            interests: BTreeSet::new(),
            blocked_peers: BTreeSet::new(),
            report_count: 0,
            conversation: ConversationState::Idle,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn is_waiting(&self) -> bool {
        self.connection.is_waiting()
    }

    pub fn partner_id(&self) -> Option<UserId> {
        self.connection.partner()
    }

    /// Whether the user has declared both gender and preference
    pub fn profile_complete(&self) -> bool {
        self.gender.is_some() && self.preference.is_some()
    }

    pub fn has_blocked(&self, other: UserId) -> bool {
        self.blocked_peers.contains(&other)
    }
}

/// Reason why a chat session ended, carried in partner notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    PartnerStopped,
    PartnerSkipped,
    Reported,
    Blocked,
}

/// Event emitted when two users are committed into a pairing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConnected {
    pub pair_id: PairId,
    pub users: [UserId; 2],
    pub timestamp: DateTime<Utc>,
}

/// Event emitted to the remaining party when a chat session ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEnded {
    pub user_id: UserId,
    pub reason: EndReason,
    pub timestamp: DateTime<Utc>,
}

/// Advisory caution sent to a user whose new partner has been reported often
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportWarning {
    pub user_id: UserId,
    pub partner_report_count: u32,
    pub timestamp: DateTime<Utc>,
}

/// Union type for all outbound chat events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    PairConnected(PairConnected),
    ChatEnded(ChatEnded),
    ReportWarning(ReportWarning),
    Searching { user_id: UserId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parsing() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" female ".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("OTHER".parse::<Gender>().unwrap(), Gender::Other);
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn test_preference_parsing_and_accepts() {
        assert_eq!("any".parse::<Preference>().unwrap(), Preference::Any);
        assert!("somebody".parse::<Preference>().is_err());

        assert!(Preference::Any.accepts(Gender::Other));
        assert!(Preference::Male.accepts(Gender::Male));
        assert!(!Preference::Male.accepts(Gender::Female));
        assert!(!Preference::Female.accepts(Gender::Other));
    }

    #[test]
    fn test_connection_state_partner() {
        assert_eq!(ConnectionState::Idle.partner(), None);
        assert_eq!(ConnectionState::Waiting.partner(), None);
        assert_eq!(
            ConnectionState::Connected { partner: 42 }.partner(),
            Some(42)
        );
        assert!(ConnectionState::Connected { partner: 42 }.is_connected());
        assert!(ConnectionState::Waiting.is_waiting());
    }

    #[test]
    fn test_new_user_defaults() {
        let user = User::new(7);
        assert_eq!(user.id, 7);
        assert_eq!(user.connection, ConnectionState::Idle);
        assert!(user.gender.is_none());
        assert!(user.interests.is_empty());
        assert_eq!(user.report_count, 0);
        assert!(!user.profile_complete());
    }
}
