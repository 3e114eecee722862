//! Multi-step profile input capture
//!
//! Profile fields arrive over chat as free text, so capturing one is a
//! two-step exchange: a prompt puts the user into the matching awaiting
//! state, the next text message is interpreted against that state. Input in
//! the wrong state is redirected, never applied.

use crate::engine::matchmaker::Matchmaker;
use crate::error::{MatchmakingError, Result};
use crate::types::{ConversationState, Gender, Preference, UserId};
use tracing::{debug, info};

/// Profile fields captured through conversation prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Gender,
    Preference,
    Interests,
}

impl ProfileField {
    /// The awaiting state a prompt for this field puts the user into
    pub fn prompt_state(self) -> ConversationState {
        match self {
            ProfileField::Gender => ConversationState::AwaitingGender,
            ProfileField::Preference => ConversationState::AwaitingPreference,
            ProfileField::Interests => ConversationState::AwaitingInterests,
        }
    }
}

/// Result of interpreting a text message against the conversation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileInputOutcome {
    GenderSet(Gender),
    PreferenceSet(Preference),
    InterestsSet(usize),
    /// No profile input was pending; the message belongs to the chat relay
    NotExpected,
}

impl Matchmaker {
    /// Put the user into the awaiting state for a profile prompt
    pub fn begin_profile_prompt(&self, id: UserId, field: ProfileField) -> Result<()> {
        let state = field.prompt_state();
        self.directory().update(id, &mut |user| {
            user.conversation = state;
        })?;
        debug!("User {} now in {:?}", id, state);
        Ok(())
    }

    /// Interpret a text message against the user's conversation state
    ///
    /// Invalid tokens are rejected with no state change, so the user stays
    /// prompted and can retry.
    pub fn submit_profile_input(&self, id: UserId, text: &str) -> Result<ProfileInputOutcome> {
        let user = self.directory().load_or_create(id)?;

        match user.conversation {
            ConversationState::Idle => Ok(ProfileInputOutcome::NotExpected),
            ConversationState::AwaitingGender => {
                let gender: Gender = text.parse()?;
                self.directory().update(id, &mut |user| {
                    user.gender = Some(gender);
                    user.conversation = ConversationState::Idle;
                })?;
                info!("User {} set gender to {}", id, gender);
                Ok(ProfileInputOutcome::GenderSet(gender))
            }
            ConversationState::AwaitingPreference => {
                let preference: Preference = text.parse()?;
                self.directory().update(id, &mut |user| {
                    user.preference = Some(preference);
                    user.conversation = ConversationState::Idle;
                })?;
                info!("User {} set partner preference to {}", id, preference);
                Ok(ProfileInputOutcome::PreferenceSet(preference))
            }
            ConversationState::AwaitingInterests => {
                let interests = parse_interest_list(text, self.settings().max_selected_interests)?;
                let count = interests.len();
                self.directory().update(id, &mut |user| {
                    user.interests = interests.clone();
                    user.conversation = ConversationState::Idle;
                })?;
                info!("User {} declared {} interest(s)", id, count);
                Ok(ProfileInputOutcome::InterestsSet(count))
            }
        }
    }

    /// Set gender directly from a command argument
    pub fn set_gender(&self, id: UserId, token: &str) -> Result<Gender> {
        let gender: Gender = token.parse()?;
        self.directory().update(id, &mut |user| {
            user.gender = Some(gender);
        })?;
        info!("User {} set gender to {}", id, gender);
        Ok(gender)
    }

    /// Set partner preference directly from a command argument
    pub fn set_preference(&self, id: UserId, token: &str) -> Result<Preference> {
        let preference: Preference = token.parse()?;
        self.directory().update(id, &mut |user| {
            user.preference = Some(preference);
        })?;
        info!("User {} set partner preference to {}", id, preference);
        Ok(preference)
    }

    /// Replace the user's interest set, enforcing the size cap
    pub fn set_interests(&self, id: UserId, tags: &[String]) -> Result<usize> {
        let interests = parse_interest_tags(tags, self.settings().max_selected_interests)?;
        let count = interests.len();
        self.directory().update(id, &mut |user| {
            user.interests = interests.clone();
        })?;
        Ok(count)
    }

    /// Clear all declared interests
    pub fn clear_interests(&self, id: UserId) -> Result<()> {
        self.directory().update(id, &mut |user| {
            user.interests.clear();
        })?;
        Ok(())
    }
}

/// Parse a comma-separated interest list, normalizing and bounding it
fn parse_interest_list(
    text: &str,
    max_selected: usize,
) -> Result<std::collections::BTreeSet<String>> {
    let tags: Vec<String> = text
        .split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();
    parse_interest_tags(&tags, max_selected)
}

fn parse_interest_tags(
    tags: &[String],
    max_selected: usize,
) -> Result<std::collections::BTreeSet<String>> {
    let interests: std::collections::BTreeSet<String> = tags
        .iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();

    if interests.is_empty() {
        return Err(MatchmakingError::InvalidProfileInput {
            field: "interests".to_string(),
            value: tags.join(","),
        }
        .into());
    }
    if interests.len() > max_selected {
        return Err(MatchmakingError::InvalidProfileInput {
            field: "interests".to_string(),
            value: format!("{} tags exceed the cap of {}", interests.len(), max_selected),
        }
        .into());
    }

    Ok(interests)
}
