use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct PollId(pub i64);

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct OptionId(pub i64);

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct UserId(pub i64);

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct PollOption {
    pub id: OptionId,
    pub text: String,
    pub vote_count: i64,
}

/// A poll as the server reports it. Timestamps are kept as the opaque
/// strings the server produced; they are only ever compared for equality.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    pub description: String,
    pub creator: User,
    pub options: Vec<PollOption>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub user_voted_option_id: Option<OptionId>,
    #[serde(default)]
    pub poll_edited_after_vote: bool,
}

impl Poll {
    pub fn has_option(&self, option: OptionId) -> bool {
        self.options.iter().any(|o| o.id == option)
    }

    /// The option this user's vote is recorded on, if it still exists.
    ///
    /// A `user_voted_option_id` that points at an option no longer in the
    /// poll is treated as not voted.
    pub fn confirmed_vote(&self) -> Option<OptionId> {
        self.user_voted_option_id.filter(|&id| self.has_option(id))
    }

    pub fn total_votes(&self) -> i64 {
        self.options.iter().map(|o| o.vote_count).sum()
    }

    /// Share of the total vote as a whole percentage, 0 for an empty poll.
    pub fn vote_percentage(&self, vote_count: i64) -> i64 {
        let total = self.total_votes();
        if total == 0 {
            0
        } else {
            ((vote_count as f64 / total as f64) * 100.0).round() as i64
        }
    }
}

#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum DraftError {
    #[error("poll title must not be empty")]
    MissingTitle,
    #[error("a poll needs at least two options")]
    NotEnoughOptions,
}

/// Payload for creating a poll: plain option texts, the server assigns ids.
#[derive(Clone, Debug, Serialize)]
pub struct PollDraft {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
}

impl PollDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        validate_texts(&self.title, self.options.iter().map(String::as_str))
    }
}

/// Payload for editing a poll. Options that keep their id keep their votes;
/// options without an id are created server side.
#[derive(Clone, Debug, Serialize)]
pub struct PollEdit {
    pub title: String,
    pub description: String,
    pub options: Vec<OptionEdit>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OptionEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<OptionId>,
    pub text: String,
}

impl PollEdit {
    pub fn validate(&self) -> Result<(), DraftError> {
        validate_texts(&self.title, self.options.iter().map(|o| o.text.as_str()))
    }
}

fn validate_texts<'a>(
    title: &str,
    options: impl Iterator<Item = &'a str>,
) -> Result<(), DraftError> {
    if title.trim().is_empty() {
        return Err(DraftError::MissingTitle);
    }
    if options.filter(|text| !text.trim().is_empty()).count() < 2 {
        return Err(DraftError::NotEnoughOptions);
    }
    Ok(())
}
