use super::poll::{OptionId, Poll};
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VoteMode {
    /// No vote recorded yet; options can be selected and submitted.
    Voting,
    /// A vote is recorded; results are shown and options are locked.
    Viewing,
    /// The user asked to replace their recorded vote.
    ChangingVote,
}

#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum VoteError {
    #[error("no option selected")]
    NoSelection,
    #[error("option is not part of this poll")]
    UnknownOption,
    #[error("a vote is already recorded for this poll")]
    VotesLocked,
}

/// Per-poll vote state. Never persisted; rebuilt from the first fetched
/// snapshot every time a poll is opened.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VoteSession {
    mode: VoteMode,
    selection: Option<OptionId>,
}

impl Default for VoteSession {
    fn default() -> Self {
        Self {
            mode: VoteMode::Voting,
            selection: None,
        }
    }
}

impl VoteSession {
    pub fn from_poll(poll: &Poll) -> Self {
        match poll.confirmed_vote() {
            Some(option) => Self {
                mode: VoteMode::Viewing,
                selection: Some(option),
            },
            None => Self::default(),
        }
    }

    pub fn mode(&self) -> VoteMode {
        self.mode
    }

    pub fn selection(&self) -> Option<OptionId> {
        self.selection
    }

    /// Mark an option as the pending choice. Rejected while a recorded vote
    /// is being viewed, and for options the poll does not contain.
    pub fn select(&mut self, option: OptionId, poll: &Poll) -> Result<(), VoteError> {
        if self.mode == VoteMode::Viewing {
            return Err(VoteError::VotesLocked);
        }
        if !poll.has_option(option) {
            return Err(VoteError::UnknownOption);
        }
        self.selection = Some(option);
        Ok(())
    }

    /// Unlock a recorded vote for replacement. The pending selection starts
    /// empty; the recorded vote stays live on the server until a new
    /// submission is confirmed.
    pub fn begin_change(&mut self) {
        if self.mode == VoteMode::Viewing {
            self.mode = VoteMode::ChangingVote;
            self.selection = None;
        }
    }

    /// Abandon an in-progress change and return to the recorded vote. Falls
    /// back to `Voting` if the recorded vote has vanished from the poll in
    /// the meantime.
    pub fn cancel_change(&mut self, poll: &Poll) {
        if self.mode != VoteMode::ChangingVote {
            return;
        }
        match poll.confirmed_vote() {
            Some(option) => {
                self.mode = VoteMode::Viewing;
                self.selection = Some(option);
            }
            None => {
                self.mode = VoteMode::Voting;
                self.selection = None;
            }
        }
    }

    /// The option a submission would cast, validated locally.
    pub fn submission(&self) -> Result<OptionId, VoteError> {
        if self.mode == VoteMode::Viewing {
            return Err(VoteError::VotesLocked);
        }
        self.selection.ok_or(VoteError::NoSelection)
    }

    /// The server accepted a submission and returned this poll state.
    pub fn confirm_submitted(&mut self, poll: &Poll) {
        match poll.confirmed_vote() {
            Some(option) => {
                self.mode = VoteMode::Viewing;
                self.selection = Some(option);
            }
            // The submission response should carry the vote; if it does not,
            // treat the poll as not voted rather than viewing a phantom vote.
            None => {
                self.mode = VoteMode::Voting;
                self.selection = None;
            }
        }
    }

    /// Re-evaluate against a background snapshot. Returns true when the
    /// selection had to be dropped because its option left the poll.
    ///
    /// While a choice is in progress (`Voting`/`ChangingVote`) the pending
    /// selection wins over whatever vote the server reports. While viewing,
    /// the server's recorded vote is authoritative, which also picks up a
    /// vote changed from another device.
    pub fn apply_refresh(&mut self, poll: &Poll) -> bool {
        match self.mode {
            VoteMode::Viewing => match poll.confirmed_vote() {
                Some(option) => {
                    self.selection = Some(option);
                    false
                }
                None => {
                    let cleared = self.selection.is_some();
                    self.mode = VoteMode::Voting;
                    self.selection = None;
                    cleared
                }
            },
            VoteMode::Voting | VoteMode::ChangingVote => match self.selection {
                Some(option) if !poll.has_option(option) => {
                    self.selection = None;
                    true
                }
                _ => false,
            },
        }
    }
}
