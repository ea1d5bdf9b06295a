use super::poll::{OptionId, Poll};
use super::session::{VoteError, VoteSession};

/// Why a poll snapshot arrived. The merge rules differ per origin.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FetchOrigin {
    /// First snapshot after the view opened; the session is rebuilt from it.
    InitialLoad,
    /// Periodic re-read; in-progress vote state is preserved across it.
    BackgroundTick,
    /// Response to this client's own vote submission.
    VoteSubmission,
}

/// What a merge did beyond replacing the poll.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MergeOutcome {
    /// The pending or recorded selection pointed at an option that left the
    /// poll and was reset.
    pub selection_cleared: bool,
}

/// The reconciled state of one open poll: the latest server snapshot plus
/// the local vote session layered on top.
#[derive(Clone, Debug, Default)]
pub struct PollScreen {
    poll: Option<Poll>,
    session: VoteSession,
}

impl PollScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll(&self) -> Option<&Poll> {
        self.poll.as_ref()
    }

    pub fn session(&self) -> &VoteSession {
        &self.session
    }

    /// Merge a fetched snapshot. The fetched poll replaces the previous one
    /// wholesale; only the vote session is carried across, per the origin's
    /// rules.
    pub fn apply_fetch(&mut self, fetched: Poll, origin: FetchOrigin) -> MergeOutcome {
        let outcome = match origin {
            FetchOrigin::InitialLoad => {
                self.session = VoteSession::from_poll(&fetched);
                MergeOutcome::default()
            }
            FetchOrigin::VoteSubmission => {
                self.session.confirm_submitted(&fetched);
                MergeOutcome::default()
            }
            FetchOrigin::BackgroundTick => MergeOutcome {
                selection_cleared: self.session.apply_refresh(&fetched),
            },
        };
        self.poll = Some(fetched);
        outcome
    }

    pub fn select(&mut self, option: OptionId) -> Result<(), VoteError> {
        match &self.poll {
            Some(poll) => self.session.select(option, poll),
            None => Err(VoteError::UnknownOption),
        }
    }

    pub fn begin_change(&mut self) {
        self.session.begin_change();
    }

    pub fn cancel_change(&mut self) {
        if let Some(poll) = &self.poll {
            self.session.cancel_change(poll);
        }
    }

    pub fn submission(&self) -> Result<OptionId, VoteError> {
        self.session.submission()
    }
}
