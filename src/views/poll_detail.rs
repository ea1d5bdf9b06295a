use super::{user_message, Refresh, Stop};
use crate::api::{poll::FetchPoll, vote::CastVote, vote::FetchVoters, ApiError, ApiExecutor};
use crate::managers::poll::{OptionId, Poll, PollId, User};
use crate::managers::reconcile::{FetchOrigin, PollScreen};
use crate::managers::seen::{self, SharedSeenStore};
use crate::managers::session::VoteMode;
use crate::span::SpanMessage;
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use color_eyre::eyre::Report;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How often an open poll re-reads the server while idle.
pub const DETAIL_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

const FETCH_POLL_ERROR: &str = "Failed to fetch poll";
const VOTE_ERROR: &str = "Failed to vote";

/// Everything an open poll page needs to render, pushed to the subscriber
/// after every state change.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct PollDetailUpdate {
    pub poll: Option<Poll>,
    pub mode: VoteMode,
    pub selection: Option<OptionId>,
    pub loading: bool,
    /// Last fetch failure; cleared by the next successful fetch.
    pub error: Option<String>,
    /// Last vote submission failure; cleared by the next submission.
    pub vote_error: Option<String>,
    /// The poll was edited after this user's vote and this revision has not
    /// been shown before.
    pub update_notice: bool,
    pub voters: Option<VotersPanel>,
}

#[derive(Clone, Debug)]
pub struct VotersPanel {
    pub option: OptionId,
    pub users: Vec<User>,
}

/// Current state without waiting for a push.
#[derive(Message, Clone, Debug)]
#[rtype(result = "PollDetailUpdate")]
pub struct Snapshot;

/// Mark an option as the pending choice.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct Select(pub OptionId);

/// Unlock a recorded vote for replacement.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct RequestChange;

/// Abandon an in-progress change.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct CancelChange;

/// Submit the pending selection. Rejected locally, without any request,
/// when nothing is selected or the recorded vote is still locked.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct SubmitVote;

/// Fetch the voter list for one option into the snapshot.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct LoadVoters(pub OptionId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct CloseVoters;

/// Live view of a single poll: owns the refresh timer, the reconciled
/// screen state and the vote session, and acknowledges seen updates.
pub struct PollDetailView {
    poll_id: PollId,
    screen: PollScreen,
    seen: SharedSeenStore,
    subscriber: Recipient<PollDetailUpdate>,
    loading: bool,
    error: Option<String>,
    vote_error: Option<String>,
    update_notice: bool,
    voters: Option<VotersPanel>,
    timer: Option<SpawnHandle>,
}

impl PollDetailView {
    pub fn new(
        poll_id: PollId,
        seen: SharedSeenStore,
        subscriber: Recipient<PollDetailUpdate>,
    ) -> Self {
        Self {
            poll_id,
            screen: PollScreen::new(),
            seen,
            subscriber,
            loading: true,
            error: None,
            vote_error: None,
            update_notice: false,
            voters: None,
            timer: None,
        }
    }

    fn snapshot(&self) -> PollDetailUpdate {
        PollDetailUpdate {
            poll: self.screen.poll().cloned(),
            mode: self.screen.session().mode(),
            selection: self.screen.session().selection(),
            loading: self.loading,
            error: self.error.clone(),
            vote_error: self.vote_error.clone(),
            update_notice: self.update_notice,
            voters: self.voters.clone(),
        }
    }

    fn push(&self) {
        if let Err(err) = self.subscriber.do_send(self.snapshot()) {
            debug!("Poll detail subscriber is gone: {}", err);
        }
    }

    fn apply_fetch(&mut self, fetched: Poll, origin: FetchOrigin) {
        let outcome = self.screen.apply_fetch(fetched, origin);
        if outcome.selection_cleared {
            info!(poll = self.poll_id.0, "Selected option left the poll");
        }
        self.refresh_update_notice();
        self.loading = false;
        self.error = None;
        self.push();
    }

    /// Showing the poll acknowledges its current revision: the notice is
    /// computed first so the snapshot that introduces a revision still
    /// carries it, then the revision is recorded as seen.
    fn refresh_update_notice(&mut self) {
        let poll = match self.screen.poll() {
            Some(poll) => poll,
            None => return,
        };
        if poll.poll_edited_after_vote && poll.confirmed_vote().is_some() {
            self.update_notice = !seen::is_seen(&self.seen, poll.id, &poll.updated_at);
            seen::mark_seen(&self.seen, poll.id, &poll.updated_at);
        } else {
            self.update_notice = false;
        }
    }

    fn record_fetch_failure(&mut self, err: &Report) {
        let retryable = err
            .downcast_ref::<ApiError>()
            .map_or(false, ApiError::is_retryable);
        if retryable {
            debug!(poll = self.poll_id.0, "Poll fetch failed, will retry: {}", err);
        } else {
            warn!(poll = self.poll_id.0, "Poll fetch failed: {}", err);
        }
        self.loading = false;
        self.error = Some(FETCH_POLL_ERROR.to_owned());
        self.push();
    }

    fn record_vote_failure(&mut self, err: &Report) {
        warn!(poll = self.poll_id.0, "Vote submission failed: {}", err);
        self.vote_error = Some(user_message(err, VOTE_ERROR));
        self.push();
    }
}

impl Actor for PollDetailView {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(poll = self.poll_id.0, "Poll detail view started");
        ctx.notify(Refresh);
        self.timer = Some(ctx.run_interval(DETAIL_REFRESH_INTERVAL, |_view, ctx| {
            ctx.notify(Refresh)
        }));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(poll = self.poll_id.0, "Poll detail view stopped");
    }
}

#[instrument]
async fn run_refresh(poll_id: PollId, origin: FetchOrigin) -> Result<(), Report> {
    debug!("Refreshing poll");
    let fetched = ApiExecutor::from_registry()
        .send(SpanMessage::new(FetchPoll(poll_id)))
        .await?;
    match fetched {
        Ok(poll) => {
            with_ctx(|view: &mut PollDetailView, _| view.apply_fetch(poll, origin));
            Ok(())
        }
        Err(err) => {
            with_ctx(|view: &mut PollDetailView, _| view.record_fetch_failure(&err));
            Err(err)
        }
    }
}

impl Handler<Refresh> for PollDetailView {
    type Result = ResponseActFuture<Self, Result<(), Report>>;

    fn handle(&mut self, _msg: Refresh, _ctx: &mut Context<Self>) -> Self::Result {
        // Until the first snapshot lands every fetch is an initial load;
        // after that, ticks merge around the in-progress vote state.
        let origin = if self.screen.poll().is_none() {
            FetchOrigin::InitialLoad
        } else {
            FetchOrigin::BackgroundTick
        };
        run_refresh(self.poll_id, origin).interop_actor_boxed(self)
    }
}

#[instrument]
async fn run_submit(poll_id: PollId, option: OptionId) -> Result<(), Report> {
    info!("Casting vote");
    let result = ApiExecutor::from_registry()
        .send(SpanMessage::new(CastVote(poll_id, option)))
        .await?;
    match result {
        Ok(poll) => {
            with_ctx(|view: &mut PollDetailView, _| {
                view.apply_fetch(poll, FetchOrigin::VoteSubmission)
            });
            Ok(())
        }
        Err(err) => {
            with_ctx(|view: &mut PollDetailView, _| view.record_vote_failure(&err));
            Err(err)
        }
    }
}

impl Handler<SubmitVote> for PollDetailView {
    type Result = ResponseActFuture<Self, Result<(), Report>>;

    fn handle(&mut self, _msg: SubmitVote, _ctx: &mut Context<Self>) -> Self::Result {
        match self.screen.submission() {
            Ok(option) => {
                self.vote_error = None;
                run_submit(self.poll_id, option).interop_actor_boxed(self)
            }
            Err(err) => {
                debug!(poll = self.poll_id.0, "Rejecting vote submission: {}", err);
                let report = Report::new(err);
                async move { Err(report) }.interop_actor_boxed(self)
            }
        }
    }
}

#[instrument]
async fn run_load_voters(option: OptionId) -> Result<(), Report> {
    debug!("Loading voters");
    let result = ApiExecutor::from_registry()
        .send(SpanMessage::new(FetchVoters(option)))
        .await?;
    // The voter list is decoration; an unavailable list is shown empty.
    let users = match result {
        Ok(users) => users,
        Err(err) => {
            debug!("Voter list unavailable: {}", err);
            Vec::new()
        }
    };
    with_ctx(|view: &mut PollDetailView, _| {
        view.voters = Some(VotersPanel { option, users });
        view.push();
    });
    Ok(())
}

impl Handler<LoadVoters> for PollDetailView {
    type Result = ResponseActFuture<Self, Result<(), Report>>;

    fn handle(&mut self, msg: LoadVoters, _ctx: &mut Context<Self>) -> Self::Result {
        run_load_voters(msg.0).interop_actor_boxed(self)
    }
}

impl Handler<Select> for PollDetailView {
    type Result = ();

    fn handle(&mut self, msg: Select, _ctx: &mut Context<Self>) {
        match self.screen.select(msg.0) {
            Ok(()) => self.push(),
            // Locked options are not clickable in any reasonable frontend;
            // a stray select is dropped rather than surfaced.
            Err(err) => debug!(option = (msg.0).0, "Ignoring selection: {}", err),
        }
    }
}

impl Handler<RequestChange> for PollDetailView {
    type Result = ();

    fn handle(&mut self, _msg: RequestChange, _ctx: &mut Context<Self>) {
        self.screen.begin_change();
        self.push();
    }
}

impl Handler<CancelChange> for PollDetailView {
    type Result = ();

    fn handle(&mut self, _msg: CancelChange, _ctx: &mut Context<Self>) {
        self.screen.cancel_change();
        self.push();
    }
}

impl Handler<CloseVoters> for PollDetailView {
    type Result = ();

    fn handle(&mut self, _msg: CloseVoters, _ctx: &mut Context<Self>) {
        self.voters = None;
        self.push();
    }
}

impl Handler<Snapshot> for PollDetailView {
    type Result = MessageResult<Snapshot>;

    fn handle(&mut self, _msg: Snapshot, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.snapshot())
    }
}

impl Handler<Stop> for PollDetailView {
    type Result = ();

    fn handle(&mut self, _msg: Stop, ctx: &mut Context<Self>) {
        if let Some(timer) = self.timer.take() {
            ctx.cancel_future(timer);
        }
        ctx.stop();
    }
}
