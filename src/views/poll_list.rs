use super::{user_message, Refresh, Stop};
use crate::api::{poll::DeletePollRequest, poll::FetchPolls, ApiError, ApiExecutor};
use crate::managers::poll::{Poll, PollId};
use crate::managers::seen::{self, SharedSeenStore};
use crate::span::SpanMessage;
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use color_eyre::eyre::Report;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How often the poll overview re-reads the server.
pub const LIST_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

const FETCH_POLLS_ERROR: &str = "Failed to fetch polls";
const DELETE_POLL_ERROR: &str = "Failed to delete poll";

#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct PollListUpdate {
    pub entries: Vec<PollListEntry>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PollListEntry {
    pub poll: Poll,
    /// The poll changed since this user's vote and the change has not been
    /// looked at yet.
    pub unseen_update: bool,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "PollListUpdate")]
pub struct Snapshot;

/// Delete an owned poll on the server and drop it from the list.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct DeletePoll(pub PollId);

/// Live overview of all polls with their unseen-update badges.
pub struct PollListView {
    polls: Vec<Poll>,
    seen: SharedSeenStore,
    subscriber: Recipient<PollListUpdate>,
    loading: bool,
    error: Option<String>,
    timer: Option<SpawnHandle>,
}

impl PollListView {
    pub fn new(seen: SharedSeenStore, subscriber: Recipient<PollListUpdate>) -> Self {
        Self {
            polls: Vec::new(),
            seen,
            subscriber,
            loading: true,
            error: None,
            timer: None,
        }
    }

    fn snapshot(&self) -> PollListUpdate {
        let entries = self
            .polls
            .iter()
            .map(|poll| PollListEntry {
                poll: poll.clone(),
                unseen_update: poll.poll_edited_after_vote
                    && poll.confirmed_vote().is_some()
                    && !seen::is_seen(&self.seen, poll.id, &poll.updated_at),
            })
            .collect();
        PollListUpdate {
            entries,
            loading: self.loading,
            error: self.error.clone(),
        }
    }

    fn push(&self) {
        if let Err(err) = self.subscriber.do_send(self.snapshot()) {
            debug!("Poll list subscriber is gone: {}", err);
        }
    }

    fn apply_fetch(&mut self, polls: Vec<Poll>) {
        self.polls = polls;
        self.loading = false;
        self.error = None;
        self.push();
    }

    fn record_fetch_failure(&mut self, err: &Report) {
        let retryable = err
            .downcast_ref::<ApiError>()
            .map_or(false, ApiError::is_retryable);
        if retryable {
            debug!("Poll list fetch failed, will retry: {}", err);
        } else {
            warn!("Poll list fetch failed: {}", err);
        }
        self.loading = false;
        self.error = Some(FETCH_POLLS_ERROR.to_owned());
        self.push();
    }
}

impl Actor for PollListView {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("Poll list view started");
        ctx.notify(Refresh);
        self.timer = Some(ctx.run_interval(LIST_REFRESH_INTERVAL, |_view, ctx| {
            ctx.notify(Refresh)
        }));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!("Poll list view stopped");
    }
}

#[instrument]
async fn run_refresh() -> Result<(), Report> {
    debug!("Refreshing poll list");
    let fetched = ApiExecutor::from_registry()
        .send(SpanMessage::new(FetchPolls))
        .await?;
    match fetched {
        Ok(polls) => {
            with_ctx(|view: &mut PollListView, _| view.apply_fetch(polls));
            Ok(())
        }
        Err(err) => {
            with_ctx(|view: &mut PollListView, _| view.record_fetch_failure(&err));
            Err(err)
        }
    }
}

impl Handler<Refresh> for PollListView {
    type Result = ResponseActFuture<Self, Result<(), Report>>;

    fn handle(&mut self, _msg: Refresh, _ctx: &mut Context<Self>) -> Self::Result {
        run_refresh().interop_actor_boxed(self)
    }
}

#[instrument]
async fn run_delete(poll_id: PollId) -> Result<(), Report> {
    info!("Deleting poll");
    let result = ApiExecutor::from_registry()
        .send(SpanMessage::new(DeletePollRequest(poll_id)))
        .await?;
    match result {
        Ok(()) => {
            with_ctx(|view: &mut PollListView, _| {
                view.polls.retain(|poll| poll.id != poll_id);
                view.error = None;
                view.push();
            });
            Ok(())
        }
        Err(err) => {
            with_ctx(|view: &mut PollListView, _| {
                view.error = Some(user_message(&err, DELETE_POLL_ERROR));
                view.push();
            });
            Err(err)
        }
    }
}

impl Handler<DeletePoll> for PollListView {
    type Result = ResponseActFuture<Self, Result<(), Report>>;

    fn handle(&mut self, msg: DeletePoll, _ctx: &mut Context<Self>) -> Self::Result {
        run_delete(msg.0).interop_actor_boxed(self)
    }
}

impl Handler<Snapshot> for PollListView {
    type Result = MessageResult<Snapshot>;

    fn handle(&mut self, _msg: Snapshot, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.snapshot())
    }
}

impl Handler<Stop> for PollListView {
    type Result = ();

    fn handle(&mut self, _msg: Stop, ctx: &mut Context<Self>) {
        if let Some(timer) = self.timer.take() {
            ctx.cancel_future(timer);
        }
        ctx.stop();
    }
}
