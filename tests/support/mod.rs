#![allow(dead_code)]

use actix::prelude::*;
use async_trait::async_trait;
use lazy_static::lazy_static;
use pollhub_live::api::{ApiError, ApiTransport};
use pollhub_live::managers::notification::{Notification, NotificationId};
use pollhub_live::managers::poll::{
    OptionId, Poll, PollDraft, PollEdit, PollId, PollOption, User, UserId,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

lazy_static! {
    static ref TRACING: () = {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    };
}

pub fn init_tracing() {
    lazy_static::initialize(&TRACING);
}

/// One scripted response queue. Tests push results in the order the
/// transport should hand them out; an optional delay holds the response
/// back so in-flight overlaps can be arranged.
pub struct Script<T> {
    queue: RefCell<VecDeque<(Option<Duration>, Result<T, ApiError>)>>,
}

impl<T> Script<T> {
    fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
        }
    }

    pub fn push(&self, result: Result<T, ApiError>) {
        self.queue.borrow_mut().push_back((None, result));
    }

    pub fn push_delayed(&self, delay: Duration, result: Result<T, ApiError>) {
        self.queue.borrow_mut().push_back((Some(delay), result));
    }

    async fn take(&self, op: &str) -> Result<T, ApiError> {
        let (delay, result) = self
            .queue
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left for {}", op));
        if let Some(delay) = delay {
            tokio::time::delay_for(delay).await;
        }
        result
    }
}

/// Scripted stand-in for the poll server. Every call is recorded and
/// answered from its queue; an unscripted call fails the test.
pub struct FakeApi {
    log: RefCell<Vec<String>>,
    pub polls: Script<Vec<Poll>>,
    pub poll: Script<Poll>,
    pub created: Script<Poll>,
    pub updated: Script<Poll>,
    pub deleted: Script<()>,
    pub vote: Script<Poll>,
    pub voters: Script<Vec<User>>,
    pub notifications: Script<Vec<Notification>>,
    pub unread: Script<i64>,
    pub marked_read: Script<()>,
    pub marked_all_read: Script<()>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            log: RefCell::new(Vec::new()),
            polls: Script::new(),
            poll: Script::new(),
            created: Script::new(),
            updated: Script::new(),
            deleted: Script::new(),
            vote: Script::new(),
            voters: Script::new(),
            notifications: Script::new(),
            unread: Script::new(),
            marked_read: Script::new(),
            marked_all_read: Script::new(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn record(&self, op: &str) {
        self.log.borrow_mut().push(op.to_owned());
    }
}

#[async_trait(?Send)]
impl ApiTransport for FakeApi {
    async fn list_polls(&self) -> Result<Vec<Poll>, ApiError> {
        self.record("list_polls");
        self.polls.take("list_polls").await
    }

    async fn fetch_poll(&self, poll: PollId) -> Result<Poll, ApiError> {
        self.record(&format!("fetch_poll {}", poll.0));
        self.poll.take("fetch_poll").await
    }

    async fn create_poll(&self, _draft: &PollDraft) -> Result<Poll, ApiError> {
        self.record("create_poll");
        self.created.take("create_poll").await
    }

    async fn update_poll(&self, poll: PollId, _edit: &PollEdit) -> Result<Poll, ApiError> {
        self.record(&format!("update_poll {}", poll.0));
        self.updated.take("update_poll").await
    }

    async fn delete_poll(&self, poll: PollId) -> Result<(), ApiError> {
        self.record(&format!("delete_poll {}", poll.0));
        self.deleted.take("delete_poll").await
    }

    async fn cast_vote(&self, poll: PollId, option: OptionId) -> Result<Poll, ApiError> {
        self.record(&format!("cast_vote {} {}", poll.0, option.0));
        self.vote.take("cast_vote").await
    }

    async fn option_voters(&self, option: OptionId) -> Result<Vec<User>, ApiError> {
        self.record(&format!("option_voters {}", option.0));
        self.voters.take("option_voters").await
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.record("notifications");
        self.notifications.take("notifications").await
    }

    async fn unread_count(&self) -> Result<i64, ApiError> {
        self.record("unread_count");
        self.unread.take("unread_count").await
    }

    async fn mark_read(&self, notification: NotificationId) -> Result<(), ApiError> {
        self.record(&format!("mark_read {}", notification.0));
        self.marked_read.take("mark_read").await
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.record("mark_all_read");
        self.marked_all_read.take("mark_all_read").await
    }
}

/// Subscriber actor that keeps every pushed update for later inspection.
pub struct Collector<M>
where
    M: Message<Result = ()> + Send + Clone + Unpin + 'static,
{
    received: Vec<M>,
}

impl<M> Collector<M>
where
    M: Message<Result = ()> + Send + Clone + Unpin + 'static,
{
    pub fn new() -> Self {
        Self {
            received: Vec::new(),
        }
    }
}

impl<M> Actor for Collector<M>
where
    M: Message<Result = ()> + Send + Clone + Unpin + 'static,
{
    type Context = Context<Self>;
}

impl<M> Handler<M> for Collector<M>
where
    M: Message<Result = ()> + Send + Clone + Unpin + 'static,
{
    type Result = ();

    fn handle(&mut self, msg: M, _ctx: &mut Context<Self>) {
        self.received.push(msg);
    }
}

/// Ask a [`Collector`] for everything it has seen so far.
pub struct Updates<M>(PhantomData<M>);

impl<M> Message for Updates<M>
where
    M: Message<Result = ()> + Send + Clone + Unpin + 'static,
{
    type Result = Vec<M>;
}

pub fn updates<M>() -> Updates<M>
where
    M: Message<Result = ()> + Send + Clone + Unpin + 'static,
{
    Updates(PhantomData)
}

impl<M> Handler<Updates<M>> for Collector<M>
where
    M: Message<Result = ()> + Send + Clone + Unpin + 'static,
{
    type Result = MessageResult<Updates<M>>;

    fn handle(&mut self, _msg: Updates<M>, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.received.clone())
    }
}

pub fn user(id: i64) -> User {
    User {
        id: UserId(id),
        username: format!("user-{}", id),
        email: format!("user-{}@example.com", id),
    }
}

/// A poll fixture; options are given as `(id, text, vote_count)`.
pub fn poll(id: i64, updated_at: &str, options: &[(i64, &str, i64)]) -> Poll {
    Poll {
        id: PollId(id),
        title: format!("Poll {}", id),
        description: "What should we do?".to_owned(),
        creator: user(1),
        options: options
            .iter()
            .map(|&(option_id, text, vote_count)| PollOption {
                id: OptionId(option_id),
                text: text.to_owned(),
                vote_count,
            })
            .collect(),
        created_at: "2021-01-01T00:00:00Z".to_owned(),
        updated_at: updated_at.to_owned(),
        user_voted_option_id: None,
        poll_edited_after_vote: false,
    }
}

pub fn voted(mut poll: Poll, option: i64) -> Poll {
    poll.user_voted_option_id = Some(OptionId(option));
    poll
}

pub fn edited(mut poll: Poll) -> Poll {
    poll.poll_edited_after_vote = true;
    poll
}

pub fn notification(id: i64, read: bool) -> Notification {
    Notification {
        id: NotificationId(id),
        message: format!("Poll {} changed after your vote", id),
        kind: "poll_edited".to_owned(),
        poll_id: Some(PollId(id)),
        read,
        created_at: "2021-01-01T00:00:00Z".to_owned(),
    }
}
