pub mod error;
pub mod http;
pub mod notification;
pub mod poll;
pub mod vote;

pub use error::ApiError;
pub use http::HttpApi;

use crate::managers::notification::{Notification, NotificationId};
use crate::managers::poll::{OptionId, Poll, PollDraft, PollEdit, PollId, User};
use actix::prelude::*;
use async_trait::async_trait;
use std::sync::Arc;

/// The poll server's surface, one method per endpoint. Futures are not
/// required to be `Send`: the whole engine runs on one actor thread and the
/// HTTP client's futures are thread-local anyway.
#[async_trait(?Send)]
pub trait ApiTransport {
    async fn list_polls(&self) -> Result<Vec<Poll>, ApiError>;
    async fn fetch_poll(&self, poll: PollId) -> Result<Poll, ApiError>;
    async fn create_poll(&self, draft: &PollDraft) -> Result<Poll, ApiError>;
    async fn update_poll(&self, poll: PollId, edit: &PollEdit) -> Result<Poll, ApiError>;
    async fn delete_poll(&self, poll: PollId) -> Result<(), ApiError>;
    async fn cast_vote(&self, poll: PollId, option: OptionId) -> Result<Poll, ApiError>;
    async fn option_voters(&self, option: OptionId) -> Result<Vec<User>, ApiError>;
    async fn notifications(&self) -> Result<Vec<Notification>, ApiError>;
    async fn unread_count(&self) -> Result<i64, ApiError>;
    async fn mark_read(&self, notification: NotificationId) -> Result<(), ApiError>;
    async fn mark_all_read(&self) -> Result<(), ApiError>;
}

/// System-registry actor owning the transport. Views resolve it with
/// `ApiExecutor::from_registry()` and talk to the server through its
/// messages, so tests can swap the transport for a scripted one.
pub struct ApiExecutor {
    transport: Arc<dyn ApiTransport>,
}

impl ApiExecutor {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&mut self) -> Arc<dyn ApiTransport> {
        self.transport.clone()
    }
}

impl Actor for ApiExecutor {
    type Context = Context<Self>;
}

impl Default for ApiExecutor {
    fn default() -> Self {
        unimplemented!("ApiExecutor cannot be started without a transport");
    }
}

impl SystemService for ApiExecutor {}
impl Supervised for ApiExecutor {}
