use super::error::ApiError;
use super::ApiTransport;
use crate::managers::notification::{Notification, NotificationId};
use crate::managers::poll::{OptionId, Poll, PollDraft, PollEdit, PollId, User};
use actix_web::client::{Client, ClientRequest, ClientResponse};
use actix_web::error::PayloadError;
use actix_web::http::header;
use actix_web::web::Bytes;
use async_trait::async_trait;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP binding of [`ApiTransport`], speaking the poll server's JSON
/// protocol. A fresh client is built per request so every polling cycle
/// stands alone; the client's own response timeout is the only timeout in
/// play.
pub struct HttpApi {
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: ClientRequest) -> ClientRequest {
        match &self.token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    fn get(&self, path: &str) -> ClientRequest {
        self.authorize(Client::default().get(self.url(path)))
    }

    fn post(&self, path: &str) -> ClientRequest {
        self.authorize(Client::default().post(self.url(path)))
    }

    fn put(&self, path: &str) -> ClientRequest {
        self.authorize(Client::default().put(self.url(path)))
    }

    fn delete(&self, path: &str) -> ClientRequest {
        self.authorize(Client::default().delete(self.url(path)))
    }
}

#[derive(Serialize)]
struct VoteBody {
    option_id: OptionId,
}

#[derive(Deserialize)]
struct UnreadBody {
    count: i64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn transport_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::Transport(err.to_string())
}

async fn error_status<S>(resp: &mut ClientResponse<S>) -> ApiError
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin + 'static,
{
    let status = resp.status().as_u16();
    let message = resp.json::<ErrorBody>().await.ok().map(|body| body.error);
    ApiError::Status { status, message }
}

async fn expect_json<T, S>(mut resp: ClientResponse<S>) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin + 'static,
{
    if !resp.status().is_success() {
        return Err(error_status(&mut resp).await);
    }
    resp.json::<T>()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}

async fn expect_ok<S>(mut resp: ClientResponse<S>) -> Result<(), ApiError>
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin + 'static,
{
    if !resp.status().is_success() {
        return Err(error_status(&mut resp).await);
    }
    Ok(())
}

#[async_trait(?Send)]
impl ApiTransport for HttpApi {
    async fn list_polls(&self) -> Result<Vec<Poll>, ApiError> {
        let resp = self
            .get("/api/polls")
            .send()
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn fetch_poll(&self, poll: PollId) -> Result<Poll, ApiError> {
        let resp = self
            .get(&format!("/api/polls/{}", poll.0))
            .send()
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn create_poll(&self, draft: &PollDraft) -> Result<Poll, ApiError> {
        let resp = self
            .post("/api/polls")
            .send_json(draft)
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn update_poll(&self, poll: PollId, edit: &PollEdit) -> Result<Poll, ApiError> {
        let resp = self
            .put(&format!("/api/polls/{}", poll.0))
            .send_json(edit)
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn delete_poll(&self, poll: PollId) -> Result<(), ApiError> {
        let resp = self
            .delete(&format!("/api/polls/{}", poll.0))
            .send()
            .await
            .map_err(transport_error)?;
        expect_ok(resp).await
    }

    async fn cast_vote(&self, poll: PollId, option: OptionId) -> Result<Poll, ApiError> {
        let resp = self
            .post(&format!("/api/polls/{}/vote", poll.0))
            .send_json(&VoteBody { option_id: option })
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn option_voters(&self, option: OptionId) -> Result<Vec<User>, ApiError> {
        let resp = self
            .get(&format!("/api/options/{}/voters", option.0))
            .send()
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let resp = self
            .get("/api/notifications")
            .send()
            .await
            .map_err(transport_error)?;
        expect_json(resp).await
    }

    async fn unread_count(&self) -> Result<i64, ApiError> {
        let resp = self
            .get("/api/notifications/unread-count")
            .send()
            .await
            .map_err(transport_error)?;
        let body: UnreadBody = expect_json(resp).await?;
        Ok(body.count)
    }

    async fn mark_read(&self, notification: NotificationId) -> Result<(), ApiError> {
        let resp = self
            .put(&format!("/api/notifications/{}/read", notification.0))
            .send()
            .await
            .map_err(transport_error)?;
        expect_ok(resp).await
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        let resp = self
            .post("/api/notifications/mark-all-read")
            .send()
            .await
            .map_err(transport_error)?;
        expect_ok(resp).await
    }
}
