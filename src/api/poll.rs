use super::ApiExecutor;
use crate::async_message_handler_with_span;
use crate::managers::poll::{Poll, PollDraft, PollEdit, PollId};
use crate::span::AsyncSpanHandler;
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use color_eyre::eyre::Report;
use tracing::debug;
use tracing_futures::Instrument;

#[derive(Message, Clone)]
#[rtype(result = "Result<Vec<Poll>, Report>")]
pub struct FetchPolls;

async_message_handler_with_span!({
    impl AsyncSpanHandler<FetchPolls> for ApiExecutor {
        async fn handle(_msg: FetchPolls) -> Result<Vec<Poll>, Report> {
            debug!("Fetching poll list");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            let polls = transport.list_polls().await?;
            debug!(polls = polls.len(), "Poll list fetched");
            Ok(polls)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<Poll, Report>")]
pub struct FetchPoll(pub PollId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<FetchPoll> for ApiExecutor {
        async fn handle(msg: FetchPoll) -> Result<Poll, Report> {
            let FetchPoll(poll_id) = msg;
            debug!(poll = poll_id.0, "Fetching poll");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            let poll = transport.fetch_poll(poll_id).await?;
            Ok(poll)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<Poll, Report>")]
pub struct CreatePoll(pub PollDraft);

async_message_handler_with_span!({
    impl AsyncSpanHandler<CreatePoll> for ApiExecutor {
        async fn handle(msg: CreatePoll) -> Result<Poll, Report> {
            let CreatePoll(draft) = msg;
            // Reject bad drafts before touching the network.
            draft.validate()?;
            debug!(title = draft.title.as_str(), "Creating poll");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            let poll = transport.create_poll(&draft).await?;
            Ok(poll)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<Poll, Report>")]
pub struct UpdatePoll(pub PollId, pub PollEdit);

async_message_handler_with_span!({
    impl AsyncSpanHandler<UpdatePoll> for ApiExecutor {
        async fn handle(msg: UpdatePoll) -> Result<Poll, Report> {
            let UpdatePoll(poll_id, edit) = msg;
            edit.validate()?;
            debug!(poll = poll_id.0, "Updating poll");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            let poll = transport.update_poll(poll_id, &edit).await?;
            Ok(poll)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<(), Report>")]
pub struct DeletePollRequest(pub PollId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<DeletePollRequest> for ApiExecutor {
        async fn handle(msg: DeletePollRequest) -> Result<(), Report> {
            let DeletePollRequest(poll_id) = msg;
            debug!(poll = poll_id.0, "Deleting poll");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            transport.delete_poll(poll_id).await?;
            Ok(())
        }
    }
});
