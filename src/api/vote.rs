use super::ApiExecutor;
use crate::async_message_handler_with_span;
use crate::managers::poll::{OptionId, Poll, PollId, User};
use crate::span::AsyncSpanHandler;
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use color_eyre::eyre::Report;
use tracing::debug;
use tracing_futures::Instrument;

/// Cast or replace this user's vote. The response is the poll as the server
/// sees it after the vote, ready to merge.
#[derive(Message, Clone)]
#[rtype(result = "Result<Poll, Report>")]
pub struct CastVote(pub PollId, pub OptionId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<CastVote> for ApiExecutor {
        async fn handle(msg: CastVote) -> Result<Poll, Report> {
            let CastVote(poll_id, option_id) = msg;
            debug!(poll = poll_id.0, option = option_id.0, "Casting vote");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            let poll = transport.cast_vote(poll_id, option_id).await?;
            Ok(poll)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<Vec<User>, Report>")]
pub struct FetchVoters(pub OptionId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<FetchVoters> for ApiExecutor {
        async fn handle(msg: FetchVoters) -> Result<Vec<User>, Report> {
            let FetchVoters(option_id) = msg;
            debug!(option = option_id.0, "Fetching voters");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            let voters = transport.option_voters(option_id).await?;
            Ok(voters)
        }
    }
});
