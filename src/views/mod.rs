use crate::api::ApiError;
use actix::prelude::*;
use color_eyre::eyre::Report;

pub mod notifications;
pub mod poll_detail;
pub mod poll_list;

/// Ask a view to re-read its collaborator state now. Views send this to
/// themselves on a timer; tests and embedders can send it directly to drive
/// a deterministic refresh.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct Refresh;

/// Cancel the view's timer and stop the actor. In-flight fetches are
/// dropped with the actor, so nothing mutates state after this.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct Stop;

/// The error text to show the user: the server's own message when the
/// response carried one, the view's generic fallback otherwise.
pub fn user_message(err: &Report, fallback: &str) -> String {
    err.downcast_ref::<ApiError>()
        .and_then(ApiError::server_message)
        .unwrap_or_else(|| fallback.to_owned())
}
