mod support;

use actix::prelude::*;
use pollhub_live::api::ApiError;
use pollhub_live::engine;
use pollhub_live::managers::poll::{OptionId, Poll, PollId};
use pollhub_live::managers::seen::{self, InMemorySeenStore, SharedSeenStore};
use pollhub_live::managers::session::{VoteError, VoteMode};
use pollhub_live::views::poll_detail::{
    CloseVoters, LoadVoters, PollDetailUpdate, PollDetailView, RequestChange, Select, Snapshot,
    SubmitVote,
};
use pollhub_live::views::{Refresh, Stop};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use support::{edited, poll, updates, user, voted, Collector, FakeApi};
use tokio::time::delay_for;

struct Harness {
    api: Arc<FakeApi>,
    store: SharedSeenStore,
    view: Addr<PollDetailView>,
    collector: Addr<Collector<PollDetailUpdate>>,
}

/// Start a detail view on poll 1 and drive it past its first load. The
/// startup tick and the awaited refresh each consume one scripted copy of
/// `initial`.
async fn open_poll(initial: Poll) -> Harness {
    support::init_tracing();
    let api = Arc::new(FakeApi::new());
    engine::register_transport(api.clone());
    let store = seen::shared(InMemorySeenStore::new());
    let collector = Collector::<PollDetailUpdate>::new().start();

    api.poll.push(Ok(initial.clone()));
    api.poll.push(Ok(initial));
    let view =
        PollDetailView::new(PollId(1), store.clone(), collector.clone().recipient()).start();
    view.send(Refresh).await.unwrap().unwrap();

    Harness {
        api,
        store,
        view,
        collector,
    }
}

#[actix_rt::test]
async fn first_load_fills_the_snapshot() {
    let initial = voted(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)]), 2);
    let h = open_poll(initial.clone()).await;

    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.poll, Some(initial));
    assert_eq!(snapshot.mode, VoteMode::Viewing);
    assert_eq!(snapshot.selection, Some(OptionId(2)));
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error, None);
}

#[actix_rt::test]
async fn every_state_change_pushes_a_fresh_snapshot() {
    let initial = voted(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)]), 2);
    let h = open_poll(initial.clone()).await;

    // The startup tick and the driven refresh each landed one push, both
    // already past loading.
    let pushed = h.collector.send(updates()).await.unwrap();
    assert_eq!(pushed.len(), 2);
    assert_eq!(pushed[0].poll, Some(initial));
    assert_eq!(pushed[0].mode, VoteMode::Viewing);
    assert!(!pushed[0].loading);

    h.view.send(RequestChange).await.unwrap();
    h.view.send(Select(OptionId(1))).await.unwrap();

    let pushed = h.collector.send(updates()).await.unwrap();
    assert_eq!(pushed.len(), 4);
    assert_eq!(pushed[2].mode, VoteMode::ChangingVote);
    assert_eq!(pushed[2].selection, None);
    assert_eq!(pushed[3].selection, Some(OptionId(1)));
}

#[actix_rt::test]
async fn pushes_never_turn_the_loading_flag_back_on() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;

    let ticked = poll(1, "t2", &[(1, "Tea", 4), (2, "Coffee", 5)]);
    h.api.poll.push(Ok(ticked.clone()));
    h.view.send(Refresh).await.unwrap().unwrap();
    h.api
        .poll
        .push(Err(ApiError::Transport("connection refused".to_owned())));
    h.view.send(Refresh).await.unwrap().unwrap_err();

    let pushed = h.collector.send(updates()).await.unwrap();
    assert_eq!(pushed.len(), 4);
    assert!(pushed.iter().all(|update| !update.loading));
    assert_eq!(pushed[2].poll, Some(ticked));
    assert_eq!(pushed[2].error, None);
    // The failed tick pushed too, with the last good poll still aboard.
    assert_eq!(pushed[3].error, Some("Failed to fetch poll".to_owned()));
    assert_eq!(pushed[3].poll, pushed[2].poll);
}

#[actix_rt::test]
async fn a_selection_survives_background_ticks() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;
    h.view.send(Select(OptionId(2))).await.unwrap();

    // The next tick reports a vote recorded from another device; the
    // in-progress choice stays.
    let fetched = voted(poll(1, "t2", &[(1, "Tea", 4), (2, "Coffee", 5)]), 1);
    h.api.poll.push(Ok(fetched));
    h.view.send(Refresh).await.unwrap().unwrap();

    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.mode, VoteMode::Voting);
    assert_eq!(snapshot.selection, Some(OptionId(2)));
}

#[actix_rt::test]
async fn submitting_without_a_selection_never_reaches_the_server() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;

    let result = h.view.send(SubmitVote).await.unwrap();
    let err = result.unwrap_err();
    assert_eq!(err.downcast_ref::<VoteError>(), Some(&VoteError::NoSelection));
    assert_eq!(h.api.calls(), vec!["fetch_poll 1", "fetch_poll 1"]);

    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.mode, VoteMode::Voting);
    assert_eq!(snapshot.vote_error, None);
}

#[actix_rt::test]
async fn a_submitted_vote_locks_onto_the_response() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;
    h.view.send(Select(OptionId(2))).await.unwrap();

    let response = voted(poll(1, "t2", &[(1, "Tea", 3), (2, "Coffee", 6)]), 2);
    h.api.vote.push(Ok(response.clone()));
    h.view.send(SubmitVote).await.unwrap().unwrap();

    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.poll, Some(response));
    assert_eq!(snapshot.mode, VoteMode::Viewing);
    assert_eq!(snapshot.selection, Some(OptionId(2)));
    assert_eq!(snapshot.vote_error, None);
    assert!(h.api.calls().contains(&"cast_vote 1 2".to_owned()));
}

#[actix_rt::test]
async fn a_rejected_vote_keeps_state_and_surfaces_the_server_message() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;
    h.view.send(Select(OptionId(2))).await.unwrap();

    h.api.vote.push(Err(ApiError::Status {
        status: 400,
        message: Some("Invalid option for this poll".to_owned()),
    }));
    h.view.send(SubmitVote).await.unwrap().unwrap_err();

    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.mode, VoteMode::Voting);
    assert_eq!(snapshot.selection, Some(OptionId(2)));
    assert_eq!(
        snapshot.vote_error,
        Some("Invalid option for this poll".to_owned())
    );

    // The next submission starts clean.
    let response = voted(poll(1, "t2", &[(1, "Tea", 3), (2, "Coffee", 6)]), 2);
    h.api.vote.push(Ok(response));
    h.view.send(SubmitVote).await.unwrap().unwrap();
    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.vote_error, None);
    assert_eq!(snapshot.mode, VoteMode::Viewing);
}

#[actix_rt::test]
async fn a_vanished_option_clears_the_selection() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;
    h.view.send(Select(OptionId(2))).await.unwrap();

    h.api.poll.push(Ok(poll(1, "t2", &[(1, "Tea", 3)])));
    h.view.send(Refresh).await.unwrap().unwrap();

    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.mode, VoteMode::Voting);
    assert_eq!(snapshot.selection, None);
}

#[actix_rt::test]
async fn a_failed_fetch_keeps_the_poll_and_surfaces_an_error() {
    let initial = voted(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)]), 2);
    let h = open_poll(initial.clone()).await;

    h.api
        .poll
        .push(Err(ApiError::Transport("connection refused".to_owned())));
    h.view.send(Refresh).await.unwrap().unwrap_err();

    // The recorded vote keeps showing its results through the outage.
    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.poll, Some(initial));
    assert_eq!(snapshot.mode, VoteMode::Viewing);
    assert_eq!(snapshot.selection, Some(OptionId(2)));
    assert_eq!(snapshot.error, Some("Failed to fetch poll".to_owned()));

    // The next successful tick clears the error again.
    h.api
        .poll
        .push(Ok(voted(poll(1, "t2", &[(1, "Tea", 4), (2, "Coffee", 5)]), 2)));
    h.view.send(Refresh).await.unwrap().unwrap();
    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.mode, VoteMode::Viewing);
}

#[actix_rt::test]
async fn an_update_notice_shows_once_per_revision() {
    let changed = edited(voted(poll(1, "t2", &[(1, "Tea", 3), (2, "Coffee", 5)]), 2));
    let h = open_poll(changed.clone()).await;

    // Opening the poll acknowledged revision t2: the notice was pushed with
    // the first snapshot and is already gone from the next one.
    assert!(seen::is_seen(&h.store, PollId(1), "t2"));
    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert!(!snapshot.update_notice);

    // Another edit bumps the revision and the notice comes back.
    let changed_again = edited(voted(poll(1, "t3", &[(1, "Tea", 3), (2, "Coffee", 5)]), 2));
    h.api.poll.push(Ok(changed_again));
    h.view.send(Refresh).await.unwrap().unwrap();
    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert!(snapshot.update_notice);

    // The same revision does not announce itself twice.
    let same = edited(voted(poll(1, "t3", &[(1, "Tea", 3), (2, "Coffee", 5)]), 2));
    h.api.poll.push(Ok(same));
    h.view.send(Refresh).await.unwrap().unwrap();
    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert!(!snapshot.update_notice);
}

#[actix_rt::test]
async fn the_update_notice_rides_exactly_one_push_per_revision() {
    let h = open_poll(voted(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)]), 2)).await;

    let changed = edited(voted(poll(1, "t2", &[(1, "Tea", 3), (2, "Coffee", 5)]), 2));
    h.api.poll.push(Ok(changed.clone()));
    h.view.send(Refresh).await.unwrap().unwrap();
    h.api.poll.push(Ok(changed));
    h.view.send(Refresh).await.unwrap().unwrap();

    // Only the push that introduced revision t2 carries the notice.
    let pushed = h.collector.send(updates()).await.unwrap();
    assert_eq!(pushed.len(), 4);
    assert!(pushed[2].update_notice);
    assert_eq!(
        pushed.iter().filter(|update| update.update_notice).count(),
        1
    );
}

#[actix_rt::test]
async fn an_edit_without_a_vote_raises_no_notice() {
    let h = open_poll(edited(poll(1, "t2", &[(1, "Tea", 3), (2, "Coffee", 5)]))).await;

    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert!(!snapshot.update_notice);
    // Nothing to acknowledge either: the revision stays unseen.
    assert!(!seen::is_seen(&h.store, PollId(1), "t2"));
}

#[actix_rt::test]
async fn the_voters_panel_loads_and_closes() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;

    h.api.voters.push(Ok(vec![user(5), user(6)]));
    h.view.send(LoadVoters(OptionId(1))).await.unwrap().unwrap();
    let snapshot = h.view.send(Snapshot).await.unwrap();
    let panel = snapshot.voters.unwrap();
    assert_eq!(panel.option, OptionId(1));
    assert_eq!(panel.users, vec![user(5), user(6)]);

    h.view.send(CloseVoters).await.unwrap();
    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert!(snapshot.voters.is_none());
}

#[actix_rt::test]
async fn an_unavailable_voter_list_shows_empty() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;

    h.api
        .voters
        .push(Err(ApiError::Transport("connection refused".to_owned())));
    h.view.send(LoadVoters(OptionId(2))).await.unwrap().unwrap();
    let snapshot = h.view.send(Snapshot).await.unwrap();
    let panel = snapshot.voters.unwrap();
    assert_eq!(panel.option, OptionId(2));
    assert!(panel.users.is_empty());
}

#[actix_rt::test]
async fn change_flow_round_trips_through_the_view() {
    let initial = voted(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)]), 2);
    let h = open_poll(initial).await;

    h.view.send(RequestChange).await.unwrap();
    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.mode, VoteMode::ChangingVote);
    assert_eq!(snapshot.selection, None);

    h.view.send(Select(OptionId(1))).await.unwrap();
    let response = voted(poll(1, "t2", &[(1, "Tea", 4), (2, "Coffee", 4)]), 1);
    h.api.vote.push(Ok(response));
    h.view.send(SubmitVote).await.unwrap().unwrap();

    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.mode, VoteMode::Viewing);
    assert_eq!(snapshot.selection, Some(OptionId(1)));
    assert!(h.api.calls().contains(&"cast_vote 1 1".to_owned()));
}

#[actix_rt::test]
async fn overlapping_fetches_apply_in_completion_order() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;

    let slow = poll(1, "t2", &[(1, "Tea", 9), (2, "Coffee", 5)]);
    let fast = poll(1, "t3", &[(1, "Tea", 3), (2, "Coffee", 9)]);
    h.api
        .poll
        .push_delayed(Duration::from_millis(40), Ok(slow.clone()));
    h.api.poll.push(Ok(fast));

    // Two ticks overlap; the first one issued resolves last and wins.
    h.view.do_send(Refresh);
    h.view.do_send(Refresh);
    delay_for(Duration::from_millis(80)).await;

    let snapshot = h.view.send(Snapshot).await.unwrap();
    assert_eq!(snapshot.poll, Some(slow));
}

#[actix_rt::test]
async fn stop_ends_the_view() {
    let h = open_poll(poll(1, "t1", &[(1, "Tea", 3), (2, "Coffee", 5)])).await;

    h.view.send(Stop).await.unwrap();
    delay_for(Duration::from_millis(10)).await;
    assert!(!h.view.connected());
}
