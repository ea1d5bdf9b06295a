use actix::prelude::*;
use color_eyre::eyre::{eyre, Report};
use dotenv::dotenv;
use pollhub_live::api::HttpApi;
use pollhub_live::managers::poll::PollId;
use pollhub_live::managers::seen::{self, FileSeenStore};
use pollhub_live::views::notifications::{NotificationBadge, NotificationUpdate};
use pollhub_live::views::poll_detail::{PollDetailUpdate, PollDetailView};
use pollhub_live::views::poll_list::{PollListUpdate, PollListView};
use pollhub_live::views::Stop;
use pollhub_live::{engine, log};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Headless subscriber that logs every update the views push. Stands in
/// for a rendering frontend.
struct Watcher;

impl Actor for Watcher {
    type Context = Context<Self>;
}

impl Handler<PollListUpdate> for Watcher {
    type Result = ();

    fn handle(&mut self, update: PollListUpdate, _ctx: &mut Context<Self>) {
        let unseen = update
            .entries
            .iter()
            .filter(|entry| entry.unseen_update)
            .count();
        info!(
            polls = update.entries.len(),
            unseen,
            error = ?update.error,
            "Poll list updated"
        );
    }
}

impl Handler<PollDetailUpdate> for Watcher {
    type Result = ();

    fn handle(&mut self, update: PollDetailUpdate, _ctx: &mut Context<Self>) {
        info!(
            mode = ?update.mode,
            selection = ?update.selection,
            update_notice = update.update_notice,
            error = ?update.error,
            "Poll detail updated"
        );
    }
}

impl Handler<NotificationUpdate> for Watcher {
    type Result = ();

    fn handle(&mut self, update: NotificationUpdate, _ctx: &mut Context<Self>) {
        info!(unread = update.unread, "Notifications updated");
    }
}

fn seen_store_path() -> Result<PathBuf, Report> {
    env::var("POLLHUB_DATA_DIR")
        .ok()
        .map(|dir| PathBuf::from(dir).join("seen_updates.json"))
        .or_else(FileSeenStore::default_path)
        .ok_or_else(|| eyre!("No data directory available for the seen-update store"))
}

#[actix_rt::main]
async fn main() -> Result<(), Report> {
    dotenv().ok();
    log::init()?;

    let url = env::var("POLLHUB_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_owned());
    let mut api = HttpApi::new(&url);
    if let Ok(token) = env::var("POLLHUB_TOKEN") {
        api = api.with_token(token);
    }
    engine::register_transport(Arc::new(api));

    let store = seen::shared(FileSeenStore::open(seen_store_path()?));
    let watcher = Watcher.start();

    info!(api = url.as_str(), "Starting poll watcher");
    let list = PollListView::new(store.clone(), watcher.clone().recipient()).start();
    let badge = NotificationBadge::new(watcher.clone().recipient()).start();
    let detail = match env::var("POLLHUB_WATCH_POLL") {
        Ok(raw) => {
            let poll = PollId(raw.parse()?);
            Some(PollDetailView::new(poll, store.clone(), watcher.clone().recipient()).start())
        }
        Err(_) => None,
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    if let Some(detail) = detail {
        detail.send(Stop).await?;
    }
    list.send(Stop).await?;
    badge.send(Stop).await?;
    Ok(())
}
