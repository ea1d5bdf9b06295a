use super::{Refresh, Stop};
use crate::api::notification::{
    FetchNotifications, FetchUnreadCount, MarkAllNotificationsRead, MarkNotificationRead,
};
use crate::api::ApiExecutor;
use crate::managers::notification::{Notification, NotificationId};
use crate::span::SpanMessage;
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use color_eyre::eyre::Report;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How often the unread badge re-reads the server.
pub const BADGE_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct NotificationUpdate {
    pub unread: i64,
    pub notifications: Vec<Notification>,
    /// True until the first count lands; failed ticks leave it and the
    /// count untouched.
    pub loading: bool,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "NotificationUpdate")]
pub struct Snapshot;

/// Pull the full notification list into the snapshot, for an opened
/// notification dropdown.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct LoadNotifications;

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct MarkRead(pub NotificationId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct MarkAllRead;

/// Unread-notification badge. Only the count is polled; the list itself
/// is fetched on demand and after every mark-read.
pub struct NotificationBadge {
    unread: i64,
    notifications: Vec<Notification>,
    subscriber: Recipient<NotificationUpdate>,
    loading: bool,
    timer: Option<SpawnHandle>,
}

impl NotificationBadge {
    pub fn new(subscriber: Recipient<NotificationUpdate>) -> Self {
        Self {
            unread: 0,
            notifications: Vec::new(),
            subscriber,
            loading: true,
            timer: None,
        }
    }

    fn snapshot(&self) -> NotificationUpdate {
        NotificationUpdate {
            unread: self.unread,
            notifications: self.notifications.clone(),
            loading: self.loading,
        }
    }

    fn push(&self) {
        if let Err(err) = self.subscriber.do_send(self.snapshot()) {
            debug!("Notification subscriber is gone: {}", err);
        }
    }
}

impl Actor for NotificationBadge {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("Notification badge started");
        ctx.notify(Refresh);
        self.timer = Some(ctx.run_interval(BADGE_REFRESH_INTERVAL, |_badge, ctx| {
            ctx.notify(Refresh)
        }));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!("Notification badge stopped");
    }
}

#[instrument]
async fn run_refresh() -> Result<(), Report> {
    debug!("Refreshing unread count");
    let counted = ApiExecutor::from_registry()
        .send(SpanMessage::new(FetchUnreadCount))
        .await?;
    match counted {
        Ok(unread) => {
            with_ctx(|badge: &mut NotificationBadge, _| {
                badge.unread = unread;
                badge.loading = false;
                badge.push();
            });
            Ok(())
        }
        Err(err) => {
            // A missed tick keeps the previous badge instead of blanking it.
            debug!("Unread count refresh failed: {}", err);
            Err(err)
        }
    }
}

impl Handler<Refresh> for NotificationBadge {
    type Result = ResponseActFuture<Self, Result<(), Report>>;

    fn handle(&mut self, _msg: Refresh, _ctx: &mut Context<Self>) -> Self::Result {
        run_refresh().interop_actor_boxed(self)
    }
}

#[instrument]
async fn run_load() -> Result<(), Report> {
    debug!("Loading notifications");
    let fetched = ApiExecutor::from_registry()
        .send(SpanMessage::new(FetchNotifications))
        .await?;
    match fetched {
        Ok(notifications) => {
            with_ctx(|badge: &mut NotificationBadge, _| {
                badge.notifications = notifications;
                badge.push();
            });
            Ok(())
        }
        Err(err) => {
            warn!("Notification list fetch failed: {}", err);
            Err(err)
        }
    }
}

impl Handler<LoadNotifications> for NotificationBadge {
    type Result = ResponseActFuture<Self, Result<(), Report>>;

    fn handle(&mut self, _msg: LoadNotifications, _ctx: &mut Context<Self>) -> Self::Result {
        run_load().interop_actor_boxed(self)
    }
}

/// Re-read both the list and the count after a mark-read, so the badge and
/// the dropdown agree with whatever the server actually recorded.
async fn reload() -> Result<(), Report> {
    let executor = ApiExecutor::from_registry();
    let (list, count) = futures::try_join!(
        executor.send(SpanMessage::new(FetchNotifications)),
        executor.send(SpanMessage::new(FetchUnreadCount)),
    )?;
    let notifications = list?;
    let unread = count?;
    with_ctx(|badge: &mut NotificationBadge, _| {
        badge.notifications = notifications;
        badge.unread = unread;
        badge.loading = false;
        badge.push();
    });
    Ok(())
}

#[instrument]
async fn run_mark_read(id: NotificationId) -> Result<(), Report> {
    debug!("Marking notification read");
    ApiExecutor::from_registry()
        .send(SpanMessage::new(MarkNotificationRead(id)))
        .await??;
    reload().await
}

impl Handler<MarkRead> for NotificationBadge {
    type Result = ResponseActFuture<Self, Result<(), Report>>;

    fn handle(&mut self, msg: MarkRead, _ctx: &mut Context<Self>) -> Self::Result {
        run_mark_read(msg.0).interop_actor_boxed(self)
    }
}

#[instrument]
async fn run_mark_all_read() -> Result<(), Report> {
    debug!("Marking all notifications read");
    ApiExecutor::from_registry()
        .send(SpanMessage::new(MarkAllNotificationsRead))
        .await??;
    reload().await
}

impl Handler<MarkAllRead> for NotificationBadge {
    type Result = ResponseActFuture<Self, Result<(), Report>>;

    fn handle(&mut self, _msg: MarkAllRead, _ctx: &mut Context<Self>) -> Self::Result {
        run_mark_all_read().interop_actor_boxed(self)
    }
}

impl Handler<Snapshot> for NotificationBadge {
    type Result = MessageResult<Snapshot>;

    fn handle(&mut self, _msg: Snapshot, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.snapshot())
    }
}

impl Handler<Stop> for NotificationBadge {
    type Result = ();

    fn handle(&mut self, _msg: Stop, ctx: &mut Context<Self>) {
        if let Some(timer) = self.timer.take() {
            ctx.cancel_future(timer);
        }
        ctx.stop();
    }
}
