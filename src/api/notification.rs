use super::ApiExecutor;
use crate::async_message_handler_with_span;
use crate::managers::notification::{Notification, NotificationId};
use crate::span::AsyncSpanHandler;
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use color_eyre::eyre::Report;
use tracing::debug;
use tracing_futures::Instrument;

#[derive(Message, Clone)]
#[rtype(result = "Result<Vec<Notification>, Report>")]
pub struct FetchNotifications;

async_message_handler_with_span!({
    impl AsyncSpanHandler<FetchNotifications> for ApiExecutor {
        async fn handle(_msg: FetchNotifications) -> Result<Vec<Notification>, Report> {
            debug!("Fetching notifications");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            let notifications = transport.notifications().await?;
            Ok(notifications)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<i64, Report>")]
pub struct FetchUnreadCount;

async_message_handler_with_span!({
    impl AsyncSpanHandler<FetchUnreadCount> for ApiExecutor {
        async fn handle(_msg: FetchUnreadCount) -> Result<i64, Report> {
            debug!("Fetching unread notification count");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            let count = transport.unread_count().await?;
            Ok(count)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<(), Report>")]
pub struct MarkNotificationRead(pub NotificationId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<MarkNotificationRead> for ApiExecutor {
        async fn handle(msg: MarkNotificationRead) -> Result<(), Report> {
            let MarkNotificationRead(notification_id) = msg;
            debug!(notification = notification_id.0, "Marking notification read");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            transport.mark_read(notification_id).await?;
            Ok(())
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<(), Report>")]
pub struct MarkAllNotificationsRead;

async_message_handler_with_span!({
    impl AsyncSpanHandler<MarkAllNotificationsRead> for ApiExecutor {
        async fn handle(_msg: MarkAllNotificationsRead) -> Result<(), Report> {
            debug!("Marking all notifications read");
            let transport = with_ctx(|a: &mut ApiExecutor, _| a.transport());
            transport.mark_all_read().await?;
            Ok(())
        }
    }
});
