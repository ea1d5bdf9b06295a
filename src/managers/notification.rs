use super::poll::PollId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct NotificationId(pub i64);

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub poll_id: Option<PollId>,
    pub read: bool,
    pub created_at: String,
}
