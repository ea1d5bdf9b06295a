pub mod notification;
pub mod poll;
pub mod reconcile;
pub mod seen;
pub mod session;
