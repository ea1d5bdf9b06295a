pub mod api;
pub mod engine;
pub mod log;
pub mod managers;
pub mod span;
pub mod views;
