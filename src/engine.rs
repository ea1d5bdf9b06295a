use crate::api::{ApiExecutor, ApiTransport};
use actix::prelude::*;
use actix::registry::SystemRegistry;
use std::sync::Arc;

/// Install the transport that backs every API message on the running
/// system. Must be called inside the actix system, before any view
/// actor starts; tests call it with a scripted transport.
pub fn register_transport(transport: Arc<dyn ApiTransport>) {
    SystemRegistry::set(ApiExecutor::new(transport).start());
}
