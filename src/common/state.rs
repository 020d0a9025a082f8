use crate::adapters::chat_service::ChatBackend;
use crate::adapters::realtime::RealtimeTransport;
use crate::common::context::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ChatBackend>,
    pub transport: Arc<dyn RealtimeTransport>,
}

impl Context for AppState {
    fn backend(&self) -> &dyn ChatBackend {
        self.backend.as_ref()
    }

    fn transport(&self) -> &dyn RealtimeTransport {
        self.transport.as_ref()
    }
}
