use crate::adapters::chat_service::ChatBackend;
use crate::adapters::realtime::RealtimeTransport;

/// The external collaborators a chat session talks to.
pub trait Context: Sync + Send {
    fn backend(&self) -> &dyn ChatBackend;
    fn transport(&self) -> &dyn RealtimeTransport;
}
