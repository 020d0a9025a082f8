pub mod history;
pub mod outbound;
pub mod realtime;
pub mod sessions;
