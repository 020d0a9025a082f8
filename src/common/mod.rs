pub mod context;
pub mod datetime;
pub mod env;
pub mod error;
pub mod init;
pub mod state;
pub mod sync;
