pub mod chat_console;
