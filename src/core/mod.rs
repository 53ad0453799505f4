pub mod app;
pub mod chat_id;
pub mod chat_stream;
pub mod config;
pub mod engine;
pub mod exchange;
pub mod manager;
pub mod message;
pub mod records;
pub mod registry;
pub mod session;
pub mod store;
