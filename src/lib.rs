pub mod auction;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod message_broker;
pub mod monitor;
pub mod repository;
pub mod store;
