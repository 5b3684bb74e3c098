pub mod app;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod lookup;
pub mod meals;
pub mod state;
pub mod storage;
pub mod workflow;
