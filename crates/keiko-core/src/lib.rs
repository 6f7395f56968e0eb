pub mod activity;
pub mod catalog;
pub mod condition;
pub mod config;
pub mod error;
pub mod event;
pub mod io;
pub mod paths;
pub mod period;
pub mod projection;
pub mod service;
pub mod types;

pub use error::{KeikoError, Result};
