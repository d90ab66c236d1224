pub mod checkpoint;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;
pub mod io;

pub use error::{ErrorKind, Result, WatchdogError};
