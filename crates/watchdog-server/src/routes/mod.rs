pub mod checkpoint;
pub mod health;
pub mod webhook;
