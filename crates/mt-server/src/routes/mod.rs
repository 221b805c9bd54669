//! Route handlers for the HTTP API.

pub mod health;
pub mod process;
pub mod reports;
pub mod tools;
