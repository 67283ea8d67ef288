//! HTTP surface of the scoreit auth service.

pub mod app;
pub mod error;
pub mod middleware;
