//! Shared configuration, errors and constants for the scoreit auth service.

pub mod config;
pub mod constants;
pub mod error;
