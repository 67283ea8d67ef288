//! Session and credential models plus the storage contracts the auth core
//! depends on.

pub mod error;
pub mod model;
pub mod store;
