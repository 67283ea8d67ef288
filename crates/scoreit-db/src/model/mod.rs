pub mod role;
pub mod session;
pub mod user;
