pub mod audit;
pub mod request;
pub mod role;
pub mod session;
pub mod user;
