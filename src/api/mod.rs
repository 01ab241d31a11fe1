pub mod admin;
pub mod attendance;
pub mod list;
pub mod modification;
pub mod overtime;
pub mod report;
