pub mod bus;
pub mod cache;
pub mod notify;
pub mod push;
