pub mod bus;
pub mod notify;
