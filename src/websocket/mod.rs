pub mod conductor;
pub mod hub;
