pub mod minimize;
pub mod oscillate;
