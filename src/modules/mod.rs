pub mod notify;
pub mod system;
