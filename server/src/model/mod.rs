pub mod response;
pub mod usage;
