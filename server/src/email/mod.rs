pub mod body_extractor;
pub mod client;
pub mod summary;
