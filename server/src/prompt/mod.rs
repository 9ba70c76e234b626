pub(crate) mod analysis;
pub mod completion;
pub(crate) mod draft;

pub use completion::{CompletionClient, CompletionProvider, CompletionProviderHandle, ProviderError};
