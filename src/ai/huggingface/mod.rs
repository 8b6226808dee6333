pub mod client;
pub mod text_generation;

pub use text_generation::TextGenerationBackend;
