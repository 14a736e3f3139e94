pub mod file_store;
pub mod gemini;

pub use file_store::JsonFileStore;
pub use gemini::GeminiClient;
