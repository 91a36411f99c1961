pub mod chat_client;
pub mod connectivity;
pub mod generator;
pub mod prompts;

pub use chat_client::{ChatClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use connectivity::{ConnectivityCheck, HttpCheck, DEFAULT_CHECK_URL};
pub use generator::{GenerationRequest, TextGenerator, TimedGenerator};
