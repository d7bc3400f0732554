// Adapters layer: concrete clients for the external services (OCR, LLM, card database).

pub mod openai;
pub mod scryfall;
pub mod vision;

pub use openai::OpenAiClient;
pub use scryfall::ScryfallClient;
pub use vision::VisionClient;
