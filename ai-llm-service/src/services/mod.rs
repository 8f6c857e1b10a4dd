pub mod gemini_service;
pub mod jina_service;
