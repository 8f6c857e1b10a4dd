/// Backend used for a model profile.
///
/// Chat generation goes to Google Gemini; embeddings go to Jina AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Google Gemini `generateContent` REST API.
    Gemini,
    /// Jina AI embeddings API.
    Jina,
}
