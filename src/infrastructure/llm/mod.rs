mod gemini_summarizer;

pub use gemini_summarizer::{GeminiSummarizer, TRANSCRIPT_PLACEHOLDER};
