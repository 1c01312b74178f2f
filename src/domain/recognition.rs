/// Result of a completed speech recognition, one segment per recognized
/// stretch of audio in the order the service returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResult {
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptSegment {
    /// Alternatives ordered by confidence; only the first one is used.
    pub alternatives: Vec<String>,
}

impl TranscriptSegment {
    pub fn new(alternatives: Vec<String>) -> Self {
        Self { alternatives }
    }

    pub fn single(text: impl Into<String>) -> Self {
        Self {
            alternatives: vec![text.into()],
        }
    }
}

impl RecognitionResult {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments }
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: texts.into_iter().map(TranscriptSegment::single).collect(),
        }
    }

    /// Space-joined best alternatives, skipping blank ones. `None` when
    /// nothing usable was recognized.
    pub fn transcript(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .segments
            .iter()
            .filter_map(|s| s.alternatives.first())
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}
