//! Response Assembler - collects a streamed response into one text
//!
//! Plans are built from the complete response. Tokens are buffered as they
//! arrive and released only when the stream finishes.

/// Response Assembler
#[derive(Debug, Clone, Default)]
pub struct ResponseAssembler {
    text: String,
    tokens: usize,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one streamed token as-is
    pub fn push(&mut self, token: &str) {
        self.text.push_str(token);
        self.tokens += 1;
    }

    /// Tokens received so far
    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Complete response text, trimmed
    pub fn finish(self) -> String {
        let trimmed = self.text.trim();
        if trimmed.len() == self.text.len() {
            self.text
        } else {
            trimmed.to_owned()
        }
    }
}

impl<S: AsRef<str>> Extend<S> for ResponseAssembler {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for token in iter {
            self.push(token.as_ref());
        }
    }
}
