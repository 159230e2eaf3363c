//! Retrieval-augmented question answering.
//!
//! The retriever turns a query into ranked chunks; the answerer turns the
//! query plus those chunks into a grounded, cited answer. An answer is only
//! ever generated from retrieved context — when retrieval comes back empty
//! the engine says so instead of improvising from world knowledge.

mod answer;
mod context;

pub use answer::GroundedAnswerer;
pub use context::Retriever;

use uuid::Uuid;

/// Marker included verbatim in not-grounded answers.
pub const INSUFFICIENT_INFORMATION: &str = "insufficient information";

/// An answer to a user question.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The generated (or fallback) answer text.
    pub text: String,
    /// IDs of the chunks included in the request, in the order sent.
    pub citations: Vec<Uuid>,
    /// Whether the answer is grounded in retrieved context.
    pub grounded: bool,
}

impl Answer {
    /// The fixed response when retrieval produced nothing usable.
    pub fn not_grounded() -> Self {
        Self {
            text: format!(
                "There is {} in your indexed sources to answer this question.",
                INSUFFICIENT_INFORMATION
            ),
            citations: Vec::new(),
            grounded: false,
        }
    }
}
