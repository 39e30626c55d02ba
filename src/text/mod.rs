//! Turning reading text into addressable tokens.

pub mod context;
pub mod tokenizer;

pub use context::{extract_context, window_at, DEFAULT_CONTEXT_RADIUS};
pub use tokenizer::{normalize_word, tokenize, Token, PUNCTUATION};
