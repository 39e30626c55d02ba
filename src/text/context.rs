use super::tokenizer::Token;

pub const DEFAULT_CONTEXT_RADIUS: usize = 5;

/// Display tokens within `radius` of `index`, joined by single spaces.
pub fn window_at(tokens: &[Token], index: usize, radius: usize) -> String {
    if index >= tokens.len() {
        return String::new();
    }
    let start = index.saturating_sub(radius);
    let end = tokens.len().min(index.saturating_add(radius).saturating_add(1));

    tokens[start..end]
        .iter()
        .map(|token| token.display.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Context for `target`, anchored at the first token whose normalized form
/// contains it. A word that repeats always gets the context of its first
/// occurrence; callers that know the clicked position should use
/// [`window_at`] directly.
pub fn extract_context(tokens: &[Token], target: &str, radius: usize) -> String {
    if target.is_empty() {
        return String::new();
    }

    tokens
        .iter()
        .position(|token| token.normalized.contains(target))
        .map(|index| window_at(tokens, index, radius))
        .unwrap_or_default()
}
