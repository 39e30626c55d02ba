use serde::Serialize;

/// Characters stripped from both ends of a token to get its normalized form.
pub const PUNCTUATION: [char; 8] = ['.', ',', '!', '?', ';', ':', '"', '\''];

/// One whitespace-delimited piece of the reading text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub index: usize,
    /// Exactly as it appears in the text.
    pub display: String,
    /// `display` with surrounding punctuation removed.
    pub normalized: String,
}

impl Token {
    /// A token made only of punctuation cannot be saved or looked up.
    pub fn is_selectable(&self) -> bool {
        !self.normalized.is_empty()
    }
}

pub fn normalize_word(raw: &str) -> &str {
    raw.trim_matches(|c: char| PUNCTUATION.contains(&c))
}

pub fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .enumerate()
        .map(|(index, display)| Token {
            index,
            display: display.to_string(),
            normalized: normalize_word(display).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_runs() {
        let tokens = tokenize("  The quick\n\tbrown   fox ");
        let display: Vec<_> = tokens.iter().map(|t| t.display.as_str()).collect();
        assert_eq!(display, vec!["The", "quick", "brown", "fox"]);
        assert_eq!(tokens[3].index, 3);
    }

    #[test]
    fn strips_punctuation_from_both_ends_only() {
        let tokens = tokenize("\"Hello,\" she said: don't!");
        let normalized: Vec<_> = tokens.iter().map(|t| t.normalized.as_str()).collect();
        assert_eq!(normalized, vec!["Hello", "she", "said", "don't"]);
        assert_eq!(tokens[0].display, "\"Hello,\"");
    }

    #[test]
    fn punctuation_only_token_is_not_selectable() {
        let tokens = tokenize("Wait ... what?!");
        assert!(!tokens[1].is_selectable());
        assert!(tokens[2].is_selectable());
        assert_eq!(tokens[2].normalized, "what");
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \n ").is_empty());
    }

    #[test]
    fn tokenization_is_deterministic() {
        let text = "A river bank, a money bank.";
        assert_eq!(tokenize(text), tokenize(text));
    }
}
