/// Approximate token count: the number of whitespace-separated words in `text`.
#[must_use]
pub fn estimate_tokens(text: &str) -> u32 {
    text.split_whitespace().count().try_into().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::estimate_tokens;

    #[test]
    fn empty_and_blank_text_have_no_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("   \n\t "), 0);
    }

    #[test]
    fn runs_of_whitespace_collapse() {
        assert_eq!(estimate_tokens("a b  c"), 3);
        assert_eq!(estimate_tokens("  leading and trailing  "), 3);
        assert_eq!(estimate_tokens("line one\nline two\ttab"), 5);
    }

    #[test]
    fn punctuation_stays_attached() {
        assert_eq!(estimate_tokens("Hello, world!"), 2);
        assert_eq!(estimate_tokens("Hi"), 1);
    }

    #[test]
    fn estimate_is_deterministic() {
        let text = "What is the capital of France?";
        assert_eq!(estimate_tokens(text), estimate_tokens(text));
        assert_eq!(estimate_tokens(text), 6);
    }
}
