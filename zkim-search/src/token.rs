//! Search token extraction (§4.4).
//!
//! Lowercase, strip everything outside word characters and whitespace,
//! split on whitespace, drop tokens of length <= 2. Body text additionally
//! keeps only the first 100 tokens in extraction order; metadata fields are
//! tokenized the same way and unioned in without that cap.

use std::collections::BTreeSet;

const MIN_TOKEN_LEN: usize = 3;
const MAX_BODY_TOKENS: usize = 100;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize one string: lowercase, strip non-word/non-whitespace, split,
/// filter by minimum length. No truncation; callers cap body text
/// separately.
fn tokenize(source: &str) -> Vec<String> {
    let cleaned: String = source
        .chars()
        .map(|c| if is_word_char(c) || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();

    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_owned)
        .collect()
}

/// Tokenize body text, keeping only the first `MAX_BODY_TOKENS` tokens in
/// extraction order.
pub fn tokenize_body(body: &str) -> Vec<String> {
    tokenize(body).into_iter().take(MAX_BODY_TOKENS).collect()
}

/// Tokenize a single metadata field (file name, mime type, a tag, or a
/// string custom field value) with no truncation.
pub fn tokenize_field(value: &str) -> Vec<String> {
    tokenize(value)
}

/// The full token set for an indexable file: metadata fields unioned with
/// the first 100 body tokens, per the extraction rule in §4.4.
pub struct IndexableTokens {
    pub tokens: BTreeSet<String>,
}

pub struct IndexInput<'a> {
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub tags: &'a [String],
    pub string_custom_fields: &'a [String],
    pub body: &'a str,
}

pub fn extract_tokens(input: &IndexInput<'_>) -> IndexableTokens {
    let mut tokens = BTreeSet::new();

    tokens.extend(tokenize_field(input.file_name));
    tokens.extend(tokenize_field(input.mime_type));
    for tag in input.tags {
        tokens.extend(tokenize_field(tag));
    }
    for field in input.string_custom_fields {
        tokens.extend(tokenize_field(field));
    }
    tokens.extend(tokenize_body(input.body));

    IndexableTokens { tokens }
}

/// Tokenize a single query string for `search`. The query is treated as
/// one token: lowercased and stripped the same way, but not split, since a
/// multi-word query's trapdoor must match a single indexed token.
pub fn tokenize_query(query: &str) -> Option<String> {
    tokenize(query).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_short_tokens() {
        let tokens = tokenize_body("a an to report");
        assert_eq!(tokens, vec!["report".to_string()]);
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        let tokens = tokenize_body("Report: Q3-Earnings!!");
        assert_eq!(tokens, vec!["report".to_string(), "earnings".to_string()]);
    }

    #[test]
    fn caps_body_at_100_tokens() {
        let body = (0..150).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let tokens = tokenize_body(&body);
        assert_eq!(tokens.len(), MAX_BODY_TOKENS);
        assert_eq!(tokens[0], "word0");
        assert_eq!(tokens[99], "word99");
    }

    #[test]
    fn unions_metadata_and_body() {
        let input = IndexInput {
            file_name: "invoice.pdf",
            mime_type: "application/pdf",
            tags: &["finance".to_string()],
            string_custom_fields: &["acme corp".to_string()],
            body: "quarterly report attached",
        };
        let extracted = extract_tokens(&input);
        for expected in ["invoice", "pdf", "application", "finance", "acme", "corp", "quarterly", "report", "attached"] {
            assert!(extracted.tokens.contains(expected), "missing {expected}");
        }
    }
}
