//! Text helpers shared by generators and the fallback synthesizer

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html};
use unicode_segmentation::UnicodeSegmentation;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "although", "among",
        "an", "and", "another", "any", "are", "around", "as", "at", "be", "because", "been",
        "before", "being", "below", "between", "both", "but", "by", "can", "cannot", "could",
        "did", "does", "doing", "down", "during", "each", "either", "even", "ever", "every",
        "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
        "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into",
        "is", "it", "its", "itself", "just", "least", "less", "like", "made", "make", "many",
        "may", "me", "might", "more", "most", "much", "must", "my", "myself", "never", "no",
        "nor", "not", "now", "of", "off", "often", "on", "once", "only", "or", "other",
        "others", "ought", "our", "ours", "ourselves", "out", "over", "own", "perhaps", "quite",
        "rather", "really", "said", "same", "says", "see", "seen", "several", "shall", "she",
        "should", "since", "so", "some", "still", "such", "than", "that", "the", "their",
        "theirs", "them", "themselves", "then", "there", "therefore", "these", "they", "thing",
        "things", "this", "those", "though", "through", "thus", "to", "too", "toward",
        "towards", "under", "until", "up", "upon", "very", "was", "we", "were", "what",
        "whatever", "when", "where", "whether", "which", "while", "who", "whom", "whose",
        "why", "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
        "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Unicode words in reading order
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.unicode_words()
}

pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

/// Collapses whitespace runs to single spaces and trims
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

pub fn looks_like_html(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('<') && trimmed.contains('>')
}

/// Extracts readable text from an HTML fragment or document
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_text(&document.root_element(), &mut text);
    collapse_whitespace(&text)
}

fn collect_text(element: &ElementRef, out: &mut String) {
    for node in element.children() {
        if let Some(child) = ElementRef::wrap(node) {
            if matches!(
                child.value().name(),
                "script" | "style" | "noscript" | "head" | "nav" | "footer"
            ) {
                continue;
            }

            collect_text(&child, out);
            out.push(' ');
        } else if let Some(text) = node.value().as_text() {
            out.push_str(text);
        }
    }
}

/// Plain text for arbitrary article input, stripping markup when present
pub fn plain_text(input: &str) -> String {
    if looks_like_html(input) {
        html_to_text(input)
    } else {
        collapse_whitespace(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("The quick, brown fox."), 4);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_stopwords() {
        assert!(is_stopword("the"));
        assert!(!is_stopword("volcano"));
    }

    #[test]
    fn test_html_to_text_skips_scripts() {
        let html = "<html><head><title>t</title></head><body><p>Hello <b>world</b></p>\
                    <script>var x = 1;</script></body></html>";
        assert_eq!(html_to_text(html), "Hello world");
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(plain_text("  a  b\n c "), "a b c");
        assert_eq!(plain_text("<p>a</p><p>b</p>"), "a b");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
