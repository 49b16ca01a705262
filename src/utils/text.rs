// src/utils/text.rs

//! Plain-text helpers: whitespace, summaries, and URL slug titles.

use url::Url;

/// Collapse every whitespace run into a single space and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build a bounded summary from body text.
///
/// Text longer than `max_len` characters is cut at the last `.`, `!`, or `?`
/// inside the limit when that boundary lies past 70% of the limit; otherwise
/// it is hard-cut at `max_len` and `...` is appended.
pub fn summarize(text: &str, max_len: usize) -> String {
    let content = normalize_whitespace(text);
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= max_len {
        return content;
    }

    let truncated = &chars[..max_len];
    let boundary = truncated
        .iter()
        .rposition(|c| matches!(c, '.' | '!' | '?'));

    match boundary {
        Some(idx) if idx as f64 > max_len as f64 * 0.7 => chars[..=idx].iter().collect(),
        _ => {
            let mut summary: String = truncated.iter().collect();
            summary.push_str("...");
            summary
        }
    }
}

/// Derive a readable title from the last path segment of a URL.
///
/// `https://site/archives/my-great_article` becomes `My Great Article`.
pub fn title_from_url(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            url.trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        });

    let decoded = urlencoding::decode(&segment)
        .map(|s| s.into_owned())
        .unwrap_or(segment);
    let spaced = decoded.replace(['-', '_'], " ");
    title_case(&normalize_whitespace(&spaced))
}

/// Uppercase the first letter of every word and lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut previous_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(summarize("  Short   text. ", 300), "Short text.");
    }

    #[test]
    fn test_summary_without_boundary_gets_ellipsis() {
        let body = "x".repeat(1000);
        let summary = summarize(&body, 300);
        assert_eq!(summary.chars().count(), 303);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_summary_cuts_at_sentence_boundary() {
        let body = format!("{}.{}", "x".repeat(250), "y".repeat(749));
        assert_eq!(body.chars().count(), 1000);
        let summary = summarize(&body, 300);
        assert_eq!(summary.chars().count(), 251);
        assert!(summary.ends_with('.'));
    }

    #[test]
    fn test_early_boundary_is_ignored() {
        let body = format!("{}!{}", "x".repeat(100), "y".repeat(899));
        let summary = summarize(&body, 300);
        assert_eq!(summary.chars().count(), 303);
    }

    #[test]
    fn test_summary_counts_characters_not_bytes() {
        let body = "خبر".repeat(200);
        let summary = summarize(&body, 100);
        assert_eq!(summary.chars().count(), 103);
    }

    #[test]
    fn test_title_from_url_slug() {
        assert_eq!(
            title_from_url("https://www.example.com/archives/my-great-article"),
            "My Great Article"
        );
        assert_eq!(
            title_from_url("https://www.example.com/archives/my_other-story/"),
            "My Other Story"
        );
    }

    #[test]
    fn test_title_case_mixed() {
        assert_eq!(title_case("hELLO wORLD 2nd"), "Hello World 2Nd");
    }
}
