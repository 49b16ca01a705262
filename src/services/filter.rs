// src/services/filter.rs

//! Filter and classification of extracted articles.

use crate::models::{Article, FilterConfig, SectionSettings};

/// Applies section formatting and the global keyword rules.
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    exclude: Vec<String>,
    include: Vec<String>,
}

impl ArticleFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            exclude: lowercase_keywords(&config.exclude_keywords),
            include: lowercase_keywords(&config.include_keywords),
        }
    }

    /// Decorate the article with its section's header, footer, and default tags,
    /// then decide whether it is kept.
    pub fn classify(&self, article: &mut Article, settings: &SectionSettings) -> bool {
        apply_section_settings(article, settings);
        self.should_include(article)
    }

    /// Keyword decision on title and body. Exclusion always wins.
    pub fn should_include(&self, article: &Article) -> bool {
        let haystack = format!("{} {}", article.title, article.body).to_lowercase();

        if let Some(keyword) = self.exclude.iter().find(|k| haystack.contains(k.as_str())) {
            log::debug!("Excluded {} (keyword '{}')", article.url, keyword);
            return false;
        }
        if !self.include.is_empty() && !self.include.iter().any(|k| haystack.contains(k.as_str())) {
            log::debug!("Excluded {} (no include keyword)", article.url);
            return false;
        }
        true
    }
}

/// Prepend the header, append the footer, and extend the tags.
pub fn apply_section_settings(article: &mut Article, settings: &SectionSettings) {
    if let Some(header) = settings.header.as_deref().filter(|h| !h.is_empty()) {
        article.body = format!("{header}\n\n{}", article.body);
    }
    if let Some(footer) = settings.footer.as_deref().filter(|f| !f.is_empty()) {
        article.body = format!("{}\n\n{footer}", article.body);
    }
    article.tags.extend(settings.default_tags.iter().cloned());
}

fn lowercase_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(title: &str, body: &str) -> Article {
        Article {
            id: None,
            url: "https://site.test/archives/1".into(),
            title: title.into(),
            body: body.into(),
            summary: String::new(),
            author: String::new(),
            publish_date: Utc::now(),
            section: "news".into(),
            image_url: String::new(),
            tags: vec!["politics".into()],
            content_hash: String::new(),
            approval_required: true,
            published: false,
            created_at: Utc::now(),
        }
    }

    fn filter(exclude: &[&str], include: &[&str]) -> ArticleFilter {
        ArticleFilter::new(&FilterConfig {
            exclude_keywords: exclude.iter().map(|s| s.to_string()).collect(),
            include_keywords: include.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let f = filter(&["ads"], &["news"]);
        assert!(!f.should_include(&article("Big news", "Sponsored ADS inside")));
    }

    #[test]
    fn test_include_list_requires_a_match() {
        let f = filter(&[], &["election"]);
        assert!(!f.should_include(&article("Weather", "Sunny")));
        assert!(f.should_include(&article("Election day", "Polls open")));
    }

    #[test]
    fn test_no_rules_keeps_everything() {
        assert!(filter(&[], &[]).should_include(&article("a", "b")));
    }

    #[test]
    fn test_section_settings_are_applied() {
        let settings = SectionSettings {
            header: Some("Breaking".into()),
            footer: Some("Source: site".into()),
            default_tags: vec!["local".into(), "politics".into()],
        };
        let mut a = article("Title", "Body.");
        assert!(filter(&[], &[]).classify(&mut a, &settings));
        assert_eq!(a.body, "Breaking\n\nBody.\n\nSource: site");
        assert_eq!(a.tags, vec!["politics", "local", "politics"]);
    }

    #[test]
    fn test_header_text_takes_part_in_matching() {
        let settings = SectionSettings {
            header: Some("Advertorial: ads".into()),
            ..Default::default()
        };
        let mut a = article("Title", "Body.");
        assert!(!filter(&["ads"], &[]).classify(&mut a, &settings));
    }
}
