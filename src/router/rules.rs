use super::ContentType;
use crate::error::RouterError;
use regex::Regex;
use strum::IntoEnumIterator;

/// Classification rule tables: keyword lists and intent patterns per content
/// type, plus the static follow-up table.
///
/// Rules are data, not control flow: tests construct reduced tables and the
/// router logic stays untouched. Entries are held in `ContentType` declaration
/// order, which is the documented tie-break order for keyword scoring.
#[derive(Debug)]
pub struct RouterRules {
    keywords: Vec<(ContentType, Vec<&'static str>)>,
    patterns: Vec<(ContentType, Vec<Regex>)>,
}

impl RouterRules {
    /// Build the default rule tables. Fails only if a pattern does not
    /// compile, which would be a programming error caught by tests.
    pub fn defaults() -> Result<Self, RouterError> {
        let mut keywords = Vec::new();
        let mut patterns = Vec::new();

        for content_type in ContentType::iter() {
            let words = default_keywords(content_type);
            if !words.is_empty() {
                keywords.push((content_type, words));
            }

            let sources = default_patterns(content_type);
            if sources.is_empty() {
                continue;
            }
            let mut compiled = Vec::with_capacity(sources.len());
            for source in sources {
                let regex = Regex::new(source).map_err(|e| RouterError::InvalidPattern {
                    content_type: content_type.to_string(),
                    pattern: (*source).to_string(),
                    message: e.to_string(),
                })?;
                compiled.push(regex);
            }
            patterns.push((content_type, compiled));
        }

        Self::from_parts(keywords, patterns)
    }

    /// Build from explicit tables (used by tests to pin rule behavior).
    pub fn from_parts(
        keywords: Vec<(ContentType, Vec<&'static str>)>,
        patterns: Vec<(ContentType, Vec<Regex>)>,
    ) -> Result<Self, RouterError> {
        if keywords.is_empty() {
            return Err(RouterError::EmptyRules);
        }
        Ok(Self { keywords, patterns })
    }

    /// Keyword lists in declaration order.
    pub fn keywords(&self) -> &[(ContentType, Vec<&'static str>)] {
        &self.keywords
    }

    /// Compiled patterns in declaration order.
    pub fn patterns(&self) -> &[(ContentType, Vec<Regex>)] {
        &self.patterns
    }

    /// Top keywords for a type, used by conversation-history inference.
    pub fn top_keywords(&self, content_type: ContentType, limit: usize) -> &[&'static str] {
        self.keywords
            .iter()
            .find(|(ct, _)| *ct == content_type)
            .map_or(&[], |(_, words)| &words[..words.len().min(limit)])
    }

    /// Static follow-up suggestions per content type.
    pub fn follow_ups(content_type: ContentType) -> Vec<ContentType> {
        match content_type {
            ContentType::Research => vec![
                ContentType::Blog,
                ContentType::Linkedin,
                ContentType::Image,
            ],
            ContentType::Blog => vec![ContentType::Linkedin, ContentType::Image],
            ContentType::Linkedin => vec![ContentType::Image],
            ContentType::Instagram => vec![ContentType::Image, ContentType::Blog],
            ContentType::Image => vec![],
            ContentType::Strategy => vec![
                ContentType::Research,
                ContentType::Blog,
                ContentType::Linkedin,
            ],
            ContentType::General => vec![ContentType::Research],
        }
    }
}

fn default_keywords(content_type: ContentType) -> Vec<&'static str> {
    match content_type {
        ContentType::Research => vec![
            "research",
            "find",
            "search",
            "look up",
            "investigate",
            "analyze",
            "study",
            "explore",
            "discover",
            "learn about",
            "what is",
            "who is",
            "how does",
            "why does",
            "explain",
            "information",
            "data",
            "facts",
            "statistics",
            "trends",
        ],
        ContentType::Blog => vec![
            "blog",
            "article",
            "post",
            "write",
            "content",
            "seo",
            "long-form",
            "guide",
            "tutorial",
            "how-to",
            "listicle",
            "review",
            "comparison",
            "pillar",
            "evergreen",
        ],
        ContentType::Linkedin => vec![
            "linkedin",
            "professional",
            "network",
            "career",
            "business post",
            "thought leadership",
            "engagement",
            "social media",
            "professional network",
            "b2b",
            "corporate",
            "industry",
        ],
        ContentType::Instagram => vec![
            "instagram",
            "insta",
            "caption",
            "hashtag",
            "hashtags",
            "reel",
            "ig post",
        ],
        ContentType::Image => vec![
            "image",
            "picture",
            "visual",
            "graphic",
            "illustration",
            "photo",
            "design",
            "create image",
            "generate image",
            "artwork",
            "banner",
            "thumbnail",
            "infographic",
        ],
        ContentType::Strategy => vec![
            "strategy",
            "plan",
            "campaign",
            "marketing",
            "content calendar",
            "roadmap",
            "outline",
            "framework",
            "approach",
            "methodology",
        ],
        ContentType::General => vec![],
    }
}

fn default_patterns(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Research => &[
            r"(?:can you |please )?(?:research|find|look up|search for)\s+.+",
            r"what (?:is|are|does|do)\s+.+",
            r"tell me (?:about|more about)\s+.+",
            r"i (?:want|need) (?:to know|information) about\s+.+",
        ],
        ContentType::Blog => &[
            r"(?:write|create|generate) (?:a |an )?(?:blog|article|post)\s+.+",
            r"(?:blog|article) (?:about|on)\s+.+",
            r"seo (?:content|article|blog)\s+.+",
        ],
        ContentType::Linkedin => &[
            r"(?:write|create|generate) (?:a )?linkedin (?:post|content)\s*.*",
            r"linkedin (?:post|content) (?:about|on)\s+.+",
            r"professional (?:post|content) (?:about|for)\s+.+",
        ],
        ContentType::Instagram => &[
            r"(?:write|create|generate) (?:an? )?instagram (?:post|caption)\s*.*",
            r"instagram (?:post|caption) (?:about|for|on)\s+.+",
            r"caption (?:for|about)\s+.+",
        ],
        ContentType::Image => &[
            r"(?:create|generate|make) (?:a |an )?(?:image|picture|visual|graphic)\s+.+",
            r"(?:image|picture|visual) (?:of|for|about)\s+.+",
            r"design (?:a |an )?.+",
        ],
        ContentType::Strategy => &[
            r"(?:create|develop|build) (?:a )?(?:content )?strategy\s*.*",
            r"(?:marketing|content) plan (?:for|about)\s+.+",
            r"campaign (?:for|about)\s+.+",
        ],
        ContentType::General => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_compile() {
        let rules = RouterRules::defaults().unwrap();
        assert!(!rules.keywords().is_empty());
        assert!(!rules.patterns().is_empty());
    }

    #[test]
    fn keyword_order_follows_declaration_order() {
        let rules = RouterRules::defaults().unwrap();
        let order: Vec<ContentType> = rules.keywords().iter().map(|(ct, _)| *ct).collect();
        assert_eq!(order[0], ContentType::Research);
        assert_eq!(order[1], ContentType::Blog);
        // General carries no keywords and is absent from the table.
        assert!(!order.contains(&ContentType::General));
    }

    #[test]
    fn top_keywords_caps_at_limit() {
        let rules = RouterRules::defaults().unwrap();
        let top = rules.top_keywords(ContentType::Research, 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0], "research");
    }

    #[test]
    fn follow_ups_match_static_table() {
        assert_eq!(
            RouterRules::follow_ups(ContentType::Research),
            vec![
                ContentType::Blog,
                ContentType::Linkedin,
                ContentType::Image
            ]
        );
        assert!(RouterRules::follow_ups(ContentType::Image).is_empty());
    }

    #[test]
    fn empty_keyword_table_is_rejected() {
        let err = RouterRules::from_parts(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, RouterError::EmptyRules));
    }
}
