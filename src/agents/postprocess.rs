//! Regex cleanup applied to generated text before it leaves an agent.
//!
//! Blog output keeps markdown but gets normalized headings and bullets;
//! LinkedIn output has markdown stripped entirely since the platform renders
//! none of it.

use regex::Regex;
use std::sync::LazyLock;

static HEADING_SPACING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(#{1,6})\s*([^\n]+)").unwrap());
static HEADING_BLANK_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^\n])\n(#{1,6}\s)").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*[-*]\s*").unwrap());

static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap());
static TITLE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Title[:\s]*\*\*\s*(.+)").unwrap());
static META_DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Meta Description[:\s]*\*\*\s*(.+)").unwrap());
static INTRO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(?:introduction|intro)[:\s]*\n+(.+?)(?:\n\n|\n#)").unwrap());

static MD_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s*").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static BOLD_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__([^_]+)__").unwrap());
static ITALIC_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_([^_]+)_").unwrap());
static EXTRA_BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalize heading spacing, force blank lines before headings, and unify
/// bullet markers to `- `.
pub(super) fn fix_markdown(content: &str) -> String {
    let content = HEADING_SPACING_RE.replace_all(content, "$1 $2");
    let content = HEADING_BLANK_LINE_RE.replace_all(&content, "$1\n\n$2");
    let content = BULLET_RE.replace_all(&content, "- ");
    content.trim().to_string()
}

/// Per-keyword usage counts with density, e.g.
/// `Keyword usage - "staging": 3x (1.2%)`. Empty when no keyword appears.
pub(super) fn analyze_keyword_usage(content: &str, keywords: &[String]) -> String {
    let content_lower = content.to_lowercase();
    let word_count = content.split_whitespace().count();

    let parts: Vec<String> = keywords
        .iter()
        .take(5)
        .filter_map(|keyword| {
            let keyword_lower = keyword.to_lowercase();
            let count = content_lower.matches(&keyword_lower).count();
            if count == 0 {
                return None;
            }
            let density = if word_count > 0 {
                (count as f64 / word_count as f64) * 100.0
            } else {
                0.0
            };
            Some(format!("\"{keyword}\": {count}x ({density:.1}%)"))
        })
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("Keyword usage - {}", parts.join(", "))
    }
}

/// Best-effort title: H1, then a `**Title:**` label, then the first plain
/// line capped at 100 chars.
pub(super) fn extract_title(content: &str) -> Option<String> {
    if let Some(caps) = H1_RE.captures(content) {
        return Some(caps[1].trim().to_string());
    }

    if let Some(caps) = TITLE_LABEL_RE.captures(content) {
        return Some(caps[1].trim().to_string());
    }

    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('*') && !line.starts_with('-'))
        .map(|line| line.chars().take(100).collect())
}

/// Best-effort summary: meta description label, then the introduction
/// section, then the first substantial paragraph after the title.
pub(super) fn extract_summary(content: &str) -> Option<String> {
    if let Some(caps) = META_DESCRIPTION_RE.captures(content) {
        return Some(caps[1].trim().to_string());
    }

    if let Some(caps) = INTRO_RE.captures(content) {
        return Some(caps[1].trim().chars().take(300).collect());
    }

    content
        .split("\n\n")
        .skip(1)
        .take(2)
        .map(str::trim)
        .find(|para| !para.is_empty() && !para.starts_with('#') && para.len() > 50)
        .map(|para| para.chars().take(300).collect())
}

/// Strip markdown LinkedIn cannot render: headers removed, bold/italic
/// unwrapped, runs of blank lines collapsed, lines trimmed.
pub(super) fn strip_social_markdown(content: &str) -> String {
    let content = MD_HEADER_RE.replace_all(content, "");
    let content = BOLD_RE.replace_all(&content, "$1");
    let content = ITALIC_RE.replace_all(&content, "$1");
    let content = BOLD_UNDERSCORE_RE.replace_all(&content, "$1");
    let content = ITALIC_UNDERSCORE_RE.replace_all(&content, "$1");
    let content = EXTRA_BLANK_LINES_RE.replace_all(&content, "\n\n");

    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    lines.join("\n").trim().to_string()
}

/// Truncate to at most `max_chars` characters, preferring the last sentence
/// or line boundary when one lands in the final 30%.
pub(super) fn truncate_at_boundary(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let truncated: String = content.chars().take(max_chars.saturating_sub(3)).collect();
    let cut = truncated.rfind('.').max(truncated.rfind('\n'));

    if let Some(cut) = cut {
        let cut_chars = truncated[..cut].chars().count();
        if cut_chars as f64 > max_chars as f64 * 0.7 {
            // '.' and '\n' are one byte, so cut + 1 stays on a boundary.
            return truncated[..=cut].to_string();
        }
    }

    format!("{truncated}...")
}
