use crate::error::ProviderError;
use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;

/// Token shapes that may carry credentials. Prefix markers (`AIza`, `sk-`)
/// redact from the marker itself; assignment markers (`key=`) keep the marker
/// and redact the value that follows.
const SECRET_MARKERS: [&str; 10] = [
    "AIza",
    "ya29.",
    "sk-",
    "key=",
    "api_key=",
    "access_token=",
    "Authorization: Bearer ",
    "authorization: bearer ",
    "x-goog-api-key: ",
    "\"api_key\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

fn redact_after(scrubbed: &mut String, marker: &str) {
    let keep_marker = marker.ends_with(['=', ' ', '"']);
    let mut search_from = 0;
    loop {
        let Some(rel) = scrubbed[search_from..].find(marker) else {
            break;
        };

        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Bare marker without a token value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        let replace_from = if keep_marker { content_start } else { start };
        scrubbed.replace_range(replace_from..end, "[REDACTED]");
        search_from = replace_from + "[REDACTED]".len();
    }
}

/// Scrub credential-shaped tokens out of provider error text.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    if !SECRET_MARKERS.iter().any(|m| input.contains(m)) {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in SECRET_MARKERS {
        redact_after(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Scrub secrets and truncate to a length safe for logs and error chains.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized provider error from a failed HTTP response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    ProviderError::Api {
        provider: provider.to_string(),
        status,
        message: sanitize_api_error(&body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_input_borrows() {
        let input = "model not found";
        assert!(matches!(
            scrub_secret_patterns(input),
            Cow::Borrowed("model not found")
        ));
    }

    #[test]
    fn google_key_prefix_is_redacted() {
        let scrubbed = scrub_secret_patterns("invalid key AIzaSyD4x9v2 for request");
        assert_eq!(scrubbed, "invalid key [REDACTED] for request");
    }

    #[test]
    fn query_marker_keeps_name_redacts_value() {
        let scrubbed = scrub_secret_patterns("GET /search?api_key=abc123&q=homes");
        assert_eq!(scrubbed, "GET /search?api_key=[REDACTED]&q=homes");
    }

    #[test]
    fn bearer_header_is_redacted() {
        let scrubbed = scrub_secret_patterns("Authorization: Bearer ya29.a0Af persisted");
        assert!(!scrubbed.contains("ya29.a0Af"));
        assert!(scrubbed.contains("[REDACTED]"));
    }

    #[test]
    fn long_errors_are_truncated() {
        let long = "x".repeat(250);
        let sanitized = sanitize_api_error(&long);
        assert_eq!(sanitized.len(), MAX_API_ERROR_CHARS + 3);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut long = "a".repeat(MAX_API_ERROR_CHARS - 1);
        long.push_str(&"é".repeat(40));
        let sanitized = sanitize_api_error(&long);
        // Byte 200 lands inside the first `é`, so the cut backs off to 199.
        assert_eq!(sanitized, format!("{}...", "a".repeat(MAX_API_ERROR_CHARS - 1)));
    }
}
