//! Metadata strategy.
//!
//! Reads a small JSON-like document such as
//! `{"version": "3.0", "url": "https://cdn.example.com/game.zip"}`.
//! Well-formed JSON is read with `serde_json`. Release endpoints are often
//! hand-edited, so when strict parsing fails (trailing commas, comments,
//! unquoted values) each field is recovered with a lenient key scanner.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use super::{ReleaseCandidate, ReleaseLocator, unreachable};
use crate::core::{UpdaterError, UpdaterResult};
use crate::http::HttpBackend;
use crate::version::Version;

const VERSION_FIELD: &str = "version";
const URL_FIELD: &str = "url";
const SHA256_FIELD: &str = "sha256";

pub struct MetadataLocator {
    metadata_url: Url,
}

impl MetadataLocator {
    pub const fn new(metadata_url: Url) -> Self {
        Self {
            metadata_url,
        }
    }

    /// Build a candidate from a metadata document.
    pub fn interpret(&self, document: &str) -> UpdaterResult<ReleaseCandidate> {
        let fields = Fields::new(document);

        let version_text = fields.get(VERSION_FIELD).ok_or_else(|| self.missing(VERSION_FIELD))?;
        let url_text = fields.get(URL_FIELD).ok_or_else(|| self.missing(URL_FIELD))?;

        let download_url = self.metadata_url.join(&url_text).map_err(|e| {
            self.invalid(URL_FIELD, format!("'{url_text}' is not a valid link: {e}"))
        })?;
        if !matches!(download_url.scheme(), "http" | "https") {
            return Err(self.invalid(
                URL_FIELD,
                format!("unsupported scheme '{}'", download_url.scheme()),
            ));
        }

        let version = Version::parse(&version_text)
            .or_else(|| Some(Version::extract(&version_text)))
            .filter(|v| !v.is_empty());
        if version.is_none() {
            debug!("Published version '{}' has no numeric form", version_text);
        }

        let mut candidate = ReleaseCandidate::new(download_url, version).with_tag(version_text);

        if let Some(digest) = fields.get(SHA256_FIELD) {
            let digest = digest.trim().to_lowercase();
            let digest = digest.strip_prefix("sha256:").unwrap_or(&digest).to_string();
            if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(self.invalid(SHA256_FIELD, "expected 64 hex characters".to_string()));
            }
            candidate = candidate.with_sha256(digest);
        }

        Ok(candidate)
    }

    fn missing(&self, field: &str) -> UpdaterError {
        UpdaterError::MissingField {
            url: self.metadata_url.to_string(),
            field: field.to_string(),
        }
    }

    fn invalid(&self, field: &str, reason: String) -> UpdaterError {
        UpdaterError::InvalidField {
            url: self.metadata_url.to_string(),
            field: field.to_string(),
            reason,
        }
    }
}

#[async_trait]
impl ReleaseLocator for MetadataLocator {
    async fn locate(&self, backend: &dyn HttpBackend) -> UpdaterResult<ReleaseCandidate> {
        info!("Reading release metadata {}", self.metadata_url);
        let document =
            backend.get_text(&self.metadata_url).await.map_err(|e| unreachable(&self.metadata_url, &e))?;

        let candidate = self.interpret(&document)?;
        info!(
            "Published release: {} ({})",
            candidate.version_label().unwrap_or_default(),
            candidate.download_url
        );
        Ok(candidate)
    }

    fn describe(&self) -> String {
        format!("metadata {}", self.metadata_url)
    }
}

/// Field lookup over a document: strict JSON object first, lenient scan second.
struct Fields<'a> {
    document: &'a str,
    object: Option<Map<String, Value>>,
}

impl<'a> Fields<'a> {
    fn new(document: &'a str) -> Self {
        let object = match serde_json::from_str::<Value>(document) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => None,
            Err(e) => {
                debug!("Metadata is not strict JSON ({}), scanning leniently", e);
                None
            }
        };
        Self {
            document,
            object,
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.object
            .as_ref()
            .and_then(|map| map.get(key))
            .and_then(value_text)
            .or_else(|| scan_field(self.document, key))
    }
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Find `"key"` followed by `:` and return its value.
///
/// Quoted values are unescaped. Bare values run up to `,`, `}`, or a line end.
/// Empty values and `null` count as absent.
fn scan_field(document: &str, key: &str) -> Option<String> {
    let needle = format!("\"{key}\"");

    for (index, _) in document.match_indices(&needle) {
        let rest = document[index + needle.len()..].trim_start();
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        let rest = rest.trim_start();

        let value = if let Some(quoted) = rest.strip_prefix('"') {
            match take_quoted(quoted) {
                Some(raw) => unescape(raw),
                None => continue,
            }
        } else {
            let end = rest.find([',', '}', '\n', '\r']).unwrap_or(rest.len());
            rest[..end].trim().to_string()
        };

        let value = value.trim();
        if value.is_empty() || value == "null" {
            continue;
        }
        return Some(value.to_string());
    }

    None
}

/// Raw contents of a quoted string whose opening quote was already consumed.
fn take_quoted(input: &str) -> Option<&str> {
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(&input[..i]),
            _ => {}
        }
    }
    None
}

fn unescape(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 >= chars.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let simple = match chars[i + 1] {
            '"' => Some('"'),
            '\\' => Some('\\'),
            '/' => Some('/'),
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            _ => None,
        };
        if let Some(ch) = simple {
            out.push(ch);
            i += 2;
            continue;
        }

        if chars[i + 1] == 'u' {
            if let Some((ch, consumed)) = decode_unicode_escape(&chars[i..]) {
                out.push(ch);
                i += consumed;
                continue;
            }
        }

        // Unknown escape: keep the backslash, the next char follows as a literal
        out.push('\\');
        i += 1;
    }

    out
}

/// Decode `\uXXXX` at the start of `chars`, combining a following low surrogate.
fn decode_unicode_escape(chars: &[char]) -> Option<(char, usize)> {
    let high = hex4(chars.get(2..)?)?;

    if (0xD800..0xDC00).contains(&high) {
        if chars.get(6) == Some(&'\\') && chars.get(7) == Some(&'u') {
            let low = hex4(chars.get(8..)?)?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code).map(|c| (c, 12));
            }
        }
        return None;
    }

    char::from_u32(high).map(|c| (c, 6))
}

fn hex4(chars: &[char]) -> Option<u32> {
    if chars.len() < 4 {
        return None;
    }
    chars[..4].iter().try_fold(0u32, |acc, c| c.to_digit(16).map(|d| acc * 16 + d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> MetadataLocator {
        MetadataLocator::new(Url::parse("https://updates.example.com/arena/latest.json").unwrap())
    }

    #[test]
    fn test_strict_document() {
        let c = locator()
            .interpret(r#"{"version": "3.0", "url": "https://cdn.example.com/arena/game.zip"}"#)
            .unwrap();
        assert_eq!(c.version, Some(Version::new(vec![3, 0])));
        assert_eq!(c.tag.as_deref(), Some("3.0"));
        assert_eq!(c.file_name, "game.zip");
        assert_eq!(c.sha256, None);
    }

    #[test]
    fn test_numeric_version_value() {
        let c = locator().interpret(r#"{"version": 3, "url": "game.zip"}"#).unwrap();
        assert_eq!(c.version, Some(Version::new(vec![3])));
    }

    #[test]
    fn test_relative_url_resolved_against_metadata() {
        let c = locator().interpret(r#"{"version":"1.4","url":"files/game-1.4.zip"}"#).unwrap();
        assert_eq!(
            c.download_url.as_str(),
            "https://updates.example.com/arena/files/game-1.4.zip"
        );
    }

    #[test]
    fn test_lenient_document() {
        let doc = "{\n  version: ignored,\n  \"version\": v2.5.1,\n  \"url\": \"https:\\/\\/cdn.example.com\\/g.zip\",\n}";
        let c = locator().interpret(doc).unwrap();
        assert_eq!(c.version, Some(Version::new(vec![2, 5, 1])));
        assert_eq!(c.download_url.as_str(), "https://cdn.example.com/g.zip");
    }

    #[test]
    fn test_prerelease_tag_falls_back_to_extraction() {
        let c = locator().interpret(r#"{"version":"v3.0-rc1","url":"g.zip"}"#).unwrap();
        assert_eq!(c.tag.as_deref(), Some("v3.0-rc1"));
        assert_eq!(c.version, Some(Version::new(vec![3, 0])));
    }

    #[test]
    fn test_missing_fields() {
        let err = locator().interpret(r#"{"url": "g.zip"}"#).unwrap_err();
        assert_eq!(
            err,
            UpdaterError::MissingField {
                url: "https://updates.example.com/arena/latest.json".to_string(),
                field: "version".to_string(),
            }
        );

        let err = locator().interpret(r#"{"version": "1.0", "url": null}"#).unwrap_err();
        assert!(matches!(err, UpdaterError::MissingField { ref field, .. } if field == "url"));

        let err = locator().interpret("not json at all").unwrap_err();
        assert!(matches!(err, UpdaterError::MissingField { .. }));
    }

    #[test]
    fn test_unsupported_url_scheme() {
        let err = locator().interpret(r#"{"version":"1","url":"file:///etc/passwd"}"#).unwrap_err();
        assert!(matches!(err, UpdaterError::InvalidField { .. }));
    }

    #[test]
    fn test_sha256_field() {
        let digest = "A".repeat(64);
        let doc = format!(r#"{{"version":"1","url":"g.zip","sha256":"sha256:{digest}"}}"#);
        let c = locator().interpret(&doc).unwrap();
        assert_eq!(c.sha256, Some("a".repeat(64)));

        let err = locator().interpret(r#"{"version":"1","url":"g.zip","sha256":"abc"}"#).unwrap_err();
        assert!(matches!(err, UpdaterError::InvalidField { ref field, .. } if field == "sha256"));
    }

    #[test]
    fn test_scan_field_nested_and_null() {
        let doc = r#"{"latest": {"version": null, "version": "2.0"}}"#;
        assert_eq!(scan_field(doc, "version").as_deref(), Some("2.0"));
        assert_eq!(scan_field(doc, "url"), None);
    }

    #[test]
    fn test_key_suffix_does_not_match() {
        let doc = r#"{"download_url": "a.zip", "url": "b.zip"}"#;
        assert_eq!(scan_field(doc, "url").as_deref(), Some("b.zip"));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"a\"b\\c\/d"#), "a\"b\\c/d");
        assert_eq!(unescape(r"line\nnext\ttab\r\b\f"), "line\nnext\ttab\r\u{8}\u{c}");
        assert_eq!(unescape(r"caf\u00e9"), "caf\u{e9}");
        assert_eq!(unescape(r"\ud83c\udfae"), "\u{1f3ae}");
        assert_eq!(unescape(r"\q"), "\\q");
        assert_eq!(unescape(r"\ud83c alone"), "\\ud83c alone");
        assert_eq!(unescape(r"\u12"), "\\u12");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_take_quoted_handles_escapes() {
        assert_eq!(take_quoted(r#"a\"b" rest"#), Some(r#"a\"b"#));
        assert_eq!(take_quoted("unterminated"), None);
    }
}
