//! Parse HTTP response header lines into object metadata.

use crate::api::ObjectStat;

/// Headers of interest from a GET or HEAD response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ResponseHead {
    /// `Content-Length` of this response (the fetched range, not the object).
    pub content_length: Option<u64>,
    /// Total object size from `Content-Range: bytes a-b/total` or `bytes */total`.
    pub content_range_total: Option<u64>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
}

impl ResponseHead {
    /// Object metadata for a response whose body starts at `offset`.
    pub fn to_stat(&self, offset: u64) -> ObjectStat {
        let size = self
            .content_range_total
            .or_else(|| self.content_length.map(|len| offset + len))
            .unwrap_or(offset);
        ObjectStat {
            size,
            etag: self.etag.clone(),
            last_modified: self.last_modified.clone(),
            content_type: self.content_type.clone(),
        }
    }
}

/// Parse collected header lines into `ResponseHead`. Status lines and
/// malformed lines are skipped.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            if let Ok(n) = value.parse::<u64>() {
                head.content_length = Some(n);
            }
        } else if name.eq_ignore_ascii_case("content-range") {
            head.content_range_total = parse_content_range_total(value);
        } else if name.eq_ignore_ascii_case("etag") {
            head.etag = Some(value.trim_matches('"').to_string());
        } else if name.eq_ignore_ascii_case("last-modified") {
            head.last_modified = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("content-type") {
            head.content_type = Some(value.to_string());
        }
    }

    head
}

/// Status code from a line like `HTTP/1.1 206 Partial Content`.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    let proto = parts.next()?;
    if !proto.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}
