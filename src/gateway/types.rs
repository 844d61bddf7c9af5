// src/gateway/types.rs

use serde::{Deserialize, Serialize};

/// An item returned by the upstream metadata service, eligible for scoring.
///
/// Search results carry only snippet fields; statistics and duration are
/// filled in later by a batched detail lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

impl Candidate {
    pub fn apply_details(&mut self, details: &CandidateDetails) {
        if !details.description.is_empty() {
            self.description = details.description.clone();
        }
        if !details.tags.is_empty() {
            self.tags = details.tags.clone();
        }
        self.view_count = details.view_count;
        self.duration_secs = details.duration_secs;
    }
}

/// Statistics and content metadata for one candidate, from the batch lookup.
#[derive(Debug, Clone)]
pub struct CandidateDetails {
    pub description: String,
    pub tags: Vec<String>,
    pub view_count: u64,
    pub duration_secs: Option<u64>,
}

/// Parses an ISO 8601 duration of the shape the upstream emits (`PT1H2M3S`,
/// `PT4M20S`, `PT45S`). Returns `None` for anything it cannot read.
pub fn parse_iso8601_duration(raw: &str) -> Option<u64> {
    let rest = raw.strip_prefix("PT").or_else(|| raw.strip_prefix("P"))?;
    if rest.is_empty() {
        return None;
    }
    let mut total: u64 = 0;
    let mut digits = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let value: u64 = digits.parse().ok()?;
        digits.clear();
        match ch {
            'H' => total += value * 3600,
            'M' => total += value * 60,
            'S' => total += value,
            _ => return None,
        }
    }
    if !digits.is_empty() {
        // trailing digits without a unit
        return None;
    }
    Some(total)
}

// ── Upstream wire format ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    pub id: SearchItemId,
    pub snippet: Snippet,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItemId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "channelTitle", default)]
    pub channel_title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoItem {
    pub id: String,
    pub snippet: Snippet,
    #[serde(default)]
    pub statistics: Option<Statistics>,
    #[serde(rename = "contentDetails", default)]
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Statistics {
    #[serde(rename = "viewCount", default)]
    pub view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentDetails {
    #[serde(default)]
    pub duration: Option<String>,
}

impl VideoItem {
    pub(crate) fn view_count(&self) -> u64 {
        self.statistics
            .as_ref()
            .and_then(|s| s.view_count.as_deref())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub(crate) fn duration_secs(&self) -> Option<u64> {
        self.content_details
            .as_ref()
            .and_then(|c| c.duration.as_deref())
            .and_then(parse_iso8601_duration)
    }

    pub(crate) fn into_candidate(self) -> Candidate {
        let view_count = self.view_count();
        let duration_secs = self.duration_secs();
        Candidate {
            video_id: self.id,
            title: self.snippet.title,
            channel: self.snippet.channel_title,
            description: self.snippet.description,
            tags: self.snippet.tags,
            view_count,
            duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_seconds() {
        assert_eq!(parse_iso8601_duration("PT3M20S"), Some(200));
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45));
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso8601_duration("PT2H"), Some(7200));
    }

    #[test]
    fn rejects_garbage_durations() {
        assert_eq!(parse_iso8601_duration(""), None);
        assert_eq!(parse_iso8601_duration("PT"), None);
        assert_eq!(parse_iso8601_duration("3M20S"), None);
        assert_eq!(parse_iso8601_duration("PT3X"), None);
        assert_eq!(parse_iso8601_duration("PT3M20"), None);
    }

    #[test]
    fn video_item_maps_to_candidate() {
        let json = r#"{
            "id": "abc123",
            "snippet": {
                "title": "Song (Official Video)",
                "channelTitle": "Label",
                "description": "the hit single",
                "tags": ["pop", "single"]
            },
            "statistics": { "viewCount": "123456" },
            "contentDetails": { "duration": "PT3M30S" }
        }"#;
        let item: VideoItem = serde_json::from_str(json).unwrap();
        let candidate = item.into_candidate();
        assert_eq!(candidate.video_id, "abc123");
        assert_eq!(candidate.view_count, 123_456);
        assert_eq!(candidate.duration_secs, Some(210));
        assert_eq!(candidate.tags, vec!["pop", "single"]);
    }

    #[test]
    fn search_item_tolerates_missing_video_id() {
        let json = r#"{ "items": [ { "id": {}, "snippet": { "title": "x", "channelTitle": "y" } } ] }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.items[0].id.video_id.is_none());
    }
}
