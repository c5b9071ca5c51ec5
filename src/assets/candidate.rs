use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where a candidate URL was found. Used only for trust weighting and tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Favicon,
    ManifestIcon,
    Logo,
    OpenGraph,
    Scraped,
}

impl SourceTag {
    /// Trust score (0..100) of a brand-mark source.
    pub fn brand_trust(&self) -> f64 {
        match self {
            SourceTag::ManifestIcon => 90.0,
            SourceTag::Favicon => 80.0,
            SourceTag::Logo => 65.0,
            SourceTag::OpenGraph | SourceTag::Scraped => 30.0,
        }
    }
}

/// One URL considered for an asset slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    pub source: SourceTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_height: Option<u32>,
}

impl Candidate {
    pub fn new(url: impl Into<String>, source: SourceTag) -> Self {
        Self {
            url: url.into().trim().to_string(),
            source,
            declared_width: None,
            declared_height: None,
        }
    }

    pub fn with_declared_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.declared_width = width;
        self.declared_height = height;
        self
    }

    /// Declared pixel area, or 0 when either side is unknown.
    pub fn declared_area(&self) -> u64 {
        match (self.declared_width, self.declared_height) {
            (Some(w), Some(h)) => w as u64 * h as u64,
            _ => 0,
        }
    }
}

/// Drops empty URLs and repeated URLs, keeping the first occurrence and the input order.
pub fn dedupe(candidates: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| !c.url.is_empty() && seen.insert(c.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_source() {
        let list = dedupe(vec![
            Candidate::new("https://a.test/icon.png", SourceTag::Favicon),
            Candidate::new(" https://a.test/icon.png ", SourceTag::Logo),
            Candidate::new("", SourceTag::Logo),
            Candidate::new("https://a.test/logo.png", SourceTag::Logo),
        ]);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].source, SourceTag::Favicon);
        assert_eq!(list[1].url, "https://a.test/logo.png");
    }

    #[test]
    fn declared_area_needs_both_sides() {
        let c = Candidate::new("u", SourceTag::Scraped).with_declared_size(Some(100), None);
        assert_eq!(c.declared_area(), 0);
        let c = c.with_declared_size(Some(100), Some(20));
        assert_eq!(c.declared_area(), 2000);
    }
}
