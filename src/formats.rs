use std::cmp::Ordering;

use anyhow::{anyhow, Error};
use serde::Serialize;

/// One downloadable variant of an episode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Format {
    pub format_id: String,
    pub url: String,
    pub width: Option<u64>,
    pub height: Option<u64>,
    /// Total bitrate in kbps.
    pub tbr: Option<u64>,
}

impl Format {
    pub fn resolution(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some(format!("{}x{}", width, height)),
            (None, Some(height)) => Some(format!("{}p", height)),
            (Some(width), None) => Some(format!("{}x?", width)),
            (None, None) => None,
        }
    }

    fn has_resolution(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// Ordering policy shared by every site the tool supports.
///
/// Implementations order formats from worst to best; [`FormatRanker::sort`]
/// must keep formats of equal rank in the order they were found.
pub trait FormatRanker {
    fn compare(&self, a: &Format, b: &Format) -> Ordering;

    fn sort(&self, formats: &mut [Format]) {
        formats.sort_by(|a, b| self.compare(a, b));
    }
}

/// Known resolution beats unknown, then height, width and bitrate decide.
#[derive(Clone, Copy, Debug, Default)]
pub struct QualityRanker;

impl FormatRanker for QualityRanker {
    fn compare(&self, a: &Format, b: &Format) -> Ordering {
        a.has_resolution()
            .cmp(&b.has_resolution())
            .then(a.height.cmp(&b.height))
            .then(a.width.cmp(&b.width))
            .then(a.tbr.cmp(&b.tbr))
    }
}

/// Picks a format from a list sorted worst to best.
///
/// `best` and `worst` pick the ends, anything else is matched against `format_id`.
pub fn select_format<'a>(formats: &'a [Format], selector: &str) -> Result<&'a Format, Error> {
    let selected = match selector {
        "best" => formats.last(),
        "worst" => formats.first(),
        id => formats.iter().find(|f| f.format_id == id),
    };
    selected.ok_or(anyhow!("Requested format \"{}\" is not available", selector))
}
