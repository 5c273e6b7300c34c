/// Plain-text report views.
///
/// Every view is a pure function over the ranked users, the histogram and
/// the call list, producing a [`ReportSection`]. Names are padded by display
/// width so columns stay aligned for non-ASCII names in fixed-width output.
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthStr;

use crate::directory::Channel;
use crate::timefmt::format_instant;

pub mod activity;
pub mod calls;
pub mod graph;

/// Column width for real names.
pub const NAME_WIDTH: usize = 10;

/// Ordered lines of one report view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSection {
    pub lines: Vec<String>,
}

impl ReportSection {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// The report views that can be requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    /// One line per user with the total count
    Lite,
    /// Per-day breakdown
    Full,
    /// Call-by-call listing
    Calls,
    /// DOT call graph
    Graph,
    /// Calls started or joined, per user
    Participation,
    /// Calls started, per user
    Initiation,
    /// Mentions users with no activity in the window
    Callout,
}

impl ReportView {
    pub fn parse(name: &str) -> Result<Self> {
        let view = match name.trim().to_ascii_lowercase().as_str() {
            "lite" => ReportView::Lite,
            "full" => ReportView::Full,
            "calls" => ReportView::Calls,
            "graph" => ReportView::Graph,
            "participation" => ReportView::Participation,
            "initiation" => ReportView::Initiation,
            "callout" => ReportView::Callout,
            other => bail!(
                "Unknown report view '{}'. Expected: lite, full, calls, graph, participation, initiation, callout",
                other
            ),
        };
        Ok(view)
    }

    /// Parse a comma-separated list; an empty list means the lite view.
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        let names: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(vec![ReportView::Lite]);
        }
        names.into_iter().map(Self::parse).collect()
    }
}

/// Opening line of every report.
pub fn introduction(now: DateTime<Utc>, days: u32, channel: &Channel) -> String {
    let span = if days == 1 {
        "day".to_string()
    } else {
        format!("{} days", days)
    };
    format!(
        "{}: activity over the last {} on {}",
        format_instant(now),
        span,
        channel.mention()
    )
}

/// Left-justify `name` to `width` display columns; longer names are kept whole.
pub fn pad_name(name: &str, width: usize) -> String {
    let shown = UnicodeWidthStr::width(name);
    if shown >= width {
        return name.to_string();
    }
    format!("{}{}", name, " ".repeat(width - shown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pad_name_ascii() {
        assert_eq!(pad_name("Bob", 10), "Bob       ");
        assert_eq!(pad_name("Bartholomew Q", 10), "Bartholomew Q");
    }

    #[test]
    fn test_pad_name_wide_characters() {
        // Each CJK character takes two columns.
        let padded = pad_name("山田", 10);
        assert_eq!(padded, "山田      ");
        assert_eq!(UnicodeWidthStr::width(padded.as_str()), 10);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(ReportView::parse_list("").unwrap(), vec![ReportView::Lite]);
        assert_eq!(
            ReportView::parse_list("full, Calls,graph").unwrap(),
            vec![ReportView::Full, ReportView::Calls, ReportView::Graph]
        );
        assert!(ReportView::parse_list("lite,pie").is_err());
    }

    #[test]
    fn test_introduction() {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap();
        let channel = Channel::new("C1", "standup");
        assert_eq!(
            introduction(now, 3, &channel),
            "2025-03-15 09:00 UTC: activity over the last 3 days on <#C1|standup>"
        );
        assert!(introduction(now, 1, &channel).contains("last day on"));
    }

    #[test]
    fn test_section_text() {
        let mut section = ReportSection::default();
        assert!(section.is_empty());
        section.push("a");
        section.push(String::from("b"));
        assert_eq!(section.to_text(), "a\nb");
    }
}
