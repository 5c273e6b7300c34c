/// First-name matching between a roster and a list of real names.
///
/// Helps build a users file by hand: for every real name, the first word is
/// searched (case-insensitively, literally) in each roster line.
use anyhow::{Context, Result};
use regex::RegexBuilder;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    pub first_name: String,
    pub line: String,
}

impl fmt::Display for NameMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Match: {} : {}", self.first_name, self.line)
    }
}

/// Matches the first word of each name against every roster line.
///
/// Blank name lines are skipped. Results follow name order, then roster order.
pub fn match_first_names(roster: &str, names: &str) -> Result<Vec<NameMatch>> {
    let roster_lines: Vec<&str> = roster.lines().collect();
    let mut matches = Vec::new();

    for first_name in names.lines().filter_map(|line| line.split_whitespace().next()) {
        let pattern = RegexBuilder::new(&regex::escape(first_name))
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Failed to build pattern for '{}'", first_name))?;

        matches.extend(
            roster_lines
                .iter()
                .filter(|line| pattern.is_match(line))
                .map(|line| NameMatch {
                    first_name: first_name.to_string(),
                    line: line.to_string(),
                }),
        );
    }

    Ok(matches)
}

pub fn match_files(roster_path: &Path, names_path: &Path) -> Result<Vec<NameMatch>> {
    let roster = std::fs::read_to_string(roster_path)
        .with_context(|| format!("Failed to read roster: {}", roster_path.display()))?;
    let names = std::fs::read_to_string(names_path)
        .with_context(|| format!("Failed to read names: {}", names_path.display()))?;
    match_first_names(&roster, &names)
}
