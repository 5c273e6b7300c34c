use crate::activity::ActivityHistogram;
use crate::directory::User;

use super::{pad_name, ReportSection, NAME_WIDTH};

/// One line per user: padded real name and total count.
pub fn render_lite(ranked: &[&User], histogram: &ActivityHistogram) -> ReportSection {
    let mut section = ReportSection::default();
    for user in ranked {
        section.push(format!(
            "{} ({:>3})",
            pad_name(&user.real_name, NAME_WIDTH),
            total_for(histogram, user)
        ));
    }
    section
}

/// Per-day breakdown for buckets `0..days`.
///
/// Header labels are day offsets ("days ago"), matching the columns below
/// them: the first column is today.
pub fn render_full(ranked: &[&User], histogram: &ActivityHistogram, days: u32) -> ReportSection {
    let mut section = ReportSection::default();

    let mut header = " ".repeat(NAME_WIDTH);
    for day in 0..days {
        header.push_str(&format!(" {:>2}", day));
    }
    section.push(header.trim_end().to_string());

    for user in ranked {
        let mut line = pad_name(&user.real_name, NAME_WIDTH);
        let activity = histogram.get(&user.user_id);
        for day in 0..days {
            let count = activity.map_or(0, |a| a.count_on(day));
            line.push_str(&format!(" {:>2}", count));
        }
        section.push(line);
    }
    section
}

/// Mentions every tracked user with no fetched messages.
///
/// Uses the same totals as the lite view, so a user listed with a non-zero
/// count is never called out.
pub fn render_callout(ranked: &[&User], histogram: &ActivityHistogram) -> ReportSection {
    let silent: Vec<String> = ranked
        .iter()
        .filter(|user| total_for(histogram, user) == 0)
        .map(|user| user.mention())
        .collect();

    let mut section = ReportSection::default();
    if silent.is_empty() {
        section.push("Go team!");
    } else {
        section.push(format!("{}, we miss you.", silent.join(", ")));
    }
    section
}

fn total_for(histogram: &ActivityHistogram, user: &User) -> u32 {
    histogram.get(&user.user_id).map_or(0, |a| a.total())
}
