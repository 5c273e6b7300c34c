use crate::directory::{User, UserDirectory};
use crate::history::CallEvent;
use crate::ranking::{rank_by_calls, CallRole};
use crate::timefmt::format_epoch_seconds;

use super::{pad_name, ReportSection, NAME_WIDTH};

/// Calls started by tracked users, in history order.
pub(crate) fn tracked_calls<'a>(
    calls: &'a [CallEvent],
    directory: &'a UserDirectory,
) -> impl Iterator<Item = (&'a CallEvent, &'a User)> {
    calls.iter().filter_map(move |call| {
        directory
            .get(&call.initiator_user_id)
            .map(|initiator| (call, initiator))
    })
}

/// Tracked participants of a call, in participant order.
pub(crate) fn tracked_participants<'a>(
    call: &'a CallEvent,
    directory: &'a UserDirectory,
) -> impl Iterator<Item = &'a User> {
    call.participant_ids
        .iter()
        .filter_map(move |id| directory.get(id))
}

/// One line per call: start time, initiator, duration and participants.
///
/// Calls started by untracked users are left out, as are untracked
/// participants.
pub fn render_call_summary(calls: &[CallEvent], directory: &UserDirectory) -> ReportSection {
    let mut section = ReportSection::default();
    for (call, initiator) in tracked_calls(calls, directory) {
        let participants: Vec<&str> = tracked_participants(call, directory)
            .map(|user| user.real_name.as_str())
            .collect();
        section.push(format!(
            "{} {} ({:>3} min) {}",
            format_epoch_seconds(call.start_time),
            pad_name(&initiator.real_name, NAME_WIDTH),
            call.duration_minutes,
            participants.join(", ")
        ));
    }
    if section.is_empty() {
        section.push("No calls.");
    }
    section
}

/// Per-user call count and call durations, busiest first.
pub fn render_call_counts(
    calls: &[CallEvent],
    directory: &UserDirectory,
    role: CallRole,
) -> ReportSection {
    let mut section = ReportSection::default();
    for tally in rank_by_calls(calls, directory, role) {
        let durations: Vec<String> = tally.durations.iter().map(|d| d.to_string()).collect();
        let line = format!(
            "{} ({:>3}) {}",
            pad_name(&tally.user.real_name, NAME_WIDTH),
            tally.count(),
            durations.join(", ")
        );
        section.push(line.trim_end().to_string());
    }
    section
}
