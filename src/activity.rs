/// Per-user message histograms bucketed by day offset.
///
/// Every tracked user gets an entry up front, so users who never posted are
/// present with an empty histogram rather than missing.
use indexmap::IndexMap;
use std::collections::BTreeMap;

use crate::directory::UserDirectory;
use crate::history::MessageEvent;
use crate::window::ActivityWindow;

/// Message counts for one user, keyed by day offset (0 = today).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserActivity {
    by_day: BTreeMap<u32, u32>,
}

impl UserActivity {
    fn record(&mut self, day_offset: u32) {
        *self.by_day.entry(day_offset).or_insert(0) += 1;
    }

    pub fn count_on(&self, day_offset: u32) -> u32 {
        self.by_day.get(&day_offset).copied().unwrap_or(0)
    }

    /// All messages, including those older than the window.
    pub fn total(&self) -> u32 {
        self.by_day.values().sum()
    }

    /// Smallest day offset with any activity, `None` for silent users.
    pub fn most_recent_day(&self) -> Option<u32> {
        self.by_day.keys().next().copied()
    }
}

/// Activity for every tracked user, in directory order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityHistogram {
    users: IndexMap<String, UserActivity>,
}

impl ActivityHistogram {
    pub fn get(&self, user_id: &str) -> Option<&UserActivity> {
        self.users.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Sum of all buckets across all tracked users.
    pub fn total_messages(&self) -> u32 {
        self.users.values().map(UserActivity::total).sum()
    }
}

/// Builds the per-user histogram for `directory`.
///
/// Messages from untracked users are skipped. Events stamped after the
/// window's reference instant land in bucket 0.
pub fn aggregate(
    messages: &[MessageEvent],
    window: &ActivityWindow,
    directory: &UserDirectory,
) -> ActivityHistogram {
    let mut users: IndexMap<String, UserActivity> = directory
        .iter()
        .map(|user| (user.user_id.clone(), UserActivity::default()))
        .collect();

    let mut untracked = 0usize;
    for message in messages {
        let Some(activity) = users.get_mut(&message.user_id) else {
            untracked += 1;
            continue;
        };
        let offset = window.day_offset(message.timestamp).clamp(0, i64::from(u32::MAX));
        activity.record(offset as u32);
    }

    if untracked > 0 {
        tracing::debug!("Skipped {} messages from untracked users", untracked);
    }

    ActivityHistogram { users }
}
