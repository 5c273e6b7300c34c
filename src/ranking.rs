/// Ranking rules shared by the report views.
use std::cmp::Reverse;

use crate::activity::ActivityHistogram;
use crate::directory::{User, UserDirectory};
use crate::history::CallEvent;

/// Which calls count towards a user in the call tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    /// Only calls the user started
    Initiation,
    /// Calls the user started or joined
    Participation,
}

/// A tracked user with the calls attributed to them.
#[derive(Debug, Clone)]
pub struct CallTally<'a> {
    pub user: &'a User,
    pub durations: Vec<u32>,
}

impl CallTally<'_> {
    pub fn count(&self) -> usize {
        self.durations.len()
    }
}

/// Tracked users ordered least active first.
///
/// Primary key is total message count ascending. Equal totals put the user
/// whose most recent activity is oldest first; users with no activity at all
/// count as least recent. Remaining ties keep directory order.
pub fn rank_by_inactivity<'a>(
    histogram: &ActivityHistogram,
    directory: &'a UserDirectory,
) -> Vec<&'a User> {
    let mut ranked: Vec<(&User, u32, Reverse<u32>)> = directory
        .iter()
        .map(|user| {
            let activity = histogram.get(&user.user_id);
            let total = activity.map_or(0, |a| a.total());
            let most_recent = activity
                .and_then(|a| a.most_recent_day())
                .unwrap_or(u32::MAX);
            (user, total, Reverse(most_recent))
        })
        .collect();

    ranked.sort_by_key(|(_, total, recency)| (*total, *recency));
    ranked.into_iter().map(|(user, _, _)| user).collect()
}

/// Tracked users ordered by number of calls, most first.
///
/// Ties keep directory order. Durations are listed in call order.
pub fn rank_by_calls<'a>(
    calls: &[CallEvent],
    directory: &'a UserDirectory,
    role: CallRole,
) -> Vec<CallTally<'a>> {
    let mut tallies: Vec<CallTally<'a>> = directory
        .iter()
        .map(|user| CallTally {
            user,
            durations: calls
                .iter()
                .filter(|call| match role {
                    CallRole::Initiation => call.initiator_user_id == user.user_id,
                    CallRole::Participation => call.involves(&user.user_id),
                })
                .map(|call| call.duration_minutes)
                .collect(),
        })
        .collect();

    tallies.sort_by_key(|tally| Reverse(tally.count()));
    tallies
}
