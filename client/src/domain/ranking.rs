//! Completion leaderboard.

use super::Profile;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingEntry {
    /// Ranked member.
    pub profile: Profile,
    /// Completed tasks assigned to the member.
    pub completed_count: u64,
}

/// Order entries by completed count, highest first. Ties keep input order.
#[must_use]
pub fn rank(mut entries: Vec<RankingEntry>) -> Vec<RankingEntry> {
    entries.sort_by(|a, b| b.completed_count.cmp(&a.completed_count));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Nickname, UserId};

    fn entry(name: &str, count: u64) -> RankingEntry {
        RankingEntry {
            profile: Profile {
                id: UserId::random(),
                nickname: Nickname::new(name).ok(),
                status_message: None,
            },
            completed_count: count,
        }
    }

    fn names(entries: &[RankingEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.profile.display_name("?")).collect()
    }

    #[test]
    fn sorts_descending_by_count() {
        let ranked = rank(vec![entry("P1", 3), entry("P2", 7), entry("P3", 0)]);
        assert_eq!(names(&ranked), ["P2", "P1", "P3"]);
    }

    #[test]
    fn ties_keep_fetch_order() {
        let ranked = rank(vec![entry("A", 2), entry("B", 5), entry("C", 2)]);
        assert_eq!(names(&ranked), ["B", "A", "C"]);
    }
}
