//! Leaderboard aggregation.
//!
//! A plain group-by/sum over fetched score rows: one row per completed
//! module per user, collapsed into per-user totals and ranked by total
//! score. Ties break on user id so repeated aggregations of the same rows
//! produce the same order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::progress::UserId;

/// One fetched score row: a user's result for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRow {
    /// Scoring user.
    pub user_id: UserId,
    /// Module the score belongs to.
    pub module_id: String,
    /// Points earned.
    pub score: i64,
    /// School affiliation, when known.
    pub school_name: Option<String>,
    /// Class affiliation, when known.
    pub class_name: Option<String>,
}

/// One ranked leaderboard line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// User this line belongs to.
    pub user_id: UserId,
    /// Sum of the user's module scores.
    pub total_score: i64,
    /// Number of scored modules.
    pub modules_completed: usize,
    /// `total_score / modules_completed`, rounded to nearest.
    pub average_score: i64,
    /// School affiliation from the user's first row.
    pub school_name: Option<String>,
    /// Class affiliation from the user's first row.
    pub class_name: Option<String>,
}

/// Collapses score rows into a leaderboard, highest total first.
#[must_use]
pub fn aggregate(rows: &[ScoreRow]) -> Vec<LeaderboardEntry> {
    struct Acc {
        total: i64,
        count: usize,
        school_name: Option<String>,
        class_name: Option<String>,
    }

    let mut by_user: HashMap<UserId, Acc> = HashMap::new();
    for row in rows {
        let acc = by_user.entry(row.user_id).or_insert_with(|| Acc {
            total: 0,
            count: 0,
            school_name: row.school_name.clone(),
            class_name: row.class_name.clone(),
        });
        acc.total += row.score;
        acc.count += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = by_user
        .into_iter()
        .map(|(user_id, acc)| {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let average_score = (acc.total as f64 / acc.count as f64).round() as i64;
            LeaderboardEntry {
                user_id,
                total_score: acc.total,
                modules_completed: acc.count,
                average_score,
                school_name: acc.school_name,
                class_name: acc.class_name,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    entries
}

/// Keeps only rows from one school before ranking.
#[must_use]
pub fn aggregate_for_school(rows: &[ScoreRow], school: &str) -> Vec<LeaderboardEntry> {
    let filtered: Vec<ScoreRow> = rows
        .iter()
        .filter(|r| r.school_name.as_deref() == Some(school))
        .cloned()
        .collect();
    aggregate(&filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user: UserId, module: &str, score: i64) -> ScoreRow {
        ScoreRow {
            user_id: user,
            module_id: module.to_string(),
            score,
            school_name: Some("Riverside High".to_string()),
            class_name: Some("7B".to_string()),
        }
    }

    #[test]
    fn test_aggregate_sums_and_counts() {
        let alice = UserId::new();
        let bob = UserId::new();
        let rows = vec![
            row(alice, "flood", 80),
            row(alice, "fire", 61),
            row(bob, "flood", 90),
        ];

        let board = aggregate(&rows);
        assert_eq!(board.len(), 2);

        let alice_entry = board.iter().find(|e| e.user_id == alice).unwrap();
        assert_eq!(alice_entry.total_score, 141);
        assert_eq!(alice_entry.modules_completed, 2);
        assert_eq!(alice_entry.average_score, 71); // 70.5 rounds up
        assert_eq!(alice_entry.school_name.as_deref(), Some("Riverside High"));
    }

    #[test]
    fn test_aggregate_sorts_by_total_descending() {
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();
        let rows = vec![row(a, "m", 10), row(b, "m", 30), row(c, "m", 20)];

        let board = aggregate(&rows);
        let totals: Vec<i64> = board.iter().map(|e| e.total_score).collect();
        assert_eq!(totals, vec![30, 20, 10]);
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        let a = UserId::new();
        let b = UserId::new();
        let rows = vec![row(a, "m", 50), row(b, "m", 50)];

        let first = aggregate(&rows);
        let second = aggregate(&rows);
        assert_eq!(first, second);
        assert_eq!(first[0].user_id, a.min(b));
    }

    #[test]
    fn test_empty_rows_yield_empty_board() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_school_filter() {
        let a = UserId::new();
        let b = UserId::new();
        let mut other = row(b, "m", 99);
        other.school_name = Some("Hilltop".to_string());
        let rows = vec![row(a, "m", 10), other];

        let board = aggregate_for_school(&rows, "Riverside High");
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].user_id, a);
    }
}
