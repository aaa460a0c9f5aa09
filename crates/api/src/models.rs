use serde::{Deserialize, Serialize};

/// A member of a leaderboard with its rank resolved.
///
/// `rank` and `previous_rank` are 1-based. `previous_rank` is 0 unless the
/// write that produced this member asked for it; `-1` means the member did
/// not exist before that write. `expire_at` is the absolute epoch at which
/// the score expires, when a score TTL applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub public_id: String,
    pub score: i64,
    pub rank: i64,
    pub previous_rank: i64,
    pub expire_at: Option<i64>,
}

/// A score write for one member, before ranks are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberScore {
    pub public_id: String,
    pub score: i64,
}

/// Ranking direction. `Desc` ranks the largest score first and is the
/// default everywhere an order is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    /// Normalizes a query-string value: only `"asc"` selects ascending,
    /// anything else (including absence) falls back to descending.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("asc") => Order::Asc,
            _ => Order::Desc,
        }
    }
}
