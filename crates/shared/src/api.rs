//! Shared API request/response types for the leaderboard service.
//!
//! Every success envelope carries `"success": true`; member objects omit
//! `previousRank`, `position` and `expireAt` unless the endpoint produced
//! them, so consumers can rely on field presence instead of sentinels.

use garde::Validate;
use serde::{Deserialize, Serialize};

/// A member's score update within a bulk upsert.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MemberScorePayload {
    #[serde(rename = "publicID")]
    #[garde(length(min = 1))]
    pub public_id: String,
    #[garde(skip)]
    pub score: i64,
}

/// Set the score of a single member.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ScorePayload {
    #[garde(skip)]
    pub score: i64,
}

/// Increment a member's score by a (possibly negative) delta.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct IncrementScorePayload {
    #[garde(skip)]
    pub increment: i64,
}

/// Set the scores of several members of one leaderboard at once.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct MembersScorePayload {
    #[garde(length(min = 1), dive)]
    pub members: Vec<MemberScorePayload>,
}

/// Set one member's score in several leaderboards at once.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LeaderboardsScorePayload {
    #[garde(skip)]
    pub score: i64,
    #[garde(length(min = 1), inner(length(min = 1)))]
    pub leaderboards: Vec<String>,
}

/// A member as serialized in responses.
///
/// `rank` is 1-based. `previousRank` is present only when the caller asked
/// for it on a write (`-1` means the member did not exist before the write).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub score: i64,
    pub rank: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_rank: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<i64>,
}

/// Envelope for a single member (upsert, increment, get).
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberEnvelope {
    pub success: bool,
    #[serde(flatten)]
    pub member: MemberResponse,
}

/// Envelope for a list of members (leaders, around, top-percent, bulk upsert).
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberListEnvelope {
    pub success: bool,
    pub members: Vec<MemberResponse>,
}

/// Envelope for a batch get, including the ids that were not found.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBatchEnvelope {
    pub success: bool,
    pub members: Vec<MemberResponse>,
    pub not_found: Vec<String>,
}

/// Envelope for a rank lookup.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEnvelope {
    pub success: bool,
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub rank: i64,
}

/// Envelope for a member count.
#[derive(Debug, Serialize, Deserialize)]
pub struct CountEnvelope {
    pub success: bool,
    pub count: i64,
}

/// Envelope for operations with no payload (removals).
#[derive(Debug, Serialize, Deserialize)]
pub struct AckEnvelope {
    pub success: bool,
}

/// One leaderboard's result within a multi-leaderboard score write.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardScoreResponse {
    #[serde(rename = "leaderboardID")]
    pub leaderboard_id: String,
    #[serde(flatten)]
    pub member: MemberResponse,
}

/// Envelope for a multi-leaderboard score write.
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardScoresEnvelope {
    pub success: bool,
    pub scores: Vec<LeaderboardScoreResponse>,
}

/// One leaderboard's entry within a multi-leaderboard rank lookup.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLeaderboardRank {
    #[serde(rename = "leaderboardID")]
    pub leaderboard_id: String,
    pub rank: i64,
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<i64>,
}

/// Envelope for a multi-leaderboard rank lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberLeaderboardRanksEnvelope {
    pub success: bool,
    pub scores: Vec<MemberLeaderboardRank>,
}
