//! HTTP endpoints.
//!
//! ## Routes
//!
//! ```text
//! GET    /healthcheck                                     service health
//! DELETE /l/{leaderboard}                                 drop a leaderboard
//! PUT    /l/{leaderboard}/scores                          bulk upsert scores
//! PUT    /l/{leaderboard}/members/{member}/score          upsert one score
//! PATCH  /l/{leaderboard}/members/{member}/score          increment one score
//! GET    /l/{leaderboard}/members/{member}                member rank + score
//! DELETE /l/{leaderboard}/members/{member}                remove a member
//! GET    /l/{leaderboard}/members?ids=a,b                 batch rank + score
//! DELETE /l/{leaderboard}/members?ids=a,b                 bulk remove
//! GET    /l/{leaderboard}/members/{member}/rank           rank only
//! GET    /l/{leaderboard}/members/{member}/around         page around a member
//! GET    /l/{leaderboard}/scores/{score}/around           page around a score
//! GET    /l/{leaderboard}/members-count                   cardinality
//! GET    /l/{leaderboard}/top/{page}                      leaders page
//! GET    /l/{leaderboard}/top-percent/{percentage}        top slice
//! PUT    /m/{member}/scores                               upsert in many leaderboards
//! GET    /m/{member}/scores?leaderboardIds=a,b            rank in many leaderboards
//! ```
//!
//! Handlers normalize `order` (anything but `asc` means `desc`), default and
//! cap `pageSize`, and serialize members per the wire contract.

pub mod health;
pub mod leaderboards;
pub mod members;

use shared::api::MemberResponse;

use crate::config::Config;
use crate::error::AppError;
use crate::models::Member;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Resolves the requested page size against the configured hard cap.
pub fn page_size(config: &Config, requested: Option<i64>) -> Result<i64, AppError> {
    let size = requested.unwrap_or(DEFAULT_PAGE_SIZE);

    if size < 1 {
        return Err(AppError::Validation(format!(
            "pageSize must be at least 1. pageSize requested: {}",
            size
        )));
    }
    if size > config.max_returned_members {
        return Err(AppError::Validation(format!(
            "Max pageSize allowed: {}. pageSize requested: {}",
            config.max_returned_members, size
        )));
    }

    Ok(size)
}

/// Serializes one member per the wire contract: `previousRank` only when a
/// write captured it, `position` only on paging endpoints that ask for it,
/// `expireAt` only when the score TTL was requested.
pub fn serialize_member(
    member: &Member,
    position: Option<usize>,
    include_ttl: bool,
) -> MemberResponse {
    MemberResponse {
        public_id: member.public_id.clone(),
        score: member.score,
        rank: member.rank,
        previous_rank: (member.previous_rank != 0).then_some(member.previous_rank),
        position,
        expire_at: include_ttl.then_some(member.expire_at.unwrap_or(0)),
    }
}

/// Serializes a list of members, numbering positions when asked.
pub fn serialize_members(
    members: &[Member],
    include_position: bool,
    include_ttl: bool,
) -> Vec<MemberResponse> {
    members
        .iter()
        .enumerate()
        .map(|(position, member)| {
            serialize_member(member, include_position.then_some(position), include_ttl)
        })
        .collect()
}
