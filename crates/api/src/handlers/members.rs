//! Member-centric endpoints spanning several leaderboards.
//!
//! The multi-leaderboard write is intentionally not atomic across boards:
//! each leaderboard gets its own atomic write, in payload order, and a
//! failure aborts the loop with the earlier boards already updated. Callers
//! must treat it as at-least-once per leaderboard.

use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::put,
};
use garde::Validate;
use serde::Deserialize;
use shared::api::{
    LeaderboardScoreResponse, LeaderboardScoresEnvelope, LeaderboardsScorePayload,
    MemberLeaderboardRank, MemberLeaderboardRanksEnvelope,
};

use crate::{
    error::AppError,
    handlers::serialize_member,
    models::Order,
    services::LeaderboardService,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{member_id}/scores",
        put(upsert_score_in_leaderboards).get(get_ranks_in_leaderboards),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteQuery {
    pub prev_rank: Option<bool>,
    #[serde(rename = "scoreTTL")]
    pub score_ttl: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RanksQuery {
    pub leaderboard_ids: Option<String>,
    pub order: Option<String>,
    #[serde(rename = "scoreTTL")]
    pub score_ttl: Option<bool>,
}

#[debug_handler]
async fn upsert_score_in_leaderboards(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Query(query): Query<WriteQuery>,
    Json(payload): Json<LeaderboardsScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = LeaderboardService::new(state.rankings.clone());
    let mut scores = Vec::with_capacity(payload.leaderboards.len());

    for leaderboard_id in &payload.leaderboards {
        let member = service
            .set_member_score(
                leaderboard_id,
                &member_id,
                payload.score,
                query.prev_rank.unwrap_or(false),
                query.score_ttl,
            )
            .await
            .map_err(AppError::from_ranking)?;

        scores.push(LeaderboardScoreResponse {
            leaderboard_id: leaderboard_id.clone(),
            member: serialize_member(&member, None, query.score_ttl.is_some()),
        });
    }

    tracing::info!(
        member = %member_id,
        leaderboards = scores.len(),
        score = payload.score,
        "score updated across leaderboards"
    );

    Ok(Json(LeaderboardScoresEnvelope {
        success: true,
        scores,
    }))
}

#[debug_handler]
async fn get_ranks_in_leaderboards(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Query(query): Query<RanksQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ids = query.leaderboard_ids.unwrap_or_default();
    if ids.is_empty() {
        return Err(AppError::Validation(
            "Leaderboard IDs are required using the 'leaderboardIds' querystring parameter"
                .to_string(),
        ));
    }

    let include_ttl = query.score_ttl.unwrap_or(false);
    let order = Order::parse(query.order.as_deref());
    let service = LeaderboardService::new(state.rankings.clone());

    let mut scores = Vec::new();
    for leaderboard_id in ids.split(',') {
        let member = service
            .get_member(leaderboard_id, &member_id, order, include_ttl)
            .await
            .map_err(AppError::from_ranking)?;

        scores.push(MemberLeaderboardRank {
            leaderboard_id: leaderboard_id.to_string(),
            rank: member.rank,
            score: member.score,
            expire_at: include_ttl.then_some(member.expire_at.unwrap_or(0)),
        });
    }

    Ok(Json(MemberLeaderboardRanksEnvelope {
        success: true,
        scores,
    }))
}
