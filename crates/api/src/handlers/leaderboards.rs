//! Leaderboard endpoints: score writes, rank reads, pages and removals.
//!
//! All writes go through the ranking engine, which consults the identifier
//! expiration policy before touching storage and performs each mutation as
//! one atomic step. Reads never create state.

use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, put},
};
use garde::Validate;
use serde::Deserialize;
use shared::api::{
    AckEnvelope, CountEnvelope, IncrementScorePayload, MemberBatchEnvelope, MemberEnvelope,
    MemberListEnvelope, MembersScorePayload, RankEnvelope, ScorePayload,
};

use crate::{
    error::AppError,
    handlers::{page_size, serialize_member, serialize_members},
    models::{MemberScore, Order},
    services::LeaderboardService,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{leaderboard_id}", delete(remove_leaderboard))
        .route("/{leaderboard_id}/scores", put(bulk_upsert_scores))
        .route(
            "/{leaderboard_id}/members/{member_id}/score",
            put(upsert_score).patch(increment_score),
        )
        .route(
            "/{leaderboard_id}/members/{member_id}",
            get(get_member).delete(remove_member),
        )
        .route(
            "/{leaderboard_id}/members",
            get(get_members).delete(remove_members),
        )
        .route("/{leaderboard_id}/members/{member_id}/rank", get(get_rank))
        .route(
            "/{leaderboard_id}/members/{member_id}/around",
            get(get_around_member),
        )
        .route("/{leaderboard_id}/scores/{score}/around", get(get_around_score))
        .route("/{leaderboard_id}/members-count", get(total_members))
        .route("/{leaderboard_id}/top/{page_number}", get(get_top_members))
        .route(
            "/{leaderboard_id}/top-percent/{percentage}",
            get(get_top_percentage),
        )
}

fn service(state: &AppState) -> LeaderboardService {
    LeaderboardService::new(state.rankings.clone())
}

/// Write-side query parameters. `scoreTTL` is a duration in seconds here;
/// on read endpoints the same parameter name is a boolean flag.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteQuery {
    pub prev_rank: Option<bool>,
    #[serde(rename = "scoreTTL")]
    pub score_ttl: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadQuery {
    pub order: Option<String>,
    #[serde(rename = "scoreTTL")]
    pub score_ttl: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuery {
    pub ids: Option<String>,
    pub order: Option<String>,
    #[serde(rename = "scoreTTL")]
    pub score_ttl: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdsQuery {
    pub ids: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AroundQuery {
    pub order: Option<String>,
    pub get_last_if_not_found: Option<bool>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub order: Option<String>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub order: Option<String>,
}

fn split_ids(ids: Option<String>, missing: &'static str) -> Result<Vec<String>, AppError> {
    let ids = ids.unwrap_or_default();
    if ids.is_empty() {
        return Err(AppError::Validation(missing.to_string()));
    }
    Ok(ids.split(',').map(str::to_string).collect())
}

#[debug_handler]
async fn bulk_upsert_scores(
    State(state): State<AppState>,
    Path(leaderboard_id): Path<String>,
    Query(query): Query<WriteQuery>,
    Json(payload): Json<MembersScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let entries: Vec<MemberScore> = payload
        .members
        .into_iter()
        .map(|member| MemberScore {
            public_id: member.public_id,
            score: member.score,
        })
        .collect();

    let members = service(&state)
        .set_members_score(
            &leaderboard_id,
            entries,
            query.prev_rank.unwrap_or(false),
            query.score_ttl,
        )
        .await
        .map_err(AppError::from_ranking)?;

    tracing::info!(
        leaderboard = %leaderboard_id,
        members = members.len(),
        "scores updated"
    );

    Ok(Json(MemberListEnvelope {
        success: true,
        members: serialize_members(&members, false, query.score_ttl.is_some()),
    }))
}

#[debug_handler]
async fn upsert_score(
    State(state): State<AppState>,
    Path((leaderboard_id, member_id)): Path<(String, String)>,
    Query(query): Query<WriteQuery>,
    Json(payload): Json<ScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    let member = service(&state)
        .set_member_score(
            &leaderboard_id,
            &member_id,
            payload.score,
            query.prev_rank.unwrap_or(false),
            query.score_ttl,
        )
        .await
        .map_err(AppError::from_ranking)?;

    tracing::info!(
        leaderboard = %leaderboard_id,
        member = %member_id,
        score = payload.score,
        "score updated"
    );

    Ok(Json(MemberEnvelope {
        success: true,
        member: serialize_member(&member, None, query.score_ttl.is_some()),
    }))
}

#[debug_handler]
async fn increment_score(
    State(state): State<AppState>,
    Path((leaderboard_id, member_id)): Path<(String, String)>,
    Query(query): Query<WriteQuery>,
    Json(payload): Json<IncrementScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    let member = service(&state)
        .increment_member_score(
            &leaderboard_id,
            &member_id,
            payload.increment,
            query.score_ttl,
        )
        .await
        .map_err(AppError::from_ranking)?;

    tracing::info!(
        leaderboard = %leaderboard_id,
        member = %member_id,
        increment = payload.increment,
        "score incremented"
    );

    Ok(Json(MemberEnvelope {
        success: true,
        member: serialize_member(&member, None, query.score_ttl.is_some()),
    }))
}

#[debug_handler]
async fn get_member(
    State(state): State<AppState>,
    Path((leaderboard_id, member_id)): Path<(String, String)>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let include_ttl = query.score_ttl.unwrap_or(false);

    let member = service(&state)
        .get_member(
            &leaderboard_id,
            &member_id,
            Order::parse(query.order.as_deref()),
            include_ttl,
        )
        .await
        .map_err(AppError::from_ranking)?;

    Ok(Json(MemberEnvelope {
        success: true,
        member: serialize_member(&member, None, include_ttl),
    }))
}

#[debug_handler]
async fn get_members(
    State(state): State<AppState>,
    Path(leaderboard_id): Path<String>,
    Query(query): Query<BatchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ids = split_ids(
        query.ids,
        "Member IDs are required using the 'ids' querystring parameter",
    )?;
    let include_ttl = query.score_ttl.unwrap_or(false);

    let members = service(&state)
        .get_members(
            &leaderboard_id,
            &ids,
            Order::parse(query.order.as_deref()),
            include_ttl,
        )
        .await
        .map_err(AppError::from_ranking)?;

    let not_found: Vec<String> = ids
        .into_iter()
        .filter(|id| !members.iter().any(|member| member.public_id == *id))
        .collect();

    Ok(Json(MemberBatchEnvelope {
        success: true,
        members: serialize_members(&members, true, include_ttl),
        not_found,
    }))
}

#[debug_handler]
async fn get_rank(
    State(state): State<AppState>,
    Path((leaderboard_id, member_id)): Path<(String, String)>,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rank = service(&state)
        .get_rank(
            &leaderboard_id,
            &member_id,
            Order::parse(query.order.as_deref()),
        )
        .await
        .map_err(AppError::from_ranking)?;

    Ok(Json(RankEnvelope {
        success: true,
        public_id: member_id,
        rank,
    }))
}

#[debug_handler]
async fn get_around_member(
    State(state): State<AppState>,
    Path((leaderboard_id, member_id)): Path<(String, String)>,
    Query(query): Query<AroundQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page_size = page_size(&state.config, query.page_size)?;

    let members = service(&state)
        .get_around_member(
            &leaderboard_id,
            &member_id,
            Order::parse(query.order.as_deref()),
            query.get_last_if_not_found.unwrap_or(false),
            page_size,
        )
        .await
        .map_err(AppError::from_ranking)?;

    Ok(Json(MemberListEnvelope {
        success: true,
        members: serialize_members(&members, false, false),
    }))
}

#[debug_handler]
async fn get_around_score(
    State(state): State<AppState>,
    Path((leaderboard_id, score)): Path<(String, i64)>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page_size = page_size(&state.config, query.page_size)?;

    let members = service(&state)
        .get_around_score(
            &leaderboard_id,
            score,
            Order::parse(query.order.as_deref()),
            page_size,
        )
        .await
        .map_err(AppError::from_ranking)?;

    Ok(Json(MemberListEnvelope {
        success: true,
        members: serialize_members(&members, false, false),
    }))
}

#[debug_handler]
async fn total_members(
    State(state): State<AppState>,
    Path(leaderboard_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let count = service(&state)
        .total_members(&leaderboard_id)
        .await
        .map_err(AppError::from_ranking)?;

    Ok(Json(CountEnvelope {
        success: true,
        count,
    }))
}

#[debug_handler]
async fn get_top_members(
    State(state): State<AppState>,
    Path((leaderboard_id, page_number)): Path<(String, i64)>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page_size = page_size(&state.config, query.page_size)?;

    let members = service(&state)
        .get_leaders(
            &leaderboard_id,
            page_number,
            page_size,
            Order::parse(query.order.as_deref()),
        )
        .await
        .map_err(AppError::from_ranking)?;

    Ok(Json(MemberListEnvelope {
        success: true,
        members: serialize_members(&members, false, false),
    }))
}

#[debug_handler]
async fn get_top_percentage(
    State(state): State<AppState>,
    Path((leaderboard_id, percentage)): Path<(String, i64)>,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let members = service(&state)
        .get_top_percentage(
            &leaderboard_id,
            percentage,
            state.config.max_returned_members,
            Order::parse(query.order.as_deref()),
        )
        .await
        .map_err(AppError::from_ranking)?;

    Ok(Json(MemberListEnvelope {
        success: true,
        members: serialize_members(&members, false, false),
    }))
}

/// Removes a member. Succeeds even if the member never existed (idempotent).
#[debug_handler]
async fn remove_member(
    State(state): State<AppState>,
    Path((leaderboard_id, member_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    service(&state)
        .remove_members(&leaderboard_id, &[member_id.clone()])
        .await
        .map_err(AppError::from_ranking)?;

    tracing::info!(leaderboard = %leaderboard_id, member = %member_id, "member removed");

    Ok(Json(AckEnvelope { success: true }))
}

#[debug_handler]
async fn remove_members(
    State(state): State<AppState>,
    Path(leaderboard_id): Path<String>,
    Query(query): Query<IdsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ids = split_ids(
        query.ids,
        "Member IDs are required using the 'ids' querystring parameter",
    )?;

    service(&state)
        .remove_members(&leaderboard_id, &ids)
        .await
        .map_err(AppError::from_ranking)?;

    tracing::info!(leaderboard = %leaderboard_id, members = ids.len(), "members removed");

    Ok(Json(AckEnvelope { success: true }))
}

#[debug_handler]
async fn remove_leaderboard(
    State(state): State<AppState>,
    Path(leaderboard_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    service(&state)
        .remove_leaderboard(&leaderboard_id)
        .await
        .map_err(AppError::from_ranking)?;

    tracing::info!(leaderboard = %leaderboard_id, "leaderboard removed");

    Ok(Json(AckEnvelope { success: true }))
}
