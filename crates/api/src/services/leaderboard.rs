//! The ranking engine.
//!
//! Composes the ranked store with the identifier expiration policy and owns
//! the rank arithmetic: storage ranks are 0-based, everything returned from
//! here is 1-based. Each write consults the expiration policy first, then
//! performs exactly one atomic compound operation on the store, so the rank
//! a caller gets back is the one observed at the instant of its own write.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::expiration::{self, ExpirationError};
use crate::models::{Member, MemberScore, Order};
use crate::stores::{RankingStore, WrittenEntry};

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("member {member} not found in leaderboard {leaderboard}")]
    MemberNotFound { leaderboard: String, member: String },
    #[error(transparent)]
    Expiration(#[from] ExpirationError),
    #[error("percentage must be between 1 and 100, got {0}")]
    InvalidPercentage(i64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn member_not_found(leaderboard: &str, member: &str) -> LeaderboardError {
    LeaderboardError::MemberNotFound {
        leaderboard: leaderboard.to_string(),
        member: member.to_string(),
    }
}

#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn RankingStore>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn RankingStore>) -> Self {
        Self { store }
    }

    /// Sets the scores of several members in one atomic write.
    ///
    /// With `capture_previous_rank`, each returned member carries the
    /// descending rank it held before the write; `-1` marks members created
    /// by this write. `score_ttl` additionally indexes each member for
    /// expiration `score_ttl` seconds from now.
    pub async fn set_members_score(
        &self,
        leaderboard: &str,
        entries: Vec<MemberScore>,
        capture_previous_rank: bool,
        score_ttl: Option<i64>,
    ) -> Result<Vec<Member>, LeaderboardError> {
        let now = Utc::now();
        let expiration =
            expiration::leaderboard_expiration(leaderboard, now)?.map(|at| at.timestamp());

        let written = self
            .store
            .set_scores(
                leaderboard,
                &entries,
                expiration,
                capture_previous_rank,
                score_ttl,
                now.timestamp(),
            )
            .await?;

        Ok(written
            .into_iter()
            .map(|entry| member_from_write(entry, capture_previous_rank))
            .collect())
    }

    /// Sets a single member's score. See [`set_members_score`](Self::set_members_score).
    pub async fn set_member_score(
        &self,
        leaderboard: &str,
        member: &str,
        score: i64,
        capture_previous_rank: bool,
        score_ttl: Option<i64>,
    ) -> Result<Member, LeaderboardError> {
        let entries = vec![MemberScore {
            public_id: member.to_string(),
            score,
        }];

        let mut members = self
            .set_members_score(leaderboard, entries, capture_previous_rank, score_ttl)
            .await?;

        members
            .pop()
            .ok_or_else(|| anyhow::anyhow!("score write returned no members").into())
    }

    /// Adds `delta` to a member's score, creating the member at `delta` if
    /// absent. The previous rank is not reported for increments.
    pub async fn increment_member_score(
        &self,
        leaderboard: &str,
        member: &str,
        delta: i64,
        score_ttl: Option<i64>,
    ) -> Result<Member, LeaderboardError> {
        let now = Utc::now();
        let expiration =
            expiration::leaderboard_expiration(leaderboard, now)?.map(|at| at.timestamp());

        let written = self
            .store
            .increment_score(
                leaderboard,
                member,
                delta,
                expiration,
                score_ttl,
                now.timestamp(),
            )
            .await?;

        Ok(member_from_write(written, false))
    }

    /// Rank and score of one member.
    pub async fn get_member(
        &self,
        leaderboard: &str,
        member: &str,
        order: Order,
        include_ttl: bool,
    ) -> Result<Member, LeaderboardError> {
        let entry = self
            .store
            .member_rank_and_score(leaderboard, member, order, include_ttl)
            .await?
            .ok_or_else(|| member_not_found(leaderboard, member))?;

        Ok(Member {
            public_id: entry.public_id,
            score: entry.score,
            rank: entry.rank + 1,
            previous_rank: 0,
            expire_at: entry.expire_at,
        })
    }

    /// Ranks and scores of several members, sorted by rank. Members that do
    /// not exist are omitted; the caller owns the complement.
    pub async fn get_members(
        &self,
        leaderboard: &str,
        members: &[String],
        order: Order,
        include_ttl: bool,
    ) -> Result<Vec<Member>, LeaderboardError> {
        let entries = self
            .store
            .members_rank_and_score(leaderboard, members, order, include_ttl)
            .await?;

        let mut found: Vec<Member> = entries
            .into_iter()
            .map(|entry| Member {
                public_id: entry.public_id,
                score: entry.score,
                rank: entry.rank + 1,
                previous_rank: 0,
                expire_at: entry.expire_at,
            })
            .collect();

        found.sort_by_key(|member| member.rank);
        Ok(found)
    }

    /// 1-based rank of a member.
    pub async fn get_rank(
        &self,
        leaderboard: &str,
        member: &str,
        order: Order,
    ) -> Result<i64, LeaderboardError> {
        let rank = self
            .store
            .rank(leaderboard, member, order)
            .await?
            .ok_or_else(|| member_not_found(leaderboard, member))?;

        Ok(rank + 1)
    }

    pub async fn total_members(&self, leaderboard: &str) -> Result<i64, LeaderboardError> {
        Ok(self.store.cardinality(leaderboard).await?)
    }

    /// One page of leaders. Pages are 1-based; a page past the end is empty.
    pub async fn get_leaders(
        &self,
        leaderboard: &str,
        page: i64,
        page_size: i64,
        order: Order,
    ) -> Result<Vec<Member>, LeaderboardError> {
        let page = page.max(1);

        let total = self.store.cardinality(leaderboard).await?;
        let total_pages = (total + page_size - 1) / page_size;
        if page > total_pages {
            return Ok(Vec::new());
        }

        let start = (page - 1) * page_size;
        self.ranked_page(leaderboard, start, start + page_size - 1, order)
            .await
    }

    /// A page of members around the given member.
    ///
    /// With `get_last_if_not_found`, an absent member is treated as ranked
    /// one past the end, yielding the last page.
    pub async fn get_around_member(
        &self,
        leaderboard: &str,
        member: &str,
        order: Order,
        get_last_if_not_found: bool,
        page_size: i64,
    ) -> Result<Vec<Member>, LeaderboardError> {
        let found = self.store.rank(leaderboard, member, order).await?;
        if found.is_none() && !get_last_if_not_found {
            return Err(member_not_found(leaderboard, member));
        }

        let total = self.store.cardinality(leaderboard).await?;
        let rank = found.map(|rank| rank + 1).unwrap_or(total + 1);

        // The 1-based rank seeds a 0-based start offset, and the clamp stop
        // is the cardinality itself, also taken as an index. Both are
        // long-standing behavior that paginated consumers depend on.
        let mut start = (rank - page_size / 2).max(0);
        let mut stop = start + page_size - 1;
        if total < stop {
            stop = total;
            start = (stop - page_size).max(0);
        }

        self.ranked_page(leaderboard, start, stop, order).await
    }

    /// A page of members around the given score: the window is anchored on
    /// the member with the greatest score not exceeding it.
    pub async fn get_around_score(
        &self,
        leaderboard: &str,
        score: i64,
        order: Order,
        page_size: i64,
    ) -> Result<Vec<Member>, LeaderboardError> {
        let closest = self
            .store
            .member_with_closest_score(leaderboard, score)
            .await?
            .unwrap_or_default();

        self.get_around_member(leaderboard, &closest, order, true, page_size)
            .await
    }

    /// The top `percentage`% of the leaderboard, never fewer than one member
    /// and never more than `max_members`.
    pub async fn get_top_percentage(
        &self,
        leaderboard: &str,
        percentage: i64,
        max_members: i64,
        order: Order,
    ) -> Result<Vec<Member>, LeaderboardError> {
        if !(1..=100).contains(&percentage) {
            return Err(LeaderboardError::InvalidPercentage(percentage));
        }

        let entries = self
            .store
            .top_percentage_slice(leaderboard, percentage, max_members, order)
            .await?;

        Ok(entries
            .into_iter()
            .map(|entry| Member {
                public_id: entry.public_id,
                score: entry.score,
                rank: entry.rank + 1,
                previous_rank: 0,
                expire_at: None,
            })
            .collect())
    }

    /// Removes members. Removing an absent member is not an error.
    pub async fn remove_members(
        &self,
        leaderboard: &str,
        members: &[String],
    ) -> Result<(), LeaderboardError> {
        self.store.remove_members(leaderboard, members).await?;
        Ok(())
    }

    /// Drops the whole leaderboard, TTL index included.
    pub async fn remove_leaderboard(&self, leaderboard: &str) -> Result<(), LeaderboardError> {
        self.store.remove_leaderboard(leaderboard).await?;
        Ok(())
    }

    async fn ranked_page(
        &self,
        leaderboard: &str,
        start: i64,
        stop: i64,
        order: Order,
    ) -> Result<Vec<Member>, LeaderboardError> {
        let entries = self
            .store
            .range_by_rank(leaderboard, start, stop, order)
            .await?;

        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(offset, (public_id, score))| Member {
                public_id,
                score,
                rank: start + offset as i64 + 1,
                previous_rank: 0,
                expire_at: None,
            })
            .collect())
    }
}

fn member_from_write(entry: WrittenEntry, capture_previous_rank: bool) -> Member {
    Member {
        public_id: entry.public_id,
        score: entry.score,
        rank: entry.rank + 1,
        previous_rank: if capture_previous_rank {
            entry.previous_rank + 1
        } else {
            0
        },
        expire_at: entry.expire_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{MockRankingStore, RankedEntry};

    fn service(store: MockRankingStore) -> LeaderboardService {
        LeaderboardService::new(Arc::new(store))
    }

    fn entries(pairs: &[(&str, i64)]) -> Vec<MemberScore> {
        pairs
            .iter()
            .map(|(public_id, score)| MemberScore {
                public_id: public_id.to_string(),
                score: *score,
            })
            .collect()
    }

    mod set_scores {
        use super::*;

        #[tokio::test]
        async fn maps_ranks_and_previous_ranks() {
            let mut store = MockRankingStore::new();
            store
                .expect_set_scores()
                .withf(|leaderboard, entries, expiration, capture, ttl, _now| {
                    leaderboard == "season1"
                        && entries.len() == 2
                        && expiration.is_none()
                        && *capture
                        && ttl.is_none()
                })
                .returning(|_, _, _, _, _, _| {
                    Ok(vec![
                        WrittenEntry {
                            public_id: "newcomer".to_string(),
                            rank: 2,
                            score: 10,
                            previous_rank: -2,
                            expire_at: None,
                        },
                        WrittenEntry {
                            public_id: "veteran".to_string(),
                            rank: 0,
                            score: 30,
                            previous_rank: 1,
                            expire_at: None,
                        },
                    ])
                });

            let members = service(store)
                .set_members_score(
                    "season1",
                    entries(&[("newcomer", 10), ("veteran", 30)]),
                    true,
                    None,
                )
                .await
                .unwrap();

            assert_eq!(members[0].rank, 3);
            assert_eq!(members[0].previous_rank, -1);
            assert_eq!(members[1].rank, 1);
            assert_eq!(members[1].previous_rank, 2);
        }

        #[tokio::test]
        async fn hides_previous_rank_when_not_requested() {
            let mut store = MockRankingStore::new();
            store.expect_set_scores().returning(|_, _, _, _, _, _| {
                Ok(vec![WrittenEntry {
                    public_id: "alice".to_string(),
                    rank: 0,
                    score: 10,
                    previous_rank: -2,
                    expire_at: None,
                }])
            });

            let member = service(store)
                .set_member_score("season1", "alice", 10, false, None)
                .await
                .unwrap();

            assert_eq!(member.previous_rank, 0);
            assert_eq!(member.score, 10);
            assert_eq!(member.rank, 1);
        }

        #[tokio::test]
        async fn passes_score_ttl_and_keeps_expire_at() {
            let mut store = MockRankingStore::new();
            store
                .expect_set_scores()
                .withf(|_, _, _, _, ttl, _| *ttl == Some(60))
                .returning(|_, _, _, _, _, now| {
                    Ok(vec![WrittenEntry {
                        public_id: "x".to_string(),
                        rank: 0,
                        score: 42,
                        previous_rank: -2,
                        expire_at: Some(now + 60),
                    }])
                });

            let member = service(store)
                .set_member_score("L4", "x", 42, false, Some(60))
                .await
                .unwrap();

            let expire_at = member.expire_at.unwrap();
            assert!(expire_at > Utc::now().timestamp());
        }

        #[tokio::test]
        async fn derives_the_leaderboard_expiration_from_the_identifier() {
            let mut store = MockRankingStore::new();
            store
                .expect_set_scores()
                .withf(|_, _, expiration, _, _, _| {
                    expiration.is_some_and(|at| at > Utc::now().timestamp())
                })
                .returning(|_, _, _, _, _, _| {
                    Ok(vec![WrittenEntry {
                        public_id: "m".to_string(),
                        rank: 0,
                        score: 1,
                        previous_rank: -2,
                        expire_at: None,
                    }])
                });

            service(store)
                .set_member_score("clash-year9999", "m", 1, false, None)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn rejects_expired_leaderboards_before_any_storage_work() {
            // No expectations: touching the store would panic the mock.
            let store = MockRankingStore::new();

            let err = service(store)
                .set_member_score("testyear2000", "m", 1, false, None)
                .await
                .unwrap_err();

            assert!(matches!(
                err,
                LeaderboardError::Expiration(ExpirationError::Expired { .. })
            ));
        }
    }

    mod increment {
        use super::*;

        #[tokio::test]
        async fn returns_the_post_increment_state() {
            let mut store = MockRankingStore::new();
            store
                .expect_increment_score()
                .withf(|leaderboard, member, delta, _, _, _| {
                    leaderboard == "L1" && member == "a" && *delta == 12
                })
                .returning(|_, member, _, _, _, _| {
                    Ok(WrittenEntry {
                        public_id: member.to_string(),
                        rank: 0,
                        score: 22,
                        previous_rank: -2,
                        expire_at: None,
                    })
                });

            let member = service(store)
                .increment_member_score("L1", "a", 12, None)
                .await
                .unwrap();

            assert_eq!(member.score, 22);
            assert_eq!(member.rank, 1);
            assert_eq!(member.previous_rank, 0);
        }
    }

    mod lookups {
        use super::*;

        #[tokio::test]
        async fn get_member_normalizes_the_rank() {
            let mut store = MockRankingStore::new();
            store
                .expect_member_rank_and_score()
                .returning(|_, member, _, _| {
                    Ok(Some(RankedEntry {
                        public_id: member.to_string(),
                        rank: 4,
                        score: 50,
                        expire_at: Some(1060),
                    }))
                });

            let member = service(store)
                .get_member("L1", "alice", Order::Desc, true)
                .await
                .unwrap();

            assert_eq!(member.rank, 5);
            assert_eq!(member.expire_at, Some(1060));
        }

        #[tokio::test]
        async fn get_member_surfaces_not_found() {
            let mut store = MockRankingStore::new();
            store
                .expect_member_rank_and_score()
                .returning(|_, _, _, _| Ok(None));

            let err = service(store)
                .get_member("L1", "ghost", Order::Desc, false)
                .await
                .unwrap_err();

            assert!(matches!(err, LeaderboardError::MemberNotFound { .. }));
        }

        #[tokio::test]
        async fn get_members_sorts_by_rank() {
            let mut store = MockRankingStore::new();
            store
                .expect_members_rank_and_score()
                .returning(|_, _, _, _| {
                    Ok(vec![
                        RankedEntry {
                            public_id: "slow".to_string(),
                            rank: 7,
                            score: 10,
                            expire_at: None,
                        },
                        RankedEntry {
                            public_id: "fast".to_string(),
                            rank: 1,
                            score: 90,
                            expire_at: None,
                        },
                    ])
                });

            let members = service(store)
                .get_members(
                    "L1",
                    &["slow".to_string(), "fast".to_string()],
                    Order::Desc,
                    false,
                )
                .await
                .unwrap();

            assert_eq!(members[0].public_id, "fast");
            assert_eq!(members[0].rank, 2);
            assert_eq!(members[1].public_id, "slow");
            assert_eq!(members[1].rank, 8);
        }

        #[tokio::test]
        async fn get_rank_is_one_based() {
            let mut store = MockRankingStore::new();
            store.expect_rank().returning(|_, _, _| Ok(Some(0)));

            let rank = service(store)
                .get_rank("L1", "top", Order::Desc)
                .await
                .unwrap();

            assert_eq!(rank, 1);
        }

        #[tokio::test]
        async fn get_rank_surfaces_not_found() {
            let mut store = MockRankingStore::new();
            store.expect_rank().returning(|_, _, _| Ok(None));

            let err = service(store)
                .get_rank("L1", "ghost", Order::Desc)
                .await
                .unwrap_err();

            assert!(matches!(err, LeaderboardError::MemberNotFound { .. }));
        }
    }

    mod leaders {
        use super::*;

        #[tokio::test]
        async fn first_page_gets_ranks_from_one() {
            let mut store = MockRankingStore::new();
            store.expect_cardinality().returning(|_| Ok(3));
            store
                .expect_range_by_rank()
                .withf(|_, start, stop, _| *start == 0 && *stop == 19)
                .returning(|_, _, _, _| {
                    Ok(vec![
                        ("b".to_string(), 20),
                        ("c".to_string(), 15),
                        ("a".to_string(), 10),
                    ])
                });

            let members = service(store)
                .get_leaders("L1", 1, 20, Order::Desc)
                .await
                .unwrap();

            assert_eq!(
                members
                    .iter()
                    .map(|m| (m.public_id.as_str(), m.score, m.rank))
                    .collect::<Vec<_>>(),
                vec![("b", 20, 1), ("c", 15, 2), ("a", 10, 3)]
            );
        }

        #[tokio::test]
        async fn page_below_one_is_coerced_to_the_first() {
            let mut store = MockRankingStore::new();
            store.expect_cardinality().returning(|_| Ok(5));
            store
                .expect_range_by_rank()
                .withf(|_, start, stop, _| *start == 0 && *stop == 1)
                .returning(|_, _, _, _| Ok(vec![("a".to_string(), 2), ("b".to_string(), 1)]));

            let members = service(store)
                .get_leaders("L1", -3, 2, Order::Desc)
                .await
                .unwrap();

            assert_eq!(members.len(), 2);
        }

        #[tokio::test]
        async fn page_past_the_end_is_empty() {
            let mut store = MockRankingStore::new();
            store.expect_cardinality().returning(|_| Ok(5));

            let members = service(store)
                .get_leaders("L1", 4, 2, Order::Desc)
                .await
                .unwrap();

            assert!(members.is_empty());
        }

        #[tokio::test]
        async fn later_pages_offset_the_ranks() {
            let mut store = MockRankingStore::new();
            store.expect_cardinality().returning(|_| Ok(5));
            store
                .expect_range_by_rank()
                .withf(|_, start, stop, _| *start == 2 && *stop == 3)
                .returning(|_, _, _, _| Ok(vec![("c".to_string(), 3), ("d".to_string(), 2)]));

            let members = service(store)
                .get_leaders("L1", 2, 2, Order::Desc)
                .await
                .unwrap();

            assert_eq!(members[0].rank, 3);
            assert_eq!(members[1].rank, 4);
        }
    }

    mod around {
        use super::*;

        #[tokio::test]
        async fn window_uses_the_historical_offset_math() {
            // Ten members scored 1..=10; the fifth from the bottom sits at
            // descending rank 6 (0-based 5), and the window starts at offset
            // rank - page_size / 2.
            let mut store = MockRankingStore::new();
            store.expect_rank().returning(|_, _, _| Ok(Some(5)));
            store.expect_cardinality().returning(|_| Ok(10));
            store
                .expect_range_by_rank()
                .withf(|_, start, stop, _| *start == 4 && *stop == 7)
                .returning(|_, _, _, _| {
                    Ok(vec![
                        ("m6".to_string(), 6),
                        ("m5".to_string(), 5),
                        ("m4".to_string(), 4),
                        ("m3".to_string(), 3),
                    ])
                });

            let members = service(store)
                .get_around_member("L2", "m5", Order::Desc, false, 4)
                .await
                .unwrap();

            assert_eq!(
                members.iter().map(|m| m.rank).collect::<Vec<_>>(),
                vec![5, 6, 7, 8]
            );
        }

        #[tokio::test]
        async fn window_clamps_at_the_top() {
            let mut store = MockRankingStore::new();
            store.expect_rank().returning(|_, _, _| Ok(Some(0)));
            store.expect_cardinality().returning(|_| Ok(10));
            store
                .expect_range_by_rank()
                .withf(|_, start, stop, _| *start == 0 && *stop == 3)
                .returning(|_, _, _, _| Ok(vec![("m10".to_string(), 10)]));

            service(store)
                .get_around_member("L2", "m10", Order::Desc, false, 4)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn window_clamps_at_the_bottom() {
            let mut store = MockRankingStore::new();
            store.expect_rank().returning(|_, _, _| Ok(Some(9)));
            store.expect_cardinality().returning(|_| Ok(10));
            store
                .expect_range_by_rank()
                .withf(|_, start, stop, _| *start == 6 && *stop == 10)
                .returning(|_, _, _, _| Ok(vec![("m1".to_string(), 1)]));

            service(store)
                .get_around_member("L2", "m1", Order::Desc, false, 4)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn missing_member_is_an_error_without_the_fallback() {
            let mut store = MockRankingStore::new();
            store.expect_rank().returning(|_, _, _| Ok(None));

            let err = service(store)
                .get_around_member("L2", "ghost", Order::Desc, false, 4)
                .await
                .unwrap_err();

            assert!(matches!(err, LeaderboardError::MemberNotFound { .. }));
        }

        #[tokio::test]
        async fn missing_member_lands_on_the_last_page_with_the_fallback() {
            let mut store = MockRankingStore::new();
            store.expect_rank().returning(|_, _, _| Ok(None));
            store.expect_cardinality().returning(|_| Ok(10));
            store
                .expect_range_by_rank()
                .withf(|_, start, stop, _| *start == 6 && *stop == 10)
                .returning(|_, _, _, _| Ok(vec![("m1".to_string(), 1)]));

            service(store)
                .get_around_member("L2", "ghost", Order::Desc, true, 4)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn around_score_anchors_on_the_closest_member() {
            let mut store = MockRankingStore::new();
            store
                .expect_member_with_closest_score()
                .withf(|_, score| *score == 7)
                .returning(|_, _| Ok(Some("m7".to_string())));
            store
                .expect_rank()
                .withf(|_, member, _| member == "m7")
                .returning(|_, _, _| Ok(Some(3)));
            store.expect_cardinality().returning(|_| Ok(10));
            store
                .expect_range_by_rank()
                .withf(|_, start, stop, _| *start == 2 && *stop == 5)
                .returning(|_, _, _, _| Ok(vec![("m8".to_string(), 8)]));

            service(store)
                .get_around_score("L2", 7, Order::Desc, 4)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn around_score_on_an_empty_leaderboard_is_empty() {
            let mut store = MockRankingStore::new();
            store
                .expect_member_with_closest_score()
                .returning(|_, _| Ok(None));
            store.expect_rank().returning(|_, _, _| Ok(None));
            store.expect_cardinality().returning(|_| Ok(0));
            store
                .expect_range_by_rank()
                .withf(|_, start, stop, _| *start == 0 && *stop == 0)
                .returning(|_, _, _, _| Ok(vec![]));

            let members = service(store)
                .get_around_score("empty", 100, Order::Desc, 4)
                .await
                .unwrap();

            assert!(members.is_empty());
        }
    }

    mod top_percentage {
        use super::*;

        #[tokio::test]
        async fn rejects_out_of_range_percentages() {
            for percentage in [0, -5, 101] {
                let err = service(MockRankingStore::new())
                    .get_top_percentage("L3", percentage, 2000, Order::Desc)
                    .await
                    .unwrap_err();

                assert!(matches!(err, LeaderboardError::InvalidPercentage(p) if p == percentage));
            }
        }

        #[tokio::test]
        async fn maps_slice_ranks() {
            let mut store = MockRankingStore::new();
            store
                .expect_top_percentage_slice()
                .withf(|_, percentage, max_members, _| *percentage == 5 && *max_members == 2000)
                .returning(|_, _, _, _| {
                    Ok((0..5)
                        .map(|offset| RankedEntry {
                            public_id: format!("m{}", 100 - offset),
                            rank: offset,
                            score: 100 - offset,
                            expire_at: None,
                        })
                        .collect())
                });

            let members = service(store)
                .get_top_percentage("L3", 5, 2000, Order::Desc)
                .await
                .unwrap();

            assert_eq!(members.len(), 5);
            assert_eq!(members[0].rank, 1);
            assert_eq!(members[4].rank, 5);
        }
    }

    mod removal {
        use super::*;

        #[tokio::test]
        async fn removing_absent_members_is_not_an_error() {
            let mut store = MockRankingStore::new();
            store.expect_remove_members().returning(|_, _| Ok(0));

            service(store)
                .remove_members("L1", &["ghost".to_string()])
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn remove_leaderboard_delegates_to_the_store() {
            let mut store = MockRankingStore::new();
            store
                .expect_remove_leaderboard()
                .withf(|leaderboard| leaderboard == "L1")
                .times(1)
                .returning(|_| Ok(()));

            service(store).remove_leaderboard("L1").await.unwrap();
        }
    }
}
