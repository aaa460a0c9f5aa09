//! Ranked storage for Redis (sorted sets).
//!
//! Each leaderboard is a sorted set keyed by its identifier. Score TTLs live
//! in a sibling sorted set, and every TTL index key is registered in a
//! process-wide set an external reaper can enumerate:
//!
//! ```text
//! <leaderboard>        → sorted set {member → score}
//! <leaderboard>:ttl    → sorted set {member → expiration epoch}
//! expiration-sets      → set of TTL index keys
//! ```
//!
//! Compound operations run as Lua scripts so a write and the rank reads it
//! implies are one atomic step; no other client can touch the keys in
//! between. Members with equal scores are ordered lexicographically by id
//! (the sorted-set secondary order), which holds in both directions.
//!
//! Ranks returned from this layer are 0-based throughout; the engine
//! normalizes them.

use anyhow::{Result, bail};
use async_trait::async_trait;
use redis::{AsyncCommands, Script, Value};

use crate::models::{MemberScore, Order};

/// A member's state immediately after a score write. `previous_rank` is the
/// 0-based descending rank before the write, `-2` when the member was absent,
/// and only meaningful when the write captured previous ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenEntry {
    pub public_id: String,
    pub rank: i64,
    pub score: i64,
    pub previous_rank: i64,
    pub expire_at: Option<i64>,
}

/// A member's rank and score as read by a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub public_id: String,
    pub rank: i64,
    pub score: i64,
    pub expire_at: Option<i64>,
}

/// Store for ranked leaderboard data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankingStore: Send + Sync {
    /// Health check - verify Redis connectivity.
    async fn health_check(&self) -> Result<bool>;

    /// Upserts scores, applies the leaderboard expiration (first write only),
    /// indexes score TTLs, and reads back the new descending ranks, all in
    /// one atomic step.
    async fn set_scores(
        &self,
        leaderboard: &str,
        entries: &[MemberScore],
        expiration: Option<i64>,
        capture_previous_rank: bool,
        score_ttl: Option<i64>,
        now: i64,
    ) -> Result<Vec<WrittenEntry>>;

    /// Same compound shape as [`set_scores`](RankingStore::set_scores), but
    /// adds the delta to the member's current score.
    async fn increment_score(
        &self,
        leaderboard: &str,
        member: &str,
        delta: i64,
        expiration: Option<i64>,
        score_ttl: Option<i64>,
        now: i64,
    ) -> Result<WrittenEntry>;

    /// Reads one member's rank and score (and score TTL when asked)
    /// atomically. `None` when the member is absent.
    async fn member_rank_and_score(
        &self,
        leaderboard: &str,
        member: &str,
        order: Order,
        include_ttl: bool,
    ) -> Result<Option<RankedEntry>>;

    /// Batch form of [`member_rank_and_score`]; absent members are omitted
    /// from the result.
    async fn members_rank_and_score(
        &self,
        leaderboard: &str,
        members: &[String],
        order: Order,
        include_ttl: bool,
    ) -> Result<Vec<RankedEntry>>;

    /// 0-based rank of a member, `None` when absent.
    async fn rank(&self, leaderboard: &str, member: &str, order: Order) -> Result<Option<i64>>;

    /// Members at 0-based positions `start..=stop` with their scores.
    async fn range_by_rank(
        &self,
        leaderboard: &str,
        start: i64,
        stop: i64,
        order: Order,
    ) -> Result<Vec<(String, i64)>>;

    /// The member with the greatest score less than or equal to `score`.
    async fn member_with_closest_score(
        &self,
        leaderboard: &str,
        score: i64,
    ) -> Result<Option<String>>;

    async fn cardinality(&self, leaderboard: &str) -> Result<i64>;

    /// Top `floor(total * percentage / 100)` members (at least one, at most
    /// `max_members`), with ranks, in one atomic step.
    async fn top_percentage_slice(
        &self,
        leaderboard: &str,
        percentage: i64,
        max_members: i64,
        order: Order,
    ) -> Result<Vec<RankedEntry>>;

    /// Removes members; returns how many actually existed.
    async fn remove_members(&self, leaderboard: &str, members: &[String]) -> Result<i64>;

    /// Drops the leaderboard and its TTL index in one atomic `DEL`. The
    /// registry entry is left for the reaper.
    async fn remove_leaderboard(&self, leaderboard: &str) -> Result<()>;

    /// Remaining lifetime of the leaderboard key in seconds; `-1` when no
    /// expiration is set, `-2` when the leaderboard does not exist.
    async fn expiration_seconds(&self, leaderboard: &str) -> Result<i64>;
}

/// Redis implementation of RankingStore.
#[derive(Clone)]
pub struct RedisRankingStore {
    client: redis::Client,
}

/// Compound write: set or increment scores, capture previous ranks, apply
/// the leaderboard expiration once, index score TTLs, read back new ranks.
///
/// KEYS[1] leaderboard key.
/// ARGV[1] members JSON `[{"publicID": …, "score": …}, …]`.
/// ARGV[2] leaderboard expiration epoch, -1 for none.
/// ARGV[3] "1" to capture previous descending ranks.
/// ARGV[4] score TTL in seconds, -1 for none.
/// ARGV[5] current epoch.
/// ARGV[6] write command, ZADD or ZINCRBY.
const WRITE_SCORES_LUA: &str = r#"
local members = cjson.decode(ARGV[1])
local score_ttl = tonumber(ARGV[4])

local args = {}
for _, member in ipairs(members) do
    table.insert(args, member["score"])
    table.insert(args, member["publicID"])
    if ARGV[3] == "1" then
        member["previousRank"] =
            tonumber(redis.call("ZREVRANK", KEYS[1], member["publicID"])) or -2
    end
end
redis.call(ARGV[6], KEYS[1], unpack(args))

if ARGV[2] ~= "-1" then
    local current = redis.call("TTL", KEYS[1])
    if current == -2 then
        return redis.error_reply("leaderboard key missing after write")
    end
    if current == -1 then
        redis.call("EXPIREAT", KEYS[1], ARGV[2])
    end
end

local expire_at = -1
if score_ttl >= 0 then
    local ttl_key = KEYS[1] .. ":ttl"
    expire_at = tonumber(ARGV[5]) + score_ttl
    local ttl_args = {}
    for _, member in ipairs(members) do
        table.insert(ttl_args, expire_at)
        table.insert(ttl_args, member["publicID"])
    end
    redis.call("ZADD", ttl_key, unpack(ttl_args))
    redis.call("SADD", "expiration-sets", ttl_key)
end

local reply = {}
for _, member in ipairs(members) do
    table.insert(reply, member["publicID"])
    table.insert(reply, tonumber(redis.call("ZREVRANK", KEYS[1], member["publicID"])))
    table.insert(reply, tonumber(redis.call("ZSCORE", KEYS[1], member["publicID"])))
    table.insert(reply, member["previousRank"] or -2)
    table.insert(reply, expire_at)
end
return reply
"#;

/// Atomic rank + score (+ score TTL) lookup for one member.
///
/// KEYS[1] leaderboard key, KEYS[2] member id.
/// ARGV[1] rank command, ZREVRANK or ZRANK.
/// ARGV[2] "1" to read the score TTL.
const READ_MEMBER_LUA: &str = r#"
local rank = redis.call(ARGV[1], KEYS[1], KEYS[2])
local score = redis.call("ZSCORE", KEYS[1], KEYS[2])
if ARGV[2] == "1" then
    return {rank, score, redis.call("ZSCORE", KEYS[1] .. ":ttl", KEYS[2])}
end
return {rank, score}
"#;

/// Atomic rank + score (+ score TTL) lookup for a comma-separated id list.
///
/// KEYS[1] leaderboard key.
/// ARGV[1] comma-separated member ids.
/// ARGV[2] rank command, ZREVRANK or ZRANK.
/// ARGV[3] "1" to read score TTLs.
const READ_MEMBERS_LUA: &str = r#"
local reply = {}
for public_id in string.gmatch(ARGV[1], '([^,]+)') do
    table.insert(reply, public_id)
    table.insert(reply, redis.call(ARGV[2], KEYS[1], public_id))
    table.insert(reply, redis.call("ZSCORE", KEYS[1], public_id))
    if ARGV[3] == "1" then
        table.insert(reply, redis.call("ZSCORE", KEYS[1] .. ":ttl", public_id))
    else
        table.insert(reply, -1)
    end
end
return reply
"#;

/// Atomic top-percentage slice: cardinality, slice size, range, ranks.
///
/// KEYS[1] leaderboard key.
/// ARGV[1] integer percentage in [1, 100].
/// ARGV[2] maximum number of members returned.
/// ARGV[3] range command, ZREVRANGE or ZRANGE.
/// ARGV[4] rank command, ZREVRANK or ZRANK.
const TOP_PERCENTAGE_LUA: &str = r#"
local total = redis.call("ZCARD", KEYS[1])
local wanted = math.floor(total * ARGV[1] / 100)
if wanted < 1 then
    wanted = 1
end
if wanted > tonumber(ARGV[2]) then
    wanted = tonumber(ARGV[2])
end

local entries = redis.call(ARGV[3], KEYS[1], 0, wanted - 1, "WITHSCORES")
local reply = {}
for i = 1, #entries, 2 do
    table.insert(reply, entries[i])
    table.insert(reply, redis.call(ARGV[4], KEYS[1], entries[i]))
    table.insert(reply, tonumber(entries[i + 1]))
end
return reply
"#;

impl RedisRankingStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn ttl_index_key(leaderboard: &str) -> String {
        format!("{}:ttl", leaderboard)
    }

    fn members_json(entries: &[MemberScore]) -> String {
        let members: Vec<serde_json::Value> = entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "publicID": entry.public_id,
                    "score": entry.score,
                })
            })
            .collect();
        serde_json::Value::Array(members).to_string()
    }

    async fn run_write_script(
        &self,
        leaderboard: &str,
        entries: &[MemberScore],
        expiration: Option<i64>,
        capture_previous_rank: bool,
        score_ttl: Option<i64>,
        now: i64,
        command: &str,
    ) -> Result<Vec<WrittenEntry>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let values: Vec<Value> = Script::new(WRITE_SCORES_LUA)
            .key(leaderboard)
            .arg(Self::members_json(entries))
            .arg(expiration.unwrap_or(-1))
            .arg(if capture_previous_rank { "1" } else { "0" })
            .arg(score_ttl.unwrap_or(-1))
            .arg(now)
            .arg(command)
            .invoke_async(&mut conn)
            .await?;

        values.chunks(5).map(written_entry).collect()
    }
}

#[async_trait]
impl RankingStore for RedisRankingStore {
    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }

    async fn set_scores(
        &self,
        leaderboard: &str,
        entries: &[MemberScore],
        expiration: Option<i64>,
        capture_previous_rank: bool,
        score_ttl: Option<i64>,
        now: i64,
    ) -> Result<Vec<WrittenEntry>> {
        self.run_write_script(
            leaderboard,
            entries,
            expiration,
            capture_previous_rank,
            score_ttl,
            now,
            "ZADD",
        )
        .await
    }

    async fn increment_score(
        &self,
        leaderboard: &str,
        member: &str,
        delta: i64,
        expiration: Option<i64>,
        score_ttl: Option<i64>,
        now: i64,
    ) -> Result<WrittenEntry> {
        let entries = [MemberScore {
            public_id: member.to_string(),
            score: delta,
        }];

        let mut written = self
            .run_write_script(
                leaderboard,
                &entries,
                expiration,
                false,
                score_ttl,
                now,
                "ZINCRBY",
            )
            .await?;

        match written.pop() {
            Some(entry) if written.is_empty() => Ok(entry),
            _ => bail!("increment script returned an unexpected number of entries"),
        }
    }

    async fn member_rank_and_score(
        &self,
        leaderboard: &str,
        member: &str,
        order: Order,
        include_ttl: bool,
    ) -> Result<Option<RankedEntry>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let values: Vec<Value> = Script::new(READ_MEMBER_LUA)
            .key(leaderboard)
            .key(member)
            .arg(rank_command(order))
            .arg(if include_ttl { "1" } else { "0" })
            .invoke_async(&mut conn)
            .await?;

        let (Some(rank), Some(score)) = (
            values.first().map(optional_int).transpose()?.flatten(),
            values.get(1).map(optional_int).transpose()?.flatten(),
        ) else {
            return Ok(None);
        };

        let expire_at = values.get(2).map(optional_int).transpose()?.flatten();

        Ok(Some(RankedEntry {
            public_id: member.to_string(),
            rank,
            score,
            expire_at,
        }))
    }

    async fn members_rank_and_score(
        &self,
        leaderboard: &str,
        members: &[String],
        order: Order,
        include_ttl: bool,
    ) -> Result<Vec<RankedEntry>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let values: Vec<Value> = Script::new(READ_MEMBERS_LUA)
            .key(leaderboard)
            .arg(members.join(","))
            .arg(rank_command(order))
            .arg(if include_ttl { "1" } else { "0" })
            .invoke_async(&mut conn)
            .await?;

        let mut entries = Vec::new();
        for chunk in values.chunks(4) {
            let [id, rank, score, expire_at] = chunk else {
                bail!("member lookup script returned a truncated entry");
            };

            let (Some(rank), Some(score)) = (optional_int(rank)?, optional_int(score)?) else {
                continue;
            };

            entries.push(RankedEntry {
                public_id: string_value(id)?,
                rank,
                score,
                expire_at: optional_int(expire_at)?.filter(|at| *at >= 0),
            });
        }

        Ok(entries)
    }

    async fn rank(&self, leaderboard: &str, member: &str, order: Order) -> Result<Option<i64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let rank: Option<i64> = redis::cmd(rank_command(order))
            .arg(leaderboard)
            .arg(member)
            .query_async(&mut conn)
            .await?;

        Ok(rank)
    }

    async fn range_by_rank(
        &self,
        leaderboard: &str,
        start: i64,
        stop: i64,
        order: Order,
    ) -> Result<Vec<(String, i64)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let command = match order {
            Order::Desc => "ZREVRANGE",
            Order::Asc => "ZRANGE",
        };

        let entries: Vec<(String, i64)> = redis::cmd(command)
            .arg(leaderboard)
            .arg(start)
            .arg(stop)
            .arg("WITHSCORES")
            .query_async(&mut conn)
            .await?;

        Ok(entries)
    }

    async fn member_with_closest_score(
        &self,
        leaderboard: &str,
        score: i64,
    ) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let members: Vec<String> = redis::cmd("ZREVRANGEBYSCORE")
            .arg(leaderboard)
            .arg(score)
            .arg("-inf")
            .arg("LIMIT")
            .arg(0)
            .arg(1)
            .query_async(&mut conn)
            .await?;

        Ok(members.into_iter().next())
    }

    async fn cardinality(&self, leaderboard: &str) -> Result<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let total: i64 = conn.zcard(leaderboard).await?;
        Ok(total)
    }

    async fn top_percentage_slice(
        &self,
        leaderboard: &str,
        percentage: i64,
        max_members: i64,
        order: Order,
    ) -> Result<Vec<RankedEntry>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let range_command = match order {
            Order::Desc => "ZREVRANGE",
            Order::Asc => "ZRANGE",
        };

        let values: Vec<Value> = Script::new(TOP_PERCENTAGE_LUA)
            .key(leaderboard)
            .arg(percentage)
            .arg(max_members)
            .arg(range_command)
            .arg(rank_command(order))
            .invoke_async(&mut conn)
            .await?;

        values
            .chunks(3)
            .map(|chunk| {
                let [id, rank, score] = chunk else {
                    bail!("top percentage script returned a truncated entry");
                };
                Ok(RankedEntry {
                    public_id: string_value(id)?,
                    rank: int_value(rank)?,
                    score: int_value(score)?,
                    expire_at: None,
                })
            })
            .collect()
    }

    async fn remove_members(&self, leaderboard: &str, members: &[String]) -> Result<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let removed: i64 = conn.zrem(leaderboard, members).await?;
        Ok(removed)
    }

    async fn remove_leaderboard(&self, leaderboard: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .del(vec![leaderboard.to_string(), Self::ttl_index_key(leaderboard)])
            .await?;
        Ok(())
    }

    async fn expiration_seconds(&self, leaderboard: &str) -> Result<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let remaining: i64 = conn.ttl(leaderboard).await?;
        Ok(remaining)
    }
}

fn rank_command(order: Order) -> &'static str {
    match order {
        Order::Desc => "ZREVRANK",
        Order::Asc => "ZRANK",
    }
}

fn written_entry(chunk: &[Value]) -> Result<WrittenEntry> {
    let [id, rank, score, previous_rank, expire_at] = chunk else {
        bail!("write script returned a truncated entry");
    };

    Ok(WrittenEntry {
        public_id: string_value(id)?,
        rank: int_value(rank)?,
        score: int_value(score)?,
        previous_rank: int_value(previous_rank)?,
        expire_at: optional_int(expire_at)?.filter(|at| *at >= 0),
    })
}

fn int_value(value: &Value) -> Result<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::BulkString(bytes) => Ok(std::str::from_utf8(bytes)?.parse()?),
        other => bail!("expected an integer reply, got {:?}", other),
    }
}

fn optional_int(value: &Value) -> Result<Option<i64>> {
    match value {
        Value::Nil => Ok(None),
        other => int_value(other).map(Some),
    }
}

fn string_value(value: &Value) -> Result<String> {
    match value {
        Value::BulkString(bytes) => Ok(String::from_utf8(bytes.to_vec())?),
        Value::SimpleString(text) => Ok(text.clone()),
        other => bail!("expected a string reply, got {:?}", other),
    }
}
