//! Server-side Lua scripts.
//!
//! Every script receives the same four keys (see [`RoomKeys::as_array`]):
//! `KEYS[1]` active set, `KEYS[2]` queue, `KEYS[3]` queue deadlines,
//! `KEYS[4]` queue sequence counter. Each one evicts expired entries before
//! doing its own work, so TTLs need no background sweeper.
//!
//! Deadlines are measured against the Redis server clock (`TIME`), never a
//! caller's, so gateways with skewed clocks agree on what has expired.
//! Requires effect replication (the default since Redis 5).
//!
//! [`RoomKeys::as_array`]: crate::config::RoomKeys::as_array

/// Shared prologue: read the server clock, then drop active slots and queue
/// entries whose deadline passed.
macro_rules! with_purge {
    ($body:literal) => {
        concat!(
            r#"
local clock = redis.call('TIME')
local now = tonumber(clock[1]) * 1000 + math.floor(tonumber(clock[2]) / 1000)
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', now)
local expired = redis.call('ZRANGEBYSCORE', KEYS[3], '-inf', now)
for _, member in ipairs(expired) do
    redis.call('ZREM', KEYS[2], member)
end
if #expired > 0 then
    redis.call('ZREMRANGEBYSCORE', KEYS[3], '-inf', now)
end
"#,
            $body
        )
    };
}

/// ARGV: token, max_active, ttl_ms, respect_queue (0/1).
/// Returns 1 when the token holds an active slot afterwards.
pub const TRY_ADMIT: &str = with_purge!(
    r#"
local token = ARGV[1]
local max_active = tonumber(ARGV[2])
local ttl = tonumber(ARGV[3])

if redis.call('ZSCORE', KEYS[1], token) then
    redis.call('ZADD', KEYS[1], now + ttl, token)
    return 1
end

if ARGV[4] == '1' then
    local ahead = redis.call('ZCARD', KEYS[2])
    local rank = redis.call('ZRANK', KEYS[2], token)
    if rank then
        ahead = rank
    end
    if ahead > 0 then
        return 0
    end
end

if redis.call('ZCARD', KEYS[1]) >= max_active then
    return 0
end

redis.call('ZADD', KEYS[1], now + ttl, token)
redis.call('ZREM', KEYS[2], token)
redis.call('ZREM', KEYS[3], token)
return 1
"#
);

/// ARGV: token, ttl_ms. Returns 1 if the token was active.
pub const REFRESH_ACTIVE: &str = with_purge!(
    r#"
local token = ARGV[1]
if redis.call('ZSCORE', KEYS[1], token) then
    redis.call('ZADD', KEYS[1], 'XX', now + tonumber(ARGV[2]), token)
    return 1
end
return 0
"#
);

/// ARGV: token, ttl_ms.
/// Returns the 0-based rank, or -1 if the token already holds an active slot.
pub const ENQUEUE: &str = with_purge!(
    r#"
local token = ARGV[1]
if redis.call('ZSCORE', KEYS[1], token) then
    return -1
end
if not redis.call('ZSCORE', KEYS[2], token) then
    local seq = redis.call('INCR', KEYS[4])
    redis.call('ZADD', KEYS[2], seq, token)
end
redis.call('ZADD', KEYS[3], now + tonumber(ARGV[2]), token)
return redis.call('ZRANK', KEYS[2], token)
"#
);

/// ARGV: token, ttl_ms.
/// Returns the 0-based rank and extends the abandonment deadline, or -1 if not queued.
pub const QUEUE_POSITION: &str = with_purge!(
    r#"
local token = ARGV[1]
local rank = redis.call('ZRANK', KEYS[2], token)
if not rank then
    return -1
end
redis.call('ZADD', KEYS[3], now + tonumber(ARGV[2]), token)
return rank
"#
);

/// ARGV: limit, max_active, ttl_ms.
/// Moves up to `limit` queue heads into the active set, never past capacity.
/// Returns the promoted tokens in queue order.
pub const PROMOTE: &str = with_purge!(
    r#"
local limit = tonumber(ARGV[1])
local free = tonumber(ARGV[2]) - redis.call('ZCARD', KEYS[1])
local n = math.min(limit, free)
if n <= 0 then
    return {}
end
local heads = redis.call('ZRANGE', KEYS[2], 0, n - 1)
local expiry = now + tonumber(ARGV[3])
for _, token in ipairs(heads) do
    redis.call('ZREM', KEYS[2], token)
    redis.call('ZREM', KEYS[3], token)
    redis.call('ZADD', KEYS[1], expiry, token)
end
return heads
"#
);

/// No ARGV. Returns `{active, queued}` after eviction.
pub const OCCUPANCY: &str = with_purge!(
    r#"
return { redis.call('ZCARD', KEYS[1]), redis.call('ZCARD', KEYS[2]) }
"#
);
