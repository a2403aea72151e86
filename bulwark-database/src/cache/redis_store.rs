use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::{AsyncCommands, Script};

// INCR, arm the expiry on the first hit, drop the key once the limit is reached.
const INCREMENT_WITH_LIMIT: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
if count >= tonumber(ARGV[2]) then
    redis.call('DEL', KEYS[1])
    return {count, 1}
end
return {count, 0}
";

#[derive(Clone, Debug)]
pub struct RedisCacheStore {
    pool: Pool,
}

impl RedisCacheStore {
    pub fn from_url(redis_url: &str) -> anyhow::Result<Self> {
        let config = Config::from_url(redis_url);
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| anyhow::anyhow!("failed to create redis pool: {e}"))?;

        Ok(Self { pool })
    }

    async fn conn(&self) -> anyhow::Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| anyhow::anyhow!("failed to get redis connection: {e}"))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis PING failed: {e}"))?;

        Ok(())
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;

        let value = conn
            .get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(|e| anyhow::anyhow!("redis GET failed for key `{key}`: {e}"))?;

        Ok(value)
    }

    pub async fn get_u64(&self, key: &str) -> anyhow::Result<Option<u64>> {
        let mut conn = self.conn().await?;

        let value = conn
            .get::<_, Option<u64>>(key)
            .await
            .map_err(|e| anyhow::anyhow!("redis GET failed for key `{key}`: {e}"))?;

        Ok(value)
    }

    pub async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;

        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(|e| anyhow::anyhow!("redis SETEX failed for key `{key}`: {e}"))?;

        Ok(())
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;

        let _ = conn
            .del::<_, u64>(key)
            .await
            .map_err(|e| anyhow::anyhow!("redis DEL failed for key `{key}`: {e}"))?;

        Ok(())
    }

    pub async fn increment_with_limit(
        &self,
        key: &str,
        window_ms: u64,
        limit: u64,
    ) -> anyhow::Result<(u64, bool)> {
        let mut conn = self.conn().await?;

        let (count, reached) = Script::new(INCREMENT_WITH_LIMIT)
            .key(key)
            .arg(window_ms)
            .arg(limit)
            .invoke_async::<(u64, u8)>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis counter script failed for key `{key}`: {e}"))?;

        Ok((count, reached == 1))
    }
}
