//! 本地 key-value 缓存
//!
//! 每个 key 对应一份完整的 JSON 文档，写入时整体覆盖，不做增量修改。

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;

/// 基于 `local_kv` 表的本地缓存
#[derive(Clone)]
pub struct LocalCache {
    db: Pool<Sqlite>,
}

impl LocalCache {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 读取 key 对应的原始文本，不存在时返回 None
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM local_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await
            .context(format!("读取本地缓存失败: {}", key))?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// 整体覆盖写入 key
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO local_kv (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.db)
        .await
        .context(format!("写入本地缓存失败: {}", key))?;

        debug!("[LocalCache] 写入 {}，长度 {} 字节", key, value.len());
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM local_kv WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await
            .context(format!("删除本地缓存失败: {}", key))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::db::create_sqlite_pool_with_migration;

    #[tokio::test]
    async fn set_overwrites_and_remove_clears() -> Result<()> {
        let pool = create_sqlite_pool_with_migration("sqlite::memory:").await?;
        let cache = LocalCache::new(pool);

        assert_eq!(cache.get("k").await?, None);

        cache.set("k", "first").await?;
        cache.set("k", "second").await?;
        assert_eq!(cache.get("k").await?.as_deref(), Some("second"));

        cache.remove("k").await?;
        assert_eq!(cache.get("k").await?, None);
        Ok(())
    }
}
