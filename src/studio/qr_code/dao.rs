//! QR 码本地数据访问层（DAO）
//!
//! 整个列表序列化为一份 JSON，保存在 `qr_codes` 这一个 key 下。

use crate::studio::local_cache::LocalCache;
use crate::studio::qr_code::models::QrCodeRecord;
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// 本地列表使用的缓存 key
pub const QR_CODES_KEY: &str = "qr_codes";

/// QR 码 DAO（基于本地 key-value 缓存）
#[derive(Clone)]
pub struct QrCodeDao {
    cache: LocalCache,
}

impl QrCodeDao {
    pub fn new(cache: LocalCache) -> Self {
        Self { cache }
    }

    /// 读取本地列表；缺失或内容损坏时返回空列表
    pub async fn load_records(&self) -> Result<Vec<QrCodeRecord>> {
        let Some(raw) = self.cache.get(QR_CODES_KEY).await? else {
            debug!("[QrDAO] 本地没有 {}，使用空列表", QR_CODES_KEY);
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<QrCodeRecord>>(&raw) {
            Ok(records) => {
                debug!("[QrDAO] 读取本地列表，共 {} 条", records.len());
                Ok(records)
            }
            Err(e) => {
                warn!("[QrDAO] ⚠️ 本地列表解析失败，按空列表处理: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// 整体覆盖写入本地列表
    pub async fn save_records(&self, records: &[QrCodeRecord]) -> Result<()> {
        let json = serde_json::to_string(records).context("序列化本地列表失败")?;
        self.cache.set(QR_CODES_KEY, &json).await?;
        debug!("[QrDAO] 保存本地列表，共 {} 条", records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::db::create_sqlite_pool_with_migration;
    use crate::studio::qr_code::models::{QrKind, RecordId};
    use chrono::{DateTime, Utc};

    async fn dao() -> Result<(QrCodeDao, LocalCache)> {
        let pool = create_sqlite_pool_with_migration("sqlite::memory:").await?;
        let cache = LocalCache::new(pool);
        Ok((QrCodeDao::new(cache.clone()), cache))
    }

    fn record(id: i64, kind: QrKind, payload: &str) -> QrCodeRecord {
        QrCodeRecord {
            id: RecordId::Number(id),
            short_code: "K3J9QX".into(),
            owner_id: None,
            kind,
            name: format!("QR {}", id),
            payload: payload.into(),
            foreground_color: "#112233".into(),
            background_color: "#FFFFFF".into(),
            scan_count: 4,
            active: true,
            created_at: "2025-05-01T08:30:00Z".parse::<DateTime<Utc>>().unwrap(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn round_trip_preserves_order_and_fields() -> Result<()> {
        let (dao, _) = dao().await?;
        let records = vec![
            record(3, QrKind::Wifi, "WIFI:T:WPA;S:Home;P:secret;;"),
            record(2, QrKind::Text, "line one\nline two"),
            record(1, QrKind::Url, "https://example.com"),
        ];

        dao.save_records(&records).await?;
        assert_eq!(dao.load_records().await?, records);
        Ok(())
    }

    #[tokio::test]
    async fn missing_or_corrupt_cache_reads_as_empty() -> Result<()> {
        let (dao, cache) = dao().await?;
        assert!(dao.load_records().await?.is_empty());

        cache.set(QR_CODES_KEY, "{not json").await?;
        assert!(dao.load_records().await?.is_empty());

        cache.set(QR_CODES_KEY, r#"{"id":1}"#).await?;
        assert!(dao.load_records().await?.is_empty());
        Ok(())
    }
}
