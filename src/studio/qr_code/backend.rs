//! QR 码持久化后端
//!
//! 同一时刻只有一个后端生效：本地模式写整份缓存，云端模式调用远程表后整表重拉。
//! 每个写操作都返回写入后的权威列表。

use crate::studio::qr_code::api::QrCodeApi;
use crate::studio::qr_code::dao::QrCodeDao;
use crate::studio::qr_code::merge;
use crate::studio::qr_code::models::{QrCodeRecord, RecordId};
use crate::studio::qr_code::types::{NewQrCodeRow, QrCodeUpdate};
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait QrCodeBackend: Send + Sync {
    /// 日志里显示的后端名称
    fn name(&self) -> &'static str;

    /// 记录归属的用户，本地模式为 None
    fn owner_id(&self) -> Option<String>;

    /// 读取完整列表
    async fn load(&self) -> Result<Vec<QrCodeRecord>>;

    async fn insert(
        &self,
        record: &QrCodeRecord,
        current: &[QrCodeRecord],
    ) -> Result<Vec<QrCodeRecord>>;

    /// 整体替换（创建时间与扫描次数由合并规则保留）
    async fn replace(
        &self,
        record: &QrCodeRecord,
        current: &[QrCodeRecord],
    ) -> Result<Vec<QrCodeRecord>>;

    async fn remove(&self, id: &RecordId, current: &[QrCodeRecord]) -> Result<Vec<QrCodeRecord>>;

    async fn set_scan_count(
        &self,
        id: &RecordId,
        scans: u64,
        current: &[QrCodeRecord],
    ) -> Result<Vec<QrCodeRecord>>;
}

/// 本地后端：内存中合并后整份写回缓存
pub struct LocalBackend {
    dao: QrCodeDao,
}

impl LocalBackend {
    pub fn new(dao: QrCodeDao) -> Self {
        Self { dao }
    }

    async fn persist(&self, next: Vec<QrCodeRecord>) -> Result<Vec<QrCodeRecord>> {
        self.dao.save_records(&next).await?;
        Ok(next)
    }
}

#[async_trait]
impl QrCodeBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn owner_id(&self) -> Option<String> {
        None
    }

    async fn load(&self) -> Result<Vec<QrCodeRecord>> {
        self.dao.load_records().await
    }

    async fn insert(
        &self,
        record: &QrCodeRecord,
        current: &[QrCodeRecord],
    ) -> Result<Vec<QrCodeRecord>> {
        self.persist(merge::prepend(current, record.clone())).await
    }

    async fn replace(
        &self,
        record: &QrCodeRecord,
        current: &[QrCodeRecord],
    ) -> Result<Vec<QrCodeRecord>> {
        self.persist(merge::replace(current, record)).await
    }

    async fn remove(&self, id: &RecordId, current: &[QrCodeRecord]) -> Result<Vec<QrCodeRecord>> {
        self.persist(merge::remove(current, id)).await
    }

    async fn set_scan_count(
        &self,
        id: &RecordId,
        scans: u64,
        current: &[QrCodeRecord],
    ) -> Result<Vec<QrCodeRecord>> {
        self.persist(merge::set_scan_count(current, id, scans)).await
    }
}

/// 云端后端：每次写入后重新拉取整表，不做乐观更新
pub struct CloudBackend {
    api: QrCodeApi,
}

impl CloudBackend {
    pub fn new(api: QrCodeApi) -> Self {
        Self { api }
    }

    async fn refetch(&self) -> Result<Vec<QrCodeRecord>> {
        let records = self.api.list().await?;
        info!("[QrBackend] ☁️ 已重新拉取云端列表，共 {} 条", records.len());
        Ok(records)
    }
}

#[async_trait]
impl QrCodeBackend for CloudBackend {
    fn name(&self) -> &'static str {
        "cloud"
    }

    fn owner_id(&self) -> Option<String> {
        Some(self.api.owner_id().to_string())
    }

    async fn load(&self) -> Result<Vec<QrCodeRecord>> {
        self.api.list().await
    }

    async fn insert(
        &self,
        record: &QrCodeRecord,
        _current: &[QrCodeRecord],
    ) -> Result<Vec<QrCodeRecord>> {
        self.api
            .insert(&NewQrCodeRow::from_record(record, self.api.owner_id()))
            .await?;
        self.refetch().await
    }

    async fn replace(
        &self,
        record: &QrCodeRecord,
        _current: &[QrCodeRecord],
    ) -> Result<Vec<QrCodeRecord>> {
        self.api
            .update(&record.id, &QrCodeUpdate::edit(record))
            .await?;
        self.refetch().await
    }

    async fn remove(&self, id: &RecordId, _current: &[QrCodeRecord]) -> Result<Vec<QrCodeRecord>> {
        self.api.delete(id).await?;
        self.refetch().await
    }

    async fn set_scan_count(
        &self,
        id: &RecordId,
        scans: u64,
        _current: &[QrCodeRecord],
    ) -> Result<Vec<QrCodeRecord>> {
        self.api.update(id, &QrCodeUpdate::scans(scans)).await?;
        self.refetch().await
    }
}
