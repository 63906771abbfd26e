//! QR 码记录服务层
//!
//! 维护内存中的有序列表（最新在前），所有变更都交给当前后端，
//! 成功后用后端返回的权威列表整体替换内存列表；失败时保持变更前的状态并提示用户。

use crate::studio::prompts;
use crate::studio::qr_code::backend::QrCodeBackend;
use crate::studio::qr_code::listener::{EmptyQrCodeListener, QrCodeListener};
use crate::studio::qr_code::merge;
use crate::studio::qr_code::models::{QrCodeRecord, QrDraft, QrStats, RecordId};
use crate::studio::qr_code::payload::{build_payload, validate_payload};
use crate::studio::serialization::{generate_local_id, generate_short_code};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// QR 码记录仓库
pub struct QrCodeStore {
    backend: Arc<dyn QrCodeBackend>,
    records: Vec<QrCodeRecord>,
    listener: Arc<dyn QrCodeListener>,
}

impl QrCodeStore {
    /// 创建记录仓库（使用默认空监听器）
    pub fn new(backend: Arc<dyn QrCodeBackend>) -> Self {
        Self::with_listener(backend, Arc::new(EmptyQrCodeListener))
    }

    pub fn with_listener(backend: Arc<dyn QrCodeBackend>, listener: Arc<dyn QrCodeListener>) -> Self {
        Self {
            backend,
            records: Vec::new(),
            listener,
        }
    }

    pub fn set_listener(&mut self, listener: Arc<dyn QrCodeListener>) {
        self.listener = listener;
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn records(&self) -> &[QrCodeRecord] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&QrCodeRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn stats(&self) -> QrStats {
        QrStats::compute(&self.records, Utc::now())
    }

    /// 切换后端并整表加载，旧后端的数据不会带过去
    pub async fn switch_backend(&mut self, backend: Arc<dyn QrCodeBackend>) -> Result<()> {
        info!(
            "[QrStore] 🔀 切换后端: {} -> {}",
            self.backend.name(),
            backend.name()
        );
        self.detach(backend).await;
        self.load().await
    }

    /// 换上新后端并清空内存列表，不加载
    pub async fn detach(&mut self, backend: Arc<dyn QrCodeBackend>) {
        self.backend = backend;
        self.apply(Vec::new()).await;
    }

    /// 从当前后端整表重新加载
    pub async fn load(&mut self) -> Result<()> {
        match self.backend.load().await {
            Ok(records) => {
                info!(
                    "[QrStore] 📥 从 {} 加载 {} 条记录",
                    self.backend.name(),
                    records.len()
                );
                self.apply(records).await;
                Ok(())
            }
            Err(e) => {
                error!("[QrStore] ❌ 加载列表失败: {:?}", e);
                self.listener
                    .on_alert(prompts::load_failed(&e.to_string()))
                    .await;
                Err(e)
            }
        }
    }

    /// 根据表单创建新记录
    ///
    /// 内容为空时提示并返回 `Ok(None)`，列表不变。
    pub async fn create(&mut self, draft: &QrDraft) -> Result<Option<QrCodeRecord>> {
        let payload = build_payload(&draft.fields);
        if let Err(prompt) = validate_payload(&payload) {
            warn!("[QrStore] 内容为空，拒绝创建");
            self.listener.on_alert(prompt.to_string()).await;
            return Ok(None);
        }

        let record = QrCodeRecord {
            id: merge::unique_local_id(&self.records, generate_local_id()),
            short_code: generate_short_code(),
            owner_id: self.backend.owner_id(),
            kind: draft.kind(),
            name: self.resolve_name(&draft.name),
            payload,
            foreground_color: draft.foreground_color.clone(),
            background_color: draft.background_color.clone(),
            scan_count: 0,
            active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        info!(
            "[QrStore] ➕ 创建记录: {} ({}) -> {}",
            record.name,
            record.kind,
            self.backend.name()
        );

        let result = self.backend.insert(&record, &self.records).await;
        self.commit(result, "创建").await?;

        // 云端的 id 由数据库分配，通过短码找回
        let created = self
            .records
            .iter()
            .find(|r| r.short_code == record.short_code)
            .cloned()
            .unwrap_or(record);
        Ok(Some(created))
    }

    /// 用表单整体替换已有记录，保留创建时间和扫描次数
    ///
    /// id 不存在或内容为空时返回 `Ok(false)`。
    pub async fn update(&mut self, id: &RecordId, draft: &QrDraft) -> Result<bool> {
        let Some(existing) = self.get(id).cloned() else {
            debug!("[QrStore] 更新的记录不存在: {}", id);
            return Ok(false);
        };

        let payload = build_payload(&draft.fields);
        if let Err(prompt) = validate_payload(&payload) {
            warn!("[QrStore] 内容为空，拒绝更新: {}", id);
            self.listener.on_alert(prompt.to_string()).await;
            return Ok(false);
        }

        let edited = QrCodeRecord {
            name: self.resolve_name(&draft.name),
            kind: draft.kind(),
            payload,
            foreground_color: draft.foreground_color.clone(),
            background_color: draft.background_color.clone(),
            updated_at: Some(Utc::now()),
            ..existing
        };
        info!("[QrStore] ✏️ 更新记录: {} ({})", edited.name, id);

        let result = self.backend.replace(&edited, &self.records).await;
        self.commit(result, "更新").await?;
        Ok(true)
    }

    /// 删除记录，必须先经过监听器确认
    ///
    /// 未确认或 id 不存在时返回 `Ok(false)`。
    pub async fn delete(&mut self, id: &RecordId) -> Result<bool> {
        let Some(existing) = self.get(id) else {
            debug!("[QrStore] 删除的记录不存在: {}", id);
            return Ok(false);
        };
        let name = existing.name.clone();

        let confirmed = self
            .listener
            .on_confirm_delete(prompts::CONFIRM_DELETE.to_string(), name.clone())
            .await;
        if !confirmed {
            info!("[QrStore] 用户取消删除: {}", name);
            return Ok(false);
        }

        info!("[QrStore] 🗑️ 删除记录: {} ({})", name, id);
        let result = self.backend.remove(id, &self.records).await;
        self.commit(result, "删除").await?;
        Ok(true)
    }

    /// 扫描次数 +1，返回新的次数；id 不存在时返回 None
    pub async fn increment_scan(&mut self, id: &RecordId) -> Result<Option<u64>> {
        let Some(existing) = self.get(id) else {
            debug!("[QrStore] 计数的记录不存在: {}", id);
            return Ok(None);
        };
        let scans = existing.scan_count + 1;

        debug!("[QrStore] 📈 扫描计数 {} -> {}", id, scans);
        let result = self.backend.set_scan_count(id, scans, &self.records).await;
        self.commit(result, "扫描计数").await?;
        Ok(Some(scans))
    }

    /// 记录一次扫描并打开内容
    pub async fn open(&mut self, id: &RecordId) -> Result<Option<String>> {
        let Some(payload) = self.get(id).map(|r| r.payload.clone()) else {
            return Ok(None);
        };
        if self.increment_scan(id).await?.is_none() {
            return Ok(None);
        }

        info!("[QrStore] 🔗 打开: {}", payload);
        self.listener.on_open_url(payload.clone()).await;
        Ok(Some(payload))
    }

    fn resolve_name(&self, name: &str) -> String {
        if name.is_empty() {
            prompts::default_record_name(self.records.len() + 1)
        } else {
            name.to_string()
        }
    }

    async fn apply(&mut self, records: Vec<QrCodeRecord>) {
        self.records = records;
        match serde_json::to_string(&self.records) {
            Ok(json) => self.listener.on_list_changed(json).await,
            Err(e) => warn!("[QrStore] 序列化列表失败，跳过回调: {}", e),
        }
    }

    async fn commit(&mut self, result: Result<Vec<QrCodeRecord>>, operation: &str) -> Result<()> {
        match result {
            Ok(next) => {
                debug!("[QrStore] {}完成，列表共 {} 条", operation, next.len());
                self.apply(next).await;
                Ok(())
            }
            Err(e) => {
                error!("[QrStore] ❌ {}失败，保持原列表: {:?}", operation, e);
                self.listener
                    .on_alert(prompts::save_failed(&e.to_string()))
                    .await;
                Err(e)
            }
        }
    }
}
