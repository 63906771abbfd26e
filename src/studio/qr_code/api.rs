//! QR 码云端 HTTP API 客户端
//!
//! 直接调用 Supabase PostgREST 的 `qr_codes` 表，所有请求都按 owner id 过滤。

use crate::studio::auth::provider::IdentityProvider;
use crate::studio::qr_code::models::{QrCodeRecord, RecordId};
use crate::studio::qr_code::types::{NewQrCodeRow, QrCodeUpdate};
use crate::studio::types::{ensure_success, handle_http_response, SupabaseConfig};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const TABLE: &str = "qr_codes";

/// `qr_codes` 表的 HTTP API 客户端
#[derive(Clone)]
pub struct QrCodeApi {
    client: reqwest::Client,
    config: SupabaseConfig,
    /// 每次请求都从身份服务取当前 token，过期的会话由身份服务刷新
    identity: Arc<dyn IdentityProvider>,
    owner_id: String,
}

impl QrCodeApi {
    /// 创建新的 API 客户端，请求的 token 取自 `identity` 的当前会话
    pub fn new(
        client: reqwest::Client,
        config: SupabaseConfig,
        identity: Arc<dyn IdentityProvider>,
        owner_id: String,
    ) -> Self {
        Self {
            client,
            config,
            identity,
            owner_id,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    async fn request(
        &self,
        method: reqwest::Method,
        operation_id: &str,
    ) -> Result<reqwest::RequestBuilder> {
        let session = self
            .identity
            .get_session()
            .await?
            .ok_or_else(|| anyhow::anyhow!("会话已失效，请重新登录"))?;
        Ok(self
            .client
            .request(method, self.config.rest_url(TABLE))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token)
            .header("operationID", operation_id))
    }

    /// 拉取当前用户的全部记录，按创建时间倒序
    pub async fn list(&self) -> Result<Vec<QrCodeRecord>> {
        let operation_id = Uuid::new_v4().to_string();
        info!("[QrApi] 📡 请求云端列表");
        debug!(
            "[QrApi]   用户ID: {}, 操作ID: {}",
            self.owner_id, operation_id
        );

        let response = self
            .request(reqwest::Method::GET, &operation_id)
            .await?
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", self.owner_id)),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await
            .context("请求失败")?;

        let records: Vec<QrCodeRecord> = handle_http_response(response, "云端列表").await?;
        info!("[QrApi] ✅ 云端列表响应，共 {} 条", records.len());
        Ok(records)
    }

    /// 新增一行
    pub async fn insert(&self, row: &NewQrCodeRow) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        info!("[QrApi] 📡 新增记录: {}", row.name);
        debug!("[QrApi]   短码: {}, 操作ID: {}", row.short_code, operation_id);

        let response = self
            .request(reqwest::Method::POST, &operation_id)
            .await?
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await
            .context("请求失败")?;

        ensure_success(response, "新增记录").await
    }

    /// 按 id 部分更新
    pub async fn update(&self, id: &RecordId, patch: &QrCodeUpdate) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        info!("[QrApi] 📡 更新记录: {}", id);
        debug!("[QrApi]   操作ID: {}", operation_id);

        let response = self
            .request(reqwest::Method::PATCH, &operation_id)
            .await?
            .header("Prefer", "return=minimal")
            .query(&[("id", format!("eq.{}", id))])
            .json(patch)
            .send()
            .await
            .context("请求失败")?;

        ensure_success(response, "更新记录").await
    }

    /// 按 id 删除
    pub async fn delete(&self, id: &RecordId) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        info!("[QrApi] 📡 删除记录: {}", id);
        debug!("[QrApi]   操作ID: {}", operation_id);

        let response = self
            .request(reqwest::Method::DELETE, &operation_id)
            .await?
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .context("请求失败")?;

        ensure_success(response, "删除记录").await
    }
}
