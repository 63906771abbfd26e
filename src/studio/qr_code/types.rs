//! 云端 `qr_codes` 表的请求 DTO

use crate::studio::qr_code::models::{QrCodeRecord, QrKind};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 新增行（不带 id，由数据库分配）
#[derive(Debug, Clone, Serialize)]
pub struct NewQrCodeRow {
    pub user_id: String,
    pub short_code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: QrKind,
    pub original_url: String,
    pub fg_color: String,
    pub bg_color: String,
    pub scans: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl NewQrCodeRow {
    pub fn from_record(record: &QrCodeRecord, owner_id: &str) -> Self {
        Self {
            user_id: owner_id.to_string(),
            short_code: record.short_code.clone(),
            name: record.name.clone(),
            kind: record.kind,
            original_url: record.payload.clone(),
            fg_color: record.foreground_color.clone(),
            bg_color: record.background_color.clone(),
            scans: record.scan_count,
            is_active: record.active,
            created_at: record.created_at,
        }
    }
}

/// 部分更新（PATCH），未设置的字段不会出现在请求体里
#[derive(Debug, Clone, Default, Serialize)]
pub struct QrCodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<QrKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scans: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl QrCodeUpdate {
    /// 编辑表单提交：只更新可编辑字段
    pub fn edit(record: &QrCodeRecord) -> Self {
        Self {
            name: Some(record.name.clone()),
            kind: Some(record.kind),
            original_url: Some(record.payload.clone()),
            fg_color: Some(record.foreground_color.clone()),
            bg_color: Some(record.background_color.clone()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn scans(scans: u64) -> Self {
        Self {
            scans: Some(scans),
            ..Default::default()
        }
    }
}
