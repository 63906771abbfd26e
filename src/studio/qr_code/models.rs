//! QR 码记录模型定义

use crate::studio::qr_code::payload::QrFields;
use crate::studio::serialization::deserialize_null_default;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FOREGROUND: &str = "#000000";
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// QR 码类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QrKind {
    #[default]
    Url,
    Text,
    Pdf,
    Image,
    Vcard,
    Video,
    Wifi,
    Email,
    Sms,
}

impl QrKind {
    /// 界面上的标签顺序
    pub const ALL: [QrKind; 9] = [
        QrKind::Url,
        QrKind::Text,
        QrKind::Pdf,
        QrKind::Image,
        QrKind::Vcard,
        QrKind::Video,
        QrKind::Wifi,
        QrKind::Email,
        QrKind::Sms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QrKind::Url => "url",
            QrKind::Text => "text",
            QrKind::Pdf => "pdf",
            QrKind::Image => "image",
            QrKind::Vcard => "vcard",
            QrKind::Video => "video",
            QrKind::Wifi => "wifi",
            QrKind::Email => "email",
            QrKind::Sms => "sms",
        }
    }

    /// 标签页名称
    pub fn label(&self) -> &'static str {
        match self {
            QrKind::Url => "موقع",
            QrKind::Text => "نص",
            QrKind::Pdf => "PDF",
            QrKind::Image => "صورة",
            QrKind::Vcard => "vCard",
            QrKind::Video => "فيديو",
            QrKind::Wifi => "واي فاي",
            QrKind::Email => "إيميل",
            QrKind::Sms => "SMS",
        }
    }

    /// 标签页颜色
    pub fn accent_color(&self) -> &'static str {
        match self {
            QrKind::Url => "#3B82F6",
            QrKind::Text => "#8B5CF6",
            QrKind::Pdf => "#EF4444",
            QrKind::Image => "#10B981",
            QrKind::Vcard => "#F59E0B",
            QrKind::Video => "#EC4899",
            QrKind::Wifi => "#06B6D4",
            QrKind::Email => "#F97316",
            QrKind::Sms => "#14B8A6",
        }
    }
}

impl fmt::Display for QrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QrKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QrKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("未知的 QR 类型: {}", s))
    }
}

/// 记录 ID：离线时为毫秒时间戳，云端由数据库分配（数字或字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(RecordId::Number)
            .unwrap_or_else(|_| RecordId::Text(s.to_string())))
    }
}

/// QR 码记录（本地缓存与云端表共用同一套字段名）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrCodeRecord {
    pub id: RecordId,
    #[serde(rename = "short_code", default)]
    pub short_code: String,
    #[serde(rename = "user_id", default)]
    pub owner_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: QrKind,
    pub name: String,
    /// 编码进二维码的完整内容
    #[serde(rename = "original_url")]
    pub payload: String,
    #[serde(rename = "fg_color")]
    pub foreground_color: String,
    #[serde(rename = "bg_color")]
    pub background_color: String,
    #[serde(rename = "scans", default, deserialize_with = "deserialize_null_default")]
    pub scan_count: u64,
    #[serde(rename = "is_active", default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// 表单提交的内容（创建和编辑共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrDraft {
    pub name: String,
    pub fields: QrFields,
    pub foreground_color: String,
    pub background_color: String,
}

impl QrDraft {
    pub fn new(fields: QrFields) -> Self {
        Self {
            name: String::new(),
            fields,
            foreground_color: DEFAULT_FOREGROUND.to_string(),
            background_color: DEFAULT_BACKGROUND.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_colors(mut self, foreground: impl Into<String>, background: impl Into<String>) -> Self {
        self.foreground_color = foreground.into();
        self.background_color = background.into();
        self
    }

    pub fn kind(&self) -> QrKind {
        self.fields.kind()
    }
}

/// 仪表盘统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QrStats {
    pub total: usize,
    pub total_scans: u64,
    pub active: usize,
    /// 最近 7 天内创建的数量
    pub created_this_week: usize,
}

impl QrStats {
    pub fn compute(records: &[QrCodeRecord], now: DateTime<Utc>) -> Self {
        let week_ago = now - Duration::days(7);
        Self {
            total: records.len(),
            total_scans: records.iter().map(|r| r.scan_count).sum(),
            active: records.iter().filter(|r| r.active).count(),
            created_this_week: records.iter().filter(|r| r.created_at > week_ago).count(),
        }
    }
}
