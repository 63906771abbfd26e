//! 认证相关模型定义

use crate::studio::prompts;
use crate::studio::types::SupabaseErrorBody;
use serde::{Deserialize, Serialize};

/// 认证服务返回的用户信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// 注册时写入的扩展信息，其中 `name` 为显示名称
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    pub fn display_name(&self) -> Option<String> {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// 登录会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    /// 过期时间（Unix 秒）
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// 距离过期不足该秒数时视为已过期，提前刷新
const EXPIRY_MARGIN_SECS: i64 = 30;

impl Session {
    /// 补全 `expires_at`（部分接口只返回 `expires_in`）
    pub fn normalized(mut self, now_secs: i64) -> Self {
        if self.expires_at.is_none() && self.expires_in > 0 {
            self.expires_at = Some(now_secs + self.expires_in);
        }
        self
    }

    pub fn is_expired(&self, now_secs: i64) -> bool {
        matches!(self.expires_at, Some(at) if at <= now_secs + EXPIRY_MARGIN_SECS)
    }
}

/// 认证失败的分类
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("email not confirmed")]
    EmailNotConfirmed,
    #[error("{0}")]
    Provider(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl AuthError {
    /// 根据 HTTP 状态和响应体归类认证错误
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = SupabaseErrorBody::parse(body);
        match parsed.error_code.as_deref() {
            Some("invalid_credentials") => return AuthError::InvalidCredentials,
            Some("email_not_confirmed") => return AuthError::EmailNotConfirmed,
            _ => {}
        }

        let message = parsed.message();
        match message.as_str() {
            "Invalid login credentials" => AuthError::InvalidCredentials,
            "Email not confirmed" => AuthError::EmailNotConfirmed,
            "" => AuthError::Provider(format!("HTTP {}", status)),
            _ => AuthError::Provider(message),
        }
    }

    /// 展示给用户的文案
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => prompts::INVALID_CREDENTIALS.to_string(),
            AuthError::EmailNotConfirmed => prompts::EMAIL_NOT_CONFIRMED.to_string(),
            AuthError::Provider(message) => message.clone(),
            AuthError::Transport(e) => e.to_string(),
        }
    }
}
