//! Supabase 认证（GoTrue）HTTP 客户端
//!
//! 会话保存在内存中，并同步写入本地缓存，进程重启后可以恢复。

use crate::studio::auth::models::{AuthError, Session};
use crate::studio::auth::provider::IdentityProvider;
use crate::studio::local_cache::LocalCache;
use crate::studio::types::{ensure_success, SupabaseConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 本地缓存中保存会话的 key
pub const SESSION_KEY: &str = "auth_session";

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    email: &'a str,
}

/// 基于 Supabase GoTrue 的身份服务
pub struct SupabaseAuth {
    client: reqwest::Client,
    config: SupabaseConfig,
    session: Mutex<Option<Session>>,
    cache: Option<LocalCache>,
}

impl SupabaseAuth {
    /// `cache` 为 None 时会话只保存在内存中
    pub fn new(client: reqwest::Client, config: SupabaseConfig, cache: Option<LocalCache>) -> Self {
        Self {
            client,
            config,
            session: Mutex::new(None),
            cache,
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let operation_id = Uuid::new_v4().to_string();
        debug!("[Auth]   URL: {}, 操作ID: {}", self.config.auth_url(path), operation_id);
        self.client
            .post(self.config.auth_url(path))
            .header("apikey", &self.config.anon_key)
            .header("Content-Type", "application/json")
            .header("operationID", operation_id)
    }

    /// 读取会话响应；失败时按错误体归类
    async fn read_session(response: reqwest::Response) -> Result<Session, AuthError> {
        let status = response.status();
        let text = response.text().await.context("读取响应失败")?;

        if !status.is_success() {
            warn!("[Auth] ❌ 认证失败，HTTP状态: {}, 响应: {}", status, text);
            return Err(AuthError::from_response(status.as_u16(), &text));
        }

        let session: Session = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("解析会话失败: {}，原始响应: {}", e, text))?;
        Ok(session.normalized(chrono::Utc::now().timestamp()))
    }

    async fn store_session(&self, session: Option<Session>) -> Result<()> {
        if let Some(cache) = &self.cache {
            match &session {
                Some(s) => {
                    let json = serde_json::to_string(s).context("序列化会话失败")?;
                    cache.set(SESSION_KEY, &json).await?;
                }
                None => cache.remove(SESSION_KEY).await?,
            }
        }
        *self.session.lock().await = session;
        Ok(())
    }

    async fn cached_session(&self) -> Result<Option<Session>> {
        if let Some(session) = self.session.lock().await.clone() {
            return Ok(Some(session));
        }
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let Some(raw) = cache.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("[Auth] ⚠️ 本地会话损坏，丢弃: {}", e);
                cache.remove(SESSION_KEY).await?;
                Ok(None)
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        info!("[Auth] 🔄 会话即将过期，刷新 token");
        let response = self
            .post("token?grant_type=refresh_token")
            .json(&RefreshGrant { refresh_token })
            .send()
            .await
            .context("请求失败")?;
        Self::read_session(response).await
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn get_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.cached_session().await? else {
            debug!("[Auth] 当前没有会话");
            return Ok(None);
        };

        if !session.is_expired(chrono::Utc::now().timestamp()) {
            *self.session.lock().await = Some(session.clone());
            return Ok(Some(session));
        }

        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                self.store_session(Some(fresh.clone())).await?;
                info!("[Auth] ✅ 会话已刷新，用户ID: {}", fresh.user.id);
                Ok(Some(fresh))
            }
            Err(e) => {
                warn!("[Auth] ⚠️ 刷新会话失败，视为未登录: {}", e);
                self.store_session(None).await?;
                Ok(None)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        info!("[Auth] 🔐 正在登录: {}", email);
        let response = self
            .post("token?grant_type=password")
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .context("请求失败")?;

        let session = Self::read_session(response).await?;
        self.store_session(Some(session.clone())).await?;
        info!("[Auth] ✅ 登录成功，用户ID: {}", session.user.id);
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), AuthError> {
        info!("[Auth] 📝 正在注册: {}", email);
        let response = self
            .post("signup")
            .json(&SignUpRequest {
                email,
                password,
                data: SignUpMetadata { name: display_name },
            })
            .send()
            .await
            .context("请求失败")?;

        let status = response.status();
        let text = response.text().await.context("读取响应失败")?;
        if !status.is_success() {
            warn!("[Auth] ❌ 注册失败，HTTP状态: {}, 响应: {}", status, text);
            return Err(AuthError::from_response(status.as_u16(), &text));
        }

        info!("[Auth] ✅ 注册成功: {}", email);
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        let current = self.session.lock().await.clone();
        if let Some(session) = current {
            info!("[Auth] 👋 正在登出，用户ID: {}", session.user.id);
            let result = self
                .post("logout")
                .bearer_auth(&session.access_token)
                .send()
                .await;
            match result {
                Ok(response) => {
                    if let Err(e) = ensure_success(response, "登出").await {
                        warn!("[Auth] ⚠️ 服务端登出失败，仍清除本地会话: {}", e);
                    }
                }
                Err(e) => warn!("[Auth] ⚠️ 登出请求失败，仍清除本地会话: {}", e),
            }
        }
        self.store_session(None).await
    }

    async fn resend_confirmation(&self, email: &str) -> Result<()> {
        info!("[Auth] 📧 重新发送确认邮件: {}", email);
        let response = self
            .post("resend")
            .json(&ResendRequest {
                kind: "signup",
                email,
            })
            .send()
            .await
            .context("请求失败")?;
        ensure_success(response, "重发确认邮件").await
    }
}
