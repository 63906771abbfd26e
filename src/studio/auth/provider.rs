//! 身份服务接口

use crate::studio::auth::models::{AuthError, Session};
use anyhow::Result;
use async_trait::async_trait;

/// 托管身份服务（会话、登录、注册、登出）
///
/// 密码、token 存储与刷新都由实现方负责，调用方只拿到会话。
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 当前有效会话，没有登录时返回 None
    async fn get_session(&self) -> Result<Option<Session>>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_up(&self, email: &str, password: &str, display_name: &str)
        -> Result<(), AuthError>;

    async fn sign_out(&self) -> Result<()>;

    /// 重新发送注册确认邮件
    async fn resend_confirmation(&self, email: &str) -> Result<()>;
}
