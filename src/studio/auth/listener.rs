//! 会话监听器回调接口

use crate::studio::auth::models::AuthUser;
use async_trait::async_trait;

/// 会话变化回调（登录、登出、启动时恢复会话）
#[async_trait]
pub trait SessionListener: Send + Sync {
    /// 会话变化，`user` 为 None 表示已登出
    async fn on_session_changed(&self, user: Option<AuthUser>);
}

/// 默认空实现（无操作）
pub struct EmptySessionListener;

#[async_trait]
impl SessionListener for EmptySessionListener {
    async fn on_session_changed(&self, _user: Option<AuthUser>) {}
}
