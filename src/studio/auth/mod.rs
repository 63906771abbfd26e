//! 认证模块
//!
//! 托管身份服务的会话管理：登录、注册、登出、会话恢复与刷新

pub mod api;
pub mod listener;
pub mod models;
pub mod provider;

pub use api::{SupabaseAuth, SESSION_KEY};
pub use listener::{EmptySessionListener, SessionListener};
pub use models::{AuthError, AuthUser, Session};
pub use provider::IdentityProvider;
