pub mod auth;
pub mod client;
pub mod db;
pub mod local_cache;
pub mod prompts;
pub mod qr_code;
pub mod render;
pub mod serialization;
pub mod types;
pub mod view;

// 重新导出客户端入口
pub use client::{AppMode, ClientConfig, CloudParts, QrStudioClient};

// 重新导出认证相关类型
pub use auth::{AuthError, IdentityProvider, Session, SessionListener, SupabaseAuth};

// 重新导出记录相关类型和函数
pub use qr_code::{build_payload, QrCodeListener, QrCodeRecord, QrDraft, QrFields, QrKind, RecordId};
