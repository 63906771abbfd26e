//! QR 码记录模块
//!
//! 负责内容生成、本地/云端持久化以及内存列表的维护

pub mod api;
pub mod backend;
pub mod dao;
pub mod listener;
pub mod merge;
pub mod models;
pub mod payload;
pub mod service;
pub mod types;

// 重新导出主要类型和函数
pub use api::QrCodeApi;
pub use backend::{CloudBackend, LocalBackend, QrCodeBackend};
pub use dao::{QrCodeDao, QR_CODES_KEY};
pub use listener::{EmptyQrCodeListener, QrCodeListener};
pub use models::{QrCodeRecord, QrDraft, QrKind, QrStats, RecordId};
pub use payload::{
    build_payload, validate_payload, EmailFields, QrFields, SmsFields, VCardFields,
    WifiEncryption, WifiFields,
};
pub use service::QrCodeStore;
