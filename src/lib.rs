pub mod studio;

// 重新导出常用类型和函数，方便外部使用
pub use studio::{
    client::{AppMode, ClientConfig, QrStudioClient},
    qr_code::{build_payload, validate_payload, QrCodeRecord, QrDraft, QrFields, QrKind, RecordId},
    render::{ImageFormat, QrImageRequest},
    types::SupabaseConfig,
    view::{Action, ViewState},
};
