//! QR 码监听器回调接口

use async_trait::async_trait;

/// QR 码监听器回调接口
#[async_trait]
pub trait QrCodeListener: Send + Sync {
    /// 列表重新加载或发生变更，参数为 JSON 数组字符串
    async fn on_list_changed(&self, records_json: String);

    /// 需要阻塞式提示用户的消息（校验失败、云端保存失败等）
    async fn on_alert(&self, message: String);

    /// 用户打开某个二维码的内容
    async fn on_open_url(&self, url: String);

    /// 删除前确认，返回 true 才会删除
    async fn on_confirm_delete(&self, prompt: String, record_name: String) -> bool;
}

/// 默认空实现：不处理任何回调，删除一律不确认
pub struct EmptyQrCodeListener;

#[async_trait]
impl QrCodeListener for EmptyQrCodeListener {
    async fn on_list_changed(&self, _records_json: String) {}
    async fn on_alert(&self, _message: String) {}
    async fn on_open_url(&self, _url: String) {}
    async fn on_confirm_delete(&self, _prompt: String, _record_name: String) -> bool {
        false
    }
}
