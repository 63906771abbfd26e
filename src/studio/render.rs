//! QR 码图片渲染
//!
//! 图片由外部生成服务绘制，这里只负责拼接请求地址和下载图片。

use crate::studio::serialization::encode_uri_component;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, info};

pub const DEFAULT_IMAGE_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// 表单预览尺寸
pub const PREVIEW_SIZE: u32 = 250;
/// 列表缩略图尺寸
pub const THUMBNAIL_SIZE: u32 = 60;
/// 默认下载尺寸
pub const DOWNLOAD_SIZE: u32 = 512;
/// 可选下载尺寸
pub const DOWNLOAD_SIZES: [u32; 3] = [256, 512, 1024];

/// 内容为空时预览使用的占位内容
pub const PREVIEW_PLACEHOLDER: &str = "https://example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            other => Err(anyhow::anyhow!("不支持的图片格式: {}", other)),
        }
    }
}

/// 一次图片生成请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrImageRequest {
    pub payload: String,
    pub size_px: u32,
    pub foreground: String,
    pub background: String,
    /// None 时不带 format 参数（服务默认 png）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
}

impl QrImageRequest {
    pub fn new(payload: impl Into<String>, foreground: &str, background: &str) -> Self {
        Self {
            payload: payload.into(),
            size_px: PREVIEW_SIZE,
            foreground: foreground.to_string(),
            background: background.to_string(),
            format: None,
        }
    }

    /// 表单预览：内容为空时显示占位码
    pub fn preview(payload: &str, foreground: &str, background: &str) -> Self {
        let payload = if payload.is_empty() {
            PREVIEW_PLACEHOLDER
        } else {
            payload
        };
        Self::new(payload, foreground, background)
    }

    pub fn with_size(mut self, size_px: u32) -> Self {
        self.size_px = size_px;
        self
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// 拼接生成服务地址
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!(
            "{}?size={}x{}&data={}&color={}&bgcolor={}",
            base_url,
            self.size_px,
            self.size_px,
            encode_uri_component(&self.payload),
            self.foreground.trim_start_matches('#'),
            self.background.trim_start_matches('#'),
        );
        if let Some(format) = self.format {
            url.push_str("&format=");
            url.push_str(format.as_str());
        }
        url
    }

    /// 下载文件名：`<记录名>.<格式>`
    pub fn file_name(&self, record_name: &str) -> String {
        format!("{}.{}", record_name, self.format.unwrap_or_default())
    }
}

/// 图片生成服务客户端
#[derive(Clone)]
pub struct QrImageRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl QrImageRenderer {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn image_url(&self, request: &QrImageRequest) -> String {
        request.url(&self.base_url)
    }

    /// 下载图片字节
    pub async fn download(&self, request: &QrImageRequest) -> Result<Vec<u8>> {
        let url = self.image_url(request);
        info!(
            "[Render] ⬇️ 下载图片，尺寸: {}，格式: {}",
            request.size_px,
            request.format.unwrap_or_default()
        );
        debug!("[Render]   URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("请求图片服务失败")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("[Render] ❌ 图片服务返回错误，HTTP状态: {}, 响应: {}", status, body);
            return Err(anyhow::anyhow!("图片服务错误 {}: {}", status, body));
        }

        let bytes = response.bytes().await.context("读取图片内容失败")?;
        info!("[Render] ✅ 下载完成，{} 字节", bytes.len());
        Ok(bytes.to_vec())
    }
}

impl Default for QrImageRenderer {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), DEFAULT_IMAGE_SERVICE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_service_url() {
        let request = QrImageRequest::new("https://a.com/x?y=1", "#000000", "#FFFFFF");
        assert_eq!(
            request.url(DEFAULT_IMAGE_SERVICE_URL),
            "https://api.qrserver.com/v1/create-qr-code/?size=250x250\
             &data=https%3A%2F%2Fa.com%2Fx%3Fy%3D1&color=000000&bgcolor=FFFFFF"
        );
    }

    #[test]
    fn download_request_carries_format_and_size() {
        let request = QrImageRequest::new("hello", "#1E3A8A", "#F0F9FF")
            .with_size(1024)
            .with_format(ImageFormat::Svg);
        let url = request.url(DEFAULT_IMAGE_SERVICE_URL);
        assert!(url.contains("size=1024x1024"));
        assert!(url.contains("color=1E3A8A&bgcolor=F0F9FF"));
        assert!(url.ends_with("&format=svg"));
        assert_eq!(request.file_name("QR 3"), "QR 3.svg");
    }

    #[test]
    fn empty_preview_uses_placeholder() {
        let request = QrImageRequest::preview("", "#000000", "#FFFFFF");
        assert_eq!(request.payload, PREVIEW_PLACEHOLDER);
        assert_eq!(request.size_px, PREVIEW_SIZE);
        assert_eq!(request.file_name("x"), "x.png");
        assert!("SVG".parse::<ImageFormat>().is_ok());
        assert!("gif".parse::<ImageFormat>().is_err());
    }
}
