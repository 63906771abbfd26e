use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// 未配置时前端模板里的占位值，等同于未配置
const PLACEHOLDER_URL: &str = "YOUR_SUPABASE_URL";

/// Supabase 项目配置（URL + anon key）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    /// 两项都存在且不是占位值时才返回配置，否则视为本地模式
    pub fn from_parts(url: Option<String>, anon_key: Option<String>) -> Option<Self> {
        let url = url.map(|u| u.trim().trim_end_matches('/').to_string())?;
        let anon_key = anon_key.map(|k| k.trim().to_string())?;
        if url.is_empty() || anon_key.is_empty() || url == PLACEHOLDER_URL {
            return None;
        }
        Some(Self { url, anon_key })
    }

    /// 读取 `SUPABASE_URL` / `SUPABASE_ANON_KEY`
    pub fn from_env() -> Option<Self> {
        Self::from_parts(
            std::env::var("SUPABASE_URL").ok(),
            std::env::var("SUPABASE_ANON_KEY").ok(),
        )
    }

    /// 认证接口地址，例如 `auth_url("token")`
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    /// PostgREST 表地址
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }
}

/// Supabase 错误响应体
///
/// GoTrue 与 PostgREST 的错误格式不一致，这里把可能出现的字段都收进来。
#[derive(Debug, Default, Deserialize)]
pub struct SupabaseErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl SupabaseErrorBody {
    /// 解析错误体，解析失败时把原文当作 message
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            message: Some(body.to_string()),
            ..Default::default()
        })
    }

    /// 取第一个可读的错误描述
    pub fn message(&self) -> String {
        self.msg
            .as_ref()
            .or(self.message.as_ref())
            .or(self.error_description.as_ref())
            .or(self.error.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

/// 通用 HTTP 响应处理函数：检查状态码并反序列化为 `T`
pub async fn handle_http_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<T> {
    use anyhow::Context;

    let status = response.status();

    // 读取 body bytes（只能读取一次）
    let body_bytes = response.bytes().await.context("读取响应 body 失败")?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        let body = SupabaseErrorBody::parse(&body_str);
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, body.message()));
    }
    info!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    serde_json::from_slice(&body_bytes).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        anyhow::anyhow!("反序列化响应失败: {:?}", e)
    })
}

/// 不关心响应体的请求：只检查状态码
pub async fn ensure_success(response: reqwest::Response, operation_name: &str) -> anyhow::Result<()> {
    let status = response.status();
    if status.is_success() {
        info!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);
        return Ok(());
    }

    let body_str = response.text().await.unwrap_or_default();
    let body = SupabaseErrorBody::parse(&body_str);
    error!(
        "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
        operation_name, status, body_str
    );
    Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, body.message()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_placeholder_config_means_local_mode() {
        assert_eq!(SupabaseConfig::from_parts(None, Some("k".into())), None);
        assert_eq!(SupabaseConfig::from_parts(Some("".into()), Some("k".into())), None);
        assert_eq!(
            SupabaseConfig::from_parts(Some("YOUR_SUPABASE_URL".into()), Some("k".into())),
            None
        );

        let cfg = SupabaseConfig::from_parts(
            Some("https://demo.supabase.co/".into()),
            Some("anon".into()),
        )
        .expect("config");
        assert_eq!(cfg.auth_url("signup"), "https://demo.supabase.co/auth/v1/signup");
        assert_eq!(cfg.rest_url("qr_codes"), "https://demo.supabase.co/rest/v1/qr_codes");
    }

    #[test]
    fn error_body_prefers_first_present_field() {
        let gotrue = SupabaseErrorBody::parse(
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        assert_eq!(gotrue.message(), "Invalid login credentials");
        assert_eq!(gotrue.error_code.as_deref(), Some("invalid_credentials"));

        let legacy = SupabaseErrorBody::parse(
            r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#,
        );
        assert_eq!(legacy.message(), "Email not confirmed");

        let postgrest = SupabaseErrorBody::parse(
            r#"{"code":"42501","details":null,"hint":null,"message":"permission denied"}"#,
        );
        assert_eq!(postgrest.message(), "permission denied");

        assert_eq!(SupabaseErrorBody::parse("gateway down").message(), "gateway down");
    }
}
