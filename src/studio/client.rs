//! QR Studio 客户端核心实现
//!
//! 持有运行模式状态机、身份服务、记录仓库与界面状态，是宿主程序唯一的入口。
//!
//! 模式切换：
//! - `Checking -> Auth | Local`
//! - `Auth -> Cloud`（拿到会话）或 `Auth -> Local`（跳过登录）
//! - `Cloud -> Auth`（登出）
//! - `Local -> Auth`（仅在配置了身份服务时）

use crate::studio::auth::{
    AuthError, EmptySessionListener, IdentityProvider, Session, SessionListener, SupabaseAuth,
};
use crate::studio::db::create_sqlite_pool_with_migration;
use crate::studio::local_cache::LocalCache;
use crate::studio::prompts;
use crate::studio::qr_code::{
    CloudBackend, LocalBackend, QrCodeApi, QrCodeBackend, QrCodeDao, QrCodeListener,
    QrCodeRecord, QrCodeStore, QrStats, RecordId,
};
use crate::studio::render::{
    ImageFormat, QrImageRenderer, QrImageRequest, DEFAULT_IMAGE_SERVICE_URL, THUMBNAIL_SIZE,
};
use crate::studio::types::SupabaseConfig;
use crate::studio::view::{Action, AuthFormMode, ViewState};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_DB_URL: &str = "sqlite://qr_studio.db?mode=rwc";

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 本地缓存使用的 SQLite 数据库 URL
    ///
    /// 例如：`sqlite://qr_studio.db?mode=rwc`
    pub db_url: String,
    /// None 时只能使用本地模式
    pub supabase: Option<SupabaseConfig>,
    /// 二维码图片生成服务地址
    pub image_service_url: String,
}

impl ClientConfig {
    /// 创建默认配置（仅本地模式）
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            supabase: None,
            image_service_url: DEFAULT_IMAGE_SERVICE_URL.to_string(),
        }
    }

    /// 读取 `QR_STUDIO_DB_URL`、`SUPABASE_URL`、`SUPABASE_ANON_KEY`
    pub fn from_env() -> Self {
        let db_url = std::env::var("QR_STUDIO_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
        Self {
            supabase: SupabaseConfig::from_env(),
            ..Self::new(db_url)
        }
    }

    pub fn with_supabase(mut self, supabase: Option<SupabaseConfig>) -> Self {
        self.supabase = supabase;
        self
    }
}

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    /// 启动中，正在检查会话
    Checking,
    /// 等待登录
    Auth,
    /// 只使用本地缓存
    Local,
    /// 使用云端表
    Cloud,
}

impl AppMode {
    /// 模式切换是否合法
    pub fn can_transition(self, to: AppMode, identity_configured: bool) -> bool {
        match (self, to) {
            (AppMode::Checking, AppMode::Auth) => identity_configured,
            (AppMode::Checking, AppMode::Local) => true,
            (AppMode::Auth, AppMode::Cloud) => true,
            (AppMode::Auth, AppMode::Local) => true,
            (AppMode::Cloud, AppMode::Auth) => true,
            (AppMode::Local, AppMode::Auth) => identity_configured,
            _ => false,
        }
    }

    /// 是否有生效的持久化后端
    pub fn is_persisting(self) -> bool {
        matches!(self, AppMode::Local | AppMode::Cloud)
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppMode::Checking => "checking",
            AppMode::Auth => "auth",
            AppMode::Local => "local",
            AppMode::Cloud => "cloud",
        };
        f.write_str(name)
    }
}

/// 根据会话创建云端后端
pub trait CloudBackendBuilder: Send + Sync {
    fn build(&self, session: &Session) -> Arc<dyn QrCodeBackend>;
}

/// 基于 Supabase PostgREST 的云端后端
///
/// 后端只记住用户 ID，token 每次请求时从身份服务取，过期会话会被自动刷新。
pub struct SupabaseBackendBuilder {
    client: reqwest::Client,
    config: SupabaseConfig,
    identity: Arc<dyn IdentityProvider>,
}

impl SupabaseBackendBuilder {
    pub fn new(
        client: reqwest::Client,
        config: SupabaseConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            client,
            config,
            identity,
        }
    }
}

impl CloudBackendBuilder for SupabaseBackendBuilder {
    fn build(&self, session: &Session) -> Arc<dyn QrCodeBackend> {
        let api = QrCodeApi::new(
            self.client.clone(),
            self.config.clone(),
            self.identity.clone(),
            session.user.id.clone(),
        );
        Arc::new(CloudBackend::new(api))
    }
}

/// 身份服务与对应的云端后端，二者只会同时存在
#[derive(Clone)]
pub struct CloudParts {
    pub identity: Arc<dyn IdentityProvider>,
    pub backends: Arc<dyn CloudBackendBuilder>,
}

/// QR Studio 客户端
pub struct QrStudioClient {
    mode: AppMode,
    cloud: Option<CloudParts>,
    local_backend: Arc<dyn QrCodeBackend>,
    session: Option<Session>,
    store: QrCodeStore,
    renderer: QrImageRenderer,
    view: ViewState,
    session_listener: Arc<dyn SessionListener>,
}

impl QrStudioClient {
    /// 按配置创建客户端：打开本地数据库，配置了 Supabase 时接入身份服务与云端表
    pub async fn new(config: ClientConfig) -> Result<Self> {
        info!("[Client] 📂 打开本地数据库: {}", config.db_url);
        let pool = create_sqlite_pool_with_migration(&config.db_url)
            .await
            .context("初始化本地数据库失败")?;
        let cache = LocalCache::new(pool);
        let http = reqwest::Client::new();

        let local_backend: Arc<dyn QrCodeBackend> =
            Arc::new(LocalBackend::new(QrCodeDao::new(cache.clone())));

        let cloud = config.supabase.clone().map(|supabase| {
            info!("[Client] ☁️ 已配置身份服务: {}", supabase.url);
            let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseAuth::new(
                http.clone(),
                supabase.clone(),
                Some(cache.clone()),
            ));
            CloudParts {
                backends: Arc::new(SupabaseBackendBuilder::new(
                    http.clone(),
                    supabase,
                    identity.clone(),
                )),
                identity,
            }
        });
        if cloud.is_none() {
            info!("[Client] 未配置身份服务，只能使用本地模式");
        }

        let renderer = QrImageRenderer::new(http, config.image_service_url.clone());
        Ok(Self::with_parts(local_backend, cloud, renderer))
    }

    /// 直接组装各部件（嵌入方或测试替换后端时使用）
    pub fn with_parts(
        local_backend: Arc<dyn QrCodeBackend>,
        cloud: Option<CloudParts>,
        renderer: QrImageRenderer,
    ) -> Self {
        Self {
            mode: AppMode::Checking,
            cloud,
            store: QrCodeStore::new(local_backend.clone()),
            local_backend,
            session: None,
            renderer,
            view: ViewState::new(),
            session_listener: Arc::new(EmptySessionListener),
        }
    }

    /// 注册记录监听器
    pub fn set_qr_code_listener(&mut self, listener: Arc<dyn QrCodeListener>) {
        self.store.set_listener(listener);
    }

    /// 注册会话监听器
    pub fn set_session_listener(&mut self, listener: Arc<dyn SessionListener>) {
        self.session_listener = listener;
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn identity_configured(&self) -> bool {
        self.cloud.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// 界面动作入口
    pub fn dispatch(&mut self, action: Action) {
        self.view.update(action);
    }

    pub fn records(&self) -> &[QrCodeRecord] {
        self.store.records()
    }

    pub fn get(&self, id: &RecordId) -> Option<&QrCodeRecord> {
        self.store.get(id)
    }

    pub fn stats(&self) -> QrStats {
        self.store.stats()
    }

    /// 本地模式下需要展示的横幅
    pub fn banner(&self) -> Option<&'static str> {
        (self.mode == AppMode::Local).then_some(prompts::LOCAL_MODE_BANNER)
    }

    fn transition(&mut self, to: AppMode) -> Result<()> {
        if !self.mode.can_transition(to, self.identity_configured()) {
            return Err(anyhow::anyhow!("非法的模式切换: {} -> {}", self.mode, to));
        }
        info!("[Client] 🔀 模式切换: {} -> {}", self.mode, to);
        self.mode = to;
        Ok(())
    }

    fn cloud_parts(&self) -> Result<CloudParts> {
        self.cloud
            .clone()
            .ok_or_else(|| anyhow::anyhow!("未配置身份服务"))
    }

    fn ensure_persisting(&self) -> Result<()> {
        if !self.mode.is_persisting() {
            return Err(anyhow::anyhow!("当前模式 {} 不能读写记录", self.mode));
        }
        Ok(())
    }

    /// 启动：检查已有会话，决定进入哪种模式
    pub async fn init(&mut self) -> Result<AppMode> {
        if self.mode != AppMode::Checking {
            return Ok(self.mode);
        }

        let Some(cloud) = self.cloud.clone() else {
            self.enter_local().await?;
            return Ok(self.mode);
        };

        self.transition(AppMode::Auth)?;
        match cloud.identity.get_session().await {
            Ok(Some(session)) => {
                info!("[Client] ✅ 恢复会话，用户ID: {}", session.user.id);
                self.enter_cloud(session).await?;
            }
            Ok(None) => debug!("[Client] 没有已保存的会话，等待登录"),
            Err(e) => warn!("[Client] ⚠️ 读取会话失败，等待登录: {:?}", e),
        }
        Ok(self.mode)
    }

    /// 跳过登录，使用本地模式
    pub async fn skip_login(&mut self) -> Result<()> {
        self.enter_local().await
    }

    /// 从本地模式回到登录页
    pub async fn enter_auth(&mut self) -> Result<()> {
        self.transition(AppMode::Auth)?;
        self.store.detach(self.local_backend.clone()).await;
        Ok(())
    }

    async fn enter_local(&mut self) -> Result<()> {
        self.transition(AppMode::Local)?;
        if let Err(e) = self.store.switch_backend(self.local_backend.clone()).await {
            warn!("[Client] ⚠️ 本地列表加载失败: {:?}", e);
        }
        Ok(())
    }

    async fn enter_cloud(&mut self, session: Session) -> Result<()> {
        let cloud = self.cloud_parts()?;
        self.transition(AppMode::Cloud)?;
        let backend = cloud.backends.build(&session);
        let user = session.user.clone();
        self.session = Some(session);

        // 加载失败已经通过监听器提示，仍停留在云端模式
        if let Err(e) = self.store.switch_backend(backend).await {
            warn!("[Client] ⚠️ 云端列表加载失败: {:?}", e);
        }
        self.session_listener.on_session_changed(Some(user)).await;
        Ok(())
    }

    /// 确保处于登录页（本地模式时先切回）
    async fn ensure_auth(&mut self) -> Result<()> {
        if self.mode == AppMode::Local {
            self.enter_auth().await?;
        }
        if self.mode != AppMode::Auth {
            return Err(anyhow::anyhow!("当前模式 {} 不能登录", self.mode));
        }
        Ok(())
    }

    /// 邮箱密码登录
    ///
    /// 成功返回 true 并进入云端模式；失败时把提示写入界面状态并返回 false。
    /// 邮箱未确认时会自动重发确认邮件。
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<bool> {
        self.ensure_auth().await?;
        let cloud = self.cloud_parts()?;

        self.view.update(Action::ClearAuthMessages);
        self.view.update(Action::SetLoading(true));
        let result = cloud.identity.sign_in(email, password).await;
        self.view.update(Action::SetLoading(false));

        match result {
            Ok(session) => {
                self.enter_cloud(session).await?;
                Ok(true)
            }
            Err(AuthError::EmailNotConfirmed) => {
                warn!("[Client] 📧 邮箱未确认，重新发送确认邮件: {}", email);
                if let Err(e) = cloud.identity.resend_confirmation(email).await {
                    warn!("[Client] ⚠️ 重发确认邮件失败: {:?}", e);
                }
                self.view
                    .update(Action::AuthNotice(prompts::EMAIL_NOT_CONFIRMED.to_string()));
                Ok(false)
            }
            Err(e) => {
                warn!("[Client] ❌ 登录失败: {}", e);
                self.view.update(Action::AuthFailed(e.user_message()));
                Ok(false)
            }
        }
    }

    /// 注册账号，成功后切回登录表单
    pub async fn sign_up(&mut self, email: &str, password: &str, display_name: &str) -> Result<bool> {
        self.ensure_auth().await?;
        let cloud = self.cloud_parts()?;

        self.view.update(Action::ClearAuthMessages);
        self.view.update(Action::SetLoading(true));
        let result = cloud.identity.sign_up(email, password, display_name).await;
        self.view.update(Action::SetLoading(false));

        match result {
            Ok(()) => {
                self.view
                    .update(Action::Registered(prompts::ACCOUNT_CREATED.to_string()));
                Ok(true)
            }
            Err(e) => {
                warn!("[Client] ❌ 注册失败: {}", e);
                self.view.update(Action::AuthFailed(e.user_message()));
                Ok(false)
            }
        }
    }

    /// 按界面上的认证表单登录或注册
    pub async fn submit_auth_form(&mut self) -> Result<bool> {
        let form = self.view.auth_form.clone();
        match form.mode {
            AuthFormMode::Login => self.sign_in(&form.email, &form.password).await,
            AuthFormMode::Register => {
                self.sign_up(&form.email, &form.password, &form.name).await
            }
        }
    }

    /// 登出并回到登录页，服务端登出失败不影响本地状态
    pub async fn sign_out(&mut self) -> Result<()> {
        if self.mode != AppMode::Cloud {
            return Err(anyhow::anyhow!("当前模式 {} 没有登录", self.mode));
        }
        let cloud = self.cloud_parts()?;
        if let Err(e) = cloud.identity.sign_out().await {
            warn!("[Client] ⚠️ 登出失败，仍清除本地会话: {:?}", e);
        }

        self.session = None;
        self.transition(AppMode::Auth)?;
        self.store.detach(self.local_backend.clone()).await;
        self.session_listener.on_session_changed(None).await;
        info!("[Client] 👋 已登出");
        Ok(())
    }

    /// 提交创建 / 编辑表单
    ///
    /// 保存成功后清空表单并进入仪表盘，返回 true；校验未通过返回 false。
    pub async fn submit_form(&mut self) -> Result<bool> {
        self.ensure_persisting()?;
        let draft = self.view.draft();

        self.view.update(Action::SetLoading(true));
        let result = match self.view.editing.clone() {
            Some(id) => self.store.update(&id, &draft).await,
            None => self.store.create(&draft).await.map(|r| r.is_some()),
        };
        self.view.update(Action::SetLoading(false));

        let saved = result?;
        if saved {
            self.view.update(Action::FormSubmitted);
        }
        Ok(saved)
    }

    /// 打开已有记录的编辑表单，记录不存在时返回 false
    pub fn begin_edit(&mut self, id: &RecordId) -> bool {
        let Some(record) = self.store.get(id).cloned() else {
            return false;
        };
        self.view.update(Action::BeginEdit(record));
        true
    }

    /// 当前编辑表单能否原样生成被编辑记录的内容
    ///
    /// 不在编辑中或记录已不存在时返回 false。
    pub fn form_reproduces_record(&self) -> bool {
        let Some(record) = self.view.editing.as_ref().and_then(|id| self.store.get(id)) else {
            return false;
        };
        record.kind == self.view.active_tab && self.view.current_payload() == record.payload
    }

    pub async fn delete(&mut self, id: &RecordId) -> Result<bool> {
        self.ensure_persisting()?;
        self.store.delete(id).await
    }

    pub async fn increment_scan(&mut self, id: &RecordId) -> Result<Option<u64>> {
        self.ensure_persisting()?;
        self.store.increment_scan(id).await
    }

    /// 记录一次扫描并通知宿主打开内容
    pub async fn open(&mut self, id: &RecordId) -> Result<Option<String>> {
        self.ensure_persisting()?;
        self.store.open(id).await
    }

    /// 列表缩略图地址
    pub fn thumbnail_url(&self, record: &QrCodeRecord) -> String {
        let request = QrImageRequest::new(
            record.payload.clone(),
            &record.foreground_color,
            &record.background_color,
        )
        .with_size(THUMBNAIL_SIZE);
        self.renderer.image_url(&request)
    }

    /// 表单实时预览地址
    pub fn preview_url(&self) -> String {
        self.renderer.image_url(&self.view.preview_request())
    }

    /// 下载图片，返回 (文件名, 内容)；记录不存在时返回 None
    pub async fn download(
        &self,
        id: &RecordId,
        format: ImageFormat,
        size_px: u32,
    ) -> Result<Option<(String, Vec<u8>)>> {
        let Some(record) = self.store.get(id) else {
            return Ok(None);
        };
        let request = QrImageRequest::new(
            record.payload.clone(),
            &record.foreground_color,
            &record.background_color,
        )
        .with_size(size_px)
        .with_format(format);

        let bytes = self.renderer.download(&request).await?;
        Ok(Some((request.file_name(&record.name), bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::auth::AuthUser;
    use crate::studio::qr_code::QrFields;
    use crate::studio::view::Page;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, Once};

    static INIT_LOGGER: Once = Once::new();

    fn init_test_logger() {
        INIT_LOGGER.call_once(|| {
            use tracing_subscriber::prelude::*;
            use tracing_subscriber::EnvFilter;

            let filter_layer = EnvFilter::new("info,qr_studio_sdk=debug,sqlx=warn");
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_test_writer();

            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt_layer)
                .try_init();
        });
    }

    fn session() -> Session {
        Session {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_in: 3600,
            expires_at: None,
            user: AuthUser {
                id: "user-1".into(),
                email: Some("a@b.com".into()),
                user_metadata: serde_json::Value::Null,
            },
        }
    }

    /// 可配置结果的身份服务
    #[derive(Default)]
    struct FakeIdentity {
        stored: Mutex<Option<Session>>,
        unconfirmed: bool,
        resent: AtomicUsize,
        signed_out: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn get_session(&self) -> Result<Option<Session>> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            if self.unconfirmed {
                return Err(AuthError::EmailNotConfirmed);
            }
            if email != "a@b.com" || password != "secret" {
                return Err(AuthError::InvalidCredentials);
            }
            let s = session();
            *self.stored.lock().unwrap() = Some(s.clone());
            Ok(s)
        }

        async fn sign_up(&self, _email: &str, password: &str, _name: &str) -> Result<(), AuthError> {
            if password.len() < 6 {
                return Err(AuthError::Provider("Password should be at least 6 characters".into()));
            }
            Ok(())
        }

        async fn sign_out(&self) -> Result<()> {
            self.signed_out.fetch_add(1, Ordering::SeqCst);
            *self.stored.lock().unwrap() = None;
            Ok(())
        }

        async fn resend_confirmation(&self, _email: &str) -> Result<()> {
            self.resent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// 云端用另一个内存库模拟
    struct FakeBackends {
        backend: Arc<dyn QrCodeBackend>,
        built: AtomicUsize,
    }

    impl CloudBackendBuilder for FakeBackends {
        fn build(&self, _session: &Session) -> Arc<dyn QrCodeBackend> {
            self.built.fetch_add(1, Ordering::SeqCst);
            self.backend.clone()
        }
    }

    async fn memory_backend() -> Result<Arc<dyn QrCodeBackend>> {
        let pool = create_sqlite_pool_with_migration("sqlite::memory:").await?;
        Ok(Arc::new(LocalBackend::new(QrCodeDao::new(LocalCache::new(pool)))))
    }

    async fn client_with(identity: Option<Arc<FakeIdentity>>) -> Result<QrStudioClient> {
        init_test_logger();
        let cloud = match identity {
            Some(identity) => Some(CloudParts {
                identity,
                backends: Arc::new(FakeBackends {
                    backend: memory_backend().await?,
                    built: AtomicUsize::new(0),
                }),
            }),
            None => None,
        };
        Ok(QrStudioClient::with_parts(
            memory_backend().await?,
            cloud,
            QrImageRenderer::default(),
        ))
    }

    #[test]
    fn mode_transitions_follow_state_machine() {
        assert!(AppMode::Checking.can_transition(AppMode::Local, false));
        assert!(!AppMode::Checking.can_transition(AppMode::Auth, false));
        assert!(!AppMode::Checking.can_transition(AppMode::Cloud, true));
        assert!(AppMode::Auth.can_transition(AppMode::Cloud, true));
        assert!(AppMode::Auth.can_transition(AppMode::Local, true));
        assert!(AppMode::Cloud.can_transition(AppMode::Auth, true));
        assert!(!AppMode::Cloud.can_transition(AppMode::Local, true));
        assert!(!AppMode::Local.can_transition(AppMode::Auth, false));
        assert!(AppMode::Local.can_transition(AppMode::Auth, true));
        assert!(!AppMode::Local.can_transition(AppMode::Cloud, true));
    }

    #[tokio::test]
    async fn without_identity_starts_local() -> Result<()> {
        let mut client = client_with(None).await?;
        assert_eq!(client.init().await?, AppMode::Local);
        assert!(client.banner().is_some());
        assert!(client.enter_auth().await.is_err());
        assert!(client.sign_in("a@b.com", "secret").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn restored_session_goes_straight_to_cloud() -> Result<()> {
        let identity = Arc::new(FakeIdentity::default());
        *identity.stored.lock().unwrap() = Some(session());

        let mut client = client_with(Some(identity)).await?;
        assert_eq!(client.init().await?, AppMode::Cloud);
        assert_eq!(client.session().map(|s| s.user.id.as_str()), Some("user-1"));
        Ok(())
    }

    #[tokio::test]
    async fn form_flow_in_local_mode() -> Result<()> {
        let mut client = client_with(Some(Arc::new(FakeIdentity::default()))).await?;
        assert_eq!(client.init().await?, AppMode::Auth);
        assert!(client.submit_form().await.is_err());

        client.skip_login().await?;
        assert_eq!(client.mode(), AppMode::Local);

        client.dispatch(Action::Navigate(Page::Create));
        client.dispatch(Action::SetFields(QrFields::Url("example.com".into())));
        assert!(client.submit_form().await?);
        assert_eq!(client.view().page, Page::Dashboard);
        assert_eq!(client.records().len(), 1);
        assert_eq!(client.records()[0].payload, "https://example.com");
        assert_eq!(client.records()[0].name, "QR 1");

        let id = client.records()[0].id.clone();
        assert!(client.begin_edit(&id));
        assert_eq!(client.view().form.url_input, "https://example.com");
        client.dispatch(Action::SetName("Home page".into()));
        assert!(client.submit_form().await?);
        assert_eq!(client.records().len(), 1);
        assert_eq!(client.records()[0].name, "Home page");
        assert_eq!(client.view().editing, None);

        assert_eq!(client.increment_scan(&id).await?, Some(1));
        assert_eq!(client.stats().total_scans, 1);
        assert!(client.thumbnail_url(&client.records()[0]).contains("size=60x60"));
        Ok(())
    }

    #[tokio::test]
    async fn renaming_structured_record_keeps_payload() -> Result<()> {
        use crate::studio::qr_code::{WifiEncryption, WifiFields};

        let mut client = client_with(None).await?;
        client.init().await?;
        client.dispatch(Action::SelectTab(crate::studio::qr_code::QrKind::Wifi));
        client.dispatch(Action::SetFields(QrFields::Wifi(WifiFields {
            ssid: "Home".into(),
            password: "secret".into(),
            encryption: WifiEncryption::Wpa,
        })));
        assert!(client.submit_form().await?);
        let id = client.records()[0].id.clone();
        assert_eq!(client.records()[0].payload, "WIFI:T:WPA;S:Home;P:secret;;");

        // 只改名称：按命令行编辑的顺序回放
        assert!(client.begin_edit(&id));
        assert!(client.form_reproduces_record());
        let tab = client.view().active_tab;
        client.dispatch(Action::SelectTab(tab));
        let fields = client.view().current_fields();
        client.dispatch(Action::SetFields(fields));
        client.dispatch(Action::SetName("Office".into()));
        assert!(client.submit_form().await?);

        assert_eq!(client.records()[0].name, "Office");
        assert_eq!(client.records()[0].payload, "WIFI:T:WPA;S:Home;P:secret;;");
        Ok(())
    }

    #[tokio::test]
    async fn unrestorable_record_is_reported() -> Result<()> {
        let mut client = client_with(None).await?;
        client.init().await?;
        assert!(!client.form_reproduces_record());

        client.dispatch(Action::SelectTab(crate::studio::qr_code::QrKind::Text));
        client.dispatch(Action::SetFields(QrFields::Text("hello".into())));
        assert!(client.submit_form().await?);
        let id = client.records()[0].id.clone();

        assert!(client.begin_edit(&id));
        assert!(client.form_reproduces_record());
        client.dispatch(Action::SetFields(QrFields::Text("changed".into())));
        assert!(!client.form_reproduces_record());
        Ok(())
    }

    #[tokio::test]
    async fn empty_form_is_rejected() -> Result<()> {
        let mut client = client_with(None).await?;
        client.init().await?;
        assert!(!client.submit_form().await?);
        assert!(client.records().is_empty());
        assert_eq!(client.view().page, Page::Home);
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_and_out() -> Result<()> {
        let identity = Arc::new(FakeIdentity::default());
        let mut client = client_with(Some(identity.clone())).await?;
        client.init().await?;

        assert!(!client.sign_in("a@b.com", "wrong").await?);
        assert_eq!(client.mode(), AppMode::Auth);
        assert_eq!(
            client.view().auth_error.as_deref(),
            Some(prompts::INVALID_CREDENTIALS)
        );

        assert!(client.sign_in("a@b.com", "secret").await?);
        assert_eq!(client.mode(), AppMode::Cloud);
        assert_eq!(client.view().auth_error, None);

        client.dispatch(Action::SetFields(QrFields::Text("hello".into())));
        client.dispatch(Action::SelectTab(crate::studio::qr_code::QrKind::Text));
        assert!(client.submit_form().await?);
        assert_eq!(client.records().len(), 1);

        client.sign_out().await?;
        assert_eq!(client.mode(), AppMode::Auth);
        assert!(client.records().is_empty());
        assert!(client.session().is_none());
        assert_eq!(identity.signed_out.load(Ordering::SeqCst), 1);

        // 重新登录后云端数据仍在
        assert!(client.sign_in("a@b.com", "secret").await?);
        assert_eq!(client.records().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unconfirmed_email_triggers_resend() -> Result<()> {
        let identity = Arc::new(FakeIdentity {
            unconfirmed: true,
            ..Default::default()
        });
        let mut client = client_with(Some(identity.clone())).await?;
        client.init().await?;

        assert!(!client.sign_in("a@b.com", "secret").await?);
        assert_eq!(identity.resent.load(Ordering::SeqCst), 1);
        assert_eq!(
            client.view().auth_notice.as_deref(),
            Some(prompts::EMAIL_NOT_CONFIRMED)
        );
        assert_eq!(client.mode(), AppMode::Auth);
        Ok(())
    }

    #[tokio::test]
    async fn register_from_form() -> Result<()> {
        let mut client = client_with(Some(Arc::new(FakeIdentity::default()))).await?;
        client.init().await?;
        client.dispatch(Action::SetAuthMode(AuthFormMode::Register));
        client.dispatch(Action::SetAuthEmail("new@b.com".into()));
        client.dispatch(Action::SetAuthPassword("123".into()));
        assert!(!client.submit_auth_form().await?);
        assert!(client.view().auth_error.is_some());

        client.dispatch(Action::SetAuthPassword("123456".into()));
        assert!(client.submit_auth_form().await?);
        assert_eq!(client.view().auth_form.mode, AuthFormMode::Login);
        assert_eq!(
            client.view().auth_notice.as_deref(),
            Some(prompts::ACCOUNT_CREATED)
        );
        Ok(())
    }

    #[tokio::test]
    async fn local_mode_can_return_to_auth() -> Result<()> {
        let mut client = client_with(Some(Arc::new(FakeIdentity::default()))).await?;
        client.init().await?;
        client.skip_login().await?;
        client.dispatch(Action::SetFields(QrFields::Url("a.com".into())));
        client.submit_form().await?;

        // 登录会先回到登录页
        assert!(client.sign_in("a@b.com", "secret").await?);
        assert_eq!(client.mode(), AppMode::Cloud);
        assert!(client.records().is_empty());
        Ok(())
    }
}
