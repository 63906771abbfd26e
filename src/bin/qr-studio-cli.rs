//! QR Studio CLI 客户端
//!
//! 非交互式 CLI，每次执行一个子命令
//! 配置了 SUPABASE_URL / SUPABASE_ANON_KEY 时使用云端账号，否则只使用本地缓存

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use qr_studio_sdk::studio::auth::{AuthUser, SessionListener};
use qr_studio_sdk::studio::qr_code::QrCodeListener;
use qr_studio_sdk::studio::render::{DOWNLOAD_SIZE, DOWNLOAD_SIZES};
use qr_studio_sdk::{
    Action, AppMode, ClientConfig, ImageFormat, QrFields, QrKind, QrStudioClient, RecordId,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// QR Studio CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "qr-studio-cli")]
#[command(about = "QR Studio CLI - 创建、管理和下载二维码", long_about = None)]
struct Args {
    /// 本地数据库 URL（默认读取 QR_STUDIO_DB_URL）
    #[arg(long, global = true)]
    db_url: Option<String>,

    /// 日志级别（默认: info,qr_studio_sdk=info）
    #[arg(long, global = true, default_value = "info,qr_studio_sdk=info,sqlx=warn")]
    log_level: String,

    /// 同时把日志写入该文件
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// 忽略 Supabase 配置，只使用本地模式
    #[arg(long, global = true)]
    local: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出全部二维码
    List,
    /// 仪表盘统计
    Stats,
    /// 创建二维码
    Create {
        /// 类型：url, text, pdf, image, vcard, video, wifi, email, sms
        kind: QrKind,
        #[command(flatten)]
        form: FormArgs,
    },
    /// 编辑二维码，未指定的字段保持原值
    Edit {
        id: RecordId,
        /// 改成其他类型
        #[arg(long)]
        kind: Option<QrKind>,
        #[command(flatten)]
        form: FormArgs,
    },
    /// 删除二维码
    Delete {
        id: RecordId,
        /// 确认删除
        #[arg(long)]
        yes: bool,
    },
    /// 记录一次扫描并输出内容
    Open { id: RecordId },
    /// 只记录一次扫描
    Scan { id: RecordId },
    /// 下载二维码图片
    Download {
        id: RecordId,
        #[arg(long, default_value = "png")]
        format: ImageFormat,
        /// 边长（像素）：256, 512, 1024
        #[arg(long, default_value_t = DOWNLOAD_SIZE, value_parser = parse_download_size)]
        size: u32,
        /// 输出文件，默认 `<名称>.<格式>`
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 登录
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// 注册
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// 显示名称
        #[arg(long, default_value = "")]
        name: String,
    },
    /// 登出
    Logout,
}

/// 表单字段，只有与类型对应的字段会生效
#[derive(ClapArgs, Debug, Default)]
struct FormArgs {
    /// 名称，留空时为 "QR <n>"
    #[arg(long)]
    name: Option<String>,
    /// 前景色
    #[arg(long)]
    fg: Option<String>,
    /// 背景色
    #[arg(long)]
    bg: Option<String>,
    /// url / text / pdf / image / video 的内容
    #[arg(long)]
    value: Option<String>,

    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    ssid: Option<String>,
    #[arg(long)]
    wifi_password: Option<String>,
    /// WPA, WEP 或 nopass
    #[arg(long)]
    encryption: Option<String>,

    #[arg(long)]
    to: Option<String>,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    body: Option<String>,
    #[arg(long)]
    message: Option<String>,
}

fn parse_download_size(s: &str) -> Result<u32, String> {
    let size: u32 = s.parse().map_err(|e| format!("{}", e))?;
    if DOWNLOAD_SIZES.contains(&size) {
        Ok(size)
    } else {
        Err(format!("可选尺寸: {:?}", DOWNLOAD_SIZES))
    }
}

fn set_opt(target: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

impl FormArgs {
    /// 是否给出了任何内容字段（名称和颜色不算）
    fn has_content(&self) -> bool {
        [
            &self.value,
            &self.first_name,
            &self.last_name,
            &self.phone,
            &self.email,
            &self.company,
            &self.title,
            &self.website,
            &self.address,
            &self.ssid,
            &self.wifi_password,
            &self.encryption,
            &self.to,
            &self.subject,
            &self.body,
            &self.message,
        ]
        .iter()
        .any(|v| v.is_some())
    }

    /// 在已有输入上覆盖命令行给出的字段
    fn merge_into(&self, base: QrFields) -> Result<QrFields> {
        let fields = match base {
            QrFields::Url(mut v) => {
                set_opt(&mut v, &self.value);
                QrFields::Url(v)
            }
            QrFields::Text(mut v) => {
                set_opt(&mut v, &self.value);
                QrFields::Text(v)
            }
            QrFields::Pdf(mut v) => {
                set_opt(&mut v, &self.value);
                QrFields::Pdf(v)
            }
            QrFields::Image(mut v) => {
                set_opt(&mut v, &self.value);
                QrFields::Image(v)
            }
            QrFields::Video(mut v) => {
                set_opt(&mut v, &self.value);
                QrFields::Video(v)
            }
            QrFields::Vcard(mut v) => {
                set_opt(&mut v.first_name, &self.first_name);
                set_opt(&mut v.last_name, &self.last_name);
                set_opt(&mut v.phone, &self.phone);
                set_opt(&mut v.email, &self.email);
                set_opt(&mut v.company, &self.company);
                set_opt(&mut v.title, &self.title);
                set_opt(&mut v.website, &self.website);
                set_opt(&mut v.address, &self.address);
                QrFields::Vcard(v)
            }
            QrFields::Wifi(mut w) => {
                set_opt(&mut w.ssid, &self.ssid);
                set_opt(&mut w.password, &self.wifi_password);
                if let Some(encryption) = &self.encryption {
                    w.encryption = encryption.parse()?;
                }
                QrFields::Wifi(w)
            }
            QrFields::Email(mut e) => {
                set_opt(&mut e.to, &self.to);
                set_opt(&mut e.subject, &self.subject);
                set_opt(&mut e.body, &self.body);
                QrFields::Email(e)
            }
            QrFields::Sms(mut s) => {
                set_opt(&mut s.phone, &self.phone);
                set_opt(&mut s.message, &self.message);
                QrFields::Sms(s)
            }
        };
        Ok(fields)
    }

    /// 把字段写进客户端的表单状态
    fn apply(&self, client: &mut QrStudioClient, kind: QrKind) -> Result<()> {
        client.dispatch(Action::SelectTab(kind));
        let fields = self.merge_into(client.view().current_fields())?;
        client.dispatch(Action::SetFields(fields));
        if let Some(name) = &self.name {
            client.dispatch(Action::SetName(name.clone()));
        }
        if let Some(fg) = &self.fg {
            client.dispatch(Action::SetForeground(fg.clone()));
        }
        if let Some(bg) = &self.bg {
            client.dispatch(Action::SetBackground(bg.clone()));
        }
        Ok(())
    }
}

/// 初始化日志（输出到 stdout，可选同时写文件）
fn init_logger(log_level: &str, log_file: Option<&PathBuf>) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 文件不需要颜色
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("无法创建日志文件 {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(false)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// 设置监听器（输出提示，删除确认取决于 --yes）
fn setup_listeners(client: &mut QrStudioClient, assume_yes: bool) {
    struct CliQrCodeListener {
        assume_yes: bool,
    }

    #[async_trait::async_trait]
    impl QrCodeListener for CliQrCodeListener {
        async fn on_list_changed(&self, _records_json: String) {}

        async fn on_alert(&self, message: String) {
            warn!("[CLI/QrCode] ⚠️ {}", message);
        }

        async fn on_open_url(&self, url: String) {
            info!("[CLI/QrCode] 🔗 {}", url);
        }

        async fn on_confirm_delete(&self, prompt: String, record_name: String) -> bool {
            if !self.assume_yes {
                warn!("[CLI/QrCode] {} ({})，加上 --yes 确认删除", prompt, record_name);
            }
            self.assume_yes
        }
    }
    client.set_qr_code_listener(Arc::new(CliQrCodeListener { assume_yes }));

    struct CliSessionListener;

    #[async_trait::async_trait]
    impl SessionListener for CliSessionListener {
        async fn on_session_changed(&self, user: Option<AuthUser>) {
            match user {
                Some(user) => info!(
                    "[CLI/Auth] 👤 当前用户: {} ({})",
                    user.display_name().unwrap_or_default(),
                    user.email.unwrap_or_default()
                ),
                None => info!("[CLI/Auth] 👋 已退出登录"),
            }
        }
    }
    client.set_session_listener(Arc::new(CliSessionListener));
}

/// 记录相关命令需要一个生效的后端，未登录时使用本地模式
async fn ensure_records(client: &mut QrStudioClient) -> Result<()> {
    if client.mode() == AppMode::Auth {
        info!("[CLI] 未登录，使用本地模式");
        client.skip_login().await?;
    }
    if let Some(banner) = client.banner() {
        info!("[CLI] ℹ️ {}", banner);
    }
    Ok(())
}

fn report_auth_result(client: &QrStudioClient) {
    let view = client.view();
    if let Some(err) = &view.auth_error {
        error!("[CLI] ❌ {}", err);
    }
    if let Some(notice) = &view.auth_notice {
        info!("[CLI] 📧 {}", notice);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_logger(&args.log_level, args.log_file.as_ref())?;

    let mut config = ClientConfig::from_env();
    if let Some(db_url) = &args.db_url {
        config.db_url = db_url.clone();
    }
    if args.local {
        config.supabase = None;
    }

    let mut client = QrStudioClient::new(config).await?;
    let assume_yes = matches!(args.command, Command::Delete { yes: true, .. });
    setup_listeners(&mut client, assume_yes);

    let mode = client.init().await?;
    info!("[CLI] 🚀 QR Studio 已启动，模式: {}", mode);

    match args.command {
        Command::List => {
            ensure_records(&mut client).await?;
            info!("[CLI] 📋 二维码列表（共 {} 个）:", client.records().len());
            for record in client.records() {
                info!(
                    "[CLI]   - {} | {} | {} | 扫描: {} | {} | {}",
                    record.id,
                    record.short_code,
                    record.kind.label(),
                    record.scan_count,
                    record.name,
                    record.payload.replace('\n', " ")
                );
            }
        }
        Command::Stats => {
            ensure_records(&mut client).await?;
            let stats = client.stats();
            info!(
                "[CLI] 📊 总数: {} | 总扫描: {} | 启用: {} | 本周新建: {}",
                stats.total, stats.total_scans, stats.active, stats.created_this_week
            );
        }
        Command::Create { kind, form } => {
            ensure_records(&mut client).await?;
            form.apply(&mut client, kind)?;
            if client.submit_form().await? {
                if let Some(record) = client.records().first() {
                    info!("[CLI] ✅ 已创建: {} ({})", record.name, record.id);
                    info!("[CLI]   内容: {}", record.payload);
                }
            }
        }
        Command::Edit { id, kind, form } => {
            ensure_records(&mut client).await?;
            if !client.begin_edit(&id) {
                return Err(anyhow::anyhow!("二维码不存在: {}", id));
            }
            let stored_kind = client.view().active_tab;
            let kind = kind.unwrap_or(stored_kind);
            // 没给内容参数时必须能原样还原已保存的内容，否则会被空表单覆盖
            if kind == stored_kind && !form.has_content() && !client.form_reproduces_record() {
                return Err(anyhow::anyhow!(
                    "无法从已保存的内容还原 {} 的字段，请用参数重新提供完整内容",
                    id
                ));
            }
            form.apply(&mut client, kind)?;
            if client.submit_form().await? {
                info!("[CLI] ✅ 已更新: {}", id);
            }
        }
        Command::Delete { id, .. } => {
            ensure_records(&mut client).await?;
            if client.delete(&id).await? {
                info!("[CLI] 🗑️ 已删除: {}", id);
            }
        }
        Command::Open { id } => {
            ensure_records(&mut client).await?;
            if client.open(&id).await?.is_none() {
                return Err(anyhow::anyhow!("二维码不存在: {}", id));
            }
        }
        Command::Scan { id } => {
            ensure_records(&mut client).await?;
            match client.increment_scan(&id).await? {
                Some(scans) => info!("[CLI] 📈 {} 扫描次数: {}", id, scans),
                None => return Err(anyhow::anyhow!("二维码不存在: {}", id)),
            }
        }
        Command::Download {
            id,
            format,
            size,
            out,
        } => {
            ensure_records(&mut client).await?;
            let Some((file_name, bytes)) = client.download(&id, format, size).await? else {
                return Err(anyhow::anyhow!("二维码不存在: {}", id));
            };
            let path = out.unwrap_or_else(|| PathBuf::from(file_name));
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("写入文件失败: {}", path.display()))?;
            info!("[CLI] 💾 已保存: {} ({} 字节)", path.display(), bytes.len());
        }
        Command::Login { email, password } => {
            if client.mode() == AppMode::Cloud {
                info!("[CLI] 已经登录");
                return Ok(());
            }
            if client.sign_in(&email, &password).await? {
                info!("[CLI] ✅ 登录成功，云端记录 {} 个", client.records().len());
            } else {
                report_auth_result(&client);
            }
        }
        Command::Register {
            email,
            password,
            name,
        } => {
            if client.mode() == AppMode::Cloud {
                client.sign_out().await?;
            }
            client.sign_up(&email, &password, &name).await?;
            report_auth_result(&client);
        }
        Command::Logout => {
            if client.mode() != AppMode::Cloud {
                info!("[CLI] 当前没有登录");
                return Ok(());
            }
            client.sign_out().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_size_accepts_only_listed_sizes() {
        assert_eq!(parse_download_size("1024"), Ok(1024));
        assert!(parse_download_size("300").is_err());
        assert!(parse_download_size("big").is_err());
        assert!(Args::try_parse_from(["qr-studio-cli", "download", "1", "--size", "333"]).is_err());
        assert!(Args::try_parse_from(["qr-studio-cli", "download", "1", "--size", "256"]).is_ok());
    }

    #[test]
    fn name_and_colors_are_not_content() {
        let form = FormArgs {
            name: Some("Office".into()),
            fg: Some("#111111".into()),
            ..Default::default()
        };
        assert!(!form.has_content());

        let form = FormArgs {
            ssid: Some("Home".into()),
            ..Default::default()
        };
        assert!(form.has_content());
    }
}
