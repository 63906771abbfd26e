//! 界面状态
//!
//! 页面、标签页、表单与认证表单的全部状态集中在 [`ViewState`] 中，
//! 只能通过 [`ViewState::update`] 修改，便于宿主程序序列化与回放。

use crate::studio::qr_code::models::{
    QrCodeRecord, QrDraft, QrKind, RecordId, DEFAULT_BACKGROUND, DEFAULT_FOREGROUND,
};
use crate::studio::qr_code::payload::{
    build_payload, EmailFields, QrFields, SmsFields, VCardFields, WifiFields,
};
use crate::studio::render::QrImageRequest;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Create,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthFormMode {
    #[default]
    Login,
    Register,
}

/// 登录 / 注册表单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthForm {
    pub mode: AuthFormMode,
    pub email: String,
    pub password: String,
    /// 注册时的显示名称
    pub name: String,
    pub show_password: bool,
}

/// 创建 / 编辑表单，每种类型各自保留输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrForm {
    pub name: String,
    pub foreground_color: String,
    pub background_color: String,
    pub url_input: String,
    pub text_input: String,
    pub pdf_url: String,
    pub image_url: String,
    pub video_url: String,
    pub vcard: VCardFields,
    pub wifi: WifiFields,
    pub email: EmailFields,
    pub sms: SmsFields,
}

impl Default for QrForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            foreground_color: DEFAULT_FOREGROUND.to_string(),
            background_color: DEFAULT_BACKGROUND.to_string(),
            url_input: String::new(),
            text_input: String::new(),
            pdf_url: String::new(),
            image_url: String::new(),
            video_url: String::new(),
            vcard: VCardFields::default(),
            wifi: WifiFields::default(),
            email: EmailFields::default(),
            sms: SmsFields::default(),
        }
    }
}

impl QrForm {
    /// 取出某类型当前的输入
    pub fn fields(&self, kind: QrKind) -> QrFields {
        match kind {
            QrKind::Url => QrFields::Url(self.url_input.clone()),
            QrKind::Text => QrFields::Text(self.text_input.clone()),
            QrKind::Pdf => QrFields::Pdf(self.pdf_url.clone()),
            QrKind::Image => QrFields::Image(self.image_url.clone()),
            QrKind::Video => QrFields::Video(self.video_url.clone()),
            QrKind::Vcard => QrFields::Vcard(self.vcard.clone()),
            QrKind::Wifi => QrFields::Wifi(self.wifi.clone()),
            QrKind::Email => QrFields::Email(self.email.clone()),
            QrKind::Sms => QrFields::Sms(self.sms.clone()),
        }
    }

    /// 写回某类型的输入，其他类型的输入保持不变
    pub fn set_fields(&mut self, fields: QrFields) {
        match fields {
            QrFields::Url(v) => self.url_input = v,
            QrFields::Text(v) => self.text_input = v,
            QrFields::Pdf(v) => self.pdf_url = v,
            QrFields::Image(v) => self.image_url = v,
            QrFields::Video(v) => self.video_url = v,
            QrFields::Vcard(v) => self.vcard = v,
            QrFields::Wifi(v) => self.wifi = v,
            QrFields::Email(v) => self.email = v,
            QrFields::Sms(v) => self.sms = v,
        }
    }
}

/// 界面动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum Action {
    Navigate(Page),
    SelectTab(QrKind),
    SetName(String),
    SetForeground(String),
    SetBackground(String),
    SetFields(QrFields),
    /// 打开已有记录进行编辑
    BeginEdit(QrCodeRecord),
    /// 返回首页并放弃编辑
    CancelEdit,
    /// 保存成功：清空表单并进入仪表盘
    FormSubmitted,
    SetAuthMode(AuthFormMode),
    SetAuthEmail(String),
    SetAuthPassword(String),
    SetAuthName(String),
    ToggleShowPassword,
    AuthFailed(String),
    AuthNotice(String),
    /// 注册成功后切回登录表单
    Registered(String),
    ClearAuthMessages,
    SetLoading(bool),
}

/// 整个界面的可序列化状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub page: Page,
    pub active_tab: QrKind,
    /// 正在编辑的记录 id，None 表示新建
    pub editing: Option<RecordId>,
    pub form: QrForm,
    pub auth_form: AuthForm,
    pub auth_error: Option<String>,
    pub auth_notice: Option<String>,
    pub loading: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 唯一的状态修改入口
    pub fn update(&mut self, action: Action) {
        debug!("[View] 动作: {:?}", action);
        match action {
            Action::Navigate(page) => self.page = page,
            Action::SelectTab(kind) => self.active_tab = kind,
            Action::SetName(name) => self.form.name = name,
            Action::SetForeground(color) => self.form.foreground_color = color,
            Action::SetBackground(color) => self.form.background_color = color,
            Action::SetFields(fields) => self.form.set_fields(fields),
            Action::BeginEdit(record) => {
                self.form = QrForm {
                    name: record.name.clone(),
                    foreground_color: record.foreground_color.clone(),
                    background_color: record.background_color.clone(),
                    ..QrForm::default()
                };
                self.form
                    .set_fields(QrFields::from_record(record.kind, &record.payload));
                self.active_tab = record.kind;
                self.editing = Some(record.id);
                self.page = Page::Create;
            }
            Action::CancelEdit => {
                self.editing = None;
                self.form = QrForm::default();
                self.page = Page::Home;
            }
            Action::FormSubmitted => {
                self.editing = None;
                self.form = QrForm::default();
                self.page = Page::Dashboard;
            }
            Action::SetAuthMode(mode) => {
                self.auth_form.mode = mode;
                self.auth_error = None;
            }
            Action::SetAuthEmail(email) => self.auth_form.email = email,
            Action::SetAuthPassword(password) => self.auth_form.password = password,
            Action::SetAuthName(name) => self.auth_form.name = name,
            Action::ToggleShowPassword => {
                self.auth_form.show_password = !self.auth_form.show_password
            }
            Action::AuthFailed(message) => {
                self.auth_notice = None;
                self.auth_error = Some(message);
            }
            Action::AuthNotice(message) => {
                self.auth_error = None;
                self.auth_notice = Some(message);
            }
            Action::Registered(message) => {
                self.auth_form.mode = AuthFormMode::Login;
                self.auth_error = None;
                self.auth_notice = Some(message);
            }
            Action::ClearAuthMessages => {
                self.auth_error = None;
                self.auth_notice = None;
            }
            Action::SetLoading(loading) => self.loading = loading,
        }
    }

    /// 当前标签页的输入
    pub fn current_fields(&self) -> QrFields {
        self.form.fields(self.active_tab)
    }

    pub fn current_payload(&self) -> String {
        build_payload(&self.current_fields())
    }

    /// 表单转成提交内容
    pub fn draft(&self) -> QrDraft {
        QrDraft::new(self.current_fields())
            .with_name(self.form.name.clone())
            .with_colors(
                self.form.foreground_color.clone(),
                self.form.background_color.clone(),
            )
    }

    /// 表单实时预览
    pub fn preview_request(&self) -> QrImageRequest {
        QrImageRequest::preview(
            &self.current_payload(),
            &self.form.foreground_color,
            &self.form.background_color,
        )
    }
}
