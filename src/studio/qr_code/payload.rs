//! 二维码内容生成
//!
//! 把各类型表单字段拼成最终写入二维码的字符串。除邮件/短信的正文外不做任何转义，
//! vCard 与 Wi-Fi 字段中出现 `;`、`:` 或换行会破坏格式。

use crate::studio::prompts;
use crate::studio::qr_code::models::QrKind;
use crate::studio::serialization::{decode_uri_component, encode_uri_component};
use serde::{Deserialize, Serialize};

const HTTPS_PREFIX: &str = "https://";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VCardFields {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub company: String,
    pub title: String,
    pub website: String,
    pub address: String,
}

/// Wi-Fi 加密方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiEncryption {
    #[default]
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "nopass")]
    NoPass,
}

impl WifiEncryption {
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::NoPass => "nopass",
        }
    }
}

impl std::str::FromStr for WifiEncryption {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WPA" | "wpa" | "WPA2" | "wpa2" => Ok(WifiEncryption::Wpa),
            "WEP" | "wep" => Ok(WifiEncryption::Wep),
            "nopass" | "none" => Ok(WifiEncryption::NoPass),
            other => Err(anyhow::anyhow!("未知的 Wi-Fi 加密方式: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiFields {
    pub ssid: String,
    pub password: String,
    pub encryption: WifiEncryption,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailFields {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsFields {
    pub phone: String,
    pub message: String,
}

/// 各类型的表单字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "fields", rename_all = "lowercase")]
pub enum QrFields {
    Url(String),
    Text(String),
    Pdf(String),
    Image(String),
    Vcard(VCardFields),
    Video(String),
    Wifi(WifiFields),
    Email(EmailFields),
    Sms(SmsFields),
}

impl QrFields {
    pub fn kind(&self) -> QrKind {
        match self {
            QrFields::Url(_) => QrKind::Url,
            QrFields::Text(_) => QrKind::Text,
            QrFields::Pdf(_) => QrKind::Pdf,
            QrFields::Image(_) => QrKind::Image,
            QrFields::Vcard(_) => QrKind::Vcard,
            QrFields::Video(_) => QrKind::Video,
            QrFields::Wifi(_) => QrKind::Wifi,
            QrFields::Email(_) => QrKind::Email,
            QrFields::Sms(_) => QrKind::Sms,
        }
    }

    /// 某类型的空表单
    pub fn empty(kind: QrKind) -> Self {
        match kind {
            QrKind::Url => QrFields::Url(String::new()),
            QrKind::Text => QrFields::Text(String::new()),
            QrKind::Pdf => QrFields::Pdf(String::new()),
            QrKind::Image => QrFields::Image(String::new()),
            QrKind::Vcard => QrFields::Vcard(VCardFields::default()),
            QrKind::Video => QrFields::Video(String::new()),
            QrKind::Wifi => QrFields::Wifi(WifiFields::default()),
            QrKind::Email => QrFields::Email(EmailFields::default()),
            QrKind::Sms => QrFields::Sms(SmsFields::default()),
        }
    }

    /// 从已保存的记录恢复表单
    ///
    /// 结构化类型（vCard、Wi-Fi、邮件、短信）按生成格式反解，
    /// 反解结果重新生成后必须与原内容一致，否则返回空表单。
    pub fn from_record(kind: QrKind, payload: &str) -> Self {
        Self::parse(kind, payload).unwrap_or_else(|| QrFields::empty(kind))
    }

    /// 反解内容，无法无损还原时返回 None
    pub fn parse(kind: QrKind, payload: &str) -> Option<Self> {
        let value = payload.to_string();
        let fields = match kind {
            QrKind::Url => QrFields::Url(value),
            QrKind::Text => QrFields::Text(value),
            QrKind::Pdf => QrFields::Pdf(value),
            QrKind::Image => QrFields::Image(value),
            QrKind::Video => QrFields::Video(value),
            QrKind::Vcard => QrFields::Vcard(parse_vcard(payload)?),
            QrKind::Wifi => QrFields::Wifi(parse_wifi(payload)?),
            QrKind::Email => QrFields::Email(parse_email(payload)?),
            QrKind::Sms => QrFields::Sms(parse_sms(payload)?),
        };
        (build_payload(&fields) == payload).then_some(fields)
    }
}

fn parse_wifi(payload: &str) -> Option<WifiFields> {
    let body = payload.strip_prefix("WIFI:T:")?.strip_suffix(";;")?;
    let (encryption, rest) = body.split_once(";S:")?;
    let (ssid, password) = rest.rsplit_once(";P:")?;
    Some(WifiFields {
        ssid: ssid.to_string(),
        password: password.to_string(),
        encryption: encryption.parse().ok()?,
    })
}

fn parse_email(payload: &str) -> Option<EmailFields> {
    let rest = payload.strip_prefix("mailto:")?;
    let (to, query) = rest.split_once("?subject=")?;
    let (subject, body) = query.split_once("&body=")?;
    Some(EmailFields {
        to: to.to_string(),
        subject: decode_uri_component(subject)?,
        body: decode_uri_component(body)?,
    })
}

fn parse_sms(payload: &str) -> Option<SmsFields> {
    let rest = payload.strip_prefix("sms:")?;
    let (phone, message) = rest.split_once("?body=")?;
    Some(SmsFields {
        phone: phone.to_string(),
        message: decode_uri_component(message)?,
    })
}

fn parse_vcard(payload: &str) -> Option<VCardFields> {
    let mut v = VCardFields::default();
    for line in payload.lines() {
        if let Some(name) = line.strip_prefix("N:") {
            let (last, first) = name.split_once(';')?;
            v.last_name = last.to_string();
            v.first_name = first.to_string();
        } else if let Some(org) = line.strip_prefix("ORG:") {
            v.company = org.to_string();
        } else if let Some(title) = line.strip_prefix("TITLE:") {
            v.title = title.to_string();
        } else if let Some(tel) = line.strip_prefix("TEL:") {
            v.phone = tel.to_string();
        } else if let Some(email) = line.strip_prefix("EMAIL:") {
            v.email = email.to_string();
        } else if let Some(url) = line.strip_prefix("URL:") {
            v.website = url.to_string();
        } else if let Some(adr) = line.strip_prefix("ADR:;;") {
            v.address = adr.to_string();
        }
    }
    Some(v)
}

/// 生成写入二维码的内容
pub fn build_payload(fields: &QrFields) -> String {
    match fields {
        QrFields::Url(url) => {
            if url.starts_with("http") {
                url.clone()
            } else {
                format!("{}{}", HTTPS_PREFIX, url)
            }
        }
        QrFields::Text(text) => text.clone(),
        QrFields::Pdf(url) | QrFields::Image(url) | QrFields::Video(url) => url.clone(),
        QrFields::Vcard(v) => format!(
            "BEGIN:VCARD\nVERSION:3.0\nN:{last};{first}\nFN:{first} {last}\nORG:{org}\nTITLE:{title}\nTEL:{tel}\nEMAIL:{email}\nURL:{url}\nADR:;;{adr}\nEND:VCARD",
            last = v.last_name,
            first = v.first_name,
            org = v.company,
            title = v.title,
            tel = v.phone,
            email = v.email,
            url = v.website,
            adr = v.address,
        ),
        QrFields::Wifi(w) => format!(
            "WIFI:T:{};S:{};P:{};;",
            w.encryption.as_str(),
            w.ssid,
            w.password
        ),
        QrFields::Email(e) => format!(
            "mailto:{}?subject={}&body={}",
            e.to,
            encode_uri_component(&e.subject),
            encode_uri_component(&e.body)
        ),
        QrFields::Sms(s) => format!("sms:{}?body={}", s.phone, encode_uri_component(&s.message)),
    }
}

/// 校验内容：空字符串或只有 `https://` 前缀时返回提示文案
pub fn validate_payload(payload: &str) -> Result<(), &'static str> {
    if payload.is_empty() || payload == HTTPS_PREFIX {
        return Err(prompts::ENTER_DATA);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_gets_https_prefix_only_when_scheme_missing() {
        assert_eq!(build_payload(&QrFields::Url("example.com".into())), "https://example.com");
        assert_eq!(
            build_payload(&QrFields::Url("http://example.com/a".into())),
            "http://example.com/a"
        );
        assert_eq!(
            build_payload(&QrFields::Url("https://example.com".into())),
            "https://example.com"
        );
        // 空输入只剩前缀，会被校验拒绝
        assert_eq!(build_payload(&QrFields::Url(String::new())), "https://");
    }

    #[test]
    fn wifi_payload_is_exact() {
        let fields = QrFields::Wifi(WifiFields {
            ssid: "Home".into(),
            password: "secret".into(),
            encryption: WifiEncryption::Wpa,
        });
        assert_eq!(build_payload(&fields), "WIFI:T:WPA;S:Home;P:secret;;");
    }

    #[test]
    fn email_encodes_subject_and_body_but_not_recipient() {
        let fields = QrFields::Email(EmailFields {
            to: "a@b.com".into(),
            subject: "Hi".into(),
            body: "Hello".into(),
        });
        assert_eq!(build_payload(&fields), "mailto:a@b.com?subject=Hi&body=Hello");

        let fields = QrFields::Email(EmailFields {
            to: "a+b@c.com".into(),
            subject: "Q&A time".into(),
            body: "see you?".into(),
        });
        assert_eq!(
            build_payload(&fields),
            "mailto:a+b@c.com?subject=Q%26A%20time&body=see%20you%3F"
        );
    }

    #[test]
    fn sms_encodes_body_only() {
        let fields = QrFields::Sms(SmsFields {
            phone: "+201000000000".into(),
            message: "call me".into(),
        });
        assert_eq!(build_payload(&fields), "sms:+201000000000?body=call%20me");
    }

    #[test]
    fn vcard_block_has_fixed_layout() {
        let fields = QrFields::Vcard(VCardFields {
            first_name: "Ahmed".into(),
            last_name: "Ali".into(),
            phone: "123".into(),
            email: "a@b.com".into(),
            company: "Acme".into(),
            title: "CTO".into(),
            website: "https://acme.io".into(),
            address: "Cairo".into(),
        });
        assert_eq!(
            build_payload(&fields),
            "BEGIN:VCARD\nVERSION:3.0\nN:Ali;Ahmed\nFN:Ahmed Ali\nORG:Acme\nTITLE:CTO\nTEL:123\nEMAIL:a@b.com\nURL:https://acme.io\nADR:;;Cairo\nEND:VCARD"
        );
    }

    #[test]
    fn link_kinds_pass_through_unvalidated() {
        for fields in [
            QrFields::Pdf("not a url".into()),
            QrFields::Image("not a url".into()),
            QrFields::Video("not a url".into()),
            QrFields::Text("not a url".into()),
        ] {
            assert_eq!(build_payload(&fields), "not a url");
            assert_eq!(build_payload(&fields), build_payload(&fields.clone()));
        }
    }

    #[test]
    fn empty_and_bare_scheme_are_rejected() {
        assert_eq!(validate_payload(""), Err(prompts::ENTER_DATA));
        assert_eq!(validate_payload("https://"), Err(prompts::ENTER_DATA));
        assert_eq!(validate_payload("https://a"), Ok(()));
        assert_eq!(validate_payload("WIFI:T:WPA;S:;P:;;"), Ok(()));
    }

    #[test]
    fn structured_kinds_restore_from_record() {
        assert_eq!(
            QrFields::from_record(QrKind::Pdf, "https://x/y.pdf"),
            QrFields::Pdf("https://x/y.pdf".into())
        );
        assert_eq!(
            QrFields::from_record(QrKind::Wifi, "WIFI:T:WPA;S:Home;P:secret;;"),
            QrFields::Wifi(WifiFields {
                ssid: "Home".into(),
                password: "secret".into(),
                encryption: WifiEncryption::Wpa,
            })
        );
        assert_eq!(
            QrFields::from_record(
                QrKind::Email,
                "mailto:a+b@c.com?subject=Q%26A%20time&body=see%20you%3F"
            ),
            QrFields::Email(EmailFields {
                to: "a+b@c.com".into(),
                subject: "Q&A time".into(),
                body: "see you?".into(),
            })
        );
        assert_eq!(
            QrFields::from_record(QrKind::Sms, "sms:+20100?body=call%20me"),
            QrFields::Sms(SmsFields {
                phone: "+20100".into(),
                message: "call me".into(),
            })
        );

        let card = VCardFields {
            first_name: "Ahmed".into(),
            last_name: "Ali".into(),
            phone: "123".into(),
            email: "a@b.com".into(),
            company: "Acme".into(),
            title: "CTO".into(),
            website: "https://acme.io".into(),
            address: "Cairo".into(),
        };
        let payload = build_payload(&QrFields::Vcard(card.clone()));
        assert_eq!(
            QrFields::from_record(QrKind::Vcard, &payload),
            QrFields::Vcard(card)
        );
    }

    #[test]
    fn unparseable_payload_reopens_empty() {
        // 加密方式不是生成时的写法，重新生成会不一致
        assert_eq!(QrFields::parse(QrKind::Wifi, "WIFI:T:wpa;S:a;P:b;;"), None);
        assert_eq!(
            QrFields::from_record(QrKind::Wifi, "garbage"),
            QrFields::Wifi(WifiFields::default())
        );
        assert_eq!(QrFields::parse(QrKind::Sms, "tel:123"), None);
    }
}
