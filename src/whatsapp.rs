use std::{env, fmt};

use serde_json::{json, Value};

use crate::models::Lang;

/// WhatsApp Cloud API credentials, read once at startup. Delivery is simply
/// disabled when they are not set; nothing panics.
#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub api_version: String,
    pub phone_number_id: String,
    pub access_token: String,
    pub template_name: String,
}

impl WhatsAppConfig {
    pub fn from_env() -> Self {
        Self {
            api_version: env::var("WHATSAPP_VERSION").unwrap_or_else(|_| "v22.0".to_string()),
            phone_number_id: env::var("WHATSAPP_ID").unwrap_or_default(),
            access_token: env::var("WHATSAPP_TOKEN").unwrap_or_default(),
            template_name: env::var("WHATSAPP_TEMPLATE")
                .unwrap_or_else(|_| "appointment_reminder".to_string()),
        }
    }

    pub fn enabled(&self) -> bool {
        !(self.phone_number_id.trim().is_empty() || self.access_token.trim().is_empty())
    }

    fn messages_url(&self) -> String {
        format!(
            "https://graph.facebook.com/{}/{}/messages",
            self.api_version, self.phone_number_id
        )
    }
}

#[derive(Debug)]
pub enum SendError {
    /// The appointment's client has no phone number; checked before any
    /// network call.
    MissingPhone,
    /// Credentials are not configured; also checked before any network call.
    NotConfigured,
    /// The provider answered non-2xx; carries its `error.message` when the
    /// payload has one.
    Provider { status: u16, message: String },
    Transport(reqwest::Error),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::MissingPhone => f.write_str("client has no phone number"),
            SendError::NotConfigured => f.write_str("WhatsApp delivery is not configured"),
            SendError::Provider { status, message } => {
                write!(f, "WhatsApp API error {status}: {message}")
            }
            SendError::Transport(err) => write!(f, "WhatsApp request failed: {err}"),
        }
    }
}

impl std::error::Error for SendError {}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        SendError::Transport(err)
    }
}

/// Digits only, as the Cloud API wants recipients.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn recipient(phone: &str) -> Result<String, SendError> {
    let digits = normalize_phone(phone);
    if digits.is_empty() {
        return Err(SendError::MissingPhone);
    }
    Ok(digits)
}

fn template_body(config: &WhatsAppConfig, to: &str, lang: Lang, params: [&str; 4]) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "recipient_type": "individual",
        "type": "template",
        "template": {
            "name": config.template_name,
            "language": { "code": lang.code() },
            "components": [{
                "type": "body",
                "parameters": params
                    .iter()
                    .map(|text| json!({ "type": "text", "text": text }))
                    .collect::<Vec<_>>(),
            }],
        },
    })
}

fn text_body(to: &str, body: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "recipient_type": "individual",
        "type": "text",
        "text": { "body": body },
    })
}

/// Sends the pre-approved business template with the ordered body
/// parameters `[clientName, date, time, service]`.
pub async fn send_template(
    config: &WhatsAppConfig,
    http: &reqwest::Client,
    phone: &str,
    lang: Lang,
    params: [&str; 4],
) -> Result<(), SendError> {
    let to = recipient(phone)?;
    if !config.enabled() {
        return Err(SendError::NotConfigured);
    }
    post_message(config, http, template_body(config, &to, lang, params)).await
}

/// Sends a freeform text message.
pub async fn send_text(
    config: &WhatsAppConfig,
    http: &reqwest::Client,
    phone: &str,
    body: &str,
) -> Result<(), SendError> {
    let to = recipient(phone)?;
    if !config.enabled() {
        return Err(SendError::NotConfigured);
    }
    post_message(config, http, text_body(&to, body)).await
}

async fn post_message(
    config: &WhatsAppConfig,
    http: &reqwest::Client,
    body: Value,
) -> Result<(), SendError> {
    let response = http
        .post(config.messages_url())
        .header("Authorization", format!("Bearer {}", config.access_token))
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let text = response.text().await.unwrap_or_default();
    log::warn!("WhatsApp API error {status}: {text}");
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text);
    Err(SendError::Provider {
        status: status.as_u16(),
        message,
    })
}
