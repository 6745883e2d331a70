use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cache::{TimedCache, USER_CACHE_TTL};
use crate::models::{Appointment, Lang, User};

/// Typed client for the PureNails REST API: request/response shaping only.
///
/// Each call is awaited to completion. The client issues no concurrent
/// requests of its own and does not sequence overlapping calls made by the
/// caller; a slow response can still overwrite a newer one on the caller's
/// side.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    users: TimedCache<Vec<User>>,
}

#[derive(Debug)]
pub enum ClientError {
    Transport(reqwest::Error),
    /// Any non-2xx response, carrying the status line and the body text.
    Status {
        action: &'static str,
        status: u16,
        reason: &'static str,
        body: String,
    },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(err) => write!(f, "Request failed: {err}"),
            ClientError::Status {
                action,
                status,
                reason,
                body,
            } => write!(f, "{action}: {status} {reason} - {body}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct UserPayload<'a> {
    name: &'a str,
    phone: &'a str,
}

/// The `{success, message}` body of delete/reminder endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            users: TimedCache::new(USER_CACHE_TTL),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub async fn appointments_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/appointments?date={date}")))
            .send()
            .await?;
        let response = expect_ok("Failed to fetch appointments", response).await?;
        Ok(response.json().await?)
    }

    pub async fn create_appointment(
        &mut self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, ClientError> {
        let response = self
            .http
            .post(self.url("/appointments"))
            .json(appointment)
            .send()
            .await?;
        let response = expect_ok("Failed to create appointment", response).await?;
        self.users.invalidate();
        Ok(response.json().await?)
    }

    pub async fn update_appointment(
        &mut self,
        id: &str,
        patch: &AppointmentPatch,
    ) -> Result<Appointment, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/appointments/{id}")))
            .json(patch)
            .send()
            .await?;
        let response = expect_ok("Failed to update appointment", response).await?;
        self.users.invalidate();
        Ok(response.json().await?)
    }

    pub async fn delete_appointment(&mut self, id: &str) -> Result<Outcome, ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/appointments/{id}")))
            .send()
            .await?;
        let response = expect_ok("Failed to delete appointment", response).await?;
        self.users.invalidate();
        Ok(response.json().await?)
    }

    /// The client list, served from the time-boxed cache while it is fresh.
    pub async fn users(&mut self) -> Result<Vec<User>, ClientError> {
        if let Some(users) = self.users.get() {
            return Ok(users.clone());
        }
        let response = self.http.get(self.url("/users")).send().await?;
        let response = expect_ok("Failed to fetch users", response).await?;
        let users: Vec<User> = response.json().await?;
        self.users.store(users.clone());
        Ok(users)
    }

    pub async fn create_user(&mut self, name: &str, phone: &str) -> Result<User, ClientError> {
        let response = self
            .http
            .post(self.url("/users"))
            .json(&UserPayload { name, phone })
            .send()
            .await?;
        let response = expect_ok("Failed to create user", response).await?;
        self.users.invalidate();
        Ok(response.json().await?)
    }

    pub async fn update_user(
        &mut self,
        id: &str,
        name: &str,
        phone: &str,
    ) -> Result<User, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/users/{id}")))
            .json(&UserPayload { name, phone })
            .send()
            .await?;
        let response = expect_ok("Failed to update user", response).await?;
        self.users.invalidate();
        Ok(response.json().await?)
    }

    pub async fn delete_user(&mut self, id: &str) -> Result<Outcome, ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/users/{id}")))
            .send()
            .await?;
        let response = expect_ok("Failed to delete user", response).await?;
        self.users.invalidate();
        Ok(response.json().await?)
    }

    pub async fn search_users_by_phone(&self, phone: &str) -> Result<Vec<User>, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/users/search?phone={phone}")))
            .send()
            .await?;
        let response = expect_ok("Failed to search users", response).await?;
        Ok(response.json().await?)
    }

    pub async fn search_user_by_id(&self, id: &str) -> Result<Vec<User>, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/users/search?id={id}")))
            .send()
            .await?;
        let response = expect_ok("Failed to search users", response).await?;
        Ok(response.json().await?)
    }

    pub async fn send_whatsapp(&self, id: &str, lang: Lang) -> Result<Outcome, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/appointments/{id}/send-whatsapp")))
            .json(&serde_json::json!({ "lang": lang.code() }))
            .send()
            .await?;
        let response = expect_ok("Failed to send reminder", response).await?;
        Ok(response.json().await?)
    }

    pub async fn send_daily_reminders(&self) -> Result<Outcome, ClientError> {
        let response = self
            .http
            .post(self.url("/send-daily-reminders"))
            .send()
            .await?;
        let response = expect_ok("Failed to send reminders", response).await?;
        Ok(response.json().await?)
    }

    pub async fn send_tomorrow_reminders(&self) -> Result<Outcome, ClientError> {
        let response = self
            .http
            .post(self.url("/send-tomorrow-reminders"))
            .send()
            .await?;
        let response = expect_ok("Failed to send reminders", response).await?;
        Ok(response.json().await?)
    }
}

async fn expect_ok(
    action: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ClientError::Status {
        action,
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or(""),
        body,
    })
}
