use serde::{Deserialize, Serialize};

/// Working-hours window of the salon. Both bounds are plain hours; the
/// closing hour is exclusive, so 8..20 yields slots from 08:00 to 19:30.
pub const OPEN_HOUR: u32 = 8;
pub const CLOSE_HOUR: u32 = 20;

pub const DEFAULT_LANG: Lang = Lang::Ar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Ar,
}

impl Lang {
    /// Anything that is not recognisably English falls back to Arabic,
    /// the salon's own language.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Lang::En,
            _ => Lang::Ar,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ar => "ar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "MANICURE")]
    Manicure,
    #[serde(rename = "PEDICURE")]
    Pedicure,
    #[serde(rename = "BOTH_BASIC")]
    BothBasic,
    #[serde(rename = "BOTH_FULL")]
    BothFull,
    #[serde(rename = "EYEBROWS")]
    Eyebrows,
    #[serde(rename = "LASHES")]
    Lashes,
}

impl ServiceType {
    pub const ALL: [ServiceType; 6] = [
        ServiceType::Manicure,
        ServiceType::Pedicure,
        ServiceType::BothBasic,
        ServiceType::BothFull,
        ServiceType::Eyebrows,
        ServiceType::Lashes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Manicure => "MANICURE",
            ServiceType::Pedicure => "PEDICURE",
            ServiceType::BothBasic => "BOTH_BASIC",
            ServiceType::BothFull => "BOTH_FULL",
            ServiceType::Eyebrows => "EYEBROWS",
            ServiceType::Lashes => "LASHES",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|service| service.as_str() == raw)
    }

    /// Default booking length, used whenever a submission does not carry an
    /// explicit duration.
    pub fn duration_minutes(self) -> i64 {
        match self {
            ServiceType::Manicure => 45,
            ServiceType::Pedicure => 45,
            ServiceType::BothBasic => 60,
            ServiceType::BothFull => 90,
            ServiceType::Eyebrows => 15,
            ServiceType::Lashes => 45,
        }
    }

    pub fn label(self, lang: Lang) -> &'static str {
        match (self, lang) {
            (ServiceType::Manicure, Lang::En) => "Manicure",
            (ServiceType::Manicure, Lang::Ar) => "مانيكير",
            (ServiceType::Pedicure, Lang::En) => "Pedicure",
            (ServiceType::Pedicure, Lang::Ar) => "باديكير",
            (ServiceType::BothBasic, Lang::En) => "Basic Manicure & Pedicure",
            (ServiceType::BothBasic, Lang::Ar) => "مانيكير و باديكير أساسي",
            (ServiceType::BothFull, Lang::En) => "Full Manicure & Pedicure",
            (ServiceType::BothFull, Lang::Ar) => "مانيكير و باديكير كامل",
            (ServiceType::Eyebrows, Lang::En) => "Eyebrows",
            (ServiceType::Eyebrows, Lang::Ar) => "حواجب",
            (ServiceType::Lashes, Lang::En) => "Lashes",
            (ServiceType::Lashes, Lang::Ar) => "رموش",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub created_at: String,
}

/// An appointment row joined with its client, as every fetch returns it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppointmentRow {
    pub id: String,
    pub user_id: String,
    pub service: String,
    pub starts_at: String,
    pub duration_minutes: i64,
    pub notes: Option<String>,
    pub created_at: String,
    pub user_name: String,
    pub user_phone: String,
}

/// Wire representation of a client. The dashboard speaks camelCase, and the
/// only identifier it ever sees is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            phone: row.phone,
        }
    }
}

/// Wire representation of an appointment with the client embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub service: String,
    /// Wall-clock start instant, `YYYY-MM-DDTHH:MM:SS`.
    pub time: String,
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.user_name,
            phone: row.user_phone,
            service: row.service,
            time: row.starts_at,
            duration: row.duration_minutes,
            notes: row.notes,
        }
    }
}
