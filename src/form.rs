use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::models::ServiceType;

/// A create submission exactly as the dashboard posts it. The client is
/// either referenced by id or spelled out as raw name + phone.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInput {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub service: String,
    /// `YYYY-MM-DD`; defaults to the caller's fallback date when the time is
    /// a bare clock.
    pub date: Option<String>,
    /// `HH:MM` or a full `YYYY-MM-DDTHH:MM[:SS]` instant.
    pub time: String,
    pub duration: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientRef {
    Id(String),
    Details { name: String, phone: String },
}

/// A submission that passed validation; persistence is the caller's job.
#[derive(Debug, Clone)]
pub struct NormalizedAppointment {
    pub client: ClientRef,
    pub service: ServiceType,
    pub starts_at: NaiveDateTime,
    pub duration_minutes: i64,
    pub notes: Option<String>,
}

/// The salon's national prefix followed by 7-9 digits, e.g. `+972591234567`.
pub fn valid_phone(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix("+972") else {
        return false;
    };
    (7..=9).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn validate_user(name: &str, phone: &str) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    if name.trim().chars().count() < 2 {
        errors.push("Client name must be at least 2 characters.".to_string());
    }
    if !valid_phone(phone.trim()) {
        errors.push("Phone must be +972 followed by 7-9 digits.".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Resolves a `HH:MM` clock against `date`, or parses a full instant when
/// the string carries its own date.
pub fn resolve_start(time: &str, date: NaiveDate) -> Result<NaiveDateTime, String> {
    let time = time.trim();
    if time.contains('T') {
        NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M"))
            .map_err(|_| format!("Invalid appointment time {time:?}."))
    } else {
        NaiveTime::parse_from_str(time, "%H:%M")
            .map(|clock| date.and_time(clock))
            .map_err(|_| format!("Invalid appointment time {time:?}."))
    }
}

/// Checks every rule and reports all violations together, the way the
/// dashboard shows them inline.
pub fn validate_appointment(
    input: &AppointmentInput,
    fallback_date: NaiveDate,
) -> Result<NormalizedAppointment, Vec<String>> {
    let mut errors = Vec::new();

    let client = match input.user_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Some(ClientRef::Id(id.to_string())),
        _ => {
            let name = input.name.as_deref().unwrap_or("").trim().to_string();
            let phone = input.phone.as_deref().unwrap_or("").trim().to_string();
            match validate_user(&name, &phone) {
                Ok(()) => Some(ClientRef::Details { name, phone }),
                Err(user_errors) => {
                    errors.extend(user_errors);
                    None
                }
            }
        }
    };

    let service = match ServiceType::parse(&input.service) {
        Some(service) => Some(service),
        None => {
            errors.push(format!("Unknown service type {:?}.", input.service));
            None
        }
    };

    let date = match input.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push(format!("Invalid appointment date {raw:?}."));
                None
            }
        },
        _ => Some(fallback_date),
    };

    let starts_at = if input.time.trim().is_empty() {
        errors.push("Appointment time is required.".to_string());
        None
    } else {
        match date {
            Some(date) => match resolve_start(&input.time, date) {
                Ok(starts_at) => Some(starts_at),
                Err(message) => {
                    errors.push(message);
                    None
                }
            },
            None => None,
        }
    };

    let duration_minutes = match input.duration {
        Some(duration) if duration <= 0 => {
            errors.push("Duration must be positive.".to_string());
            None
        }
        Some(duration) => Some(duration),
        None => service.map(ServiceType::duration_minutes),
    };

    match (client, service, starts_at, duration_minutes) {
        (Some(client), Some(service), Some(starts_at), Some(duration_minutes))
            if errors.is_empty() =>
        {
            Ok(NormalizedAppointment {
                client,
                service,
                starts_at,
                duration_minutes,
                notes: input
                    .notes
                    .as_deref()
                    .map(str::trim)
                    .filter(|notes| !notes.is_empty())
                    .map(str::to_string),
            })
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AppointmentInput {
        AppointmentInput {
            user_id: Some("u1".to_string()),
            name: None,
            phone: None,
            service: "MANICURE".to_string(),
            date: Some("2025-06-25".to_string()),
            time: "14:00".to_string(),
            duration: None,
            notes: None,
        }
    }

    fn fallback() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn a_referenced_client_with_grid_time_normalizes() {
        let normalized = validate_appointment(&input(), fallback()).unwrap();
        assert_eq!(normalized.client, ClientRef::Id("u1".to_string()));
        assert_eq!(normalized.service, ServiceType::Manicure);
        assert_eq!(normalized.starts_at.to_string(), "2025-06-25 14:00:00");
        assert_eq!(normalized.duration_minutes, 45);
    }

    #[test]
    fn duration_is_derived_from_the_service_unless_supplied() {
        let mut both = input();
        both.service = "BOTH_FULL".to_string();
        assert_eq!(
            validate_appointment(&both, fallback()).unwrap().duration_minutes,
            90
        );

        both.duration = Some(120);
        assert_eq!(
            validate_appointment(&both, fallback()).unwrap().duration_minutes,
            120
        );
    }

    #[test]
    fn raw_client_details_are_validated() {
        let mut raw = input();
        raw.user_id = None;
        raw.name = Some("G".to_string());
        raw.phone = Some("0591234567".to_string());
        let errors = validate_appointment(&raw, fallback()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("at least 2 characters"));
        assert!(errors[1].contains("+972"));

        raw.name = Some("Ghazal".to_string());
        raw.phone = Some("+972591234567".to_string());
        let normalized = validate_appointment(&raw, fallback()).unwrap();
        assert_eq!(
            normalized.client,
            ClientRef::Details {
                name: "Ghazal".to_string(),
                phone: "+972591234567".to_string()
            }
        );
    }

    #[test]
    fn phone_prefix_and_digit_count_are_enforced() {
        assert!(valid_phone("+9725912345"));
        assert!(valid_phone("+972591234567"));
        assert!(!valid_phone("+972591"));
        assert!(!valid_phone("+9725912345678"));
        assert!(!valid_phone("+1591234567"));
        assert!(!valid_phone("+97259123456a"));
        assert!(!valid_phone(""));
    }

    #[test]
    fn missing_time_and_bad_service_are_reported_together() {
        let mut bad = input();
        bad.service = "HAIRCUT".to_string();
        bad.time = "  ".to_string();
        let errors = validate_appointment(&bad, fallback()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn non_positive_durations_are_rejected() {
        let mut bad = input();
        bad.duration = Some(0);
        let errors = validate_appointment(&bad, fallback()).unwrap_err();
        assert_eq!(errors, vec!["Duration must be positive.".to_string()]);
    }

    #[test]
    fn a_full_instant_overrides_the_date_field() {
        let mut iso = input();
        iso.time = "2025-07-01T09:30:00".to_string();
        let normalized = validate_appointment(&iso, fallback()).unwrap();
        assert_eq!(normalized.starts_at.to_string(), "2025-07-01 09:30:00");
    }

    #[test]
    fn bare_times_fall_back_to_the_target_date() {
        let mut bare = input();
        bare.date = None;
        let normalized = validate_appointment(&bare, fallback()).unwrap();
        assert_eq!(normalized.starts_at.to_string(), "2025-01-01 14:00:00");
    }
}
