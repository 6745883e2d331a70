use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::models::Appointment;

/// One half-hour bucket of the day view. Derived on every request, never
/// stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySlot {
    pub label: String,
    pub appointments: Vec<Appointment>,
    pub is_past: bool,
}

/// `HH:MM` labels for every half-hour boundary in `[open_hour, close_hour)`.
pub fn slot_labels(open_hour: u32, close_hour: u32) -> Vec<String> {
    let mut labels = Vec::new();
    for hour in open_hour..close_hour {
        for minute in [0u32, 30] {
            labels.push(format!("{hour:02}:{minute:02}"));
        }
    }
    labels
}

/// Builds the ordered slot sequence for one day.
///
/// Appointments are grouped by string equality between their formatted
/// `HH:MM` start and the slot label; an appointment that does not land
/// exactly on a half-hour boundary belongs to no slot and is only logged.
/// `now` is passed in so the past/future split is the caller's clock, not
/// ours.
pub fn build_day_schedule(
    date: NaiveDate,
    open_hour: u32,
    close_hour: u32,
    appointments: &[Appointment],
    now: NaiveDateTime,
) -> Vec<DaySlot> {
    let mut slots: Vec<DaySlot> = slot_labels(open_hour, close_hour)
        .into_iter()
        .map(|label| {
            let is_past = slot_is_past(date, &label, now);
            DaySlot {
                label,
                appointments: Vec::new(),
                is_past,
            }
        })
        .collect();

    for appointment in appointments {
        let Some(label) = start_label(appointment) else {
            log::warn!(
                "Appointment {} has an unparseable start time {:?}",
                appointment.id,
                appointment.time
            );
            continue;
        };
        match slots.iter_mut().find(|slot| slot.label == label) {
            Some(slot) => slot.appointments.push(appointment.clone()),
            None => log::warn!(
                "Appointment {} at {} does not align to the half-hour grid",
                appointment.id,
                label
            ),
        }
    }

    slots
}

/// The `HH:MM` portion of the stored `YYYY-MM-DDTHH:MM:SS` start instant.
fn start_label(appointment: &Appointment) -> Option<String> {
    let clock = appointment.time.split('T').nth(1)?;
    let label = clock.get(0..5)?;
    parse_label(label)?;
    Some(label.to_string())
}

fn parse_label(label: &str) -> Option<(u32, u32)> {
    let (hour, minute) = label.split_once(':')?;
    Some((hour.parse().ok()?, minute.parse().ok()?))
}

/// A slot is in the past only on today's date, and only strictly before the
/// current hour:minute. Any other date, earlier or later, is never "past".
fn slot_is_past(date: NaiveDate, label: &str, now: NaiveDateTime) -> bool {
    if date != now.date() {
        return false;
    }
    match parse_label(label) {
        Some((hour, minute)) => (hour, minute) < (now.hour(), now.minute()),
        None => false,
    }
}
