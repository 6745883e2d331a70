use chrono::NaiveDate;

use crate::models::{Lang, ServiceType};

/// AM/PM glyphs are supplied by the caller; nothing in the formatting logic
/// knows which language is in play.
#[derive(Debug, Clone, Copy)]
pub struct MeridiemLabels {
    pub am: &'static str,
    pub pm: &'static str,
}

pub fn meridiem_labels(lang: Lang) -> MeridiemLabels {
    match lang {
        Lang::En => MeridiemLabels { am: "AM", pm: "PM" },
        Lang::Ar => MeridiemLabels {
            am: "صباحاً",
            pm: "مساءً",
        },
    }
}

#[derive(Debug, Clone)]
pub struct TemplateValues<'a> {
    pub client_name: &'a str,
    pub date: &'a str,
    pub time: &'a str,
    pub service: &'a str,
}

/// Substitutes the four known placeholders. Placeholders that are not in
/// this set stay in the text verbatim.
pub fn fill_template(template: &str, values: &TemplateValues<'_>) -> String {
    template
        .replace("{clientName}", values.client_name)
        .replace("{date}", values.date)
        .replace("{time}", values.time)
        .replace("{service}", values.service)
}

/// Renders a `HH:MM`(`:SS`) clock or a `YYYY-MM-DDTHH:MM:SS` instant as
/// `h:mm <glyph>`. Input that does not look like a time is returned as-is.
pub fn format_time_12h(time: &str, labels: &MeridiemLabels) -> String {
    let clock = time.split('T').nth(1).unwrap_or(time);
    let mut parts = clock.splitn(3, ':');
    let hour: u32 = match parts.next().and_then(|raw| raw.trim().parse().ok()) {
        Some(hour) if hour < 24 => hour,
        _ => return time.to_string(),
    };
    let minute = parts.next().unwrap_or("00");

    let glyph = if hour >= 12 { labels.pm } else { labels.am };
    let display_hour = match hour {
        0 => 12,
        1..=12 => hour,
        _ => hour - 12,
    };
    format!("{display_hour}:{minute} {glyph}")
}

pub fn default_template(lang: Lang) -> &'static str {
    match lang {
        Lang::Ar => {
            "مرحباً {clientName}، هذا تذكير بموعدك في صالون بيور نيلز:\n\nالتاريخ: {date}\nالوقت: {time}\nالخدمة: {service}\n\nنتطلع لرؤيتك!"
        }
        Lang::En => {
            "Hello {clientName}, this is a reminder of your appointment at Pure Nails:\n\nDate: {date}\nTime: {time}\nService: {service}\n\nWe look forward to seeing you!"
        }
    }
}

/// The full reminder text for one appointment, in the requested language.
pub fn reminder_message(
    lang: Lang,
    client_name: &str,
    date: NaiveDate,
    time: &str,
    service: ServiceType,
) -> String {
    let labels = meridiem_labels(lang);
    let date = date.format("%Y/%m/%d").to_string();
    let time = format_time_12h(time, &labels);
    fill_template(
        default_template(lang),
        &TemplateValues {
            client_name,
            date: &date,
            time: &time,
            service: service.label(lang),
        },
    )
}
