use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const CREATED_AT_FORMAT_NO_SECONDS: &str = "%Y-%m-%d %H:%M";

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    #[default]
    English,
    Spanish,
}

impl Locale {
    const fn month_name(self, month0: u32) -> &'static str {
        match self {
            Locale::English => ENGLISH_MONTHS[month0 as usize],
            Locale::Spanish => SPANISH_MONTHS[month0 as usize],
        }
    }

    pub const fn invalid_date_notice(self) -> &'static str {
        match self {
            Locale::English => "Sent on an invalid date",
            Locale::Spanish => "Enviado en una fecha inválida",
        }
    }
}

#[derive(Debug)]
pub struct UnknownLocale(String);

impl Display for UnknownLocale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown display locale `{}` (expected `en` or `es`)", self.0)
    }
}

impl std::error::Error for UnknownLocale {}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "es" | "spanish" => Ok(Locale::Spanish),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct TimestampError {
    pub input: String,
    source: chrono::ParseError,
}

impl Display for TimestampError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid timestamp `{}`: {}", self.input, self.source)
    }
}

impl std::error::Error for TimestampError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub fn parse_created_at(created_at: &str) -> Result<NaiveDateTime, TimestampError> {
    NaiveDateTime::parse_from_str(created_at, CREATED_AT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(created_at, CREATED_AT_FORMAT_NO_SECONDS))
        .map_err(|source| TimestampError {
            input: created_at.to_string(),
            source,
        })
}

/// Renders a `YYYY-MM-DD HH:MM:SS` creation timestamp as a sentence,
/// e.g. `Sent on 15 of January of 2024, 1:05 p.m.`.
pub fn format_sent_at(created_at: &str, locale: Locale) -> Result<String, TimestampError> {
    let datetime = parse_created_at(created_at)?;
    let (is_pm, hour) = datetime.hour12();
    let meridiem = if is_pm { "p.m." } else { "a.m." };
    let day = datetime.day();
    let month = locale.month_name(datetime.month0());
    let year = datetime.year();
    let minute = datetime.minute();

    Ok(match locale {
        Locale::English => {
            format!("Sent on {day} of {month} of {year}, {hour}:{minute:02} {meridiem}")
        }
        Locale::Spanish => {
            format!("Enviado el {day} de {month} de {year}, {hour}:{minute:02} {meridiem}")
        }
    })
}
