//! Display helpers shared by front ends.

use chrono::{DateTime, Datelike, Utc};

use crate::{
    aggregate::BucketZone,
    model::{Language, Units},
    transform::round_half_up,
};

const WEEKDAYS_EN: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const WEEKDAYS_ES: [&str; 7] = ["lun", "mar", "mié", "jue", "vie", "sáb", "dom"];
const MONTHS_EN: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
const MONTHS_ES: [&str; 12] =
    ["ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic"];

pub fn format_temperature(temp: i32, units: Units) -> String {
    format!("{temp}{}", units.temperature_symbol())
}

pub fn format_wind_speed(speed: f64, units: Units) -> String {
    format!("{speed} {}", units.speed_label())
}

/// Percentage chance of precipitation, or `None` when there is none.
pub fn format_precipitation(pop: f64) -> Option<u8> {
    if pop > 0.0 {
        Some(round_half_up(pop.min(1.0) * 100.0) as u8)
    } else {
        None
    }
}

pub fn icon_url(code: &str, size: &str) -> Option<String> {
    if code.is_empty() {
        return None;
    }
    Some(format!("https://openweathermap.org/img/wn/{code}@{size}.png"))
}

pub fn today_label(language: Language) -> &'static str {
    match language {
        Language::En => "Today",
        Language::Es => "Hoy",
    }
}

/// Fixed captions a front end puts next to values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    FeelsLike,
    Low,
    High,
    Humidity,
    Pressure,
    Visibility,
    Wind,
    Sunrise,
    Sunset,
    Rain,
    NoForecast,
    NoSavedCities,
}

impl Label {
    pub fn text(self, language: Language) -> &'static str {
        match (self, language) {
            (Label::FeelsLike, Language::En) => "feels like",
            (Label::FeelsLike, Language::Es) => "sensación",
            (Label::Low, Language::En) => "Low",
            (Label::Low, Language::Es) => "Mín",
            (Label::High, Language::En) => "High",
            (Label::High, Language::Es) => "Máx",
            (Label::Humidity, Language::En) => "Humidity",
            (Label::Humidity, Language::Es) => "Humedad",
            (Label::Pressure, Language::En) => "Pressure",
            (Label::Pressure, Language::Es) => "Presión",
            (Label::Visibility, Language::En) => "Visibility",
            (Label::Visibility, Language::Es) => "Visibilidad",
            (Label::Wind, Language::En) => "Wind",
            (Label::Wind, Language::Es) => "Viento",
            (Label::Sunrise, Language::En) => "Sunrise",
            (Label::Sunrise, Language::Es) => "Amanecer",
            (Label::Sunset, Language::En) => "Sunset",
            (Label::Sunset, Language::Es) => "Atardecer",
            (Label::Rain, Language::En) => "rain",
            (Label::Rain, Language::Es) => "lluvia",
            (Label::NoForecast, Language::En) => "No forecast data",
            (Label::NoForecast, Language::Es) => "Sin datos de pronóstico",
            (Label::NoSavedCities, Language::En) => "No saved cities",
            (Label::NoSavedCities, Language::Es) => "No hay ciudades guardadas",
        }
    }
}

/// Label for the `index`-th day of a forecast; the first one is "today".
pub fn format_forecast_date(
    date: DateTime<Utc>,
    index: usize,
    language: Language,
    zone: BucketZone,
) -> String {
    if index == 0 {
        return today_label(language).to_string();
    }

    let local = zone.local_datetime(date);
    let weekday = local.weekday().num_days_from_monday() as usize;
    let month = local.month0() as usize;

    match language {
        Language::En => format!("{}, {} {}", WEEKDAYS_EN[weekday], MONTHS_EN[month], local.day()),
        Language::Es => format!("{}, {} {}", WEEKDAYS_ES[weekday], local.day(), MONTHS_ES[month]),
    }
}

/// `HH:MM` wall-clock time of `instant` in `zone`.
pub fn format_time(instant: DateTime<Utc>, zone: BucketZone) -> String {
    zone.local_datetime(instant).format("%H:%M").to_string()
}
