//! Human-readable rendering of the canonical records.

use weather_core::{
    BucketZone, Config, CurrentConditions, DailyForecast, Language, SavedCity, Units,
    format::{
        Label, format_forecast_date, format_precipitation, format_temperature, format_time,
        format_wind_speed,
    },
};

pub fn place(name: &str, country: Option<&str>) -> String {
    match country {
        Some(country) if !country.is_empty() => format!("{name}, {country}"),
        _ => name.to_string(),
    }
}

/// Sunrise and sunset are shown on the city's clock when its offset is known.
fn city_zone(current: &CurrentConditions) -> BucketZone {
    current
        .utc_offset
        .and_then(BucketZone::from_offset_seconds)
        .unwrap_or(BucketZone::Local)
}

fn current_lines(current: &CurrentConditions, units: Units, language: Language) -> Vec<String> {
    let t = &current.temperature;
    let d = &current.details;
    let zone = city_zone(current);
    let label = |l: Label| l.text(language);

    let visibility = d
        .visibility
        .map(|km| format!("{km} km"))
        .unwrap_or_else(|| "n/a".to_string());

    vec![
        place(&current.name, Some(current.country.as_str())),
        format!(
            "  {} ({} {}), {}",
            format_temperature(t.current, units),
            label(Label::FeelsLike),
            format_temperature(t.feels_like, units),
            current.weather.description
        ),
        format!(
            "  {} {} / {} {}",
            label(Label::Low),
            format_temperature(t.min, units),
            label(Label::High),
            format_temperature(t.max, units)
        ),
        format!("  {:<12} {}%", format!("{}:", label(Label::Humidity)), d.humidity),
        format!("  {:<12} {} hPa", format!("{}:", label(Label::Pressure)), d.pressure),
        format!("  {:<12} {visibility}", format!("{}:", label(Label::Visibility))),
        format!(
            "  {:<12} {}, {}°",
            format!("{}:", label(Label::Wind)),
            format_wind_speed(d.wind_speed, units),
            d.wind_direction
        ),
        format!(
            "  {} {} / {} {}",
            label(Label::Sunrise),
            format_time(current.sun.sunrise, zone),
            label(Label::Sunset),
            format_time(current.sun.sunset, zone)
        ),
    ]
}

pub fn print_current(current: &CurrentConditions, units: Units, language: Language) {
    for line in current_lines(current, units, language) {
        println!("{line}");
    }
}

pub fn print_forecast(
    title: &str,
    daily: &[DailyForecast],
    units: Units,
    language: Language,
    zone: BucketZone,
) {
    println!("{title}");
    if daily.is_empty() {
        println!("  {}", Label::NoForecast.text(language));
        return;
    }

    for (index, day) in daily.iter().enumerate() {
        let rain = format_precipitation(day.pop)
            .map(|p| format!(", {p}% {}", Label::Rain.text(language)))
            .unwrap_or_default();

        println!(
            "  {:<14} {:>6} {:>6} {:>6}  {}{}",
            format_forecast_date(day.date, index, language, zone),
            format_temperature(day.temperature.min, units),
            format_temperature(day.temperature.day, units),
            format_temperature(day.temperature.max, units),
            day.weather.description,
            rain
        );
    }
}

pub fn print_prefs(config: &Config) {
    println!("units    = {}", config.units);
    println!("language = {}", config.language);
    println!("theme    = {}", config.theme);
    println!("retries  = {}", config.retries);
    println!(
        "location = {:.4}, {:.4}",
        config.last_location.lat, config.last_location.lon
    );
}

fn city_line(city: &SavedCity) -> String {
    let temp = city
        .temperature
        .map(|t| format!("  {}", format_temperature(t, city.units)))
        .unwrap_or_default();
    format!("{:>10}  {}{temp}", city.id, place(&city.name, Some(city.country.as_str())))
}

pub fn print_cities(cities: &[SavedCity], language: Language) {
    if cities.is_empty() {
        println!("{}", Label::NoSavedCities.text(language));
        return;
    }

    for city in cities {
        println!("{}", city_line(city));
    }
}
