//! Vendor payload to canonical model.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    aggregate::{BucketZone, DaySummary, ForecastOptions, Sample, aggregate_daily},
    error::TransformError,
    model::{
        Coordinates, CurrentConditions, CurrentTemperature, DailyForecast, DailyTemperature,
        Details, Sun, WeatherDescriptor,
    },
    raw::{RawCurrent, RawForecast, RawSample, RawWeather, RawWind},
};

type Result<T> = std::result::Result<T, TransformError>;

/// Rounds to the nearest integer, halves going up (`-2.5` becomes `-2`).
pub fn round_half_up(value: f64) -> i32 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor as i32 + 1 } else { floor as i32 }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(TransformError::MissingField(field))
}

fn finite(value: f64, field: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TransformError::invalid(field, format!("{value} is not a finite number")))
    }
}

fn temperature(value: Option<f64>, field: &'static str) -> Result<f64> {
    finite(required(value, field)?, field)
}

fn instant(seconds: Option<i64>, field: &'static str) -> Result<DateTime<Utc>> {
    let seconds = required(seconds, field)?;
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| TransformError::invalid(field, format!("{seconds} is out of range")))
}

fn descriptor(weather: &[RawWeather]) -> Result<WeatherDescriptor> {
    let first = weather.first().ok_or(TransformError::MissingField("weather[0]"))?;

    Ok(WeatherDescriptor {
        main: required(first.main.clone(), "weather[0].main")?,
        description: required(first.description.clone(), "weather[0].description")?,
        icon: required(first.icon.clone(), "weather[0].icon")?,
    })
}

/// Vendor omits wind at calm conditions; either part missing reads as zero.
fn wind(wind: Option<&RawWind>) -> Result<(f64, u16)> {
    let speed = wind.and_then(|w| w.speed).unwrap_or(0.0);
    let direction = wind.and_then(|w| w.deg).unwrap_or(0);
    Ok((finite(speed, "wind.speed")?, direction))
}

fn pop(value: Option<f64>) -> Result<f64> {
    match value {
        None => Ok(0.0),
        Some(p) if (0.0..=1.0).contains(&p) => Ok(p),
        Some(p) => Err(TransformError::invalid("pop", format!("{p} is outside [0, 1]"))),
    }
}

/// Normalizes one current-weather response.
pub fn normalize_current(raw: &Value) -> Result<CurrentConditions> {
    current_from_raw(RawCurrent::deserialize(raw)?)
}

/// [`normalize_current`] for a response body that has not been parsed yet.
pub fn parse_current(body: &str) -> Result<CurrentConditions> {
    current_from_raw(serde_json::from_str(body)?)
}

fn zone(offset: i32, field: &'static str) -> Result<BucketZone> {
    BucketZone::from_offset_seconds(offset)
        .ok_or_else(|| TransformError::invalid(field, format!("{offset} is out of range")))
}

pub fn current_from_raw(raw: RawCurrent) -> Result<CurrentConditions> {
    let id = required(raw.id, "id")?;
    let name = required(raw.name, "name")?;
    let weather = descriptor(&raw.weather)?;

    let sys = required(raw.sys, "sys")?;
    let coord = required(raw.coord, "coord")?;
    let main = required(raw.main, "main")?;
    let (wind_speed, wind_direction) = wind(raw.wind.as_ref())?;

    Ok(CurrentConditions {
        id,
        name,
        country: required(sys.country, "sys.country")?,
        coordinates: Coordinates {
            lat: finite(required(coord.lat, "coord.lat")?, "coord.lat")?,
            lon: finite(required(coord.lon, "coord.lon")?, "coord.lon")?,
        },
        weather,
        temperature: CurrentTemperature {
            current: round_half_up(temperature(main.temp, "main.temp")?),
            feels_like: round_half_up(temperature(main.feels_like, "main.feels_like")?),
            min: round_half_up(temperature(main.temp_min, "main.temp_min")?),
            max: round_half_up(temperature(main.temp_max, "main.temp_max")?),
        },
        details: Details {
            humidity: required(main.humidity, "main.humidity")?,
            pressure: required(main.pressure, "main.pressure")?,
            visibility: raw.visibility.map(|metres| round_half_up(f64::from(metres) / 1000.0) as u32),
            wind_speed,
            wind_direction,
        },
        sun: Sun {
            sunrise: instant(sys.sunrise, "sys.sunrise")?,
            sunset: instant(sys.sunset, "sys.sunset")?,
        },
        timestamp: instant(raw.dt, "dt")?,
        utc_offset: raw
            .timezone
            .map(|offset| zone(offset, "timezone").map(|_| offset))
            .transpose()?,
    })
}

pub fn sample_from_raw(raw: &RawSample) -> Result<Sample> {
    let main = raw.main.as_ref().ok_or(TransformError::MissingField("main"))?;
    let (wind_speed, wind_direction) = wind(raw.wind.as_ref())?;

    Ok(Sample {
        instant: instant(raw.dt, "dt")?,
        temp: temperature(main.temp, "main.temp")?,
        humidity: required(main.humidity, "main.humidity")?,
        pressure: required(main.pressure, "main.pressure")?,
        wind_speed,
        wind_direction,
        weather: descriptor(&raw.weather)?,
        pop: pop(raw.pop)?,
    })
}

fn daily_from_summary(day: DaySummary) -> DailyForecast {
    DailyForecast {
        date: day.date,
        temperature: DailyTemperature {
            min: round_half_up(day.min),
            max: round_half_up(day.max),
            day: round_half_up(day.mean),
        },
        humidity: day.humidity,
        pressure: day.pressure,
        wind_speed: day.wind_speed,
        wind_direction: day.wind_direction,
        weather: day.weather,
        pop: day.pop,
    }
}

/// Validates every sample, buckets them by day and rounds each day's
/// temperatures. Days appear in the order their first sample was seen.
pub fn normalize_forecast_list(
    list: &[RawSample],
    options: &ForecastOptions,
) -> Result<Vec<DailyForecast>> {
    let samples = list
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            sample_from_raw(raw)
                .map_err(|source| TransformError::InSample { index, source: Box::new(source) })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(aggregate_daily(&samples, options).into_iter().map(daily_from_summary).collect())
}

/// Normalizes one forecast response (an object holding the sample `list`).
pub fn normalize_forecast(raw: &Value, options: &ForecastOptions) -> Result<Vec<DailyForecast>> {
    let raw = RawForecast::deserialize(raw)?;
    let list = required(raw.list, "list")?;
    normalize_forecast_list(&list, options)
}

/// [`normalize_forecast`] for a response body that has not been parsed yet.
pub fn parse_forecast(body: &str, options: &ForecastOptions) -> Result<Vec<DailyForecast>> {
    let raw: RawForecast = serde_json::from_str(body)?;
    let list = required(raw.list, "list")?;
    normalize_forecast_list(&list, options)
}

/// Name, country and own UTC offset of the city a forecast response is for.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastCity {
    pub name: Option<String>,
    pub country: Option<String>,
    pub zone: Option<BucketZone>,
}

pub fn forecast_city(raw: &Value) -> Result<Option<ForecastCity>> {
    let raw = RawForecast::deserialize(raw)?;

    raw.city
        .map(|city| -> Result<ForecastCity> {
            let zone = city.timezone.map(|offset| zone(offset, "city.timezone")).transpose()?;
            Ok(ForecastCity { name: city.name, country: city.country, zone })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn current_payload() -> Value {
        json!({
            "id": 1,
            "name": "New York",
            "coord": { "lat": 40.7128, "lon": -74.0060 },
            "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "main": {
                "temp": 22.4, "feels_like": 23.5, "temp_min": 17.6, "temp_max": 26.0,
                "humidity": 60, "pressure": 1013
            },
            "wind": { "speed": 5.0, "deg": 180 },
            "visibility": 10000,
            "sys": { "country": "US", "sunrise": 1705309200, "sunset": 1705346400 },
            "dt": 1705327200,
            "timezone": -18000
        })
    }

    fn forecast_sample(dt: i64, temp: f64, pop: f64) -> Value {
        json!({
            "dt": dt,
            "main": { "temp": temp, "humidity": 60, "pressure": 1013 },
            "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "wind": { "speed": 5.0, "deg": 180 },
            "pop": pop
        })
    }

    fn remove(payload: &mut Value, pointer: &str) {
        let (parent, key) = pointer.rsplit_once('/').unwrap();
        payload.pointer_mut(parent).unwrap().as_object_mut().unwrap().remove(key);
    }

    #[test]
    fn rounds_half_up_like_nearest_integer() {
        assert_eq!(round_half_up(22.5), 23);
        assert_eq!(round_half_up(22.49), 22);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.51), -3);
        assert_eq!(round_half_up(0.49999999999999994), 0);
        assert_eq!(round_half_up(-0.5), 0);
    }

    #[test]
    fn current_maps_every_field() {
        let current = normalize_current(&current_payload()).unwrap();

        assert_eq!(current.id, 1);
        assert_eq!(current.name, "New York");
        assert_eq!(current.country, "US");
        assert_eq!(current.coordinates, Coordinates { lat: 40.7128, lon: -74.0060 });
        assert_eq!(current.weather.icon, "01d");
        assert_eq!(
            current.temperature,
            CurrentTemperature { current: 22, feels_like: 24, min: 18, max: 26 }
        );
        assert_eq!(current.details.humidity, 60);
        assert_eq!(current.details.pressure, 1013);
        assert_eq!(current.details.visibility, Some(10));
        assert_eq!(current.details.wind_speed, 5.0);
        assert_eq!(current.details.wind_direction, 180);
        assert_eq!(current.sun.sunrise.timestamp_millis(), 1_705_309_200_000);
        assert_eq!(current.sun.sunset.timestamp_millis(), 1_705_346_400_000);
        assert_eq!(current.timestamp.timestamp_millis(), 1_705_327_200_000);
        assert_eq!(current.utc_offset, Some(-18000));
    }

    #[test]
    fn city_offset_is_optional_but_checked() {
        let mut payload = current_payload();
        remove(&mut payload, "/timezone");
        assert_eq!(normalize_current(&payload).unwrap().utc_offset, None);

        payload["timezone"] = json!(200_000);
        let err = normalize_current(&payload).unwrap_err();
        assert!(matches!(err, TransformError::InvalidField { field: "timezone", .. }));
    }

    #[test]
    fn missing_wind_defaults_to_calm() {
        let mut payload = current_payload();
        remove(&mut payload, "/wind");

        let current = normalize_current(&payload).unwrap();
        assert_eq!(current.details.wind_speed, 0.0);
        assert_eq!(current.details.wind_direction, 0);
    }

    #[test]
    fn missing_visibility_is_none_not_zero() {
        let mut payload = current_payload();
        remove(&mut payload, "/visibility");

        let current = normalize_current(&payload).unwrap();
        assert_eq!(current.details.visibility, None);
        assert!(serde_json::to_value(&current).unwrap()["details"]["visibility"].is_null());
    }

    #[test]
    fn visibility_rounds_to_whole_kilometres() {
        let mut payload = current_payload();
        payload["visibility"] = json!(7500);
        assert_eq!(normalize_current(&payload).unwrap().details.visibility, Some(8));
    }

    #[test]
    fn missing_identity_is_an_error() {
        for (pointer, field) in [("/id", "id"), ("/name", "name")] {
            let mut payload = current_payload();
            remove(&mut payload, pointer);

            match normalize_current(&payload).unwrap_err() {
                TransformError::MissingField(f) => assert_eq!(f, field),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn empty_weather_array_is_an_error() {
        let mut payload = current_payload();
        payload["weather"] = json!([]);

        let err = normalize_current(&payload).unwrap_err();
        assert!(matches!(err, TransformError::MissingField("weather[0]")));
    }

    #[test]
    fn wrong_json_type_is_malformed() {
        let mut payload = current_payload();
        payload["main"]["temp"] = json!("hot");

        let err = normalize_current(&payload).unwrap_err();
        assert!(matches!(err, TransformError::Malformed(_)));
    }

    #[test]
    fn parse_current_accepts_raw_body() {
        let body = current_payload().to_string();
        assert_eq!(parse_current(&body).unwrap().name, "New York");
        assert!(matches!(parse_current("not json"), Err(TransformError::Malformed(_))));
    }

    #[test]
    fn parse_forecast_accepts_raw_body() {
        let body = json!({
            "list": [
                forecast_sample(1705327200, 20.0, 0.1),
                forecast_sample(1705413600, 18.0, 0.0),
            ]
        })
        .to_string();
        let options = ForecastOptions::default();

        let days = parse_forecast(&body, &options).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].temperature.day, 18);

        assert!(matches!(parse_forecast("not json", &options), Err(TransformError::Malformed(_))));
        assert!(matches!(
            parse_forecast("{}", &options),
            Err(TransformError::MissingField("list"))
        ));
    }

    #[test]
    fn forecast_groups_and_rounds() {
        let payload = json!({
            "list": [
                forecast_sample(1705327200, 20.0, 0.1),
                forecast_sample(1705338000, 25.0, 0.3),
                forecast_sample(1705413600, 18.0, 0.0),
            ]
        });

        let days = normalize_forecast(&payload, &ForecastOptions::default()).unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].temperature, DailyTemperature { min: 20, max: 25, day: 23 });
        assert_eq!(days[0].pop, 0.3);
        assert_eq!(days[0].date.timestamp(), 1705327200);
        assert_eq!(days[1].temperature, DailyTemperature { min: 18, max: 18, day: 18 });
    }

    #[test]
    fn single_sample_has_equal_extremes() {
        let payload = json!({ "list": [forecast_sample(1705327200, 21.5, 0.0)] });

        let days = normalize_forecast(&payload, &ForecastOptions::default()).unwrap();
        let t = days[0].temperature;
        assert_eq!((t.min, t.day, t.max), (22, 22, 22));
    }

    #[test]
    fn empty_list_is_not_an_error() {
        let payload = json!({ "list": [] });
        assert!(normalize_forecast(&payload, &ForecastOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn forecast_without_list_is_malformed() {
        let err = normalize_forecast(&json!({}), &ForecastOptions::default()).unwrap_err();
        assert!(matches!(err, TransformError::MissingField("list")));
    }

    #[test]
    fn sample_without_temperature_reports_its_index() {
        let mut broken = forecast_sample(1705338000, 25.0, 0.0);
        remove(&mut broken, "/main/temp");
        let payload = json!({ "list": [forecast_sample(1705327200, 20.0, 0.0), broken] });

        match normalize_forecast(&payload, &ForecastOptions::default()).unwrap_err() {
            TransformError::InSample { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, TransformError::MissingField("main.temp")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_pop_and_wind_default_to_zero() {
        let mut sample = forecast_sample(1705327200, 20.0, 0.0);
        remove(&mut sample, "/pop");
        remove(&mut sample, "/wind");

        let days = normalize_forecast(&json!({ "list": [sample] }), &ForecastOptions::default())
            .unwrap();
        assert_eq!(days[0].pop, 0.0);
        assert_eq!(days[0].wind_speed, 0.0);
        assert_eq!(days[0].wind_direction, 0);
    }

    #[test]
    fn pop_outside_unit_interval_is_invalid() {
        let payload = json!({ "list": [forecast_sample(1705327200, 20.0, 1.5)] });

        let err = normalize_forecast(&payload, &ForecastOptions::default()).unwrap_err();
        assert!(err.to_string().contains("`pop`"));
    }

    #[test]
    fn rerun_gives_identical_output() {
        let payload = json!({
            "list": [
                forecast_sample(1705413600, 18.0, 0.2),
                forecast_sample(1705327200, 20.3, 0.1),
                forecast_sample(1705338000, 25.1, 0.6),
            ]
        });
        let options = ForecastOptions::default();

        let first = serde_json::to_string(&normalize_forecast(&payload, &options).unwrap()).unwrap();
        let second = serde_json::to_string(&normalize_forecast(&payload, &options).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn forecast_city_reads_vendor_offset() {
        let payload = json!({
            "list": [],
            "city": { "id": 745044, "name": "Istanbul", "country": "TR", "timezone": 10800 }
        });

        let city = forecast_city(&payload).unwrap().unwrap();
        assert_eq!(city.name.as_deref(), Some("Istanbul"));
        assert_eq!(city.zone, BucketZone::from_offset_seconds(10800));
        assert!(forecast_city(&json!({ "list": [] })).unwrap().is_none());
    }
}
