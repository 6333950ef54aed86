//! OpenWeather wire schema.
//!
//! Every field is optional here so that the transformer, not serde, decides
//! whether an absent field is a schema violation or gets a default. A field
//! with the wrong JSON type still fails deserialization.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCoord {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWeather {
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub humidity: Option<u8>,
    pub pressure: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWind {
    pub speed: Option<f64>,
    pub deg: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSys {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// Response of `GET /data/2.5/weather`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurrent {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub coord: Option<RawCoord>,
    #[serde(default)]
    pub weather: Vec<RawWeather>,
    pub main: Option<RawMain>,
    pub wind: Option<RawWind>,
    /// Metres.
    pub visibility: Option<u32>,
    pub sys: Option<RawSys>,
    pub dt: Option<i64>,
    /// Seconds east of UTC at the city.
    pub timezone: Option<i32>,
}

/// One 3-hour entry of the forecast `list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSample {
    pub dt: Option<i64>,
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Vec<RawWeather>,
    pub wind: Option<RawWind>,
    pub pop: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCity {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub country: Option<String>,
    /// Shift in seconds from UTC.
    pub timezone: Option<i32>,
}

/// Response of `GET /data/2.5/forecast`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawForecast {
    pub list: Option<Vec<RawSample>>,
    pub city: Option<RawCity>,
}
