//! Groups forecast samples into calendar days and reduces each day.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};

use crate::model::WeatherDescriptor;

pub const DEFAULT_MAX_DAYS: usize = 7;

/// Timezone whose calendar decides which day a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketZone {
    #[default]
    Utc,
    /// Timezone of the running process. Output then depends on the machine.
    Local,
    Fixed(FixedOffset),
}

impl BucketZone {
    /// Zone for a vendor-style "shift in seconds from UTC".
    pub fn from_offset_seconds(seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(seconds).map(BucketZone::Fixed)
    }

    /// Wall-clock time of `instant` in this zone.
    pub fn local_datetime(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            BucketZone::Utc => instant.naive_utc(),
            BucketZone::Local => instant.with_timezone(&Local).naive_local(),
            BucketZone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
        }
    }

    pub fn day_key(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local_datetime(instant).date()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastOptions {
    pub max_days: usize,
    pub zone: BucketZone,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self { max_days: DEFAULT_MAX_DAYS, zone: BucketZone::default() }
    }
}

/// A forecast entry that already passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub instant: DateTime<Utc>,
    pub temp: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub wind_direction: u16,
    pub weather: WeatherDescriptor,
    pub pop: f64,
}

/// Samples collected for one day. Everything except the temperatures and
/// `pop` comes from the first sample seen for that day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub key: NaiveDate,
    pub first: Sample,
    pub temps: Vec<f64>,
    pub max_pop: f64,
}

impl DayBucket {
    fn new(key: NaiveDate, first: Sample) -> Self {
        Self { key, temps: vec![first.temp], max_pop: first.pop, first }
    }

    fn push(&mut self, sample: &Sample) {
        self.temps.push(sample.temp);
        if sample.pop > self.max_pop {
            self.max_pop = sample.pop;
        }
    }

    pub fn summarize(self) -> DaySummary {
        let min = self.temps.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = self.temps.iter().sum::<f64>() / self.temps.len() as f64;

        DaySummary {
            key: self.key,
            date: self.first.instant,
            // float summation can land a hair outside the extremes
            mean: mean.max(min).min(max),
            min,
            max,
            humidity: self.first.humidity,
            pressure: self.first.pressure,
            wind_speed: self.first.wind_speed,
            wind_direction: self.first.wind_direction,
            weather: self.first.weather,
            pop: self.max_pop,
        }
    }
}

/// Unrounded reduction of one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub key: NaiveDate,
    pub date: DateTime<Utc>,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub wind_direction: u16,
    pub weather: WeatherDescriptor,
    pub pop: f64,
}

/// Buckets samples by calendar day in `zone`, keeping days in the order
/// their first sample appears. Input order is not assumed to be sorted.
pub fn bucket_by_day<'a, I>(samples: I, zone: BucketZone) -> Vec<DayBucket>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut buckets: Vec<DayBucket> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for sample in samples {
        let key = zone.day_key(sample.instant);
        match index.get(&key) {
            Some(&pos) => buckets[pos].push(sample),
            None => {
                index.insert(key, buckets.len());
                buckets.push(DayBucket::new(key, sample.clone()));
            }
        }
    }

    buckets
}

/// Buckets and reduces samples, returning at most `options.max_days` days.
pub fn aggregate_daily(samples: &[Sample], options: &ForecastOptions) -> Vec<DaySummary> {
    let mut buckets = bucket_by_day(samples, options.zone);
    tracing::debug!(
        samples = samples.len(),
        days = buckets.len(),
        zone = ?options.zone,
        "Bucketed forecast samples"
    );

    buckets.truncate(options.max_days);
    buckets.into_iter().map(DayBucket::summarize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dt: i64, temp: f64, pop: f64) -> Sample {
        Sample {
            instant: DateTime::from_timestamp(dt, 0).unwrap(),
            temp,
            humidity: 60,
            pressure: 1013,
            wind_speed: 5.0,
            wind_direction: 180,
            weather: WeatherDescriptor {
                main: "Clear".into(),
                description: "clear sky".into(),
                icon: "01d".into(),
            },
            pop,
        }
    }

    #[test]
    fn same_utc_day_shares_a_bucket() {
        let samples = vec![
            sample(1_705_327_200, 20.0, 0.1),
            sample(1_705_338_000, 25.0, 0.4),
            sample(1_705_413_600, 18.0, 0.0),
        ];

        let days = aggregate_daily(&samples, &ForecastOptions::default());

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].mean, 22.5);
        assert_eq!(days[0].min, 20.0);
        assert_eq!(days[0].max, 25.0);
        assert_eq!(days[0].pop, 0.4);
        assert_eq!(days[1].mean, 18.0);
        assert_eq!(days[1].key, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }

    #[test]
    fn first_sample_supplies_carried_fields() {
        let mut second = sample(1_705_338_000, 25.0, 0.2);
        second.humidity = 90;
        second.weather.main = "Rain".into();

        let days = aggregate_daily(
            &[sample(1_705_327_200, 20.0, 0.1), second],
            &ForecastOptions::default(),
        );

        assert_eq!(days[0].humidity, 60);
        assert_eq!(days[0].weather.main, "Clear");
        assert_eq!(days[0].date, DateTime::from_timestamp(1_705_327_200, 0).unwrap());
    }

    #[test]
    fn days_keep_first_seen_order() {
        let samples = vec![
            sample(1_705_413_600, 18.0, 0.0),
            sample(1_705_327_200, 20.0, 0.0),
            sample(1_705_420_800, 16.0, 0.0),
        ];

        let days = aggregate_daily(&samples, &ForecastOptions::default());

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].key, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(days[0].min, 16.0);
        assert_eq!(days[1].key, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn truncates_to_max_days() {
        let samples: Vec<Sample> =
            (0..10).map(|d| sample(1_705_327_200 + d * 86_400, 10.0, 0.0)).collect();

        let options = ForecastOptions { max_days: 3, ..Default::default() };
        assert_eq!(aggregate_daily(&samples, &options).len(), 3);
        assert_eq!(aggregate_daily(&samples, &ForecastOptions::default()).len(), 7);
    }

    #[test]
    fn empty_input_gives_no_days() {
        assert!(aggregate_daily(&[], &ForecastOptions::default()).is_empty());
    }

    #[test]
    fn fixed_offset_moves_late_samples_to_next_day() {
        // 2024-01-15 21:00 UTC and 2024-01-15 12:00 UTC
        let samples = vec![sample(1_705_352_400, 10.0, 0.0), sample(1_705_320_000, 12.0, 0.0)];

        let utc = aggregate_daily(&samples, &ForecastOptions::default());
        assert_eq!(utc.len(), 1);

        let plus_five = ForecastOptions {
            zone: BucketZone::from_offset_seconds(5 * 3600).unwrap(),
            ..Default::default()
        };
        let shifted = aggregate_daily(&samples, &plus_five);
        assert_eq!(shifted.len(), 2);
        assert_eq!(shifted[0].key, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        assert!(BucketZone::from_offset_seconds(90_000).is_none());
    }

    #[test]
    fn mean_never_leaves_extremes() {
        let samples = vec![
            sample(1_705_327_200, 0.1, 0.0),
            sample(1_705_338_000, 0.1, 0.0),
            sample(1_705_348_800, 0.1, 0.0),
        ];
        let day = &aggregate_daily(&samples, &ForecastOptions::default())[0];
        assert!(day.min <= day.mean && day.mean <= day.max);
    }

    #[test]
    fn local_zone_follows_machine_calendar() {
        // Five days of 3-hour samples.
        let samples: Vec<Sample> =
            (0..40).map(|i| sample(1_705_276_800 + i * 3 * 3600, 10.0, 0.0)).collect();
        let options = ForecastOptions { max_days: 10, zone: BucketZone::Local };

        let mut expected: Vec<NaiveDate> = Vec::new();
        for s in &samples {
            let day = s.instant.with_timezone(&Local).date_naive();
            if !expected.contains(&day) {
                expected.push(day);
            }
        }

        let keys: Vec<NaiveDate> =
            aggregate_daily(&samples, &options).iter().map(|d| d.key).collect();
        assert_eq!(keys, expected);
    }
}
