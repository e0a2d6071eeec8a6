/*
 *  weather.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Open-Meteo forecast client and the internal forecast schema
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use async_trait::async_trait;
use flate2::read::GzDecoder;
use log::{debug, info};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

use crate::config::WeatherConfig;

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

const HOURLY_FIELDS: &str = "temperature_2m,apparent_temperature,relativehumidity_2m,precipitation_probability,weathercode";
const DAILY_FIELDS: &str = "weathercode,temperature_2m_max,temperature_2m_min,precipitation_probability_max,sunrise,sunset";

/// Errors from the forecast fetch adapter. All of them are transient
/// from the driver's point of view.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON deserialization error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Open-Meteo API error: {0}")]
    Api(String),
    #[error("Missing weather data: {0}")]
    MissingData(String),
    #[error("Forecast fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Anything that can produce a fresh forecast
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_forecast(&self) -> Result<ForecastData, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "C",
            Units::Imperial => "F",
        }
    }

    pub fn wind_speed_label(&self) -> &'static str {
        match self {
            Units::Metric => "km/h",
            Units::Imperial => "mph",
        }
    }

    fn query_params(&self) -> [(&'static str, &'static str); 3] {
        match self {
            Units::Metric => [
                ("temperature_unit", "celsius"),
                ("windspeed_unit", "kmh"),
                ("precipitation_unit", "mm"),
            ],
            Units::Imperial => [
                ("temperature_unit", "fahrenheit"),
                ("windspeed_unit", "mph"),
                ("precipitation_unit", "inch"),
            ],
        }
    }
}

/// WMO weather code with its description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub code: i32,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub time: i64,
    pub temperature: f64,
    pub wind_speed: f64,
    pub wind_direction: &'static str,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecast {
    pub time: i64,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: f64,
    pub precipitation_probability: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: i64, // local midnight, unix seconds
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub precipitation_probability: f64,
    pub sunrise: i64,
    pub sunset: i64,
    pub condition: Condition,
}

/// Everything the screens need from one fetch. Times are unix seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastData {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub utc_offset_seconds: i32,
    pub units: Units,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
}

// Open-Meteo response, requested with timeformat=unixtime
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
    #[serde(default)]
    timezone: String,
    #[serde(default)]
    utc_offset_seconds: i32,
    current_weather: Option<RawCurrent>,
    hourly: Option<RawHourly>,
    daily: Option<RawDaily>,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    time: i64,
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHourly {
    time: Vec<i64>,
    temperature_2m: Vec<Option<f64>>,
    apparent_temperature: Vec<Option<f64>>,
    relativehumidity_2m: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    weathercode: Vec<Option<i32>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDaily {
    time: Vec<i64>,
    weathercode: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_probability_max: Vec<Option<f64>>,
    sunrise: Vec<i64>,
    sunset: Vec<i64>,
}

fn value_at<T: Copy + Default>(series: &[Option<T>], i: usize) -> T {
    series.get(i).copied().flatten().unwrap_or_default()
}

/// 16-point compass name for a bearing in degrees
pub fn compass_point(degrees: f64) -> &'static str {
    const COMPASS_POINTS: [&str; 16] = [
        "N",  "NNE", "NE", "ENE", "E",  "ESE",
        "SE", "SSE", "S",  "SSW", "SW", "WSW",
        "W",  "WNW", "NW", "NNW"];
    let d16 = ((degrees.rem_euclid(360.0) / 22.5) + 0.5) as usize % 16;
    COMPASS_POINTS[d16]
}

/// Description for a WMO weather interpretation code
pub fn describe_weather_code(code: i32) -> Condition {
    let description = match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    };
    Condition { code, description }
}

/// Translate an Open-Meteo body into the internal schema.
///
/// `now` selects the hourly window: the hour containing `now` and the
/// following `hourly_slots - 1` hours.
pub fn parse_forecast(body: &str, units: Units, now: i64, hourly_slots: usize) -> Result<ForecastData, FetchError> {
    let raw: OpenMeteoResponse = serde_json::from_str(body)?;
    if raw.error {
        return Err(FetchError::Api(raw.reason.unwrap_or_else(|| "unspecified error".to_string())));
    }

    let current = raw.current_weather
        .ok_or_else(|| FetchError::MissingData("current_weather".to_string()))?;
    let current = CurrentConditions {
        time: current.time,
        temperature: current.temperature,
        wind_speed: current.windspeed,
        wind_direction: compass_point(current.winddirection),
        condition: describe_weather_code(current.weathercode),
    };

    let hourly_raw = raw.hourly.unwrap_or_default();
    let hour_start = now - now.rem_euclid(3600);
    let hourly: Vec<HourlyForecast> = hourly_raw.time.iter()
        .enumerate()
        .filter(|&(_, &t)| t >= hour_start)
        .take(hourly_slots)
        .map(|(i, &time)| HourlyForecast {
            time,
            temperature: value_at(&hourly_raw.temperature_2m, i),
            apparent_temperature: value_at(&hourly_raw.apparent_temperature, i),
            humidity: value_at(&hourly_raw.relativehumidity_2m, i),
            precipitation_probability: value_at(&hourly_raw.precipitation_probability, i),
            condition: describe_weather_code(value_at(&hourly_raw.weathercode, i)),
        })
        .collect();

    let daily_raw = raw.daily
        .ok_or_else(|| FetchError::MissingData("daily".to_string()))?;
    if daily_raw.sunrise.len() < daily_raw.time.len() || daily_raw.sunset.len() < daily_raw.time.len() {
        return Err(FetchError::MissingData("daily sunrise/sunset".to_string()));
    }
    let daily: Vec<DailyForecast> = daily_raw.time.iter()
        .enumerate()
        .map(|(i, &date)| DailyForecast {
            date,
            temperature_max: value_at(&daily_raw.temperature_2m_max, i),
            temperature_min: value_at(&daily_raw.temperature_2m_min, i),
            precipitation_probability: value_at(&daily_raw.precipitation_probability_max, i),
            sunrise: daily_raw.sunrise[i],
            sunset: daily_raw.sunset[i],
            condition: describe_weather_code(value_at(&daily_raw.weathercode, i)),
        })
        .collect();
    if daily.is_empty() {
        return Err(FetchError::MissingData("daily forecast is empty".to_string()));
    }

    Ok(ForecastData {
        latitude: raw.latitude,
        longitude: raw.longitude,
        timezone: raw.timezone,
        utc_offset_seconds: raw.utc_offset_seconds,
        units,
        current,
        hourly,
        daily,
    })
}

/// Decode a body that may or may not be gzipped
fn decode_body(raw: &[u8]) -> String {
    let mut decoder = GzDecoder::new(raw);
    let mut decoded = String::new();
    match decoder.read_to_string(&mut decoded) {
        Ok(_) => decoded,
        Err(_) => String::from_utf8_lossy(raw).to_string(),
    }
}

/// Open-Meteo forecast client
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
    units: Units,
    timezone: String,
    forecast_days: u8,
    hourly_slots: usize,
    max_retries: u8,
}

impl OpenMeteoClient {
    /// `latitude`/`longitude` must already be validated
    pub fn new(config: &WeatherConfig, latitude: f64, longitude: f64) -> Result<Self, FetchError> {
        const VERSION: &str = concat!("PiWeatherRock ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Accept-Encoding", header::HeaderValue::from_static("gzip"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .default_headers(headers)
            .timeout(Duration::from_secs(8))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone().unwrap_or_else(|| OPEN_METEO_URL.to_string()),
            latitude,
            longitude,
            units: config.units,
            timezone: config.timezone.clone(),
            forecast_days: config.forecast_days,
            hourly_slots: config.hourly_slots,
            max_retries: 2,
        })
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("latitude", format!("{:.4}", self.latitude)),
            ("longitude", format!("{:.4}", self.longitude)),
            ("current_weather", "true".to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", self.timezone.clone()),
            ("timeformat", "unixtime".to_string()),
            ("forecast_days", self.forecast_days.to_string()),
        ];
        params.extend(self.units.query_params().iter().map(|&(k, v)| (k, v.to_string())));
        params
    }

    async fn send_with_retries(&self) -> Result<String, reqwest::Error> {
        let params = self.query();
        let mut attempt = 0;
        loop {
            match self.client.get(&self.base_url).query(&params).send().await {
                Ok(response) => {
                    // error bodies carry {"error":true,"reason":..}, let the parser report them
                    let raw = response.bytes().await?;
                    return Ok(decode_body(&raw));
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(e);
                    }
                    debug!("Open-Meteo request failed (attempt {}): {}", attempt, e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoClient {
    async fn fetch_forecast(&self) -> Result<ForecastData, FetchError> {
        info!("Fetching weather data for {:.4}, {:.4}...", self.latitude, self.longitude);
        let body = self.send_with_retries().await?;
        let now = chrono::Utc::now().timestamp();
        let forecast = parse_forecast(&body, self.units, now, self.hourly_slots)?;
        debug!("Forecast has {} hourly and {} daily entries", forecast.hourly.len(), forecast.daily.len());
        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    // 2024-05-01 00:00 UTC
    const DAY0: i64 = 1_714_521_600;

    #[test]
    fn test_query_uses_the_configured_location() {
        let config = WeatherConfig { units: Units::Imperial, ..WeatherConfig::default() };
        let client = OpenMeteoClient::new(&config, 51.5, -0.12).unwrap();
        let query = client.query();
        assert!(query.contains(&("latitude", "51.5000".to_string())));
        assert!(query.contains(&("longitude", "-0.1200".to_string())));
        assert!(query.contains(&("forecast_days", "4".to_string())));
    }

    fn sample_body() -> String {
        let hours: Vec<i64> = (0..6).map(|h| DAY0 + h * 3600).collect();
        serde_json::json!({
            "latitude": 45.52,
            "longitude": -122.68,
            "timezone": "GMT",
            "utc_offset_seconds": 0,
            "current_weather": {
                "time": DAY0 + 3600,
                "temperature": 12.5,
                "windspeed": 9.0,
                "winddirection": 200.0,
                "weathercode": 3
            },
            "hourly": {
                "time": hours,
                "temperature_2m": [10.0, 11.0, 12.0, 13.0, 14.0, null],
                "apparent_temperature": [9.0, 10.0, 11.0, 12.0, 13.0, 14.0],
                "relativehumidity_2m": [80, 78, 75, 70, 65, 60],
                "precipitation_probability": [0, 5, 10, 40, 60, 20],
                "weathercode": [0, 1, 2, 61, 63, 3]
            },
            "daily": {
                "time": [DAY0, DAY0 + 86_400],
                "weathercode": [61, 0],
                "temperature_2m_max": [15.0, 18.0],
                "temperature_2m_min": [7.0, 8.0],
                "precipitation_probability_max": [70, 0],
                "sunrise": [DAY0 + 6 * 3600, DAY0 + 86_400 + 6 * 3600 - 60],
                "sunset": [DAY0 + 20 * 3600, DAY0 + 86_400 + 20 * 3600 + 60]
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_forecast_maps_schema() {
        let data = parse_forecast(&sample_body(), Units::Metric, DAY0 + 3600 + 120, 4).unwrap();

        assert_eq!(data.current.temperature, 12.5);
        assert_eq!(data.current.wind_direction, "SSW");
        assert_eq!(data.current.condition.description, "Overcast");

        assert_eq!(data.hourly.len(), 4);
        assert_eq!(data.hourly[0].time, DAY0 + 3600);
        assert_eq!(data.hourly[2].condition.code, 61);
        assert_eq!(data.hourly[3].precipitation_probability, 60.0);

        assert_eq!(data.daily.len(), 2);
        assert_eq!(data.daily[0].sunset, DAY0 + 20 * 3600);
        assert_eq!(data.daily[1].temperature_max, 18.0);
    }

    #[test]
    fn test_missing_hourly_values_default_to_zero() {
        let data = parse_forecast(&sample_body(), Units::Metric, DAY0 + 5 * 3600, 4).unwrap();
        assert_eq!(data.hourly.len(), 1);
        assert_eq!(data.hourly[0].temperature, 0.0);
    }

    #[test]
    fn test_api_error_is_reported() {
        let body = r#"{"error":true,"reason":"Latitude must be in range of -90 to 90"}"#;
        match parse_forecast(body, Units::Metric, DAY0, 4) {
            Err(FetchError::Api(reason)) => assert!(reason.contains("Latitude")),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_current_weather_is_an_error() {
        let body = r#"{"latitude":1.0,"longitude":2.0,"daily":{"time":[],"sunrise":[],"sunset":[]}}"#;
        assert!(matches!(
            parse_forecast(body, Units::Metric, DAY0, 4),
            Err(FetchError::MissingData(_))
        ));
    }

    #[test]
    fn test_decode_body_handles_gzip_and_plain() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{\"ok\":1}").unwrap();
        let gz = encoder.finish().unwrap();

        assert_eq!(decode_body(&gz), "{\"ok\":1}");
        assert_eq!(decode_body(b"{\"ok\":2}"), "{\"ok\":2}");
    }

    #[test]
    fn test_compass_points() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(359.0), "N");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(225.0), "SW");
        assert_eq!(compass_point(-90.0), "W");
    }

    #[test]
    fn test_unknown_weather_code() {
        assert_eq!(describe_weather_code(42).description, "Unknown");
        assert_eq!(describe_weather_code(95).description, "Thunderstorm");
    }
}
