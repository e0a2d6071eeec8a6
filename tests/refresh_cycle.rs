/*
 *  tests/refresh_cycle.rs
 *
 *  Main loop against a fake forecast source and a recording sink
 *
 *  PiWeatherRock - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use piweatherrock::app::{self, Driver, RunSettings};
use piweatherrock::config::Config;
use piweatherrock::display::{MockSink, ScreenMode};
use piweatherrock::input::Command;
use piweatherrock::weather::{
    describe_weather_code, CurrentConditions, DailyForecast, FetchError, ForecastData, ForecastSource, Units,
};

enum Behaviour {
    Succeed,
    Hang,
}

struct FakeSource {
    calls: Arc<AtomicUsize>,
    behaviour: Behaviour,
}

fn sample_forecast() -> ForecastData {
    let now = chrono::Utc::now().timestamp();
    let midnight = now - now.rem_euclid(86_400);
    ForecastData {
        latitude: 0.0,
        longitude: 0.0,
        timezone: "GMT".to_string(),
        utc_offset_seconds: 0,
        units: Units::Metric,
        current: CurrentConditions {
            time: now,
            temperature: 21.0,
            wind_speed: 5.0,
            wind_direction: "N",
            condition: describe_weather_code(0),
        },
        hourly: Vec::new(),
        daily: vec![DailyForecast {
            date: midnight,
            temperature_max: 24.0,
            temperature_min: 12.0,
            precipitation_probability: 0.0,
            sunrise: midnight + 6 * 3600,
            sunset: midnight + 18 * 3600,
            condition: describe_weather_code(0),
        }],
    }
}

#[async_trait]
impl ForecastSource for FakeSource {
    async fn fetch_forecast(&self) -> Result<ForecastData, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Succeed => Ok(sample_forecast()),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(FetchError::MissingData("never".to_string()))
            }
        }
    }
}

fn settings() -> RunSettings {
    RunSettings { poll_hz: 20, fetch_timeout: Duration::from_millis(100) }
}

fn no_signal() -> std::future::Pending<anyhow::Result<()>> {
    std::future::pending()
}

async fn wait_for(what: &str, mut done: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {}", what);
}

#[tokio::test]
async fn test_fetch_result_reaches_the_screen() {
    let sink = MockSink::new();
    let driver = Driver::from_config(&Config::default(), Box::new(sink.clone())).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(FakeSource { calls: calls.clone(), behaviour: Behaviour::Succeed });
    let (tx, rx) = mpsc::channel(4);

    let handle = tokio::spawn(app::run(driver, source, settings(), rx, no_signal()));

    wait_for("forecast frame", || {
        sink.frames().iter().any(|f| f.lines.first().is_some_and(|l| l.starts_with("Now 21°C")))
    }).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tx.send(Command::Show(ScreenMode::Info)).await.unwrap();
    wait_for("info frame", || {
        sink.last_frame().is_some_and(|f| f.lines.iter().any(|l| l == "Weather checked at"))
    }).await;

    tx.send(Command::Quit).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
    // fresh for update_freq, no second fetch
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.state().clear_count, 1);
}

#[tokio::test]
async fn test_hung_fetch_times_out_and_retries() {
    let sink = MockSink::new();
    let driver = Driver::from_config(&Config::default(), Box::new(sink.clone())).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(FakeSource { calls: calls.clone(), behaviour: Behaviour::Hang });
    let (tx, rx) = mpsc::channel(4);

    let handle = tokio::spawn(app::run(driver, source, settings(), rx, no_signal()));

    // no data yet, so every new second retries
    wait_for("second fetch attempt", || calls.load(Ordering::SeqCst) >= 2).await;
    assert!(sink.frames().iter().all(|f| f.lines == vec!["Daily forecast: no data".to_string()]));

    tx.send(Command::Quit).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
}

#[tokio::test]
async fn test_rotation_keeps_going_while_a_fetch_hangs() {
    let sink = MockSink::new();
    let mut config = Config::default();
    config.plugins[0].pause = 1;
    config.plugins[1].pause = 1;
    let driver = Driver::from_config(&config, Box::new(sink.clone())).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(FakeSource { calls: calls.clone(), behaviour: Behaviour::Hang });
    let (tx, rx) = mpsc::channel(4);
    let slow = RunSettings { poll_hz: 20, fetch_timeout: Duration::from_secs(30) };

    let handle = tokio::spawn(app::run(driver, source, slow, rx, no_signal()));

    // the first fetch is still pending the whole time
    wait_for("hourly frame", || {
        sink.frames().iter().any(|f| f.lines == vec!["Hourly forecast: no data".to_string()])
    }).await;
    wait_for("three frames", || sink.frames().len() >= 3).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tx.send(Command::Quit).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
}

#[tokio::test]
async fn test_shutdown_signal_ends_the_loop_and_clears() {
    let sink = MockSink::new();
    let driver = Driver::from_config(&Config::default(), Box::new(sink.clone())).unwrap();
    let source = Arc::new(FakeSource { calls: Arc::new(AtomicUsize::new(0)), behaviour: Behaviour::Succeed });
    let (_tx, rx) = mpsc::channel(4);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let stop = async move {
        let _ = stop_rx.await;
        Ok::<(), anyhow::Error>(())
    };

    let handle = tokio::spawn(app::run(driver, source, settings(), rx, stop));

    wait_for("first frame", || !sink.frames().is_empty()).await;
    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
    assert_eq!(sink.state().clear_count, 1);
}
