//! Orbiting satellite tracking.
//!
//! The tracker task polls a position feed on its own timer and publishes each
//! fix through a watch channel; the frame loop picks up new fixes and drifts
//! the satellite with the planet in between.

use nalgebra::Vector3;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::coords::to_cartesian;

/// ISS altitude (~420 km) scaled to a 20-unit Earth.
pub const ISS_ORBIT_RADIUS: f64 = 21.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteFix {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} is not a number: {value:?}")]
    Coordinate { field: &'static str, value: String },
}

#[derive(Deserialize)]
struct IssNow {
    iss_position: IssPosition,
}

#[derive(Deserialize)]
struct IssPosition {
    latitude: String,
    longitude: String,
}

fn parse_coordinate(field: &'static str, value: &str) -> Result<f64, FeedError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FeedError::Coordinate {
            field,
            value: value.to_string(),
        })
}

/// Parse an `iss-now` style response body.
pub fn parse_fix(body: &str) -> Result<SatelliteFix, FeedError> {
    let now: IssNow = serde_json::from_str(body)?;
    Ok(SatelliteFix {
        latitude: parse_coordinate("latitude", &now.iss_position.latitude)?,
        longitude: parse_coordinate("longitude", &now.iss_position.longitude)?,
    })
}

pub trait PositionFeed: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<SatelliteFix, FeedError>> + Send;
}

pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl PositionFeed for HttpFeed {
    fn fetch(&self) -> impl Future<Output = Result<SatelliteFix, FeedError>> + Send {
        let request = self.client.get(&self.url).timeout(Duration::from_secs(4));
        async move {
            let body = request.send().await?.error_for_status()?.text().await?;
            parse_fix(&body)
        }
    }
}

/// Fetch once and publish on success. On failure the previous value stays.
pub async fn refresh<F: PositionFeed>(feed: &F, tx: &watch::Sender<Option<SatelliteFix>>) -> bool {
    match feed.fetch().await {
        Ok(fix) => {
            tracing::debug!(latitude = fix.latitude, longitude = fix.longitude, "satellite fix");
            tx.send_replace(Some(fix));
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "satellite feed failed, keeping previous position");
            false
        }
    }
}

/// Poll `feed` every `period` until every receiver is dropped.
pub fn spawn_tracker<F: PositionFeed>(
    feed: F,
    period: Duration,
) -> (watch::Receiver<Option<SatelliteFix>>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(None);
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }
            refresh(&feed, &tx).await;
        }
        tracing::debug!("satellite tracker stopped");
    });
    (rx, handle)
}

/// Frame-side satellite state: the last fix plus the longitude the planet has
/// turned through, so the fix stays over the ground it was reported for.
#[derive(Debug, Clone)]
pub struct Satellite {
    radius: f64,
    fix: Option<SatelliteFix>,
    /// Degrees added to the fix longitude.
    drift: f64,
    position: Option<Vector3<f64>>,
}

impl Satellite {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            fix: None,
            drift: 0.0,
            position: None,
        }
    }

    /// Take a fresh fix. `spin` is the planet's current rotation in degrees;
    /// drift restarts from there.
    pub fn apply_fix(&mut self, fix: SatelliteFix, spin: f64) {
        self.fix = Some(fix);
        self.drift = spin;
        self.update();
    }

    /// Advance with the planet by `degrees` of longitude.
    pub fn advance(&mut self, degrees: f64) {
        if self.fix.is_some() {
            self.drift += degrees;
            self.update();
        }
    }

    fn update(&mut self) {
        self.position = self
            .fix
            .map(|fix| to_cartesian(fix.latitude, fix.longitude + self.drift, self.radius));
    }

    pub fn fix(&self) -> Option<SatelliteFix> {
        self.fix
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn position(&self) -> Option<Vector3<f64>> {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedFeed {
        responses: Mutex<VecDeque<Result<SatelliteFix, FeedError>>>,
    }

    impl ScriptedFeed {
        fn new(responses: Vec<Result<SatelliteFix, FeedError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    impl PositionFeed for ScriptedFeed {
        fn fetch(&self) -> impl Future<Output = Result<SatelliteFix, FeedError>> + Send {
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("feed exhausted");
            async move { next }
        }
    }

    #[test]
    fn parses_string_coordinates() {
        let fix = parse_fix(
            r#"{"message": "success", "timestamp": 1700000000,
                "iss_position": {"latitude": "-12.5034", "longitude": "101.2201"}}"#,
        )
        .unwrap();
        assert_eq!(
            fix,
            SatelliteFix {
                latitude: -12.5034,
                longitude: 101.2201
            }
        );
    }

    #[test]
    fn rejects_non_numeric_coordinates() {
        let err = parse_fix(r#"{"iss_position": {"latitude": "north", "longitude": "1"}}"#)
            .unwrap_err();
        assert!(matches!(err, FeedError::Coordinate { field: "latitude", .. }));
        assert!(matches!(parse_fix("<html>").unwrap_err(), FeedError::Json(_)));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_fix() {
        let first = SatelliteFix {
            latitude: 10.0,
            longitude: 20.0,
        };
        let feed = ScriptedFeed::new(vec![
            Ok(first),
            Err(FeedError::Coordinate {
                field: "latitude",
                value: String::new(),
            }),
        ]);
        let (tx, rx) = watch::channel(None);

        assert!(refresh(&feed, &tx).await);
        assert_eq!(*rx.borrow(), Some(first));
        assert!(!refresh(&feed, &tx).await);
        assert_eq!(*rx.borrow(), Some(first));
    }

    #[tokio::test]
    async fn tracker_publishes_first_fix() {
        let fix = SatelliteFix {
            latitude: 1.0,
            longitude: 2.0,
        };
        let feed = ScriptedFeed::new(vec![Ok(fix)]);
        let (mut rx, handle) = spawn_tracker(feed, Duration::from_secs(3600));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(fix));
        handle.abort();
    }

    #[test]
    fn fix_starts_from_current_spin() {
        let mut sat = Satellite::new(ISS_ORBIT_RADIUS);
        sat.apply_fix(
            SatelliteFix {
                latitude: 0.0,
                longitude: 30.0,
            },
            45.0,
        );
        assert_relative_eq!(sat.drift(), 45.0);
        assert_relative_eq!(
            sat.position().unwrap(),
            to_cartesian(0.0, 75.0, ISS_ORBIT_RADIUS),
            epsilon = 1e-9
        );
    }

    #[test]
    fn drift_resets_on_new_fix() {
        let mut sat = Satellite::new(ISS_ORBIT_RADIUS);
        sat.advance(5.0);
        assert!(sat.position().is_none());

        sat.apply_fix(
            SatelliteFix {
                latitude: 0.0,
                longitude: 30.0,
            },
            0.0,
        );
        sat.advance(1.5);
        sat.advance(1.5);
        assert_relative_eq!(sat.drift(), 3.0);
        assert_relative_eq!(
            sat.position().unwrap(),
            to_cartesian(0.0, 33.0, ISS_ORBIT_RADIUS),
            epsilon = 1e-9
        );

        sat.apply_fix(
            SatelliteFix {
                latitude: 0.0,
                longitude: 40.0,
            },
            0.0,
        );
        assert_relative_eq!(sat.drift(), 0.0);
        assert_relative_eq!(sat.position().unwrap().norm(), ISS_ORBIT_RADIUS, epsilon = 1e-9);
    }
}
