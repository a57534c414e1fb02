//! Scripted camera for headless runs.

use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use streaming::{ViewerEvent, Viewport, ViewportPosition};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use tokio::time;
use tracing::debug;

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub height: f64,
    #[serde(default)]
    pub dwell_ms: u64,
}

impl Waypoint {
    pub fn position(&self) -> ViewportPosition {
        ViewportPosition::new(self.lat, self.lon, self.height)
    }
}

/// Viewport whose position is written by the script player.
#[derive(Debug)]
pub struct ScriptedViewport {
    position: Mutex<ViewportPosition>,
}

impl ScriptedViewport {
    pub fn new(start: ViewportPosition) -> Self {
        Self {
            position: Mutex::new(start),
        }
    }

    pub fn set(&self, position: ViewportPosition) {
        *self.position.lock() = position;
    }
}

impl Viewport for ScriptedViewport {
    fn position(&self) -> ViewportPosition {
        *self.position.lock()
    }
}

/// `steps` evenly spaced positions after `from`, the last one exactly `to`.
pub fn interpolate(
    from: ViewportPosition,
    to: ViewportPosition,
    steps: usize,
) -> impl Iterator<Item = ViewportPosition> {
    let steps = steps.max(1);
    (1..=steps).map(move |i| {
        if i == steps {
            return to;
        }
        let t = i as f64 / steps as f64;
        ViewportPosition::new(
            from.lat + (to.lat - from.lat) * t,
            from.lon + (to.lon - from.lon) * t,
            from.height + (to.height - from.height) * t,
        )
    })
}

#[derive(Debug, Clone)]
pub struct CameraPath {
    waypoints: Vec<Waypoint>,
    steps_per_leg: usize,
    step_interval: Duration,
}

impl CameraPath {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints,
            steps_per_leg: 10,
            step_interval: Duration::from_millis(50),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Vec<Waypoint>>(json).map(Self::new)
    }

    pub fn with_steps(mut self, steps_per_leg: usize, step_interval: Duration) -> Self {
        self.steps_per_leg = steps_per_leg;
        self.step_interval = step_interval;
        self
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn start(&self) -> Option<ViewportPosition> {
        self.waypoints.first().map(Waypoint::position)
    }

    /// Fly `viewport` through every waypoint, emitting the viewer events a
    /// real camera would.
    pub async fn play(
        &self,
        viewport: &ScriptedViewport,
        events: &mpsc::Sender<ViewerEvent>,
    ) -> Result<(), SendError<ViewerEvent>> {
        events
            .send(ViewerEvent::TileLoadProgress { pending: 0 })
            .await?;

        let mut from = viewport.position();
        for (i, waypoint) in self.waypoints.iter().enumerate() {
            let to = waypoint.position();
            debug!(
                "waypoint {i}: ({}, {}) at {} m",
                waypoint.lat, waypoint.lon, waypoint.height
            );
            events.send(ViewerEvent::MotionStart).await?;
            for step in interpolate(from, to, self.steps_per_leg) {
                time::sleep(self.step_interval).await;
                viewport.set(step);
                events.send(ViewerEvent::Changed).await?;
            }
            events.send(ViewerEvent::MotionEnd).await?;
            time::sleep(Duration::from_millis(waypoint.dwell_ms)).await;
            from = to;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use streaming::{ViewerEvent, Viewport, ViewportPosition};
    use tokio::sync::mpsc;

    use super::{CameraPath, ScriptedViewport, interpolate};

    #[test]
    fn parses_waypoints_with_optional_dwell() {
        let path = CameraPath::from_json(
            r#"[{"lat": 34.6, "lon": -120.3, "height": 8000, "dwellMs": 1500},
                {"lat": 35.2, "lon": -120.3, "height": 90000}]"#,
        )
        .unwrap();
        assert_eq!(path.waypoints().len(), 2);
        assert_eq!(path.waypoints()[0].dwell_ms, 1500);
        assert_eq!(path.waypoints()[1].dwell_ms, 0);
        assert_eq!(path.start(), Some(ViewportPosition::new(34.6, -120.3, 8000.0)));
    }

    #[test]
    fn interpolation_lands_on_target() {
        let from = ViewportPosition::new(34.0, -121.0, 1000.0);
        let to = ViewportPosition::new(35.0, -120.0, 3000.0);
        let steps: Vec<_> = interpolate(from, to, 4).collect();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[1], ViewportPosition::new(34.5, -120.5, 2000.0));
        assert_eq!(steps[3], to);

        assert_eq!(interpolate(from, to, 0).collect::<Vec<_>>(), vec![to]);
    }

    #[tokio::test(start_paused = true)]
    async fn play_emits_motion_brackets_per_waypoint() {
        let path = CameraPath::from_json(
            r#"[{"lat": 34.6, "lon": -120.3, "height": 8000},
                {"lat": 35.2, "lon": -120.3, "height": 8000, "dwellMs": 100}]"#,
        )
        .unwrap()
        .with_steps(2, Duration::from_millis(10));
        let viewport = ScriptedViewport::new(path.start().unwrap());
        let (tx, mut rx) = mpsc::channel(32);

        path.play(&viewport, &tx).await.unwrap();
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        use ViewerEvent::*;
        assert_eq!(
            events,
            vec![
                TileLoadProgress { pending: 0 },
                MotionStart,
                Changed,
                Changed,
                MotionEnd,
                MotionStart,
                Changed,
                Changed,
                MotionEnd,
            ]
        );
        assert_eq!(viewport.position(), ViewportPosition::new(35.2, -120.3, 8000.0));
    }
}
