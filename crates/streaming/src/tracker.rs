//! Viewport motion tracking: decides when the current chunk changes.
//!
//! The tracker is a synchronous state machine. Each input returns the
//! [`TrackerAction`]s to perform, and the async session executes them, so
//! every transition can be exercised without timers.

use std::sync::Arc;

use tracing::debug;

use crate::config::StreamingConfig;
use crate::fetch::{ChunkRequest, FetchId};
use crate::grid::{ChunkKey, GridChunk, GridIndex};
use crate::registry::ChunkRegistry;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportPosition {
    pub lat: f64,
    pub lon: f64,
    /// Camera height above the ellipsoid (m).
    pub height: f64,
}

impl ViewportPosition {
    pub const fn new(lat: f64, lon: f64, height: f64) -> Self {
        Self { lat, lon, height }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MotionState {
    Idle,
    Moving,
}

/// Chunk the viewport currently sits in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CurrentChunk {
    pub key: ChunkKey,
    /// Registry entry; `None` when the registry does not know this key.
    pub chunk: Option<GridChunk>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportState {
    pub position: Option<ViewportPosition>,
    pub current: Option<CurrentChunk>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerAction {
    StartPolling,
    StopPolling,
    /// The current chunk pointer moved to `key`.
    ChunkChanged { key: ChunkKey, registered: bool },
    ClearRecords,
    Fetch(ChunkRequest),
    SetRecordsVisible(bool),
    ClearSelection,
    SetAggregatedVisible(bool),
    InitialLoadFinished,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Thresholds {
    records_max_height_m: f64,
    aggregated_min_height_m: f64,
}

#[derive(Debug)]
pub struct MotionTracker {
    grid: GridIndex,
    registry: Arc<ChunkRegistry>,
    thresholds: Thresholds,
    clear_on_chunk_change: bool,
    state: MotionState,
    viewport: ViewportState,
    records_visible: bool,
    aggregated_visible: bool,
    awaiting_initial_load: bool,
    next_fetch: u64,
}

impl MotionTracker {
    pub fn new(config: &StreamingConfig, grid: GridIndex, registry: Arc<ChunkRegistry>) -> Self {
        Self {
            grid,
            registry,
            thresholds: Thresholds {
                records_max_height_m: config.records_max_height_m,
                aggregated_min_height_m: config.aggregated_min_height_m,
            },
            clear_on_chunk_change: config.clear_on_chunk_change,
            state: MotionState::Idle,
            viewport: ViewportState::default(),
            records_visible: true,
            aggregated_visible: false,
            awaiting_initial_load: true,
            next_fetch: 1,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == MotionState::Moving
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn current_key(&self) -> Option<&ChunkKey> {
        self.viewport.current.as_ref().map(|c| &c.key)
    }

    /// Supersession guard: is `key` still the current chunk?
    pub fn is_current(&self, key: &ChunkKey) -> bool {
        self.current_key() == Some(key)
    }

    pub fn records_visible(&self) -> bool {
        self.records_visible
    }

    pub fn aggregated_visible(&self) -> bool {
        self.aggregated_visible
    }

    pub fn initial_load_finished(&self) -> bool {
        !self.awaiting_initial_load
    }

    /// Idle → Moving. A repeated start while moving is ignored.
    pub fn motion_start(&mut self) -> Vec<TrackerAction> {
        if self.is_moving() {
            debug!("motion start while already moving; ignored");
            return Vec::new();
        }
        self.state = MotionState::Moving;
        vec![TrackerAction::StartPolling]
    }

    /// One polling sample while moving.
    pub fn tick(&mut self, position: ViewportPosition) -> Vec<TrackerAction> {
        if !self.is_moving() {
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.resolve(position, &mut actions);
        actions
    }

    /// Moving → Idle: stop polling, catch a movement that fell between ticks,
    /// then evaluate the records-visible threshold.
    pub fn motion_end(&mut self, position: ViewportPosition) -> Vec<TrackerAction> {
        let mut actions = Vec::new();
        if self.is_moving() {
            self.state = MotionState::Idle;
            actions.push(TrackerAction::StopPolling);
        } else {
            debug!("motion end while idle");
        }
        self.resolve(position, &mut actions);

        let visible = position.height < self.thresholds.records_max_height_m;
        if visible != self.records_visible {
            self.records_visible = visible;
            actions.push(TrackerAction::SetRecordsVisible(visible));
            if !visible {
                actions.push(TrackerAction::ClearSelection);
            }
        }
        actions
    }

    /// Generic camera change. Only drives the aggregated view; never fetches.
    pub fn camera_changed(&mut self, position: ViewportPosition) -> Vec<TrackerAction> {
        self.viewport.position = Some(position);
        let visible = position.height >= self.thresholds.aggregated_min_height_m;
        if visible == self.aggregated_visible {
            return Vec::new();
        }
        self.aggregated_visible = visible;
        vec![TrackerAction::SetAggregatedVisible(visible)]
    }

    /// Tile-load progress from the terrain/tile system. Fires once, the first
    /// time nothing is pending; later signals are ignored.
    pub fn tile_load_progress(&mut self, pending: usize) -> Vec<TrackerAction> {
        if !self.awaiting_initial_load || pending > 0 {
            return Vec::new();
        }
        self.awaiting_initial_load = false;
        vec![TrackerAction::InitialLoadFinished]
    }

    fn resolve(&mut self, position: ViewportPosition, actions: &mut Vec<TrackerAction>) {
        self.viewport.position = Some(position);
        let located = self.grid.locate(position.lat, position.lon);
        if self.is_current(&located.key) {
            return;
        }

        let chunk = self.registry.lookup(&located.key).copied();
        let registered = chunk.is_some();
        debug!(
            "chunk change -> {} (index {},{}; registered: {registered})",
            located.key, located.lat_index, located.lon_index
        );
        self.viewport.current = Some(CurrentChunk {
            key: located.key,
            chunk,
        });

        actions.push(TrackerAction::ChunkChanged {
            key: located.key,
            registered,
        });
        if self.clear_on_chunk_change || !registered {
            actions.push(TrackerAction::ClearRecords);
        }
        if let Some(chunk) = chunk {
            let id = FetchId(self.next_fetch);
            self.next_fetch += 1;
            actions.push(TrackerAction::Fetch(ChunkRequest {
                id,
                key: located.key,
                chunk,
            }));
        }
    }
}
