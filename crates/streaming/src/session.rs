//! The streaming event loop.
//!
//! One task owns the tracker, the display and every in-flight fetch. Viewer
//! events, polling ticks and fetch completions interleave on that task and
//! never run concurrently.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use wells::{ChunkData, TerrainSampler};

use crate::config::StreamingConfig;
use crate::display::{DisplaySnapshot, DisplayState};
use crate::error::StreamError;
use crate::fetch::{ChunkFetcher, ChunkRequest};
use crate::grid::GridIndex;
use crate::pipeline::process_chunk;
use crate::registry::ChunkRegistry;
use crate::stats::StreamStats;
use crate::tracker::{MotionTracker, TrackerAction, ViewportPosition};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Camera the session samples on every tick and motion end.
pub trait Viewport: Send + Sync {
    fn position(&self) -> ViewportPosition;
}

/// Notifications from the viewer.
///
/// `MotionStart` should not repeat without an intervening `MotionEnd`; a
/// repeat is tolerated and ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    MotionStart,
    MotionEnd,
    /// Any camera change, moving or not.
    Changed,
    /// Outstanding terrain/tile load work.
    TileLoadProgress { pending: usize },
    /// Well picked for tooltip or detail, `None` to deselect.
    Selection(Option<String>),
}

struct FetchCompletion {
    request: ChunkRequest,
    result: Result<ChunkData, StreamError>,
}

pub struct StreamSession {
    tracker: MotionTracker,
    viewport: Arc<dyn Viewport>,
    fetcher: Arc<dyn ChunkFetcher>,
    terrain: Arc<dyn TerrainSampler>,
    display: DisplayState,
    stats: StreamStats,
    inflight: JoinSet<FetchCompletion>,
    poll_interval: Duration,
    polling: bool,
}

impl StreamSession {
    pub fn new(
        config: &StreamingConfig,
        registry: Arc<ChunkRegistry>,
        viewport: Arc<dyn Viewport>,
        fetcher: Arc<dyn ChunkFetcher>,
        terrain: Arc<dyn TerrainSampler>,
    ) -> (Self, watch::Receiver<DisplaySnapshot>) {
        let grid = GridIndex::new(config.bounds, config.splits);
        let (display, rx) = DisplayState::new();
        let session = Self {
            tracker: MotionTracker::new(config, grid, registry),
            viewport,
            fetcher,
            terrain,
            display,
            stats: StreamStats::default(),
            inflight: JoinSet::new(),
            // `interval` panics on a zero period.
            poll_interval: config.poll_interval().max(MIN_POLL_INTERVAL),
            polling: false,
        };
        (session, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.display.subscribe()
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Run until the event channel closes or `shutdown` turns true.
    ///
    /// In-flight fetches are aborted on exit.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ViewerEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> StreamStats {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !*shutdown.borrow_and_update() {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("shutdown sender dropped");
                        break;
                    }
                }
                Some(joined) = self.inflight.join_next(), if !self.inflight.is_empty() => {
                    self.complete(joined);
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, &mut ticker),
                    None => {
                        debug!("viewer event channel closed");
                        break;
                    }
                },
                _ = ticker.tick(), if self.polling => {
                    let position = self.viewport.position();
                    let actions = self.tracker.tick(position);
                    self.apply(actions, &mut ticker);
                }
            }
        }

        if !self.inflight.is_empty() {
            debug!("aborting {} in-flight fetches", self.inflight.len());
        }
        self.inflight.abort_all();
        info!(
            "stream session stopped: {} chunk changes, {} fetches ({} applied, {} stale, {} failed)",
            self.stats.chunk_changes,
            self.stats.fetches_issued,
            self.stats.fetches_applied,
            self.stats.stale_discarded,
            self.stats.fetches_failed
        );
        self.stats
    }

    fn handle_event(&mut self, event: ViewerEvent, ticker: &mut Interval) {
        let actions = match event {
            ViewerEvent::MotionStart => self.tracker.motion_start(),
            ViewerEvent::MotionEnd => self.tracker.motion_end(self.viewport.position()),
            ViewerEvent::Changed => self.tracker.camera_changed(self.viewport.position()),
            ViewerEvent::TileLoadProgress { pending } => self.tracker.tile_load_progress(pending),
            ViewerEvent::Selection(selection) => {
                if selection.is_some() && !self.tracker.records_visible() {
                    debug!("selection ignored while records are hidden");
                } else {
                    self.display.set_selection(selection);
                }
                Vec::new()
            }
        };
        self.apply(actions, ticker);
    }

    fn apply(&mut self, actions: Vec<TrackerAction>, ticker: &mut Interval) {
        for action in actions {
            match action {
                TrackerAction::StartPolling => {
                    self.polling = true;
                    ticker.reset();
                }
                TrackerAction::StopPolling => self.polling = false,
                TrackerAction::ChunkChanged { key, registered } => {
                    self.stats.chunk_changes += 1;
                    if !registered {
                        debug!("chunk {key} has no data in the registry");
                    }
                    self.display.set_chunk(key);
                }
                TrackerAction::ClearRecords => self.display.clear_records(),
                TrackerAction::Fetch(request) => self.spawn_fetch(request),
                TrackerAction::SetRecordsVisible(visible) => {
                    self.display.set_records_visible(visible)
                }
                TrackerAction::ClearSelection => self.display.set_selection(None),
                TrackerAction::SetAggregatedVisible(visible) => {
                    self.display.set_aggregated_visible(visible)
                }
                TrackerAction::InitialLoadFinished => {
                    info!("initial tile load finished");
                    self.display.finish_initial_load();
                }
            }
        }
    }

    fn spawn_fetch(&mut self, request: ChunkRequest) {
        self.stats.fetches_issued += 1;
        debug!("fetch {} issued for {}", request.id.0, request.key);

        let fetcher = Arc::clone(&self.fetcher);
        let terrain = Arc::clone(&self.terrain);
        self.inflight.spawn(async move {
            let result = process_chunk(fetcher.as_ref(), terrain.as_ref(), &request).await;
            FetchCompletion { request, result }
        });
    }

    fn complete(&mut self, joined: Result<FetchCompletion, JoinError>) {
        let FetchCompletion { request, result } = match joined {
            Ok(done) => done,
            Err(err) if err.is_cancelled() => return,
            Err(err) => {
                warn!("fetch task failed: {err}");
                self.stats.fetches_failed += 1;
                return;
            }
        };

        // Last chunk change wins, not last completion.
        if !self.tracker.is_current(&request.key) {
            self.stats.stale_discarded += 1;
            debug!("fetch {} for {} superseded", request.id.0, request.key);
            return;
        }

        match result {
            Ok(data) => {
                self.stats.fetches_applied += 1;
                self.stats.wells_applied += data.well_count() as u64;
                self.display.show_records(request.key, data);
            }
            Err(err) => {
                self.stats.fetches_failed += 1;
                warn!("{err}");
                self.display.clear_records();
            }
        }
    }
}
