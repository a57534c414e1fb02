use std::sync::Arc;

use tokio::sync::watch;
use wells::ChunkData;

use crate::grid::ChunkKey;

/// What the display layer should currently show.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    /// Chunk the viewport is in.
    pub chunk: Option<ChunkKey>,
    /// Records for `records_chunk`, replaced wholesale on every apply.
    pub records: Option<Arc<ChunkData>>,
    /// Chunk the records belong to (differs from `chunk` only while a
    /// replacement is pending with clearing disabled).
    pub records_chunk: Option<ChunkKey>,
    pub records_visible: bool,
    pub aggregated_visible: bool,
    /// Well id under tooltip/selection, if any.
    pub selection: Option<String>,
    pub initial_load_finished: bool,
    /// Bumped on every published change.
    pub revision: u64,
}

impl Default for DisplaySnapshot {
    fn default() -> Self {
        Self {
            chunk: None,
            records: None,
            records_chunk: None,
            records_visible: true,
            aggregated_visible: false,
            selection: None,
            initial_load_finished: false,
            revision: 0,
        }
    }
}

impl DisplaySnapshot {
    pub fn well_count(&self) -> usize {
        self.records.as_ref().map_or(0, |r| r.well_count())
    }
}

/// Owner side of the display: the only writer of the snapshot.
#[derive(Debug)]
pub struct DisplayState {
    tx: watch::Sender<DisplaySnapshot>,
}

impl DisplayState {
    pub fn new() -> (Self, watch::Receiver<DisplaySnapshot>) {
        let (tx, rx) = watch::channel(DisplaySnapshot::default());
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.tx.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut DisplaySnapshot) -> bool) {
        self.tx.send_if_modified(|snap| {
            let changed = f(snap);
            if changed {
                snap.revision += 1;
            }
            changed
        });
    }

    pub fn set_chunk(&self, key: ChunkKey) {
        self.update(|s| s.chunk.replace(key) != Some(key));
    }

    /// Drop the record set together with any selection pointing into it.
    pub fn clear_records(&self) {
        self.update(|s| {
            let had = s.records.is_some() || s.selection.is_some();
            s.records = None;
            s.records_chunk = None;
            s.selection = None;
            had
        });
    }

    /// Replace the record set. A selection survives only a refresh of the
    /// same chunk.
    pub fn show_records(&self, key: ChunkKey, data: ChunkData) {
        self.update(|s| {
            if s.records_chunk != Some(key) {
                s.selection = None;
            }
            s.records = Some(Arc::new(data));
            s.records_chunk = Some(key);
            true
        });
    }

    pub fn set_records_visible(&self, visible: bool) {
        self.update(|s| std::mem::replace(&mut s.records_visible, visible) != visible);
    }

    pub fn set_aggregated_visible(&self, visible: bool) {
        self.update(|s| std::mem::replace(&mut s.aggregated_visible, visible) != visible);
    }

    pub fn set_selection(&self, selection: Option<String>) {
        self.update(|s| {
            if s.selection == selection {
                return false;
            }
            s.selection = selection;
            true
        });
    }

    pub fn finish_initial_load(&self) {
        self.update(|s| !std::mem::replace(&mut s.initial_load_finished, true));
    }
}
