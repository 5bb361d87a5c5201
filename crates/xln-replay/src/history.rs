use std::collections::BTreeMap;

use xln_core::Tick;

use crate::error::ReplayError;
use crate::frame::ServerFrame;
use crate::state::ReplayState;

/// Append-only log of committed `ServerFrame`s plus periodic full-state
/// snapshots, so time-travel seeks don't require replaying from genesis
/// every time (spec §4.5 "Snapshotting").
#[derive(Clone, Debug)]
pub struct History {
    frames: Vec<ServerFrame>,
    snapshots: BTreeMap<Tick, ReplayState>,
    snapshot_interval: u64,
}

impl History {
    pub fn new(snapshot_interval: u64) -> Self {
        History {
            frames: Vec::new(),
            snapshots: BTreeMap::new(),
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    pub fn frames(&self) -> &[ServerFrame] {
        &self.frames
    }

    pub fn latest_tick(&self) -> Option<Tick> {
        self.frames.last().map(|f| f.tick)
    }

    /// Append a committed frame, taking a full snapshot every
    /// `snapshot_interval` frames (spec §4.5). `state` is the state
    /// *after* `frame` was applied.
    pub fn append(&mut self, frame: ServerFrame, state: &ReplayState) {
        self.frames.push(frame);
        if self.frames.len() as u64 % self.snapshot_interval == 0 {
            let tick = self.frames.last().expect("just pushed").tick;
            self.snapshots.insert(tick, state.clone());
        }
    }

    /// Most recent snapshot at or before `tick`, if any.
    pub fn nearest_snapshot_at_or_before(&self, tick: Tick) -> Option<(Tick, &ReplayState)> {
        self.snapshots.range(..=tick).next_back().map(|(t, s)| (*t, s))
    }

    /// Verify a snapshot's recorded hash still matches its recomputed
    /// state hash (spec §4.5 "Snapshot integrity").
    pub fn verify_snapshot(&self, tick: Tick, expected: xln_core::StateHash) -> Result<(), ReplayError> {
        let Some(state) = self.snapshots.get(&tick) else {
            return Err(ReplayError::TickBeyondHistory(tick));
        };
        let actual = state.state_hash();
        if actual != expected {
            return Err(ReplayError::SnapshotHashMismatch { expected, actual });
        }
        Ok(())
    }
}
