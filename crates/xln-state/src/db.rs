use std::path::Path;

use xln_core::{EntityId, Tick};
use xln_entity::Entity;
use xln_replay::{ReplayState, ServerFrame};

use crate::error::StateDbError;

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   entities   — EntityId bytes    → bincode(Entity)
///   frames     — tick big-endian   → bincode(ServerFrame)
///   snapshots  — tick big-endian   → bincode(ReplayState)
///   meta       — utf8 key bytes    → raw bytes
pub struct StateDb {
    _db: sled::Db,
    entities: sled::Tree,
    frames: sled::Tree,
    snapshots: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StateDbError> {
        let db = sled::open(path).map_err(|e| StateDbError::Storage(e.to_string()))?;
        let entities = db.open_tree("entities").map_err(|e| StateDbError::Storage(e.to_string()))?;
        let frames = db.open_tree("frames").map_err(|e| StateDbError::Storage(e.to_string()))?;
        let snapshots = db.open_tree("snapshots").map_err(|e| StateDbError::Storage(e.to_string()))?;
        let meta = db.open_tree("meta").map_err(|e| StateDbError::Storage(e.to_string()))?;
        Ok(Self { _db: db, entities, frames, snapshots, meta })
    }

    // ── Entities ─────────────────────────────────────────────────────────

    pub fn get_entity(&self, id: &EntityId) -> Result<Option<Entity>, StateDbError> {
        match self.entities.get(id.as_bytes()).map_err(|e| StateDbError::Storage(e.to_string()))? {
            Some(bytes) => {
                let entity = bincode::deserialize(&bytes).map_err(|e| StateDbError::Serialization(e.to_string()))?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    pub fn put_entity(&self, entity: &Entity) -> Result<(), StateDbError> {
        let bytes = bincode::serialize(entity).map_err(|e| StateDbError::Serialization(e.to_string()))?;
        self.entities
            .insert(entity.id.as_bytes(), bytes)
            .map_err(|e| StateDbError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn entity_exists(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id.as_bytes()).unwrap_or(false)
    }

    pub fn iter_all_entities(&self) -> Result<Vec<Entity>, StateDbError> {
        let mut out = Vec::new();
        for item in self.entities.iter() {
            let (_, bytes) = item.map_err(|e| StateDbError::Storage(e.to_string()))?;
            out.push(bincode::deserialize(&bytes).map_err(|e| StateDbError::Serialization(e.to_string()))?);
        }
        Ok(out)
    }

    pub fn count_entities(&self) -> u64 {
        self.entities.len() as u64
    }

    /// Rehydrate the full `ReplayState` from the entities tree.
    pub fn load_replay_state(&self) -> Result<ReplayState, StateDbError> {
        let mut state = ReplayState::new();
        for entity in self.iter_all_entities()? {
            state.entities.insert(entity.id, entity);
        }
        Ok(state)
    }

    /// Persist every entity in `state`, overwriting whatever was stored.
    pub fn save_replay_state(&self, state: &ReplayState) -> Result<(), StateDbError> {
        for entity in state.entities.values() {
            self.put_entity(entity)?;
        }
        Ok(())
    }

    // ── Server frames ────────────────────────────────────────────────────

    pub fn put_frame(&self, frame: &ServerFrame) -> Result<(), StateDbError> {
        let bytes = bincode::serialize(frame).map_err(|e| StateDbError::Serialization(e.to_string()))?;
        self.frames
            .insert(frame.tick.to_be_bytes(), bytes)
            .map_err(|e| StateDbError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_frame(&self, tick: Tick) -> Result<Option<ServerFrame>, StateDbError> {
        match self.frames.get(tick.to_be_bytes()).map_err(|e| StateDbError::Storage(e.to_string()))? {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes).map_err(|e| StateDbError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Frames with `tick > from_tick`, in ascending tick order.
    pub fn iter_frames_from(&self, from_tick: Tick) -> Result<Vec<ServerFrame>, StateDbError> {
        let mut out = Vec::new();
        for item in self.frames.range((from_tick + 1).to_be_bytes()..) {
            let (_, bytes) = item.map_err(|e| StateDbError::Storage(e.to_string()))?;
            out.push(bincode::deserialize(&bytes).map_err(|e| StateDbError::Serialization(e.to_string()))?);
        }
        Ok(out)
    }

    pub fn latest_frame_tick(&self) -> Result<Option<Tick>, StateDbError> {
        match self.frames.iter().next_back() {
            Some(item) => {
                let (key, _) = item.map_err(|e| StateDbError::Storage(e.to_string()))?;
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&key);
                Ok(Some(Tick::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    // ── Snapshots ────────────────────────────────────────────────────────

    pub fn put_snapshot(&self, tick: Tick, state: &ReplayState) -> Result<(), StateDbError> {
        let bytes = bincode::serialize(state).map_err(|e| StateDbError::Serialization(e.to_string()))?;
        self.snapshots
            .insert(tick.to_be_bytes(), bytes)
            .map_err(|e| StateDbError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_snapshot(&self, tick: Tick) -> Result<Option<ReplayState>, StateDbError> {
        match self.snapshots.get(tick.to_be_bytes()).map_err(|e| StateDbError::Storage(e.to_string()))? {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes).map_err(|e| StateDbError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub fn nearest_snapshot_at_or_before(&self, tick: Tick) -> Result<Option<(Tick, ReplayState)>, StateDbError> {
        match self.snapshots.range(..=tick.to_be_bytes()).next_back() {
            Some(item) => {
                let (key, bytes) = item.map_err(|e| StateDbError::Storage(e.to_string()))?;
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&key);
                let found_tick = Tick::from_be_bytes(arr);
                let state = bincode::deserialize(&bytes).map_err(|e| StateDbError::Serialization(e.to_string()))?;
                Ok(Some((found_tick, state)))
            }
            None => Ok(None),
        }
    }

    // ── Meta ─────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StateDbError> {
        self.meta.insert(key.as_bytes(), value).map_err(|e| StateDbError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StateDbError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| StateDbError::Storage(e.to_string()))
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), StateDbError> {
        self._db.flush().map_err(|e| StateDbError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_core::{Config, SignerId};

    #[test]
    fn put_and_get_entity_round_trips() {
        let dir = tempfile_dir();
        let db = StateDb::open(&dir).unwrap();
        let id = EntityId([3u8; 32]);
        let entity = Entity::new(id, vec![SignerId([1u8; 32])], Config::default());
        db.put_entity(&entity).unwrap();
        let loaded = db.get_entity(&id).unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert!(db.entity_exists(&id));
    }

    #[test]
    fn frames_iterate_in_ascending_tick_order() {
        let dir = tempfile_dir();
        let db = StateDb::open(&dir).unwrap();
        for tick in [1u64, 2, 3] {
            let frame = ServerFrame { tick, records: vec![], state_hash: xln_core::StateHash::zero() };
            db.put_frame(&frame).unwrap();
        }
        let ticks: Vec<u64> = db.iter_frames_from(0).unwrap().iter().map(|f| f.tick).collect();
        assert_eq!(ticks, vec![1, 2, 3]);
        assert_eq!(db.latest_frame_tick().unwrap(), Some(3));
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("xln-state-test-{}", std::process::id()));
        dir.push(uniq());
        dir
    }

    fn uniq() -> String {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed).to_string()
    }
}
