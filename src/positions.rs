//! Durable per-room display positions.
//!
//! The animator's full display map is written after every change and
//! reloaded on startup, so a restart mid-animation resumes from the
//! last rendered cell instead of snapping tokens across the board.

use crate::types::Address;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use std::{
    collections::BTreeMap,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

const POSITIONS_DIR: &str = "positions";

#[derive(Debug)]
pub struct PositionStore {
    dir: PathBuf,
}

impl PositionStore {
    /// Opens (and creates, if needed) `<data_root>/positions`.
    pub fn open(data_root: impl AsRef<Path>) -> Result<Self> {
        let dir = data_root.as_ref().join(POSITIONS_DIR);
        if !dir.exists() {
            fs::create_dir_all(&dir).wrap_err_with(|| {
                format!("failed to create position store at {}", dir.display())
            })?;
        }
        Ok(PositionStore { dir })
    }

    pub fn path_for(&self, room_id: u64) -> PathBuf {
        self.dir.join(format!("room-{room_id}.json"))
    }

    /// Last persisted display map for the room; empty when none was
    /// ever written.
    pub fn load(&self, room_id: u64) -> Result<BTreeMap<Address, u16>> {
        let path = self.path_for(room_id);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read(&path).wrap_err_with(|| {
            format!("failed to read display positions at {}", path.display())
        })?;
        if data.is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&data).wrap_err_with(|| {
            format!("invalid display position file at {}", path.display())
        })
    }

    pub fn save(
        &self,
        room_id: u64,
        positions: &BTreeMap<Address, u16>,
    ) -> Result<()> {
        let path = self.path_for(room_id);
        let json = serde_json::to_vec_pretty(positions)
            .wrap_err("failed to serialize display positions")?;
        fs::write(&path, json).wrap_err_with(|| {
            format!("failed to write display positions at {}", path.display())
        })
    }
}
