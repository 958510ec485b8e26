use std::collections::HashMap;
use std::sync::Arc;

use models::{SeriesId, SeriesKey, ShardId};
use parking_lot::RwLock;

use crate::series::Series;
use crate::store::BlockDatabaseRef;

/// Per-shard facade: owns the block-database handle and caches series,
/// created on demand, for the life of the shard.
#[derive(Debug)]
pub struct Shard {
    id: ShardId,
    block_db: BlockDatabaseRef,
    series: RwLock<HashMap<SeriesId, Arc<Series>>>,
}

impl Shard {
    pub fn new(block_db: BlockDatabaseRef) -> Self {
        let id = block_db.shard_id();
        Self {
            id,
            block_db,
            series: RwLock::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> ShardId {
        self.id
    }

    pub fn block_db(&self) -> &BlockDatabaseRef {
        &self.block_db
    }

    /// The series identified by `key`, hashing its entity tuple into the
    /// stable series id.
    pub fn series(&self, key: &SeriesKey) -> Arc<Series> {
        self.series_by_id(key.hash())
    }

    /// Lookup by id, e.g. from a decoded global item id.
    pub fn series_by_id(&self, id: SeriesId) -> Arc<Series> {
        {
            let series = self.series.read();
            if let Some(series) = series.get(&id) {
                return series.clone();
            }
        }
        let mut series = self.series.write();
        series
            .entry(id)
            .or_insert_with(|| Arc::new(Series::new(id, self.block_db.clone())))
            .clone()
    }
}
