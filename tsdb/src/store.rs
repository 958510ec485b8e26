use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use models::{SegmentId, ShardId, TimeRange, Timestamp};
use parking_lot::RwLock;
use trace::{debug, info};

use crate::block::BlockDelegateRef;
use crate::error::TsdbResult;
use crate::item_id::GlobalItemId;
use crate::option::StoreOptions;
use crate::segment::Segment;

pub type BlockDatabaseRef = Arc<dyn BlockDatabase>;

/// Provider of block delegates for one shard. Absence is not a failure:
/// `span` may return nothing and `block` may return `None`; an `Err` always
/// means the provider itself failed.
#[async_trait]
pub trait BlockDatabase: Send + Sync + Debug {
    fn shard_id(&self) -> ShardId;

    /// Every block whose covered range intersects `time_range`, ascending by
    /// time. An empty result is valid.
    async fn span(&self, time_range: &TimeRange) -> TsdbResult<Vec<BlockDelegateRef>>;

    /// The block covering `time`; the block and its containing segment are
    /// created on first use. Concurrent calls for one timestamp observe the
    /// same block.
    async fn create(&self, time: Timestamp) -> TsdbResult<BlockDelegateRef>;

    /// Point lookup from a decoded address. `None` when the addressed block
    /// is unknown or has been retired.
    async fn block(&self, id: &GlobalItemId) -> TsdbResult<Option<BlockDelegateRef>>;
}

/// In-memory, per-shard [`BlockDatabase`]: segments keyed by covered start
/// time for range scans, by id for point lookups.
#[derive(Debug)]
pub struct BlockStore {
    shard_id: ShardId,
    options: StoreOptions,
    segments: RwLock<StoreSegments>,
}

#[derive(Debug, Default)]
struct StoreSegments {
    by_start: BTreeMap<Timestamp, Arc<Segment>>,
    by_id: HashMap<SegmentId, Arc<Segment>>,
    next_segment_id: SegmentId,
}

impl BlockStore {
    pub fn new(shard_id: ShardId, options: StoreOptions) -> TsdbResult<Self> {
        let options = options.validated()?;
        Ok(Self {
            shard_id,
            options,
            segments: RwLock::default(),
        })
    }

    fn segment_start(&self, time: Timestamp) -> Timestamp {
        time - time.rem_euclid(self.options.segment_duration)
    }

    fn get_or_create_segment(&self, time: Timestamp) -> Arc<Segment> {
        let start = self.segment_start(time);
        {
            let segments = self.segments.read();
            if let Some(segment) = segments.by_start.get(&start) {
                return segment.clone();
            }
        }
        let mut segments = self.segments.write();
        if let Some(segment) = segments.by_start.get(&start) {
            return segment.clone();
        }
        segments.next_segment_id += 1;
        let id = segments.next_segment_id;
        let segment = Arc::new(Segment::new(
            id,
            start,
            self.options.segment_duration,
            self.options.block_duration,
        ));
        info!(
            shard = self.shard_id,
            segment = id,
            "roll over to segment covering {}",
            segment.time_range()
        );
        segments.by_start.insert(start, segment.clone());
        segments.by_id.insert(id, segment.clone());
        segment
    }

    /// Drop every segment that ended at or before `before` and holds no
    /// outstanding leases. Returns how many segments were dropped. A later
    /// `block(id)` against a dropped segment resolves to absent.
    pub fn retire(&self, before: Timestamp) -> usize {
        let mut segments = self.segments.write();
        let eligible: Vec<Timestamp> = segments
            .by_start
            .iter()
            .filter(|(_, s)| s.time_range().end <= before && !s.has_leases())
            .map(|(start, _)| *start)
            .collect();
        for start in &eligible {
            if let Some(segment) = segments.by_start.remove(start) {
                segments.by_id.remove(&segment.id());
                info!(
                    shard = self.shard_id,
                    segment = segment.id(),
                    "retire segment covering {}",
                    segment.time_range()
                );
            }
        }
        eligible.len()
    }
}

#[async_trait]
impl BlockDatabase for BlockStore {
    fn shard_id(&self) -> ShardId {
        self.shard_id
    }

    async fn span(&self, time_range: &TimeRange) -> TsdbResult<Vec<BlockDelegateRef>> {
        let segments: Vec<Arc<Segment>> = {
            let segments = self.segments.read();
            segments
                .by_start
                .values()
                .filter(|s| s.time_range().overlaps(time_range))
                .cloned()
                .collect()
        };
        let mut delegates = Vec::new();
        for segment in segments {
            for block in segment.span(time_range) {
                delegates.push(block.lease());
            }
        }
        debug!(
            shard = self.shard_id,
            blocks = delegates.len(),
            "span over {}",
            time_range
        );
        Ok(delegates)
    }

    async fn create(&self, time: Timestamp) -> TsdbResult<BlockDelegateRef> {
        let segment = self.get_or_create_segment(time);
        let block = segment.get_or_create_block(time);
        Ok(block.lease())
    }

    async fn block(&self, id: &GlobalItemId) -> TsdbResult<Option<BlockDelegateRef>> {
        if id.shard_id != self.shard_id {
            return Ok(None);
        }
        let segment = self.segments.read().by_id.get(&id.segment_id).cloned();
        Ok(segment.and_then(|s| s.block(id.block_id)).map(|b| b.lease()))
    }
}

#[cfg(test)]
mod tests {
    use models::TimeRange;

    use crate::item_id::GlobalItemId;
    use crate::option::StoreOptions;
    use crate::store::{BlockDatabase, BlockStore};

    fn test_store() -> BlockStore {
        BlockStore::new(1, StoreOptions::new(1000, 100)).unwrap()
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let store = test_store();
        let d1 = store.create(1500).await.unwrap();
        let d2 = store.create(1550).await.unwrap();
        assert_eq!(d1.segment_id(), d2.segment_id());
        assert_eq!(d1.block_id(), d2.block_id());

        let d3 = store.create(1600).await.unwrap();
        assert_eq!(d3.segment_id(), d1.segment_id());
        assert_ne!(d3.block_id(), d1.block_id());

        let d4 = store.create(2500).await.unwrap();
        assert_ne!(d4.segment_id(), d1.segment_id());

        for d in [d1, d2, d3, d4] {
            d.close().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_span_ascends_across_segments() {
        let store = test_store();
        store.create(2500).await.unwrap().close().await.unwrap();
        store.create(500).await.unwrap().close().await.unwrap();
        store.create(1500).await.unwrap().close().await.unwrap();

        let delegates = store
            .span(&TimeRange::new_inclusive(0, 3000))
            .await
            .unwrap();
        let starts: Vec<_> = delegates.iter().map(|d| d.time_range().start).collect();
        assert_eq!(starts, vec![500, 1500, 2500]);

        for d in delegates {
            d.close().await.unwrap();
        }

        let empty = store
            .span(&TimeRange::new_inclusive(5000, 6000))
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_block_lookup() {
        let store = test_store();
        let created = store.create(1500).await.unwrap();
        let id = GlobalItemId::new(1, created.segment_id(), created.block_id(), 42, 0);

        let found = store.block(&id).await.unwrap().expect("block should exist");
        assert_eq!(found.time_range(), created.time_range());
        found.close().await.unwrap();
        created.close().await.unwrap();

        let missing = GlobalItemId::new(1, 99, 1, 42, 0);
        assert!(store.block(&missing).await.unwrap().is_none());

        let other_shard = GlobalItemId::new(2, id.segment_id, id.block_id, 42, 0);
        assert!(store.block(&other_shard).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retire_boundary_is_window_end() {
        let store = test_store();
        // segment window [1000, 2000)
        store.create(1500).await.unwrap().close().await.unwrap();

        // half-open window: at 2000 the segment covers nothing any more
        assert_eq!(store.retire(1999), 0);
        assert_eq!(store.retire(2000), 1);
    }

    #[tokio::test]
    async fn test_retire_respects_leases() {
        let store = test_store();
        let held = store.create(500).await.unwrap();
        store.create(1500).await.unwrap().close().await.unwrap();

        // the first segment is leased, the second has not ended yet
        assert_eq!(store.retire(1000), 0);
        assert_eq!(store.retire(2000), 1);

        held.close().await.unwrap();
        assert_eq!(store.retire(2000), 1);

        let gone = GlobalItemId::new(1, 1, 1, 42, 0);
        assert!(store.block(&gone).await.unwrap().is_none());
    }
}
