use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use models::{BlockId, ItemId, SegmentId, SeriesId, TimeRange, Timestamp};
use parking_lot::RwLock;

use crate::error::{TsdbError, TsdbResult};

pub type BlockDelegateRef = Box<dyn BlockDelegate>;
pub type DataReaderRef = Arc<dyn DataReader>;

/// One materialized record of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEntry {
    pub series_id: SeriesId,
    pub item_id: ItemId,
    pub time: Timestamp,
    pub payload: Bytes,
}

/// Read view into a block's data region. Items stay bound to the reader of
/// the block they were fetched from.
pub trait DataReader: Send + Sync + Debug {
    fn read(&self, series_id: SeriesId, item_id: ItemId) -> Option<Bytes>;

    /// Records of `series_id` whose time falls in `time_range`, ascending by
    /// `(time, item_id)`.
    fn entries(&self, series_id: SeriesId, time_range: &TimeRange) -> Vec<ItemEntry>;
}

/// A scoped lease on one block. The provider counts leases so a leased block
/// cannot be retired underneath a reader; `close` releases exactly one lease
/// and consumes the delegate.
#[async_trait]
pub trait BlockDelegate: Send + Sync + Debug {
    fn segment_id(&self) -> SegmentId;

    fn block_id(&self) -> BlockId;

    /// The time window this block covers.
    fn time_range(&self) -> TimeRange;

    fn data_reader(&self) -> DataReaderRef;

    /// Append one record, minting the next item id of `series_id` within
    /// this block. Fails with `OutOfSpan` when `time` is outside the
    /// covered window.
    fn append(&self, series_id: SeriesId, time: Timestamp, payload: Bytes) -> TsdbResult<ItemId>;

    async fn close(self: Box<Self>) -> TsdbResult<()>;
}

/// In-memory block: a small time window of item records plus the lease count
/// guarding it against retirement.
#[derive(Debug)]
pub struct Block {
    segment_id: SegmentId,
    block_id: BlockId,
    time_range: TimeRange,
    data: Arc<BlockData>,
    leases: AtomicUsize,
}

impl Block {
    pub(crate) fn new(segment_id: SegmentId, block_id: BlockId, time_range: TimeRange) -> Self {
        Self {
            segment_id,
            block_id,
            time_range,
            data: Arc::new(BlockData::default()),
            leases: AtomicUsize::new(0),
        }
    }

    pub fn segment_id(&self) -> SegmentId {
        self.segment_id
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn lease_count(&self) -> usize {
        self.leases.load(Ordering::Acquire)
    }

    /// Take one lease and hand out the delegate holding it.
    pub fn lease(self: Arc<Self>) -> BlockDelegateRef {
        self.leases.fetch_add(1, Ordering::AcqRel);
        Box::new(BlockLease { block: self })
    }
}

#[derive(Debug, Default)]
struct BlockDataInner {
    items: BTreeMap<(SeriesId, ItemId), (Timestamp, Bytes)>,
    next_item_id: HashMap<SeriesId, ItemId>,
}

#[derive(Debug, Default)]
pub struct BlockData {
    inner: RwLock<BlockDataInner>,
}

impl BlockData {
    fn append(&self, series_id: SeriesId, time: Timestamp, payload: Bytes) -> ItemId {
        let mut inner = self.inner.write();
        let item_id = {
            let next = inner.next_item_id.entry(series_id).or_insert(0);
            let id = *next;
            *next += 1;
            id
        };
        inner.items.insert((series_id, item_id), (time, payload));
        item_id
    }
}

impl DataReader for BlockData {
    fn read(&self, series_id: SeriesId, item_id: ItemId) -> Option<Bytes> {
        self.inner
            .read()
            .items
            .get(&(series_id, item_id))
            .map(|(_, payload)| payload.clone())
    }

    fn entries(&self, series_id: SeriesId, time_range: &TimeRange) -> Vec<ItemEntry> {
        let inner = self.inner.read();
        let mut entries: Vec<ItemEntry> = inner
            .items
            .range((series_id, ItemId::MIN)..=(series_id, ItemId::MAX))
            .filter(|(_, (time, _))| time_range.contains(*time))
            .map(|((series_id, item_id), (time, payload))| ItemEntry {
                series_id: *series_id,
                item_id: *item_id,
                time: *time,
                payload: payload.clone(),
            })
            .collect();
        entries.sort_unstable_by_key(|e| (e.time, e.item_id));
        entries
    }
}

#[derive(Debug)]
struct BlockLease {
    block: Arc<Block>,
}

#[async_trait]
impl BlockDelegate for BlockLease {
    fn segment_id(&self) -> SegmentId {
        self.block.segment_id
    }

    fn block_id(&self) -> BlockId {
        self.block.block_id
    }

    fn time_range(&self) -> TimeRange {
        self.block.time_range
    }

    fn data_reader(&self) -> DataReaderRef {
        self.block.data.clone()
    }

    fn append(&self, series_id: SeriesId, time: Timestamp, payload: Bytes) -> TsdbResult<ItemId> {
        if !self.block.time_range.contains(time) {
            return Err(TsdbError::OutOfSpan { time });
        }
        Ok(self.block.data.append(series_id, time, payload))
    }

    async fn close(self: Box<Self>) -> TsdbResult<()> {
        self.block.leases.fetch_sub(1, Ordering::AcqRel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use models::TimeRange;

    use crate::block::Block;
    use crate::error::TsdbError;

    fn test_block() -> Arc<Block> {
        Arc::new(Block::new(1, 1, TimeRange::new_section(1000, 2000)))
    }

    #[tokio::test]
    async fn test_lease_counting() {
        let block = test_block();
        assert_eq!(block.lease_count(), 0);

        let d1 = block.clone().lease();
        let d2 = block.clone().lease();
        assert_eq!(block.lease_count(), 2);

        d1.close().await.unwrap();
        assert_eq!(block.lease_count(), 1);
        d2.close().await.unwrap();
        assert_eq!(block.lease_count(), 0);
    }

    #[tokio::test]
    async fn test_append_and_read() {
        let block = test_block();
        let delegate = block.clone().lease();

        let i0 = delegate.append(42, 1100, Bytes::from_static(b"a")).unwrap();
        let i1 = delegate.append(42, 1050, Bytes::from_static(b"b")).unwrap();
        let i2 = delegate.append(7, 1100, Bytes::from_static(b"c")).unwrap();
        assert_eq!((i0, i1), (0, 1));
        assert_eq!(i2, 0); // item ids are monotone per series

        let reader = delegate.data_reader();
        assert_eq!(reader.read(42, 0), Some(Bytes::from_static(b"a")));
        assert_eq!(reader.read(42, 2), None);

        let entries = reader.entries(42, &TimeRange::new_section(1000, 2000));
        let order: Vec<_> = entries.iter().map(|e| (e.time, e.item_id)).collect();
        assert_eq!(order, vec![(1050, 1), (1100, 0)]);

        delegate.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_append_outside_window() {
        let block = test_block();
        let delegate = block.clone().lease();
        match delegate.append(42, 2000, Bytes::from_static(b"x")) {
            Err(TsdbError::OutOfSpan { time }) => assert_eq!(time, 2000),
            other => panic!("expected out-of-span, got {:?}", other),
        }
        delegate.close().await.unwrap();
    }
}
