use bytes::Bytes;
use models::{ItemId, SeriesId, ShardId, TimeRange, Timestamp};
use trace::debug;

use crate::block::{BlockDelegateRef, DataReaderRef};
use crate::error::{TsdbError, TsdbResult};
use crate::item_id::GlobalItemId;
use crate::seeker::SeekerBuilder;
use crate::store::BlockDatabaseRef;
use crate::writer::WriterBuilder;

/// A logical stream of items sharing one entity identity within a shard.
/// Immutable after construction; all state mutation happens in the block
/// database, so concurrent calls are safe.
#[derive(Debug)]
pub struct Series {
    id: SeriesId,
    shard_id: ShardId,
    block_db: BlockDatabaseRef,
}

impl Series {
    pub fn new(id: SeriesId, block_db: BlockDatabaseRef) -> Self {
        let shard_id = block_db.shard_id();
        Self {
            id,
            shard_id,
            block_db,
        }
    }

    pub fn id(&self) -> SeriesId {
        self.id
    }

    /// A time-bounded view over every block of this series intersecting
    /// `time_range`. Fails with `EmptySeriesSpan` when nothing overlaps;
    /// a returned span is never empty and must be closed by the caller.
    pub async fn span(&self, time_range: TimeRange) -> TsdbResult<SeriesSpan> {
        let blocks = self.block_db.span(&time_range).await?;
        if blocks.is_empty() {
            return Err(TsdbError::EmptySeriesSpan { time_range });
        }
        debug!(series = self.id, "select series span over {}", time_range);
        Ok(SeriesSpan::new(time_range, blocks, self.id, self.shard_id))
    }

    /// The span for writing at `time`, range `[time, time]`. An existing
    /// block covering `time` is reused; otherwise one is created. The series
    /// itself comes into existence with the first item written through the
    /// returned span.
    pub async fn create(&self, time: Timestamp) -> TsdbResult<SeriesSpan> {
        let time_range = TimeRange::new_inclusive(time, time);
        let mut blocks = self.block_db.span(&time_range).await?;
        if !blocks.is_empty() {
            debug!(series = self.id, time, "load a series span");
            return Ok(SeriesSpan::new(time_range, blocks, self.id, self.shard_id));
        }
        let block = self.block_db.create(time).await?;
        blocks.push(block);
        debug!(series = self.id, time, "create a series span");
        Ok(SeriesSpan::new(time_range, blocks, self.id, self.shard_id))
    }

    /// Random fetch of one item by its global address. The item stays
    /// readable until the returned closer releases the block lease; provider
    /// failures propagate unchanged, a missing block is `BlockAbsent` with
    /// the offending id attached.
    pub async fn get(&self, id: &GlobalItemId) -> TsdbResult<(Item, ItemCloser)> {
        let block = self.block_db.block(id).await?;
        match block {
            Some(block) => {
                let item = Item::new(self.id, id.item_id, block.data_reader());
                Ok((item, ItemCloser { block }))
            }
            None => Err(TsdbError::BlockAbsent { id: *id }),
        }
    }
}

/// A time-bounded, multi-block view of one series. Owns its delegates:
/// closing the span releases every block lease exactly once. Writers and
/// seekers borrow the span, so it outlives everything built from it.
#[derive(Debug)]
pub struct SeriesSpan {
    blocks: Vec<BlockDelegateRef>,
    series_id: SeriesId,
    shard_id: ShardId,
    time_range: TimeRange,
}

impl SeriesSpan {
    pub(crate) fn new(
        time_range: TimeRange,
        blocks: Vec<BlockDelegateRef>,
        series_id: SeriesId,
        shard_id: ShardId,
    ) -> Self {
        Self {
            blocks,
            series_id,
            shard_id,
            time_range,
        }
    }

    pub fn series_id(&self) -> SeriesId {
        self.series_id
    }

    pub fn shard_id(&self) -> ShardId {
        self.shard_id
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub(crate) fn blocks(&self) -> &[BlockDelegateRef] {
        &self.blocks
    }

    /// Release every owned delegate. A failed release does not stop the
    /// remaining ones; all failures are reported together.
    pub async fn close(mut self) -> TsdbResult<()> {
        let total = self.blocks.len();
        let mut failures = Vec::new();
        for block in self.blocks.drain(..) {
            if let Err(e) = block.close().await {
                failures.push(e);
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TsdbError::CloseSpan {
                total,
                sources: failures,
            })
        }
    }

    pub fn writer_builder(&self) -> WriterBuilder<'_> {
        WriterBuilder::new(self)
    }

    pub fn seeker_builder(&self) -> SeekerBuilder<'_> {
        SeekerBuilder::new(self)
    }
}

/// Readable handle to one stored item, tagged with its series and item ids.
/// Reads go through the data region of the block the item lives in; the
/// handle is only guaranteed valid while that block's lease is held.
#[derive(Debug)]
pub struct Item {
    series_id: SeriesId,
    item_id: ItemId,
    data: DataReaderRef,
}

impl Item {
    pub(crate) fn new(series_id: SeriesId, item_id: ItemId, data: DataReaderRef) -> Self {
        Self {
            series_id,
            item_id,
            data,
        }
    }

    pub fn series_id(&self) -> SeriesId {
        self.series_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn payload(&self) -> TsdbResult<Bytes> {
        match self.data.read(self.series_id, self.item_id) {
            Some(payload) => Ok(payload),
            None => Err(TsdbError::ItemAbsent {
                series_id: self.series_id,
                item_id: self.item_id,
            }),
        }
    }
}

/// Releases the block lease backing an [`Item`] fetched with
/// [`Series::get`]. The item must not be used afterwards.
#[derive(Debug)]
pub struct ItemCloser {
    block: BlockDelegateRef,
}

impl ItemCloser {
    pub async fn close(self) -> TsdbResult<()> {
        self.block.close().await
    }
}
