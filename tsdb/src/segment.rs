use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use models::{BlockId, SegmentId, TimeRange, Timestamp};
use parking_lot::RwLock;
use trace::debug;

use crate::block::Block;

/// Rollover unit of the shard: a fixed time window sub-divided into blocks.
#[derive(Debug)]
pub struct Segment {
    id: SegmentId,
    time_range: TimeRange,
    block_duration: i64,
    blocks: RwLock<SegmentBlocks>,
}

#[derive(Debug, Default)]
struct SegmentBlocks {
    by_start: BTreeMap<Timestamp, Arc<Block>>,
    by_id: HashMap<BlockId, Arc<Block>>,
    next_block_id: BlockId,
}

impl Segment {
    pub(crate) fn new(
        id: SegmentId,
        start: Timestamp,
        segment_duration: i64,
        block_duration: i64,
    ) -> Self {
        Self {
            id,
            time_range: TimeRange::new_section(start, start + segment_duration),
            block_duration,
            blocks: RwLock::default(),
        }
    }

    pub(crate) fn id(&self) -> SegmentId {
        self.id
    }

    pub(crate) fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Blocks overlapping `time_range`, ascending by covered start time.
    pub(crate) fn span(&self, time_range: &TimeRange) -> Vec<Arc<Block>> {
        self.blocks
            .read()
            .by_start
            .values()
            .filter(|b| b.time_range().overlaps(time_range))
            .cloned()
            .collect()
    }

    /// The block covering `time`, created on first use. `time` must fall in
    /// this segment's window.
    pub(crate) fn get_or_create_block(&self, time: Timestamp) -> Arc<Block> {
        let offset = (time - self.time_range.start) / self.block_duration;
        let start = self.time_range.start + offset * self.block_duration;
        {
            let blocks = self.blocks.read();
            if let Some(block) = blocks.by_start.get(&start) {
                return block.clone();
            }
        }
        let mut blocks = self.blocks.write();
        if let Some(block) = blocks.by_start.get(&start) {
            return block.clone();
        }
        blocks.next_block_id += 1;
        let block_id = blocks.next_block_id;
        let block = Arc::new(Block::new(
            self.id,
            block_id,
            TimeRange::new_section(start, start + self.block_duration),
        ));
        debug!(
            segment = self.id,
            block = block_id,
            "create block covering {}",
            block.time_range()
        );
        blocks.by_start.insert(start, block.clone());
        blocks.by_id.insert(block_id, block.clone());
        block
    }

    pub(crate) fn block(&self, id: BlockId) -> Option<Arc<Block>> {
        self.blocks.read().by_id.get(&id).cloned()
    }

    pub(crate) fn has_leases(&self) -> bool {
        self.blocks
            .read()
            .by_id
            .values()
            .any(|b| b.lease_count() > 0)
    }
}

#[cfg(test)]
mod tests {
    use models::TimeRange;

    use crate::segment::Segment;

    #[test]
    fn test_block_rollover() {
        let segment = Segment::new(1, 0, 1000, 100);
        let b1 = segment.get_or_create_block(150);
        let b2 = segment.get_or_create_block(199);
        let b3 = segment.get_or_create_block(200);

        assert_eq!(b1.block_id(), b2.block_id());
        assert_ne!(b1.block_id(), b3.block_id());
        assert_eq!(b1.time_range(), TimeRange::new_section(100, 200));
        assert_eq!(b3.time_range(), TimeRange::new_section(200, 300));
    }

    #[test]
    fn test_span_is_time_ordered() {
        let segment = Segment::new(1, 0, 1000, 100);
        segment.get_or_create_block(500);
        segment.get_or_create_block(100);
        segment.get_or_create_block(300);

        let blocks = segment.span(&TimeRange::new_inclusive(0, 999));
        let starts: Vec<_> = blocks.iter().map(|b| b.time_range().start).collect();
        assert_eq!(starts, vec![100, 300, 500]);

        let narrowed = segment.span(&TimeRange::new_inclusive(350, 350));
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].time_range().start, 300);
    }
}
