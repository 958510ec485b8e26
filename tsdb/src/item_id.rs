use std::fmt::Display;

use models::{BlockId, ItemId, SegmentId, SeriesId, ShardId};

use crate::byte_utils;
use crate::error::{TsdbError, TsdbResult};

/// Serialized width of a [`GlobalItemId`]: 4 + 2 + 2 + 8 + 8 bytes.
pub const GLOBAL_ITEM_ID_LEN: usize = 24;

/// Fully qualified address of one durably stored item. The big-endian,
/// fixed-width encoding doubles as the persisted key format: comparing two
/// encoded ids byte-wise equals comparing the id tuples field by field, so
/// backing stores can prefix-scan over (shard, segment, block, series).
///
/// The field order here is load-bearing: the derived `Ord` must match the
/// encoded byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalItemId {
    pub shard_id: ShardId,
    pub segment_id: SegmentId,
    pub block_id: BlockId,
    pub series_id: SeriesId,
    pub item_id: ItemId,
}

impl GlobalItemId {
    pub fn new(
        shard_id: ShardId,
        segment_id: SegmentId,
        block_id: BlockId,
        series_id: SeriesId,
        item_id: ItemId,
    ) -> Self {
        Self {
            shard_id,
            segment_id,
            block_id,
            series_id,
            item_id,
        }
    }

    pub fn encode(&self) -> [u8; GLOBAL_ITEM_ID_LEN] {
        let mut buf = [0_u8; GLOBAL_ITEM_ID_LEN];
        buf[0..4].copy_from_slice(&self.shard_id.to_be_bytes());
        buf[4..6].copy_from_slice(&self.segment_id.to_be_bytes());
        buf[6..8].copy_from_slice(&self.block_id.to_be_bytes());
        buf[8..16].copy_from_slice(&self.series_id.to_be_bytes());
        buf[16..24].copy_from_slice(&self.item_id.to_be_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> TsdbResult<Self> {
        if data.len() != GLOBAL_ITEM_ID_LEN {
            return Err(TsdbError::ItemIdMalformed { len: data.len() });
        }
        Ok(Self {
            shard_id: byte_utils::decode_be_u32(&data[0..4]),
            segment_id: byte_utils::decode_be_u16(&data[4..6]),
            block_id: byte_utils::decode_be_u16(&data[6..8]),
            series_id: byte_utils::decode_be_u64(&data[8..16]),
            item_id: byte_utils::decode_be_u64(&data[16..24]),
        })
    }
}

impl Display for GlobalItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{shard: {}, segment: {}, block: {}, series: {}, item: {}}}",
            self.shard_id, self.segment_id, self.block_id, self.series_id, self.item_id
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TsdbError;
    use crate::item_id::{GlobalItemId, GLOBAL_ITEM_ID_LEN};

    fn corpus() -> Vec<GlobalItemId> {
        vec![
            GlobalItemId::new(0, 0, 0, 0, 0),
            GlobalItemId::new(0, 0, 0, 0, 1),
            GlobalItemId::new(0, 0, 0, 1, 0),
            GlobalItemId::new(0, 0, 1, 0, 0),
            GlobalItemId::new(0, 1, 0, 0, 0),
            GlobalItemId::new(1, 0, 0, 0, 0),
            GlobalItemId::new(7, 3, 11, 0xDEAD_BEEF, 0x0102_0304_0506_0708),
            GlobalItemId::new(u32::MAX, u16::MAX, u16::MAX, u64::MAX, u64::MAX),
            GlobalItemId::new(1, 2, 3, u64::MAX, 0),
            GlobalItemId::new(1, 2, 3, 0, u64::MAX),
            GlobalItemId::new(255, 256, 257, 258, 259),
        ]
    }

    #[test]
    fn test_encode_literal() {
        let id = GlobalItemId::new(7, 3, 11, 0xDEAD_BEEF, 0x0102_0304_0506_0708);
        let data = id.encode();
        assert_eq!(data.len(), GLOBAL_ITEM_ID_LEN);
        assert_eq!(
            data,
            [
                0x00, 0x00, 0x00, 0x07, // shard
                0x00, 0x03, // segment
                0x00, 0x0B, // block
                0x00, 0x00, 0x00, 0x00, 0xDE, 0xAD, 0xBE, 0xEF, // series
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, // item
            ]
        );
        assert_eq!(GlobalItemId::decode(&data).unwrap(), id);
    }

    #[test]
    fn test_round_trip() {
        for id in corpus() {
            let data = id.encode();
            assert_eq!(data.len(), GLOBAL_ITEM_ID_LEN);
            assert_eq!(GlobalItemId::decode(&data).unwrap(), id);
        }
    }

    #[test]
    fn test_decode_malformed() {
        for len in [0_usize, 3, 23, 25, 48] {
            let data = vec![0xFF_u8; len];
            match GlobalItemId::decode(&data) {
                Err(TsdbError::ItemIdMalformed { len: reported }) => assert_eq!(reported, len),
                other => panic!("len {} should be malformed, got {:?}", len, other),
            }
        }
    }

    #[test]
    fn test_encoding_preserves_order() {
        let ids = corpus();
        for a in &ids {
            for b in &ids {
                assert_eq!(
                    a.cmp(b),
                    a.encode().as_slice().cmp(b.encode().as_slice()),
                    "byte order diverges from tuple order for {} vs {}",
                    a,
                    b
                );
            }
        }
    }
}
