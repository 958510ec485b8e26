use bytes::Bytes;
use models::{SeriesId, ShardId, Timestamp};

use crate::block::BlockDelegate;
use crate::error::{TsdbError, TsdbResult};
use crate::item_id::GlobalItemId;
use crate::series::SeriesSpan;

/// Builds at most one [`Writer`] per call, narrowed to the single block of
/// the span that covers the chosen time.
pub struct WriterBuilder<'a> {
    span: &'a SeriesSpan,
    time: Option<Timestamp>,
}

impl<'a> WriterBuilder<'a> {
    pub(crate) fn new(span: &'a SeriesSpan) -> Self {
        Self { span, time: None }
    }

    pub fn time(mut self, time: Timestamp) -> Self {
        self.time = Some(time);
        self
    }

    pub fn build(self) -> TsdbResult<Writer<'a>> {
        let time = match self.time {
            Some(time) => time,
            None => {
                return Err(TsdbError::InvalidParam {
                    reason: "a writer needs a target time".to_string(),
                })
            }
        };
        if !self.span.time_range().contains(time) {
            return Err(TsdbError::OutOfSpan { time });
        }
        let block = self
            .span
            .blocks()
            .iter()
            .find(|b| b.time_range().contains(time))
            .ok_or(TsdbError::OutOfSpan { time })?;
        Ok(Writer {
            block: block.as_ref(),
            series_id: self.span.series_id(),
            shard_id: self.span.shard_id(),
            time,
        })
    }
}

/// Writes items of one series at one timestamp. The span the writer was
/// built from keeps the block lease alive for as long as the writer lives.
pub struct Writer<'a> {
    block: &'a dyn BlockDelegate,
    series_id: SeriesId,
    shard_id: ShardId,
    time: Timestamp,
}

impl Writer<'_> {
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// Append one payload; the minted global address is returned.
    pub fn write(&self, payload: impl Into<Bytes>) -> TsdbResult<GlobalItemId> {
        let item_id = self.block.append(self.series_id, self.time, payload.into())?;
        Ok(GlobalItemId {
            shard_id: self.shard_id,
            segment_id: self.block.segment_id(),
            block_id: self.block.block_id(),
            series_id: self.series_id,
            item_id,
        })
    }
}
