use models::{ItemId, SeriesId, TimeRange, Timestamp};
use snafu::Snafu;

use crate::item_id::GlobalItemId;

pub type TsdbResult<T, E = TsdbError> = std::result::Result<T, E>;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum TsdbError {
    #[snafu(display("there is no data in such time range: {}", time_range))]
    EmptySeriesSpan { time_range: TimeRange },

    #[snafu(display("serialized item id is malformed: {} bytes", len))]
    ItemIdMalformed { len: usize },

    #[snafu(display("block is absent, id: {}", id))]
    BlockAbsent { id: GlobalItemId },

    #[snafu(display("time {} is not covered by this span", time))]
    OutOfSpan { time: Timestamp },

    #[snafu(display("item {} of series {} is absent from block data", item_id, series_id))]
    ItemAbsent {
        series_id: SeriesId,
        item_id: ItemId,
    },

    #[snafu(display("Invalid parameter : {}", reason))]
    InvalidParam { reason: String },

    // Internal Error
    #[snafu(display("{}", source))]
    IO { source: std::io::Error },

    #[snafu(display(
        "failed to close {} of {} block delegates: {}",
        sources.len(),
        total,
        join_close_errors(sources)
    ))]
    CloseSpan {
        total: usize,
        sources: Vec<TsdbError>,
    },
}

impl From<std::io::Error> for TsdbError {
    fn from(value: std::io::Error) -> Self {
        TsdbError::IO { source: value }
    }
}

fn join_close_errors(errors: &[TsdbError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use crate::error::TsdbError;
    use crate::GlobalItemId;

    #[test]
    fn test_close_span_display_keeps_every_failure() {
        let e = TsdbError::CloseSpan {
            total: 3,
            sources: vec![
                TsdbError::BlockAbsent {
                    id: GlobalItemId::new(1, 2, 3, 4, 5),
                },
                TsdbError::ItemIdMalformed { len: 3 },
            ],
        };
        let msg = e.to_string();
        assert!(msg.contains("2 of 3"));
        assert!(msg.contains("block is absent"));
        assert!(msg.contains("malformed: 3 bytes"));
    }
}
