pub use block::{Block, BlockDelegate, BlockDelegateRef, DataReader, DataReaderRef, ItemEntry};
pub use error::{TsdbError, TsdbResult};
pub use item_id::{GlobalItemId, GLOBAL_ITEM_ID_LEN};
pub use option::StoreOptions;
pub use seeker::{Seeker, SeekerBuilder};
pub use series::{Item, ItemCloser, Series, SeriesSpan};
pub use shard::Shard;
pub use store::{BlockDatabase, BlockDatabaseRef, BlockStore};
pub use writer::{Writer, WriterBuilder};

pub mod block;
pub mod byte_utils;
pub mod error;
mod item_id;
mod option;
mod seeker;
mod segment;
mod series;
mod shard;
mod store;
mod writer;
