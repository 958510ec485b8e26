use serde::{Deserialize, Serialize};
use utils::BkdrHasher;

use crate::errors::{Error, Result};
use crate::tag::sort_tags;
use crate::{SeriesId, Tag};

/// The entity identity of a series: metric name plus its sorted tag set.
/// Hashing the key yields the stable [`SeriesId`] the storage layer
/// addresses items by.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SeriesKey {
    metric: String,
    tags: Vec<Tag>,
}

impl SeriesKey {
    /// Tags are checked and sorted before they become part of the identity,
    /// so a malformed tag can never be hashed into a [`SeriesId`].
    pub fn new(metric: String, mut tags: Vec<Tag>) -> Result<Self> {
        for tag in &tags {
            tag.check()?;
        }
        sort_tags(&mut tags);
        Ok(Self { metric, tags })
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn tags(&self) -> &Vec<Tag> {
        &self.tags
    }

    pub fn hash(&self) -> SeriesId {
        let mut hasher = BkdrHasher::new();
        hasher.hash_with(self.metric.as_bytes());
        for tag in &self.tags {
            hasher.hash_with(&tag.key);
            hasher.hash_with(&tag.value);
        }

        hasher.number()
    }

    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap()
    }

    pub fn decode(data: &[u8]) -> Result<SeriesKey> {
        bincode::deserialize(data).map_err(|err| Error::InvalidSerdeMessage {
            err: err.to_string(),
        })
    }
}

impl PartialEq for SeriesKey {
    fn eq(&self, other: &Self) -> bool {
        self.metric == other.metric && self.tags == other.tags
    }
}

impl Eq for SeriesKey {}
