use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::{TagKey, TagValue};

const TAG_KEY_MAX_LEN: usize = 512;
const TAG_VALUE_MAX_LEN: usize = 4096;

pub fn sort_tags(tags: &mut [Tag]) {
    tags.sort_by(|a, b| -> Ordering { a.key.cmp(&b.key) })
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Hash, Clone, Eq)]
pub struct Tag {
    pub key: TagKey,
    pub value: TagValue,
}

impl Tag {
    pub fn new(key: TagKey, value: TagValue) -> Self {
        Self { key, value }
    }

    pub fn check(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::InvalidTag {
                err: "Tag key cannot be empty".to_string(),
            });
        }
        if self.value.is_empty() {
            return Err(Error::InvalidTag {
                err: "Tag value cannot be empty".to_string(),
            });
        }
        if self.key.len() > TAG_KEY_MAX_LEN {
            return Err(Error::InvalidTag {
                err: format!("Tag key exceeds the TAG_KEY_MAX_LEN({})", TAG_KEY_MAX_LEN),
            });
        }
        if self.value.len() > TAG_VALUE_MAX_LEN {
            return Err(Error::InvalidTag {
                err: format!(
                    "Tag value exceeds the TAG_VALUE_MAX_LEN({})",
                    TAG_VALUE_MAX_LEN
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{sort_tags, Tag};

    #[test]
    fn test_check() {
        let tag = Tag::new(b"host".to_vec(), b"server-01".to_vec());
        assert!(tag.check().is_ok());

        let tag = Tag::new(b"".to_vec(), b"server-01".to_vec());
        assert!(tag.check().is_err());

        let tag = Tag::new(b"host".to_vec(), b"".to_vec());
        assert!(tag.check().is_err());
    }

    #[test]
    fn test_sort() {
        let mut tags = vec![
            Tag::new(b"region".to_vec(), b"us-east".to_vec()),
            Tag::new(b"host".to_vec(), b"server-01".to_vec()),
        ];
        sort_tags(&mut tags);
        assert_eq!(tags[0].key, b"host".to_vec());
        assert_eq!(tags[1].key, b"region".to_vec());
    }
}
