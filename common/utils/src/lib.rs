mod bkdr_hash;

pub use bkdr_hash::BkdrHasher;
