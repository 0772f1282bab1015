//! Media storage module
//!
//! Blob storage is a capability behind the [`MediaStore`] trait:
//! `store` uploads bytes and yields the public URL plus the key used
//! for later removal; `remove` is best-effort cleanup. The production
//! implementation targets an R2/S3-compatible bucket; tests substitute
//! an in-memory fake.

mod media;

pub use media::{MediaStore, R2MediaStorage, StoredMedia};
pub(crate) use media::remove_best_effort;
