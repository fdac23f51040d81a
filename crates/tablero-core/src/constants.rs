//! Domain-wide constants.

/// Upload size ceiling for item media (images and pdfs).
pub const MAX_MEDIA_SIZE_BYTES: usize = 50 * 1024 * 1024;

/// Per-item media count limits, checked before any storage write.
pub const MAX_ITEM_IMAGES: i64 = 10;
pub const MAX_ITEM_PDFS: i64 = 2;
