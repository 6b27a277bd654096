pub mod batch_lock;
pub mod config;
pub mod content_filter;
pub mod description;
pub mod error;
pub mod fill;
pub mod occasion;
pub mod pools;
pub mod sheet;
pub mod similarity;
pub mod text;
pub mod title;
pub mod uniqueness;
pub mod xlsx;
