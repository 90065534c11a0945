pub mod catalog;
pub mod engine;
pub mod export;
pub mod images;
pub mod pipeline;
pub mod stats;

pub use crate::domain::model::{
    Card, CardFilter, CollectionStats, GroupStats, ImportReport, ImportSource, ParsedBatch,
    RowError,
};
pub use crate::domain::ports::{ConfigProvider, ImportPipeline, Storage};
pub use crate::utils::error::Result;
