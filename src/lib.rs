pub mod cli;
pub mod config;
pub mod core;
pub mod extractors;
pub mod server;
pub mod utils;

pub use crate::core::{
    ExtractError, ExtractorEngine, FileFetcher, Platform, VariantUrls, VideoRecord,
};
pub use crate::extractors::{FacebookExtractor, TikTokExtractor};
