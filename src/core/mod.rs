pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod record;

pub use error::ExtractError;
pub use extractor::{ExtractorEngine, PlatformExtractor};
pub use fetcher::{FileFetcher, TempVideo};
pub use record::{format_duration, Platform, VariantUrls, VideoRecord};
