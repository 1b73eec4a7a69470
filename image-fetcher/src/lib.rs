pub mod extractor;
pub mod fetcher;


pub use extractor::UrlExtractor;
pub use fetcher::{file_name_for, ImageFetcher};
