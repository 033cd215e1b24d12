mod zip;

pub use self::zip::{ExtractionReport, ZipExtractor};
