mod gpx;

pub use gpx::GpxParser;

use crate::error::ParseError;
use crate::types::activity::Track;

/// Decodes a raw track file into its tracks, in document order.
pub trait Parser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Track>, ParseError>;
}

