//! Third-party APIs reached with service credentials.

pub mod google;
pub mod sheets;

pub use sheets::{DescriptionNote, NoteSink, SheetsClient, SheetsNoteSink};
