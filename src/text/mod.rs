//! Text processing for AI replies
//!
//! - Extract: `**Name**` place mentions
//! - Describe: one-sentence descriptions per place
//! - Format: itinerary and chat HTML with clickable place spans

pub mod describe;
pub mod extract;
pub mod format;
pub mod syntax;

pub use describe::{DescriptionSynthesizer, DescriptionTable};
pub use extract::PlaceExtractor;
pub use format::{FoundPlaces, ItineraryFormatter, format_itinerary_html, format_message_text};
pub use syntax::{DayHeader, parse_day_header};
