mod error;
mod receipt;
mod reporting;
mod service;

pub use error::AppError;
pub use receipt::{FALLBACK_NOTE, NOTE_TIMEOUT, NoteGenerator, StaticNotes, generate_note};
pub use reporting::{MovementSummary, WeeklyMovementReport};
pub use service::{ProductUpdate, ShopService};
