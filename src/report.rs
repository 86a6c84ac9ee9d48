//! Report rendering
//!
//! Turns a finished draft into Telegram HTML and splits it to fit the
//! platform's message length limit.

mod chunk;
mod format;

pub use chunk::chunk_text;
pub use format::{format_int, format_report, ReportFields};
