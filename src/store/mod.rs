mod db;
mod models;

pub use db::{has_processed, mark_processed, save_record};
#[cfg(test)]
pub use db::count_records;
pub use models::{EmailRecord, ProcessedMarker};
