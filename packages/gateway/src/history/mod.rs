mod cursor;
mod ledger;

pub use cursor::{Cursor, CursorError};
pub use ledger::{HistoryLedger, HistoryPage, MAX_PAGE_SIZE, clamp_limit};
