pub mod bank;
pub mod column_map;
pub mod status;
pub mod transfer;

pub use bank::bank_code;
pub use column_map::ColumnMapping;
pub use status::{BackupRecord, Color, DepositStatus, SheetInfo, SheetStatusRow};
pub use transfer::{ParsedAccount, TransferBatch, TransferEntry, TransferRow, MAX_BATCH_ENTRIES};
