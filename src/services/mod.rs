pub mod account_parser;
pub mod backup_writer;
pub mod query_formula;
pub mod row_validator;
pub mod status_batch;

pub use account_parser::{parse_account, standardize_bank_name};
pub use backup_writer::BackupWriter;
pub use query_formula::build_query_formula;
pub use row_validator::{validate_rows, RowIssue, ValidationReport};
pub use status_batch::{build_status_batch, StatusBatch};
