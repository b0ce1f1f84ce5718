pub mod deposit_request;
pub mod error_marking;
pub mod formula_setup;
pub mod portal;
pub mod sheet_download;
pub mod status_update;
pub mod transfer_loader;
pub mod transfer_session;

pub use deposit_request::{DepositRequestFlow, DepositRequestResult};
pub use error_marking::{split_names, ErrorMarkingFlow, ErrorMarkingSummary};
pub use formula_setup::FormulaSetupFlow;
pub use portal::{ManualPortal, SubmitMode, SubmitOutcome, TransferPortal};
pub use sheet_download::{DownloadReport, SheetDownloadFlow};
pub use status_update::{StatusUpdateFlow, StatusUpdateSummary};
pub use transfer_loader::{load_from_excel, load_from_sheet};
pub use transfer_session::{Command, LoadSource, SessionState, SessionSummary, TransferSession};
