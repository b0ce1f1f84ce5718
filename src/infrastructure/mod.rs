//! 기초 설비층
//!
//! 파일, 시계, 콘솔 같은 자원을 쥐고 능력만 노출한다.

pub mod excel_store;
pub mod poll;
pub mod prompt;

pub use excel_store::{CellRange, CellRef, CellValue, ExcelStore, Sheet};
pub use poll::{poll_until, Clock, ManualClock, PollOutcome, SystemClock};
pub use prompt::{ConsolePrompt, Prompt, ScriptedPrompt};
