//! 편성층 (Orchestration Layer)
//!
//! ## 책임
//!
//! 설정으로 클라이언트를 만들고, 명령 하나를 해당 흐름에 넘기며, 결과를 집계한다.
//!
//! ## 모듈 구분
//!
//! ### `app` - 애플리케이션
//! - 실행 로그 파일과 시작 배너
//! - 작업별 필수 설정 확인
//! - 흐름 생성과 호출
//! - 최종 집계 출력
//!
//! ### `retry` - 전체 재시도
//! - 오류 사슬에서 502 응답 찾기
//! - 고정 대기 후 작업을 처음부터 다시 실행
//!
//! ## 계층 관계
//!
//! ```text
//! app (Task 하나)
//!     ↓
//! workflow (status_update / error_marking / sheet_download / transfer_session ...)
//!     ↓
//! services (account_parser / row_validator / status_batch / backup_writer)
//!     ↓
//! clients + infrastructure (SheetsApi / ExcelStore / Prompt / Clock)
//! ```

pub mod app;
pub mod retry;

pub use app::{App, Task};
pub use retry::{is_bad_gateway, retry_on_bad_gateway};
