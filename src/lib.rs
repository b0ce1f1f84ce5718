//! # Batch Transfer
//!
//! 입금요청 시트를 정리하고 다계좌이체를 준비하며 입금 상태를 기록하는 Rust 애플리케이션
//!
//! ## 구조
//!
//! 계층을 엄격히 나눈다:
//!
//! ### ① 기초 설비층 (Infrastructure)
//! - `infrastructure/` - 파일, 시계, 콘솔을 쥐고 능력만 노출
//! - `ExcelStore` - 이체정보 엑셀 읽기/쓰기, 시트 순서 변경, 잠금 대기
//! - `poll_until` / `Prompt`
//!
//! ### ② 클라이언트 (Clients)
//! - `clients/` - OAuth 토큰 캐시와 Google Sheets v4 REST
//! - `SheetsApi` - 흐름이 의존하는 유일한 스프레드시트 능력
//!
//! ### ③ 업무 능력층 (Services)
//! - `services/` - 한 가지 일만 하는 순수 규칙
//! - 은행명 표준화, 계좌 칸 분리, 행 검증, 상태 변경 묶음, 백업, QUERY 수식
//!
//! ### ④ 흐름층 (Workflow)
//! - `workflow/` - 작업 하나의 처음부터 끝까지
//! - 시트 다운로드, 입금완료 처리, 입금오류 지정, 이체 세션, 입금요청 입력
//!
//! ### ⑤ 편성층 (Orchestration)
//! - `orchestrator/` - 설정으로 클라이언트를 만들고 작업을 실행, 502 재시도
//!
//! ## 모듈 구조

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 자주 쓰는 타입 재노출
pub use clients::{MemorySheets, SheetsApi, SheetsClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::ExcelStore;
pub use models::{TransferBatch, TransferEntry};
pub use orchestrator::{App, Task};
pub use workflow::{SessionState, TransferSession};
