//! 이체 화면 제출 - 흐름층
//!
//! 은행 화면을 직접 조작하지 않는다. [`ManualPortal`] 은 다계좌이체 양식에 넣을 값을
//! 줄 단위로 보여주고 담당자의 확인을 기록한다.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::infrastructure::Prompt;
use crate::models::TransferBatch;

/// 제출 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// 양식 입력까지만 (이체 실행은 담당자가 직접)
    FillOnly,
    /// 다계좌이체 실행까지 (`submit --auto`)
    Execute,
}

/// 제출 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 양식 입력 완료, 실행은 하지 않음
    Filled { entries: usize },
    /// 이체 실행 완료
    Executed { entries: usize },
    /// 담당자가 중단
    Cancelled,
}

/// 다계좌이체 양식 한 줄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormLine {
    /// 양식 줄 번호 (1부터)
    pub line: usize,
    /// 은행 선택 값 (코드를 모르면 빈 문자열)
    pub bank_code: String,
    pub account_number: String,
    pub amount: u64,
    /// 받는 분 통장 표시
    pub deposit_memo: String,
    /// 내 통장 표시
    pub withdraw_memo: String,
}

/// 묶음을 양식 줄로
pub fn form_lines(batch: &TransferBatch) -> Vec<FormLine> {
    batch
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| FormLine {
            line: i + 1,
            bank_code: entry.bank_code.unwrap_or_default().to_string(),
            account_number: entry.account_number.clone(),
            amount: entry.amount,
            deposit_memo: entry.product_name.clone(),
            withdraw_memo: entry.name_product.clone(),
        })
        .collect()
}

/// 이체 화면 능력
#[allow(async_fn_in_trait)]
pub trait TransferPortal {
    async fn submit(&self, batch: &TransferBatch, mode: SubmitMode) -> AppResult<SubmitOutcome>;
}

/// 콘솔에 양식 값을 보여주는 수동 제출
pub struct ManualPortal {
    prompt: Arc<dyn Prompt>,
}

impl ManualPortal {
    pub fn new(prompt: Arc<dyn Prompt>) -> Self {
        Self { prompt }
    }
}

impl TransferPortal for ManualPortal {
    async fn submit(&self, batch: &TransferBatch, mode: SubmitMode) -> AppResult<SubmitOutcome> {
        let lines = form_lines(batch);
        info!("{}", "=".repeat(60));
        info!("🧾 다계좌이체 입력 ({}건, 합계 {}원)", lines.len(), batch.total_amount());
        for line in &lines {
            info!(
                "  {:>2}. 은행 {:<4} 계좌 {:<16} 금액 {:>10} | 받는분 표시: {} | 내통장 표시: {}",
                line.line,
                if line.bank_code.is_empty() { "-" } else { line.bank_code.as_str() },
                line.account_number,
                line.amount,
                line.deposit_memo,
                line.withdraw_memo
            );
        }
        for entry in batch.unresolved_banks() {
            warn!("⚠️ {}행 은행 코드를 찾지 못했습니다: '{}'", entry.row_number, entry.bank_name);
        }
        info!("{}", "=".repeat(60));

        if !self.prompt.confirm("이체 화면에 위 내용을 모두 입력했습니까?")? {
            info!("이체 입력을 중단했습니다.");
            return Ok(SubmitOutcome::Cancelled);
        }

        match mode {
            SubmitMode::FillOnly => {
                info!("이체가 실행되지 않았습니다. 필요시 수동으로 다계좌이체진행 버튼을 클릭하세요.");
                Ok(SubmitOutcome::Filled { entries: lines.len() })
            }
            SubmitMode::Execute => {
                if self.prompt.confirm("다계좌이체진행을 완료했습니까?")? {
                    info!("✅ 이체가 완료되었습니다.");
                    Ok(SubmitOutcome::Executed { entries: lines.len() })
                } else {
                    info!("이체 실행이 확인되지 않아 입력 완료 상태로 둡니다.");
                    Ok(SubmitOutcome::Filled { entries: lines.len() })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ScriptedPrompt;
    use crate::models::TransferEntry;

    fn batch() -> TransferBatch {
        let mut batch = TransferBatch::new("Sheet1");
        batch.entries.push(TransferEntry {
            row_number: 2,
            bank_name: "신한은행".to_string(),
            bank_code: Some("088"),
            account_number: "110123456".to_string(),
            name_product: "홍길동A상품".to_string(),
            product_name: "A상품".to_string(),
            amount: 50000,
        });
        batch.entries.push(TransferEntry {
            row_number: 3,
            bank_name: "미상".to_string(),
            bank_code: None,
            account_number: "1".to_string(),
            name_product: "김철수B".to_string(),
            product_name: "B".to_string(),
            amount: 1000,
        });
        batch
    }

    #[test]
    fn test_form_lines() {
        let lines = form_lines(&batch());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[0].bank_code, "088");
        assert_eq!(lines[0].deposit_memo, "A상품");
        assert_eq!(lines[0].withdraw_memo, "홍길동A상품");
        assert_eq!(lines[1].bank_code, "");
    }

    #[tokio::test]
    async fn test_fill_only() {
        let prompt = Arc::new(ScriptedPrompt::new(["y"]));
        let portal = ManualPortal::new(prompt.clone());
        let outcome = portal.submit(&batch(), SubmitMode::FillOnly).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Filled { entries: 2 });
        assert_eq!(prompt.asked().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_and_cancel() {
        let portal = ManualPortal::new(Arc::new(ScriptedPrompt::new(["y", "y"])));
        assert_eq!(
            portal.submit(&batch(), SubmitMode::Execute).await.unwrap(),
            SubmitOutcome::Executed { entries: 2 }
        );

        let portal = ManualPortal::new(Arc::new(ScriptedPrompt::new(["n"])));
        assert_eq!(
            portal.submit(&batch(), SubmitMode::Execute).await.unwrap(),
            SubmitOutcome::Cancelled
        );
    }
}
