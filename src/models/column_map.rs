use crate::error::RowError;
use crate::models::transfer::{parse_amount, TransferRow};

/// 이체 행의 열 위치 (0부터)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub product_name: usize,
    pub customer_name: usize,
    pub account_info: usize,
    pub amount: usize,
}

impl ColumnMapping {
    /// 로컬 이체정보 엑셀 (D: 제품, E: 이름, H: 계좌, J: 금액)
    pub const EXCEL: ColumnMapping = ColumnMapping {
        product_name: 3,
        customer_name: 4,
        account_info: 7,
        amount: 9,
    };

    /// 입금요청 내역 시트 (E: 제품, F: 이름, I: 계좌, K: 금액)
    pub const REQUEST_SHEET: ColumnMapping = ColumnMapping {
        product_name: 4,
        customer_name: 5,
        account_info: 8,
        amount: 10,
    };

    fn fields(&self) -> [(&'static str, usize); 4] {
        [
            ("product_name", self.product_name),
            ("customer_name", self.customer_name),
            ("account_info", self.account_info),
            ("amount", self.amount),
        ]
    }

    /// 필요한 최소 열 수
    pub fn min_width(&self) -> usize {
        self.fields().iter().map(|(_, i)| *i).max().unwrap_or(0) + 1
    }

    /// 헤더 행 너비로 매핑 검증 (로드 시점에 한 번)
    pub fn validate(&self, header: &[String]) -> Result<(), RowError> {
        self.check_width(header.len(), 1)
    }

    fn check_width(&self, width: usize, row: usize) -> Result<(), RowError> {
        for (field, index) in self.fields() {
            if index >= width {
                return Err(RowError::ColumnOutOfRange {
                    field,
                    index,
                    width,
                    row,
                });
            }
        }
        Ok(())
    }

    /// 한 행을 이름 있는 필드로 변환
    pub fn extract(&self, row_number: usize, cells: &[String]) -> Result<TransferRow, RowError> {
        self.check_width(cells.len(), row_number)?;
        let text = |i: usize| cells[i].trim().to_string();

        Ok(TransferRow {
            row_number,
            product_name: text(self.product_name),
            customer_name: text(self.customer_name),
            raw_account: cells[self.account_info].clone(),
            amount: parse_amount(&cells[self.amount], row_number)?,
        })
    }
}

/// 모든 칸이 비어 있는 행
pub fn is_blank_row(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_min_width() {
        assert_eq!(ColumnMapping::EXCEL.min_width(), 10);
        assert_eq!(ColumnMapping::REQUEST_SHEET.min_width(), 11);
    }

    #[test]
    fn test_validate_header_fails_fast() {
        let header = row(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let err = ColumnMapping::EXCEL.validate(&header).unwrap_err();
        assert_eq!(
            err,
            RowError::ColumnOutOfRange {
                field: "amount",
                index: 9,
                width: 8,
                row: 1
            }
        );
    }

    #[test]
    fn test_extract_named_fields() {
        let cells = row(&[
            "", "", "", "A상품", "홍길동", "", "", "국민 123-45", "", "20,000",
        ]);
        let parsed = ColumnMapping::EXCEL.extract(5, &cells).unwrap();
        assert_eq!(parsed.product_name, "A상품");
        assert_eq!(parsed.customer_name, "홍길동");
        assert_eq!(parsed.raw_account, "국민 123-45");
        assert_eq!(parsed.amount, 20000);
        assert_eq!(parsed.row_number, 5);
    }

    #[test]
    fn test_extract_short_row() {
        let cells = row(&["", "", "", "A상품", "홍길동"]);
        assert!(matches!(
            ColumnMapping::EXCEL.extract(3, &cells),
            Err(RowError::ColumnOutOfRange { row: 3, .. })
        ));
    }

    #[test]
    fn test_blank_row() {
        assert!(is_blank_row(&row(&["", "  "])));
        assert!(is_blank_row(&[]));
        assert!(!is_blank_row(&row(&["", "x"])));
    }
}
