//! 입금요청 모아보기 수식 생성 - 업무 능력층
//!
//! 현황판의 진행 중 시트를 IMPORTRANGE 로 묶어 `입금요청` 행만 골라내는 QUERY 수식을 만든다.

use crate::models::status::{is_done_sheet, STATUS_SHEET_RANGE};

const SPREADSHEET_URL_PREFIX: &str = "https://docs.google.com/spreadsheets/d/";

/// 공백이나 괄호가 있으면 작은따옴표로 감싼다
fn formula_sheet_name(name: &str) -> String {
    if name.contains(' ') || name.contains('(') || name.contains(')') {
        format!("'{}'", name)
    } else {
        name.to_string()
    }
}

/// 완료 시트를 뺀 시트 이름
pub fn active_sheet_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    names.into_iter().filter(|n| !is_done_sheet(n)).collect()
}

/// QUERY 수식
///
/// ```text
/// =QUERY({IMPORTRANGE("<url>", "6월!A1:P1000");IMPORTRANGE(...)}, "select * where Col16 = '입금요청'", 0)
/// ```
pub fn build_query_formula(source_spreadsheet_id: &str, sheet_names: &[&str]) -> String {
    let imports: Vec<String> = sheet_names
        .iter()
        .map(|name| {
            format!(
                "IMPORTRANGE(\"{}{}\", \"{}!{}\")",
                SPREADSHEET_URL_PREFIX,
                source_spreadsheet_id,
                formula_sheet_name(name),
                STATUS_SHEET_RANGE
            )
        })
        .collect();

    format!(
        "=QUERY({{{}}}, \"select * where Col16 = '입금요청'\", 0)",
        imports.join(";")
    )
}
