//! 이체정보 엑셀 파일 - 기초 설비층
//!
//! 파일 전체를 메모리로 읽어 시트 순서와 셀 값을 다루고, 저장할 때 새로 쓴다.
//! 읽은 셀은 종류(문자열, 숫자, 논리값, 수식)를 그대로 다시 쓴다. 셀 서식은 보존하지 않는다.
//! 프로그램이 쓰는 값은 문자열이다 (계좌/주민번호 앞자리 0 보존).

use crate::error::{AppResult, ExcelError};
use crate::infrastructure::poll::{poll_until, Clock, PollOutcome, SystemClock};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 잠금 확인 간격
pub const LOCK_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// 잠금 대기 한도
pub const LOCK_POLL_DEADLINE: Duration = Duration::from_secs(60);

/// 셀 위치 (0부터)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    /// `"D2"` 형식 해석
    pub fn parse(address: &str) -> AppResult<Self> {
        let invalid = || ExcelError::InvalidAddress(address.to_string());
        let address = address.trim();
        let split = address
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = address.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid().into());
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if col > u16::MAX as u32 {
                return Err(invalid().into());
            }
        }
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid().into());
        }

        Ok(Self {
            row: row - 1,
            col: (col - 1) as u16,
        })
    }
}

/// 직사각형 셀 범위 (양 끝 포함)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// `"D2:J11"` 형식 해석
    pub fn parse(range: &str) -> AppResult<Self> {
        let (start, end) = range
            .split_once(':')
            .ok_or_else(|| ExcelError::InvalidAddress(range.to_string()))?;
        let start = CellRef::parse(start)?;
        let end = CellRef::parse(end)?;
        if end.row < start.row || end.col < start.col {
            return Err(ExcelError::InvalidAddress(range.to_string()).into());
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }
}

/// 셀 값 (표시 문자열과 원래 종류)
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number { value: f64, text: String },
    Bool(bool),
    /// 수식과 마지막 계산 결과
    Formula { formula: String, text: String },
}

impl CellValue {
    pub fn text(&self) -> &str {
        match self {
            CellValue::Text(text)
            | CellValue::Number { text, .. }
            | CellValue::Formula { text, .. } => text,
            CellValue::Bool(true) => "true",
            CellValue::Bool(false) => "false",
        }
    }

    /// 읽은 값 변환 (빈 칸과 오류 값은 None)
    fn from_data(data: &Data) -> Option<Self> {
        let number = |value: f64| CellValue::Number {
            value,
            text: number_text(value),
        };
        match data {
            Data::Empty | Data::Error(_) => None,
            Data::String(s) if s.is_empty() => None,
            Data::String(s) => Some(CellValue::Text(s.clone())),
            Data::Float(f) => Some(number(*f)),
            Data::Int(i) => Some(number(*i as f64)),
            Data::Bool(b) => Some(CellValue::Bool(*b)),
            Data::DateTime(dt) => Some(number(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        }
    }
}

/// 워크시트 하나 (빈 칸은 저장하지 않음)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<CellRef, CellValue>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn get(&self, cell: CellRef) -> Option<&str> {
        self.cells.get(&cell).map(CellValue::text)
    }

    pub fn value(&self, cell: CellRef) -> Option<&CellValue> {
        self.cells.get(&cell)
    }

    /// 문자열 값 쓰기 (빈 문자열은 칸 비우기)
    pub fn set(&mut self, cell: CellRef, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, CellValue::Text(value));
        }
    }

    /// A1 부터 마지막 값까지의 행 (빈 칸은 빈 문자열)
    pub fn rows(&self) -> Vec<Vec<String>> {
        let Some(max_row) = self.cells.keys().map(|c| c.row).max() else {
            return Vec::new();
        };
        let mut rows = vec![Vec::new(); max_row as usize + 1];
        for (cell, value) in &self.cells {
            let row = &mut rows[cell.row as usize];
            let col = cell.col as usize;
            if row.len() <= col {
                row.resize(col + 1, String::new());
            }
            row[col] = value.text().to_string();
        }
        rows
    }

    /// 범위 안의 값 삭제
    pub fn clear_range(&mut self, range: &CellRange) {
        self.cells.retain(|cell, _| !range.contains(*cell));
    }

    /// `start` 부터 행 단위로 값 쓰기
    pub fn write_rows(&mut self, start: CellRef, rows: &[Vec<String>]) {
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let cell = CellRef {
                    row: start.row + r as u32,
                    col: start.col + c as u16,
                };
                self.set(cell, value.clone());
            }
        }
    }

    fn iter(&self) -> impl Iterator<Item = (&CellRef, &CellValue)> {
        self.cells.iter()
    }
}

/// `SheetN` 형식이면 N
fn sheet_number(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("Sheet")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// 정수면 소수점 없이 (`15000`, 계좌번호 숫자 칸)
fn number_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// 메모리에 올린 엑셀 파일
#[derive(Debug, Clone)]
pub struct ExcelStore {
    path: PathBuf,
    sheets: Vec<Sheet>,
}

impl ExcelStore {
    /// 빈 통합 문서
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheets: Vec::new(),
        }
    }

    /// 파일 읽기 (없으면 빈 통합 문서)
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("📄 엑셀 파일이 없어 새로 만듭니다: {}", path.display());
            return Ok(Self::empty(path));
        }

        let read_failed = |message: String| ExcelError::ReadFailed {
            path: path.display().to_string(),
            message,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| read_failed(e.to_string()))?;
        let mut sheets = Vec::new();

        for name in workbook.sheet_names().to_owned() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| read_failed(format!("{}: {}", name, e)))?;
            let formulas = workbook
                .worksheet_formula(&name)
                .map_err(|e| read_failed(format!("{} 수식: {}", name, e)))?;
            let mut sheet = Sheet::new(&name);

            if let Some((row0, col0)) = range.start() {
                for (r, c, data) in range.cells() {
                    if let Some(value) = CellValue::from_data(data) {
                        let cell = CellRef {
                            row: row0 + r as u32,
                            col: (col0 as usize + c) as u16,
                        };
                        sheet.cells.insert(cell, value);
                    }
                }
            }

            if let Some((row0, col0)) = formulas.start() {
                for (r, c, formula) in formulas.cells() {
                    if formula.is_empty() {
                        continue;
                    }
                    let cell = CellRef {
                        row: row0 + r as u32,
                        col: (col0 as usize + c) as u16,
                    };
                    let text = sheet.get(cell).unwrap_or_default().to_string();
                    sheet.cells.insert(
                        cell,
                        CellValue::Formula {
                            formula: formula.clone(),
                            text,
                        },
                    );
                }
            }
            sheets.push(sheet);
        }

        debug!("엑셀 로드: {} ({} 시트)", path.display(), sheets.len());
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// 시트 가져오기 (없으면 맨 뒤에 생성)
    pub fn sheet_mut_or_create(&mut self, name: &str) -> &mut Sheet {
        let index = match self.position(name) {
            Some(i) => i,
            None => {
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[index]
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    /// 숫자(`3` → `Sheet3`) 또는 시트명으로 시트 찾기
    pub fn resolve_sheet(&self, input: &str) -> Option<String> {
        let input = input.trim();
        let candidate = if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
            format!("Sheet{}", input)
        } else {
            input.to_string()
        };
        self.position(&candidate).map(|_| candidate)
    }

    /// 시트를 맨 앞으로
    ///
    /// 대상이 `Sheet1` 이 아니면 `Sheet1` 을 먼저 맨 뒤로 보낸다.
    pub fn bring_to_front(&mut self, name: &str) -> AppResult<()> {
        if self.position(name).is_none() {
            return Err(ExcelError::SheetNotFound(name.to_string()).into());
        }

        if name != "Sheet1" {
            if let Some(i) = self.position("Sheet1") {
                let sheet1 = self.sheets.remove(i);
                self.sheets.push(sheet1);
            }
        }

        if let Some(i) = self.position(name) {
            let target = self.sheets.remove(i);
            self.sheets.insert(0, target);
        }
        Ok(())
    }

    /// `Sheet1..SheetN` 을 번호순으로, 나머지는 기존 순서대로 뒤에
    pub fn clean_order(&mut self) {
        let (mut numbered, others): (Vec<Sheet>, Vec<Sheet>) = std::mem::take(&mut self.sheets)
            .into_iter()
            .partition(|s| sheet_number(&s.name).is_some());
        numbered.sort_by_key(|s| sheet_number(&s.name));
        self.sheets = numbered;
        self.sheets.extend(others);
    }

    /// 다른 프로그램(엑셀)이 파일을 열고 있는지
    pub fn is_locked(&self) -> bool {
        if let (Some(dir), Some(name)) = (self.path.parent(), self.path.file_name()) {
            let owner_file = dir.join(format!("~${}", name.to_string_lossy()));
            if owner_file.exists() {
                return true;
            }
        }
        if !self.path.exists() {
            return false;
        }
        match std::fs::OpenOptions::new().append(true).open(&self.path) {
            Ok(_) => false,
            Err(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
        }
    }

    /// 저장 (잠겨 있으면 1초 간격으로 최대 60초 대기)
    pub async fn save(&self) -> AppResult<()> {
        self.save_with_clock(&SystemClock::new(), LOCK_POLL_INTERVAL, LOCK_POLL_DEADLINE)
            .await
    }

    pub async fn save_with_clock<C: Clock>(
        &self,
        clock: &C,
        interval: Duration,
        deadline: Duration,
    ) -> AppResult<()> {
        let mut warned = false;
        let outcome = poll_until(clock, interval, deadline, || {
            if self.is_locked() {
                if !warned {
                    warn!("⚠️ 엑셀 파일이 열려 있습니다. 닫힐 때까지 기다립니다: {}", self.path.display());
                    warned = true;
                }
                None
            } else {
                Some(())
            }
        })
        .await;

        if let PollOutcome::TimedOut { attempts } = outcome {
            debug!("잠금 확인 {}회 후 포기", attempts);
            return Err(ExcelError::Locked {
                path: self.path.display().to_string(),
                waited_secs: deadline.as_secs(),
            }
            .into());
        }

        self.write_file()
    }

    fn write_file(&self) -> AppResult<()> {
        let write_failed = |e: rust_xlsxwriter::XlsxError| ExcelError::WriteFailed {
            path: self.path.display().to_string(),
            message: e.to_string(),
        };

        let mut workbook = Workbook::new();
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name).map_err(write_failed)?;
            for (cell, value) in sheet.iter() {
                match value {
                    CellValue::Text(text) => {
                        worksheet.write_string(cell.row, cell.col, text).map_err(write_failed)?;
                    }
                    CellValue::Number { value, .. } => {
                        worksheet.write_number(cell.row, cell.col, *value).map_err(write_failed)?;
                    }
                    CellValue::Bool(value) => {
                        worksheet.write_boolean(cell.row, cell.col, *value).map_err(write_failed)?;
                    }
                    CellValue::Formula { formula, text } => {
                        worksheet
                            .write_formula(cell.row, cell.col, formula.as_str())
                            .map_err(write_failed)?;
                        worksheet.set_formula_result(cell.row, cell.col, text);
                    }
                }
            }
        }
        if self.sheets.is_empty() {
            workbook.add_worksheet();
        }

        workbook.save(&self.path).map_err(write_failed)?;
        debug!("엑셀 저장: {}", self.path.display());
        Ok(())
    }
}
