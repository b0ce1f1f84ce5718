//! 콘솔 입력
//!
//! 되돌릴 수 없는 작업(이체 제출, 시트 순서 변경, 상태 변경)은 모두 여기서 확인을 받는다.

use crate::error::{AppError, AppResult};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// 사용자 입력 능력
pub trait Prompt: Send + Sync {
    /// 메시지를 보여주고 한 줄 입력 (앞뒤 공백 제거, 입력 끝이면 오류)
    fn ask(&self, message: &str) -> AppResult<String>;

    /// y/n 확인 (`y` 만 승인)
    fn confirm(&self, message: &str) -> AppResult<bool> {
        let answer = self.ask(&format!("{} (y/n): ", message))?;
        Ok(answer.eq_ignore_ascii_case("y"))
    }
}

fn end_of_input() -> AppError {
    AppError::io(
        "stdin",
        io::Error::new(io::ErrorKind::UnexpectedEof, "입력이 끝났습니다"),
    )
}

/// 표준 입출력 프롬프트
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn ask(&self, message: &str) -> AppResult<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", message).map_err(|e| AppError::io("stdout", e))?;
        stdout.flush().map_err(|e| AppError::io("stdout", e))?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| AppError::io("stdin", e))?;
        if read == 0 {
            return Err(end_of_input());
        }
        Ok(line.trim().to_string())
    }
}

/// 미리 정한 답을 차례로 돌려주는 프롬프트 (비대화형 실행, 테스트)
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// 지금까지 보여준 메시지
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// 남은 답 수
    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or(0)
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, message: &str) -> AppResult<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(message.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .map(|a| a.trim().to_string())
            .ok_or_else(end_of_input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_answers_in_order() {
        let prompt = ScriptedPrompt::new(["  list ", "Y", "n"]);
        assert_eq!(prompt.ask("> ").unwrap(), "list");
        assert!(prompt.confirm("제출할까요?").unwrap());
        assert!(!prompt.confirm("다시?").unwrap());
        assert_eq!(prompt.asked()[1], "제출할까요? (y/n): ");
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn test_exhausted_script_is_end_of_input() {
        let prompt = ScriptedPrompt::new(Vec::<String>::new());
        let err = prompt.ask("> ").unwrap_err();
        assert!(matches!(err, AppError::Io { ref path, .. } if path == "stdin"));
    }
}
