//! Terminal output
//!
//! 상태 메시지는 모두 stderr로 출력합니다. stdout은 dry-run 메시지 전용.

use crossterm::{
    execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};
use std::io::{self, Write};

fn emit(color: Color, prefix: &str, message: &str) {
    let mut stderr = io::stderr();
    // a failed write to stderr has nowhere to be reported
    let _ = execute!(
        stderr,
        SetForegroundColor(color),
        Print(prefix),
        ResetColor,
        Print(message),
        Print("\n")
    );
}

pub fn info(message: &str) {
    emit(Color::Cyan, "• ", message);
}

pub fn success(message: &str) {
    emit(Color::Green, "✓ ", message);
}

pub fn warn(message: &str) {
    emit(Color::Yellow, "! ", message);
}

pub fn error(message: &str) {
    emit(Color::Red, "✗ ", message);
}

/// Question shown before reading a line of input
pub fn question(text: &str) {
    let mut stderr = io::stderr();
    let _ = execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("? "),
        ResetColor,
        SetAttribute(Attribute::Bold),
        Print(text),
        SetAttribute(Attribute::Reset),
        Print(" ")
    );
    let _ = stderr.flush();
}

/// Commit message preview, indented under a dim rule
pub fn preview(message: &str) {
    let mut stderr = io::stderr();
    let rule = "─".repeat(50);
    let _ = execute!(
        stderr,
        SetForegroundColor(Color::DarkGrey),
        Print(format!("{}\n", rule)),
        ResetColor
    );
    for line in message.lines() {
        let _ = execute!(stderr, Print(format!("  {}\n", line)));
    }
    let _ = execute!(
        stderr,
        SetForegroundColor(Color::DarkGrey),
        Print(format!("{}\n", rule)),
        ResetColor
    );
}
