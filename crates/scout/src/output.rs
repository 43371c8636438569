//! Terminal status lines.
//!
//! Status lines go to stderr; stdout carries only results.
//! Diagnostics that only matter when debugging go through `tracing` instead.

use colored::*;

fn emit(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

fn prefixed(color: Color, tag: &str, message: &str) {
  let prefix = format!("[{}]{:<width$}", tag.color(color).bold(), "", width = 7 - tag.len() - 2);
  for line in message.lines() {
    emit(&format!("{prefix} {line}"));
  }
}

pub fn banner_line(length: usize, ch: char) -> String {
  ch.to_string().repeat(length)
}

/// Wrap a message between two border lines.
pub fn as_banner<F>(log_fn: F, message: &str, width: usize, border: char)
where
  F: Fn(&str),
{
  let line = banner_line(width, border);
  log_fn(&line);
  log_fn(message);
  log_fn(&line);
}

pub fn info(message: &str) {
  prefixed(Color::Blue, "info", message);
}

pub fn warn(message: &str) {
  prefixed(Color::Yellow, "warn", message);
}

pub fn error(message: &str) {
  prefixed(Color::Red, "error", message);
}

pub fn success(message: &str) {
  prefixed(Color::Green, "sccs", message);
}

pub fn announce(message: &str) {
  as_banner(|msg| emit(&msg.blue().bold().to_string()), message, 50, '-');
}

/// Highlighted popup-style block, used for search errors and the easter egg.
pub fn spotlight(message: &str) {
  as_banner(|msg| emit(&msg.yellow().bold().to_string()), message, 40, '*');
}
