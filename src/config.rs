use std::path::PathBuf;

use clap::{Parser, ValueEnum};

pub const DEFAULT_API: &str = "http://localhost:8081/api/todos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "todo-studio")]
#[command(about = "Terminal client for a REST todo service", long_about = None)]
#[command(version)]
pub struct Config {
    /// Base endpoint of the todo API
    #[arg(long, env = "TODO_API", default_value = DEFAULT_API)]
    pub api: String,

    /// Where to write the log (the terminal belongs to the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Config {
    pub fn api_base(&self) -> String {
        normalize_base_url(&self.api)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(default_log_path)
    }
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("todo-studio")
        .join("todo-studio.log")
}

pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}
