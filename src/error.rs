//! 错误定义
//!
//! `ProbeError` 只影响单个字段(渲染为占位符), `Error` 是启动阶段或发布阶段的致命错误。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 单个探针的失败, 永远不会中止整行
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {what}: `{value}`")]
    Parse { what: &'static str, value: String },

    #[error("probe requires an argument")]
    MissingArgument,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no previous sample yet")]
    NotReady,

    #[error("zero denominator")]
    ZeroDenominator,

    #[error("command failed: {0}")]
    Command(String),

    #[error("format error: {0}")]
    Format(String),

    #[error(transparent)]
    Proc(#[from] procfs::ProcError),

    #[error(transparent)]
    Os(#[from] io::Error),
}

impl ProbeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn parse(what: &'static str, value: impl Into<String>) -> Self {
        Self::Parse { what, value: value.into() }
    }
}

/// 启动或运行期的致命错误, 进程以 1 退出
#[derive(Debug, Error)]
pub enum Error {
    #[error("--stdout and --display are mutually exclusive")]
    ConflictingOutputs,

    #[error("cannot load config `{}`: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("invalid setting: {0}")]
    Setting(String),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown probe `{0}`")]
    UnknownProbe(String),

    #[error("invalid template `{template}`: {reason}")]
    Template { template: String, reason: String },

    #[error("cannot open display: {0}")]
    Display(String),

    #[error("failed to publish status: {0}")]
    Publish(#[source] io::Error),

    #[error("cannot install signal handler: {0}")]
    Signal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
