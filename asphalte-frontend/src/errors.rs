use std::path::PathBuf;

use asphalte_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("{0}")]
    Command(String),
}

/// 坐标文件读取错误，行号从 1 开始。
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("读取坐标文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("第 {line} 行: {message}")]
    Parse { line: usize, message: String },
    #[error("坐标文件中没有任何点")]
    Empty,
}
