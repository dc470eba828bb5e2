pub mod cli;
pub mod errors;
pub mod loader;

use asphalte_engine::Session;
use errors::FrontendError;
use tracing::info;

pub use cli::{Cli, Command};

/// 执行一条命令行子命令，返回要输出到标准输出的文本。
pub fn run_cli(command: &Command, session: &Session) -> Result<String, FrontendError> {
    info!(?command, "执行 CLI 命令");
    cli::execute(command, session)
}
