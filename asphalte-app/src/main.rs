use std::path::PathBuf;
use std::process::ExitCode;

use asphalte_config::{AppConfig, ConfigError};
use asphalte_engine::Session;
use asphalte_frontend::Cli;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_error) = load_configuration(cli.config.clone());
    init_logging(&config);
    if let Some(err) = config_error {
        match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                warn!(path = %path.display(), error = %err, "加载配置失败，使用内建默认值");
            }
            ConfigError::Context { .. } => {
                warn!(error = %err, "加载配置失败，使用内建默认值");
            }
        }
    }
    info!("启动 Open Asphalte 坐标工具");

    let session = match Session::open(&config) {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, "无法打开会话");
            eprintln!("错误: {err}");
            return ExitCode::FAILURE;
        }
    };

    let status = match asphalte_frontend::run_cli(&cli.command, &session) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "命令执行失败");
            eprintln!("错误: {err}");
            ExitCode::FAILURE
        }
    };
    session.close();
    status
}

/// 显式路径优先，否则自动发现；失败时回退到默认配置并把错误交给调用方记录。
fn load_configuration(override_path: Option<PathBuf>) -> (AppConfig, Option<ConfigError>) {
    let loaded = match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
