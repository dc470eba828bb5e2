use std::path::PathBuf;

use asphalte_engine::Session;
use asphalte_engine::command::{CommandBus, CommandContext, CommandRequest};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::errors::FrontendError;
use crate::loader::{read_points, read_polyline};

/// Open Asphalte 坐标工具：投影查询、正反算、投影探测与里程计算。
#[derive(Debug, Parser)]
#[command(name = "asphalte", version, about)]
pub struct Cli {
    /// 配置文件路径，缺省时读取 ASPHALTE_CONFIG 或 ./config/default.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 按代码或 EPSG 编号查找投影
    Find { key: String },
    /// 在名称、代码、国家、地区中搜索；不带参数列出全部
    Search { text: Vec<String> },
    /// 平面坐标 → WGS84 经纬度
    #[command(allow_negative_numbers = true)]
    ToGeodetic {
        code: String,
        x: f64,
        y: f64,
        z: Option<f64>,
    },
    /// WGS84 经纬度 → 平面坐标
    #[command(allow_negative_numbers = true)]
    ToProjected {
        code: String,
        longitude: f64,
        latitude: f64,
        z: Option<f64>,
    },
    /// 根据一组平面坐标猜测投影
    #[command(allow_negative_numbers = true)]
    Detect {
        /// 成对的 x y 坐标
        coordinates: Vec<f64>,
        /// 从文件读取坐标点
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// 计算参考曲线上的里程桩
    #[command(allow_negative_numbers = true)]
    Stations {
        start: f64,
        end: f64,
        /// 等距间隔，缺省取配置值
        #[arg(long)]
        interdistance: Option<f64>,
        /// 是否加入顶点与圆弧中点里程，缺省取配置值
        #[arg(long, value_name = "BOOL")]
        vertices: Option<bool>,
        /// 直线参考的长度
        #[arg(long, conflicts_with = "polyline", required_unless_present = "polyline")]
        length: Option<f64>,
        /// 多段线顶点文件（x y [bulge]）
        #[arg(long, value_name = "PATH")]
        polyline: Option<PathBuf>,
    },
    /// WGS84 经纬度所在的 UTM 带
    #[command(allow_negative_numbers = true)]
    UtmZone { longitude: f64, latitude: f64 },
}

fn number(value: f64) -> String {
    value.to_string()
}

fn optional(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl Command {
    /// 转换为命令总线请求；文件参数在此读取。
    pub fn to_request(&self) -> Result<CommandRequest, FrontendError> {
        let request = match self {
            Command::Find { key } => CommandRequest::new("find", [key.clone()]),
            Command::Search { text } => CommandRequest::new("search", text.iter().cloned()),
            Command::ToGeodetic { code, x, y, z } => {
                let mut args = vec![code.clone(), number(*x), number(*y)];
                args.extend(z.map(number));
                CommandRequest::new("to_geodetic", args)
            }
            Command::ToProjected {
                code,
                longitude,
                latitude,
                z,
            } => {
                let mut args = vec![code.clone(), number(*longitude), number(*latitude)];
                args.extend(z.map(number));
                CommandRequest::new("to_projected", args)
            }
            Command::Detect { coordinates, file } => {
                let mut args: Vec<String> = coordinates.iter().copied().map(number).collect();
                if let Some(path) = file {
                    for point in read_points(path)? {
                        args.push(number(point.x));
                        args.push(number(point.y));
                    }
                }
                CommandRequest::new("detect", args)
            }
            Command::Stations {
                start,
                end,
                interdistance,
                vertices,
                length,
                polyline,
            } => {
                let mut args = vec![
                    number(*start),
                    number(*end),
                    optional(*interdistance),
                    optional(*vertices),
                ];
                match (length, polyline) {
                    (Some(length), _) => args.push(number(*length)),
                    (None, Some(path)) => {
                        for vertex in read_polyline(path)?.vertices {
                            args.push(number(vertex.position.x()));
                            args.push(number(vertex.position.y()));
                            args.push(number(vertex.bulge));
                        }
                    }
                    (None, None) => {
                        return Err(FrontendError::Command(
                            "需要 --length 或 --polyline".to_string(),
                        ));
                    }
                }
                CommandRequest::new("stations", args)
            }
            Command::UtmZone {
                longitude,
                latitude,
            } => CommandRequest::new("utm_zone", [number(*longitude), number(*latitude)]),
        };
        Ok(request)
    }
}

/// 在会话上执行一条子命令，返回要打印的文本。
pub fn execute(command: &Command, session: &Session) -> Result<String, FrontendError> {
    let request = command.to_request()?;
    let bus = CommandBus::new();
    let mut context = CommandContext { session };
    dispatch_cli_command(&bus, &request, &mut context)
}

fn dispatch_cli_command(
    bus: &CommandBus,
    request: &CommandRequest,
    context: &mut CommandContext<'_>,
) -> Result<String, FrontendError> {
    let response = bus.dispatch(request, context);
    if response.success {
        info!(command = %request.name, "命令执行成功");
        Ok(response.message.unwrap_or_default())
    } else {
        Err(FrontendError::Command(
            response.message.unwrap_or_else(|| "未知错误".to_string()),
        ))
    }
}
