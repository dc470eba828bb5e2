use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 配置文件路径的环境变量名。
pub const CONFIG_ENV: &str = "ASPHALTE_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub stations: StationsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `ASPHALTE_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 投影探测参数。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "DetectorConfig::default_origin_threshold")]
    pub origin_threshold: f64,
    #[serde(default = "DetectorConfig::default_min_points")]
    pub min_points: usize,
}

impl DetectorConfig {
    fn default_origin_threshold() -> f64 {
        1000.0
    }

    fn default_min_points() -> usize {
        1
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            origin_threshold: Self::default_origin_threshold(),
            min_points: Self::default_min_points(),
        }
    }
}

/// 桩号生成的默认策略，命令行未指定时使用。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StationsConfig {
    #[serde(default)]
    pub default_interdistance: f64,
    #[serde(default)]
    pub include_vertex_distances: bool,
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            default_interdistance: 0.0,
            include_vertex_distances: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub entries: Vec<CatalogEntryConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitConfig {
    #[default]
    Meter,
    Degree,
}

/// 用户自定义投影，原样保存配置内容，由会话在打开时校验并转换。
///
/// `method` 可取 `geographic`、`lambert_conformal_conic_2sp`、
/// `lambert_conformal_conic_1sp`、`transverse_mercator`、`utm`、
/// `swiss_oblique_mercator`、`oblique_stereographic`；其余值按未支持的投影族处理。
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntryConfig {
    pub code: String,
    #[serde(default)]
    pub epsg: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub unit: UnitConfig,
    /// `[min_x, max_x, min_y, max_y]`
    pub bounds: [f64; 4],
    /// `[west, east, south, north]`（WGS84 度）
    #[serde(default)]
    pub area_of_use: Option<[f64; 4]>,
    pub method: String,
    /// 椭球名称，缺省为 GRS80
    #[serde(default)]
    pub ellipsoid: Option<String>,
    /// 到 WGS84 的三参数或七参数（位置矢量约定）
    #[serde(default)]
    pub towgs84: Option<Vec<f64>>,
    #[serde(default)]
    pub lat_0: Option<f64>,
    #[serde(default)]
    pub lon_0: Option<f64>,
    #[serde(default)]
    pub lat_1: Option<f64>,
    #[serde(default)]
    pub lat_2: Option<f64>,
    #[serde(default)]
    pub scale_factor: Option<f64>,
    #[serde(default)]
    pub false_easting: Option<f64>,
    #[serde(default)]
    pub false_northing: Option<f64>,
    #[serde(default)]
    pub zone: Option<u8>,
    #[serde(default)]
    pub south: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
