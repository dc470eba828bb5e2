use std::collections::HashMap;

use asphalte_core::geometry::Point2;
use asphalte_core::polyline::{Polyline, PolylineVertex};
use asphalte_core::stations::{CurveMeasure, StraightCurve};
use asphalte_geo::projection::utm_zone_for;
use asphalte_geo::{GeodeticPoint, ProjectedPoint, ProjectionDefinition};
use tracing::debug;

use crate::errors::EngineError;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

impl From<Result<String, EngineError>> for CommandResponse {
    fn from(result: Result<String, EngineError>) -> Self {
        match result {
            Ok(message) => Self::ok(message),
            Err(err) => Self::err(err.to_string()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub session: &'a Session,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(FindCommand);
        bus.register(SearchCommand);
        bus.register(ToGeodeticCommand);
        bus.register(ToProjectedCommand);
        bus.register(DetectCommand);
        bus.register(StationsCommand);
        bus.register(UtmZoneCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            debug!(command = %request.name, args = request.args.len(), "执行命令");
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number(value: &str, name: &str) -> Result<f64, EngineError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| EngineError::InvalidArgument(format!("{name} 不是有效数值: {value}")))
}

fn parse_flag(value: &str, name: &str) -> Result<bool, EngineError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(EngineError::InvalidArgument(format!(
            "{name} 不是有效布尔值: {value}"
        ))),
    }
}

/// `-` 表示取默认值。
fn optional<T>(
    value: &str,
    parse: impl FnOnce(&str) -> Result<T, EngineError>,
) -> Result<Option<T>, EngineError> {
    if value.trim() == "-" {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

fn expect_args(request: &CommandRequest, min: usize, usage: &str) -> Result<(), EngineError> {
    if request.args.len() < min {
        Err(EngineError::InvalidArgument(format!("用法: {usage}")))
    } else {
        Ok(())
    }
}

fn describe(definition: &ProjectionDefinition) -> String {
    let epsg = definition
        .epsg()
        .map(|code| format!("EPSG:{code}"))
        .unwrap_or_else(|| "EPSG:-".to_string());
    let bounds = definition.bounds();
    let mut line = format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t[{}, {}, {}, {}]",
        definition.code(),
        epsg,
        definition.display_name(),
        definition.country(),
        definition.unit(),
        definition.method().family_name(),
        bounds.min_x(),
        bounds.max_x(),
        bounds.min_y(),
        bounds.max_y(),
    );
    if !definition.region().is_empty() {
        line.push('\t');
        line.push_str(definition.region());
    }
    line
}

struct FindCommand;

impl CommandHandler for FindCommand {
    fn name(&self) -> &'static str {
        "find"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let run = || -> Result<String, EngineError> {
            expect_args(request, 1, "find <代码|EPSG>")?;
            let key = request.args[0].as_str();
            let geodesy = context.session.geodesy()?;
            geodesy
                .find(key)
                .map(describe)
                .ok_or_else(|| EngineError::UnknownProjection(key.trim().to_string()))
        };
        run().into()
    }
}

struct SearchCommand;

impl CommandHandler for SearchCommand {
    fn name(&self) -> &'static str {
        "search"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let text = request.args.join(" ");
        let found = context.session.catalog().search(&text);
        if found.is_empty() {
            return CommandResponse::ok(format!("没有匹配 \"{text}\" 的投影"));
        }
        let lines: Vec<String> = found.into_iter().map(describe).collect();
        CommandResponse::ok(lines.join("\n"))
    }
}

struct ToGeodeticCommand;

impl CommandHandler for ToGeodeticCommand {
    fn name(&self) -> &'static str {
        "to_geodetic"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let run = || -> Result<String, EngineError> {
            expect_args(request, 3, "to_geodetic <代码> <x> <y> [z]")?;
            let mut point = ProjectedPoint::new(
                parse_number(&request.args[1], "x")?,
                parse_number(&request.args[2], "y")?,
            );
            if let Some(z) = request.args.get(3) {
                point = point.with_altitude(parse_number(z, "z")?);
            }
            let result = context
                .session
                .geodesy()?
                .to_geodetic(&request.args[0], point)?;
            let value = result.value;
            Ok(match value.altitude {
                Some(z) => format!(
                    "{:.9} {:.9} {:.3} {}",
                    value.longitude,
                    value.latitude,
                    z,
                    result.accuracy.as_str()
                ),
                None => format!(
                    "{:.9} {:.9} {}",
                    value.longitude,
                    value.latitude,
                    result.accuracy.as_str()
                ),
            })
        };
        run().into()
    }
}

struct ToProjectedCommand;

impl CommandHandler for ToProjectedCommand {
    fn name(&self) -> &'static str {
        "to_projected"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let run = || -> Result<String, EngineError> {
            expect_args(request, 3, "to_projected <代码> <经度> <纬度> [z]")?;
            let mut point = GeodeticPoint::new(
                parse_number(&request.args[1], "longitude")?,
                parse_number(&request.args[2], "latitude")?,
            );
            if let Some(z) = request.args.get(3) {
                point = point.with_altitude(parse_number(z, "z")?);
            }
            let result = context
                .session
                .geodesy()?
                .to_projected(&request.args[0], point)?;
            let value = result.value;
            Ok(match value.altitude {
                Some(z) => format!(
                    "{:.3} {:.3} {:.3} {}",
                    value.x,
                    value.y,
                    z,
                    result.accuracy.as_str()
                ),
                None => format!("{:.3} {:.3} {}", value.x, value.y, result.accuracy.as_str()),
            })
        };
        run().into()
    }
}

struct DetectCommand;

impl CommandHandler for DetectCommand {
    fn name(&self) -> &'static str {
        "detect"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let run = || -> Result<String, EngineError> {
            expect_args(request, 2, "detect <x> <y> [<x> <y> ...]")?;
            if request.args.len() % 2 != 0 {
                return Err(EngineError::InvalidArgument(
                    "坐标必须成对出现".to_string(),
                ));
            }
            let points = request
                .args
                .chunks(2)
                .map(|pair| {
                    Ok(ProjectedPoint::new(
                        parse_number(&pair[0], "x")?,
                        parse_number(&pair[1], "y")?,
                    ))
                })
                .collect::<Result<Vec<_>, EngineError>>()?;

            let geodesy = context.session.geodesy()?;
            let detection = geodesy.detect(&points);
            let Some(best) = detection.as_ref().and_then(|found| found.best()) else {
                return Err(EngineError::InvalidArgument(
                    "未能识别坐标所属的投影".to_string(),
                ));
            };
            let mut message = describe(best);
            if let Some(found) = detection.as_ref().filter(|found| found.is_ambiguous()) {
                let others: Vec<&str> = found.matches[1..].iter().map(|d| d.code()).collect();
                message.push_str(&format!("\n同样覆盖质心: {}", others.join(", ")));
            }
            Ok(message)
        };
        run().into()
    }
}

struct StationsCommand;

impl StationsCommand {
    const USAGE: &'static str =
        "stations <起点> <终点> <间距|-> <含顶点|-> (<长度> | <x> <y> <bulge> ...)";

    fn curve(args: &[String]) -> Result<Box<dyn CurveMeasure>, EngineError> {
        match args.len() {
            1 => Ok(Box::new(StraightCurve {
                length: parse_number(&args[0], "length")?,
            })),
            n if n >= 6 && n % 3 == 0 => {
                let vertices = args
                    .chunks(3)
                    .map(|chunk| {
                        Ok(PolylineVertex::with_bulge(
                            Point2::new(
                                parse_number(&chunk[0], "x")?,
                                parse_number(&chunk[1], "y")?,
                            ),
                            parse_number(&chunk[2], "bulge")?,
                        ))
                    })
                    .collect::<Result<Vec<_>, EngineError>>()?;
                Ok(Box::new(Polyline::new(vertices, false)))
            }
            _ => Err(EngineError::InvalidArgument(format!(
                "用法: {}",
                Self::USAGE
            ))),
        }
    }
}

impl CommandHandler for StationsCommand {
    fn name(&self) -> &'static str {
        "stations"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let run = || -> Result<String, EngineError> {
            expect_args(request, 5, Self::USAGE)?;
            let args = &request.args;
            let start = parse_number(&args[0], "start")?;
            let end = parse_number(&args[1], "end")?;
            let interdistance = optional(&args[2], |v| parse_number(v, "interdistance"))?;
            let include = optional(&args[3], |v| parse_flag(v, "include"))?;
            let curve = Self::curve(&args[4..])?;

            let service = context.session.station_service()?;
            let stations = service.build(
                curve.as_ref(),
                &service.request(start, end, interdistance, include),
            );
            let values: Vec<String> = stations.iter().map(|value| format!("{value:.6}")).collect();
            Ok(values.join(" "))
        };
        run().into()
    }
}

struct UtmZoneCommand;

impl CommandHandler for UtmZoneCommand {
    fn name(&self) -> &'static str {
        "utm_zone"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let run = || -> Result<String, EngineError> {
            expect_args(request, 2, "utm_zone <经度> <纬度>")?;
            let lon = parse_number(&request.args[0], "longitude")?;
            let lat = parse_number(&request.args[1], "latitude")?;
            let code = utm_zone_for(lon, lat);
            Ok(match context.session.catalog().find_by_code(&code) {
                Some(definition) => describe(definition),
                None => format!("{code}\t(目录中未定义)"),
            })
        };
        run().into()
    }
}

#[cfg(test)]
mod tests {
    use asphalte_config::AppConfig;

    use super::*;

    fn run(session: &Session, name: &str, args: &[&str]) -> CommandResponse {
        let bus = CommandBus::new();
        let mut context = CommandContext { session };
        bus.dispatch(&CommandRequest::new(name, args.iter().copied()), &mut context)
    }

    fn numbers(response: &CommandResponse) -> Vec<f64> {
        response
            .message
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .filter_map(|token| token.parse().ok())
            .collect()
    }

    #[test]
    fn every_command_is_registered() {
        let bus = CommandBus::new();
        let mut names: Vec<&str> = bus.available_commands().copied().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "detect",
                "find",
                "search",
                "stations",
                "to_geodetic",
                "to_projected",
                "utm_zone"
            ]
        );
    }

    #[test]
    fn unknown_command_fails() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let response = run(&session, "zoom", &[]);
        assert!(!response.success);
    }

    #[test]
    fn find_by_code_and_epsg() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let by_code = run(&session, "find", &["lambert93"]);
        assert!(by_code.success);
        assert!(by_code.message.as_deref().unwrap().starts_with("LAMBERT93\tEPSG:2154"));

        let by_epsg = run(&session, "find", &["31370"]);
        assert!(by_epsg.message.as_deref().unwrap().starts_with("BELGE72"));

        let missing = run(&session, "find", &["ATLANTIS"]);
        assert!(!missing.success);
    }

    #[test]
    fn search_lists_one_line_per_match() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let response = run(&session, "search", &["belg"]);
        assert!(response.success);
        assert_eq!(response.message.as_deref().unwrap().lines().count(), 2);
    }

    #[test]
    fn to_geodetic_prints_degrees_and_accuracy() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let response = run(&session, "to_geodetic", &["LAMBERT93", "700000", "6600000", "35.5"]);
        assert!(response.success, "{:?}", response.message);
        let message = response.message.as_deref().unwrap();
        assert!(message.ends_with("exact"));
        let values = numbers(&response);
        assert!((values[0] - 3.0).abs() < 1e-8);
        assert!((values[1] - 46.5).abs() < 1e-8);
        assert!((values[2] - 35.5).abs() < 1e-9);
    }

    #[test]
    fn to_projected_round_trips_through_the_bus() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let response = run(&session, "to_projected", &["LAMBERT93", "3", "46.5"]);
        let values = numbers(&response);
        assert!((values[0] - 700_000.0).abs() < 1e-3);
        assert!((values[1] - 6_600_000.0).abs() < 1e-3);
    }

    #[test]
    fn conversion_rejects_bad_input() {
        let session = Session::open(&AppConfig::default()).unwrap();
        assert!(!run(&session, "to_geodetic", &["LAMBERT93", "abc", "1"]).success);
        assert!(!run(&session, "to_geodetic", &["NOWHERE", "1", "1"]).success);
        assert!(!run(&session, "to_projected", &["WGS84", "1"]).success);
    }

    #[test]
    fn detect_reports_best_and_overlaps() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let response = run(
            &session,
            "detect",
            &["0", "0", "700000", "6600000", "700100", "6600050"],
        );
        assert!(response.success);
        assert!(response.message.as_deref().unwrap().starts_with("LAMBERT93"));

        let ambiguous = run(&session, "detect", &["150000", "170000"]);
        let message = ambiguous.message.as_deref().unwrap();
        assert!(message.starts_with("BELGE72"));
        assert!(message.contains("BNG"));

        assert!(!run(&session, "detect", &["0", "0"]).success);
        assert!(!run(&session, "detect", &["1", "2", "3"]).success);
    }

    #[test]
    fn stations_on_length_and_polyline() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let straight = run(&session, "stations", &["0", "100", "25", "false", "100"]);
        assert!(straight.success);
        assert_eq!(
            straight.message.as_deref().unwrap(),
            "0.000000 25.000000 50.000000 75.000000 100.000000"
        );

        let reversed = run(&session, "stations", &["100", "0", "50", "-", "100"]);
        assert_eq!(reversed.message.as_deref().unwrap(), "100.000000 50.000000 0.000000");

        let polyline = run(
            &session,
            "stations",
            &["0", "20", "-", "true", "0", "0", "0", "10", "0", "0", "10", "10", "0"],
        );
        assert_eq!(
            polyline.message.as_deref().unwrap(),
            "0.000000 10.000000 20.000000"
        );

        assert!(!run(&session, "stations", &["0", "10", "-", "-", "1", "2"]).success);
    }

    #[test]
    fn close_stations_stay_distinct_in_output() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let response = run(
            &session,
            "stations",
            &[
                "0", "20", "0", "true", "0", "0", "0", "10", "0", "0", "10.0002", "0", "0", "20",
                "0", "0",
            ],
        );
        assert_eq!(
            response.message.as_deref().unwrap(),
            "0.000000 10.000000 10.000200 20.000000"
        );
    }

    #[test]
    fn tiny_interdistance_finishes() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let response = run(&session, "stations", &["0", "1000", "1e-9", "false", "1000"]);
        assert!(response.success);
        let message = response.message.as_deref().unwrap();
        assert!(message.starts_with("0.000000 0.010000 "));
        assert!(message.ends_with(" 1000.000000"));
    }

    #[test]
    fn utm_zone_resolves_a_catalog_entry() {
        let session = Session::open(&AppConfig::default()).unwrap();
        let response = run(&session, "utm_zone", &["2.35", "48.85"]);
        assert!(response.message.as_deref().unwrap().starts_with("UTM31N\tEPSG:32631"));

        let pacific = run(&session, "utm_zone", &["-150", "-20"]);
        assert!(pacific.success);
        assert!(pacific.message.as_deref().unwrap().starts_with("UTM6S"));
    }
}
