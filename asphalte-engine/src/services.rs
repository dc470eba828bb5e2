//! 会话内的服务注册表与坐标服务。
//!
//! 模块之间按字符串 id 取得共享能力，类型在解析时检查，不依赖任何全局状态。

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use asphalte_config::StationsConfig;
use asphalte_core::stations::{
    CurveMeasure, MAX_EVEN_STATIONS, STATION_TOLERANCE, StationRequest, StationSet, build_stations,
};
use asphalte_geo::projection::{to_geodetic, to_projected};
use asphalte_geo::{
    Catalog, Conversion, Detection, Detector, DetectorSettings, GeodeticPoint, ProjectedPoint,
    ProjectionDefinition,
};
use tracing::warn;

use crate::errors::EngineError;

/// 坐标服务在注册表中的 id。
pub const GEODESY_SERVICE: &str = "geodesy";
/// 里程服务在注册表中的 id。
pub const STATIONS_SERVICE: &str = "stations";

/// 其他模块共享的坐标换算能力。
pub trait CoordinateService: Send + Sync {
    fn find(&self, code: &str) -> Option<&ProjectionDefinition>;

    fn to_geodetic(
        &self,
        code: &str,
        point: ProjectedPoint,
    ) -> Result<Conversion<GeodeticPoint>, EngineError>;

    fn to_projected(
        &self,
        code: &str,
        point: GeodeticPoint,
    ) -> Result<Conversion<ProjectedPoint>, EngineError>;

    fn detect(&self, points: &[ProjectedPoint]) -> Option<Detection<'_>>;
}

/// 基于目录与探测参数的坐标服务实现。
#[derive(Debug, Clone)]
pub struct GeodesyService {
    catalog: Arc<Catalog>,
    settings: DetectorSettings,
}

impl GeodesyService {
    pub fn new(catalog: Arc<Catalog>, settings: DetectorSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn detector(&self) -> Detector<'_> {
        Detector::new(&self.catalog, self.settings)
    }

    fn require(&self, code: &str) -> Result<&ProjectionDefinition, EngineError> {
        self.catalog
            .find_by_code(code)
            .ok_or_else(|| EngineError::UnknownProjection(code.trim().to_string()))
    }
}

impl CoordinateService for GeodesyService {
    fn find(&self, code: &str) -> Option<&ProjectionDefinition> {
        match code.trim().parse::<u32>() {
            Ok(epsg) => self.catalog.find_by_epsg(epsg),
            Err(_) => self.catalog.find_by_code(code),
        }
    }

    fn to_geodetic(
        &self,
        code: &str,
        point: ProjectedPoint,
    ) -> Result<Conversion<GeodeticPoint>, EngineError> {
        Ok(to_geodetic(point, self.require(code)?))
    }

    fn to_projected(
        &self,
        code: &str,
        point: GeodeticPoint,
    ) -> Result<Conversion<ProjectedPoint>, EngineError> {
        Ok(to_projected(point, self.require(code)?))
    }

    fn detect(&self, points: &[ProjectedPoint]) -> Option<Detection<'_>> {
        self.detector().detect_all(points)
    }
}

/// 里程计算服务，未显式给出的参数取配置中的默认值。
#[derive(Debug, Clone, Copy)]
pub struct StationService {
    defaults: StationsConfig,
}

impl StationService {
    pub fn new(defaults: StationsConfig) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &StationsConfig {
        &self.defaults
    }

    pub fn request(
        &self,
        start: f64,
        end: f64,
        interdistance: Option<f64>,
        include_vertex_distances: Option<bool>,
    ) -> StationRequest {
        StationRequest {
            start,
            end,
            interdistance: interdistance.unwrap_or(self.defaults.default_interdistance),
            include_vertex_distances: include_vertex_distances
                .unwrap_or(self.defaults.include_vertex_distances),
        }
    }

    pub fn build<C>(&self, curve: &C, request: &StationRequest) -> StationSet
    where
        C: CurveMeasure + ?Sized,
    {
        let span = (request.end - request.start).abs();
        let interdistance = request.interdistance;
        if interdistance > 0.0
            && (interdistance < STATION_TOLERANCE || span / interdistance > MAX_EVEN_STATIONS as f64)
        {
            warn!(interdistance, span, max = MAX_EVEN_STATIONS, "等距间隔过小，已放宽");
        }
        build_stations(curve, request)
    }
}

/// 以字符串 id 注册 `Arc<T>`，解析时按类型取回。
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册服务，同 id 的旧服务被替换。
    pub fn register<T>(&mut self, id: impl Into<String>, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services.insert(id.into(), Box::new(service));
    }

    /// 取回注册时的 `Arc<T>`；`T` 必须与注册时的类型一致。
    pub fn resolve<T>(&self, id: &str) -> Result<Arc<T>, EngineError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let entry = self
            .services
            .get(id)
            .ok_or_else(|| EngineError::UnknownService(id.to_string()))?;
        entry
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| EngineError::ServiceTypeMismatch {
                id: id.to_string(),
                expected: type_name::<T>(),
            })
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.services.contains_key(id)
    }

    /// 已注册的 id，按字典序。
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.services.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geodesy() -> GeodesyService {
        GeodesyService::new(
            Arc::new(Catalog::builtin().clone()),
            DetectorSettings::default(),
        )
    }

    #[test]
    fn resolve_returns_the_registered_trait_object() {
        let mut registry = ServiceRegistry::new();
        let service: Arc<dyn CoordinateService> = Arc::new(geodesy());
        registry.register(GEODESY_SERVICE, service);

        let resolved = registry
            .resolve::<dyn CoordinateService>(GEODESY_SERVICE)
            .expect("resolve geodesy");
        assert_eq!(resolved.find("2154").unwrap().code(), "LAMBERT93");
        assert!(registry.contains(GEODESY_SERVICE));
        assert_eq!(registry.ids(), vec![GEODESY_SERVICE]);
    }

    #[test]
    fn missing_id_is_reported() {
        let registry = ServiceRegistry::new();
        let err = registry
            .resolve::<dyn CoordinateService>("stations")
            .err().unwrap();
        assert!(matches!(err, EngineError::UnknownService(id) if id == "stations"));
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut registry = ServiceRegistry::new();
        registry.register("answer", Arc::new(42_u32));
        let err = registry
            .resolve::<dyn CoordinateService>("answer")
            .err().unwrap();
        assert!(matches!(err, EngineError::ServiceTypeMismatch { .. }));
        assert_eq!(*registry.resolve::<u32>("answer").unwrap(), 42);
    }

    #[test]
    fn unknown_code_is_an_error_at_the_service_boundary() {
        let service = geodesy();
        let err = service
            .to_geodetic("NOWHERE", ProjectedPoint::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownProjection(code) if code == "NOWHERE"));
    }

    #[test]
    fn find_accepts_codes_and_epsg_numbers() {
        let service = geodesy();
        assert_eq!(service.find("lv95").unwrap().epsg(), Some(2056));
        assert_eq!(service.find(" 28992 ").unwrap().code(), "RDNEW");
        assert!(service.find("0").is_none());
    }

    #[test]
    fn station_service_fills_in_defaults() {
        use asphalte_core::stations::StraightCurve;

        let service = StationService::new(StationsConfig {
            default_interdistance: 25.0,
            include_vertex_distances: false,
        });
        let request = service.request(0.0, 100.0, None, None);
        assert!((request.interdistance - 25.0).abs() < f64::EPSILON);
        let stations = service.build(&StraightCurve { length: 100.0 }, &request);
        assert_eq!(stations.as_slice(), &[0.0, 25.0, 50.0, 75.0, 100.0]);

        let explicit = service.request(0.0, 100.0, Some(40.0), Some(true));
        let stations = service.build(&StraightCurve { length: 100.0 }, &explicit);
        assert_eq!(stations.as_slice(), &[0.0, 40.0, 80.0, 100.0]);
    }

    #[test]
    fn service_converts_by_code() {
        let service = geodesy();
        let geodetic = service
            .to_geodetic("LAMBERT93", ProjectedPoint::new(700_000.0, 6_600_000.0))
            .unwrap();
        assert!(geodetic.is_exact());
        assert!((geodetic.value.longitude - 3.0).abs() < 1e-9);
        assert!((geodetic.value.latitude - 46.5).abs() < 1e-9);
    }
}
