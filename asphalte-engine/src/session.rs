//! 会话：一次运行期间的目录、探测参数与服务注册表。

use std::sync::Arc;

use asphalte_config::{AppConfig, CatalogEntryConfig, StationsConfig, UnitConfig};
use asphalte_geo::datum::{Datum, Helmert7};
use asphalte_geo::definition::{
    Hemisphere, LambertParams, LambertVariant, StereographicParams, SwissParams,
    TransverseMercatorParams,
};
use asphalte_geo::ellipsoid::Ellipsoid;
use asphalte_geo::{
    Catalog, Detector, DetectorSettings, GeoBounds, ProjectionDefinition, ProjectionMethod, Unit,
};
use tracing::{info, warn};

use crate::errors::EngineError;
use crate::services::{
    CoordinateService, GEODESY_SERVICE, GeodesyService, STATIONS_SERVICE, ServiceRegistry,
    StationService,
};

#[derive(Debug)]
pub struct Session {
    catalog: Arc<Catalog>,
    detector: DetectorSettings,
    stations: StationsConfig,
    services: ServiceRegistry,
}

impl Session {
    /// 按配置构建目录与服务。无效的用户条目被跳过，重复代码视为错误。
    pub fn open(config: &AppConfig) -> Result<Self, EngineError> {
        let mut definitions = Vec::with_capacity(config.catalog.entries.len());
        for entry in &config.catalog.entries {
            match definition_from_entry(entry) {
                Ok(definition) => definitions.push(definition),
                Err(err) => warn!(code = %entry.code, error = %err, "忽略无效的投影配置"),
            }
        }
        let user_entries = definitions.len();
        let catalog = Arc::new(Catalog::with_entries(definitions)?);

        let detector = DetectorSettings {
            origin_threshold: config.detector.origin_threshold,
            min_points: config.detector.min_points,
        };

        let mut services = ServiceRegistry::new();
        let geodesy: Arc<dyn CoordinateService> =
            Arc::new(GeodesyService::new(Arc::clone(&catalog), detector));
        services.register(GEODESY_SERVICE, geodesy);
        services.register(STATIONS_SERVICE, Arc::new(StationService::new(config.stations)));

        info!(
            definitions = catalog.len(),
            user_entries,
            services = ?services.ids(),
            "会话已打开"
        );

        Ok(Self {
            catalog,
            detector,
            stations: config.stations,
            services,
        })
    }

    pub fn close(self) {
        info!(definitions = self.catalog.len(), "会话已关闭");
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn detector(&self) -> Detector<'_> {
        Detector::new(&self.catalog, self.detector)
    }

    #[inline]
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    #[inline]
    pub fn station_defaults(&self) -> &StationsConfig {
        &self.stations
    }

    /// 注册表中是否有该 id 的服务。
    #[inline]
    pub fn is_module_available(&self, id: &str) -> bool {
        self.services.contains(id)
    }

    pub fn geodesy(&self) -> Result<Arc<dyn CoordinateService>, EngineError> {
        self.services.resolve::<dyn CoordinateService>(GEODESY_SERVICE)
    }

    pub fn station_service(&self) -> Result<Arc<StationService>, EngineError> {
        self.services.resolve::<StationService>(STATIONS_SERVICE)
    }
}

/// 将配置中的一条投影转换为定义并校验。
pub fn definition_from_entry(entry: &CatalogEntryConfig) -> Result<ProjectionDefinition, EngineError> {
    let code = entry.code.trim();
    let invalid = |reason: String| EngineError::InvalidEntry {
        code: code.to_string(),
        reason,
    };
    let required = |value: Option<f64>, name: &str| {
        value.ok_or_else(|| invalid(format!("missing parameter `{name}`")))
    };

    let datum = || -> Result<Datum, EngineError> {
        let ellipsoid = match entry.ellipsoid.as_deref() {
            None => Ellipsoid::GRS80,
            Some(name) => Ellipsoid::by_name(name)
                .ok_or_else(|| invalid(format!("unknown ellipsoid `{name}`")))?,
        };
        let to_wgs84 = match entry.towgs84.as_deref() {
            None => None,
            Some(&[tx, ty, tz]) => Some(Helmert7::translation(tx, ty, tz)),
            Some(&[tx, ty, tz, rx, ry, rz, ds]) => Some(Helmert7::from_position_vector([
                tx, ty, tz, rx, ry, rz, ds,
            ])),
            Some(other) => {
                return Err(invalid(format!(
                    "towgs84 expects 3 or 7 values, got {}",
                    other.len()
                )));
            }
        };
        Ok(Datum::new(ellipsoid, to_wgs84))
    };
    let false_easting = entry.false_easting.unwrap_or(0.0);
    let false_northing = entry.false_northing.unwrap_or(0.0);

    let method = match entry.method.trim().to_ascii_lowercase().as_str() {
        "geographic" => ProjectionMethod::Geographic,
        "lambert_conformal_conic_2sp" => ProjectionMethod::LambertConic(LambertParams {
            datum: datum()?,
            variant: LambertVariant::TwoStandardParallels {
                lat_1: required(entry.lat_1, "lat_1")?,
                lat_2: required(entry.lat_2, "lat_2")?,
            },
            lat_0: required(entry.lat_0, "lat_0")?,
            lon_0: entry.lon_0.unwrap_or(0.0),
            false_easting,
            false_northing,
        }),
        "lambert_conformal_conic_1sp" => ProjectionMethod::LambertConic(LambertParams {
            datum: datum()?,
            variant: LambertVariant::OneStandardParallel {
                scale_factor: entry.scale_factor.unwrap_or(1.0),
            },
            lat_0: required(entry.lat_0, "lat_0")?,
            lon_0: entry.lon_0.unwrap_or(0.0),
            false_easting,
            false_northing,
        }),
        "transverse_mercator" => ProjectionMethod::TransverseMercator(TransverseMercatorParams {
            datum: datum()?,
            lat_0: entry.lat_0.unwrap_or(0.0),
            lon_0: required(entry.lon_0, "lon_0")?,
            scale_factor: entry.scale_factor.unwrap_or(1.0),
            false_easting,
            false_northing,
            zone: None,
        }),
        "utm" => {
            let zone = entry
                .zone
                .ok_or_else(|| invalid("missing parameter `zone`".to_string()))?;
            let hemisphere = if entry.south {
                Hemisphere::South
            } else {
                Hemisphere::North
            };
            let zone_datum = match entry.ellipsoid {
                None if entry.towgs84.is_none() => Datum::WGS84,
                _ => datum()?,
            };
            ProjectionMethod::TransverseMercator(TransverseMercatorParams::utm_on(
                zone_datum, zone, hemisphere,
            ))
        }
        "swiss_oblique_mercator" => ProjectionMethod::SwissObliqueMercator(SwissParams {
            datum: datum()?,
            lat_0: required(entry.lat_0, "lat_0")?,
            lon_0: required(entry.lon_0, "lon_0")?,
            false_easting,
            false_northing,
        }),
        "oblique_stereographic" => ProjectionMethod::ObliqueStereographic(StereographicParams {
            datum: datum()?,
            lat_0: required(entry.lat_0, "lat_0")?,
            lon_0: required(entry.lon_0, "lon_0")?,
            scale_factor: entry.scale_factor.unwrap_or(1.0),
            false_easting,
            false_northing,
        }),
        other => ProjectionMethod::Unsupported {
            method: other.to_string(),
        },
    };

    let unit = match entry.unit {
        UnitConfig::Meter => Unit::Meter,
        UnitConfig::Degree => Unit::Degree,
    };
    let name = if entry.name.trim().is_empty() {
        code
    } else {
        entry.name.as_str()
    };

    let definition = ProjectionDefinition::new(code, name, unit, entry.bounds, method)?
        .with_epsg(entry.epsg)
        .with_location(entry.country.as_str(), entry.region.as_str());
    match entry.area_of_use {
        Some([west, east, south, north]) => Ok(definition
            .with_area_of_use(GeoBounds::new(west, east, south, north))?),
        None => Ok(definition),
    }
}

#[cfg(test)]
mod tests {
    use asphalte_geo::{Accuracy, GeodeticPoint, ProjectedPoint};

    use super::*;

    fn config(entries: &str) -> AppConfig {
        toml::from_str(entries).expect("parse config")
    }

    #[test]
    fn default_session_exposes_the_builtin_catalog() {
        let session = Session::open(&AppConfig::default()).unwrap();
        assert_eq!(session.catalog().len(), Catalog::builtin().len());
        assert!(session.is_module_available("geodesy"));
        assert!(session.is_module_available("stations"));
        assert!(!session.is_module_available("covadis"));

        let geodesy = session.geodesy().unwrap();
        assert_eq!(geodesy.find("LAMBERT93").unwrap().epsg(), Some(2154));
        session.close();
    }

    #[test]
    fn user_entries_extend_the_catalog() {
        let session = Session::open(&config(
            r#"
            [[catalog.entries]]
            code = "UTM31S"
            epsg = 32731
            name = "WGS 84 / UTM 31S"
            bounds = [166000.0, 834000.0, 1100000.0, 10000000.0]
            area_of_use = [0.0, 6.0, -80.0, 0.0]
            method = "utm"
            zone = 31
            south = true

            [[catalog.entries]]
            code = "CHANTIER"
            country = "France"
            bounds = [0.0, 5000.0, 0.0, 5000.0]
            area_of_use = [4.80, 4.90, 45.70, 45.80]
            method = "local_grid"
            "#,
        ))
        .unwrap();

        let geodesy = session.geodesy().unwrap();
        let utm = geodesy.find("32731").unwrap();
        assert_eq!(utm.code(), "UTM31S");
        let projected = geodesy
            .to_projected("UTM31S", GeodeticPoint::new(3.0, -10.0))
            .unwrap();
        assert!((projected.value.x - 500_000.0).abs() < 1e-6);
        assert!(projected.value.y < 10_000_000.0);

        let site = geodesy.find("chantier").unwrap();
        assert!(!site.is_exact());
        assert_eq!(site.display_name(), "CHANTIER");
        let approx = geodesy
            .to_geodetic("CHANTIER", ProjectedPoint::new(2500.0, 2500.0))
            .unwrap();
        assert_eq!(approx.accuracy, Accuracy::Approximate);
    }

    #[test]
    fn user_entry_can_replace_a_builtin() {
        let session = Session::open(&config(
            r#"
            [[catalog.entries]]
            code = "lambert93"
            epsg = 2154
            name = "Lambert-93 (chantier)"
            bounds = [600000.0, 800000.0, 6500000.0, 6700000.0]
            method = "lambert_conformal_conic_2sp"
            lat_0 = 46.5
            lon_0 = 3.0
            lat_1 = 49.0
            lat_2 = 44.0
            false_easting = 700000.0
            false_northing = 6600000.0
            "#,
        ))
        .unwrap();
        assert_eq!(session.catalog().len(), Catalog::builtin().len());
        let lambert = session.catalog().find_by_code("LAMBERT93").unwrap();
        assert_eq!(lambert.display_name(), "Lambert-93 (chantier)");
        assert!((lambert.bounds().min_x() - 600_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_entries_are_skipped() {
        let session = Session::open(&config(
            r#"
            [[catalog.entries]]
            code = "BROKEN"
            bounds = [10.0, 0.0, 0.0, 10.0]
            method = "transverse_mercator"
            lon_0 = 3.0

            [[catalog.entries]]
            code = "NOPARAM"
            bounds = [0.0, 10.0, 0.0, 10.0]
            method = "oblique_stereographic"

            [[catalog.entries]]
            code = "POLAR"
            bounds = [0.0, 10.0, 0.0, 10.0]
            method = "oblique_stereographic"
            lat_0 = 90.0
            lon_0 = 0.0
            "#,
        ))
        .unwrap();
        assert!(session.catalog().find_by_code("BROKEN").is_none());
        assert!(session.catalog().find_by_code("NOPARAM").is_none());
        assert!(session.catalog().find_by_code("POLAR").is_none());
    }

    #[test]
    fn duplicate_user_codes_fail_to_open() {
        let err = Session::open(&config(
            r#"
            [[catalog.entries]]
            code = "SITE"
            bounds = [0.0, 10.0, 0.0, 10.0]
            method = "local_grid"

            [[catalog.entries]]
            code = "site"
            bounds = [0.0, 10.0, 0.0, 10.0]
            method = "local_grid"
            "#,
        ))
        .unwrap_err();
        assert!(matches!(err, EngineError::Catalog(_)));
    }

    #[test]
    fn entry_conversion_reports_missing_parameters() {
        let entry = config(
            r#"
            [[catalog.entries]]
            code = "LCC"
            bounds = [0.0, 10.0, 0.0, 10.0]
            method = "lambert_conformal_conic_2sp"
            lat_0 = 46.0
            lat_1 = 45.0
            "#,
        )
        .catalog
        .entries
        .remove(0);
        let err = definition_from_entry(&entry).unwrap_err();
        assert!(matches!(err, EngineError::InvalidEntry { ref reason, .. } if reason.contains("lat_2")));
    }

    #[test]
    fn entry_conversion_reads_datum_parameters() {
        let entry = config(
            r#"
            [[catalog.entries]]
            code = "NTF_LOCAL"
            bounds = [0.0, 1200000.0, 1600000.0, 2700000.0]
            method = "lambert_conformal_conic_1sp"
            ellipsoid = "Clarke 1880 IGN"
            towgs84 = [-168.0, -60.0, 320.0]
            lat_0 = 46.8
            lon_0 = 2.33722917
            scale_factor = 0.99987742
            false_easting = 600000.0
            false_northing = 2200000.0
            "#,
        )
        .catalog
        .entries
        .remove(0);
        let definition = definition_from_entry(&entry).unwrap();
        match definition.method() {
            ProjectionMethod::LambertConic(params) => {
                assert_eq!(params.datum.ellipsoid, Ellipsoid::CLARKE_1880_IGN);
                let shift = params.datum.to_wgs84.unwrap();
                assert!((shift.tx + 168.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected method {other:?}"),
        }

        let mut bad = entry.clone();
        bad.towgs84 = Some(vec![1.0, 2.0]);
        assert!(matches!(
            definition_from_entry(&bad),
            Err(EngineError::InvalidEntry { .. })
        ));
    }
}
