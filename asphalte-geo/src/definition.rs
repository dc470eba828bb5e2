//! 投影定义：不可变记录，包含标识、适用范围与投影族参数。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datum::Datum;
use crate::error::GeoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Meter,
    Degree,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Meter => "meter",
            Unit::Degree => "degree",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 原生单位下的矩形范围，保证 `min_x < max_x` 且 `min_y < max_y`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedBounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl ProjectedBounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Self, GeoError> {
        Self::validated("", min_x, max_x, min_y, max_y)
    }

    fn validated(
        code: &str,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
    ) -> Result<Self, GeoError> {
        let finite = [min_x, max_x, min_y, max_y].iter().all(|v| v.is_finite());
        if finite && min_x < max_x && min_y < max_y {
            return Ok(Self {
                min_x,
                max_x,
                min_y,
                max_y,
            });
        }
        Err(GeoError::InvalidBounds {
            code: code.to_string(),
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    #[inline]
    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    #[inline]
    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }
}

/// WGS84 经纬度范围（度）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl GeoBounds {
    pub const fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            west,
            east,
            south,
            north,
        }
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        ((self.west + self.east) * 0.5, (self.south + self.north) * 0.5)
    }

    #[inline]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    fn is_valid(&self) -> bool {
        self.west < self.east
            && self.south < self.north
            && self.south >= -90.0
            && self.north <= 90.0
    }
}

/// Lambert 正形圆锥投影的切/割方式。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LambertVariant {
    /// 双标准纬线（度）
    TwoStandardParallels { lat_1: f64, lat_2: f64 },
    /// 单标准纬线，标准纬线即 `lat_0`，附比例因子
    OneStandardParallel { scale_factor: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambertParams {
    pub datum: Datum,
    pub variant: LambertVariant,
    pub lat_0: f64,
    pub lon_0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    North,
    South,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransverseMercatorParams {
    pub datum: Datum,
    pub lat_0: f64,
    pub lon_0: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    /// UTM 带号与半球，非 UTM 的横轴墨卡托为 `None`。
    pub zone: Option<(u8, Hemisphere)>,
}

impl TransverseMercatorParams {
    pub const UTM_SCALE_FACTOR: f64 = 0.9996;

    /// WGS84 UTM 分带参数。
    pub fn utm(zone: u8, hemisphere: Hemisphere) -> Self {
        Self::utm_on(Datum::WGS84, zone, hemisphere)
    }

    /// 任意基准上的 UTM 分带参数（如 RGAF09、RGR92）。
    pub fn utm_on(datum: Datum, zone: u8, hemisphere: Hemisphere) -> Self {
        Self {
            datum,
            lat_0: 0.0,
            lon_0: utm_central_meridian(zone),
            scale_factor: Self::UTM_SCALE_FACTOR,
            false_easting: 500_000.0,
            false_northing: match hemisphere {
                Hemisphere::North => 0.0,
                Hemisphere::South => 10_000_000.0,
            },
            zone: Some((zone, hemisphere)),
        }
    }
}

/// UTM 带的中央子午线（度）。
#[inline]
pub fn utm_central_meridian(zone: u8) -> f64 {
    f64::from(zone) * 6.0 - 183.0
}

/// 由经度计算 UTM 带号 (1-60)。
#[inline]
pub fn utm_zone_for_longitude(lon: f64) -> u8 {
    let zone = ((lon + 180.0) / 6.0).floor() as i32 + 1;
    zone.clamp(1, 60) as u8
}

/// 瑞士斜轴墨卡托（CH1903 / Bessel），原点固定为伯尔尼旧天文台。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwissParams {
    pub datum: Datum,
    pub lat_0: f64,
    pub lon_0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

/// 斜轴（双重）球面投影，荷兰 RD 使用。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereographicParams {
    pub datum: Datum,
    pub lat_0: f64,
    pub lon_0: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectionMethod {
    /// 经纬度，本身即 WGS84 度。
    Geographic,
    LambertConic(LambertParams),
    TransverseMercator(TransverseMercatorParams),
    SwissObliqueMercator(SwissParams),
    ObliqueStereographic(StereographicParams),
    /// 未内建的投影族，仅能做近似换算。
    Unsupported { method: String },
}

impl ProjectionMethod {
    pub fn family_name(&self) -> &str {
        match self {
            ProjectionMethod::Geographic => "geographic",
            ProjectionMethod::LambertConic(params) => match params.variant {
                LambertVariant::TwoStandardParallels { .. } => "lambert_conformal_conic_2sp",
                LambertVariant::OneStandardParallel { .. } => "lambert_conformal_conic_1sp",
            },
            ProjectionMethod::TransverseMercator(_) => "transverse_mercator",
            ProjectionMethod::SwissObliqueMercator(_) => "swiss_oblique_mercator",
            ProjectionMethod::ObliqueStereographic(_) => "oblique_stereographic",
            ProjectionMethod::Unsupported { method } => method,
        }
    }

    /// 是否有精确的闭式正反算。
    pub fn is_exact(&self) -> bool {
        !matches!(self, ProjectionMethod::Unsupported { .. })
    }

    fn validate(&self, code: &str) -> Result<(), GeoError> {
        let invalid = |name: &'static str, reason: &str| GeoError::InvalidParameter {
            code: code.to_string(),
            name,
            reason: reason.to_string(),
        };
        let check_datum = |datum: &Datum| {
            if datum.ellipsoid.is_valid() {
                Ok(())
            } else {
                Err(invalid("ellipsoid", "semi-major axis or flattening out of range"))
            }
        };
        let check_lat = |name: &'static str, value: f64| {
            if value.is_finite() && (-90.0..=90.0).contains(&value) {
                Ok(())
            } else {
                Err(invalid(name, "latitude must lie within [-90, 90]"))
            }
        };
        let check_origin_lat = |value: f64| {
            check_lat("lat_0", value)?;
            if value.abs() >= 90.0 {
                return Err(invalid("lat_0", "projection origin must not lie at a pole"));
            }
            Ok(())
        };
        let check_scale = |value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(invalid("scale_factor", "must be a positive number"))
            }
        };

        match self {
            ProjectionMethod::Geographic | ProjectionMethod::Unsupported { .. } => Ok(()),
            ProjectionMethod::LambertConic(params) => {
                check_datum(&params.datum)?;
                check_lat("lat_0", params.lat_0)?;
                match params.variant {
                    LambertVariant::TwoStandardParallels { lat_1, lat_2 } => {
                        check_lat("lat_1", lat_1)?;
                        check_lat("lat_2", lat_2)?;
                        if (lat_1 + lat_2).abs() < 1e-10 {
                            return Err(invalid(
                                "lat_2",
                                "standard parallels must not be symmetric about the equator",
                            ));
                        }
                        if lat_1.abs() >= 90.0 || lat_2.abs() >= 90.0 {
                            return Err(invalid("lat_1", "standard parallel at a pole"));
                        }
                        Ok(())
                    }
                    LambertVariant::OneStandardParallel { scale_factor } => {
                        check_scale(scale_factor)?;
                        if params.lat_0.abs() < 1e-10 || params.lat_0.abs() >= 90.0 {
                            return Err(invalid(
                                "lat_0",
                                "single standard parallel must differ from the equator and poles",
                            ));
                        }
                        Ok(())
                    }
                }
            }
            ProjectionMethod::TransverseMercator(params) => {
                check_datum(&params.datum)?;
                check_lat("lat_0", params.lat_0)?;
                check_scale(params.scale_factor)?;
                if let Some((zone, _)) = params.zone {
                    if !(1..=60).contains(&zone) {
                        return Err(invalid("zone", "UTM zone must lie within 1..=60"));
                    }
                }
                Ok(())
            }
            ProjectionMethod::SwissObliqueMercator(params) => {
                check_datum(&params.datum)?;
                check_origin_lat(params.lat_0)
            }
            ProjectionMethod::ObliqueStereographic(params) => {
                check_datum(&params.datum)?;
                check_origin_lat(params.lat_0)?;
                check_scale(params.scale_factor)
            }
        }
    }
}

/// 投影定义，构造后不可修改。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionDefinition {
    code: String,
    epsg: Option<u32>,
    display_name: String,
    country: String,
    region: String,
    unit: Unit,
    bounds: ProjectedBounds,
    area_of_use: Option<GeoBounds>,
    method: ProjectionMethod,
}

impl ProjectionDefinition {
    /// 构造并校验定义：代码非空、范围合法、投影参数合理。
    pub fn new(
        code: impl Into<String>,
        display_name: impl Into<String>,
        unit: Unit,
        bounds: [f64; 4],
        method: ProjectionMethod,
    ) -> Result<Self, GeoError> {
        let code = code.into().trim().to_string();
        if code.is_empty() {
            return Err(GeoError::EmptyCode);
        }
        let [min_x, max_x, min_y, max_y] = bounds;
        let bounds = ProjectedBounds::validated(&code, min_x, max_x, min_y, max_y)?;
        method.validate(&code)?;
        Ok(Self {
            code,
            epsg: None,
            display_name: display_name.into(),
            country: String::new(),
            region: String::new(),
            unit,
            bounds,
            area_of_use: None,
            method,
        })
    }

    /// 设置 EPSG 代码，0 视为无代码。
    pub fn with_epsg(mut self, epsg: u32) -> Self {
        self.epsg = (epsg != 0).then_some(epsg);
        self
    }

    pub fn with_location(mut self, country: impl Into<String>, region: impl Into<String>) -> Self {
        self.country = country.into();
        self.region = region.into();
        self
    }

    pub fn with_area_of_use(mut self, area: GeoBounds) -> Result<Self, GeoError> {
        if !area.is_valid() {
            return Err(GeoError::InvalidParameter {
                code: self.code.clone(),
                name: "area_of_use",
                reason: format!(
                    "invalid extent lon=[{}, {}] lat=[{}, {}]",
                    area.west, area.east, area.south, area.north
                ),
            });
        }
        self.area_of_use = Some(area);
        Ok(self)
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    #[inline]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[inline]
    pub fn country(&self) -> &str {
        &self.country
    }

    #[inline]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[inline]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    #[inline]
    pub fn bounds(&self) -> &ProjectedBounds {
        &self.bounds
    }

    #[inline]
    pub fn area_of_use(&self) -> Option<&GeoBounds> {
        self.area_of_use.as_ref()
    }

    #[inline]
    pub fn method(&self) -> &ProjectionMethod {
        &self.method
    }

    /// 投影族有精确算法，且不是按经纬度直接存储的定义。
    pub fn is_exact(&self) -> bool {
        self.unit == Unit::Degree || self.method.is_exact()
    }
}

impl fmt::Display for ProjectionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg {
            Some(epsg) => write!(f, "{} (EPSG:{epsg}) {}", self.code, self.display_name),
            None => write!(f, "{} {}", self.code, self.display_name),
        }
    }
}
