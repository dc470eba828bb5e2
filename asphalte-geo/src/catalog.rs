//! 投影目录：内建定义 + 用户配置定义，只读查询。

use std::collections::HashSet;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::datum::{Datum, Helmert7};
use crate::definition::{
    GeoBounds, Hemisphere, LambertParams, LambertVariant, ProjectionDefinition, ProjectionMethod,
    StereographicParams, SwissParams, TransverseMercatorParams, Unit, utm_central_meridian,
};
use crate::ellipsoid::Ellipsoid;
use crate::error::GeoError;
use crate::projection::utm_code;

/// NTF (Paris) → WGS84，IGN 三参数
const NTF: Datum = Datum::new(
    Ellipsoid::CLARKE_1880_IGN,
    Some(Helmert7::translation(-168.0, -60.0, 320.0)),
);

/// Belge 1972 → WGS84
const BD72: Datum = Datum::new(
    Ellipsoid::INTERNATIONAL_1924,
    Some(Helmert7::from_position_vector([
        -106.869, 52.2978, -103.724, 0.3366, -0.457, 1.8422, -1.2747,
    ])),
);

/// CH1903 / CH1903+ → WGS84
const CH1903: Datum = Datum::new(
    Ellipsoid::BESSEL_1841,
    Some(Helmert7::translation(674.374, 15.056, 405.346)),
);

/// OSGB36 → WGS84
const OSGB36: Datum = Datum::new(
    Ellipsoid::AIRY_1830,
    Some(Helmert7::from_position_vector([
        446.448, -125.157, 542.06, 0.15, 0.247, 0.842, -20.489,
    ])),
);

/// Amersfoort → WGS84
const AMERSFOORT: Datum = Datum::new(
    Ellipsoid::BESSEL_1841,
    Some(Helmert7::from_position_vector([
        565.2369, 50.0087, 465.658, -0.406857, 0.350733, -1.87035, 4.0812,
    ])),
);

/// LUREF → WGS84（EPSG 1192）
const LUREF: Datum = Datum::new(
    Ellipsoid::INTERNATIONAL_1924,
    Some(Helmert7::from_position_vector([
        -193.0, 13.7, -39.3, -0.41, -2.933, 2.688, 0.43,
    ])),
);

/// 巴黎子午线相对格林尼治的经度（度）
const PARIS_MERIDIAN: f64 = 2.337_229_17;

/// 瑞士投影原点（伯尔尼旧天文台）
const BERN_LAT: f64 = 46.952_405_555_555_56;
const BERN_LON: f64 = 7.439_583_333_333_333;

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    let definitions = builtin_definitions().expect("内建投影定义无效");
    Catalog::from_definitions(definitions).expect("内建投影代码重复")
});

/// 投影定义的只读列表，保持插入顺序（探测时即按此顺序匹配）。
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: Vec<ProjectionDefinition>,
}

impl Catalog {
    /// 编译期内建目录，首次访问时构造并校验。
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    /// 由定义列表构造目录，代码（忽略大小写）不可重复。
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ProjectionDefinition>,
    ) -> Result<Self, GeoError> {
        let mut seen = HashSet::new();
        let mut catalog = Catalog::default();
        for definition in definitions {
            if !seen.insert(definition.code().to_uppercase()) {
                return Err(GeoError::DuplicateCode(definition.code().to_string()));
            }
            catalog.definitions.push(definition);
        }
        Ok(catalog)
    }

    /// 内建目录 + 用户定义。与内建代码相同的用户定义原位替换内建项，
    /// 其余追加到末尾；用户定义之间重复则报错。
    pub fn with_entries(
        entries: impl IntoIterator<Item = ProjectionDefinition>,
    ) -> Result<Self, GeoError> {
        let mut catalog = Catalog::builtin().clone();
        let mut seen = HashSet::new();
        for entry in entries {
            let key = entry.code().to_uppercase();
            if !seen.insert(key) {
                return Err(GeoError::DuplicateCode(entry.code().to_string()));
            }
            match catalog.position(entry.code()) {
                Some(index) => {
                    debug!(code = entry.code(), "用户定义替换内建投影");
                    catalog.definitions[index] = entry;
                }
                None => catalog.definitions.push(entry),
            }
        }
        Ok(catalog)
    }

    fn position(&self, code: &str) -> Option<usize> {
        let code = code.trim();
        self.definitions
            .iter()
            .position(|definition| definition.code().eq_ignore_ascii_case(code))
    }

    /// 按代码精确查找（忽略大小写）。
    pub fn find_by_code(&self, code: &str) -> Option<&ProjectionDefinition> {
        self.position(code).map(|index| &self.definitions[index])
    }

    /// 按 EPSG 代码查找，0 不匹配任何定义。
    pub fn find_by_epsg(&self, epsg: u32) -> Option<&ProjectionDefinition> {
        if epsg == 0 {
            return None;
        }
        self.definitions
            .iter()
            .find(|definition| definition.epsg() == Some(epsg))
    }

    /// 在名称、代码、国家、地区与 EPSG 代码中做不区分大小写的子串匹配。
    /// 空字符串返回整个目录。
    pub fn search(&self, text: &str) -> Vec<&ProjectionDefinition> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.definitions.iter().collect();
        }
        self.definitions
            .iter()
            .filter(|definition| {
                let epsg = definition.epsg().map(|code| code.to_string());
                [
                    Some(definition.display_name()),
                    Some(definition.code()),
                    Some(definition.country()),
                    Some(definition.region()),
                    epsg.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectionDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// 目录中出现的国家，按首次出现顺序去重。
    pub fn countries(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.definitions
            .iter()
            .map(|definition| definition.country())
            .filter(|country| !country.is_empty() && seen.insert(*country))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ProjectionDefinition;
    type IntoIter = std::slice::Iter<'a, ProjectionDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.definitions.iter()
    }
}

struct Entry {
    code: String,
    epsg: u32,
    name: String,
    country: &'static str,
    region: String,
    bounds: [f64; 4],
    area: GeoBounds,
    method: ProjectionMethod,
}

impl Entry {
    fn build(self) -> Result<ProjectionDefinition, GeoError> {
        let unit = match self.method {
            ProjectionMethod::Geographic => Unit::Degree,
            _ => Unit::Meter,
        };
        ProjectionDefinition::new(self.code, self.name, unit, self.bounds, self.method)?
            .with_epsg(self.epsg)
            .with_location(self.country, self.region)
            .with_area_of_use(self.area)
    }
}

fn lambert_2sp(
    datum: Datum,
    lat_1: f64,
    lat_2: f64,
    lat_0: f64,
    lon_0: f64,
    false_easting: f64,
    false_northing: f64,
) -> ProjectionMethod {
    ProjectionMethod::LambertConic(LambertParams {
        datum,
        variant: LambertVariant::TwoStandardParallels { lat_1, lat_2 },
        lat_0,
        lon_0,
        false_easting,
        false_northing,
    })
}

fn ntf_lambert(lat_0: f64, scale_factor: f64, false_easting: f64, false_northing: f64) -> ProjectionMethod {
    ProjectionMethod::LambertConic(LambertParams {
        datum: NTF,
        variant: LambertVariant::OneStandardParallel { scale_factor },
        lat_0,
        lon_0: PARIS_MERIDIAN,
        false_easting,
        false_northing,
    })
}

fn builtin_definitions() -> Result<Vec<ProjectionDefinition>, GeoError> {
    let mut entries = vec![
        Entry {
            code: "WGS84".into(),
            epsg: 4326,
            name: "WGS 84".into(),
            country: "Monde",
            region: "Coordonnées géographiques".into(),
            bounds: [-180.0, 180.0, -90.0, 90.0],
            area: GeoBounds::new(-180.0, 180.0, -90.0, 90.0),
            method: ProjectionMethod::Geographic,
        },
        Entry {
            code: "LAMBERT93".into(),
            epsg: 2154,
            name: "RGF93 / Lambert-93".into(),
            country: "France",
            region: "Métropole".into(),
            bounds: [-412_000.0, 1_355_000.0, 5_981_000.0, 7_260_000.0],
            area: GeoBounds::new(-9.86, 10.38, 41.15, 51.56),
            method: lambert_2sp(Datum::RGF93, 44.0, 49.0, 46.5, 3.0, 700_000.0, 6_600_000.0),
        },
    ];

    entries.extend((42..=50u32).map(|zone| {
        let lat = f64::from(zone);
        let false_northing = f64::from(zone - 41) * 1_000_000.0 + 200_000.0;
        Entry {
            code: format!("CC{zone}"),
            epsg: 3900 + zone,
            name: format!("RGF93 / CC{zone}"),
            country: "France",
            region: format!("Zone CC{zone} ({}°N à {}°N)", lat - 1.0, lat + 1.0),
            bounds: [
                950_000.0,
                2_450_000.0,
                false_northing - 120_000.0,
                false_northing + 155_000.0,
            ],
            area: GeoBounds::new(-5.5, 10.0, lat - 1.0, lat + 1.0),
            method: lambert_2sp(
                Datum::RGF93,
                lat - 0.75,
                lat + 0.75,
                lat,
                3.0,
                1_700_000.0,
                false_northing,
            ),
        }
    }));

    entries.extend([
        Entry {
            code: "LAMBERT1".into(),
            epsg: 27571,
            name: "NTF (Paris) / Lambert zone I".into(),
            country: "France",
            region: "Nord".into(),
            bounds: [43_000.0, 1_059_000.0, 1_043_000.0, 1_409_000.0],
            area: GeoBounds::new(-4.9, 8.25, 48.15, 51.1),
            method: ntf_lambert(49.5, 0.999_877_34, 600_000.0, 1_200_000.0),
        },
        Entry {
            code: "LAMBERT2E".into(),
            epsg: 27572,
            name: "NTF (Paris) / Lambert zone II étendu".into(),
            country: "France",
            region: "Métropole".into(),
            bounds: [-45_000.0, 1_115_000.0, 1_679_000.0, 2_724_000.0],
            area: GeoBounds::new(-5.2, 8.3, 42.3, 51.1),
            method: ntf_lambert(46.8, 0.999_877_42, 600_000.0, 2_200_000.0),
        },
        Entry {
            code: "LAMBERT3".into(),
            epsg: 27573,
            name: "NTF (Paris) / Lambert zone III".into(),
            country: "France",
            region: "Sud".into(),
            bounds: [243_000.0, 1_058_000.0, 2_993_000.0, 3_377_000.0],
            area: GeoBounds::new(-1.8, 7.7, 42.3, 45.5),
            method: ntf_lambert(44.1, 0.999_877_50, 600_000.0, 3_200_000.0),
        },
        Entry {
            code: "LAMBERT4".into(),
            epsg: 27574,
            name: "NTF (Paris) / Lambert zone IV".into(),
            country: "France",
            region: "Corse".into(),
            bounds: [499_000.0, 610_000.0, 4_104_000.0, 4_319_000.0],
            area: GeoBounds::new(8.5, 9.6, 41.3, 43.1),
            method: ntf_lambert(42.165, 0.999_944_71, 234.358, 4_185_861.369),
        },
        Entry {
            code: "BELGE72".into(),
            epsg: 31370,
            name: "Belge 1972 / Belgian Lambert 72".into(),
            country: "Belgique",
            region: "National".into(),
            bounds: [9_000.0, 303_000.0, 16_000.0, 250_000.0],
            area: GeoBounds::new(2.5, 6.4, 49.5, 51.5),
            method: lambert_2sp(
                BD72,
                51.166_667_233_333_33,
                49.833_333_9,
                90.0,
                4.367_486_666_666_666,
                150_000.013,
                5_400_088.438,
            ),
        },
        Entry {
            code: "BELGE2008".into(),
            epsg: 3812,
            name: "ETRS89 / Belgian Lambert 2008".into(),
            country: "Belgique",
            region: "National".into(),
            bounds: [509_000.0, 803_000.0, 516_000.0, 750_000.0],
            area: GeoBounds::new(2.5, 6.4, 49.5, 51.5),
            method: lambert_2sp(
                Datum::RGF93,
                49.833_333_3,
                51.166_666_7,
                50.797_815,
                4.359_215_833,
                649_328.0,
                665_262.0,
            ),
        },
        Entry {
            code: "LV95".into(),
            epsg: 2056,
            name: "CH1903+ / LV95".into(),
            country: "Suisse",
            region: "National".into(),
            bounds: [2_473_000.0, 2_845_000.0, 1_067_000.0, 1_303_000.0],
            area: GeoBounds::new(5.9, 10.5, 45.8, 47.8),
            method: ProjectionMethod::SwissObliqueMercator(SwissParams {
                datum: CH1903,
                lat_0: BERN_LAT,
                lon_0: BERN_LON,
                false_easting: 2_600_000.0,
                false_northing: 1_200_000.0,
            }),
        },
        Entry {
            code: "LV03".into(),
            epsg: 21781,
            name: "CH1903 / LV03".into(),
            country: "Suisse",
            region: "National".into(),
            bounds: [473_000.0, 845_000.0, 67_000.0, 303_000.0],
            area: GeoBounds::new(5.9, 10.5, 45.8, 47.8),
            method: ProjectionMethod::SwissObliqueMercator(SwissParams {
                datum: CH1903,
                lat_0: BERN_LAT,
                lon_0: BERN_LON,
                false_easting: 600_000.0,
                false_northing: 200_000.0,
            }),
        },
        Entry {
            code: "LUREF".into(),
            epsg: 2169,
            name: "Luxembourg 1930 / Gauss".into(),
            country: "Luxembourg",
            region: "National".into(),
            bounds: [45_000.0, 113_000.0, 50_000.0, 143_000.0],
            area: GeoBounds::new(5.7, 6.6, 49.4, 50.2),
            method: ProjectionMethod::TransverseMercator(TransverseMercatorParams {
                datum: LUREF,
                lat_0: 49.833_333_3,
                lon_0: 6.166_666_7,
                scale_factor: 1.0,
                false_easting: 80_000.0,
                false_northing: 100_000.0,
                zone: None,
            }),
        },
        Entry {
            code: "RDNEW".into(),
            epsg: 28992,
            name: "Amersfoort / RD New".into(),
            country: "Pays-Bas",
            region: "National".into(),
            bounds: [-5_000.0, 296_000.0, 294_000.0, 644_000.0],
            area: GeoBounds::new(3.2, 7.3, 50.7, 53.7),
            method: ProjectionMethod::ObliqueStereographic(StereographicParams {
                datum: AMERSFOORT,
                lat_0: 52.156_160_555_555_55,
                lon_0: 5.387_638_888_888_89,
                scale_factor: 0.999_907_9,
                false_easting: 155_000.0,
                false_northing: 463_000.0,
            }),
        },
        Entry {
            code: "BNG".into(),
            epsg: 27700,
            name: "OSGB36 / British National Grid".into(),
            country: "Royaume-Uni",
            region: "Grande-Bretagne".into(),
            bounds: [-104_000.0, 689_000.0, -36_000.0, 1_268_000.0],
            area: GeoBounds::new(-8.8, 1.8, 49.8, 60.9),
            method: ProjectionMethod::TransverseMercator(TransverseMercatorParams {
                datum: OSGB36,
                lat_0: 49.0,
                lon_0: -2.0,
                scale_factor: 0.999_601_271_7,
                false_easting: 400_000.0,
                false_northing: -100_000.0,
                zone: None,
            }),
        },
    ]);

    entries.extend((28..=38u8).map(|zone| utm_entry(zone, Hemisphere::North)));

    entries.extend([
        overseas_utm(
            "RGAF09UTM20",
            5490,
            "RGAF09 / UTM zone 20N",
            "Antilles",
            20,
            Hemisphere::North,
            [473_000.0, 754_000.0, 1_572_000.0, 2_022_000.0],
            GeoBounds::new(-63.2, -60.7, 14.3, 18.2),
        ),
        overseas_utm(
            "RGFG95UTM22",
            2972,
            "RGFG95 / UTM zone 22N",
            "Guyane",
            22,
            Hemisphere::North,
            [93_000.0, 440_000.0, 224_000.0, 651_000.0],
            GeoBounds::new(-54.6, -51.6, 2.1, 5.8),
        ),
        overseas_utm(
            "RGR92UTM40",
            2975,
            "RGR92 / UTM zone 40S",
            "Réunion",
            40,
            Hemisphere::South,
            [311_000.0, 387_000.0, 7_631_000.0, 7_701_000.0],
            GeoBounds::new(55.2, 55.9, -21.4, -20.8),
        ),
        overseas_utm(
            "RGM04UTM38",
            4471,
            "RGM04 / UTM zone 38S",
            "Mayotte",
            38,
            Hemisphere::South,
            [488_000.0, 539_000.0, 8_556_000.0, 8_608_000.0],
            GeoBounds::new(44.9, 45.35, -13.05, -12.6),
        ),
        Entry {
            code: "REUNION_GL".into(),
            epsg: 3727,
            name: "Piton des Neiges / Gauss Laborde Réunion".into(),
            country: "France",
            region: "Réunion".into(),
            bounds: [110_000.0, 210_000.0, 0.0, 100_000.0],
            area: GeoBounds::new(55.2, 55.9, -21.4, -20.8),
            method: ProjectionMethod::Unsupported {
                method: "gauss_laborde".to_string(),
            },
        },
    ]);

    entries.into_iter().map(Entry::build).collect()
}

fn utm_entry(zone: u8, hemisphere: Hemisphere) -> Entry {
    let central = utm_central_meridian(zone);
    let (epsg, label, bounds, area) = match hemisphere {
        Hemisphere::North => (
            32600 + u32::from(zone),
            "Nord",
            [166_000.0, 834_000.0, 0.0, 9_330_000.0],
            GeoBounds::new(central - 3.0, central + 3.0, 0.0, 84.0),
        ),
        Hemisphere::South => (
            32700 + u32::from(zone),
            "Sud",
            [166_000.0, 834_000.0, 1_100_000.0, 10_000_000.0],
            GeoBounds::new(central - 3.0, central + 3.0, -80.0, 0.0),
        ),
    };
    let code = utm_code(zone, hemisphere);
    Entry {
        name: format!("WGS 84 / UTM zone {}", &code[3..]),
        code,
        epsg,
        country: "International",
        region: format!("Zone {zone} {label} ({}°E à {}°E)", central - 3.0, central + 3.0),
        bounds,
        area,
        method: ProjectionMethod::TransverseMercator(TransverseMercatorParams::utm(zone, hemisphere)),
    }
}

#[allow(clippy::too_many_arguments)]
fn overseas_utm(
    code: &str,
    epsg: u32,
    name: &str,
    region: &str,
    zone: u8,
    hemisphere: Hemisphere,
    bounds: [f64; 4],
    area: GeoBounds,
) -> Entry {
    Entry {
        code: code.to_string(),
        epsg,
        name: name.to_string(),
        country: "France",
        region: region.to_string(),
        bounds,
        area,
        method: ProjectionMethod::TransverseMercator(TransverseMercatorParams::utm_on(
            Datum::RGF93,
            zone,
            hemisphere,
        )),
    }
}
