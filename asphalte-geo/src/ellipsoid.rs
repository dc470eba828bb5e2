//! 参考椭球体定义。

use serde::{Deserialize, Serialize};

/// 以长半轴与扁率描述的旋转椭球。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// 长半轴 (m)
    pub a: f64,
    /// 扁率
    pub f: f64,
}

impl Ellipsoid {
    /// WGS84 (EPSG:7030)
    pub const WGS84: Self = Self {
        a: 6_378_137.0,
        f: 1.0 / 298.257_223_563,
    };

    /// GRS80 (EPSG:7019)，RGF93 / ETRS89 使用，与 WGS84 差异小于 0.1 mm。
    pub const GRS80: Self = Self {
        a: 6_378_137.0,
        f: 1.0 / 298.257_222_101,
    };

    /// Clarke 1880 (IGN)，NTF 使用。
    pub const CLARKE_1880_IGN: Self = Self {
        a: 6_378_249.2,
        f: 1.0 - 6_356_515.0 / 6_378_249.2,
    };

    /// Hayford / International 1924
    pub const INTERNATIONAL_1924: Self = Self {
        a: 6_378_388.0,
        f: 1.0 / 297.0,
    };

    /// Bessel 1841，瑞士 CH1903 与荷兰 Amersfoort 使用。
    pub const BESSEL_1841: Self = Self {
        a: 6_377_397.155,
        f: 1.0 / 299.152_812_8,
    };

    /// Airy 1830，英国 OSGB36 使用。
    pub const AIRY_1830: Self = Self {
        a: 6_377_563.396,
        f: 1.0 / 299.324_964_6,
    };

    /// 按名称查找预定义椭球（忽略大小写、空格、连字符与下划线）。
    pub fn by_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "wgs84" => Some(Self::WGS84),
            "grs80" => Some(Self::GRS80),
            "clarke1880ign" | "clarke1880" => Some(Self::CLARKE_1880_IGN),
            "international1924" | "hayford" | "intl" => Some(Self::INTERNATIONAL_1924),
            "bessel1841" | "bessel" => Some(Self::BESSEL_1841),
            "airy1830" | "airy" => Some(Self::AIRY_1830),
            _ => None,
        }
    }

    /// 第一偏心率平方 e²
    #[inline]
    pub fn e2(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// 第一偏心率 e
    #[inline]
    pub fn e(&self) -> f64 {
        self.e2().sqrt()
    }

    /// 短半轴 (m)
    #[inline]
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// 第三扁率 n = f / (2 - f)
    #[inline]
    pub fn n(&self) -> f64 {
        self.f / (2.0 - self.f)
    }

    /// 卯酉圈曲率半径 N(φ)，φ 为弧度。
    #[inline]
    pub fn prime_vertical_radius(&self, lat: f64) -> f64 {
        let s = lat.sin();
        self.a / (1.0 - self.e2() * s * s).sqrt()
    }

    /// 子午圈曲率半径 M(φ)，φ 为弧度。
    #[inline]
    pub fn meridian_radius(&self, lat: f64) -> f64 {
        let s = lat.sin();
        let w2 = 1.0 - self.e2() * s * s;
        self.a * (1.0 - self.e2()) / (w2 * w2.sqrt())
    }

    pub fn is_valid(&self) -> bool {
        self.a.is_finite() && self.a > 0.0 && self.f.is_finite() && (0.0..1.0).contains(&self.f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wgs84_derived_parameters() {
        let wgs84 = Ellipsoid::WGS84;
        assert!((wgs84.b() - 6_356_752.314_245).abs() < 1e-3);
        assert!((wgs84.e2() - 0.006_694_379_990_14).abs() < 1e-12);
        assert!((wgs84.e() - 0.081_819_190_842_62).abs() < 1e-12);
    }

    #[test]
    fn clarke_ign_minor_axis_matches_definition() {
        let clarke = Ellipsoid::CLARKE_1880_IGN;
        assert!((clarke.b() - 6_356_515.0).abs() < 1e-6);
    }

    #[test]
    fn lookup_by_name_is_lenient() {
        assert_eq!(Ellipsoid::by_name("GRS 80"), Some(Ellipsoid::GRS80));
        assert_eq!(Ellipsoid::by_name("bessel_1841"), Some(Ellipsoid::BESSEL_1841));
        assert_eq!(Ellipsoid::by_name("Clarke-1880-IGN"), Some(Ellipsoid::CLARKE_1880_IGN));
        assert!(Ellipsoid::by_name("krassowsky").is_none());
    }

    #[test]
    fn radii_at_equator_and_pole() {
        let wgs84 = Ellipsoid::WGS84;
        assert!((wgs84.prime_vertical_radius(0.0) - wgs84.a).abs() < 1e-9);
        let polar = wgs84.a * wgs84.a / wgs84.b();
        assert!((wgs84.prime_vertical_radius(std::f64::consts::FRAC_PI_2) - polar).abs() < 1e-6);
        assert!((wgs84.meridian_radius(std::f64::consts::FRAC_PI_2) - polar).abs() < 1e-6);
    }
}
