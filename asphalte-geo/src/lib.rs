//! 坐标系转换核心：投影目录、正反算引擎与投影探测。
//!
//! 所有函数均为纯函数，输入为坐标值与只读目录，可在任意线程并发调用。

pub mod catalog;
pub mod datum;
pub mod definition;
pub mod detector;
pub mod ellipsoid;
pub mod error;
pub mod point;
pub mod projection;

pub use catalog::Catalog;
pub use definition::{
    GeoBounds, ProjectedBounds, ProjectionDefinition, ProjectionMethod, Unit,
};
pub use detector::{Detection, Detector, DetectorSettings};
pub use error::GeoError;
pub use point::{GeodeticPoint, Located, ProjectedPoint};
pub use projection::{Accuracy, Conversion, Projector};
