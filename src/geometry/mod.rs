pub mod hit_testing;
pub mod transform_math;

pub use transform_math::{Corner, Point, ScaleParams, ScaledRect};
