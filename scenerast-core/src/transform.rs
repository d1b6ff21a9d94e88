/// 4x4 homogeneous transform builders
use nalgebra::{Matrix4, Vector3};

/// Yaw/pitch/roll angles (in radians) of an intrinsic Z-X-Y rotation.
///
/// The object is first yawed around its Z axis, then pitched around the
/// yawed X axis, and finally rolled around the yawed-and-pitched Y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angles {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Angles {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    pub fn zero() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}

impl Default for Angles {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<[f64; 3]> for Angles {
    fn from([yaw, pitch, roll]: [f64; 3]) -> Self {
        Self::new(yaw, pitch, roll)
    }
}

/// A coordinate axis, used to name shear dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a translation matrix
    pub fn translate(v: &Vector3<f64>) -> Matrix4<f64> {
        Matrix4::new_translation(v)
    }

    /// Create a rotation matrix from yaw/pitch/roll angles
    pub fn rotate(angles: &Angles) -> Matrix4<f64> {
        let yaw = Matrix4::from_axis_angle(&Vector3::z_axis(), angles.yaw);
        let pitch = Matrix4::from_axis_angle(&Vector3::x_axis(), angles.pitch);
        let roll = Matrix4::from_axis_angle(&Vector3::y_axis(), angles.roll);

        // Reverse application order so yaw moves the pitch and roll axes
        yaw * pitch * roll
    }

    /// Create a scale matrix
    pub fn scale(factors: &Vector3<f64>) -> Matrix4<f64> {
        Matrix4::new_nonuniform_scaling(factors)
    }

    /// Create a shear matrix: `shear_axis` gains `factor` times the `contrib_axis` coordinate.
    pub fn shear(shear_axis: Axis, contrib_axis: Axis, factor: f64) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        m[(shear_axis.index(), contrib_axis.index())] += factor;
        m
    }
}
