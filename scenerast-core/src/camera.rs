/// Perspective camera and its viewing transforms
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::{RenderError, RenderResult};

/// Default full view angle, in degrees, for both directions.
pub const DEFAULT_VIEW_ANGLE: f64 = 45.0;

/// An ideal perspective camera.
///
/// The camera sits at `eye` and looks down its own -z axis. `x`, `y`, `z`
/// form a right-handed orthonormal basis in world coordinates. View angles are
/// stored as half-angles in radians, measured from the look direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    eye: Point3<f64>,
    x: Vector3<f64>,
    y: Vector3<f64>,
    z: Vector3<f64>,
    near: f64,
    far: f64,
    view_angle_h: f64,
    view_angle_v: f64,
}

fn half_angle(full_degrees: f64) -> f64 {
    (full_degrees / 2.0).to_radians()
}

fn check_full_angle(degrees: f64) -> RenderResult<()> {
    if !(degrees > 0.0 && degrees < 180.0) {
        return Err(RenderError::DegeneratePose(format!(
            "view angle {} must be strictly between 0 and 180 degrees",
            degrees
        )));
    }
    Ok(())
}

impl Camera {
    /// Build a camera from a look-at pose and frustum.
    ///
    /// `up` need not be a unit vector nor orthogonal to the view direction.
    /// `view_angle_h` and `view_angle_v` are full angles in degrees between
    /// opposite sides of the view volume. Fails with `DegeneratePose` when
    /// `look_at == eye`, `up` is parallel to the view direction, or the clip
    /// distances are not positive and distinct.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        eye: Point3<f64>,
        look_at: Point3<f64>,
        up: Vector3<f64>,
        near: f64,
        far: f64,
        view_angle_h: f64,
        view_angle_v: f64,
    ) -> RenderResult<Self> {
        if !(near > 0.0 && far > 0.0) || near == far || !near.is_finite() || !far.is_finite() {
            return Err(RenderError::DegeneratePose(format!(
                "near ({}) and far ({}) must be positive, finite and distinct",
                near, far
            )));
        }
        check_full_angle(view_angle_h)?;
        check_full_angle(view_angle_v)?;

        let (x, y, z) = Self::basis(&eye, &look_at, &up)?;
        Ok(Self {
            eye,
            x,
            y,
            z,
            near,
            far,
            view_angle_h: half_angle(view_angle_h),
            view_angle_v: half_angle(view_angle_v),
        })
    }

    /// Build a camera with the default 45 degree view angles.
    pub fn look_at(
        eye: Point3<f64>,
        look_at: Point3<f64>,
        up: Vector3<f64>,
        near: f64,
        far: f64,
    ) -> RenderResult<Self> {
        Self::new(eye, look_at, up, near, far, DEFAULT_VIEW_ANGLE, DEFAULT_VIEW_ANGLE)
    }

    fn basis(
        eye: &Point3<f64>,
        look_at: &Point3<f64>,
        up: &Vector3<f64>,
    ) -> RenderResult<(Vector3<f64>, Vector3<f64>, Vector3<f64>)> {
        let back = eye - look_at;
        if !back.iter().chain(up.iter()).all(|c| c.is_finite()) {
            return Err(RenderError::DegeneratePose(
                "camera pose has non-finite coordinates".to_string(),
            ));
        }

        let z = back
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| RenderError::DegeneratePose("look_at coincides with eye".to_string()))?;
        let x = up.cross(&z).try_normalize(f64::EPSILON).ok_or_else(|| {
            RenderError::DegeneratePose(format!(
                "up vector {:?} is parallel to the view direction",
                up.as_slice()
            ))
        })?;
        let y = z.cross(&x);
        Ok((x, y, z))
    }

    /// Move and re-aim the camera. On failure the previous pose is kept.
    pub fn set_pose(&mut self, eye: Point3<f64>, look_at: Point3<f64>, up: Vector3<f64>) -> RenderResult<()> {
        let (x, y, z) = Self::basis(&eye, &look_at, &up)?;
        self.eye = eye;
        self.x = x;
        self.y = y;
        self.z = z;
        Ok(())
    }

    /// Set the view angles for an image of the given aspect ratio (width / height).
    ///
    /// The wider direction gets `max_angle` (full angle, degrees); the other is
    /// derived so that `natural_aspect_ratio()` equals `aspect_ratio`.
    pub fn set_view_angles(&mut self, aspect_ratio: f64, max_angle: f64) -> RenderResult<()> {
        if !(aspect_ratio > 0.0 && aspect_ratio.is_finite()) {
            return Err(RenderError::InputShape(format!(
                "aspect ratio {} must be positive and finite",
                aspect_ratio
            )));
        }
        check_full_angle(max_angle)?;

        let a = half_angle(max_angle);
        if aspect_ratio < 1.0 {
            self.view_angle_v = a;
            self.view_angle_h = (a.sin() * aspect_ratio).asin();
        } else {
            self.view_angle_h = a;
            self.view_angle_v = (a.sin() / aspect_ratio).asin();
        }
        Ok(())
    }

    /// The image aspect ratio at which this camera's view is undistorted.
    pub fn natural_aspect_ratio(&self) -> f64 {
        self.view_angle_h.sin() / self.view_angle_v.sin()
    }

    pub fn eye(&self) -> &Point3<f64> {
        &self.eye
    }

    /// The camera's (right, up, backward) axes in world coordinates.
    pub fn axes(&self) -> (&Vector3<f64>, &Vector3<f64>, &Vector3<f64>) {
        (&self.x, &self.y, &self.z)
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    /// Horizontal and vertical half-angles in radians.
    pub fn view_angles(&self) -> (f64, f64) {
        (self.view_angle_h, self.view_angle_v)
    }

    /// Translation that moves the eye to the origin.
    pub fn translate_to_origin(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&-self.eye.coords)
    }

    /// Rotation taking the camera axes onto the world axes.
    #[rustfmt::skip]
    pub fn rotate_align(&self) -> Matrix4<f64> {
        let (x, y, z) = (&self.x, &self.y, &self.z);
        Matrix4::new(
            x.x, x.y, x.z, 0.0,
            y.x, y.y, y.z, 0.0,
            z.x, z.y, z.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rigid transform placing the camera at the origin with its axes on the world's.
    pub fn world_to_camera_centric(&self) -> Matrix4<f64> {
        self.rotate_align() * self.translate_to_origin()
    }

    /// Map camera-centric space onto the canonical view volume.
    ///
    /// After the homogeneous divide, points inside the frustum land in
    /// [-1, 1]^3. The near plane maps to z = +1 and the far plane to z = -1, so
    /// a larger canonical z is closer to the camera.
    #[rustfmt::skip]
    pub fn perspective_normalization(&self) -> Matrix4<f64> {
        let (n, f) = (self.near, self.far);
        Matrix4::new(
            1.0 / self.view_angle_h.tan(), 0.0, 0.0, 0.0,
            0.0, 1.0 / self.view_angle_v.tan(), 0.0, 0.0,
            0.0, 0.0, (f + n) / (f - n), 2.0 * f * n / (f - n),
            0.0, 0.0, -1.0, 0.0,
        )
    }

    pub fn world_to_canonical_view(&self) -> Matrix4<f64> {
        self.perspective_normalization() * self.world_to_camera_centric()
    }
}
