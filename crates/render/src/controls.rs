use crate::camera::PerspectiveCamera;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

const EPS: f32 = 1e-6;

/// Orbit-style camera controls: drag to circle the target, pan to move it,
/// wheel to dolly in and out.
///
/// Input methods only record deltas. [`OrbitControls::update`] applies them to
/// the camera and is meant to run once per frame. With damping enabled the
/// deltas decay over several updates instead of being consumed at once.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits in radians, measured from +Y.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Record a pointer drag of `(dx, dy)` pixels. A drag across the full
    /// viewport height turns the camera one full circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enable_rotate {
            return;
        }
        let h = viewport_height.max(1.0);
        self.delta_theta -= TAU * dx / h * self.rotate_speed;
        self.delta_phi -= TAU * dy / h * self.rotate_speed;
    }

    /// Record a dolly step; positive moves toward the target.
    /// Returns `false` when zooming is disabled and the input was dropped.
    pub fn zoom(&mut self, steps: f32) -> bool {
        if !self.enable_zoom {
            tracing::trace!("zoom ignored: disabled");
            return false;
        }
        let factor = 0.95_f32.powf(self.zoom_speed);
        self.scale *= factor.powf(steps);
        true
    }

    /// Record a pointer pan of `(dx, dy)` pixels in screen space.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera, viewport_height: f32) {
        if !self.enable_pan {
            return;
        }
        let h = viewport_height.max(1.0);
        let distance =
            (camera.position - self.target).length() * (camera.fov_degrees.to_radians() / 2.0).tan();
        let forward = camera.forward();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        let left_amount = 2.0 * dx * distance / h * self.pan_speed;
        let up_amount = 2.0 * dy * distance / h * self.pan_speed;
        self.pan_offset += -right * left_amount + up * up_amount;
    }

    /// Apply pending input to the camera. Returns `true` when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let previous = camera.position;
        let offset = camera.position - self.target;

        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, 0.0)
        };

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * step;
        phi += self.delta_phi * step;
        phi = phi.clamp(self.min_polar_angle.max(EPS), self.max_polar_angle.min(PI - EPS));
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * step;

        let sin_phi = phi.sin();
        let new_offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = self.target + new_offset;
        camera.look_at(self.target);

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        (camera.position - previous).length_squared() > EPS
    }
}
