use nalgebra::{Isometry3, Perspective3, Point3, Vector3};
use ratatui::layout::Rect;
use std::f64::consts::PI;

/// A terminal cell is roughly twice as tall as it is wide.
pub const CELL_ASPECT: f64 = 0.5;

const FOV_Y_DEG: f64 = 75.0;
const NEAR: f64 = 0.1;
const FAR: f64 = 1000.0;
const START_DISTANCE: f64 = 40.0;
const MIN_DISTANCE: f64 = 25.0;
const MAX_DISTANCE: f64 = 120.0;
const POLAR_MARGIN: f64 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f64>,
    /// Always unit length.
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the first surface point of the sphere in
    /// front of the origin.
    pub fn intersect_sphere(&self, center: &Point3<f64>, radius: f64) -> Option<f64> {
        let oc = self.origin - center;
        let b = oc.dot(&self.direction);
        let c = oc.norm_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }

    /// Closest distance between the (forward) ray and a point.
    pub fn closest_approach(&self, point: &Point3<f64>) -> f64 {
        let t = (point - self.origin).dot(&self.direction).max(0.0);
        (self.at(t) - point).norm()
    }
}

/// Perspective camera orbiting the origin.
#[derive(Debug, Clone)]
pub struct Camera {
    azimuth: f64,
    polar: f64,
    distance: f64,
    aspect: f64,
    projection: Perspective3<f64>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Camera {
    pub fn new(aspect: f64) -> Self {
        Self {
            azimuth: 0.0,
            polar: PI / 2.0,
            distance: START_DISTANCE,
            aspect,
            projection: Perspective3::new(aspect, FOV_Y_DEG.to_radians(), NEAR, FAR),
        }
    }

    pub fn eye(&self) -> Point3<f64> {
        let (sp, cp) = self.polar.sin_cos();
        let (sa, ca) = self.azimuth.sin_cos();
        Point3::new(
            self.distance * sp * sa,
            self.distance * cp,
            self.distance * sp * ca,
        )
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    fn view(&self) -> Isometry3<f64> {
        Isometry3::look_at_rh(&self.eye(), &Point3::origin(), &Vector3::y())
    }

    /// Recompute the aspect ratio for a surface measured in cells.
    pub fn set_surface(&mut self, width: u16, height: u16) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f64 * CELL_ASPECT / height as f64;
        self.projection.set_aspect(self.aspect);
    }

    /// Rotate around the origin. Angles in radians.
    pub fn orbit(&mut self, d_azimuth: f64, d_polar: f64) {
        self.azimuth = (self.azimuth - d_azimuth).rem_euclid(2.0 * PI);
        self.polar = (self.polar - d_polar).clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
    }

    pub fn zoom(&mut self, factor: f64) {
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// World point to normalized device coordinates. `None` when behind the camera.
    pub fn project(&self, world: &Point3<f64>) -> Option<(f64, f64)> {
        let local = self.view().transform_point(world);
        if local.z >= -NEAR {
            return None;
        }
        let ndc = self.projection.project_point(&local);
        Some((ndc.x, ndc.y))
    }

    /// Ray from the eye through a point in normalized device coordinates.
    pub fn ray_through(&self, ndc_x: f64, ndc_y: f64) -> Ray {
        let near = self
            .projection
            .unproject_point(&Point3::new(ndc_x, ndc_y, -1.0));
        let world = self.view().inverse_transform_point(&near);
        let eye = self.eye();
        Ray::new(eye, world - eye)
    }

    /// Whether a surface point with the given outward normal faces the eye.
    pub fn faces(&self, point: &Point3<f64>, normal: &Vector3<f64>) -> bool {
        normal.dot(&(self.eye() - point)) > 0.0
    }
}

/// The render surface: maps between terminal cells and NDC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub area: Rect,
}

impl Viewport {
    pub fn new(area: Rect) -> Self {
        Self { area }
    }

    /// Cell centre to NDC in [-1, 1], y up. Cells outside the area map outside the range.
    pub fn to_ndc(&self, column: u16, row: u16) -> (f64, f64) {
        let w = self.area.width.max(1) as f64;
        let h = self.area.height.max(1) as f64;
        let x = (column as f64 - self.area.x as f64 + 0.5) / w * 2.0 - 1.0;
        let y = -((row as f64 - self.area.y as f64 + 0.5) / h * 2.0) + 1.0;
        (x, y)
    }

    pub fn to_cell(&self, ndc_x: f64, ndc_y: f64) -> Option<(u16, u16)> {
        if !(-1.0..=1.0).contains(&ndc_x) || !(-1.0..=1.0).contains(&ndc_y) {
            return None;
        }
        let col = ((ndc_x + 1.0) / 2.0 * self.area.width as f64).floor() as u16;
        let row = ((1.0 - ndc_y) / 2.0 * self.area.height as f64).floor() as u16;
        if col >= self.area.width || row >= self.area.height {
            return None;
        }
        Some((self.area.x + col, self.area.y + row))
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.x
            && column < self.area.right()
            && row >= self.area.y
            && row < self.area.bottom()
    }
}
