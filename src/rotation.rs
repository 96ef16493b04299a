use std::f64::consts::TAU;

use crate::scene::Scene;

/// Clouds drift a little faster than the surface.
pub const CLOUD_RATE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

/// Advances planet rotation once per frame and keeps markers, labels and the
/// satellite registered against the turning surface.
#[derive(Debug, Clone)]
pub struct RotationDriver {
    state: DriverState,
    step: f64,
    rotation: f64,
    cloud_rotation: f64,
    frames: u64,
}

impl RotationDriver {
    /// `step` is the per-frame increment in radians.
    pub fn new(step: f64) -> Self {
        Self {
            state: DriverState::Idle,
            step,
            rotation: 0.0,
            cloud_rotation: 0.0,
            frames: 0,
        }
    }

    /// Idle -> Running. There is no way back.
    pub fn start(&mut self) {
        if self.state == DriverState::Idle {
            tracing::info!(step = self.step, "rotation started");
            self.state = DriverState::Running;
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    /// Planet rotation in radians, within [0, 2π).
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn cloud_rotation(&self) -> f64 {
        self.cloud_rotation
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// One frame. Does nothing while idle.
    pub fn tick(&mut self, scene: &mut Scene) {
        if self.state == DriverState::Idle {
            return;
        }
        self.frames = self.frames.wrapping_add(1);
        self.rotation = (self.rotation + self.step) % TAU;
        self.cloud_rotation = (self.cloud_rotation + self.step * CLOUD_RATE) % TAU;

        let degrees = self.step * 180.0 / std::f64::consts::PI;
        for entity in scene.entities_mut() {
            entity.location.longitude += degrees;
        }
        scene.refresh_placements();

        if let Some(satellite) = scene.satellite.as_mut() {
            satellite.advance(degrees);
        }
    }
}
