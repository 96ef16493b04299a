use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

const INNER_RADIUS: f64 = 300.0;
const OUTER_RADIUS: f64 = 500.0;

/// Background stars scattered on a thick shell far outside the camera's reach.
#[derive(Debug, Clone, Default)]
pub struct StarField {
    stars: Vec<(Point3<f64>, f64)>,
}

impl StarField {
    pub fn new(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let stars = (0..count)
            .map(|_| {
                // Uniform direction: uniform z and azimuth.
                let z: f64 = rng.gen_range(-1.0..1.0);
                let azimuth: f64 = rng.gen_range(0.0..TAU);
                let ring = (1.0 - z * z).sqrt();
                let dir = Vector3::new(ring * azimuth.cos(), ring * azimuth.sin(), z);
                let radius = rng.gen_range(INNER_RADIUS..OUTER_RADIUS);
                let brightness = rng.gen_range(0.3..1.0);
                (Point3::from(dir * radius), brightness)
            })
            .collect();
        Self { stars }
    }

    /// Star positions with brightness in [0.3, 1).
    pub fn iter(&self) -> impl Iterator<Item = &(Point3<f64>, f64)> {
        self.stars.iter()
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_sit_on_the_shell() {
        let field = StarField::new(64, 7);
        assert_eq!(field.len(), 64);
        for (p, brightness) in field.iter() {
            let r = p.coords.norm();
            assert!((INNER_RADIUS - 1e-9..OUTER_RADIUS + 1e-9).contains(&r));
            assert!((0.3..1.0).contains(brightness));
        }
    }

    #[test]
    fn same_seed_same_sky() {
        let a: Vec<_> = StarField::new(10, 42).iter().map(|s| s.0).collect();
        let b: Vec<_> = StarField::new(10, 42).iter().map(|s| s.0).collect();
        assert_eq!(a, b);
    }
}
