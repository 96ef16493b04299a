//! Pointer hit testing against location markers.
//!
//! Selection is recomputed from scratch on every pointer event; only the
//! marker colours and the click overlay persist.

use nalgebra::{center, Point3};

use crate::camera::{Camera, Ray, Viewport};
use crate::scene::{EntityId, MarkerState, Scene, TextOverlay};
use crate::speech::Speaker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Hover,
    Click,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub column: u16,
    pub row: u16,
    pub action: PointerAction,
}

pub struct PointerResolver {
    /// Radius of each marker's hit sphere.
    pub pick_radius: f64,
    speaker: Box<dyn Speaker>,
}

impl PointerResolver {
    pub fn new(pick_radius: f64, speaker: Box<dyn Speaker>) -> Self {
        Self {
            pick_radius,
            speaker,
        }
    }

    /// Test markers one by one in id order; the first hit wins.
    pub fn pick(&self, scene: &Scene, ray: &Ray) -> Option<EntityId> {
        scene
            .entities()
            .iter()
            .find(|e| ray.intersect_sphere(&e.marker.point(), self.pick_radius).is_some())
            .map(|e| e.id)
    }

    pub fn resolve(
        &self,
        scene: &mut Scene,
        camera: &Camera,
        viewport: &Viewport,
        event: PointerEvent,
    ) -> Option<EntityId> {
        let (x, y) = viewport.to_ndc(event.column, event.row);
        let ray = camera.ray_through(x, y);
        self.resolve_ray(scene, &camera.eye(), &ray, event.action)
    }

    /// Apply a pointer action along an explicit ray cast from `eye`.
    pub fn resolve_ray(
        &self,
        scene: &mut Scene,
        eye: &Point3<f64>,
        ray: &Ray,
        action: PointerAction,
    ) -> Option<EntityId> {
        let click = match action {
            PointerAction::Release => {
                self.release(scene);
                return None;
            }
            PointerAction::Hover => false,
            PointerAction::Click => true,
        };

        let hit = self.pick(scene, ray);
        for entity in scene.entities_mut() {
            entity.state = if Some(entity.id) == hit {
                MarkerState::Highlighted
            } else {
                MarkerState::Idle
            };
        }

        let id = hit?;
        if !click {
            tracing::debug!(entity = id.0, "pointer over location");
            return Some(id);
        }

        let entity = scene.entity(id)?;
        let name = entity.location.name.clone();
        let position = center(eye, &entity.marker.point());
        tracing::info!(entity = id.0, name = %name, "location selected");
        self.speaker.speak(&name);
        scene.overlay = Some(TextOverlay {
            entity: id,
            text: name,
            position,
        });
        Some(id)
    }

    fn release(&self, scene: &mut Scene) {
        if scene.overlay.take().is_some() {
            tracing::debug!("overlay cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Location;
    use crate::label::LabelLayout;
    use approx::assert_relative_eq;
    use ratatui::layout::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Speaker for Recorder {
        fn speak(&self, text: &str) {
            self.0.borrow_mut().push(text.to_string());
        }
    }

    fn scene() -> Scene {
        let loc = |name: &str, latitude: f64, longitude: f64| Location {
            name: name.to_string(),
            latitude,
            longitude,
        };
        Scene::new(
            vec![
                loc("Accra", 5.6, -0.2),
                loc("Berlin", 52.5, 13.4),
                loc("Chennai", 13.1, 80.3),
            ],
            LabelLayout::default(),
        )
    }

    fn ray_at(scene: &Scene, k: usize, eye: Point3<f64>) -> Ray {
        Ray::new(eye, scene.entities()[k].marker.point() - eye)
    }

    fn states(scene: &Scene) -> Vec<MarkerState> {
        scene.entities().iter().map(|e| e.state).collect()
    }

    #[test]
    fn hover_highlights_only_the_hit_marker() {
        let mut scene = scene();
        let resolver = PointerResolver::new(1.0, Box::new(Recorder::default()));
        let eye = Point3::new(0.0, 40.0, 0.0);
        for e in scene.entities_mut() {
            e.state = MarkerState::Highlighted;
        }

        let ray = ray_at(&scene, 1, eye);

        let hit = resolver.resolve_ray(&mut scene, &eye, &ray, PointerAction::Hover);
        assert_eq!(hit, Some(EntityId(1)));
        assert_eq!(
            states(&scene),
            vec![MarkerState::Idle, MarkerState::Highlighted, MarkerState::Idle]
        );
        assert!(scene.overlay.is_none());
    }

    #[test]
    fn miss_resets_everything() {
        let mut scene = scene();
        let resolver = PointerResolver::new(1.0, Box::new(Recorder::default()));
        scene.entities_mut()[2].state = MarkerState::Highlighted;
        let eye = Point3::new(0.0, 0.0, 40.0);
        let away = Ray::new(eye, nalgebra::Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(resolver.resolve_ray(&mut scene, &eye, &away, PointerAction::Hover), None);
        assert!(states(&scene).iter().all(|s| *s == MarkerState::Idle));
    }

    #[test]
    fn lowest_index_wins_when_markers_overlap() {
        let mut scene = scene();
        let resolver = PointerResolver::new(200.0, Box::new(Recorder::default()));
        let eye = Point3::new(0.0, 0.0, 40.0);
        let ray = ray_at(&scene, 2, eye);
        let hit = resolver.resolve_ray(&mut scene, &eye, &ray, PointerAction::Hover);
        assert_eq!(hit, Some(EntityId(0)));
    }

    #[test]
    fn click_speaks_and_release_clears_overlay() {
        let mut scene = scene();
        let recorder = Recorder::default();
        let resolver = PointerResolver::new(1.0, Box::new(recorder.clone()));
        let eye = Point3::new(0.0, 40.0, 0.0);

        let ray = ray_at(&scene, 1, eye);

        let hit = resolver.resolve_ray(&mut scene, &eye, &ray, PointerAction::Click);
        assert_eq!(hit, Some(EntityId(1)));
        assert_eq!(*recorder.0.borrow(), vec!["Berlin".to_string()]);

        let overlay = scene.overlay.clone().unwrap();
        assert_eq!(overlay.text, "Berlin");
        let marker = scene.entities()[1].marker.point();
        assert_relative_eq!(overlay.position, center(&eye, &marker), epsilon = 1e-9);

        let ray = ray_at(&scene, 1, eye);

        resolver.resolve_ray(&mut scene, &eye, &ray, PointerAction::Release);
        assert!(scene.overlay.is_none());
        // Release leaves colours alone.
        assert_eq!(scene.highlighted(), Some(EntityId(1)));
    }

    #[test]
    fn screen_pointer_hits_marker_under_it() {
        let mut scene = scene();
        let resolver = PointerResolver::new(1.0, Box::new(Recorder::default()));
        let mut camera = Camera::new(1.0);
        let viewport = Viewport::new(Rect::new(0, 0, 160, 80));
        camera.set_surface(160, 80);

        let target = scene.entities()[0].marker.point();
        let (x, y) = camera.project(&target).unwrap();
        let (column, row) = viewport.to_cell(x, y).unwrap();
        let hit = resolver.resolve(
            &mut scene,
            &camera,
            &viewport,
            PointerEvent {
                column,
                row,
                action: PointerAction::Hover,
            },
        );
        assert_eq!(hit, Some(EntityId(0)));
    }

    #[test]
    fn screen_release_clears_overlay_and_keeps_colours() {
        let mut scene = scene();
        let resolver = PointerResolver::new(1.0, Box::new(Recorder::default()));
        let mut camera = Camera::new(1.0);
        let viewport = Viewport::new(Rect::new(0, 0, 160, 80));
        camera.set_surface(160, 80);

        let (x, y) = camera.project(&scene.entities()[0].marker.point()).unwrap();
        let (column, row) = viewport.to_cell(x, y).unwrap();
        let event = |action| PointerEvent { column, row, action };

        assert_eq!(
            resolver.resolve(&mut scene, &camera, &viewport, event(PointerAction::Click)),
            Some(EntityId(0))
        );
        assert!(scene.overlay.is_some());

        assert_eq!(
            resolver.resolve(&mut scene, &camera, &viewport, event(PointerAction::Release)),
            None
        );
        assert!(scene.overlay.is_none());
        assert_eq!(scene.highlighted(), Some(EntityId(0)));
    }
}
