use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Margin, Rect};
use std::f64::consts::PI;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::camera::{Camera, Viewport};
use crate::config::Config;
use crate::geo;
use crate::label::LabelLayout;
use crate::picking::{PointerAction, PointerEvent, PointerResolver};
use crate::rotation::RotationDriver;
use crate::satellite::{self, HttpFeed, Satellite, SatelliteFix, ISS_ORBIT_RADIUS};
use crate::scene::Scene;
use crate::speech::CommandSpeaker;
use crate::stars::StarField;
use crate::ui::LabelAtlas;

const ZOOM_STEP: f64 = 1.1;
const STAR_SEED: u64 = 0x5eed;

pub struct App {
    pub should_quit: bool,
    pub scene: Scene,
    pub driver: RotationDriver,
    pub camera: Camera,
    pub stars: StarField,
    pub labels: LabelAtlas,
    pub resolver: PointerResolver,
    /// Globe drawing area inside the frame border.
    pub viewport: Rect,
    pub load_error: Option<String>,
    satellite_rx: Option<watch::Receiver<Option<SatelliteFix>>>,
    drag_from: Option<(u16, u16)>,
}

impl App {
    pub fn new(scene: Scene, driver: RotationDriver, resolver: PointerResolver, stars: StarField) -> Self {
        let labels = LabelAtlas::build(&scene);
        Self {
            should_quit: false,
            scene,
            driver,
            camera: Camera::default(),
            stars,
            labels,
            resolver,
            viewport: Rect::default(),
            load_error: None,
            satellite_rx: None,
            drag_from: None,
        }
    }

    /// Load locations and assemble the app. When loading fails the error is
    /// kept for the status bar, the driver stays idle and no tracker runs.
    pub async fn launch(config: &Config) -> (Self, Option<JoinHandle<()>>) {
        let (scene, load_error) = match geo::load_locations(&config.locations).await {
            Ok(locations) => (Scene::new(locations, LabelLayout::default()), None),
            Err(e) => {
                tracing::error!(source = %config.locations, error = %e, "error loading locations");
                (Scene::default(), Some(e.to_string()))
            }
        };

        let resolver = PointerResolver::new(
            config.pick_radius,
            Box::new(CommandSpeaker::new(config.speech_command.as_deref())),
        );
        let mut app = Self::new(
            scene,
            RotationDriver::new(config.rotation_step),
            resolver,
            StarField::new(config.stars, STAR_SEED),
        );
        if load_error.is_some() {
            app.load_error = load_error;
            return (app, None);
        }

        let mut tracker = None;
        if config.track_satellite {
            let (rx, handle) = satellite::spawn_tracker(
                HttpFeed::new(config.satellite_url.clone()),
                config.satellite_interval,
            );
            app.track_satellite(rx, ISS_ORBIT_RADIUS);
            tracker = Some(handle);
        }
        app.driver.start();
        (app, tracker)
    }

    /// Start following a satellite fed by `rx`, drawn at `radius`.
    pub fn track_satellite(&mut self, rx: watch::Receiver<Option<SatelliteFix>>, radius: f64) {
        self.scene.satellite = Some(Satellite::new(radius));
        self.satellite_rx = Some(rx);
    }

    /// Frame callback.
    pub fn tick(&mut self) {
        if let Some(rx) = self.satellite_rx.as_mut() {
            if rx.has_changed().unwrap_or(false) {
                let latest = *rx.borrow_and_update();
                if let (Some(fix), Some(satellite)) = (latest, self.scene.satellite.as_mut()) {
                    satellite.apply_fix(fix, self.driver.rotation().to_degrees());
                }
            }
        }
        self.driver.tick(&mut self.scene);
    }

    /// Terminal size in cells.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport = Rect::new(0, 0, width, height).inner(Margin {
            vertical: 1,
            horizontal: 1,
        });
        self.camera.set_surface(self.viewport.width, self.viewport.height);
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('+') => self.camera.zoom(1.0 / ZOOM_STEP),
            KeyCode::Char('-') => self.camera.zoom(ZOOM_STEP),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let action = match mouse.kind {
            MouseEventKind::Moved => PointerAction::Hover,
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_from = Some((mouse.column, mouse.row));
                PointerAction::Click
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.drag_from = None;
                PointerAction::Release
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.orbit_to(mouse.column, mouse.row);
                return;
            }
            MouseEventKind::ScrollUp => {
                self.camera.zoom(1.0 / ZOOM_STEP);
                return;
            }
            MouseEventKind::ScrollDown => {
                self.camera.zoom(ZOOM_STEP);
                return;
            }
            _ => return,
        };

        if !self.driver.is_running() {
            return;
        }
        let viewport = Viewport::new(self.viewport);
        if action != PointerAction::Release && !viewport.contains(mouse.column, mouse.row) {
            self.scene.clear_highlights();
            return;
        }
        self.resolver.resolve(
            &mut self.scene,
            &self.camera,
            &viewport,
            PointerEvent {
                column: mouse.column,
                row: mouse.row,
                action,
            },
        );
    }

    fn orbit_to(&mut self, column: u16, row: u16) {
        let Some((from_col, from_row)) = self.drag_from.replace((column, row)) else {
            return;
        };
        let width = self.viewport.width.max(1) as f64;
        let height = self.viewport.height.max(1) as f64;
        let dx = (column as f64 - from_col as f64) / width * 2.0 * PI;
        let dy = (row as f64 - from_row as f64) / height * PI;
        self.camera.orbit(dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Location;
    use crate::rotation::DriverState;
    use crate::scene::MarkerState;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let scene = Scene::new(
            vec![Location {
                name: "Equator".into(),
                latitude: 0.0,
                longitude: 90.5,
            }],
            LabelLayout::default(),
        );
        let resolver = PointerResolver::new(1.0, Box::new(CommandSpeaker::new(None)));
        let mut app = App::new(scene, RotationDriver::new(0.0), resolver, StarField::default());
        app.resize(162, 82);
        app.driver.start();
        app
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn resize_sets_inner_viewport() {
        let app = app();
        assert_eq!(app.viewport, Rect::new(1, 1, 160, 80));
        assert!((app.camera.aspect() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hover_then_click_then_release() {
        let mut app = app();
        // Longitude 90.5 with the 0.5 bias lands on +z, facing the camera.
        let (column, row) = marker_cell(&app);

        app.handle_event(mouse(MouseEventKind::Moved, column, row));
        assert_eq!(app.scene.entities()[0].state, MarkerState::Highlighted);

        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), column, row));
        assert_eq!(app.scene.overlay.as_ref().unwrap().text, "Equator");

        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), column, row));
        assert!(app.scene.overlay.is_none());

        app.handle_event(mouse(MouseEventKind::Moved, 1, 1));
        assert_eq!(app.scene.entities()[0].state, MarkerState::Idle);
    }

    fn marker_cell(app: &App) -> (u16, u16) {
        let (x, y) = app.camera.project(&app.scene.entities()[0].marker.point()).unwrap();
        Viewport::new(app.viewport).to_cell(x, y).unwrap()
    }

    #[test]
    fn leaving_the_viewport_drops_the_highlight() {
        let mut app = app();
        let (column, row) = marker_cell(&app);
        app.handle_event(mouse(MouseEventKind::Moved, column, row));
        assert_eq!(app.scene.highlighted(), Some(app.scene.entities()[0].id));

        // Frame border.
        app.handle_event(mouse(MouseEventKind::Moved, 0, 0));
        assert_eq!(app.scene.highlighted(), None);
    }

    #[tokio::test]
    async fn failed_load_leaves_globe_idle() {
        let config = Config {
            locations: "/nonexistent/terra-orbit/locations.json".into(),
            track_satellite: true,
            ..Config::default()
        };
        let (mut app, tracker) = App::launch(&config).await;
        assert!(tracker.is_none());
        assert!(app.load_error.is_some());
        assert!(app.scene.satellite.is_none());
        assert_eq!(app.driver.state(), DriverState::Idle);

        app.resize(162, 82);
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 81, 41));
        app.handle_event(mouse(MouseEventKind::Moved, 81, 41));
        app.tick();
        assert!(app.scene.overlay.is_none());
        assert_eq!(app.scene.highlighted(), None);
        assert_eq!(app.driver.frames(), 0);
        assert_eq!(app.driver.rotation(), 0.0);
    }

    #[test]
    fn new_fix_reaches_the_satellite_on_next_frame() {
        let mut app = app();
        let (tx, rx) = watch::channel(None);
        app.track_satellite(rx, ISS_ORBIT_RADIUS);
        app.tick();
        assert!(app.scene.satellite.as_ref().unwrap().fix().is_none());

        let fix = SatelliteFix {
            latitude: 51.6,
            longitude: -10.0,
        };
        tx.send(Some(fix)).unwrap();
        app.tick();
        assert_eq!(app.scene.satellite.as_ref().unwrap().fix(), Some(fix));
    }

    #[test]
    fn quit_key() {
        let mut app = app();
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(app.should_quit);
    }

    #[test]
    fn drag_orbits_the_camera() {
        let mut app = app();
        let before = app.camera.eye();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 10, 10));
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 50, 10));
        assert!((app.camera.eye() - before).norm() > 1.0);
        assert!((app.camera.eye().coords.norm() - app.camera.distance()).abs() < 1e-9);
    }
}
