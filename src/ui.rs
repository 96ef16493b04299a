use nalgebra::{Point3, Vector3};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};
use crate::app::App;
use crate::camera::{Camera, Viewport};
use crate::coords::to_geographic;
use crate::globe::{self, SurfaceSample};
use crate::scene::{EntityId, MarkerState, Scene, PLANET_RADIUS};

const SKY_BLUE: Color = Color::Rgb(0, 170, 255);
const MARKER_IDLE: Color = Color::Rgb(255, 0, 0);
const MARKER_HIGHLIGHT: Color = Color::Rgb(0, 255, 0);
const SATELLITE: Color = Color::Rgb(255, 215, 0);
const LABEL_BG: Color = Color::Rgb(0, 0, 170);
const HUD_DIM: Color = Color::Rgb(80, 80, 100);
const HUD_TEXT: Color = Color::Rgb(180, 200, 220);
const HUD_BG: Color = Color::Rgb(4, 4, 12);

/// Halo extends this far past the planet radius.
const HALO_SCALE: f64 = 1.06;
/// Directional light position; only its direction matters.
const SUN: (f64, f64, f64) = (-20.0, 0.5, 1.5);

/// Prebuilt label lines, one per marker state, swapped by reference.
/// Indexed by entity id.
#[derive(Debug, Default)]
pub struct LabelAtlas {
    lines: Vec<[Line<'static>; 2]>,
}

impl LabelAtlas {
    pub fn build(scene: &Scene) -> Self {
        let lines = scene
            .entities()
            .iter()
            .map(|e| {
                let text = format!(" {} ", e.label.text);
                let idle = Line::from(Span::styled(
                    text.clone(),
                    Style::default().fg(Color::White).bg(LABEL_BG),
                ));
                let highlighted = Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(Color::Black)
                        .bg(MARKER_HIGHLIGHT)
                        .add_modifier(Modifier::BOLD),
                ));
                [idle, highlighted]
            })
            .collect();
        Self { lines }
    }

    pub fn get(&self, id: EntityId, state: MarkerState) -> Option<&Line<'static>> {
        let slot = match state {
            MarkerState::Idle => 0,
            MarkerState::Highlighted => 1,
        };
        self.lines.get(id.0).map(|pair| &pair[slot])
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

fn project_cell(camera: &Camera, viewport: &Viewport, world: &Point3<f64>) -> Option<(u16, u16)> {
    let (x, y) = camera.project(world)?;
    viewport.to_cell(x, y)
}

pub struct GlobeWidget<'a> {
    pub app: &'a App,
}

impl GlobeWidget<'_> {
    fn render_stars(&self, viewport: &Viewport, buf: &mut Buffer) {
        for (star, brightness) in self.app.stars.iter() {
            if let Some((x, y)) = project_cell(&self.app.camera, viewport, star) {
                let level = (brightness * 200.0) as u8;
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(if *brightness > 0.8 { '✦' } else { '·' })
                        .set_fg(Color::Rgb(level, level, level));
                }
            }
        }
    }

    fn render_planet(&self, viewport: &Viewport, buf: &mut Buffer) {
        let camera = &self.app.camera;
        let origin = Point3::origin();
        let sun = Vector3::new(SUN.0, SUN.1, SUN.2).normalize();
        let rotation_deg = self.app.driver.rotation().to_degrees();
        let cloud_deg = self.app.driver.cloud_rotation().to_degrees();
        let area = viewport.area;

        for row in area.top()..area.bottom() {
            for col in area.left()..area.right() {
                let (nx, ny) = viewport.to_ndc(col, row);
                let ray = camera.ray_through(nx, ny);

                let Some(t) = ray.intersect_sphere(&origin, PLANET_RADIUS) else {
                    let miss = ray.closest_approach(&origin);
                    if miss < PLANET_RADIUS * HALO_SCALE {
                        let gap = (miss - PLANET_RADIUS) / (PLANET_RADIUS * (HALO_SCALE - 1.0));
                        if let Some(cell) = buf.cell_mut((col, row)) {
                            cell.set_char('░').set_fg(globe::halo(gap));
                        }
                    }
                    continue;
                };

                let hit = ray.at(t).coords;
                let normal = hit / PLANET_RADIUS;
                let (lat, lon) = to_geographic(&hit);
                let sample = SurfaceSample {
                    // Texture coordinates turn with the mesh.
                    is_land: globe::is_land(lat, lon - rotation_deg),
                    intensity: normal.dot(&sun),
                    cloud: globe::cloud_cover(lat, lon - cloud_deg),
                    facing: normal.dot(&-ray.direction),
                };
                let (glyph, color) = globe::shade(sample);
                if let Some(cell) = buf.cell_mut((col, row)) {
                    cell.set_char(glyph).set_fg(color);
                }
            }
        }
    }

    fn render_markers(&self, viewport: &Viewport, buf: &mut Buffer) {
        let camera = &self.app.camera;
        let scene = &self.app.scene;

        for entity in scene.entities() {
            let base = entity.marker.point();
            if !camera.faces(&base, &entity.marker.normal) {
                continue;
            }
            let (glyph, color) = match entity.state {
                MarkerState::Idle => ('●', MARKER_IDLE),
                MarkerState::Highlighted => ('◉', MARKER_HIGHLIGHT),
            };
            if let Some((x, y)) = project_cell(camera, viewport, &base) {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(glyph).set_fg(color);
                }
            }

            let label_at = Point3::from(scene.label_position(entity));
            let Some(line) = self.app.labels.get(entity.id, entity.state) else {
                continue;
            };
            if let Some((x, y)) = project_cell(camera, viewport, &label_at) {
                let width = line.width() as u16;
                let left = x.saturating_sub(width / 2).max(viewport.area.left());
                let room = viewport.area.right().saturating_sub(left);
                buf.set_line(left, y, line, room);
            }
        }
    }

    fn render_satellite(&self, viewport: &Viewport, buf: &mut Buffer) {
        let Some(position) = self.app.scene.satellite.as_ref().and_then(|s| s.position()) else {
            return;
        };
        let point = Point3::from(position);
        // Hidden behind the planet?
        let eye = self.app.camera.eye();
        let to_sat = crate::camera::Ray::new(eye, point - eye);
        if let Some(t) = to_sat.intersect_sphere(&Point3::origin(), PLANET_RADIUS) {
            if t < (point - eye).norm() {
                return;
            }
        }
        if let Some((x, y)) = project_cell(&self.app.camera, viewport, &point) {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char('✈')
                    .set_fg(SATELLITE)
                    .set_style(Style::default().add_modifier(Modifier::BOLD));
            }
        }
    }
}

impl Widget for GlobeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = area.inner(ratatui::layout::Margin {
            vertical: 1,
            horizontal: 1,
        });
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        let viewport = Viewport::new(inner);

        self.render_stars(&viewport, buf);
        if self.app.driver.is_running() {
            self.render_planet(&viewport, buf);
            self.render_markers(&viewport, buf);
            self.render_satellite(&viewport, buf);
        }
    }
}

pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    let title = Line::from(vec![
        Span::styled("╡ ", Style::default().fg(HUD_DIM)),
        Span::styled(
            "TERRA-ORBIT",
            Style::default().fg(SKY_BLUE).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ╞", Style::default().fg(HUD_DIM)),
    ]);

    let block = Block::default()
        .title_top(title)
        .title_bottom(status_line(app))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SKY_BLUE))
        .style(Style::default().bg(HUD_BG));
    f.render_widget(block, area);

    f.render_widget(GlobeWidget { app }, area);

    render_overlay(f, app);
    render_keybind_footer(f);
}

fn status_line(app: &App) -> Line<'static> {
    let mut spans = vec![Span::styled("╡ ", Style::default().fg(HUD_DIM))];

    if let Some(err) = &app.load_error {
        spans.push(Span::styled(
            format!("LOCATIONS UNAVAILABLE: {err} "),
            Style::default().fg(MARKER_IDLE),
        ));
    } else {
        spans.push(Span::styled(
            format!("SITES: {} ", app.scene.len()),
            Style::default().fg(HUD_TEXT),
        ));
        spans.push(Span::styled("│ ", Style::default().fg(HUD_DIM)));
        spans.push(Span::styled(
            format!("ROT {:>6.2}° ", app.driver.rotation().to_degrees()),
            Style::default().fg(HUD_TEXT),
        ));
        spans.push(Span::styled("│ ", Style::default().fg(HUD_DIM)));
        let iss = match app.scene.satellite.as_ref().map(|s| s.fix()) {
            None => Span::styled("ISS OFF ", Style::default().fg(HUD_DIM)),
            Some(None) => Span::styled("ISS ACQUIRING ", Style::default().fg(SATELLITE)),
            Some(Some(fix)) => Span::styled(
                format!("ISS {:+.2} {:+.2} ", fix.latitude, fix.longitude),
                Style::default().fg(SATELLITE),
            ),
        };
        spans.push(iss);
        if let Some(entity) = app.scene.highlighted().and_then(|id| app.scene.entity(id)) {
            spans.push(Span::styled("│ ", Style::default().fg(HUD_DIM)));
            spans.push(Span::styled(
                format!("{} ", entity.location.name),
                Style::default().fg(MARKER_HIGHLIGHT),
            ));
        }
    }
    spans.push(Span::styled("╞", Style::default().fg(HUD_DIM)));
    Line::from(spans)
}

fn render_overlay(f: &mut Frame, app: &App) {
    let Some(overlay) = &app.scene.overlay else {
        return;
    };
    let viewport = Viewport::new(app.viewport);
    let Some((x, y)) = project_cell(&app.camera, &viewport, &overlay.position) else {
        return;
    };

    let width = (overlay.text.chars().count() as u16 + 4).min(viewport.area.width);
    let height = 3u16.min(viewport.area.height);
    let left = x
        .saturating_sub(width / 2)
        .clamp(viewport.area.left(), viewport.area.right().saturating_sub(width));
    let top = y
        .saturating_sub(height / 2)
        .clamp(viewport.area.top(), viewport.area.bottom().saturating_sub(height));
    let overlay_area = Rect::new(left, top, width, height);

    let widget = Paragraph::new(Line::from(Span::styled(
        overlay.text.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )))
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    )
    .style(Style::default().bg(LABEL_BG));

    f.render_widget(Clear, overlay_area);
    f.render_widget(widget, overlay_area);
}

fn render_keybind_footer(f: &mut Frame) {
    let area = f.area();

    let legend = Line::from(vec![
        Span::styled(" [", Style::default().fg(HUD_DIM)),
        Span::styled("Q", Style::default().fg(SATELLITE)),
        Span::styled("]uit  [", Style::default().fg(HUD_DIM)),
        Span::styled("Click", Style::default().fg(SATELLITE)),
        Span::styled("]Select  [", Style::default().fg(HUD_DIM)),
        Span::styled("Drag", Style::default().fg(SATELLITE)),
        Span::styled("]Orbit  [", Style::default().fg(HUD_DIM)),
        Span::styled("Scroll", Style::default().fg(SATELLITE)),
        Span::styled("]Zoom", Style::default().fg(HUD_DIM)),
    ]);

    let footer_area = Rect {
        x: area.x + 1,
        y: area.bottom().saturating_sub(2),
        width: area.width.saturating_sub(2),
        height: 1,
    };

    f.render_widget(Paragraph::new(legend), footer_area);
}
