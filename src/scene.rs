//! Entity store: one record per location bundling its marker and label.

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::coords::{surface_orientation, to_cartesian};
use crate::geo::Location;
use crate::label::{Label, LabelLayout};
use crate::satellite::Satellite;

pub const PLANET_RADIUS: f64 = 20.0;
/// Pin length; labels sit at the pin tip.
pub const MARKER_HEIGHT: f64 = 2.0;

/// Stable index of an entity, assigned at insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerState {
    #[default]
    Idle,
    Highlighted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    /// Surface point.
    pub position: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl PlacedMarker {
    pub fn place(location: &Location) -> Self {
        let position = to_cartesian(location.latitude, location.longitude, PLANET_RADIUS);
        let normal = position.normalize();
        Self {
            position,
            normal,
            orientation: surface_orientation(&normal),
        }
    }

    pub fn tip(&self) -> Vector3<f64> {
        self.position + self.orientation * Vector3::y() * MARKER_HEIGHT
    }

    pub fn point(&self) -> Point3<f64> {
        Point3::from(self.position)
    }
}

#[derive(Debug, Clone)]
pub struct GlobeEntity {
    pub id: EntityId,
    pub location: Location,
    pub marker: PlacedMarker,
    pub label: Label,
    pub state: MarkerState,
}

/// Click overlay showing a location name.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub entity: EntityId,
    pub text: String,
    pub position: Point3<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    entities: Vec<GlobeEntity>,
    layout: LabelLayout,
    pub satellite: Option<Satellite>,
    pub overlay: Option<TextOverlay>,
}

impl Scene {
    pub fn new(locations: Vec<Location>, layout: LabelLayout) -> Self {
        let mut scene = Self {
            entities: Vec::with_capacity(locations.len()),
            layout,
            satellite: None,
            overlay: None,
        };
        for location in locations {
            scene.insert(location);
        }
        scene
    }

    /// Add a location and re-run overlap resolution over every label.
    pub fn insert(&mut self, location: Location) -> EntityId {
        let id = EntityId(self.entities.len());
        let marker = PlacedMarker::place(&location);
        let label = Label::new(location.name.clone(), marker.tip());
        self.entities.push(GlobeEntity {
            id,
            location,
            marker,
            label,
            state: MarkerState::Idle,
        });

        let mut labels: Vec<&mut Label> = self.entities.iter_mut().map(|e| &mut e.label).collect();
        self.layout.resolve(&mut labels);
        id
    }

    pub fn entities(&self) -> &[GlobeEntity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [GlobeEntity] {
        &mut self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&GlobeEntity> {
        self.entities.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Displaced world position of an entity's label.
    pub fn label_position(&self, entity: &GlobeEntity) -> Vector3<f64> {
        self.layout.place(&entity.label)
    }

    /// Re-derive marker and label anchors from current longitudes. Overlap
    /// offsets are carried over untouched.
    pub fn refresh_placements(&mut self) {
        for entity in &mut self.entities {
            entity.marker = PlacedMarker::place(&entity.location);
            entity.label.anchor = entity.marker.tip();
        }
    }

    pub fn clear_highlights(&mut self) {
        for entity in &mut self.entities {
            entity.state = MarkerState::Idle;
        }
    }

    pub fn highlighted(&self) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|e| e.state == MarkerState::Highlighted)
            .map(|e| e.id)
    }
}
