//! Label placement and overlap resolution.
//!
//! Overlap offsets are decided when labels are inserted and then carried
//! forward unchanged; per-frame placement only re-applies them.

use nalgebra::{Unit, Vector3};

/// World-space size of a label.
pub const LABEL_EXTENT: f64 = 5.0;

/// Overlap state of a single label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlap {
    /// Not yet seen by a resolution pass.
    Pending,
    /// Defaulted to no displacement.
    Clear,
    /// Displaced along the overlap axis. Never overwritten once set.
    Shifted(f64),
}

impl Overlap {
    pub fn offset(self) -> f64 {
        match self {
            Overlap::Shifted(offset) => offset,
            Overlap::Pending | Overlap::Clear => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    /// Undisplaced position.
    pub anchor: Vector3<f64>,
    pub overlap: Overlap,
}

impl Label {
    pub fn new(text: impl Into<String>, anchor: Vector3<f64>) -> Self {
        Self {
            text: text.into(),
            anchor,
            overlap: Overlap::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LabelLayout {
    pub extent: f64,
    pub axis: Unit<Vector3<f64>>,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            extent: LABEL_EXTENT,
            axis: Vector3::y_axis(),
        }
    }
}

impl LabelLayout {
    /// Anchors closer than this are overlapping.
    pub fn threshold(&self) -> f64 {
        self.extent / 2.0
    }

    /// Displacement applied to each label of an overlapping pair.
    pub fn offset(&self) -> f64 {
        self.extent / 2.0
    }

    /// Displaced position of a label.
    pub fn place(&self, label: &Label) -> Vector3<f64> {
        label.anchor + self.axis.into_inner() * label.overlap.offset()
    }

    /// Scan every pair in order. The earlier label of an overlapping pair is
    /// shifted by `+offset`, the later by `-offset`, unless already shifted.
    /// Labels left `Pending` afterwards are defaulted to `Clear`.
    ///
    /// First pairing wins: a label caught in a second pair keeps its first
    /// shift, so dense clusters can still overlap after resolution.
    ///
    /// Returns the number of overlapping pairs seen.
    pub fn resolve(&self, labels: &mut [&mut Label]) -> usize {
        let threshold = self.threshold();
        let offset = self.offset();
        let mut pairs = 0;

        for i in 0..labels.len() {
            for j in (i + 1)..labels.len() {
                let distance = (labels[i].anchor - labels[j].anchor).norm();
                if distance >= threshold {
                    continue;
                }
                pairs += 1;
                tracing::debug!(
                    first = %labels[i].text,
                    second = %labels[j].text,
                    distance,
                    "labels overlap"
                );
                shift_unless_set(&mut *labels[i], offset);
                shift_unless_set(&mut *labels[j], -offset);
            }
        }

        for label in labels.iter_mut() {
            if label.overlap == Overlap::Pending {
                label.overlap = Overlap::Clear;
            }
        }
        pairs
    }
}

fn shift_unless_set(label: &mut Label, offset: f64) {
    if !matches!(label.overlap, Overlap::Shifted(_)) {
        label.overlap = Overlap::Shifted(offset);
    }
}
