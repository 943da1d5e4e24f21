//! Builds one evaluable field per scene variant from a declarative description.
//!
//! ```text
//! terrain[0] ∪ terrain[1] ∪ …            (hard union)
//!        │
//!        ├── blend ── population[0]      (smooth union, per-variant radius)
//!        ├── blend ── population[1]
//!        ├── blend ── prop[0] …
//!        │
//!        + overlay[0] + overlay[1] …     (plain sum, stylized)
//! ```

use crate::{
    creature::CreaturePopulation,
    error::{BackdropError, Result},
    field::{Combinator, FieldNode, SceneField},
    terrain::Terrain,
    types::Value,
};

/// How a scene's layers are merged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlendMode {
    /// [`smooth_union`](crate::combinators::smooth_union): exact `min` outside the blend band.
    Polynomial,
    /// [`smooth_min_exponential`](crate::combinators::smooth_min_exponential): softer, blends everywhere.
    Exponential,
}

/// Blend operator and radius used between terrain, creatures and props.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blend {
    pub mode: BlendMode,
    pub radius: Value,
}

impl Blend {
    pub fn smooth(radius: Value) -> Self {
        Self {
            mode: BlendMode::Polynomial,
            radius,
        }
    }

    pub fn exponential(radius: Value) -> Self {
        Self {
            mode: BlendMode::Exponential,
            radius,
        }
    }

    fn combinator(&self) -> Combinator {
        match self.mode {
            BlendMode::Polynomial => Combinator::SmoothUnion(self.radius),
            BlendMode::Exponential => Combinator::SmoothMinExponential(self.radius),
        }
    }
}

/// Declarative description of a scene's geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneDescription {
    pub terrain: Vec<Terrain>,
    pub populations: Vec<CreaturePopulation>,
    /// Free-standing shapes blended like populations.
    pub props: Vec<FieldNode>,
    pub blend: Blend,
    /// Fields added to the blended distance.
    ///
    /// The sum is not a distance any more; marching it over- or
    /// under-shoots the true surface, which is part of the intended look.
    pub overlays: Vec<FieldNode>,
}

impl SceneDescription {
    pub fn new(blend: Blend) -> Self {
        Self {
            terrain: Vec::new(),
            populations: Vec::new(),
            props: Vec::new(),
            blend,
            overlays: Vec::new(),
        }
    }

    pub fn with_terrain(mut self, terrain: Terrain) -> Self {
        self.terrain.push(terrain);
        self
    }

    pub fn with_population(mut self, population: CreaturePopulation) -> Self {
        self.populations.push(population);
        self
    }

    pub fn with_prop(mut self, prop: FieldNode) -> Self {
        self.props.push(prop);
        self
    }

    pub fn with_overlay(mut self, overlay: FieldNode) -> Self {
        self.overlays.push(overlay);
        self
    }

    fn is_empty(&self) -> bool {
        self.terrain.is_empty() && self.populations.is_empty() && self.props.is_empty()
    }
}

/// Turns [`SceneDescription`]s into validated [`SceneField`]s.
#[derive(Debug, Default)]
pub struct SceneComposer;

impl SceneComposer {
    /// Assembles the field graph of `description` and validates it.
    ///
    /// Returns [`BackdropError::InvalidBlendRadius`] for a non-positive blend
    /// radius (even when there is only one layer to blend) and
    /// [`BackdropError::EmptyScene`] when there is no geometry at all.
    pub fn compose(description: &SceneDescription) -> Result<SceneField> {
        let radius = description.blend.radius;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(BackdropError::InvalidBlendRadius {
                context: "scene blend",
                radius,
            });
        }
        if description.is_empty() {
            return Err(BackdropError::EmptyScene);
        }

        let mut layers: Vec<FieldNode> = Vec::new();
        match description.terrain.len() {
            0 => {}
            1 => layers.push(FieldNode::Terrain(description.terrain[0].clone())),
            _ => layers.push(FieldNode::Combine {
                op: Combinator::Union,
                children: description
                    .terrain
                    .iter()
                    .cloned()
                    .map(FieldNode::Terrain)
                    .collect(),
            }),
        }
        layers.extend(
            description
                .populations
                .iter()
                .copied()
                .map(FieldNode::Population),
        );
        layers.extend(description.props.iter().cloned());

        let blended = if layers.len() == 1 {
            layers.remove(0)
        } else {
            FieldNode::Combine {
                op: description.blend.combinator(),
                children: layers,
            }
        };

        let root = if description.overlays.is_empty() {
            blended
        } else {
            let mut terms = Vec::with_capacity(description.overlays.len() + 1);
            terms.push(blended);
            terms.extend(description.overlays.iter().cloned());
            FieldNode::Sum(terms)
        };

        SceneField::new(root)
    }
}
