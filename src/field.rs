//! Data-driven scalar field graphs.
//!
//! A [`FieldNode`] tree describes a scene as composable stages (primitives,
//! terrain, creature populations, domain transforms, combinators). The tree is
//! validated once; evaluating it afterwards never allocates and never fails.

use std::sync::Arc;

use crate::{
    combinators::{
        intersection, smooth_intersection, smooth_min_exponential, smooth_subtraction,
        smooth_union, subtraction, union,
    },
    creature::{CreatureConfig, CreaturePopulation},
    domain::{mirror_x, repeat, repeat_limited, rotate_y, twist_y},
    error::{BackdropError, Result, ensure_finite, ensure_non_negative, ensure_positive},
    noise::Fbm,
    primitives::{capsule, ellipsoid, plane, rounded_box, sphere, torus},
    terrain::Terrain,
    types::{Point, Value, Vector},
};

/// Time-varying scalars a field may depend on.
///
/// A copy of the relevant [`Uniforms`](crate::uniforms::Uniforms), taken once
/// per evaluation so the field itself stays a pure function.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldContext {
    pub time: Value,
    pub sine_time: Value,
    pub shape_factor: Value,
    pub explode_intensity: Value,
}

/// Analytic shapes, positioned by their centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Sphere {
        center: Vector,
        radius: Value,
    },
    RoundedBox {
        center: Vector,
        half_extents: Vector,
        radius: Value,
    },
    Torus {
        center: Vector,
        major: Value,
        minor: Value,
    },
    Capsule {
        a: Vector,
        b: Vector,
        radius: Value,
    },
    Ellipsoid {
        center: Vector,
        radii: Vector,
    },
    Plane {
        height: Value,
    },
}

impl Primitive {
    #[inline]
    pub fn distance(&self, p: &Vector) -> Value {
        match self {
            Primitive::Sphere { center, radius } => sphere(&(p - center), *radius),
            Primitive::RoundedBox {
                center,
                half_extents,
                radius,
            } => rounded_box(&(p - center), half_extents, *radius),
            Primitive::Torus {
                center,
                major,
                minor,
            } => torus(&(p - center), *major, *minor),
            Primitive::Capsule { a, b, radius } => capsule(p, a, b, *radius),
            Primitive::Ellipsoid { center, radii } => ellipsoid(&(p - center), radii),
            Primitive::Plane { height } => plane(p, *height),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Primitive::Sphere { radius, .. } => ensure_non_negative("sphere.radius", *radius),
            Primitive::RoundedBox {
                half_extents,
                radius,
                ..
            } => {
                for axis in 0..3 {
                    ensure_positive("box.half_extents", half_extents[axis])?;
                }
                ensure_non_negative("box.radius", *radius)?;
                if *radius > half_extents.min() {
                    return Err(BackdropError::InvalidParameter {
                        name: "box.radius",
                        value: *radius,
                    });
                }
                Ok(())
            }
            Primitive::Torus { major, minor, .. } => {
                ensure_positive("torus.major", *major)?;
                ensure_positive("torus.minor", *minor)
            }
            Primitive::Capsule { radius, .. } => ensure_non_negative("capsule.radius", *radius),
            Primitive::Ellipsoid { radii, .. } => {
                for axis in 0..3 {
                    ensure_positive("ellipsoid.radii", radii[axis])?;
                }
                Ok(())
            }
            Primitive::Plane { height } => ensure_finite("plane.height", *height),
        }
    }
}

/// Binary operator folding two distance values into one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Combinator {
    Union,
    Intersection,
    /// Carves every following operand out of the first.
    Subtraction,
    SmoothUnion(Value),
    SmoothIntersection(Value),
    SmoothSubtraction(Value),
    SmoothMinExponential(Value),
}

impl Combinator {
    #[inline]
    pub fn apply(&self, a: Value, b: Value) -> Value {
        match *self {
            Combinator::Union => union(a, b),
            Combinator::Intersection => intersection(a, b),
            Combinator::Subtraction => subtraction(a, b),
            Combinator::SmoothUnion(k) => smooth_union(a, b, k),
            Combinator::SmoothIntersection(k) => smooth_intersection(a, b, k),
            Combinator::SmoothSubtraction(k) => smooth_subtraction(a, b, k),
            Combinator::SmoothMinExponential(k) => smooth_min_exponential(a, b, k),
        }
    }

    /// Blend radius of smooth operators, `None` for hard ones.
    pub fn blend_radius(&self) -> Option<Value> {
        match *self {
            Combinator::Union | Combinator::Intersection | Combinator::Subtraction => None,
            Combinator::SmoothUnion(k)
            | Combinator::SmoothIntersection(k)
            | Combinator::SmoothSubtraction(k)
            | Combinator::SmoothMinExponential(k) => Some(k),
        }
    }

    fn validate(&self) -> Result<()> {
        match self.blend_radius() {
            Some(radius) if !(radius.is_finite() && radius > 0.0) => {
                Err(BackdropError::InvalidBlendRadius {
                    context: "combinator",
                    radius,
                })
            }
            _ => Ok(()),
        }
    }
}

/// One stage of a field graph.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldNode {
    Primitive(Primitive),
    Terrain(Terrain),
    /// A single creature at the local origin, with a fixed outline phase.
    Creature { creature: CreatureConfig, phase: Value },
    Population(CreaturePopulation),
    /// Raw 3D fractal noise, centred on zero; mostly useful as an overlay.
    Noise(Fbm),
    Translate { offset: Vector, child: Box<FieldNode> },
    /// Translation by `velocity · time`.
    Drift { velocity: Vector, child: Box<FieldNode> },
    /// Rotation about `y` by `rate · time` radians.
    Spin { rate: Value, child: Box<FieldNode> },
    Twist { rate: Value, child: Box<FieldNode> },
    /// Uniform scale; the child's distance is rescaled so it stays a distance.
    Scale { factor: Value, child: Box<FieldNode> },
    Repeat { cell: Vector, child: Box<FieldNode> },
    /// Repetition clamped to `±limit` cells per axis.
    RepeatLimited {
        cell: Vector,
        limit: Vector,
        child: Box<FieldNode>,
    },
    /// Mirrors the child across the `x = 0` plane.
    Mirror(Box<FieldNode>),
    /// Adds 3D noise to the child's distance.
    Displace { noise: Fbm, child: Box<FieldNode> },
    /// Left fold of `children` with `op`.
    Combine { op: Combinator, children: Vec<FieldNode> },
    /// Plain sum of the children's values.
    ///
    /// Not a valid distance composition: the result over- or under-estimates
    /// the true distance, so marching it is a stylized approximation.
    Sum(Vec<FieldNode>),
}

impl FieldNode {
    pub fn sphere(radius: Value) -> Self {
        FieldNode::Primitive(Primitive::Sphere {
            center: Vector::zeros(),
            radius,
        })
    }

    pub fn rounded_box(half_extents: Vector, radius: Value) -> Self {
        FieldNode::Primitive(Primitive::RoundedBox {
            center: Vector::zeros(),
            half_extents,
            radius,
        })
    }

    pub fn plane(height: Value) -> Self {
        FieldNode::Primitive(Primitive::Plane { height })
    }

    pub fn translated(self, offset: Vector) -> Self {
        FieldNode::Translate {
            offset,
            child: Box::new(self),
        }
    }

    pub fn drifting(self, velocity: Vector) -> Self {
        FieldNode::Drift {
            velocity,
            child: Box::new(self),
        }
    }

    pub fn spinning(self, rate: Value) -> Self {
        FieldNode::Spin {
            rate,
            child: Box::new(self),
        }
    }

    pub fn scaled(self, factor: Value) -> Self {
        FieldNode::Scale {
            factor,
            child: Box::new(self),
        }
    }

    pub fn repeated(self, cell: Vector) -> Self {
        FieldNode::Repeat {
            cell,
            child: Box::new(self),
        }
    }

    pub fn repeated_limited(self, cell: Vector, limit: Vector) -> Self {
        FieldNode::RepeatLimited {
            cell,
            limit,
            child: Box::new(self),
        }
    }

    pub fn mirrored(self) -> Self {
        FieldNode::Mirror(Box::new(self))
    }

    pub fn displaced(self, noise: Fbm) -> Self {
        FieldNode::Displace {
            noise,
            child: Box::new(self),
        }
    }

    pub fn combine(self, op: Combinator, other: FieldNode) -> Self {
        match self {
            FieldNode::Combine {
                op: existing,
                mut children,
            } if existing == op => {
                children.push(other);
                FieldNode::Combine { op, children }
            }
            node => FieldNode::Combine {
                op,
                children: vec![node, other],
            },
        }
    }

    pub fn smooth_union(self, other: FieldNode, k: Value) -> Self {
        self.combine(Combinator::SmoothUnion(k), other)
    }

    /// Evaluates the graph at `p`.
    ///
    /// An empty combinator or sum evaluates to [`Value::MAX`] / `0`; validated
    /// graphs never contain one.
    pub fn distance(&self, p: &Vector, ctx: &FieldContext) -> Value {
        match self {
            FieldNode::Primitive(primitive) => primitive.distance(p),
            FieldNode::Terrain(terrain) => terrain.distance(p, ctx),
            FieldNode::Creature { creature, phase } => creature.distance(p, *phase, ctx),
            FieldNode::Population(population) => population.distance(p, ctx),
            FieldNode::Noise(noise) => noise.sample3(*p),
            FieldNode::Translate { offset, child } => child.distance(&(p - offset), ctx),
            FieldNode::Drift { velocity, child } => {
                child.distance(&(p - velocity * ctx.time), ctx)
            }
            FieldNode::Spin { rate, child } => child.distance(&rotate_y(p, -rate * ctx.time), ctx),
            FieldNode::Twist { rate, child } => child.distance(&twist_y(p, *rate), ctx),
            FieldNode::Scale { factor, child } => child.distance(&(p / *factor), ctx) * factor,
            FieldNode::Repeat { cell, child } => child.distance(&repeat(p, cell).local, ctx),
            FieldNode::RepeatLimited { cell, limit, child } => {
                child.distance(&repeat_limited(p, cell, limit).local, ctx)
            }
            FieldNode::Mirror(child) => child.distance(&mirror_x(p), ctx),
            FieldNode::Displace { noise, child } => child.distance(p, ctx) + noise.sample3(*p),
            FieldNode::Combine { op, children } => {
                let mut iter = children.iter();
                let Some(first) = iter.next() else {
                    return Value::MAX;
                };
                iter.fold(first.distance(p, ctx), |acc, child| {
                    op.apply(acc, child.distance(p, ctx))
                })
            }
            FieldNode::Sum(children) => children.iter().map(|child| child.distance(p, ctx)).sum(),
        }
    }

    /// Checks every constant in the graph.
    ///
    /// Returns [`BackdropError::InvalidBlendRadius`] for non-positive smooth
    /// blend radii and [`BackdropError::EmptyScene`] for childless combinators.
    pub fn validate(&self) -> Result<()> {
        match self {
            FieldNode::Primitive(primitive) => primitive.validate(),
            FieldNode::Terrain(terrain) => terrain.validate(),
            FieldNode::Creature { creature, phase } => {
                ensure_finite("creature.phase", *phase)?;
                creature.validate()
            }
            FieldNode::Population(population) => population.validate(),
            FieldNode::Noise(noise) => noise.validate(),
            FieldNode::Translate { offset, child }
            | FieldNode::Drift {
                velocity: offset,
                child,
            } => {
                for axis in 0..3 {
                    ensure_finite("offset", offset[axis])?;
                }
                child.validate()
            }
            FieldNode::Spin { rate, child } | FieldNode::Twist { rate, child } => {
                ensure_finite("rate", *rate)?;
                child.validate()
            }
            FieldNode::Scale { factor, child } => {
                ensure_positive("scale.factor", *factor)?;
                child.validate()
            }
            FieldNode::Repeat { cell, child } => {
                for axis in 0..3 {
                    ensure_non_negative("repeat.cell", cell[axis])?;
                }
                child.validate()
            }
            FieldNode::RepeatLimited { cell, limit, child } => {
                for axis in 0..3 {
                    ensure_non_negative("repeat.cell", cell[axis])?;
                    ensure_non_negative("repeat.limit", limit[axis])?;
                }
                child.validate()
            }
            FieldNode::Mirror(child) => child.validate(),
            FieldNode::Displace { noise, child } => {
                noise.validate()?;
                child.validate()
            }
            FieldNode::Combine { op, children } => {
                op.validate()?;
                if children.is_empty() {
                    return Err(BackdropError::EmptyScene);
                }
                children.iter().try_for_each(FieldNode::validate)
            }
            FieldNode::Sum(children) => {
                if children.is_empty() {
                    return Err(BackdropError::EmptyScene);
                }
                children.iter().try_for_each(FieldNode::validate)
            }
        }
    }

    /// Whether the graph contains a [`FieldNode::Sum`] anywhere.
    pub fn has_summed_fields(&self) -> bool {
        match self {
            FieldNode::Sum(_) => true,
            FieldNode::Translate { child, .. }
            | FieldNode::Drift { child, .. }
            | FieldNode::Spin { child, .. }
            | FieldNode::Twist { child, .. }
            | FieldNode::Scale { child, .. }
            | FieldNode::Repeat { child, .. }
            | FieldNode::RepeatLimited { child, .. }
            | FieldNode::Mirror(child)
            | FieldNode::Displace { child, .. } => child.has_summed_fields(),
            FieldNode::Combine { children, .. } => {
                children.iter().any(FieldNode::has_summed_fields)
            }
            _ => false,
        }
    }
}

/// A validated, shareable field graph.
///
/// Cloning is a reference-count bump, so render tasks can hold the field
/// without copying the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneField {
    root: Arc<FieldNode>,
}

impl SceneField {
    /// Validates `root` and wraps it.
    pub fn new(root: FieldNode) -> Result<Self> {
        root.validate()?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &FieldNode {
        &self.root
    }

    #[inline]
    pub fn sample(&self, p: Point, ctx: &FieldContext) -> Value {
        self.root.distance(&p.coords, ctx)
    }

    /// Freezes the context into a plain `Fn(Point) -> Value` for marching.
    #[inline]
    pub fn bind<'a>(&'a self, ctx: &'a FieldContext) -> impl Fn(Point) -> Value + 'a {
        move |p| self.sample(p, ctx)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn still() -> FieldContext {
        FieldContext::default()
    }

    #[test]
    fn should_translate_sphere() {
        let node = FieldNode::sphere(1.0).translated(Vector::new(0.0, 2.0, 0.0));
        assert_abs_diff_eq!(node.distance(&Vector::new(0.0, 2.0, 0.0), &still()), -1.0);
    }

    #[test]
    fn should_keep_distance_under_uniform_scale() {
        let node = FieldNode::sphere(1.0).scaled(2.0);
        assert_abs_diff_eq!(node.distance(&Vector::new(3.0, 0.0, 0.0), &still()), 1.0);
    }

    #[test]
    fn should_drift_with_time() {
        let node = FieldNode::sphere(0.5).drifting(Vector::new(1.0, 0.0, 0.0));
        let ctx = FieldContext {
            time: 2.0,
            ..still()
        };
        assert_abs_diff_eq!(node.distance(&Vector::new(2.0, 0.0, 0.0), &ctx), -0.5);
    }

    #[test]
    fn should_stop_repeating_past_the_limit() {
        let node = FieldNode::sphere(0.25)
            .repeated_limited(Vector::new(2.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(node.distance(&Vector::new(2.0, 0.0, 0.0), &still()), -0.25);
        assert_abs_diff_eq!(node.distance(&Vector::new(-2.0, 0.0, 0.0), &still()), -0.25);
        // Outermost copy sits at x = 2; nothing at x = 4.
        assert_abs_diff_eq!(node.distance(&Vector::new(4.0, 0.0, 0.0), &still()), 1.75);

        let negative = FieldNode::sphere(0.25)
            .repeated_limited(Vector::new(2.0, 0.0, 0.0), Vector::new(-1.0, 0.0, 0.0));
        assert!(negative.validate().is_err());
    }

    #[test]
    fn should_mirror_child_across_x() {
        let node = FieldNode::sphere(0.5)
            .translated(Vector::new(1.0, 0.0, 0.0))
            .mirrored();
        assert_abs_diff_eq!(node.distance(&Vector::new(-1.0, 0.0, 0.0), &still()), -0.5);
        assert_abs_diff_eq!(node.distance(&Vector::new(1.0, 0.0, 0.0), &still()), -0.5);
        assert!(!node.has_summed_fields());
    }

    #[test]
    fn should_fold_combinator_over_children() {
        let node = FieldNode::Combine {
            op: Combinator::Union,
            children: vec![
                FieldNode::plane(-1.0),
                FieldNode::sphere(0.5),
                FieldNode::sphere(0.25).translated(Vector::new(0.0, 0.0, 5.0)),
            ],
        };
        assert_abs_diff_eq!(node.distance(&Vector::new(0.0, 0.0, 0.0), &still()), -0.5);
        assert_abs_diff_eq!(node.distance(&Vector::new(0.0, 0.0, 5.0), &still()), -0.25);
    }

    #[test]
    fn should_append_to_matching_combine() {
        let node = FieldNode::sphere(1.0)
            .smooth_union(FieldNode::plane(0.0), 0.5)
            .smooth_union(FieldNode::sphere(2.0), 0.5);
        match node {
            FieldNode::Combine { children, .. } => assert_eq!(children.len(), 3),
            other => panic!("expected combine, got {other:?}"),
        }
    }

    #[test]
    fn should_sum_overlay_values() {
        let node = FieldNode::Sum(vec![FieldNode::plane(0.0), FieldNode::plane(1.0)]);
        assert_abs_diff_eq!(node.distance(&Vector::new(0.0, 2.0, 0.0), &still()), 3.0);
        assert!(node.has_summed_fields());
        assert!(!FieldNode::plane(0.0).has_summed_fields());
    }

    #[test]
    fn should_reject_non_positive_blend_radius() {
        let node = FieldNode::sphere(1.0).smooth_union(FieldNode::plane(0.0), 0.0);
        assert_eq!(
            node.validate(),
            Err(BackdropError::InvalidBlendRadius {
                context: "combinator",
                radius: 0.0
            })
        );
        let negative = FieldNode::sphere(1.0).smooth_union(FieldNode::plane(0.0), -0.3);
        assert!(SceneField::new(negative).is_err());
    }

    #[test]
    fn should_reject_empty_combine() {
        let node = FieldNode::Combine {
            op: Combinator::Union,
            children: Vec::new(),
        };
        assert_eq!(node.validate(), Err(BackdropError::EmptyScene));
        assert_eq!(node.distance(&Vector::zeros(), &still()), Value::MAX);
    }

    #[test]
    fn should_reject_box_rounding_larger_than_box() {
        let node = FieldNode::rounded_box(Vector::new(0.5, 0.5, 0.5), 0.75);
        assert!(node.validate().is_err());
    }

    #[test]
    fn should_sample_bound_field_at_point() {
        let field = SceneField::new(FieldNode::plane(0.0)).unwrap();
        let ctx = still();
        let f = field.bind(&ctx);
        assert_abs_diff_eq!(f(Point::new(0.0, 4.0, 0.0)), 4.0);
    }
}
