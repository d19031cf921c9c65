//! Perspective framing math for one or two subjects of very different scale.
//!
//! Everything here is pure: the comparison rig in `comparison.rs` feeds it the current
//! subject sizes every frame and damps the camera toward the result.

use bevy::prelude::*;

/// Multiplier applied to [`required_distance`] so framed subjects never touch the viewport
/// edge.
pub const FRAMING_SAFETY: f32 = 1.15;

/// The two projection parameters framing depends on.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PerspectiveParams {
    pub vertical_fov_rad: f32,
    pub aspect:           f32,
}

impl PerspectiveParams {
    pub const fn new(vertical_fov_rad: f32, aspect: f32) -> Self {
        Self {
            vertical_fov_rad,
            aspect,
        }
    }

    pub const fn from_projection(projection: &PerspectiveProjection) -> Self {
        Self::new(projection.fov, projection.aspect_ratio)
    }
}

/// Half extents of the framed region, in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct Extents {
    pub half_width:  f32,
    pub half_height: f32,
}

impl Extents {
    pub const fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_width,
            half_height,
        }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            (other.half_width - self.half_width).mul_add(t, self.half_width),
            (other.half_height - self.half_height).mul_add(t, self.half_height),
        )
    }
}

/// Distance from the camera at which the given extents just fit the view.
///
/// Takes the larger of the vertical and horizontal requirements. Callers multiply by
/// [`FRAMING_SAFETY`].
pub fn required_distance(params: PerspectiveParams, half_width: f32, half_height: f32) -> f32 {
    let tan_half_fov = (params.vertical_fov_rad * 0.5).tan();
    let vertical = half_height / tan_half_fov;
    let horizontal = half_width / (params.aspect * tan_half_fov);
    vertical.max(horizontal)
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FramingTarget {
    pub radius:          f32,
    /// Room kept above the subject for its label.
    pub label_clearance: f32,
}

impl FramingTarget {
    pub const fn new(radius: f32, label_clearance: f32) -> Self {
        Self {
            radius,
            label_clearance,
        }
    }

    /// Target with the standard label clearance for its size.
    pub fn with_label(radius: f32) -> Self { Self::new(radius, label_clearance(radius)) }

    const fn vertical_extent(&self) -> f32 { self.radius + self.label_clearance }
}

/// One frame's worth of framing input. Rebuilt every frame; `blend` is derived from the
/// primary size and never animated on its own.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FramingScene {
    pub primary:    FramingTarget,
    pub secondary:  Option<FramingTarget>,
    /// Center-to-center distance between the two subjects.
    pub separation: f32,
    pub blend:      f32,
}

/// Extents of the primary alone, the pair side by side, interpolated by `scene.blend`.
///
/// Without a secondary subject the single-subject extents are returned regardless of blend.
pub fn scene_extents(scene: &FramingScene) -> Extents {
    let primary = scene.primary;
    let single = Extents::new(primary.radius, primary.vertical_extent());

    let Some(secondary) = scene.secondary else {
        return single;
    };

    let dual = Extents::new(
        (scene.separation + secondary.radius + primary.radius) * 0.5,
        primary.vertical_extent().max(secondary.vertical_extent()),
    );

    let blend = scene.blend.clamp(0.0, 1.0);
    if blend <= 0.0 {
        single
    } else if blend >= 1.0 {
        dual
    } else {
        single.lerp(dual, blend)
    }
}

/// Hermite smoothstep of `x` between `edge0` and `edge1`, clamped to [0, 1].
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * 2.0f32.mul_add(-t, 3.0)
}

/// How far framing has moved from "primary only" toward "both subjects".
pub fn size_blend(primary_radius: f32, low: f32, high: f32) -> f32 {
    smoothstep(low, high, primary_radius)
}

/// Fraction of the remaining distance to cover this frame for exponential approach at
/// `rate` per second. Frame-rate independent.
pub fn damping_factor(rate: f32, dt: f32) -> f32 {
    if rate <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate * dt).exp()
}

/// Space kept above a subject for its label.
pub fn label_clearance(radius: f32) -> f32 { 0.25f32.mul_add(radius, 0.15) }

/// Gap between the two subjects' surfaces.
pub fn gap_from_sizes(primary_radius: f32, secondary_radius: f32) -> f32 {
    (0.1 * (primary_radius + secondary_radius)).max(0.25)
}

/// Placement of the primary (at the origin) and the reference subject (on +X), plus the
/// framing parameters that go with it.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ComparisonLayout {
    pub primary:    FramingTarget,
    pub reference:  FramingTarget,
    pub separation: f32,
    pub blend:      f32,
    /// X coordinate the camera should focus on.
    pub focus_x:    f32,
}

impl ComparisonLayout {
    pub fn new(primary_radius: f32, reference_radius: f32, blend_low: f32, blend_high: f32) -> Self {
        let primary = FramingTarget::with_label(primary_radius);
        let reference = FramingTarget::with_label(reference_radius);
        let separation =
            primary_radius + reference_radius + gap_from_sizes(primary_radius, reference_radius);
        let blend = size_blend(primary_radius, blend_low, blend_high);
        let pair_center = (separation + reference_radius - primary_radius) * 0.5;

        Self {
            primary,
            reference,
            separation,
            blend,
            focus_x: pair_center * blend,
        }
    }

    pub const fn reference_position(&self) -> Vec3 { Vec3::new(self.separation, 0.0, 0.0) }

    pub const fn focus(&self) -> Vec3 { Vec3::new(self.focus_x, 0.0, 0.0) }

    pub const fn scene(&self) -> FramingScene {
        FramingScene {
            primary:    self.primary,
            secondary:  Some(self.reference),
            separation: self.separation,
            blend:      self.blend,
        }
    }

    /// Camera distance that fits this layout, safety margin included.
    pub fn fit_distance(&self, params: PerspectiveParams) -> f32 {
        let extents = scene_extents(&self.scene());
        required_distance(params, extents.half_width, extents.half_height) * FRAMING_SAFETY
    }
}

/// Near/far planes that keep a subject at `distance` well inside the depth range.
pub fn clip_planes(distance: f32) -> (f32, f32) {
    ((0.02 * distance).max(0.01), (10.0 * distance).max(2000.0))
}
