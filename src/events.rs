//! Events exchanged with the host: requests it triggers and notifications it observes.

use bevy::prelude::*;

use crate::geodesy::GeoPoint;
use crate::tile_load::ReadyReason;

// ============================================================================
// Globe surface lifecycle
// ============================================================================

/// Opens a globe surface viewed through `camera_entity`. Ignored if the camera already has
/// one open.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct OpenGlobe {
    #[event_target]
    pub camera_entity: Entity,
}

/// Fired once the surface entity exists and the camera is linked to it.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct GlobeOpened {
    #[event_target]
    pub surface_entity: Entity,
    pub camera_entity:  Entity,
}

/// Tears a surface down. Listener, deadlines and marker go first, the surface last.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct CloseGlobe {
    #[event_target]
    pub surface_entity: Entity,
}

// ============================================================================
// Tile loading
// ============================================================================

/// Progress report forwarded by the host from its tile streamer.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct TileLoadProgress {
    #[event_target]
    pub surface_entity: Entity,
    pub pending:        u32,
}

/// Fired exactly once per opened surface.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct SurfaceReady {
    #[event_target]
    pub surface_entity: Entity,
    pub reason:         ReadyReason,
}

// ============================================================================
// Picking
// ============================================================================

/// Primary pick with a world-space ray, usually produced from a mouse click.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct PrimaryPick {
    #[event_target]
    pub surface_entity: Entity,
    pub ray:            Ray3d,
}

/// Removes the pick marker if there is one.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct ClearPick {
    #[event_target]
    pub surface_entity: Entity,
}

/// Fired after the marker has been placed at `point`.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct GlobePicked {
    #[event_target]
    pub surface_entity: Entity,
    pub point:          GeoPoint,
}

// ============================================================================
// Footprint flights
// ============================================================================

/// Builds a footprint on the surface and flies its camera there.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct ShowFootprint {
    #[event_target]
    pub surface_entity: Entity,
    pub center:         GeoPoint,
    pub radius_km:      f64,
}

/// Fired when a camera flight starts.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct FlightBegin {
    #[event_target]
    pub camera_entity: Entity,
}

/// Fired when a camera flight reaches its destination.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct FlightEnd {
    #[event_target]
    pub camera_entity: Entity,
}

// ============================================================================
// Trajectory
// ============================================================================

/// Arms (or re-arms) a projectile. Resets its progress.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct ArmTrajectory {
    #[event_target]
    pub projectile_entity: Entity,
    pub diameter_km:       f32,
    pub velocity_kms:      f32,
}

#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct DisarmTrajectory {
    #[event_target]
    pub projectile_entity: Entity,
}

/// Fired once per arming when the projectile reaches the end of its path.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct TrajectoryEnd {
    #[event_target]
    pub projectile_entity: Entity,
}
