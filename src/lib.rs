// bevy_impact_globe
// Geometry and camera control for an impact visualization:
// - Geodetic math, footprint polygons and globe picking
// - Basemap load completion with fallback deadlines
// - Comparison framing, projectile fly-in and chase camera

use bevy::prelude::*;
use bevy::window::RequestRedraw;

mod chase;
mod comparison;
mod components;
mod events;
mod flight;
mod footprint;
mod framing;
mod geodesy;
mod picking;
pub mod prelude;
mod smoothness;
mod surface;
mod tile_load;
mod trajectory;
#[cfg(feature = "visualization")]
mod visualization;

// Public API - Events
pub use events::ArmTrajectory;
pub use events::ClearPick;
pub use events::CloseGlobe;
pub use events::DisarmTrajectory;
pub use events::FlightBegin;
pub use events::FlightEnd;
pub use events::GlobeOpened;
pub use events::GlobePicked;
pub use events::OpenGlobe;
pub use events::PrimaryPick;
pub use events::ShowFootprint;
pub use events::SurfaceReady;
pub use events::TileLoadProgress;
pub use events::TrajectoryEnd;

// Public API - Geodesy
pub use geodesy::EARTH_MEAN_RADIUS_KM;
pub use geodesy::Ellipsoid;
pub use geodesy::GeoPoint;
pub use geodesy::destination_point;
pub use geodesy::ecef_to_scene;
pub use geodesy::great_circle_distance_km;
pub use geodesy::initial_bearing_rad;
pub use geodesy::normalize_longitude_deg;
pub use geodesy::scene_to_ecef;
pub use geodesy::screen_ray_to_surface_point;

// Public API - Footprints
pub use footprint::DEFAULT_SEGMENTS;
pub use footprint::Feature;
pub use footprint::FeatureCollection;
pub use footprint::FootprintError;
pub use footprint::FootprintSpec;
pub use footprint::Geometry;
pub use footprint::ImpactMetrics;
pub use footprint::build_footprint;

// Public API - Framing
pub use framing::ComparisonLayout;
pub use framing::Extents;
pub use framing::FRAMING_SAFETY;
pub use framing::FramingScene;
pub use framing::FramingTarget;
pub use framing::PerspectiveParams;
pub use framing::damping_factor;
pub use framing::required_distance;
pub use framing::scene_extents;
pub use framing::size_blend;

// Public API - Flights
pub use flight::FlightPlan;
pub use flight::footprint_view;

// Public API - Components
pub use chase::ChaseCamera;
pub use comparison::ComparisonRig;
pub use comparison::ComparisonSubject;
pub use comparison::Spin;
pub use comparison::SubjectRole;
pub use components::FootprintOverlay;
pub use components::GlobeMarker;
pub use components::GlobeSurfaceLink;
pub use components::MarkerSlot;
pub use flight::GlobeFlight;
pub use smoothness::SmoothnessStash;
pub use surface::GlobeSurface;
pub use surface::ImageryProvider;
pub use surface::OrbitView;
pub use surface::TerrainProvider;
pub use tile_load::ReadyReason;
pub use tile_load::TileLoadMonitor;
pub use tile_load::TileLoadState;
pub use trajectory::ProjectileAppearance;
pub use trajectory::ProjectileState;
pub use trajectory::TrajectoryAnimator;

// Public API - Configuration resources
pub use chase::ChaseCameraConfig;
pub use comparison::FramingConfig;
pub use flight::FlightConfig;
pub use picking::PickConfig;
pub use surface::ACCESS_TOKEN_ENV_VAR;
pub use surface::GlobeConfig;
pub use surface::GlobeView;
pub use tile_load::TileLoadConfig;
pub use trajectory::TrajectoryConfig;

// Public API - Visualization
#[cfg(feature = "visualization")]
pub use visualization::FootprintGizmo;
#[cfg(feature = "visualization")]
pub use visualization::FootprintVisualizationConfig;
#[cfg(feature = "visualization")]
pub use visualization::FootprintVisualizationPlugin;

// Internal - used by plugin, not for external use
use chase::follow_projectiles;
use comparison::{spin_subjects, update_comparison_rigs};
use flight::{advance_globe_flights, on_show_footprint};
use picking::{on_clear_pick, on_primary_pick, pointer_pick_input};
use smoothness::{
    restore_smoothness_on_flight_end, restore_smoothness_on_rig_removed,
    stash_smoothness_on_rig_added,
};
use surface::{on_close_globe, on_open_globe};
use tile_load::poll_tile_load_deadlines;
use trajectory::{advance_projectiles, on_arm_trajectory, on_disarm_trajectory};

/// Plugin that adds globe surfaces, picking, flights, comparison framing and the projectile
/// animation.
pub struct ImpactGlobePlugin;

impl Plugin for ImpactGlobePlugin {
    fn build(&self, app: &mut App) {
        app
            // Register observers for component lifecycle events
            .add_observer(stash_smoothness_on_rig_added)
            .add_observer(restore_smoothness_on_flight_end)
            .add_observer(restore_smoothness_on_rig_removed)
            // Register observers for custom events
            .add_observer(on_open_globe)
            .add_observer(on_close_globe)
            .add_observer(on_primary_pick)
            .add_observer(on_clear_pick)
            .add_observer(on_show_footprint)
            .add_observer(on_arm_trajectory)
            .add_observer(on_disarm_trajectory)
            // Add systems
            .add_systems(
                Update,
                (
                    pointer_pick_input.run_if(resource_exists::<ButtonInput<MouseButton>>),
                    poll_tile_load_deadlines,
                    advance_globe_flights,
                    (update_comparison_rigs, spin_subjects).chain(),
                    (advance_projectiles, follow_projectiles).chain(),
                ),
            )
            // Initialize resources
            .add_message::<RequestRedraw>()
            .init_resource::<GlobeConfig>()
            .init_resource::<TileLoadConfig>()
            .init_resource::<PickConfig>()
            .init_resource::<FlightConfig>()
            .init_resource::<FramingConfig>()
            .init_resource::<TrajectoryConfig>()
            .init_resource::<ChaseCameraConfig>();
    }
}
