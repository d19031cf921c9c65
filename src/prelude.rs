//! Convenient re-exports for common types

pub use crate::ImpactGlobePlugin;
pub use crate::chase::ChaseCamera;
pub use crate::comparison::ComparisonRig;
pub use crate::comparison::ComparisonSubject;
pub use crate::comparison::Spin;
pub use crate::events::ArmTrajectory;
pub use crate::events::ClearPick;
pub use crate::events::CloseGlobe;
pub use crate::events::DisarmTrajectory;
pub use crate::events::GlobeOpened;
pub use crate::events::GlobePicked;
pub use crate::events::OpenGlobe;
pub use crate::events::ShowFootprint;
pub use crate::events::SurfaceReady;
pub use crate::events::TileLoadProgress;
pub use crate::events::TrajectoryEnd;
pub use crate::footprint::FootprintSpec;
pub use crate::footprint::ImpactMetrics;
pub use crate::footprint::build_footprint;
pub use crate::geodesy::GeoPoint;
pub use crate::surface::GlobeConfig;
pub use crate::surface::GlobeSurface;
pub use crate::trajectory::TrajectoryAnimator;
