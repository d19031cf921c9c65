//! Components shared between the surface, picking and flight modules.

use bevy::prelude::*;

use crate::footprint::FeatureCollection;
use crate::geodesy::GeoPoint;

/// Placed on a camera while it views a globe surface. Its presence is the init-once guard
/// for `OpenGlobe`.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct GlobeSurfaceLink(pub Entity);

/// The surface's only reference to its pick marker.
#[derive(Component, Reflect, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct MarkerSlot(pub Option<Entity>);

impl MarkerSlot {
    pub const fn get(&self) -> Option<Entity> { self.0 }

    pub const fn is_empty(&self) -> bool { self.0.is_none() }
}

/// Pick marker, a child of the surface. Its `Transform` sits on the ellipsoid in the
/// surface's local frame.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct GlobeMarker {
    pub position: GeoPoint,
    pub label:    String,
}

impl GlobeMarker {
    pub fn new(position: GeoPoint) -> Self {
        Self {
            position,
            label: format!(
                "Lat: {:.4}\nLon: {:.4}",
                position.latitude_deg, position.longitude_deg
            ),
        }
    }
}

/// Footprint currently shown on a surface. Replaced wholesale on every `ShowFootprint`.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct FootprintOverlay {
    pub center:     GeoPoint,
    pub radius_km:  f64,
    pub collection: FeatureCollection,
}
