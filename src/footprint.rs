//! Impact footprint geometry: a geodesic circle polygon plus an epicenter point, packaged as
//! a named feature collection the globe renderer can consume (GeoJSON on the wire).

use std::f64::consts::TAU;

use bevy::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::geodesy::EARTH_MEAN_RADIUS_KM;
use crate::geodesy::GeoPoint;
use crate::geodesy::destination_point;

/// Ring resolution used when the host doesn't ask for one.
pub const DEFAULT_SEGMENTS: u32 = 128;
/// Fewest segments that still form a polygon.
pub const MIN_SEGMENTS: u32 = 3;
/// Radius shown when the backend reports neither an impact radius nor a crater.
pub const MIN_FALLBACK_RADIUS_KM: f64 = 2.0;
/// Fallback radius per km of impactor diameter.
pub const FALLBACK_RADIUS_PER_DIAMETER: f64 = 1.8;

pub const FOOTPRINT_COLLECTION_NAME: &str = "impact-footprint";
pub const EPICENTER_FEATURE_NAME: &str = "Impact point";

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FootprintError {
    #[error("footprint radius must be a positive finite number of kilometres, got {0}")]
    InvalidRadius(f64),
    #[error("footprint center {0:?} is outside the valid latitude range")]
    InvalidCenter(GeoPoint),
    #[error("footprint needs at least 3 segments, got {0}")]
    TooFewSegments(u32),
}

/// Validated input for [`build_footprint`].
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FootprintSpec {
    center:    GeoPoint,
    radius_km: f64,
    segments:  u32,
}

impl FootprintSpec {
    pub fn new(center: GeoPoint, radius_km: f64, segments: u32) -> Result<Self, FootprintError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(FootprintError::InvalidRadius(radius_km));
        }
        if !center.is_valid() {
            return Err(FootprintError::InvalidCenter(center));
        }
        if segments < MIN_SEGMENTS {
            return Err(FootprintError::TooFewSegments(segments));
        }
        Ok(Self {
            center,
            radius_km,
            segments,
        })
    }

    pub fn with_default_segments(center: GeoPoint, radius_km: f64) -> Result<Self, FootprintError> {
        Self::new(center, radius_km, DEFAULT_SEGMENTS)
    }

    pub const fn center(&self) -> GeoPoint { self.center }

    pub const fn radius_km(&self) -> f64 { self.radius_km }

    pub const fn segments(&self) -> u32 { self.segments }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum Geometry {
    Point(GeoPoint),
    /// Closed ring: the last coordinate repeats the first.
    Polygon(Vec<GeoPoint>),
}

impl Geometry {
    /// GeoJSON geometry object (`[lon, lat]` coordinate order).
    pub fn to_geojson(&self) -> Value {
        match self {
            Self::Point(point) => json!({
                "type": "Point",
                "coordinates": [point.longitude_deg, point.latitude_deg],
            }),
            Self::Polygon(ring) => {
                let coordinates: Vec<[f64; 2]> = ring
                    .iter()
                    .map(|p| [p.longitude_deg, p.latitude_deg])
                    .collect();
                json!({
                    "type": "Polygon",
                    "coordinates": [coordinates],
                })
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Feature {
    pub name:     String,
    pub geometry: Geometry,
}

impl Feature {
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": self.geometry.to_geojson(),
            "properties": { "name": self.name },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct FeatureCollection {
    pub name:     String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "name": self.name,
            "features": self.features.iter().map(Feature::to_geojson).collect::<Vec<_>>(),
        })
    }

    /// The footprint ring, if this collection carries one.
    pub fn ring(&self) -> Option<&[GeoPoint]> {
        self.features.iter().find_map(|f| match &f.geometry {
            Geometry::Polygon(ring) => Some(ring.as_slice()),
            Geometry::Point(_) => None,
        })
    }

    /// The epicenter point, if this collection carries one.
    pub fn epicenter(&self) -> Option<GeoPoint> {
        self.features.iter().find_map(|f| match f.geometry {
            Geometry::Point(point) => Some(point),
            Geometry::Polygon(_) => None,
        })
    }
}

/// Builds the geodesic circle around `spec.center` and the epicenter marker.
///
/// The ring has `segments + 1` coordinates; the final one is a copy of the first so closure
/// is exact rather than depending on `sin`/`cos` periodicity at 2π.
pub fn build_footprint(spec: &FootprintSpec) -> FeatureCollection {
    let angular_distance = spec.radius_km / EARTH_MEAN_RADIUS_KM;
    let segments = spec.segments as usize;

    let mut ring: Vec<GeoPoint> = (0..segments)
        .map(|i| {
            let bearing = TAU * i as f64 / segments as f64;
            destination_point(spec.center, bearing, angular_distance)
        })
        .collect();
    ring.push(ring[0]);

    FeatureCollection {
        name:     FOOTPRINT_COLLECTION_NAME.to_owned(),
        features: vec![
            Feature {
                name:     format!("Impact radius {} km", spec.radius_km),
                geometry: Geometry::Polygon(ring),
            },
            Feature {
                name:     EPICENTER_FEATURE_NAME.to_owned(),
                geometry: Geometry::Point(spec.center),
            },
        ],
    }
}

/// Impact metrics as returned by the external impact service. Only the radius feeds the
/// footprint; the rest is carried for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactMetrics {
    #[serde(default)]
    pub magnitude:          Option<f64>,
    #[serde(default)]
    pub energy_megatons:    Option<f64>,
    #[serde(default)]
    pub crater_diameter_km: Option<f64>,
    #[serde(default)]
    pub impact_radius_km:   Option<f64>,
    #[serde(default)]
    pub summary:            Option<String>,
}

impl ImpactMetrics {
    /// Radius to draw: the reported impact radius, else half the crater, else a size-based
    /// estimate from the impactor diameter.
    pub fn footprint_radius_km(&self, impactor_diameter_km: f64) -> f64 {
        let positive = |v: &f64| v.is_finite() && *v > 0.0;
        self.impact_radius_km
            .filter(positive)
            .or_else(|| self.crater_diameter_km.filter(positive).map(|d| d / 2.0))
            .unwrap_or_else(|| {
                (impactor_diameter_km * FALLBACK_RADIUS_PER_DIAMETER).max(MIN_FALLBACK_RADIUS_KM)
            })
    }
}
