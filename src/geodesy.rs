//! Geodetic math for the globe surface.
//!
//! Two Earth models live here: a sphere of mean radius for great-circle work (footprints,
//! distances, bearings) and a reference ellipsoid for everything that has to agree with the
//! rendered globe (picking, marker placement, camera views).
//!
//! Cartesian points are ECEF meters (Z toward the north pole). Bevy scenes are Y-up, so
//! [`ecef_to_scene`] and [`scene_to_ecef`] rotate between the two frames.

use std::f64::consts::PI;

use bevy::math::DVec3;
use bevy::prelude::*;
use serde::Deserialize;
use serde::Serialize;

/// Mean Earth radius used by the spherical formulas.
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;
/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (meters).
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

const GEODETIC_MAX_ITERATIONS: usize = 16;
const GEODETIC_TOLERANCE_RAD: f64 = 1e-14;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Reflect)]
pub struct GeoPoint {
    pub latitude_deg:  f64,
    pub longitude_deg: f64,
}

impl GeoPoint {
    pub const fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }

    pub fn from_radians(latitude_rad: f64, longitude_rad: f64) -> Self {
        Self::new(latitude_rad.to_degrees(), longitude_rad.to_degrees())
    }

    pub fn latitude_rad(&self) -> f64 { self.latitude_deg.to_radians() }

    pub fn longitude_rad(&self) -> f64 { self.longitude_deg.to_radians() }

    /// True when both components are finite and the latitude lies in [-90, 90].
    pub fn is_valid(&self) -> bool {
        self.latitude_deg.is_finite()
            && self.longitude_deg.is_finite()
            && (-90.0..=90.0).contains(&self.latitude_deg)
    }

    /// Same point with the longitude wrapped into (-180, 180].
    pub fn normalized(&self) -> Self {
        Self::new(self.latitude_deg, normalize_longitude_deg(self.longitude_deg))
    }
}

/// Wraps a longitude into (-180, 180].
pub fn normalize_longitude_deg(longitude_deg: f64) -> f64 {
    let wrapped = (longitude_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}

/// Spherical direct geodetic problem: the point reached from `origin` after travelling
/// `angular_distance_rad` along the great circle with initial bearing `bearing_rad`
/// (clockwise from north).
///
/// The longitude is returned unwrapped; callers normalize when they need to.
pub fn destination_point(origin: GeoPoint, bearing_rad: f64, angular_distance_rad: f64) -> GeoPoint {
    let lat1 = origin.latitude_rad();
    let lon1 = origin.longitude_rad();
    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_d, cos_d) = angular_distance_rad.sin_cos();

    let sin_lat2 = sin_lat1.mul_add(cos_d, cos_lat1 * sin_d * bearing_rad.cos());
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
    let lon2 = lon1
        + (bearing_rad.sin() * sin_d * cos_lat1).atan2(sin_lat1.mul_add(-sin_lat2, cos_d));

    GeoPoint::from_radians(lat2, lon2)
}

/// Haversine great-circle distance on the mean-radius sphere.
pub fn great_circle_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude_rad();
    let lat2 = b.latitude_rad();
    let delta_lat = lat2 - lat1;
    let delta_lon = b.longitude_rad() - a.longitude_rad();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_MEAN_RADIUS_KM * c
}

/// Initial great-circle bearing from `from` to `to`, in radians within [0, 2π).
pub fn initial_bearing_rad(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude_rad();
    let lat2 = to.latitude_rad();
    let delta_lon = to.longitude_rad() - from.longitude_rad();

    let x = delta_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    x.atan2(y).rem_euclid(2.0 * PI)
}

/// Reference ellipsoid of revolution, radii in meters.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Ellipsoid {
    pub equatorial_radius_m: f64,
    pub polar_radius_m:      f64,
}

impl Default for Ellipsoid {
    fn default() -> Self { Self::WGS84 }
}

impl Ellipsoid {
    pub const WGS84: Self = Self {
        equatorial_radius_m: WGS84_A,
        polar_radius_m:      WGS84_B,
    };

    pub const fn sphere(radius_m: f64) -> Self {
        Self {
            equatorial_radius_m: radius_m,
            polar_radius_m:      radius_m,
        }
    }

    /// First eccentricity squared.
    pub fn eccentricity_sq(&self) -> f64 {
        let a2 = self.equatorial_radius_m * self.equatorial_radius_m;
        let b2 = self.polar_radius_m * self.polar_radius_m;
        (a2 - b2) / a2
    }

    /// Prime vertical radius of curvature at a geodetic latitude.
    fn prime_vertical_radius(&self, latitude_rad: f64) -> f64 {
        let sin_lat = latitude_rad.sin();
        self.equatorial_radius_m / (self.eccentricity_sq() * sin_lat).mul_add(-sin_lat, 1.0).sqrt()
    }

    /// Geodetic coordinate + height above the ellipsoid to ECEF meters.
    pub fn to_cartesian(&self, point: GeoPoint, height_m: f64) -> DVec3 {
        let lat = point.latitude_rad();
        let lon = point.longitude_rad();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let n = self.prime_vertical_radius(lat);
        DVec3::new(
            (n + height_m) * cos_lat * cos_lon,
            (n + height_m) * cos_lat * sin_lon,
            (n * (1.0 - self.eccentricity_sq()) + height_m) * sin_lat,
        )
    }

    /// ECEF meters to geodetic coordinate and height above the ellipsoid.
    ///
    /// Fixed-point iteration on latitude; converges to machine precision in a handful of
    /// steps for any point outside the core. Height uses the form that stays stable at the
    /// poles.
    pub fn to_geodetic(&self, point: DVec3) -> (GeoPoint, f64) {
        let e2 = self.eccentricity_sq();
        let p = point.x.hypot(point.y);
        let lon = point.y.atan2(point.x);

        let mut lat = point.z.atan2(p * (1.0 - e2));
        for _ in 0..GEODETIC_MAX_ITERATIONS {
            let n = self.prime_vertical_radius(lat);
            let next = (e2 * n).mul_add(lat.sin(), point.z).atan2(p);
            let converged = (next - lat).abs() < GEODETIC_TOLERANCE_RAD;
            lat = next;
            if converged {
                break;
            }
        }

        let (sin_lat, cos_lat) = lat.sin_cos();
        let height = p.mul_add(cos_lat, point.z * sin_lat)
            - self.equatorial_radius_m * (e2 * sin_lat).mul_add(-sin_lat, 1.0).sqrt();

        (GeoPoint::from_radians(lat, lon), height)
    }

    /// Inverse of the globe's geographic projection, dropping the height.
    pub fn to_geographic(&self, point: DVec3) -> GeoPoint { self.to_geodetic(point).0 }

    /// Nearest intersection of a ray (ECEF meters) with the ellipsoid surface at or in front
    /// of the origin. `None` when the ray misses.
    pub fn intersect_ray(&self, origin: DVec3, direction: DVec3) -> Option<DVec3> {
        // Scale into unit-sphere space where the ellipsoid is |x| = 1.
        let inv_radii = DVec3::new(
            1.0 / self.equatorial_radius_m,
            1.0 / self.equatorial_radius_m,
            1.0 / self.polar_radius_m,
        );
        let o = origin * inv_radii;
        let d = direction * inv_radii;

        let a = d.length_squared();
        if a <= f64::EPSILON {
            return None;
        }
        let b = 2.0 * o.dot(d);
        let c = o.length_squared() - 1.0;
        let discriminant = b.mul_add(b, -4.0 * a * c);
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let near = (-b - sqrt_disc) / (2.0 * a);
        let far = (-b + sqrt_disc) / (2.0 * a);
        let t = if near >= 0.0 {
            near
        } else if far >= 0.0 {
            far
        } else {
            return None;
        };

        Some(origin + direction * t)
    }
}

/// Rotates an ECEF vector into the Y-up scene frame (x → x, z → y, y → -z).
pub fn ecef_to_scene(ecef: DVec3) -> DVec3 { DVec3::new(ecef.x, ecef.z, -ecef.y) }

/// Inverse of [`ecef_to_scene`].
pub fn scene_to_ecef(scene: DVec3) -> DVec3 { DVec3::new(scene.x, -scene.z, scene.y) }

/// Intersects a ray expressed in the globe's local scene frame with the globe surface.
///
/// `units_per_meter` is the scene scale of the globe. Returns the hit in ECEF meters, or
/// `None` when the ray misses the globe (a click into space is not an error).
pub fn screen_ray_to_surface_point(
    ray: Ray3d,
    ellipsoid: &Ellipsoid,
    units_per_meter: f64,
) -> Option<DVec3> {
    let origin = scene_to_ecef(ray.origin.as_dvec3()) / units_per_meter;
    let direction = scene_to_ecef(ray.direction.as_dvec3());
    ellipsoid.intersect_ray(origin, direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn destination_due_north_along_meridian() {
        let origin = GeoPoint::new(0.0, 0.0);
        let d = 1000.0 / EARTH_MEAN_RADIUS_KM;
        let north = destination_point(origin, 0.0, d);
        assert_close(north.latitude_deg, d.to_degrees(), 1e-9);
        assert_close(north.longitude_deg, 0.0, 1e-9);
    }

    #[test]
    fn destination_longitude_is_not_wrapped() {
        let origin = GeoPoint::new(0.0, 179.5);
        let east = destination_point(origin, PI / 2.0, 1.0_f64.to_radians());
        assert!(east.longitude_deg > 180.0);
        assert_close(east.normalized().longitude_deg, -179.5, 1e-9);
    }

    #[test]
    fn destination_distance_matches_haversine() {
        let origin = GeoPoint::new(48.85, 2.35);
        for bearing_deg in [0.0_f64, 37.0, 135.0, 260.0] {
            let target = destination_point(origin, bearing_deg.to_radians(), 500.0 / EARTH_MEAN_RADIUS_KM);
            assert_close(great_circle_distance_km(origin, target), 500.0, 1e-6);
            assert_close(initial_bearing_rad(origin, target).to_degrees(), bearing_deg, 1e-6);
        }
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = great_circle_distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert_close(d, 111.195, 1e-3);
    }

    #[test]
    fn longitude_normalization() {
        assert_close(normalize_longitude_deg(190.0), -170.0, 1e-12);
        assert_close(normalize_longitude_deg(-180.0), 180.0, 1e-12);
        assert_close(normalize_longitude_deg(540.0), 180.0, 1e-12);
        assert_close(normalize_longitude_deg(-45.0), -45.0, 1e-12);
    }

    #[test]
    fn geo_point_validity() {
        assert!(GeoPoint::new(90.0, 200.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn wgs84_equator_prime_meridian() {
        let ecef = Ellipsoid::WGS84.to_cartesian(GeoPoint::new(0.0, 0.0), 0.0);
        assert_close(ecef.x, WGS84_A, 1e-6);
        assert_close(ecef.y, 0.0, 1e-6);
        assert_close(ecef.z, 0.0, 1e-6);
    }

    #[test]
    fn geodetic_round_trip() {
        let ellipsoid = Ellipsoid::WGS84;
        for (lat, lon, h) in [
            (23.6, -102.0, 0.0),
            (-33.9, 151.2, 1200.0),
            (89.999, 12.0, 0.0),
            (-90.0, 0.0, 0.0),
            (0.0, 179.0, -50.0),
        ] {
            let ecef = ellipsoid.to_cartesian(GeoPoint::new(lat, lon), h);
            let (geo, height) = ellipsoid.to_geodetic(ecef);
            assert_close(geo.latitude_deg, lat, 1e-9);
            if lat.abs() < 90.0 {
                assert_close(normalize_longitude_deg(geo.longitude_deg), normalize_longitude_deg(lon), 1e-9);
            }
            assert_close(height, h, 1e-4);
        }
    }

    #[test]
    fn ray_hits_near_side_of_globe() {
        let ellipsoid = Ellipsoid::WGS84;
        let origin = DVec3::new(3.0 * WGS84_A, 0.0, 0.0);
        let hit = ellipsoid
            .intersect_ray(origin, DVec3::NEG_X)
            .expect("ray toward the center must hit");
        assert_close(hit.x, WGS84_A, 1e-6);
        let geo = ellipsoid.to_geographic(hit);
        assert_close(geo.latitude_deg, 0.0, 1e-9);
        assert_close(geo.longitude_deg, 0.0, 1e-9);
    }

    #[test]
    fn ray_missing_globe_is_none() {
        let ellipsoid = Ellipsoid::WGS84;
        let origin = DVec3::new(3.0 * WGS84_A, 0.0, 0.0);
        assert!(ellipsoid.intersect_ray(origin, DVec3::Y).is_none());
        assert!(ellipsoid.intersect_ray(origin, DVec3::X).is_none());
    }

    #[test]
    fn scene_axes_round_trip() {
        let ecef = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(scene_to_ecef(ecef_to_scene(ecef)), ecef);
        // North pole points up in the scene.
        assert_eq!(ecef_to_scene(DVec3::Z), DVec3::Y);
    }

    #[test]
    fn screen_ray_in_kilometre_scene() {
        let units_per_meter = 1e-3;
        let ray = Ray3d::new(Vec3::new(0.0, 20_000.0, 0.0), Dir3::NEG_Y);
        let hit = screen_ray_to_surface_point(ray, &Ellipsoid::WGS84, units_per_meter)
            .expect("looking down at the north pole");
        let geo = Ellipsoid::WGS84.to_geographic(hit);
        assert_close(geo.latitude_deg, 90.0, 1e-6);

        let miss = Ray3d::new(Vec3::new(0.0, 20_000.0, 0.0), Dir3::Y);
        assert!(screen_ray_to_surface_point(miss, &Ellipsoid::WGS84, units_per_meter).is_none());
    }
}
