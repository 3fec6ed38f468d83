//! Geographic projection of polygon features into screen space.
//!
//! [`GeoProjection`] follows the d3 conventions: `scale` multiplies projected
//! radians, `translation` is a fraction of the viewport where the projection
//! center lands, and `rotation` is `[lambda, phi, gamma]` in degrees.

use crate::error::ChoroplethError;
use crate::models::{Feature, Ring};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Latitude limit of the Mercator projection (degrees).
const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// Screen-space polygon rings of one feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectedShape {
    pub rings: Vec<Vec<(f64, f64)>>,
}

impl ProjectedShape {
    /// SVG path data, e.g. `M0,0L10,0L10,10Z`.
    pub fn to_path_string(&self) -> String {
        let mut out = String::new();
        for ring in &self.rings {
            for (i, (x, y)) in ring.iter().enumerate() {
                out.push(if i == 0 { 'M' } else { 'L' });
                out.push_str(&format!("{},{}", round2(*x), round2(*y)));
            }
            if !ring.is_empty() {
                out.push('Z');
            }
        }
        out
    }

    /// Even-odd point-in-polygon test over all rings.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            let n = ring.len();
            if n < 3 {
                continue;
            }
            let mut j = n - 1;
            for i in 0..n {
                let (xi, yi) = ring[i];
                let (xj, yj) = ring[j];
                if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Turns a feature's geometry into screen coordinates.
pub trait Projector {
    /// Project one `(longitude, latitude)` position in degrees.
    fn project_point(&self, lon: f64, lat: f64) -> (f64, f64);

    fn project(&self, feature: &Feature) -> Result<ProjectedShape, ChoroplethError> {
        let mut rings = Vec::new();
        for ring in feature.geometry.rings() {
            rings.push(self.project_ring(ring).map_err(|reason| ChoroplethError::Projection {
                feature: feature.id_string(),
                reason,
            })?);
        }
        Ok(ProjectedShape { rings })
    }

    fn project_ring(&self, ring: &Ring) -> Result<Vec<(f64, f64)>, String> {
        ring.iter()
            .map(|[lon, lat]| {
                if !lon.is_finite() || !lat.is_finite() {
                    return Err(format!("non-finite position [{lon}, {lat}]"));
                }
                let (x, y) = self.project_point(*lon, *lat);
                if x.is_finite() && y.is_finite() {
                    Ok((x, y))
                } else {
                    Err(format!("position [{lon}, {lat}] has no projection"))
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionType {
    #[default]
    Mercator,
    Equirectangular,
}

/// Projection parameters as they appear in options files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionOptions {
    #[serde(rename = "type")]
    pub kind: ProjectionType,
    pub scale: f64,
    pub translation: [f64; 2],
    pub rotation: [f64; 3],
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            kind: ProjectionType::Mercator,
            scale: 100.0,
            translation: [0.5, 0.5],
            rotation: [0.0, 0.0, 0.0],
        }
    }
}

/// A configured projection bound to a viewport size.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoProjection {
    kind: ProjectionType,
    scale: f64,
    tx: f64,
    ty: f64,
    rotate: [f64; 3],
}

impl GeoProjection {
    pub fn new(options: &ProjectionOptions, width: f64, height: f64) -> Self {
        Self {
            kind: options.kind,
            scale: options.scale,
            tx: width * options.translation[0],
            ty: height * options.translation[1],
            rotate: options.rotation.map(f64::to_radians),
        }
    }

    /// Rotate spherical coordinates (radians) the way `d3.geoRotation` does.
    fn rotate(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let [dl, dp, dg] = self.rotate;
        let mut lambda = lambda + dl;
        if lambda > PI {
            lambda -= 2.0 * PI;
        } else if lambda < -PI {
            lambda += 2.0 * PI;
        }
        if dp == 0.0 && dg == 0.0 {
            return (lambda, phi);
        }
        let (sin_dp, cos_dp) = dp.sin_cos();
        let (sin_dg, cos_dg) = dg.sin_cos();
        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * cos_dp + x * sin_dp;
        (
            (y * cos_dg - k * sin_dg).atan2(x * cos_dp - z * sin_dp),
            (k * cos_dg + y * sin_dg).clamp(-1.0, 1.0).asin(),
        )
    }

    fn raw(&self, lambda: f64, phi: f64) -> (f64, f64) {
        match self.kind {
            ProjectionType::Equirectangular => (lambda, phi),
            ProjectionType::Mercator => {
                let limit = MERCATOR_MAX_LAT.to_radians();
                let phi = phi.clamp(-limit, limit);
                (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln())
            }
        }
    }

    /// Meridians and parallels every `step` degrees, as projected polylines.
    pub fn graticule(&self, step: f64) -> Vec<Vec<(f64, f64)>> {
        let step = if step > 0.0 { step } else { 10.0 };
        let sample = 2.5_f64.min(step);
        let max_lat = match self.kind {
            ProjectionType::Mercator => 80.0,
            ProjectionType::Equirectangular => 90.0,
        };
        let mut lines = Vec::new();

        let mut lon = -180.0;
        while lon <= 180.0 + 1e-9 {
            let mut line = Vec::new();
            let mut lat = -max_lat;
            while lat <= max_lat + 1e-9 {
                line.push(self.project_point(lon, lat));
                lat += sample;
            }
            lines.push(line);
            lon += step;
        }

        let mut lat = -max_lat;
        while lat <= max_lat + 1e-9 {
            let mut line = Vec::new();
            let mut lon = -180.0;
            while lon <= 180.0 + 1e-9 {
                line.push(self.project_point(lon, lat));
                lon += sample;
            }
            lines.push(line);
            lat += step;
        }
        lines
    }
}

impl Projector for GeoProjection {
    fn project_point(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lambda = lon.to_radians();
        let phi = lat.to_radians().clamp(-FRAC_PI_2, FRAC_PI_2);
        let (lambda, phi) = self.rotate(lambda, phi);
        let (x, y) = self.raw(lambda, phi);
        (self.tx + x * self.scale, self.ty - y * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Geometry;

    fn projection(kind: ProjectionType) -> GeoProjection {
        let opts = ProjectionOptions {
            kind,
            ..Default::default()
        };
        GeoProjection::new(&opts, 800.0, 400.0)
    }

    #[test]
    fn origin_lands_on_translation() {
        for kind in [ProjectionType::Mercator, ProjectionType::Equirectangular] {
            let (x, y) = projection(kind).project_point(0.0, 0.0);
            assert!((x - 400.0).abs() < 1e-9 && (y - 200.0).abs() < 1e-9);
        }
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let p = projection(ProjectionType::Mercator);
        let (x, y) = p.project_point(10.0, 50.0);
        assert!(x > 400.0);
        assert!(y < 200.0);
    }

    #[test]
    fn mercator_poles_stay_finite() {
        let (_, y) = projection(ProjectionType::Mercator).project_point(0.0, 90.0);
        assert!(y.is_finite());
    }

    #[test]
    fn lambda_rotation_shifts_longitude() {
        let opts = ProjectionOptions {
            kind: ProjectionType::Equirectangular,
            rotation: [-10.0, 0.0, 0.0],
            ..Default::default()
        };
        let p = GeoProjection::new(&opts, 800.0, 400.0);
        let (x, _) = p.project_point(10.0, 0.0);
        assert!((x - 400.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_positions_fail_projection() {
        let f = Feature::new(
            "bad",
            Geometry::Polygon(vec![vec![[0.0, 0.0], [f64::NAN, 1.0], [1.0, 1.0]]]),
        );
        let err = projection(ProjectionType::Mercator).project(&f).unwrap_err();
        assert!(matches!(err, ChoroplethError::Projection { ref feature, .. } if feature == "bad"));
    }

    #[test]
    fn path_string_and_hit_test() {
        let shape = ProjectedShape {
            rings: vec![vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]],
        };
        assert_eq!(shape.to_path_string(), "M0,0L10,0L10,10L0,10Z");
        assert!(shape.contains(5.0, 5.0));
        assert!(!shape.contains(15.0, 5.0));
    }

    #[test]
    fn graticule_has_meridians_and_parallels() {
        let lines = projection(ProjectionType::Equirectangular).graticule(30.0);
        // 13 meridians (-180..=180) + 7 parallels (-90..=90)
        assert_eq!(lines.len(), 13 + 7);
    }
}
