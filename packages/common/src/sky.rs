//! Sky positions and cone queries.
//!
//! Public types carry degrees and arcseconds; radians only appear where a
//! storage backend needs them.

use crate::error::CatalogError;
use crate::filter::Filter;

pub const MAX_CONE_RADIUS_ARCSEC: f64 = 60.0;
pub const MAX_CONE_RESULTS: usize = 1000;

const ARCSEC_PER_DEGREE: f64 = 3600.0;

/// Equatorial position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPoint {
    pub ra: f64,
    pub dec: f64,
}

impl SkyPoint {
    pub fn new(ra: f64, dec: f64) -> Result<Self, CatalogError> {
        if !ra.is_finite() || !dec.is_finite() {
            return Err(CatalogError::InvalidCone(
                "\"ra\" and \"dec\" must be finite numbers".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&dec) {
            return Err(CatalogError::InvalidCone(
                "\"dec\" must be between -90 and 90 degrees".into(),
            ));
        }
        Ok(Self { ra, dec })
    }

    pub fn ra_rad(&self) -> f64 {
        self.ra.to_radians()
    }

    pub fn dec_rad(&self) -> f64 {
        self.dec.to_radians()
    }

    /// Great-circle separation in radians (haversine form, stable at
    /// arcsecond scales).
    pub fn angular_distance(&self, other: &SkyPoint) -> f64 {
        let (dec1, dec2) = (self.dec_rad(), other.dec_rad());
        let half_ddec = (dec2 - dec1) / 2.0;
        let half_dra = (other.ra_rad() - self.ra_rad()) / 2.0;
        let h = half_ddec.sin().powi(2) + dec1.cos() * dec2.cos() * half_dra.sin().powi(2);
        2.0 * h.sqrt().min(1.0).asin()
    }
}

/// A validated cone search request.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeQuery {
    pub center: SkyPoint,
    pub radius_arcsec: f64,
    pub filter: Option<Filter>,
    pub fieldid: Option<u32>,
}

impl ConeQuery {
    /// Radius must lie in `(0, MAX_CONE_RADIUS_ARCSEC]`.
    pub fn new(center: SkyPoint, radius_arcsec: f64) -> Result<Self, CatalogError> {
        if !(radius_arcsec > 0.0 && radius_arcsec <= MAX_CONE_RADIUS_ARCSEC) {
            return Err(CatalogError::InvalidCone(format!(
                "\"radius_arcsec\" must be positive and at most {MAX_CONE_RADIUS_ARCSEC}"
            )));
        }
        Ok(Self {
            center,
            radius_arcsec,
            filter: None,
            fieldid: None,
        })
    }

    pub fn with_filter(mut self, filter: Option<Filter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_fieldid(mut self, fieldid: Option<u32>) -> Self {
        self.fieldid = fieldid;
        self
    }

    pub fn radius_rad(&self) -> f64 {
        (self.radius_arcsec / ARCSEC_PER_DEGREE).to_radians()
    }

    pub fn contains(&self, point: &SkyPoint) -> bool {
        self.center.angular_distance(point) <= self.radius_rad()
    }
}
