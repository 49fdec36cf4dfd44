use common::{CatalogError, ConeQuery, FileRef, Filter, SkyPoint, SourceKey};
use serde::Deserialize;
use utoipa::IntoParams;

/// Identity of a single source, one parameter per component.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SourceQuery {
    /// ZTF field ID.
    #[param(example = 202)]
    pub fieldid: u32,
    /// Filter name: `zg`, `zr` or `zi`.
    #[param(example = "zg")]
    pub filter: String,
    /// CCD ID (1-16).
    #[param(example = 10, minimum = 1, maximum = 16)]
    pub ccdid: u8,
    /// Quadrant ID (1-4).
    #[param(example = 1, minimum = 1, maximum = 4)]
    pub qid: u8,
    /// Source ID within the quadrant catalog.
    #[param(example = 0)]
    pub sourceid: u32,
}

impl SourceQuery {
    pub fn key(&self) -> Result<SourceKey, CatalogError> {
        let filter: Filter = self.filter.parse()?;
        let file = FileRef::new(self.fieldid, filter, self.ccdid, self.qid)?;
        Ok(SourceKey::new(file, self.sourceid))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ObjectQuery {
    /// ZTF DR object ID: `{fieldid}{filter digit}{ccdid:02}{qid}{sourceid:08}`.
    #[param(example = "202110100000000")]
    pub oid: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConeParams {
    /// Right ascension of the center, degrees.
    #[param(example = 25.0)]
    pub ra: f64,
    /// Declination of the center, degrees.
    #[param(example = -29.6)]
    pub dec: f64,
    /// Search radius in arcseconds, greater than 0 and at most 60.
    #[param(example = 5.0)]
    pub radius_arcsec: f64,
    /// Restrict to one filter.
    pub filter: Option<String>,
    /// Restrict to one field.
    pub fieldid: Option<u32>,
}

impl ConeParams {
    pub fn to_query(&self) -> Result<ConeQuery, CatalogError> {
        let filter = self
            .filter
            .as_deref()
            .map(str::parse::<Filter>)
            .transpose()?;
        let center = SkyPoint::new(self.ra, self.dec)?;
        Ok(ConeQuery::new(center, self.radius_arcsec)?
            .with_filter(filter)
            .with_fieldid(self.fieldid))
    }
}
