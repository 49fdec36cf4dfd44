use std::fmt;
use std::ops::RangeInclusive;

use crate::error::CatalogError;
use crate::filter::Filter;

/// IRSA root for ZTF reference products.
pub const DEFAULT_BASE_URL: &str = "https://irsa.ipac.caltech.edu/ibe/data/ztf/products/ref/";

pub const CCD_IDS: RangeInclusive<u8> = 1..=16;
pub const QUADRANT_IDS: RangeInclusive<u8> = 1..=4;

/// Address of one quadrant's reference PSF catalog file.
///
/// Components are validated on construction, so every `FileRef` maps to a
/// well-formed remote path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileRef {
    fieldid: u32,
    filter: Filter,
    ccdid: u8,
    qid: u8,
}

impl FileRef {
    pub fn new(fieldid: u32, filter: Filter, ccdid: u8, qid: u8) -> Result<Self, CatalogError> {
        check_range("ccdid", ccdid, &CCD_IDS)?;
        check_range("qid", qid, &QUADRANT_IDS)?;
        Ok(Self {
            fieldid,
            filter,
            ccdid,
            qid,
        })
    }

    pub fn fieldid(&self) -> u32 {
        self.fieldid
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn ccdid(&self) -> u8 {
        self.ccdid
    }

    pub fn qid(&self) -> u8 {
        self.qid
    }

    /// Top-level directory: fields below 1000 live under `000`, the rest under `001`.
    pub fn root(&self) -> &'static str {
        if self.fieldid < 1000 { "000" } else { "001" }
    }

    /// Stable local identity, e.g. `ztf_000202_zg_c10_q1`.
    pub fn key(&self) -> String {
        format!(
            "ztf_{:06}_{}_c{:02}_q{}",
            self.fieldid, self.filter, self.ccdid, self.qid
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}_refpsfcat.fits", self.key())
    }

    /// Path relative to the archive root.
    pub fn path(&self) -> String {
        format!(
            "{}/field{:06}/{}/ccd{:02}/q{}/{}",
            self.root(),
            self.fieldid,
            self.filter,
            self.ccdid,
            self.qid,
            self.file_name()
        )
    }

    pub fn url(&self, base_url: &str) -> String {
        if base_url.ends_with('/') {
            format!("{base_url}{}", self.path())
        } else {
            format!("{base_url}/{}", self.path())
        }
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn check_range(name: &'static str, value: u8, range: &RangeInclusive<u8>) -> Result<(), CatalogError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(CatalogError::OutOfRange {
            name,
            value: value.into(),
            min: (*range.start()).into(),
            max: (*range.end()).into(),
        })
    }
}
