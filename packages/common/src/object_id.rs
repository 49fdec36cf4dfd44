//! ZTF DR object IDs.
//!
//! Layout: `{fieldid}{filter_digit}{ccdid:02}{qid}{sourceid:08}`. The trailing
//! 12 characters are fixed-width, the field ID prefix is variable-width.

use crate::error::CatalogError;
use crate::file_ref::FileRef;
use crate::filter::Filter;

/// Largest source ID that fits the fixed 8-digit slot.
pub const MAX_SOURCE_ID: u32 = 99_999_999;

const FIXED_WIDTH: usize = 12;

/// Full identity of one catalog source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey {
    pub file: FileRef,
    pub sourceid: u32,
}

impl SourceKey {
    pub fn new(file: FileRef, sourceid: u32) -> Self {
        Self { file, sourceid }
    }

    /// Encode as an object ID. Source IDs above [`MAX_SOURCE_ID`] widen the
    /// trailing slot and do not decode back.
    pub fn object_id(&self) -> String {
        format!(
            "{}{}{:02}{}{:08}",
            self.file.fieldid(),
            self.file.filter().digit(),
            self.file.ccdid(),
            self.file.qid(),
            self.sourceid
        )
    }

    pub fn from_object_id(oid: &str) -> Result<Self, CatalogError> {
        let invalid = |reason: &'static str| CatalogError::InvalidObjectId {
            oid: oid.to_string(),
            reason,
        };

        if oid.len() < FIXED_WIDTH + 1 {
            return Err(invalid("must be at least 13 digits long"));
        }
        if !oid.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must contain only digits"));
        }

        let (prefix, tail) = oid.split_at(oid.len() - FIXED_WIDTH);
        if prefix.len() > 1 && prefix.starts_with('0') {
            return Err(invalid("field ID must not have leading zeros"));
        }
        let fieldid: u32 = prefix
            .parse()
            .map_err(|_| invalid("field ID is out of range"))?;

        let digits = tail.as_bytes();
        let filter =
            Filter::from_digit(digits[0] - b'0').ok_or_else(|| invalid("unrecognized filter digit"))?;
        let ccdid = (digits[1] - b'0') * 10 + (digits[2] - b'0');
        let qid = digits[3] - b'0';
        let sourceid: u32 = tail[4..]
            .parse()
            .map_err(|_| invalid("source ID is not a number"))?;

        let file = FileRef::new(fieldid, filter, ccdid, qid)
            .map_err(|_| invalid("CCD or quadrant ID out of range"))?;
        Ok(Self::new(file, sourceid))
    }
}
