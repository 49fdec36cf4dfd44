//! Decoder for ZTF `refpsfcat.fits` files.
//!
//! The primary HDU carries the quadrant keywords; the first BINTABLE
//! extension holds one scalar column per catalog field.

use std::collections::HashMap;
use std::io::Cursor;
use std::panic::{AssertUnwindSafe, catch_unwind};

use common::catalog::finite;
use common::object_id::MAX_SOURCE_ID;
use common::{CatalogRow, DecodedCatalog, FileRef, Filter, QuadrantHeader};
use fitsrs::Fits;
use fitsrs::card::Value;
use fitsrs::hdu::HDU;
use fitsrs::hdu::data::bintable::{ColumnId, DataValue};
use tracing::warn;

use crate::error::DecodeError;

/// Turns a downloaded payload into a typed catalog.
pub trait CatalogDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<DecodedCatalog, DecodeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FitsDecoder;

impl CatalogDecoder for FitsDecoder {
    fn decode(&self, payload: &[u8]) -> Result<DecodedCatalog, DecodeError> {
        // A panic inside the reader is a malformed file.
        catch_unwind(AssertUnwindSafe(|| decode_refpsfcat(payload)))
            .unwrap_or_else(|_| Err(DecodeError::Fits("reader panicked on malformed input".into())))
    }
}

fn required<'a>(value: Option<&'a Value>, key: &'static str) -> Result<&'a Value, DecodeError> {
    value.ok_or(DecodeError::MissingKeyword(key))
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Integer { value, .. } => Some(*value),
        Value::Float { value, .. } if value.fract() == 0.0 && value.abs() < 9.0e15 => {
            Some(*value as i64)
        }
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Float { value, .. } => Some(*value),
        Value::Integer { value, .. } => Some(*value as f64),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<&str> {
    match value {
        Value::String { value, .. } => Some(value.trim()),
        _ => None,
    }
}

fn int_keyword(value: Option<&Value>, key: &'static str) -> Result<i64, DecodeError> {
    as_int(required(value, key)?)
        .ok_or_else(|| DecodeError::Header(format!("{key} is not an integer")))
}

fn float_keyword(value: Option<&Value>, key: &'static str) -> Result<f64, DecodeError> {
    as_float(required(value, key)?)
        .ok_or_else(|| DecodeError::Header(format!("{key} is not a number")))
}

/// Primary-header keywords, read before the table is reached.
struct Primary {
    fieldid: i64,
    ccdid: i64,
    qid: i64,
    filterid: i64,
    header: QuadrantHeader,
}

impl Primary {
    fn identity(&self) -> Result<FileRef, DecodeError> {
        let filter = u8::try_from(self.filterid)
            .ok()
            .and_then(Filter::from_digit)
            .ok_or(DecodeError::UnknownFilter(self.filterid))?;
        let fieldid = u32::try_from(self.fieldid)
            .map_err(|_| DecodeError::Header(format!("FIELDID {} out of range", self.fieldid)))?;
        let ccdid = u8::try_from(self.ccdid)
            .map_err(|_| DecodeError::Header(format!("CCDID {} out of range", self.ccdid)))?;
        let qid = u8::try_from(self.qid)
            .map_err(|_| DecodeError::Header(format!("QID {} out of range", self.qid)))?;
        Ok(FileRef::new(fieldid, filter, ccdid, qid)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Int(i64),
    Float(f64),
}

impl Cell {
    fn from_value(value: DataValue) -> Option<Self> {
        match value {
            DataValue::UnsignedByte { value, .. } => Some(Cell::Int(i64::from(value))),
            DataValue::Short { value, .. } => Some(Cell::Int(i64::from(value))),
            DataValue::Integer { value, .. } => Some(Cell::Int(i64::from(value))),
            DataValue::Long { value, .. } => Some(Cell::Int(value)),
            DataValue::Float { value, .. } => Some(Cell::Float(f64::from(value))),
            DataValue::Double { value, .. } => Some(Cell::Float(value)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Cell::Int(v) => v as f64,
            Cell::Float(v) => v,
        }
    }

    /// Apply TSCAL/TZERO. Integer offsets (unsigned columns) stay exact.
    fn scaled(self, scale: f64, zero: f64) -> Cell {
        if scale == 1.0 && zero == 0.0 {
            return self;
        }
        match self {
            Cell::Int(v) if scale == 1.0 && zero.fract() == 0.0 && zero.abs() < 9.0e18 => v
                .checked_add(zero as i64)
                .map_or(Cell::Float(v as f64 + zero), Cell::Int),
            other => Cell::Float(other.as_f64() * scale + zero),
        }
    }

    fn float(self) -> Option<f64> {
        finite(Some(self.as_f64()))
    }

    fn int(self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(v),
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e18 => {
                Some(v as i64)
            }
            Cell::Float(_) => None,
        }
    }
}

struct ColumnSpec {
    index: usize,
    format: String,
    scale: f64,
    zero: f64,
}

/// The decoded table, one vector per catalog column.
struct Columns {
    sourceid: Vec<Cell>,
    xpos: Vec<Cell>,
    ypos: Vec<Cell>,
    ra: Vec<Cell>,
    dec: Vec<Cell>,
    flux: Vec<Cell>,
    sigflux: Vec<Cell>,
    mag: Vec<Cell>,
    sigmag: Vec<Cell>,
    snr: Vec<Cell>,
    chi: Vec<Cell>,
    sharp: Vec<Cell>,
    flags: Vec<Cell>,
}

impl Columns {
    /// `None` when the row cannot be placed on the sky or has no usable
    /// source ID.
    fn row(&self, i: usize) -> Option<CatalogRow> {
        let ra = self.ra[i].float().filter(|v| v.is_finite())?;
        let dec = self.dec[i].float().filter(|v| v.is_finite())?;
        let sourceid = self.sourceid[i]
            .int()
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v <= MAX_SOURCE_ID)?;
        Some(CatalogRow {
            sourceid,
            xpos: self.xpos[i].float(),
            ypos: self.ypos[i].float(),
            ra,
            dec,
            flux: self.flux[i].float(),
            sigflux: self.sigflux[i].float(),
            mag: self.mag[i].float(),
            sigmag: self.sigmag[i].float(),
            snr: self.snr[i].float(),
            chi: self.chi[i].float(),
            sharp: self.sharp[i].float(),
            flags: self.flags[i].int().unwrap_or(0),
        })
    }
}

pub fn decode_refpsfcat(payload: &[u8]) -> Result<DecodedCatalog, DecodeError> {
    let mut hdus = Fits::from_reader(Cursor::new(payload));
    let mut primary = None;

    let table = loop {
        match hdus.next() {
            Some(Ok(HDU::Primary(hdu))) => {
                let header = hdu.get_header();
                primary = Some(Primary {
                    fieldid: int_keyword(header.get("FIELDID"), "FIELDID")?,
                    ccdid: int_keyword(header.get("CCDID"), "CCDID")?,
                    qid: int_keyword(header.get("QID"), "QID")?,
                    filterid: int_keyword(header.get("FILTERID"), "FILTERID")?,
                    header: QuadrantHeader {
                        magzp: finite(Some(float_keyword(header.get("MAGZP"), "MAGZP")?)),
                        magzp_rms: finite(Some(float_keyword(header.get("MAGZPRMS"), "MAGZPRMS")?)),
                        magzp_unc: finite(Some(
                            header.get("MAGZPUNC").and_then(as_float).unwrap_or(0.0),
                        )),
                        infobits: int_keyword(header.get("INFOBITS"), "INFOBITS")?,
                    },
                });
            }
            Some(Ok(HDU::XBinaryTable(hdu))) => break hdu,
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(DecodeError::Fits(e.to_string())),
            None => {
                return Err(DecodeError::Truncated(
                    "no binary table extension found".into(),
                ));
            }
        }
    };
    let primary =
        primary.ok_or_else(|| DecodeError::Header("missing primary header".into()))?;
    let file = primary.identity()?;

    let header = table.get_header();
    let rows = usize::try_from(int_keyword(header.get("NAXIS2"), "NAXIS2")?)
        .map_err(|_| DecodeError::Header("negative NAXIS2".into()))?;
    let fields = int_keyword(header.get("TFIELDS"), "TFIELDS")?;
    if !(0..=999).contains(&fields) {
        return Err(DecodeError::Header(format!("TFIELDS {fields} out of range")));
    }

    let mut layout = HashMap::new();
    for n in 1..=fields as usize {
        let Some(name) = header.get(&format!("TTYPE{n}")).and_then(as_text) else {
            continue;
        };
        let format = header
            .get(&format!("TFORM{n}"))
            .and_then(as_text)
            .unwrap_or_default()
            .to_string();
        let scale = header.get(&format!("TSCAL{n}")).and_then(as_float).unwrap_or(1.0);
        let zero = header.get(&format!("TZERO{n}")).and_then(as_float).unwrap_or(0.0);
        layout.insert(
            name.to_ascii_lowercase(),
            ColumnSpec {
                index: n - 1,
                format,
                scale,
                zero,
            },
        );
    }

    let mut column = |name: &'static str| -> Result<Vec<Cell>, DecodeError> {
        let spec = layout.get(name).ok_or(DecodeError::MissingColumn(name))?;
        let cells = hdus
            .get_data(&table)
            .table_data()
            .select_fields(&[ColumnId::Index(spec.index)])
            .map(|value| Cell::from_value(value).map(|cell| cell.scaled(spec.scale, spec.zero)))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DecodeError::UnsupportedFormat {
                column: name.to_string(),
                format: spec.format.clone(),
            })?;
        if cells.len() != rows {
            return Err(DecodeError::Truncated(format!(
                "column {name} has {} of {rows} rows",
                cells.len()
            )));
        }
        Ok(cells)
    };

    let columns = Columns {
        sourceid: column("sourceid")?,
        xpos: column("xpos")?,
        ypos: column("ypos")?,
        ra: column("ra")?,
        dec: column("dec")?,
        flux: column("flux")?,
        sigflux: column("sigflux")?,
        mag: column("mag")?,
        sigmag: column("sigmag")?,
        snr: column("snr")?,
        chi: column("chi")?,
        sharp: column("sharp")?,
        flags: column("flags")?,
    };

    let mut kept = Vec::with_capacity(columns.sourceid.len());
    let mut dropped = 0usize;
    for i in 0..columns.sourceid.len() {
        match columns.row(i) {
            Some(row) => kept.push(row),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(
            file = %file,
            dropped,
            "Dropped rows without a finite position or an encodable sourceid"
        );
    }

    Ok(DecodedCatalog {
        file,
        header: primary.header,
        rows: kept,
    })
}
