//! Synthetic `refpsfcat.fits` files.

use common::{CatalogRow, FileRef};

const BLOCK: usize = 2880;

/// (TTYPE, TFORM) in file order. Names are mixed-case on purpose.
const COLUMNS: [(&str, &str); 13] = [
    ("sourceid", "K"),
    ("xpos", "E"),
    ("ypos", "E"),
    ("RA", "D"),
    ("Dec", "D"),
    ("flux", "E"),
    ("sigflux", "E"),
    ("mag", "E"),
    ("sigmag", "E"),
    ("snr", "E"),
    ("chi", "E"),
    ("sharp", "E"),
    ("flags", "I"),
];

pub struct FitsBuilder {
    file: FileRef,
    magzp: f64,
    magzp_rms: f64,
    magzp_unc: Option<f64>,
    infobits: i64,
    rows: Vec<CatalogRow>,
    omit_column: Option<&'static str>,
    omit_keyword: Option<&'static str>,
    formats: Vec<(&'static str, &'static str)>,
    overrides: Vec<(&'static str, i64)>,
}

impl FitsBuilder {
    pub fn new(file: FileRef) -> Self {
        Self {
            file,
            magzp: 26.325,
            magzp_rms: 0.087,
            magzp_unc: Some(0.0005),
            infobits: 16,
            rows: Vec::new(),
            omit_column: None,
            omit_keyword: None,
            formats: Vec::new(),
            overrides: Vec::new(),
        }
    }

    pub fn magzp_unc(mut self, value: Option<f64>) -> Self {
        self.magzp_unc = value;
        self
    }

    pub fn infobits(mut self, infobits: i64) -> Self {
        self.infobits = infobits;
        self
    }

    pub fn row(mut self, row: CatalogRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = CatalogRow>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn without_column(mut self, name: &'static str) -> Self {
        self.omit_column = Some(name);
        self
    }

    pub fn without_keyword(mut self, keyword: &'static str) -> Self {
        self.omit_keyword = Some(keyword);
        self
    }

    /// Declare `form` as the TFORM of `name`; the data keeps its real layout.
    pub fn column_format(mut self, name: &'static str, form: &'static str) -> Self {
        self.formats.push((name, form));
        self
    }

    /// Replace an integer keyword of the primary header.
    pub fn primary_int(mut self, keyword: &'static str, value: i64) -> Self {
        self.overrides.push((keyword, value));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();

        let mut primary = vec![
            logical("SIMPLE", true),
            int("BITPIX", 8),
            int("NAXIS", 0),
            logical("EXTEND", true),
            int("FIELDID", i64::from(self.file.fieldid())),
            int("CCDID", i64::from(self.file.ccdid())),
            int("QID", i64::from(self.file.qid())),
            int("FILTERID", i64::from(self.file.filter().digit())),
            float("MAGZP", self.magzp),
            float("MAGZPRMS", self.magzp_rms),
            int("INFOBITS", self.infobits),
            format!("{:<80}", "COMMENT   synthetic reference catalog"),
        ];
        if let Some(unc) = self.magzp_unc {
            primary.push(float("MAGZPUNC", unc));
        }
        if let Some(keyword) = self.omit_keyword {
            primary.retain(|card| card[..8].trim_end() != keyword);
        }
        for (keyword, value) in &self.overrides {
            for card in primary.iter_mut() {
                if card[..8].trim_end() == *keyword {
                    *card = int(keyword, *value);
                }
            }
        }
        push_header(&mut out, &primary);

        let columns: Vec<(&str, &str)> = COLUMNS
            .iter()
            .copied()
            .filter(|(name, _)| Some(*name) != self.omit_column)
            .collect();
        let row_len: usize = columns.iter().map(|(_, form)| width(form)).sum();

        let mut ext = vec![
            string("XTENSION", "BINTABLE"),
            int("BITPIX", 8),
            int("NAXIS", 2),
            int("NAXIS1", row_len as i64),
            int("NAXIS2", self.rows.len() as i64),
            int("PCOUNT", 0),
            int("GCOUNT", 1),
            int("TFIELDS", columns.len() as i64),
        ];
        for (n, (name, form)) in columns.iter().enumerate() {
            ext.push(string(&format!("TTYPE{}", n + 1), name));
            let declared = self
                .formats
                .iter()
                .find(|(column, _)| column == name)
                .map_or(*form, |(_, declared)| *declared);
            ext.push(string(&format!("TFORM{}", n + 1), declared));
        }
        push_header(&mut out, &ext);

        let data_start = out.len();
        for row in &self.rows {
            for (name, _) in &columns {
                encode_cell(&mut out, name, row);
            }
        }
        let padded = data_start + (out.len() - data_start).div_ceil(BLOCK) * BLOCK;
        out.resize(padded, 0);
        out
    }
}

fn width(form: &str) -> usize {
    match form {
        "K" | "D" => 8,
        "E" => 4,
        "I" => 2,
        other => panic!("unsupported test format {other}"),
    }
}

fn f32_bytes(value: Option<f64>) -> [u8; 4] {
    (value.unwrap_or(f64::NAN) as f32).to_be_bytes()
}

fn encode_cell(out: &mut Vec<u8>, name: &str, row: &CatalogRow) {
    match name {
        "sourceid" => out.extend(i64::from(row.sourceid).to_be_bytes()),
        "xpos" => out.extend(f32_bytes(row.xpos)),
        "ypos" => out.extend(f32_bytes(row.ypos)),
        "RA" => out.extend(row.ra.to_be_bytes()),
        "Dec" => out.extend(row.dec.to_be_bytes()),
        "flux" => out.extend(f32_bytes(row.flux)),
        "sigflux" => out.extend(f32_bytes(row.sigflux)),
        "mag" => out.extend(f32_bytes(row.mag)),
        "sigmag" => out.extend(f32_bytes(row.sigmag)),
        "snr" => out.extend(f32_bytes(row.snr)),
        "chi" => out.extend(f32_bytes(row.chi)),
        "sharp" => out.extend(f32_bytes(row.sharp)),
        "flags" => out.extend((row.flags as i16).to_be_bytes()),
        other => panic!("unknown column {other}"),
    }
}

fn push_header(out: &mut Vec<u8>, cards: &[String]) {
    let start = out.len();
    for card in cards {
        assert_eq!(card.len(), 80, "card {card:?}");
        out.extend(card.as_bytes());
    }
    out.extend(format!("{:<80}", "END").as_bytes());
    let padded = start + (out.len() - start).div_ceil(BLOCK) * BLOCK;
    out.resize(padded, b' ');
}

fn int(key: &str, value: i64) -> String {
    format!("{key:<8}= {value:>20}").pad()
}

fn float(key: &str, value: f64) -> String {
    format!("{key:<8}= {:>20}", format!("{value:?}")).pad()
}

fn logical(key: &str, value: bool) -> String {
    format!("{key:<8}= {:>20}", if value { "T" } else { "F" }).pad()
}

fn string(key: &str, value: &str) -> String {
    format!("{key:<8}= '{value:<8}'").pad()
}

trait Pad {
    fn pad(self) -> String;
}

impl Pad for String {
    fn pad(self) -> String {
        format!("{self:<80}")
    }
}

/// A fully populated row whose float values survive the f32 columns exactly.
pub fn sample_row(sourceid: u32, ra: f64, dec: f64) -> CatalogRow {
    CatalogRow {
        sourceid,
        xpos: Some(1024.5),
        ypos: Some(2048.25),
        ra,
        dec,
        flux: Some(1523.0),
        sigflux: Some(12.5),
        mag: Some(18.375),
        sigmag: Some(0.015625),
        snr: Some(121.75),
        chi: Some(1.0),
        sharp: Some(-0.0625),
        flags: 0,
    }
}
