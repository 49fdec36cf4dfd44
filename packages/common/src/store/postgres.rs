//! PostgreSQL + pgSphere catalog store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, Set, Statement, TransactionTrait, Value,
};
use tracing::{debug, info};

use super::{CatalogReader, CatalogWriter, MetadataStore};
use crate::catalog::{
    CatalogRow, CatalogStats, DecodedCatalog, QuadrantHeader, SourceRecord, Validators,
};
use crate::config::DatabaseConfig;
use crate::entity::{ingest_metadata, quadrant};
use crate::error::StoreError;
use crate::file_ref::FileRef;
use crate::filter::Filter;
use crate::object_id::SourceKey;
use crate::sky::{ConeQuery, MAX_CONE_RESULTS};

/// Schema DDL (embedded).
const SCHEMA: &str = include_str!("schema.sql");

/// Rows per multi-row `INSERT`; 19 bind parameters each keeps a statement
/// well under the 65535 parameter limit.
const INSERT_CHUNK_ROWS: usize = 1000;

const SOURCE_COLUMNS: &str = "fieldid, filter, ccdid, qid, sourceid, xpos, ypos, ra, dec, \
     flux, sigflux, mag, sigmag, snr, chi, sharp, flags, magzp, magzp_rms, magzp_unc, infobits";

fn schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// Create the extension, tables, index and view if they are missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    for statement in schema_statements(SCHEMA) {
        db.execute_raw(Statement::from_string(DbBackend::Postgres, statement))
            .await?;
    }
    info!("Catalog schema ensured");
    Ok(())
}

/// Catalog store backed by a sea-orm connection pool.
#[derive(Clone)]
pub struct PgCatalogStore {
    db: DatabaseConnection,
}

impl PgCatalogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open a pool sized by `config.max_connections`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        Self::connect_with_pool_size(config, config.max_connections).await
    }

    /// Open a pool of exactly `size` connections. The ingester uses a size
    /// of one so each worker owns a dedicated connection.
    pub async fn connect_with_pool_size(
        config: &DatabaseConfig,
        size: u32,
    ) -> Result<Self, StoreError> {
        let mut opt = ConnectOptions::new(config.connection_url());
        opt.max_connections(size.max(1))
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .sqlx_logging(false);

        let db = Database::connect(opt).await?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, FromQueryResult)]
struct FullSourceRow {
    fieldid: i32,
    filter: String,
    ccdid: i32,
    qid: i32,
    sourceid: i64,
    xpos: Option<f64>,
    ypos: Option<f64>,
    ra: f64,
    dec: f64,
    flux: Option<f64>,
    sigflux: Option<f64>,
    mag: Option<f64>,
    sigmag: Option<f64>,
    snr: Option<f64>,
    chi: Option<f64>,
    sharp: Option<f64>,
    flags: i64,
    magzp: Option<f64>,
    magzp_rms: Option<f64>,
    magzp_unc: Option<f64>,
    infobits: i64,
}

impl TryFrom<FullSourceRow> for SourceRecord {
    type Error = StoreError;

    fn try_from(row: FullSourceRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| StoreError::Corrupt(format!("{what} in {row:?}"));
        let filter: Filter = row.filter.parse().map_err(|_| corrupt("unknown filter"))?;
        let file = FileRef::new(
            u32::try_from(row.fieldid).map_err(|_| corrupt("negative fieldid"))?,
            filter,
            u8::try_from(row.ccdid).map_err(|_| corrupt("bad ccdid"))?,
            u8::try_from(row.qid).map_err(|_| corrupt("bad qid"))?,
        )
        .map_err(|_| corrupt("bad quadrant identity"))?;
        let source = CatalogRow {
            sourceid: u32::try_from(row.sourceid).map_err(|_| corrupt("bad sourceid"))?,
            xpos: row.xpos,
            ypos: row.ypos,
            ra: row.ra,
            dec: row.dec,
            flux: row.flux,
            sigflux: row.sigflux,
            mag: row.mag,
            sigmag: row.sigmag,
            snr: row.snr,
            chi: row.chi,
            sharp: row.sharp,
            flags: row.flags,
        };
        let header = QuadrantHeader {
            magzp: row.magzp,
            magzp_rms: row.magzp_rms,
            magzp_unc: row.magzp_unc,
            infobits: row.infobits,
        };
        Ok(SourceRecord::new(&file, &source, &header))
    }
}

#[derive(Debug, FromQueryResult)]
struct RelationCount {
    relname: String,
    approximate_row_count: i64,
}

/// `fieldid` as held by the INTEGER key columns.
fn db_fieldid(fieldid: u32) -> Result<i32, StoreError> {
    i32::try_from(fieldid)
        .map_err(|_| StoreError::Rejected(format!("fieldid {fieldid} exceeds the INTEGER key range")))
}

fn identity_values(file: &FileRef) -> Result<[Value; 4], StoreError> {
    Ok([
        db_fieldid(file.fieldid())?.into(),
        file.filter().as_str().into(),
        i32::from(file.ccdid()).into(),
        i32::from(file.qid()).into(),
    ])
}

/// Multi-row insert for one chunk; `coord` is built from radians.
fn insert_sources_statement(identity: &[Value; 4], rows: &[CatalogRow]) -> Statement {
    let mut sql = String::from(
        "INSERT INTO refpsfcat (fieldid, filter, ccdid, qid, sourceid, xpos, ypos, ra, dec, coord, \
         flux, sigflux, mag, sigmag, snr, chi, sharp, flags) VALUES ",
    );
    let mut values: Vec<Value> = Vec::with_capacity(rows.len() * 19);

    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        let base = values.len();
        let p = |offset: usize| format!("${}", base + offset);
        sql.push_str(&format!(
            "({}, {}, {}, {}, {}, {}, {}, {}, {}, spoint({}, {}), {}, {}, {}, {}, {}, {}, {}, {})",
            p(1), p(2), p(3), p(4), p(5), p(6), p(7), p(8), p(9), p(10),
            p(11), p(12), p(13), p(14), p(15), p(16), p(17), p(18), p(19),
        ));

        let position = row.position();
        values.extend(identity.iter().cloned());
        values.extend([
            i64::from(row.sourceid).into(),
            row.xpos.into(),
            row.ypos.into(),
            row.ra.into(),
            row.dec.into(),
            position.ra_rad().into(),
            position.dec_rad().into(),
            row.flux.into(),
            row.sigflux.into(),
            row.mag.into(),
            row.sigmag.into(),
            row.snr.into(),
            row.chi.into(),
            row.sharp.into(),
            row.flags.into(),
        ]);
    }

    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}

#[async_trait]
impl MetadataStore for PgCatalogStore {
    async fn stored_validators(&self, file: &FileRef) -> Result<Option<Validators>, StoreError> {
        let model = ingest_metadata::Entity::find()
            .filter(ingest_metadata::Column::Fieldid.eq(db_fieldid(file.fieldid())?))
            .filter(ingest_metadata::Column::Filter.eq(file.filter().as_str()))
            .filter(ingest_metadata::Column::Ccdid.eq(i32::from(file.ccdid())))
            .filter(ingest_metadata::Column::Qid.eq(i32::from(file.qid())))
            .one(&self.db)
            .await?;

        Ok(model.map(|m| Validators {
            etag: m.etag,
            last_modified: m.last_modified,
            content_length: m.content_length.and_then(|len| u64::try_from(len).ok()),
        }))
    }
}

#[async_trait]
impl CatalogWriter for PgCatalogStore {
    async fn replace_quadrant(
        &self,
        file: &FileRef,
        catalog: &DecodedCatalog,
        validators: &Validators,
    ) -> Result<u64, StoreError> {
        let fieldid = db_fieldid(file.fieldid())?;
        let identity = identity_values(file)?;
        let txn = self.db.begin().await?;

        let header = quadrant::ActiveModel {
            fieldid: Set(fieldid),
            filter: Set(file.filter().as_str().to_string()),
            ccdid: Set(file.ccdid().into()),
            qid: Set(file.qid().into()),
            magzp: Set(catalog.header.magzp),
            magzp_rms: Set(catalog.header.magzp_rms),
            magzp_unc: Set(catalog.header.magzp_unc),
            infobits: Set(catalog.header.infobits),
        };
        quadrant::Entity::insert(header)
            .on_conflict(
                OnConflict::columns([
                    quadrant::Column::Fieldid,
                    quadrant::Column::Filter,
                    quadrant::Column::Ccdid,
                    quadrant::Column::Qid,
                ])
                .update_columns([
                    quadrant::Column::Magzp,
                    quadrant::Column::MagzpRms,
                    quadrant::Column::MagzpUnc,
                    quadrant::Column::Infobits,
                ])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let deleted = txn
            .execute_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "DELETE FROM refpsfcat WHERE fieldid = $1 AND filter = $2 AND ccdid = $3 AND qid = $4",
                identity.clone(),
            ))
            .await?
            .rows_affected();

        let mut inserted = 0u64;
        for chunk in catalog.rows.chunks(INSERT_CHUNK_ROWS) {
            inserted += txn
                .execute_raw(insert_sources_statement(&identity, chunk))
                .await?
                .rows_affected();
        }

        let metadata = ingest_metadata::ActiveModel {
            fieldid: Set(fieldid),
            filter: Set(file.filter().as_str().to_string()),
            ccdid: Set(file.ccdid().into()),
            qid: Set(file.qid().into()),
            etag: Set(validators.etag.clone()),
            last_modified: Set(validators.last_modified.clone()),
            content_length: Set(validators
                .content_length
                .and_then(|len| i64::try_from(len).ok())),
            ingested_at: Set(Utc::now()),
        };
        ingest_metadata::Entity::insert(metadata)
            .on_conflict(
                OnConflict::columns([
                    ingest_metadata::Column::Fieldid,
                    ingest_metadata::Column::Filter,
                    ingest_metadata::Column::Ccdid,
                    ingest_metadata::Column::Qid,
                ])
                .update_columns([
                    ingest_metadata::Column::Etag,
                    ingest_metadata::Column::LastModified,
                    ingest_metadata::Column::ContentLength,
                    ingest_metadata::Column::IngestedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        debug!(file = %file.key(), deleted, inserted, "Quadrant replaced");
        Ok(inserted)
    }
}

#[async_trait]
impl CatalogReader for PgCatalogStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.db.ping().await?;
        Ok(())
    }

    async fn find_source(&self, key: &SourceKey) -> Result<Option<SourceRecord>, StoreError> {
        // Unrepresentable keys cannot have been stored.
        let Ok(identity) = identity_values(&key.file) else {
            return Ok(None);
        };
        let mut values = identity.to_vec();
        values.push(i64::from(key.sourceid).into());
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!(
                "SELECT {SOURCE_COLUMNS} FROM refpsfcat_full \
                 WHERE fieldid = $1 AND filter = $2 AND ccdid = $3 AND qid = $4 AND sourceid = $5"
            ),
            values,
        );

        FullSourceRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(SourceRecord::try_from)
            .transpose()
    }

    async fn cone_search(&self, cone: &ConeQuery) -> Result<Vec<SourceRecord>, StoreError> {
        let mut values: Vec<Value> = vec![
            cone.center.ra_rad().into(),
            cone.center.dec_rad().into(),
            cone.radius_rad().into(),
        ];
        let mut extra = String::new();
        if let Some(filter) = cone.filter {
            values.push(filter.as_str().into());
            extra.push_str(&format!(" AND filter = ${}", values.len()));
        }
        if let Some(fieldid) = cone.fieldid {
            let Ok(fieldid) = db_fieldid(fieldid) else {
                return Ok(Vec::new());
            };
            values.push(fieldid.into());
            extra.push_str(&format!(" AND fieldid = ${}", values.len()));
        }

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!(
                "SELECT {SOURCE_COLUMNS} FROM refpsfcat_full \
                 WHERE coord <@ scircle(spoint($1, $2), $3){extra} \
                 ORDER BY coord <-> spoint($1, $2) \
                 LIMIT {MAX_CONE_RESULTS}"
            ),
            values,
        );

        FullSourceRow::find_by_statement(stmt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(SourceRecord::try_from)
            .collect()
    }

    async fn approximate_counts(&self) -> Result<CatalogStats, StoreError> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "SELECT relname::text AS relname, GREATEST(reltuples, 0)::bigint AS approximate_row_count \
             FROM pg_class WHERE relkind = 'r' AND relname IN ('refpsfcat', 'quadrant')",
        );
        let rows = RelationCount::find_by_statement(stmt).all(&self.db).await?;

        let mut stats = CatalogStats::default();
        for row in rows {
            match row.relname.as_str() {
                "refpsfcat" => stats.approximate_source_count = row.approximate_row_count,
                "quadrant" => stats.approximate_quadrant_count = row.approximate_row_count,
                _ => {}
            }
        }
        Ok(stats)
    }
}
