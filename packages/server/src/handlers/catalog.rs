use axum::{Json, extract::State};
use common::{CatalogStats, SourceKey, SourceRecord};
use tracing::{debug, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::query::AppQuery;
use crate::models::catalog::{ConeParams, ObjectQuery, SourceQuery};
use crate::state::AppState;

async fn find_source(state: &AppState, key: &SourceKey) -> Result<SourceRecord, AppError> {
    state
        .bounded(state.catalog.find_source(key))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Source {} not found", key.object_id())))
}

#[utoipa::path(
    get,
    path = "/source",
    tag = "Catalog",
    operation_id = "getSource",
    summary = "Look up a source by its components",
    description = "Returns one source joined with its quadrant calibration. NaN values are returned as null.",
    params(SourceQuery),
    responses(
        (status = 200, description = "Source found", body = SourceRecord),
        (status = 400, description = "Invalid parameters (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No such source (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Store unavailable (UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(fieldid = query.fieldid, filter = %query.filter, ccdid = query.ccdid, qid = query.qid, sourceid = query.sourceid))]
pub async fn get_source(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SourceQuery>,
) -> Result<Json<SourceRecord>, AppError> {
    let key = query.key()?;
    Ok(Json(find_source(&state, &key).await?))
}

#[utoipa::path(
    get,
    path = "/object",
    tag = "Catalog",
    operation_id = "getObject",
    summary = "Look up a source by object ID",
    description = "Decodes a ZTF DR object ID into its field, filter, CCD, quadrant and source components and returns that source.",
    params(ObjectQuery),
    responses(
        (status = 200, description = "Source found", body = SourceRecord),
        (status = 400, description = "Malformed object ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No such source (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Store unavailable (UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(oid = %query.oid))]
pub async fn get_object(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ObjectQuery>,
) -> Result<Json<SourceRecord>, AppError> {
    let key = SourceKey::from_object_id(&query.oid)?;
    Ok(Json(find_source(&state, &key).await?))
}

#[utoipa::path(
    get,
    path = "/cone",
    tag = "Catalog",
    operation_id = "coneSearch",
    summary = "Cone search",
    description = "Returns sources within `radius_arcsec` (at most 60) of (ra, dec), nearest first, capped at 1000 rows. Optionally restricted to one filter and/or field.",
    params(ConeParams),
    responses(
        (status = 200, description = "Matching sources ordered by angular distance", body = Vec<SourceRecord>),
        (status = 400, description = "Invalid parameters (VALIDATION_ERROR)", body = ErrorBody),
        (status = 503, description = "Store unavailable (UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, params), fields(ra = params.ra, dec = params.dec, radius_arcsec = params.radius_arcsec))]
pub async fn cone_search(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ConeParams>,
) -> Result<Json<Vec<SourceRecord>>, AppError> {
    let cone = params.to_query()?;
    let rows = state.bounded(state.catalog.cone_search(&cone)).await?;
    debug!(count = rows.len(), "Cone search complete");
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Catalog",
    operation_id = "getStats",
    summary = "Approximate catalog size",
    description = "Planner estimates of the source and quadrant row counts. Cheap, but may lag recent ingests.",
    responses(
        (status = 200, description = "Approximate counts", body = CatalogStats),
        (status = 503, description = "Store unavailable (UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<CatalogStats>, AppError> {
    Ok(Json(state.bounded(state.catalog.approximate_counts()).await?))
}
