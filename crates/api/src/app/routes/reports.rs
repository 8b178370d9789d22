//! Genus comparison reports.
//!
//! The report body itself is built elsewhere; this route only establishes
//! that the caller may ask for it. On top of the `:genus` path check, the
//! `genus` query parameter must also name the session's genus.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, Request},
    routing::get,
};
use serde::{Deserialize, Serialize};

use genusdb_auth::{AuthError, require_genus};
use genusdb_core::Genus;

use crate::app::errors::ApiError;
use crate::context::ClaimsContext;
use crate::middleware::{ClaimVerifier, GENUS_PARAM};

pub fn router() -> Router {
    Router::new().route("/genus/:genus/reports/compare", get(compare))
}

/// Rejects requests whose `genus` query parameter is missing or names a
/// genus other than the token's.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryGenusVerifier;

#[derive(Deserialize)]
struct GenusClaim {
    genus: String,
}

impl ClaimVerifier for QueryGenusVerifier {
    fn verify(&self, raw_claims: &[u8], request: &Request) -> Result<(), AuthError> {
        let claim: GenusClaim =
            serde_json::from_slice(raw_claims).map_err(|e| AuthError::decoding(e.to_string()))?;

        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(request.uri())
            .map_err(|_| AuthError::rejected("unreadable query string"))?;

        match params.get(GENUS_PARAM) {
            Some(requested) if *requested == claim.genus => Ok(()),
            Some(_) => Err(AuthError::rejected("query genus does not match session")),
            None => Err(AuthError::rejected("missing genus query parameter")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub genus: Genus,
    #[serde(default)]
    pub metric: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompareRequestEcho {
    pub genus: String,
    pub requested_by: String,
    pub role: &'static str,
    pub metric: Option<String>,
}

pub async fn compare(
    Path(genus): Path<Genus>,
    Query(query): Query<CompareQuery>,
    Extension(ctx): Extension<ClaimsContext>,
) -> Result<Json<CompareRequestEcho>, ApiError> {
    require_genus(ctx.claims(), &genus)?;
    require_genus(ctx.claims(), &query.genus)?;

    Ok(Json(CompareRequestEcho {
        genus: genus.to_string(),
        requested_by: ctx.subject().to_string(),
        role: ctx.role().code(),
        metric: query.metric,
    }))
}
