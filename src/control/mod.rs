use crate::catalog::CatalogError;
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web::ServiceConfig;
use actix_web::HttpResponse;
use derive_more::{Display, Error};
use std::path::PathBuf;

pub mod api;
pub mod pages;

pub type Response = Result<HttpResponse, ControllerError>;

pub const NOT_FOUND: &str = "Not found";

#[derive(Debug, Display, Error)]
pub enum ControllerError {
    /// Missing API entity, answered as JSON.
    #[error(ignore)]
    #[display("{_0}")]
    NotFound(&'static str),
    /// No file in the page fallback chain.
    #[display("Not found")]
    PageNotFound,
    #[error(ignore)]
    #[display("{_0}")]
    InternalServerError(anyhow::Error),
}

impl From<CatalogError> for ControllerError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(msg) => Self::NotFound(msg),
            CatalogError::Store(err) => {
                log::error!("Catalog store failure: {err:?}");
                Self::InternalServerError(err)
            }
        }
    }
}

impl From<anyhow::Error> for ControllerError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalServerError(err)
    }
}

impl From<std::io::Error> for ControllerError {
    fn from(err: std::io::Error) -> Self {
        log::error!("Unable to read page: {err}");
        Self::InternalServerError(err.into())
    }
}

impl actix_web::error::ResponseError for ControllerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ControllerError::NotFound(_) | ControllerError::PageNotFound => StatusCode::NOT_FOUND,
            ControllerError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        log::warn!("{self:?}");
        use ControllerError::*;
        match self {
            NotFound(msg) => HttpResponse::NotFound().json(serde_json::json!({ "error": msg })),
            PageNotFound => not_found_response(),
            InternalServerError(err) => HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": err.to_string() })),
        }
    }
}

fn not_found_response() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type(ContentType::plaintext())
        .body(NOT_FOUND)
}

pub async fn not_found() -> HttpResponse {
    not_found_response()
}

/// Registers every route. Order matters: literal API and page patterns
/// come before the `.html` catch-all, which comes before static files.
pub fn configure(cfg: &mut ServiceConfig, frontend_root: PathBuf) {
    cfg.service(api::health)
        .service(api::list_products)
        .service(api::products_by_subcategory)
        .service(api::product_by_slug)
        .service(api::product_by_article)
        .service(api::product_by_id)
        .service(api::list_subcategories)
        .service(api::subcategory_with_products)
        .service(pages::wp_json)
        .service(pages::elementor)
        .service(pages::wp_includes)
        .service(pages::wp_admin)
        .service(pages::product)
        .service(pages::category)
        .service(pages::decor_category)
        .service(pages::pretty_category)
        .service(pages::direct)
        .service(pages::root)
        .service(
            actix_files::Files::new("/", frontend_root).default_handler(fn_service(
                |req: ServiceRequest| async {
                    let (req, _) = req.into_parts();
                    Ok::<_, actix_web::Error>(ServiceResponse::new(req, not_found_response()))
                },
            )),
        )
        .default_service(actix_web::web::to(not_found));
}
