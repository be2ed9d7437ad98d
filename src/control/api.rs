use crate::catalog::Catalog;
use crate::control::Response;
use crate::empty_string_as_none;
use actix_web::get;
use actix_web::web::{Data, Path, Query};
use actix_web::HttpResponse;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductsQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    subcategory: Option<String>,
    /// Present but empty still filters, to inactive products.
    #[serde(default)]
    is_active: Option<String>,
}

#[get("/api/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[get("/api/products")]
pub async fn list_products(catalog: Data<Catalog>, params: Query<ProductsQuery>) -> Response {
    let params = params.into_inner();
    let query = catalog
        .resolve_query(
            params.category.as_deref(),
            params.subcategory.as_deref(),
            params.is_active.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(catalog.list(&query).await?))
}

#[get("/api/products/subcategory/{slug}")]
pub async fn products_by_subcategory(catalog: Data<Catalog>, slug: Path<String>) -> Response {
    let products = catalog.list_by_subcategory_slug(&slug).await?;
    Ok(HttpResponse::Ok().json(products))
}

#[get("/api/products/slug/{slug}")]
pub async fn product_by_slug(catalog: Data<Catalog>, slug: Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.get_by_slug(&slug).await?))
}

#[get("/api/products/article/{article}")]
pub async fn product_by_article(catalog: Data<Catalog>, article: Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.get_by_article(&article).await?))
}

#[get("/api/products/{id}")]
pub async fn product_by_id(catalog: Data<Catalog>, id: Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.get_by_id(&id).await?))
}

#[get("/api/subcategories")]
pub async fn list_subcategories(catalog: Data<Catalog>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.list_subcategories().await?))
}

#[get("/api/subcategories/{slug}")]
pub async fn subcategory_with_products(catalog: Data<Catalog>, slug: Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.subcategory_with_products(&slug).await?))
}
