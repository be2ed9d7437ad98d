use crate::control::{ControllerError, Response};
use crate::page::{sanitize, PageRequest, PageResolver};
use crate::rewrite::LinkRewriter;
use actix_files::NamedFile;
use actix_web::http::header::ContentType;
use actix_web::web::{Data, Path};
use actix_web::{get, route, HttpRequest, HttpResponse};

/// Page resolver and link rewriter shared by the HTML routes.
pub struct Site {
    resolver: PageResolver,
    rewriter: LinkRewriter,
}

impl Site {
    pub fn new(resolver: PageResolver, rewriter: LinkRewriter) -> Self {
        Self { resolver, rewriter }
    }

    async fn render(&self, req: PageRequest<'_>) -> Result<Option<HttpResponse>, ControllerError> {
        let Some(html) = self.resolver.load(&req).await? else {
            return Ok(None);
        };
        Ok(Some(
            HttpResponse::Ok()
                .content_type(ContentType::html())
                .body(self.rewriter.rewrite(&html)),
        ))
    }

    async fn serve(&self, req: PageRequest<'_>) -> Response {
        self.render(req).await?.ok_or(ControllerError::PageNotFound)
    }
}

#[get("/product/{slug}")]
pub async fn product(site: Data<Site>, slug: Path<String>) -> Response {
    site.serve(PageRequest::Product(&slug)).await
}

#[get("/category/{slug}")]
pub async fn category(site: Data<Site>, slug: Path<String>) -> Response {
    site.serve(PageRequest::Category(&slug)).await
}

#[get("/index_decor/category/{slug}")]
pub async fn decor_category(site: Data<Site>, slug: Path<String>) -> Response {
    site.serve(PageRequest::Category(&slug)).await
}

/// `/<page>/category/<slug...>` serves `<page>` itself. Without such a page
/// the request goes on as a direct `.html` page or, for anything else, as a
/// plain static file.
#[get("/{page}/category/{slug:.*}")]
pub async fn pretty_category(
    site: Data<Site>,
    path: Path<(String, String)>,
    req: HttpRequest,
) -> Response {
    let (page, _) = path.into_inner();
    if let Some(res) = site.render(PageRequest::Pretty(&page)).await? {
        return Ok(res);
    }
    if req.path().ends_with(".html") {
        return site.serve(PageRequest::Direct(req.path())).await;
    }
    let relative =
        sanitize(req.path().trim_start_matches('/')).ok_or(ControllerError::PageNotFound)?;
    match NamedFile::open_async(site.resolver.root().join(relative)).await {
        Ok(file) => Ok(file.into_response(&req)),
        Err(_) => Err(ControllerError::PageNotFound),
    }
}

#[get("/{path:.*\\.html}")]
pub async fn direct(site: Data<Site>, path: Path<String>) -> Response {
    site.serve(PageRequest::Direct(&path)).await
}

#[get("/")]
pub async fn root(site: Data<Site>) -> Response {
    site.serve(PageRequest::Root).await
}

#[route("/wp-json{tail:.*}", method = "GET", method = "POST")]
pub async fn wp_json() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({}))
}

#[route("/elementor/{tail:.*}", method = "GET", method = "POST")]
pub async fn elementor() -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[route("/wp-includes/{tail:.*}", method = "GET", method = "POST")]
pub async fn wp_includes() -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[route("/wp-admin/{tail:.*}", method = "GET", method = "POST")]
pub async fn wp_admin() -> HttpResponse {
    HttpResponse::Ok().finish()
}
