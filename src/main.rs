use actix_web::middleware::{DefaultHeaders, NormalizePath, TrailingSlash};
use actix_web::{web::Data, App, HttpServer};
use anyhow::Context;
use kalium_server::catalog::Catalog;
use kalium_server::config::Config;
use kalium_server::control::{self, pages::Site};
use kalium_server::page::{PageResolver, PageTemplates};
use kalium_server::product::SqliteProductRepository;
use kalium_server::rewrite::LinkRewriter;
use kalium_server::subcategory::SqliteSubcategoryRepository;
use kalium_types::product::ProductRepository;
use kalium_types::subcategory::SubcategoryRepository;
use log_error::LogError;
use std::env;
use std::sync::Arc;
use tokio_rusqlite::Connection;

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "INFO");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    match std::fs::File::open(".env") {
        Ok(_) => envmnt::load_file(".env")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::fs::File::create(".env")?;
            envmnt::load_file(".env")?;
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to open .env file: {err}"));
        }
    }
    let config = Config::load()?;

    if let Some(dir) = config.catalog_db.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Unable to create {}", dir.display()))?;
    }
    let conn = Connection::open(&config.catalog_db).await?;
    let subcategory_repository: Arc<dyn SubcategoryRepository> =
        Arc::new(SqliteSubcategoryRepository::init(conn.clone()).await?);
    let product_repository: Arc<dyn ProductRepository> =
        Arc::new(SqliteProductRepository::init(conn).await?);
    log::info!("Catalog store at {}", config.catalog_db.display());

    if let Some(seed) = &config.catalog_seed {
        if let Some((subcategories, products)) = kalium_server::import_catalog(
            seed,
            subcategory_repository.clone(),
            product_repository.clone(),
        )
        .await
        .log_error("Unable to import catalog seed")
        {
            log::info!(
                "Imported {subcategories} subcategories and {products} products from {}",
                seed.display()
            );
        }
    }

    let catalog = Catalog::new(product_repository, subcategory_repository);
    let rewriter = LinkRewriter::new(config.rewrite_options())
        .context("Unable to build link rewrite rules")?;
    let resolver = PageResolver::new(
        &config.frontend_root,
        PageTemplates::for_profile(config.profile),
    );
    let site = Data::new(Site::new(resolver, rewriter));
    let catalog = Data::new(catalog);
    log::info!(
        "Serving {} with {} rewrites for {}",
        config.frontend_root.display(),
        config.profile.as_str(),
        config.site_origin
    );

    let frontend_root = config.frontend_root.clone();
    let addr = (config.bind_addr.clone(), config.port);
    HttpServer::new(move || {
        let frontend_root = frontend_root.clone();
        App::new()
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Methods", "GET, OPTIONS"))
                    .add(("Access-Control-Allow-Headers", "*")),
            )
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .app_data(catalog.clone())
            .app_data(site.clone())
            .configure(move |cfg| control::configure(cfg, frontend_root))
    })
    .bind(addr.clone())
    .with_context(|| {
        format!(
            "Failed to bind server to {}:{}. Is the port already in use?",
            addr.0, addr.1
        )
    })?
    .run()
    .await?;
    Ok(())
}
