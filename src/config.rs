use crate::rewrite::{RewriteOptions, RewriteProfile, DEFAULT_ORIGIN, NON_PRODUCT_PAGES};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_CATALOG_DB: &str = "storage/kalium_furniture.db";
pub const DEFAULT_FRONTEND_ROOT: &str = "frontend";

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub catalog_db: PathBuf,
    pub catalog_seed: Option<PathBuf>,
    pub frontend_root: PathBuf,
    pub site_origin: String,
    pub profile: RewriteProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            catalog_db: DEFAULT_CATALOG_DB.into(),
            catalog_seed: None,
            frontend_root: DEFAULT_FRONTEND_ROOT.into(),
            site_origin: DEFAULT_ORIGIN.to_string(),
            profile: RewriteProfile::default(),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    let value = envmnt::get_or(key, "");
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl Config {
    /// Reads the process environment; `.env` must already be loaded.
    pub fn load() -> Result<Self, anyhow::Error> {
        let default = Self::default();
        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|err| anyhow::anyhow!("Invalid PORT {raw:?}: {err}"))?,
            None => default.port,
        };
        let profile = match non_empty("REWRITE_PROFILE") {
            Some(raw) => raw.parse()?,
            None => default.profile,
        };
        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or(default.bind_addr),
            port,
            catalog_db: non_empty("CATALOG_DB").map_or(default.catalog_db, PathBuf::from),
            catalog_seed: non_empty("CATALOG_SEED").map(PathBuf::from),
            frontend_root: non_empty("FRONTEND_ROOT").map_or(default.frontend_root, PathBuf::from),
            site_origin: non_empty("SITE_ORIGIN").unwrap_or(default.site_origin),
            profile,
        })
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            origin: self.site_origin.clone(),
            profile: self.profile,
            non_product_pages: NON_PRODUCT_PAGES.iter().map(ToString::to_string).collect(),
        }
    }
}
