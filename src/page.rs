use crate::rewrite::RewriteProfile;
use std::path::{Path, PathBuf};

pub const PRODUCT_TEMPLATE: &str = "index_tact-mirror.html";
pub const CATEGORY_TEMPLATE: &str = "index_decor.html";
pub const ROOT_TEMPLATE: &str = "index.html";

/// File names the resolver falls back to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTemplates {
    pub product: String,
    pub category: String,
    pub root: String,
    /// Whether a missing direct `.html` page is answered with the category template.
    pub direct_fallback: bool,
}

impl PageTemplates {
    pub fn for_profile(profile: RewriteProfile) -> Self {
        match profile {
            RewriteProfile::Route => Self {
                product: PRODUCT_TEMPLATE.to_string(),
                category: CATEGORY_TEMPLATE.to_string(),
                root: ROOT_TEMPLATE.to_string(),
                direct_fallback: true,
            },
            RewriteProfile::Static => Self {
                product: PRODUCT_TEMPLATE.to_string(),
                category: CATEGORY_TEMPLATE.to_string(),
                root: CATEGORY_TEMPLATE.to_string(),
                direct_fallback: false,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageRequest<'a> {
    Product(&'a str),
    Category(&'a str),
    /// A `.html` path relative to the static root.
    Direct(&'a str),
    Root,
    /// First segment of `/<page>/category/<slug>`.
    Pretty(&'a str),
}

pub struct PageResolver {
    root: PathBuf,
    templates: PageTemplates,
}

impl PageResolver {
    pub fn new(root: impl Into<PathBuf>, templates: PageTemplates) -> Self {
        Self {
            root: root.into(),
            templates,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn templates(&self) -> &PageTemplates {
        &self.templates
    }

    /// Ordered file names to try for a request, relative to the static root.
    pub fn candidates(&self, req: &PageRequest) -> Vec<String> {
        let t = &self.templates;
        match req {
            PageRequest::Product(slug) => vec![format!("index_{slug}.html"), t.product.clone()],
            PageRequest::Category(slug) => vec![
                format!("index_{slug}.html"),
                t.category.clone(),
                t.root.clone(),
            ],
            PageRequest::Direct(path) => {
                let path = path.trim_start_matches('/').to_string();
                if t.direct_fallback {
                    vec![path, t.category.clone()]
                } else {
                    vec![path]
                }
            }
            PageRequest::Root if t.direct_fallback => vec![t.root.clone(), t.category.clone()],
            PageRequest::Root => vec![t.root.clone()],
            PageRequest::Pretty(page) => {
                let page = page.to_string();
                if Path::new(&page).extension().is_none() {
                    vec![page.clone(), format!("{page}.html")]
                } else {
                    vec![page]
                }
            }
        }
    }

    /// Returns the first candidate that exists as a file, or `None`.
    pub async fn resolve(&self, req: &PageRequest<'_>) -> Option<PathBuf> {
        let candidates = self.candidates(req);
        for (i, name) in candidates.iter().enumerate() {
            let Some(relative) = sanitize(name) else {
                log::warn!("Rejected page path {name:?}");
                continue;
            };
            let path = self.root.join(relative);
            if is_file(&path).await {
                if i > 0 {
                    log::info!("{} not found, serving {name}", candidates[0]);
                }
                return Some(path);
            }
        }
        log::info!("Page not found: {req:?}");
        None
    }

    /// Mirrored pages are not always UTF-8; invalid bytes become U+FFFD.
    pub async fn load(&self, req: &PageRequest<'_>) -> Result<Option<String>, std::io::Error> {
        let Some(path) = self.resolve(req).await else {
            return Ok(None);
        };
        let bytes = tokio::fs::read(path).await?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|m| m.is_file())
}

/// Keeps a relative path inside the static root.
pub fn sanitize(name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.contains('\\') {
        return None;
    }
    let mut path = PathBuf::new();
    for segment in name.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn frontend(files: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            let path = dir.path().join(f);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, format!("<html>{f}</html>")).unwrap();
        }
        dir
    }

    fn resolver(dir: &TempDir, profile: RewriteProfile) -> PageResolver {
        PageResolver::new(dir.path(), PageTemplates::for_profile(profile))
    }

    fn name(path: Option<PathBuf>) -> Option<String> {
        path.and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
    }

    #[test]
    fn candidate_chains() {
        let r = PageResolver::new("frontend", PageTemplates::for_profile(RewriteProfile::Route));
        assert_eq!(
            r.candidates(&PageRequest::Product("chair-1")),
            vec!["index_chair-1.html", "index_tact-mirror.html"]
        );
        assert_eq!(
            r.candidates(&PageRequest::Category("rugs")),
            vec!["index_rugs.html", "index_decor.html", "index.html"]
        );
        assert_eq!(
            r.candidates(&PageRequest::Direct("/about.html")),
            vec!["about.html", "index_decor.html"]
        );
        assert_eq!(
            r.candidates(&PageRequest::Root),
            vec!["index.html", "index_decor.html"]
        );
        assert_eq!(
            r.candidates(&PageRequest::Pretty("index_decor")),
            vec!["index_decor", "index_decor.html"]
        );
        assert_eq!(
            r.candidates(&PageRequest::Pretty("shop.html")),
            vec!["shop.html"]
        );

        let s = PageResolver::new("frontend", PageTemplates::for_profile(RewriteProfile::Static));
        assert_eq!(s.candidates(&PageRequest::Root), vec!["index_decor.html"]);
        assert_eq!(s.candidates(&PageRequest::Direct("about.html")), vec!["about.html"]);
    }

    #[actix_web::test]
    async fn product_falls_back_to_template() {
        let dir = frontend(&["index_tact-mirror.html", "index_oslo-rug.html"]);
        let r = resolver(&dir, RewriteProfile::Route);
        assert_eq!(
            name(r.resolve(&PageRequest::Product("oslo-rug")).await).as_deref(),
            Some("index_oslo-rug.html")
        );
        assert_eq!(
            name(r.resolve(&PageRequest::Product("does-not-exist")).await).as_deref(),
            Some("index_tact-mirror.html")
        );
    }

    #[actix_web::test]
    async fn category_chain_ends_at_root_template() {
        let dir = frontend(&["index.html"]);
        let r = resolver(&dir, RewriteProfile::Route);
        assert_eq!(
            name(r.resolve(&PageRequest::Category("living")).await).as_deref(),
            Some("index.html")
        );

        let empty = frontend(&[]);
        let r = resolver(&empty, RewriteProfile::Route);
        assert!(r.resolve(&PageRequest::Category("living")).await.is_none());
    }

    #[actix_web::test]
    async fn direct_pages_fall_back_only_for_routes() {
        let dir = frontend(&["index_decor.html", "blog/post.html"]);
        let route = resolver(&dir, RewriteProfile::Route);
        assert_eq!(
            name(route.resolve(&PageRequest::Direct("blog/post.html")).await).as_deref(),
            Some("post.html")
        );
        assert_eq!(
            name(route.resolve(&PageRequest::Direct("missing.html")).await).as_deref(),
            Some("index_decor.html")
        );

        let mirror = resolver(&dir, RewriteProfile::Static);
        assert!(mirror.resolve(&PageRequest::Direct("missing.html")).await.is_none());
        assert_eq!(
            name(mirror.resolve(&PageRequest::Root).await).as_deref(),
            Some("index_decor.html")
        );
    }

    #[actix_web::test]
    async fn pretty_urls_decline_when_missing() {
        let dir = frontend(&["index_decor.html"]);
        let r = resolver(&dir, RewriteProfile::Route);
        assert_eq!(
            name(r.resolve(&PageRequest::Pretty("index_decor")).await).as_deref(),
            Some("index_decor.html")
        );
        assert!(r.resolve(&PageRequest::Pretty("shop")).await.is_none());
    }

    #[actix_web::test]
    async fn never_leaves_the_root() {
        let outer = frontend(&["secret.html", "site/index_decor.html"]);
        let r = PageResolver::new(
            outer.path().join("site"),
            PageTemplates {
                direct_fallback: false,
                ..PageTemplates::for_profile(RewriteProfile::Route)
            },
        );
        assert!(r.resolve(&PageRequest::Direct("../secret.html")).await.is_none());
        assert!(r.resolve(&PageRequest::Direct("a//b.html")).await.is_none());
        assert!(r.resolve(&PageRequest::Direct("..\\secret.html")).await.is_none());
        assert!(r.load(&PageRequest::Pretty("..")).await.unwrap().is_none());
        assert_eq!(
            r.load(&PageRequest::Direct("index_decor.html")).await.unwrap().as_deref(),
            Some("<html>site/index_decor.html</html>")
        );
    }

    #[actix_web::test]
    async fn loads_pages_that_are_not_utf8() {
        let dir = frontend(&[]);
        fs::write(dir.path().join("latin1.html"), b"caf\xe9").unwrap();
        let r = resolver(&dir, RewriteProfile::Route);
        assert_eq!(
            r.load(&PageRequest::Direct("latin1.html")).await.unwrap().as_deref(),
            Some("caf\u{FFFD}")
        );
    }
}
