//! Localizes links inside mirrored WordPress pages.
//!
//! Pages are treated as plain text; every rule is a regex plus a replacement
//! computed from its captures, applied in a fixed order.

use lazy_regex::regex;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_ORIGIN: &str = "https://sites.kaliumtheme.com/elementor/furniture";
pub const NON_PRODUCT_PAGES: [&str; 3] = ["decor", "mirrors", "rugs"];
pub const ASSET_EXTENSIONS: [&str; 17] = [
    "css", "js", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf", "eot",
    "otf", "map", "mp4", "webm",
];

/// Which legacy server the rewritten pages are meant for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RewriteProfile {
    /// Links point at server routes (`/product/<slug>`, `/index_decor/category/<slug>`).
    #[default]
    Route,
    /// Links point at mirrored files (`/index_<slug>.html`).
    Static,
}

impl RewriteProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteProfile::Route => "route",
            RewriteProfile::Static => "static",
        }
    }
}

impl FromStr for RewriteProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "route" => Ok(RewriteProfile::Route),
            "static" => Ok(RewriteProfile::Static),
            other => Err(anyhow::anyhow!("Unknown rewrite profile {other:?}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RewriteOptions {
    pub origin: String,
    pub profile: RewriteProfile,
    pub non_product_pages: Vec<String>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            profile: RewriteProfile::default(),
            non_product_pages: NON_PRODUCT_PAGES.iter().map(ToString::to_string).collect(),
        }
    }
}

type Replacement = Box<dyn Fn(&Captures) -> String + Send + Sync>;

pub struct RewriteRule {
    name: &'static str,
    pattern: Regex,
    replace: Replacement,
}

impl RewriteRule {
    fn new(
        name: &'static str,
        pattern: Regex,
        replace: impl Fn(&Captures) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            pattern,
            replace: Box::new(replace),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, |c: &Captures| (self.replace)(c))
    }
}

impl std::fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Ordered rule set, built once at startup and shared between workers.
#[derive(Debug)]
pub struct LinkRewriter {
    profile: RewriteProfile,
    rules: Vec<RewriteRule>,
}

impl LinkRewriter {
    pub fn new(options: RewriteOptions) -> Result<Self, regex::Error> {
        let origin = options.origin.trim_end_matches('/').to_string();
        let escaped = regex::escape(&origin);
        let mut rules = vec![
            product_rule(&escaped, options.profile)?,
            category_rule(&escaped, options.profile)?,
        ];
        if options.profile == RewriteProfile::Route {
            rules.push(legacy_page_rule(options.non_product_pages));
        }
        rules.push(site_root_rule(&escaped)?);
        rules.push(wp_asset_rule(origin));
        rules.push(onclick_rule());
        Ok(Self {
            profile: options.profile,
            rules,
        })
    }

    pub fn profile(&self) -> RewriteProfile {
        self.profile
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&RewriteRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn rewrite(&self, html: &str) -> String {
        let mut out = html.to_string();
        for rule in &self.rules {
            let rewritten = match rule.apply(&out) {
                Cow::Borrowed(_) => None,
                Cow::Owned(s) => Some(s),
            };
            if let Some(s) = rewritten {
                out = s;
            }
        }
        out
    }
}

fn product_rule(origin: &str, profile: RewriteProfile) -> Result<RewriteRule, regex::Error> {
    let pattern = Regex::new(&format!(r"{origin}/product/([a-zA-Z0-9\-]+)/?"))?;
    Ok(RewriteRule::new("product", pattern, move |c| {
        let slug = &c[1];
        log::debug!("Rewriting product link {slug}");
        match profile {
            RewriteProfile::Route => format!("/product/{slug}"),
            RewriteProfile::Static => format!("/index_{slug}.html"),
        }
    }))
}

/// Nested category paths keep only one segment: the deepest one for routes,
/// the top-level one for mirrored files.
fn category_rule(origin: &str, profile: RewriteProfile) -> Result<RewriteRule, regex::Error> {
    let pattern = Regex::new(&format!(r"{origin}/product-category/([a-zA-Z0-9\-/]+)/?"))?;
    Ok(RewriteRule::new("category", pattern, move |c| {
        let mut segments = c[1].split('/').filter(|s| !s.is_empty());
        let segment = match profile {
            RewriteProfile::Route => segments.last(),
            RewriteProfile::Static => segments.next(),
        };
        let Some(segment) = segment else {
            return c[0].to_string();
        };
        log::debug!("Rewriting category link {} -> {segment}", &c[1]);
        match profile {
            RewriteProfile::Route => format!("/index_decor/category/{segment}"),
            RewriteProfile::Static => format!("/index_{segment}.html"),
        }
    }))
}

fn legacy_page_rule(non_product_pages: Vec<String>) -> RewriteRule {
    let pattern = Regex::clone(regex!(r"/index_([a-zA-Z0-9\-]+)\.html"));
    RewriteRule::new("legacy_page", pattern, move |c| {
        let slug = &c[1];
        if non_product_pages.iter().any(|p| p == slug) {
            return c[0].to_string();
        }
        log::debug!("Rewriting legacy product page {slug}");
        format!("/product/{slug}")
    })
}

fn site_root_rule(origin: &str) -> Result<RewriteRule, regex::Error> {
    let pattern = Regex::new(&format!(r#"{origin}/([^\s"'<>)\\]*)"#))?;
    Ok(RewriteRule::new("site_root", pattern, |c| {
        let rest = &c[1];
        if is_asset(rest) {
            c[0].to_string()
        } else {
            format!("/{rest}")
        }
    }))
}

/// The mirror holds no binary assets, so root-relative asset references
/// are pointed back at the original host.
fn wp_asset_rule(origin: String) -> RewriteRule {
    let pattern = Regex::clone(regex!(r#"["']/(wp-content|wp-includes)/([^"']+)["']"#));
    RewriteRule::new("wp_asset", pattern, move |c| {
        format!("\"{origin}/{}/{}\"", &c[1], &c[2])
    })
}

fn onclick_rule() -> RewriteRule {
    let pattern = Regex::clone(regex!(
        r#"onclick="window\.location\.href=this\.href; return false;""#
    ));
    RewriteRule::new("onclick", pattern, |_| String::new())
}

pub fn is_asset(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    if path.starts_with("wp-content/") || path.starts_with("wp-includes/") {
        return true;
    }
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ASSET_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://sites.kaliumtheme.com/elementor/furniture";

    fn route() -> LinkRewriter {
        LinkRewriter::new(RewriteOptions::default()).unwrap()
    }

    fn mirror() -> LinkRewriter {
        LinkRewriter::new(RewriteOptions {
            profile: RewriteProfile::Static,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn rule_order_per_profile() {
        let names = |r: &LinkRewriter| r.rules().iter().map(RewriteRule::name).collect::<Vec<_>>();
        assert_eq!(
            names(&route()),
            vec!["product", "category", "legacy_page", "site_root", "wp_asset", "onclick"]
        );
        assert_eq!(
            names(&mirror()),
            vec!["product", "category", "site_root", "wp_asset", "onclick"]
        );
    }

    #[test]
    fn product_links_become_routes() {
        let html = format!(r#"<a href="{ORIGIN}/product/chair-1/">Chair</a>"#);
        let out = route().rewrite(&html);
        assert_eq!(out, r#"<a href="/product/chair-1">Chair</a>"#);
        assert!(!out.contains(ORIGIN));
    }

    #[test]
    fn product_links_become_mirror_files() {
        let html = format!(r#"<a href="{ORIGIN}/product/chair-1/">Chair</a>"#);
        assert_eq!(mirror().rewrite(&html), r#"<a href="/index_chair-1.html">Chair</a>"#);
    }

    #[test]
    fn category_segment_differs_per_profile() {
        let html = format!(r#"<a href="{ORIGIN}/product-category/decor/mirrors/">x</a>"#);
        assert_eq!(
            route().rewrite(&html),
            r#"<a href="/index_decor/category/mirrors">x</a>"#
        );
        assert_eq!(mirror().rewrite(&html), r#"<a href="/index_decor.html">x</a>"#);

        let flat = format!("{ORIGIN}/product-category/rugs");
        assert_eq!(route().rewrite(&flat), "/index_decor/category/rugs");
        assert_eq!(mirror().rewrite(&flat), "/index_rugs.html");
    }

    #[test]
    fn legacy_pages_skip_category_pages() {
        let r = route();
        let rule = r.rule("legacy_page").unwrap();
        assert_eq!(
            rule.apply(
                r#"<a href="/index_tact-mirror.html"></a><a href="/index_decor.html"></a><a href="/index_rugs.html"></a>"#
            ),
            r#"<a href="/product/tact-mirror"></a><a href="/index_decor.html"></a><a href="/index_rugs.html"></a>"#
        );
        assert!(mirror().rule("legacy_page").is_none());
    }

    #[test]
    fn site_root_keeps_assets_absolute() {
        let r = route();
        let rule = r.rule("site_root").unwrap();
        assert_eq!(rule.apply(&format!(r#"href="{ORIGIN}/about-us/""#)), r#"href="/about-us/""#);
        assert_eq!(rule.apply(&format!(r#"href="{ORIGIN}/""#)), r#"href="/""#);
        for asset in [
            format!("{ORIGIN}/wp-content/uploads/chair.jpg"),
            format!("{ORIGIN}/wp-includes/js/jquery.js?ver=3.7"),
            format!("{ORIGIN}/fonts/icons.woff2"),
            format!("{ORIGIN}/style.CSS#x"),
        ] {
            assert_eq!(rule.apply(&asset), asset);
        }
    }

    #[test]
    fn root_relative_assets_point_to_origin() {
        let out = route().rewrite(r#"<link href="/wp-content/theme.css"><script src='/wp-includes/js/a.js'></script>"#);
        assert_eq!(
            out,
            format!(
                r#"<link href="{ORIGIN}/wp-content/theme.css"><script src="{ORIGIN}/wp-includes/js/a.js"></script>"#
            )
        );
        assert!(!out.contains(r#""/wp-content/theme.css""#));
    }

    #[test]
    fn strips_forced_navigation() {
        let html = r#"<a href="/x" onclick="window.location.href=this.href; return false;">x</a>"#;
        assert_eq!(mirror().rewrite(html), r#"<a href="/x" >x</a>"#);
    }

    #[test]
    fn rewriting_is_idempotent() {
        let html = format!(
            r#"<a href="{ORIGIN}/product/chair-1/"></a>
<a href="{ORIGIN}/product-category/decor/rugs/"></a>
<a href="/index_oslo-rug.html"></a><a href="/index_mirrors.html"></a>
<a href="{ORIGIN}/contact/"></a>
<img src="{ORIGIN}/wp-content/uploads/a.png">
<link href="/wp-content/themes/kalium/style.css">"#
        );
        for r in [route(), mirror()] {
            let once = r.rewrite(&html);
            assert_eq!(r.rewrite(&once), once, "profile {}", r.profile().as_str());
        }
    }

    #[test]
    fn custom_origin_and_exclusions() {
        let r = LinkRewriter::new(RewriteOptions {
            origin: "https://shop.example.com/".to_string(),
            profile: RewriteProfile::Route,
            non_product_pages: vec!["lamps".to_string()],
        })
        .unwrap();
        assert_eq!(r.rewrite("https://shop.example.com/product/lamp-2"), "/product/lamp-2");
        assert_eq!(r.rewrite("/index_lamps.html"), "/index_lamps.html");
        assert_eq!(r.rewrite("/index_decor.html"), "/product/decor");
        assert_eq!(
            r.rewrite(&format!("{ORIGIN}/product/chair-1/")),
            format!("{ORIGIN}/product/chair-1/")
        );
    }

    #[test]
    fn parses_profile_names() {
        assert_eq!("route".parse::<RewriteProfile>().unwrap(), RewriteProfile::Route);
        assert_eq!(" Static ".parse::<RewriteProfile>().unwrap(), RewriteProfile::Static);
        assert!("mirror".parse::<RewriteProfile>().is_err());
    }
}
