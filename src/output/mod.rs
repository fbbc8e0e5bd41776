//! Page output state for one request.
//!
//! # Responsibilities
//! - Track the page title, layout and CSS/JS files for the current page
//! - Discover per-page assets from the matched controller identity
//!
//! # Design Decisions
//! - Owned by the application instance; never a process-wide static
//! - Template rendering is left to the application's handlers
//! - Asset paths follow the `pages/<controller>` convention, lower-cased,
//!   with namespace separators mapped to `/` and `_` mapped to `-`

use std::path::PathBuf;

use crate::config::OutputConfig;
use crate::error::DispatchError;
use crate::routing::Router;

/// Kind of page asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Css,
    Js,
}

impl AssetKind {
    fn extension(self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Js => "js",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Output {
    config: OutputConfig,
    title: Option<String>,
    layout: String,
    css_files: Vec<String>,
    js_files: Vec<String>,
}

impl Output {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            title: None,
            layout: "Default".to_string(),
            css_files: Vec::new(),
            js_files: Vec::new(),
        }
    }

    pub fn set_page_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Page title, falling back to the configured site name.
    pub fn page_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.config.site_name)
    }

    pub fn set_layout(&mut self, layout: impl Into<String>) {
        self.layout = layout.into();
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    pub fn add_css_file(&mut self, name: &str) {
        let url = self.asset_url(AssetKind::Css, name);
        self.css_files.push(url);
    }

    pub fn add_js_file(&mut self, name: &str) {
        let url = self.asset_url(AssetKind::Js, name);
        self.js_files.push(url);
    }

    pub fn css_files(&self) -> &[String] {
        &self.css_files
    }

    pub fn js_files(&self) -> &[String] {
        &self.js_files
    }

    fn asset_url(&self, kind: AssetKind, name: &str) -> String {
        if name.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("http")) {
            return name.to_string();
        }
        let dir = match kind {
            AssetKind::Css => &self.config.css_dir,
            AssetKind::Js => &self.config.js_dir,
        };
        format!("/{}{}.{}", dir, name, kind.extension())
    }

    /// Add the matched controller's page CSS/JS when the files exist.
    ///
    /// Returns the number of files added.
    pub fn collect_page_assets(&mut self, router: &Router) -> Result<usize, DispatchError> {
        let controller = router.controller(true)?;
        let stem = page_asset_stem(&controller);
        let mut added = 0;

        for kind in [AssetKind::Css, AssetKind::Js] {
            let enabled = match kind {
                AssetKind::Css => self.config.auto_add_page_css,
                AssetKind::Js => self.config.auto_add_page_js,
            };
            if !enabled {
                continue;
            }
            if self.asset_path(kind, &stem).is_file() {
                tracing::debug!(controller = %controller, asset = %stem, kind = kind.extension(), "Adding page asset");
                match kind {
                    AssetKind::Css => self.add_css_file(&stem),
                    AssetKind::Js => self.add_js_file(&stem),
                }
                added += 1;
            }
        }
        Ok(added)
    }

    fn asset_path(&self, kind: AssetKind, stem: &str) -> PathBuf {
        let dir = match kind {
            AssetKind::Css => &self.config.css_dir,
            AssetKind::Js => &self.config.js_dir,
        };
        PathBuf::from(&self.config.public_dir)
            .join(dir)
            .join(format!("{}.{}", stem, kind.extension()))
    }
}

/// `pages/<normalized controller>` for a controller identity.
pub fn page_asset_stem(controller: &str) -> String {
    let normalized = controller
        .replace("::", "/")
        .replace("->", "/")
        .replace('\\', "/")
        .replace('_', "-")
        .to_lowercase();
    format!("pages/{}", normalized.trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OutputConfig {
        OutputConfig {
            site_name: "Maverick".into(),
            ..OutputConfig::default()
        }
    }

    #[test]
    fn test_page_asset_stem() {
        assert_eq!(page_asset_stem("Users\\Show_Profile"), "pages/users/show-profile");
        assert_eq!(page_asset_stem("Admin::Dashboard"), "pages/admin/dashboard");
        assert_eq!(page_asset_stem("home"), "pages/home");
    }

    #[test]
    fn test_title_falls_back_to_site_name() {
        let mut output = Output::new(config());
        assert_eq!(output.page_title(), "Maverick");
        output.set_page_title("Users");
        assert_eq!(output.page_title(), "Users");
    }

    #[test]
    fn test_asset_urls() {
        let mut output = Output::new(config());
        output.add_css_file("site");
        output.add_css_file("https://cdn.example.com/lib.css");
        output.add_js_file("app");
        assert_eq!(output.css_files(), ["/css/site.css", "https://cdn.example.com/lib.css"]);
        assert_eq!(output.js_files(), ["/js/app.js"]);
    }
}
