use std::path::PathBuf;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 48.0;

pub const TITLE_SIZE: f32 = 24.0;
pub const SUBTITLE_SIZE: f32 = 18.0;
pub const HEADING_SIZE: f32 = 16.0;
pub const BODY_SIZE: f32 = 12.0;
pub const SMALL_SIZE: f32 = 11.0;
pub const LINE_GAP: f32 = 4.0;

/// Ceiling on the displayed height of an inline screenshot, in points.
pub const IMAGE_MAX_HEIGHT: f32 = 280.0;

/// Page geometry, type scale and font sources for one render.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub title_size: f32,
    pub subtitle_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
    pub small_size: f32,
    pub line_gap: f32,
    pub image_max_height: f32,
    /// TrueType/OpenType file for the regular face. `None` uses Helvetica.
    pub font_regular: Option<PathBuf>,
    /// TrueType/OpenType file for the bold face. `None` uses Helvetica-Bold.
    pub font_bold: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_width: PAGE_WIDTH,
            page_height: PAGE_HEIGHT,
            margin: MARGIN,
            title_size: TITLE_SIZE,
            subtitle_size: SUBTITLE_SIZE,
            heading_size: HEADING_SIZE,
            body_size: BODY_SIZE,
            small_size: SMALL_SIZE,
            line_gap: LINE_GAP,
            image_max_height: IMAGE_MAX_HEIGHT,
            font_regular: None,
            font_bold: None,
        }
    }
}

impl RenderConfig {
    /// Defaults, with font files taken from `SHOTDOC_FONT_REGULAR` / `SHOTDOC_FONT_BOLD`.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// [`RenderConfig::from_env`] over an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path_var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            font_regular: path_var("SHOTDOC_FONT_REGULAR"),
            font_bold: path_var("SHOTDOC_FONT_BOLD"),
            ..Self::default()
        }
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Highest usable cursor position on a fresh page.
    pub fn top(&self) -> f32 {
        self.page_height - self.margin
    }
}
