mod assets;
mod classify;
mod config;
mod error;
mod filename;
mod fonts;
mod model;
mod pdf;

pub use assets::{Asset, AssetMap, Embedded, embed_shots, parse_data_url};
pub use classify::{
    FALLBACK_NOTICE, MEETING_SUMMARY, TUTORIAL, classify_request, classify_text, classify_value,
    schema_label,
};
pub use config::RenderConfig;
pub use error::Error;
pub use filename::{sanitize_filename, suggested_filename};
pub use fonts::{FontContext, FontFace, Weight};
pub use model::*;
pub use pdf::text::{measure, split_paragraphs, wrap};
pub use pdf::{APPENDIX_TITLE, DocumentLayout, DrawOp, Page, unencodable_chars};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Default number of warnings surfaced through [`RenderOutput::warnings_header`].
pub const WARNING_HEADER_LIMIT: usize = 5;

/// A finished document.
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub warnings: Vec<String>,
    pub page_count: usize,
}

impl RenderOutput {
    /// Warnings joined for a single transport header, at most `limit` of them.
    pub fn warnings_header(&self, limit: usize) -> Option<String> {
        if self.warnings.is_empty() || limit == 0 {
            return None;
        }
        let mut value = self
            .warnings
            .iter()
            .take(limit)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ");
        if self.warnings.len() > limit {
            value.push_str(&format!(" (+{} more)", self.warnings.len() - limit));
        }
        Some(value)
    }
}

/// A request laid out into pages but not yet serialized.
pub struct Rendering {
    pub variant: ContentVariant,
    pub layout: DocumentLayout,
    pub assets: AssetMap,
    pub warnings: Vec<String>,
    fonts: FontContext,
}

impl Rendering {
    pub fn title(&self) -> &str {
        self.variant.title()
    }

    pub fn to_pdf(&self, cfg: &RenderConfig) -> Result<RenderOutput, Error> {
        let bytes = pdf::write_pdf(&self.layout, &self.assets, &self.fonts, cfg, self.title())?;
        Ok(RenderOutput {
            bytes,
            filename: suggested_filename(self.title()),
            warnings: self.warnings.clone(),
            page_count: self.layout.pages.len(),
        })
    }
}

/// Embed shots, classify the content and paginate it.
pub fn layout_request(req: &RenderRequest, cfg: &RenderConfig) -> Rendering {
    let t0 = Instant::now();

    let Embedded { assets, mut warnings } = embed_shots(&req.shots);
    let t_embed = t0.elapsed();

    let variant = classify_request(req);
    let t_classify = t0.elapsed();

    let fonts = FontContext::load(cfg);
    let layout = pdf::layout(&variant.to_nodes(), &assets, &fonts, cfg);
    let t_layout = t0.elapsed();

    let missing = pdf::unencodable_chars(&layout, &fonts);
    if !missing.is_empty() {
        let sample: String = missing.iter().take(8).collect();
        log::warn!("{} characters have no glyph in the active fonts: {sample}", missing.len());
        warnings.push(format!(
            "{} characters cannot be shown with the current fonts ({sample}); \
             set SHOTDOC_FONT_REGULAR / SHOTDOC_FONT_BOLD to a font that covers them",
            missing.len()
        ));
    }

    log::info!(
        "Timing: embed={:.1}ms ({} of {} shots), classify={:.1}ms, layout={:.1}ms ({} pages)",
        t_embed.as_secs_f64() * 1000.0,
        assets.len(),
        req.shots.len(),
        (t_classify - t_embed).as_secs_f64() * 1000.0,
        (t_layout - t_classify).as_secs_f64() * 1000.0,
        layout.pages.len(),
    );

    Rendering {
        variant,
        layout,
        assets,
        warnings,
        fonts,
    }
}

pub fn render_request(req: &RenderRequest) -> Result<RenderOutput, Error> {
    render_request_with(req, &RenderConfig::from_env())
}

pub fn render_request_with(req: &RenderRequest, cfg: &RenderConfig) -> Result<RenderOutput, Error> {
    let rendering = layout_request(req, cfg);

    let t0 = Instant::now();
    let output = rendering.to_pdf(cfg)?;
    log::info!(
        "Timing: serialize={:.1}ms (output {} bytes, {} warnings)",
        t0.elapsed().as_secs_f64() * 1000.0,
        output.bytes.len(),
        output.warnings.len(),
    );
    Ok(output)
}

/// Render a request given as wire JSON.
pub fn render_json(json: &[u8], cfg: &RenderConfig) -> Result<RenderOutput, Error> {
    let req: RenderRequest = serde_json::from_slice(json)?;
    render_request_with(&req, cfg)
}

/// Read a request file and write the PDF. With no `output`, the suggested
/// filename is used in the current directory. Returns the path written.
pub fn convert_request_file(
    input: &Path,
    output: Option<&Path>,
    cfg: &RenderConfig,
) -> Result<(PathBuf, RenderOutput), Error> {
    let json = std::fs::read(input).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, input.display()),
        ))
    })?;
    let rendered = render_json(&json, cfg)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&rendered.filename));
    std::fs::write(&path, &rendered.bytes)?;
    Ok((path, rendered))
}
