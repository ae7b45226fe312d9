use crate::assets::AssetMap;
use crate::fonts::Weight;
use crate::model::{ContentNode, HeadingLevel, META_SEPARATOR, TextSize};

use super::flow::{Canvas, RenderState};
use super::text::{split_paragraphs, wrap};

pub fn render_nodes(
    canvas: &mut Canvas,
    state: &mut RenderState,
    nodes: &[ContentNode],
    assets: &AssetMap,
) {
    for node in nodes {
        render_node(canvas, state, node, assets);
    }
}

pub fn render_node(
    canvas: &mut Canvas,
    state: &mut RenderState,
    node: &ContentNode,
    assets: &AssetMap,
) {
    let cfg = canvas.cfg;
    match node {
        ContentNode::Title(text) => draw_title(canvas, state, text),
        ContentNode::Heading { text, level } => {
            let size = match level {
                HeadingLevel::Subtitle => cfg.subtitle_size,
                HeadingLevel::Section => cfg.heading_size,
            };
            draw_heading(canvas, state, text, size);
        }
        ContentNode::Paragraph { text, size, bold } => {
            let size = match size {
                TextSize::Body => cfg.body_size,
                TextSize::Small => cfg.small_size,
            };
            let weight = if *bold { Weight::Bold } else { Weight::Regular };
            draw_paragraph(canvas, state, text, size, weight);
        }
        ContentNode::MetaLine(parts) => draw_meta_line(canvas, state, parts),
        ContentNode::ShotReference(id) => draw_shot(canvas, state, id, assets),
    }
}

pub fn draw_title(canvas: &mut Canvas, state: &mut RenderState, text: &str) {
    let size = canvas.cfg.title_size;
    let spacing = 2.0 * canvas.cfg.line_gap;
    draw_bold_lines(canvas, state, text, size, spacing);
}

pub fn draw_heading(canvas: &mut Canvas, state: &mut RenderState, text: &str, size: f32) {
    let spacing = canvas.cfg.line_gap;
    draw_bold_lines(canvas, state, text, size, spacing);
}

/// Wrapped bold lines one gap apart, with `spacing` after the last.
fn draw_bold_lines(
    canvas: &mut Canvas,
    state: &mut RenderState,
    text: &str,
    size: f32,
    spacing: f32,
) {
    let gap = canvas.cfg.line_gap;
    let face = canvas.face(Weight::Bold);
    let lines = wrap(text, face, size, canvas.cfg.content_width());
    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.iter().enumerate() {
        let height = if i == last { size + spacing } else { size + gap };
        canvas.ensure_space(state, height);
        canvas.draw_text(state, line, Weight::Bold, size);
        canvas.advance(state, height);
    }
}

/// Wrapped lines of each sub-paragraph, one gap between sub-paragraphs.
pub fn draw_paragraph(
    canvas: &mut Canvas,
    state: &mut RenderState,
    text: &str,
    size: f32,
    weight: Weight,
) {
    let gap = canvas.cfg.line_gap;
    let width = canvas.cfg.content_width();
    let face = canvas.face(weight);
    for (i, para) in split_paragraphs(text).into_iter().enumerate() {
        if i > 0 {
            // Only advance while the gap still leaves room; the next line breaks anyway.
            if state.cursor - gap > canvas.cfg.margin {
                canvas.advance(state, gap);
            }
        }
        for line in wrap(para, face, size, width) {
            canvas.ensure_space(state, size + gap);
            canvas.draw_text(state, &line, weight, size);
            canvas.advance(state, size + gap);
        }
    }
}

pub fn draw_meta_line(canvas: &mut Canvas, state: &mut RenderState, parts: &[String]) {
    let line = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(META_SEPARATOR);
    if line.is_empty() {
        return;
    }
    let size = canvas.cfg.small_size;
    draw_paragraph(canvas, state, &line, size, Weight::Regular);
}

/// Height a paragraph will take, sub-paragraph gaps included.
fn paragraph_height(canvas: &Canvas, text: &str, size: f32, weight: Weight) -> f32 {
    let gap = canvas.cfg.line_gap;
    let face = canvas.face(weight);
    let paras = split_paragraphs(text);
    let lines: usize = paras
        .iter()
        .map(|p| wrap(p, face, size, canvas.cfg.content_width()).len())
        .sum();
    lines as f32 * (size + gap) + paras.len().saturating_sub(1) as f32 * gap
}

/// Caption, scaled image and optional note for one shot. Unknown ids draw nothing.
pub fn draw_shot(canvas: &mut Canvas, state: &mut RenderState, id: &str, assets: &AssetMap) {
    let Some(index) = assets.position(id) else {
        return;
    };
    let Some(asset) = assets.by_index(index) else {
        return;
    };
    let cfg = canvas.cfg;
    let gap = cfg.line_gap;

    let label = asset
        .shot
        .label
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(asset.shot.id.as_str());
    let caption = format!("{label} ({})", asset.shot.timecode);

    let (w, h) = (asset.width as f32, asset.height as f32);
    let scale = 1.0f32
        .min(cfg.content_width() / w)
        .min(cfg.image_max_height / h);
    let (draw_w, draw_h) = (w * scale, h * scale);

    let caption_h = paragraph_height(canvas, &caption, cfg.body_size, Weight::Bold);
    canvas.ensure_space_for_image(state, caption_h + draw_h + gap);
    draw_paragraph(canvas, state, &caption, cfg.body_size, Weight::Bold);

    canvas.ensure_space_for_image(state, draw_h + gap);
    canvas.draw_image(state, index, draw_w, draw_h);
    canvas.advance(state, draw_h + gap);

    if let Some(note) = asset.shot.note.as_deref().filter(|n| !n.trim().is_empty()) {
        draw_paragraph(canvas, state, note, cfg.small_size, Weight::Regular);
    }
    if state.cursor - gap > cfg.margin {
        canvas.advance(state, gap);
    }
}
