#![allow(dead_code)]

use std::path::PathBuf;

use base64::Engine;
use serde_json::{Value, json};
use shotdoc_pdf::{DocumentLayout, DrawOp, RenderRequest};

pub fn png_data_url(width: u32, height: u32) -> String {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([30, 60, 90, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode test PNG");
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    )
}

pub fn shot(id: &str, data_url: &str) -> Value {
    json!({ "id": id, "timecode": "00:42", "dataUrl": data_url })
}

pub fn request(value: Value) -> RenderRequest {
    serde_json::from_value(value).expect("valid request JSON")
}

pub fn all_texts(layout: &DocumentLayout) -> Vec<String> {
    layout
        .pages
        .iter()
        .flat_map(|p| p.texts())
        .map(str::to_string)
        .collect()
}

/// (text, size) pairs for every text op, in drawing order.
pub fn sized_texts(layout: &DocumentLayout) -> Vec<(String, f32)> {
    layout
        .pages
        .iter()
        .flat_map(|p| p.ops.iter())
        .filter_map(|op| match op {
            DrawOp::Text { text, size, .. } => Some((text.clone(), *size)),
            DrawOp::Image { .. } => None,
        })
        .collect()
}

/// Asset indices of every image op, in drawing order.
pub fn image_assets(layout: &DocumentLayout) -> Vec<usize> {
    layout
        .pages
        .iter()
        .flat_map(|p| p.ops.iter())
        .filter_map(|op| match op {
            DrawOp::Image { asset, .. } => Some(*asset),
            DrawOp::Text { .. } => None,
        })
        .collect()
}

/// A regular/bold TrueType pair installed on this machine, if any.
pub fn system_font_pair() -> Option<(PathBuf, PathBuf)> {
    [
        (
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        ),
        (
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        ),
        (
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
        ),
    ]
    .iter()
    .map(|(r, b)| (PathBuf::from(r), PathBuf::from(b)))
    .find(|(r, b)| r.exists() && b.exists())
}
