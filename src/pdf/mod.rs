pub(crate) mod flow;
pub(crate) mod sections;
pub mod text;

use std::collections::{BTreeSet, HashMap};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::assets::{AssetMap, AssetPixels};
use crate::config::RenderConfig;
use crate::error::Error;
use crate::fonts::{FontContext, Weight};
use crate::model::ContentNode;

use flow::Canvas;
use sections::{draw_shot, draw_title, render_nodes};

pub const APPENDIX_TITLE: &str = "Screenshot Appendix";

/// One positioned primitive. Coordinates are PDF points from the bottom-left corner.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        baseline: f32,
        text: String,
        weight: Weight,
        size: f32,
    },
    Image {
        /// Index into the document's asset map.
        asset: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Image { .. } => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }
}

/// Fully paginated document, ready to serialize.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentLayout {
    pub pages: Vec<Page>,
    /// Index of the appendix page, when one was added.
    pub appendix_page: Option<usize>,
}

/// Lay out the body nodes, then the appendix when any asset was embedded.
pub fn layout(
    nodes: &[ContentNode],
    assets: &AssetMap,
    fonts: &FontContext,
    cfg: &RenderConfig,
) -> DocumentLayout {
    let mut canvas = Canvas::new(cfg, fonts);
    let mut state = canvas.begin();
    render_nodes(&mut canvas, &mut state, nodes, assets);

    let mut appendix_page = None;
    if !assets.is_empty() {
        canvas.new_page(&mut state);
        appendix_page = Some(state.page);
        draw_title(&mut canvas, &mut state, APPENDIX_TITLE);
        for asset in assets.iter() {
            draw_shot(&mut canvas, &mut state, &asset.shot.id, assets);
        }
    }

    DocumentLayout {
        pages: canvas.into_pages(),
        appendix_page,
    }
}

/// Characters drawn somewhere in `doc` that their face cannot encode.
pub fn unencodable_chars(doc: &DocumentLayout, fonts: &FontContext) -> BTreeSet<char> {
    let mut missing = BTreeSet::new();
    for op in doc.pages.iter().flat_map(|p| p.ops.iter()) {
        if let DrawOp::Text { text, weight, .. } = op {
            let face = fonts.face(*weight);
            missing.extend(text.chars().filter(|&ch| !face.can_encode(ch)));
        }
    }
    missing
}

/// Serialize a laid-out document.
pub fn write_pdf(
    doc: &DocumentLayout,
    assets: &AssetMap,
    fonts: &FontContext,
    cfg: &RenderConfig,
    title: &str,
) -> Result<Vec<u8>, Error> {
    if doc.pages.is_empty() {
        return Err(Error::Pdf("document has no pages".into()));
    }

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    let mut used_chars: HashMap<Weight, BTreeSet<char>> = HashMap::new();
    for op in doc.pages.iter().flat_map(|p| p.ops.iter()) {
        if let DrawOp::Text { text, weight, .. } = op {
            used_chars.entry(*weight).or_default().extend(text.chars());
        }
    }
    let font_pairs = fonts.write(&mut pdf, &mut alloc, &used_chars);

    let image_xobjects: Vec<(String, Ref)> = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            let name = format!("Im{}", i + 1);
            let xobj_ref = alloc();
            embed_image(&mut pdf, xobj_ref, asset, &mut alloc);
            (name, xobj_ref)
        })
        .collect();

    let n = doc.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in doc.pages.iter().enumerate() {
        let content = page_content(page, fonts, &image_xobjects);
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, cfg.page_width, cfg.page_height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for (name, font_ref) in &font_pairs {
                font_dict.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr(concat!("shotdoc-pdf ", env!("CARGO_PKG_VERSION"))));

    Ok(pdf.finish())
}

fn page_content(page: &Page, fonts: &FontContext, image_xobjects: &[(String, Ref)]) -> Content {
    let mut content = Content::new();
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                baseline,
                text,
                weight,
                size,
            } => {
                let face = fonts.face(*weight);
                let bytes = face.encode(text);
                if bytes.is_empty() {
                    continue;
                }
                content.begin_text();
                content.set_fill_gray(0.0);
                content.set_font(Name(face.pdf_name.as_bytes()), *size);
                content.next_line(*x, *baseline);
                content.show(Str(&bytes));
                content.end_text();
            }
            DrawOp::Image {
                asset,
                x,
                y,
                width,
                height,
            } => {
                let Some((name, _)) = image_xobjects.get(*asset) else {
                    continue;
                };
                content.save_state();
                content.transform([*width, 0.0, 0.0, *height, *x, *y]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
        }
    }
    content
}

fn embed_image(
    pdf: &mut Pdf,
    xobj_ref: Ref,
    asset: &crate::assets::Asset,
    alloc: &mut impl FnMut() -> Ref,
) {
    let (w, h) = (asset.width as i32, asset.height as i32);
    match &asset.pixels {
        AssetPixels::Jpeg { data, gray } => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            if *gray {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        AssetPixels::Raw { rgb, alpha } => {
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(rgb, 6);
            let smask_ref = alpha.as_ref().map(|alpha| {
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
}
