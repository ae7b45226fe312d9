use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use ttf_parser::Face;

use crate::config::RenderConfig;

/// The two faces a document is set in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Weight {
    Regular,
    Bold,
}

struct TrueTypeFace {
    data: Vec<u8>,
    ps_name: String,
    /// char -> (glyph id, advance in 1000-units)
    glyphs: HashMap<char, (u16, f32)>,
    ascent: f32,
    descent: f32,
    cap_height: f32,
    bbox: Rect,
}

enum FaceMetrics {
    /// One of the standard-14 Helvetica faces, WinAnsi widths for bytes 32..=255.
    Standard {
        base_font: &'static [u8],
        widths_1000: Vec<f32>,
    },
    TrueType(Box<TrueTypeFace>),
}

pub struct FontFace {
    pub(crate) pdf_name: String,
    metrics: FaceMetrics,
}

impl FontFace {
    fn standard(weight: Weight) -> Self {
        let (pdf_name, base_font): (&str, &'static [u8]) = match weight {
            Weight::Regular => ("F1", b"Helvetica"),
            Weight::Bold => ("F2", b"Helvetica-Bold"),
        };
        FontFace {
            pdf_name: pdf_name.to_string(),
            metrics: FaceMetrics::Standard {
                base_font,
                widths_1000: helvetica_widths(weight),
            },
        }
    }

    fn truetype(weight: Weight, path: &Path) -> Option<Self> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Cannot read font {}: {e}", path.display());
                return None;
            }
        };
        let face = parse_truetype(data)?;
        let pdf_name = match weight {
            Weight::Regular => "F1",
            Weight::Bold => "F2",
        };
        Some(FontFace {
            pdf_name: pdf_name.to_string(),
            metrics: FaceMetrics::TrueType(Box::new(face)),
        })
    }

    /// Width of a single character in 1000-units. Characters the face cannot
    /// encode are dropped when drawn, so they measure as zero.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        match &self.metrics {
            FaceMetrics::Standard { widths_1000, .. } => {
                let byte = char_to_winansi(ch);
                if byte >= 32 {
                    widths_1000[(byte - 32) as usize]
                } else {
                    0.0
                }
            }
            FaceMetrics::TrueType(tt) => tt.glyphs.get(&ch).map(|&(_, w)| w).unwrap_or(0.0),
        }
    }

    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    /// Bytes for a `Tj` string operand in this face's encoding.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.metrics {
            FaceMetrics::Standard { .. } => to_winansi_bytes(text),
            FaceMetrics::TrueType(tt) => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for ch in text.chars() {
                    if let Some(&(gid, _)) = tt.glyphs.get(&ch) {
                        out.extend_from_slice(&gid.to_be_bytes());
                    }
                }
                out
            }
        }
    }

    /// Whether `ch` survives [`FontFace::encode`].
    pub fn can_encode(&self, ch: char) -> bool {
        match &self.metrics {
            FaceMetrics::Standard { .. } => char_to_winansi(ch) >= 32,
            FaceMetrics::TrueType(tt) => tt.glyphs.contains_key(&ch),
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.metrics, FaceMetrics::TrueType(_))
    }
}

/// Regular and bold faces shared by every page of a document.
pub struct FontContext {
    regular: FontFace,
    bold: FontFace,
}

impl FontContext {
    /// Built-in Helvetica pair; needs no font files.
    pub fn standard() -> Self {
        FontContext {
            regular: FontFace::standard(Weight::Regular),
            bold: FontFace::standard(Weight::Bold),
        }
    }

    /// Load the faces named by the config, falling back to Helvetica for any
    /// face that is not configured or cannot be parsed.
    pub fn load(cfg: &RenderConfig) -> Self {
        let load = |weight: Weight, path: Option<&Path>| {
            path.and_then(|p| FontFace::truetype(weight, p))
                .unwrap_or_else(|| {
                    if let Some(p) = path {
                        log::warn!("Font {} unusable, using Helvetica ({weight:?})", p.display());
                    }
                    FontFace::standard(weight)
                })
        };
        FontContext {
            regular: load(Weight::Regular, cfg.font_regular.as_deref()),
            bold: load(Weight::Bold, cfg.font_bold.as_deref()),
        }
    }

    pub fn face(&self, weight: Weight) -> &FontFace {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    /// Write both font dictionaries. `used` lists the characters drawn in each
    /// face; embedded faces only get width and ToUnicode entries for those.
    pub(crate) fn write(
        &self,
        pdf: &mut Pdf,
        alloc: &mut impl FnMut() -> Ref,
        used: &HashMap<Weight, BTreeSet<char>>,
    ) -> Vec<(String, Ref)> {
        let empty = BTreeSet::new();
        [Weight::Regular, Weight::Bold]
            .into_iter()
            .map(|weight| {
                let face = self.face(weight);
                let font_ref = alloc();
                let chars = used.get(&weight).unwrap_or(&empty);
                match &face.metrics {
                    FaceMetrics::Standard { base_font, .. } => {
                        pdf.type1_font(font_ref)
                            .base_font(Name(base_font))
                            .encoding_predefined(Name(b"WinAnsiEncoding"));
                    }
                    FaceMetrics::TrueType(tt) => write_truetype(pdf, font_ref, tt, chars, alloc),
                }
                (face.pdf_name.clone(), font_ref)
            })
            .collect()
    }
}

fn parse_truetype(data: Vec<u8>) -> Option<TrueTypeFace> {
    let face = match Face::parse(&data, 0) {
        Ok(face) => face,
        Err(e) => {
            log::warn!("Font parse failed: {e}");
            return None;
        }
    };

    let units = face.units_per_em() as f32;
    let scale = |v: f32| v / units * 1000.0;

    let mut glyphs = HashMap::new();
    if let Some(cmap) = face.tables().cmap {
        for subtable in cmap.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            subtable.codepoints(|cp| {
                let Some(ch) = char::from_u32(cp) else {
                    return;
                };
                if let Some(gid) = subtable.glyph_index(cp) {
                    let adv = face.glyph_hor_advance(gid).unwrap_or(0) as f32;
                    glyphs.entry(ch).or_insert((gid.0, scale(adv)));
                }
            });
        }
    }
    if glyphs.is_empty() {
        log::warn!("Font has no Unicode cmap");
        return None;
    }

    let ps_name = face
        .names()
        .into_iter()
        .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME && n.is_unicode())
        .and_then(|n| n.to_string())
        .unwrap_or_else(|| "EmbeddedFont".to_string())
        .replace(' ', "");

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        scale(bb.x_min as f32),
        scale(bb.y_min as f32),
        scale(bb.x_max as f32),
        scale(bb.y_max as f32),
    );

    let ascent = scale(face.ascender() as f32);
    let descent = scale(face.descender() as f32);
    let cap_height = face
        .capital_height()
        .map(|h| scale(h as f32))
        .unwrap_or(700.0);

    Some(TrueTypeFace {
        data,
        ps_name,
        glyphs,
        ascent,
        descent,
        cap_height,
        bbox,
    })
}

/// Embed a TrueType face whole as a CIDFont (Type0 composite) with Identity-H encoding.
fn write_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    tt: &TrueTypeFace,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) {
    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    let data_len = i32::try_from(tt.data.len()).unwrap_or(i32::MAX);
    pdf.stream(data_ref, &tt.data).pair(Name(b"Length1"), data_len);

    pdf.font_descriptor(descriptor_ref)
        .name(Name(tt.ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(tt.bbox)
        .italic_angle(0.0)
        .ascent(tt.ascent)
        .descent(tt.descent)
        .cap_height(tt.cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = || pdf_writer::types::SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    };

    // gid -> (width, char); BTreeMap keeps the W array sorted
    let used_glyphs: BTreeMap<u16, (f32, char)> = used_chars
        .iter()
        .filter_map(|&ch| tt.glyphs.get(&ch).map(|&(gid, w)| (gid, (w, ch))))
        .collect();

    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(tt.ps_name.as_bytes()));
        cid.system_info(system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !used_glyphs.is_empty() {
            let mut w = cid.widths();
            for (&gid, &(width, _)) in &used_glyphs {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{}-UTF16", tt.ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), system_info());
    for (&gid, &(_, ch)) in &used_glyphs {
        cmap.pair(gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(tt.ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes, dropping unmappable chars.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b >= 32)
        .collect()
}

/// Helvetica / Helvetica-Bold advance widths at 1000 units/em for WinAnsi bytes 32..=255.
fn helvetica_widths(weight: Weight) -> Vec<f32> {
    const REGULAR_ASCII: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space-/
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
        278, 278, 584, 584, 584, 556, 1015, // :-@
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
        278, 278, 278, 469, 556, 333, // [-`
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
        334, 260, 334, 584, // {-~
    ];
    const BOLD_ASCII: [u16; 95] = [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ];
    let ascii = match weight {
        Weight::Regular => &REGULAR_ASCII,
        Weight::Bold => &BOLD_ASCII,
    };

    (32u8..=255u8)
        .map(|b| match b {
            32..=126 => ascii[(b - 32) as usize] as f32,
            0x85 | 0x89 | 0x97 => 1000.0, // ellipsis, per mille, em dash
            0x95 => 350.0,                // bullet
            0x91 | 0x92 => 222.0,         // single quotes
            0x93 | 0x94 => 333.0,         // double quotes
            0xA0 => 278.0,                // nbsp
            0xB7 => 278.0,                // middle dot
            _ => 556.0,
        })
        .collect()
}
