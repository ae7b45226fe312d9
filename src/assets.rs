use std::collections::HashMap;
use std::sync::LazyLock;

use base64::Engine;
use regex::Regex;

use crate::error::Error;
use crate::model::Shot;

static DATA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:([^;]+);base64,(.*)$").expect("data URL pattern is valid")
});

/// Decoded pixel payload in the form it will be written to the PDF.
pub(crate) enum AssetPixels {
    /// Original JPEG bytes, passed through as DCTDecode.
    Jpeg { data: Vec<u8>, gray: bool },
    /// 8-bit RGB samples plus an optional 8-bit alpha plane.
    Raw { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// One embedded screenshot.
pub struct Asset {
    pub shot: Shot,
    pub width: u32,
    pub height: u32,
    pub(crate) pixels: AssetPixels,
}

/// Embedded assets keyed by shot id, in input order.
#[derive(Default)]
pub struct AssetMap {
    assets: Vec<Asset>,
    /// shot id -> position in `assets`
    index: HashMap<String, usize>,
}

impl AssetMap {
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.position(id).map(|i| &self.assets[i])
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn by_index(&self, index: usize) -> Option<&Asset> {
        self.assets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.shot.id.as_str()).collect()
    }

    /// A repeated id replaces the earlier asset but keeps its position.
    fn insert(&mut self, asset: Asset) {
        match self.position(&asset.shot.id) {
            Some(i) => self.assets[i] = asset,
            None => {
                self.index.insert(asset.shot.id.clone(), self.assets.len());
                self.assets.push(asset);
            }
        }
    }
}

/// Result of the embedding pass: what decoded, and one warning per shot that did not.
pub struct Embedded {
    pub assets: AssetMap,
    pub warnings: Vec<String>,
}

/// Split `data:<mime>;base64,<payload>` into its mime type and payload.
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let caps = DATA_URL.captures(url)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Decode every shot in order. A shot whose URL is not a base64 data URL is
/// skipped quietly; one whose payload fails to decode is skipped with a warning.
pub fn embed_shots(shots: &[Shot]) -> Embedded {
    let mut assets = AssetMap::default();
    let mut warnings = Vec::new();

    for shot in shots {
        let Some((mime, payload)) = parse_data_url(&shot.data_url) else {
            log::debug!("Shot {}: not a base64 data URL, skipped", shot.id);
            continue;
        };
        match decode_asset(shot, mime, payload) {
            Ok(asset) => {
                log::debug!(
                    "Shot {}: embedded {}x{} ({mime})",
                    shot.id,
                    asset.width,
                    asset.height
                );
                assets.insert(asset);
            }
            Err(e) => {
                log::warn!("Shot {}: {e}", shot.id);
                warnings.push(format!("Failed to embed screenshot {}", shot.id));
            }
        }
    }

    Embedded { assets, warnings }
}

fn decode_asset(shot: &Shot, mime: &str, payload: &str) -> Result<Asset, Error> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::Image(format!("base64: {e}")))?;

    let format = if mime.contains("jpeg") {
        image::ImageFormat::Jpeg
    } else {
        image::ImageFormat::Png
    };
    let reader = image::ImageReader::with_format(std::io::Cursor::new(&bytes), format);
    let decoded = reader
        .decode()
        .map_err(|e| Error::Image(format!("{format:?}: {e}")))?;

    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(Error::Image("image has no pixels".into()));
    }

    // The decoder reports CMYK and YCCK as Rgb8 after converting them, so the
    // DCT stream is only reused when its own component count matches.
    let components = match format {
        image::ImageFormat::Jpeg => jpeg_components(&bytes),
        _ => None,
    };
    let pixels = match (components, decoded.color()) {
        (Some(3), image::ColorType::Rgb8) => AssetPixels::Jpeg {
            data: bytes,
            gray: false,
        },
        (Some(1), image::ColorType::L8) => AssetPixels::Jpeg {
            data: bytes,
            gray: true,
        },
        _ => {
            let rgba = decoded.to_rgba8();
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
            let rgb = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
            let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());
            AssetPixels::Raw { rgb, alpha }
        }
    };

    Ok(Asset {
        shot: shot.clone(),
        width,
        height,
        pixels,
    })
}

/// Component count from the first SOF segment of a JPEG stream.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }
    let mut i = 2;
    while i + 4 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        if marker == 0xD9 || marker == 0xDA {
            return None;
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        // SOF0..SOF15, minus DHT (C4), JPG (C8) and DAC (CC)
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            return data.get(i + 9).copied();
        }
        i += 2 + len;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_data_url(w: u32, h: u32) -> String {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([10, 20, 30]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
        )
    }

    fn shot(id: &str, data_url: String) -> Shot {
        Shot {
            id: id.into(),
            label: None,
            note: None,
            timecode: "00:01".into(),
            data_url,
        }
    }

    #[test]
    fn parses_data_url_parts() {
        assert_eq!(
            parse_data_url("data:image/jpeg;base64,QUJD"),
            Some(("image/jpeg", "QUJD"))
        );
        assert_eq!(parse_data_url("data:image/png,QUJD"), None);
        assert_eq!(parse_data_url("https://example.com/a.png"), None);
    }

    #[test]
    fn embeds_valid_png_with_intrinsic_size() {
        let out = embed_shots(&[shot("s1", png_data_url(40, 30))]);
        assert!(out.warnings.is_empty());
        let asset = out.assets.get("s1").unwrap();
        assert_eq!((asset.width, asset.height), (40, 30));
        assert!(matches!(asset.pixels, AssetPixels::Raw { alpha: None, .. }));
    }

    #[test]
    fn corrupt_image_is_skipped_with_warning() {
        let out = embed_shots(&[
            shot("bad", "data:image/png;base64,AAAA".into()),
            shot("good", png_data_url(4, 4)),
        ]);
        assert_eq!(out.assets.ids(), vec!["good"]);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("bad"));
    }

    #[test]
    fn malformed_url_is_skipped_without_warning() {
        let out = embed_shots(&[shot("s1", "not a data url".into())]);
        assert!(out.assets.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn jpeg_mime_selects_jpeg_decoder() {
        // Valid PNG bytes labelled as JPEG must fail the JPEG decode.
        let png = png_data_url(4, 4).replace("image/png", "image/jpeg");
        let out = embed_shots(&[shot("s1", png)]);
        assert!(out.assets.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn jpeg_rgb_passes_through() {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([200, 100, 50]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
        let bytes = buf.into_inner();
        let url = format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );
        let out = embed_shots(&[shot("j", url)]);
        let asset = out.assets.get("j").unwrap();
        assert_eq!((asset.width, asset.height), (8, 6));
        match &asset.pixels {
            AssetPixels::Jpeg { data, gray } => {
                assert_eq!(data, &bytes);
                assert!(!gray);
            }
            AssetPixels::Raw { .. } => panic!("expected JPEG pass-through"),
        }
    }

    #[test]
    fn cmyk_jpeg_is_not_passed_through() {
        let bytes = include_bytes!("../tests/fixtures/cmyk_8x8.jpg");
        assert_eq!(jpeg_components(bytes), Some(4));

        let url = format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        );
        let out = embed_shots(&[shot("cmyk", url)]);
        match out.assets.get("cmyk") {
            Some(asset) => {
                assert_eq!((asset.width, asset.height), (8, 8));
                assert!(matches!(asset.pixels, AssetPixels::Raw { .. }));
            }
            None => assert_eq!(out.warnings.len(), 1),
        }
    }

    #[test]
    fn reads_component_count_from_frame_header() {
        let img = image::GrayImage::from_pixel(4, 4, image::Luma([90]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
        assert_eq!(jpeg_components(buf.get_ref()), Some(1));
        assert_eq!(jpeg_components(b"\x89PNG"), None);
        assert_eq!(jpeg_components(&[0xFF, 0xD8, 0xFF, 0xD9]), None);
    }

    #[test]
    fn order_follows_input_and_duplicates_keep_position() {
        let out = embed_shots(&[
            shot("a", png_data_url(2, 2)),
            shot("b", png_data_url(3, 3)),
            shot("a", png_data_url(5, 5)),
        ]);
        assert_eq!(out.assets.ids(), vec!["a", "b"]);
        assert_eq!(out.assets.get("a").unwrap().width, 5);
        assert_eq!(out.assets.position("b"), Some(1));
        assert_eq!(out.assets.position("c"), None);
    }
}
