use crate::config::RenderConfig;
use crate::fonts::{FontContext, FontFace, Weight};

use super::{DrawOp, Page};

/// Active page and vertical cursor, threaded through every draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderState {
    pub page: usize,
    pub cursor: f32,
}

/// Page list plus the geometry and faces used to fill it.
pub struct Canvas<'a> {
    pub(crate) cfg: &'a RenderConfig,
    pub(crate) fonts: &'a FontContext,
    pub(crate) pages: Vec<Page>,
}

impl<'a> Canvas<'a> {
    pub fn new(cfg: &'a RenderConfig, fonts: &'a FontContext) -> Self {
        Canvas {
            cfg,
            fonts,
            pages: Vec::new(),
        }
    }

    pub fn face(&self, weight: Weight) -> &'a FontFace {
        self.fonts.face(weight)
    }

    /// Allocate the first page and return the state positioned at its top.
    pub fn begin(&mut self) -> RenderState {
        let mut state = RenderState {
            page: 0,
            cursor: self.cfg.top(),
        };
        self.new_page(&mut state);
        state
    }

    pub fn new_page(&mut self, state: &mut RenderState) {
        self.pages.push(Page::default());
        state.page = self.pages.len() - 1;
        state.cursor = self.cfg.top();
        log::debug!("Page {} allocated", self.pages.len());
    }

    /// Break to a new page when `height` would reach the bottom margin.
    /// A page with nothing on it is never abandoned.
    pub fn ensure_space(&mut self, state: &mut RenderState, height: f32) {
        let untouched = self.pages[state.page].ops.is_empty() && state.cursor >= self.cfg.top();
        if state.cursor - height <= self.cfg.margin && !untouched {
            self.new_page(state);
        }
    }

    /// Same policy as [`Canvas::ensure_space`]; called with the full height of an
    /// image block before its caption is drawn.
    pub fn ensure_space_for_image(&mut self, state: &mut RenderState, height: f32) {
        self.ensure_space(state, height);
    }

    /// Draw one line of text with its baseline `size` below the cursor.
    pub fn draw_text(&mut self, state: &RenderState, text: &str, weight: Weight, size: f32) {
        self.pages[state.page].ops.push(DrawOp::Text {
            x: self.cfg.margin,
            baseline: state.cursor - size,
            text: text.to_string(),
            weight,
            size,
        });
    }

    /// Draw an image with its top edge at the cursor, centered in the content width.
    pub fn draw_image(&mut self, state: &RenderState, asset: usize, width: f32, height: f32) {
        let x = self.cfg.margin + (self.cfg.content_width() - width).max(0.0) / 2.0;
        self.pages[state.page].ops.push(DrawOp::Image {
            asset,
            x,
            y: state.cursor - height,
            width,
            height,
        });
    }

    pub fn advance(&self, state: &mut RenderState, amount: f32) {
        state.cursor -= amount;
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }
}
