//! Environment shared by every host on a page: visibility, pixel density,
//! drawing-context capability and injected style sheets.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::styles::StyleSheet;

#[derive(Debug)]
pub struct Document {
    hidden: Cell<bool>,
    device_pixel_ratio: Cell<f32>,
    canvas_supported: Cell<bool>,
    style_sheets: RefCell<Vec<StyleSheet>>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            hidden: Cell::new(false),
            device_pixel_ratio: Cell::new(1.0),
            canvas_supported: Cell::new(true),
            style_sheets: RefCell::new(Vec::new()),
        }
    }
}

impl Document {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
    }

    /// Physical pixels per logical pixel; bogus values read as 1.0.
    pub fn device_pixel_ratio(&self) -> f32 {
        let dpr = self.device_pixel_ratio.get();
        if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 }
    }

    pub fn set_device_pixel_ratio(&self, dpr: f32) {
        self.device_pixel_ratio.set(dpr);
    }

    /// Capability probe: can a 2D drawing context be created here?
    pub fn supports_canvas(&self) -> bool {
        self.canvas_supported.get()
    }

    pub fn set_canvas_supported(&self, supported: bool) {
        self.canvas_supported.set(supported);
    }

    pub fn style_sheet(&self, id: &str) -> Option<StyleSheet> {
        self.style_sheets.borrow().iter().find(|s| s.id == id).cloned()
    }

    pub fn insert_style_sheet(&self, sheet: StyleSheet) {
        self.style_sheets.borrow_mut().push(sheet);
    }

    pub fn style_sheet_count(&self) -> usize {
        self.style_sheets.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bogus_pixel_ratio_reads_as_one() {
        let doc = Document::new();
        doc.set_device_pixel_ratio(0.0);
        assert_eq!(doc.device_pixel_ratio(), 1.0);
        doc.set_device_pixel_ratio(f32::NAN);
        assert_eq!(doc.device_pixel_ratio(), 1.0);
        doc.set_device_pixel_ratio(2.0);
        assert_eq!(doc.device_pixel_ratio(), 2.0);
    }
}
