//! # Chart images
//!
//! Charts are decoded with the `image` crate and drawn through `ratatui-image`.
//! The `Picker` chosen at startup decides the protocol: kitty, sixel or iTerm2
//! on terminals that support graphics, half-blocks everywhere else.
//!
//! `ImageCache` remembers one decoded chart per resolved URL so a chart is
//! fetched once no matter how many frames draw it. Each `ChartImage` keeps
//! the encoded protocol for the last areas it was drawn into, so a frame only
//! re-encodes when the target area changes.

use std::cell::RefCell;
use std::collections::HashMap;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageResult};
use log::warn;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::Protocol;
use ratatui_image::{Image, Resize};

/// Largest side kept after decoding. Anything bigger only costs encode time.
const MAX_DECODED_SIDE: u32 = 1024;
/// Encoded areas kept per chart: the inline preview and the overlay.
const CACHED_PROTOCOLS: usize = 2;
/// Cell size in pixels assumed when the terminal cannot be queried.
pub const FALLBACK_FONT_SIZE: (u16, u16) = (8, 16);

pub enum ImageSlot {
    Loading,
    Ready(ChartImage),
    Failed,
}

/// Decode fetched bytes and shrink oversized images. Runs on a blocking thread.
pub fn decode_image(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let image = image::load_from_memory(bytes)?;
    let (w, h) = image.dimensions();
    if w > MAX_DECODED_SIDE || h > MAX_DECODED_SIDE {
        Ok(image.thumbnail(MAX_DECODED_SIDE, MAX_DECODED_SIDE))
    } else {
        Ok(image)
    }
}

/// A decoded chart plus its encoded protocols, keyed by the area drawn into.
pub struct ChartImage {
    image: DynamicImage,
    picker: Picker,
    protocols: RefCell<Vec<(Rect, Protocol)>>,
}

impl ChartImage {
    pub fn new(image: DynamicImage, picker: Picker) -> Self {
        Self {
            image,
            picker,
            protocols: RefCell::new(Vec::new()),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Number of areas with an encoded protocol ready.
    pub fn cached_areas(&self) -> usize {
        self.protocols.borrow().len()
    }

    fn ensure_protocol(&self, area: Rect) -> bool {
        let mut protocols = self.protocols.borrow_mut();
        if protocols.iter().any(|(cached, _)| *cached == area) {
            return true;
        }
        match self.picker.new_protocol(
            self.image.clone(),
            area,
            Resize::Fit(Some(FilterType::Triangle)),
        ) {
            Ok(protocol) => {
                if protocols.len() >= CACHED_PROTOCOLS {
                    protocols.remove(0);
                }
                protocols.push((area, protocol));
                true
            }
            Err(e) => {
                warn!("Could not encode chart for {:?}: {}", area, e);
                false
            }
        }
    }
}

/// Draws a chart scaled to fit its area, centred, aspect ratio kept.
pub struct ChartView<'a> {
    pub chart: &'a ChartImage,
}

impl Widget for ChartView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() || !self.chart.ensure_protocol(area) {
            return;
        }
        let protocols = self.chart.protocols.borrow();
        let Some((_, protocol)) = protocols.iter().find(|(cached, _)| *cached == area) else {
            return;
        };
        let used = protocol.area();
        let width = used.width.min(area.width);
        let height = used.height.min(area.height);
        let target = Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        );
        Image::new(protocol).render(target, buf);
    }
}

pub struct ImageCache {
    slots: HashMap<String, ImageSlot>,
    picker: Picker,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(Picker::from_fontsize(FALLBACK_FONT_SIZE))
    }
}

impl ImageCache {
    pub fn new(picker: Picker) -> Self {
        Self {
            slots: HashMap::new(),
            picker,
        }
    }

    pub fn get(&self, url: &str) -> Option<&ImageSlot> {
        self.slots.get(url)
    }

    /// Mark `url` as in flight. Returns false if it was already requested.
    pub fn begin(&mut self, url: &str) -> bool {
        if self.slots.contains_key(url) {
            return false;
        }
        self.slots.insert(url.to_string(), ImageSlot::Loading);
        true
    }

    pub fn finish(&mut self, url: String, image: DynamicImage) {
        let chart = ChartImage::new(image, self.picker.clone());
        self.slots.insert(url, ImageSlot::Ready(chart));
    }

    pub fn fail(&mut self, url: String) {
        self.slots.insert(url, ImageSlot::Failed);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
