//! Overlay of the predicted road class on an evaluation image.
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Top-left corner of the label text.
pub const LABEL_ORIGIN: (i32, i32) = (65, 10);
/// Inclusive bounding box `[x0, y0, x1, y1]` of the class marker.
pub const MARKER_BOX: [i32; 4] = [10, 10, 55, 55];
/// Pixels per font8x8 cell; 8 * 5 gives a 40 px glyph height.
const GLYPH_SCALE: u32 = 5;

/// Road class as shown on an annotated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadClass {
    Highway,
    SmallRoad,
}

impl RoadClass {
    pub fn from_highway(highway: bool) -> Self {
        if highway {
            RoadClass::Highway
        } else {
            RoadClass::SmallRoad
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoadClass::Highway => "Highway",
            RoadClass::SmallRoad => "small road",
        }
    }

    pub fn color(self) -> Rgb<u8> {
        match self {
            RoadClass::Highway => Rgb([255, 255, 0]),
            RoadClass::SmallRoad => Rgb([255, 0, 0]),
        }
    }
}

/// Copy `image` and draw the class label and a filled marker on the copy.
pub fn annotate(image: &RgbImage, highway: bool) -> RgbImage {
    let class = RoadClass::from_highway(highway);
    let mut out = image.clone();

    fill_ellipse(&mut out, MARKER_BOX, class.color());
    draw_text(&mut out, LABEL_ORIGIN, class.label(), class.color());
    out
}

/// Fill the ellipse inscribed in the inclusive box `[x0, y0, x1, y1]`,
/// testing pixel centers so the shape touches all four box edges.
fn fill_ellipse(canvas: &mut RgbImage, [x0, y0, x1, y1]: [i32; 4], color: Rgb<u8>) {
    let (cx, cy) = ((x0 + x1) as f32 / 2.0, (y0 + y1) as f32 / 2.0);
    let (rx, ry) = ((x1 - x0 + 1) as f32 / 2.0, (y1 - y0 + 1) as f32 / 2.0);
    let (w, h) = canvas.dimensions();
    for y in y0.max(0)..=y1.min(h as i32 - 1) {
        for x in x0.max(0)..=x1.min(w as i32 - 1) {
            let dx = (x as f32 - cx) / rx;
            let dy = (y as f32 - cy) / ry;
            if dx * dx + dy * dy <= 1.0 {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Bitmap text, one scaled square per lit font8x8 bit. Clipped at the border.
fn draw_text(canvas: &mut RgbImage, origin: (i32, i32), text: &str, color: Rgb<u8>) {
    let advance = 8 * GLYPH_SCALE as i32;
    for (i, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let gx = origin.0 + i as i32 * advance;
        for (row, &bits) in glyph.iter().enumerate() {
            for col in 0..8i32 {
                if bits & (1u8 << col) == 0 {
                    continue;
                }
                let x = gx + col * GLYPH_SCALE as i32;
                let y = origin.1 + row as i32 * GLYPH_SCALE as i32;
                draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(GLYPH_SCALE, GLYPH_SCALE), color);
            }
        }
    }
}
