use image::{Rgba, RgbaImage};
use shared::Detection;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

const BOX_THICKNESS: u32 = 3;

fn class_color(class_name: &str) -> Rgba<u8> {
    match class_name {
        "Pimples" | "Acne" => Rgba([0xFF, 0x6B, 0x6B, 0xFF]),
        "blackhead" => Rgba([0x4E, 0xCD, 0xC4, 0xFF]),
        "whitehead" => Rgba([0x95, 0xE1, 0xD3, 0xFF]),
        "cystic" => Rgba([0xFF, 0x00, 0x00, 0xFF]),
        "acne_scars" => Rgba([0xFF, 0xA0, 0x7A, 0xFF]),
        "papular" => Rgba([0xFF, 0x8C, 0x69, 0xFF]),
        "purulent" => Rgba([0xDC, 0x14, 0x3C, 0xFF]),
        "conglobata" => Rgba([0x8B, 0x00, 0x00, 0xFF]),
        "folliculitis" => Rgba([0xFF, 0xB6, 0xC1, 0xFF]),
        "milium" => Rgba([0xFF, 0xDA, 0xB9, 0xFF]),
        "keloid" => Rgba([0xCD, 0x5C, 0x5C, 0xFF]),
        "flat_wart" => Rgba([0xF0, 0x80, 0x80, 0xFF]),
        "syringoma" => Rgba([0xFF, 0xE4, 0xE1, 0xFF]),
        "crystalline" => Rgba([0xB0, 0xE0, 0xE6, 0xFF]),
        _ => Rgba([0xFF, 0x6B, 0x6B, 0xFF]),
    }
}

/// Draw class-colored bounding boxes on a copy of the source image. Purely
/// cosmetic; detection boxes are center+extent in pixel space.
pub fn draw_detections(
    image_path: &Path,
    detections: &[Detection],
    output_path: &Path,
) -> Result<(), AnnotateError> {
    let mut img = image::open(image_path)?.to_rgba8();
    for detection in detections {
        draw_box(&mut img, detection);
    }
    img.save(output_path)?;
    Ok(())
}

fn draw_box(img: &mut RgbaImage, detection: &Detection) {
    let (img_width, img_height) = img.dimensions();
    if img_width == 0 || img_height == 0 {
        return;
    }

    let clamp_x = |v: f64| v.round().clamp(0.0, (img_width - 1) as f64) as u32;
    let clamp_y = |v: f64| v.round().clamp(0.0, (img_height - 1) as f64) as u32;

    let left = clamp_x(detection.x - detection.width / 2.0);
    let right = clamp_x(detection.x + detection.width / 2.0);
    let top = clamp_y(detection.y - detection.height / 2.0);
    let bottom = clamp_y(detection.y + detection.height / 2.0);
    let color = class_color(&detection.class_name);

    for inset in 0..BOX_THICKNESS {
        let top_y = (top + inset).min(img_height - 1);
        let bottom_y = bottom.saturating_sub(inset);
        for x in left..=right {
            img.put_pixel(x, top_y, color);
            img.put_pixel(x, bottom_y, color);
        }

        let left_x = (left + inset).min(img_width - 1);
        let right_x = right.saturating_sub(inset);
        for y in top..=bottom {
            img.put_pixel(left_x, y, color);
            img.put_pixel(right_x, y, color);
        }
    }
}
