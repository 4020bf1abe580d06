use anyhow::{Context, Result};
use image::imageops::flip_vertical_in_place;
use image::{Rgba, RgbaImage};
use pattern::StrandField;

use crate::cli::SnapshotArgs;

/// Evaluates the strands pattern for every pixel centre of a `width`x`height`
/// image at `time_ms`.
///
/// Pixels are computed in fragment order (origin bottom-left) and the rows
/// flipped afterwards so the image reads the same way as the window.
pub fn render(width: u32, height: u32, time_ms: f64) -> RgbaImage {
    let field = StrandField::default();
    let time = time_ms as f32;
    let mut image = RgbaImage::from_fn(width, height, |x, y| {
        let uv = [
            (x as f32 + 0.5) / width as f32,
            (y as f32 + 0.5) / height as f32,
        ];
        Rgba(field.evaluate(uv, time).map(to_channel))
    });
    flip_vertical_in_place(&mut image);
    image
}

fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn run(args: &SnapshotArgs) -> Result<()> {
    let (width, height) = args.size;
    let image = render(width, height, args.time);
    image
        .save_with_format(&args.output, image::ImageFormat::Png)
        .with_context(|| format!("failed to write snapshot {}", args.output.display()))?;
    tracing::info!(
        path = %args.output.display(),
        width,
        height,
        time_ms = args.time,
        "wrote snapshot"
    );
    Ok(())
}
