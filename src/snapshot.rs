use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::{ImageBuffer, Rgb, RgbImage};
use std::path::PathBuf;

/// 0RGBフレームバッファをRGB画像に変換する。
/// バッファが小さすぎる・次元が0ならNone。
pub fn to_rgb_image(buffer: &[u32], width: usize, height: usize) -> Option<RgbImage> {
    if width == 0 || height == 0 || buffer.len() < width * height {
        return None;
    }
    let image = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let px = buffer[y as usize * width + x as usize];
        Rgb([(px >> 16) as u8, (px >> 8) as u8, px as u8])
    });
    Some(image)
}

pub fn snapshot_filename(at: DateTime<Local>) -> String {
    format!("snapshot_{}.png", at.format("%Y%m%d_%H%M%S"))
}

/// 現在のフレームバッファをタイムスタンプ付きPNGとして保存し、パスを返す
pub fn save_snapshot(buffer: &[u32], width: usize, height: usize) -> Result<PathBuf> {
    let image = to_rgb_image(buffer, width, height).context("framebuffer is empty")?;
    let path = PathBuf::from(snapshot_filename(Local::now()));
    image
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
