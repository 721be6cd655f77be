use anyhow::Result;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::posture::PostureSample;
use crate::render::fit::{to_unit, FitRect};
use crate::render::skeleton::{
    BAR_BACKGROUND, BAR_HIGH, BAR_LOW, BAR_MID, DEFAULT_CONNECTIONS, DEFAULT_KEYPOINT_COUNT,
    GRID_COLOR, KEYPOINT_COLOR, SKELETON_COLOR,
};
use crate::stream::VideoFrame;

/// minifbを使用したレンダラー
pub struct MinifbRenderer {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )?;

        let buffer = vec![0u32; width * height];

        Ok(Self {
            window,
            buffer,
            width,
            height,
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    /// 表示サイズにバッファを追従させる。変わったらtrue。
    pub fn sync_size(&mut self) -> bool {
        let (w, h) = self.window.get_size();
        if w == self.width && h == self.height {
            return false;
        }
        self.width = w;
        self.height = h;
        self.buffer = vec![0u32; w * h];
        true
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// cover-fit矩形を通してフレームを描画（最近傍サンプリング）。
    /// fit矩形のはみ出しはウィンドウ境界でクリップする。
    pub fn draw_frame_cover(&mut self, frame: &VideoFrame, fit: FitRect) {
        if fit.dw <= 0 || fit.dh <= 0 || frame.width == 0 || frame.height == 0 {
            return;
        }
        if frame.pixels.len() < (frame.width as usize) * (frame.height as usize) {
            return;
        }

        let x0 = fit.dx.max(0);
        let y0 = fit.dy.max(0);
        let x1 = (fit.dx + fit.dw).min(self.width as i32);
        let y1 = (fit.dy + fit.dh).min(self.height as i32);

        for y in y0..y1 {
            let src_y = ((y - fit.dy) as i64 * frame.height as i64 / fit.dh as i64) as u32;
            let src_row = (src_y.min(frame.height - 1) * frame.width) as usize;
            let dst_row = y as usize * self.width;
            for x in x0..x1 {
                let src_x = ((x - fit.dx) as i64 * frame.width as i64 / fit.dw as i64) as u32;
                let src_x = src_x.min(frame.width - 1) as usize;
                self.buffer[dst_row + x as usize] = frame.pixels[src_row + src_x];
            }
        }
    }

    /// 三分割グリッド
    pub fn draw_grid(&mut self) {
        let w = self.width as i32;
        let h = self.height as i32;
        if w < 3 || h < 3 {
            return;
        }
        for i in 1..3 {
            let x = w * i / 3;
            self.draw_line(x, 0, x, h - 1, GRID_COLOR);
            let y = h * i / 3;
            self.draw_line(0, y, w - 1, y, GRID_COLOR);
        }
    }

    /// キーポイントと骨格エッジを重ね描きする。
    /// 座標はソース解像度基準で単位座標に揃えてからfit矩形へ射影する。
    pub fn draw_overlay(&mut self, sample: &PostureSample, fit: FitRect, src_w: u32, src_h: u32) {
        let Some(keypoints) = sample.keypoints.as_ref() else {
            return;
        };

        let points: Vec<(i32, i32)> = keypoints
            .iter()
            .map(|kp| {
                let (ux, uy) = to_unit(kp.x, kp.y, src_w, src_h);
                fit.project(ux, uy)
            })
            .collect();

        let pairs: &[(usize, usize)] = match sample.connections.as_deref() {
            Some(pairs) => pairs,
            None if points.len() == DEFAULT_KEYPOINT_COUNT => &DEFAULT_CONNECTIONS,
            None => &[],
        };

        for &(a, b) in pairs {
            // 範囲外インデックスのエッジは無視
            if let (Some(&(x1, y1)), Some(&(x2, y2))) = (points.get(a), points.get(b)) {
                self.draw_line(x1, y1, x2, y2, SKELETON_COLOR);
            }
        }

        for &(x, y) in &points {
            self.draw_circle(x, y, 4, KEYPOINT_COLOR);
        }
    }

    /// 画面下端の信頼度バー
    pub fn draw_confidence_bar(&mut self, percent: f32) {
        const BAR_HEIGHT: usize = 6;
        if self.height < BAR_HEIGHT || self.width == 0 {
            return;
        }
        let p = percent.clamp(0.0, 100.0);
        let filled = (self.width as f32 * p / 100.0).round() as usize;
        let color = if p >= 67.0 {
            BAR_HIGH
        } else if p >= 34.0 {
            BAR_MID
        } else {
            BAR_LOW
        };

        for y in (self.height - BAR_HEIGHT)..self.height {
            let row = y * self.width;
            for x in 0..self.width {
                self.buffer[row + x] = if x < filled { color } else { BAR_BACKGROUND };
            }
        }
    }

    /// バッファをウィンドウに表示
    pub fn update(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }

    /// 描画せずに入力イベントだけ処理する（ストリーム停止中）
    pub fn update_without_redraw(&mut self) {
        self.window.update();
    }

    /// Bresenhamのアルゴリズムで線を描画
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            self.set_pixel(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// 円を描画（塗りつぶし）
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize * self.width + x as usize] = color;
        }
    }
}
