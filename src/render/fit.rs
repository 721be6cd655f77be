/// ソース解像度が未確定のときのフォールバック
pub const FALLBACK_RESOLUTION: (u32, u32) = (1280, 720);

/// cover-fitの転送先矩形。ボックス左上が原点。
/// はみ出した分は描画側でボックス境界にクリップされる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitRect {
    pub dx: i32,
    pub dy: i32,
    pub dw: i32,
    pub dh: i32,
}

impl FitRect {
    /// 正規化座標(0.0〜1.0)をボックス内ピクセルへ射影する
    pub fn project(&self, nx: f32, ny: f32) -> (i32, i32) {
        (
            self.dx + (nx * self.dw as f32).round() as i32,
            self.dy + (ny * self.dh as f32).round() as i32,
        )
    }
}

/// アスペクト比を保ったままボックスを埋める(cover)矩形を求める。
/// scale = max(W/w, H/h)、中央寄せ。
/// いずれかの次元が0ならボックス全面の無変換フィットを返す。
pub fn cover_fit(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> FitRect {
    if src_w == 0 || src_h == 0 || box_w == 0 || box_h == 0 {
        return FitRect {
            dx: 0,
            dy: 0,
            dw: box_w as i32,
            dh: box_h as i32,
        };
    }

    let scale = f32::max(
        box_w as f32 / src_w as f32,
        box_h as f32 / src_h as f32,
    );
    let dw = (src_w as f32 * scale).round() as i32;
    let dh = (src_h as f32 * scale).round() as i32;
    let dx = ((box_w as i32 - dw) as f32 / 2.0).round() as i32;
    let dy = ((box_h as i32 - dh) as f32 / 2.0).round() as i32;
    FitRect { dx, dy, dw, dh }
}

/// キーポイント座標を単位座標に揃える。
/// 1.0を超える値はピクセル座標とみなしてソース解像度で割り、
/// 最後に0.0〜1.0へクランプする。
pub fn to_unit(x: f32, y: f32, src_w: u32, src_h: u32) -> (f32, f32) {
    let (mut ux, mut uy) = (x, y);
    if (x > 1.0 || y > 1.0) && src_w > 0 && src_h > 0 {
        ux = x / src_w as f32;
        uy = y / src_h as f32;
    }
    (ux.clamp(0.0, 1.0), uy.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_fit_crops_vertically() {
        // 横長ボックスに正方形ソース: 幅基準でスケールし上下がはみ出す
        let fit = cover_fit(800, 800, 400, 200);
        assert_eq!(fit, FitRect { dx: 0, dy: -100, dw: 400, dh: 400 });
    }

    #[test]
    fn test_cover_fit_crops_horizontally() {
        // 縦長ボックスに正方形ソース: 高さ基準で左右がはみ出す
        let fit = cover_fit(800, 800, 400, 800);
        assert_eq!(fit, FitRect { dx: -200, dy: 0, dw: 800, dh: 800 });
    }

    #[test]
    fn test_cover_fit_exact_aspect_fills_box() {
        let fit = cover_fit(1280, 720, 640, 360);
        assert_eq!(fit, FitRect { dx: 0, dy: 0, dw: 640, dh: 360 });
    }

    #[test]
    fn test_cover_fit_upscales() {
        let fit = cover_fit(100, 100, 300, 200);
        assert_eq!(fit, FitRect { dx: 0, dy: -50, dw: 300, dh: 300 });
    }

    #[test]
    fn test_cover_fit_degenerate_is_noop() {
        assert_eq!(
            cover_fit(0, 720, 640, 360),
            FitRect { dx: 0, dy: 0, dw: 640, dh: 360 }
        );
        assert_eq!(
            cover_fit(1280, 720, 0, 0),
            FitRect { dx: 0, dy: 0, dw: 0, dh: 0 }
        );
    }

    #[test]
    fn test_project_through_offset_rect() {
        let fit = FitRect { dx: 0, dy: -100, dw: 400, dh: 400 };
        assert_eq!(fit.project(0.5, 0.5), (200, 100));
        assert_eq!(fit.project(0.0, 0.0), (0, -100));
        assert_eq!(fit.project(1.0, 1.0), (400, 300));
    }

    #[test]
    fn test_to_unit_passthrough_in_range() {
        assert_eq!(to_unit(0.25, 0.75, 1280, 720), (0.25, 0.75));
    }

    #[test]
    fn test_to_unit_pixel_absolute() {
        assert_eq!(to_unit(640.0, 360.0, 1280, 720), (0.5, 0.5));
    }

    #[test]
    fn test_to_unit_clamps() {
        assert_eq!(to_unit(-0.5, 1.0, 1280, 720), (0.0, 1.0));
        // ピクセル座標換算後も範囲外ならクランプ
        let (ux, uy) = to_unit(2000.0, 100.0, 1280, 720);
        assert_eq!(ux, 1.0);
        assert!((uy - 100.0 / 720.0).abs() < 1e-6);
    }
}
