use std::time::Duration;

/// 解像度を既約のアスペクト比表記にする。次元が0なら "—"。
pub fn aspect_ratio(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return "—".to_string();
    }
    let g = gcd(width, height);
    format!("{}:{}", width / g, height / g)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// 表示用の信頼度。0〜100にクランプする（非数は0）。
pub fn clamp_confidence(raw: f32) -> f32 {
    if raw.is_finite() {
        raw.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// 経過時間を秒/分/時間のバケットで相対表記にする
pub fn relative_time(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3_600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_reduces() {
        assert_eq!(aspect_ratio(1920, 1080), "16:9");
        assert_eq!(aspect_ratio(1280, 720), "16:9");
        assert_eq!(aspect_ratio(640, 480), "4:3");
        assert_eq!(aspect_ratio(800, 800), "1:1");
    }

    #[test]
    fn test_aspect_ratio_zero_is_dash() {
        assert_eq!(aspect_ratio(0, 0), "—");
        assert_eq!(aspect_ratio(1920, 0), "—");
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(-5.0), 0.0);
        assert_eq!(clamp_confidence(150.0), 100.0);
        assert_eq!(clamp_confidence(87.5), 87.5);
        assert_eq!(clamp_confidence(f32::NAN), 0.0);
    }

    #[test]
    fn test_relative_time_buckets() {
        assert_eq!(relative_time(Duration::from_secs(0)), "0s ago");
        assert_eq!(relative_time(Duration::from_secs(59)), "59s ago");
        assert_eq!(relative_time(Duration::from_secs(60)), "1m ago");
        assert_eq!(relative_time(Duration::from_secs(3_599)), "59m ago");
        assert_eq!(relative_time(Duration::from_secs(7_200)), "2h ago");
    }
}
