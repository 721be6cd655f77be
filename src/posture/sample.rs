use serde_json::Value;

/// 検出された身体ランドマーク1点。
/// 通常は0.0〜1.0の正規化座標だが、エンドポイントによっては
/// ピクセル座標が混入するため描画側で防御的に変換する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 姿勢判定エンドポイントの1回分の結果。
/// 受信後は不変で、次の成功フェッチで丸ごと置き換えられる。
#[derive(Debug, Clone, PartialEq)]
pub struct PostureSample {
    pub position: String,
    /// 0〜100。範囲外の値もそのまま保持し、表示時にクランプする。
    pub confidence: f32,
    pub suggestions: Vec<String>,
    pub keypoints: Option<Vec<Keypoint>>,
    /// 骨格エッジ (開始インデックス, 終了インデックス)
    pub connections: Option<Vec<(usize, usize)>>,
}

impl Default for PostureSample {
    fn default() -> Self {
        Self {
            position: "Unknown".to_string(),
            confidence: 0.0,
            suggestions: Vec::new(),
            keypoints: None,
            connections: None,
        }
    }
}

impl PostureSample {
    /// エンドポイントのJSONから正規化して構築する。
    /// 欠損・型違いのフィールドはエラーにせずデフォルトに落とす。
    pub fn from_json(value: &Value) -> Self {
        let position = value
            .get("position")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unknown")
            .to_string();

        let confidence = value
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0) as f32;

        let suggestions = value
            .get("suggestions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let keypoints = value
            .get("keypoints")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_keypoint).collect::<Vec<_>>())
            .filter(|kps: &Vec<Keypoint>| !kps.is_empty());

        let connections = value
            .get("connections")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_connection).collect::<Vec<_>>())
            .filter(|cs: &Vec<(usize, usize)>| !cs.is_empty());

        Self {
            position,
            confidence,
            suggestions,
            keypoints,
            connections,
        }
    }
}

fn parse_keypoint(value: &Value) -> Option<Keypoint> {
    let x = value.get("x").and_then(Value::as_f64)? as f32;
    let y = value.get("y").and_then(Value::as_f64)? as f32;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Keypoint::new(x, y))
}

fn parse_connection(value: &Value) -> Option<(usize, usize)> {
    let pair = value.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    let a = pair[0].as_u64()? as usize;
    let b = pair[1].as_u64()? as usize;
    Some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_complete() {
        let v = json!({
            "position": "Upright",
            "confidence": 87.5,
            "suggestions": ["Relax shoulders"],
            "keypoints": [{"x": 0.5, "y": 0.25}, {"x": 0.1, "y": 0.9}],
            "connections": [[0, 1]],
        });
        let sample = PostureSample::from_json(&v);
        assert_eq!(sample.position, "Upright");
        assert_eq!(sample.confidence, 87.5);
        assert_eq!(sample.suggestions, vec!["Relax shoulders".to_string()]);
        assert_eq!(
            sample.keypoints.as_deref(),
            Some(&[Keypoint::new(0.5, 0.25), Keypoint::new(0.1, 0.9)][..])
        );
        assert_eq!(sample.connections.as_deref(), Some(&[(0usize, 1usize)][..]));
    }

    #[test]
    fn test_from_json_malformed_fields() {
        // confidenceが文字列、keypointsが文字列のような壊れた応答
        let v = json!({
            "position": "Slouching",
            "confidence": "high",
            "keypoints": "none",
        });
        let sample = PostureSample::from_json(&v);
        assert_eq!(sample.position, "Slouching");
        assert_eq!(sample.confidence, 0.0);
        assert!(sample.suggestions.is_empty());
        assert!(sample.keypoints.is_none());
        assert!(sample.connections.is_none());
    }

    #[test]
    fn test_from_json_empty_object() {
        let sample = PostureSample::from_json(&json!({}));
        assert_eq!(sample.position, "Unknown");
        assert_eq!(sample.confidence, 0.0);
        assert!(sample.keypoints.is_none());
    }

    #[test]
    fn test_from_json_blank_position_is_unknown() {
        let sample = PostureSample::from_json(&json!({"position": "  "}));
        assert_eq!(sample.position, "Unknown");
    }

    #[test]
    fn test_from_json_integer_confidence() {
        let sample = PostureSample::from_json(&json!({"confidence": 42}));
        assert_eq!(sample.confidence, 42.0);
    }

    #[test]
    fn test_from_json_skips_bad_keypoints() {
        let v = json!({
            "keypoints": [{"x": 0.5, "y": 0.5}, {"x": "a", "y": 0.1}, {"y": 0.2}],
        });
        let sample = PostureSample::from_json(&v);
        assert_eq!(sample.keypoints.as_ref().map(|k| k.len()), Some(1));
    }

    #[test]
    fn test_from_json_all_keypoints_bad_is_absent() {
        let v = json!({"keypoints": [{"x": "a"}, {}]});
        let sample = PostureSample::from_json(&v);
        assert!(sample.keypoints.is_none());
    }

    #[test]
    fn test_from_json_skips_bad_connections() {
        let v = json!({"connections": [[0, 1], [2], "x", [3, 4]]});
        let sample = PostureSample::from_json(&v);
        assert_eq!(
            sample.connections.as_deref(),
            Some(&[(0usize, 1usize), (3usize, 4usize)][..])
        );
    }
}
