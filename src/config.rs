use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub posture: PostureConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    /// MJPEGストリームのURL
    #[serde(default = "default_stream_url")]
    pub url: String,
    /// 1フレームの最大バイト数（これを超えたらストリームエラー）
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// 接続タイムアウト（秒）
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PostureConfig {
    /// 姿勢判定エンドポイントのURL
    #[serde(default = "default_posture_url")]
    pub url: String,
    /// ポーリング間隔（ミリ秒）。前回の完了から次回の開始まで。
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    #[serde(default = "default_window_width")]
    pub window_width: usize,
    #[serde(default = "default_window_height")]
    pub window_height: usize,
    #[serde(default = "default_true")]
    pub show_overlay: bool,
    #[serde(default)]
    pub show_grid: bool,
    /// 描画ループの目標FPS
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
}

/// 次画面へそのまま引き渡すセッション識別子
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default)]
    pub registration_id: String,
    #[serde(default)]
    pub report_id: String,
    #[serde(default)]
    pub assignment_id: String,
    #[serde(default)]
    pub teacher_username: String,
    #[serde(default = "default_report_url")]
    pub report_url: String,
}

fn default_stream_url() -> String { "http://raspberrypi.local/pi-stream/".to_string() }
fn default_max_frame_bytes() -> usize { 4 * 1024 * 1024 }
fn default_connect_timeout_secs() -> u64 { 5 }
fn default_posture_url() -> String { "http://127.0.0.1:8000/posture".to_string() }
fn default_poll_interval_ms() -> u64 { 1_000 }
fn default_window_width() -> usize { 960 }
fn default_window_height() -> usize { 540 }
fn default_true() -> bool { true }
fn default_target_fps() -> u32 { 60 }
fn default_report_url() -> String { "http://127.0.0.1:8000/report".to_string() }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            registration_id: String::new(),
            report_id: String::new(),
            assignment_id: String::new(),
            teacher_username: String::new(),
            report_url: default_report_url(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            max_frame_bytes: default_max_frame_bytes(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            url: default_posture_url(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            show_overlay: default_true(),
            show_grid: false,
            target_fps: default_target_fps(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルが無い・壊れている場合はデフォルトで起動する
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(c) => c,
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.posture.url, "http://127.0.0.1:8000/posture");
        assert_eq!(config.posture.poll_interval_ms, 1_000);
        assert!(config.view.show_overlay);
        assert!(!config.view.show_grid);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [stream]
            url = "http://10.0.0.2:8080/stream"

            [view]
            show_grid = true
            "#,
        )
        .unwrap();
        assert_eq!(config.stream.url, "http://10.0.0.2:8080/stream");
        assert_eq!(config.stream.max_frame_bytes, 4 * 1024 * 1024);
        assert!(config.view.show_grid);
        assert_eq!(config.view.window_width, 960);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.stream.url, default_stream_url());
    }
}
