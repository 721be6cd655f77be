use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{PostureConfig, StreamConfig};
use crate::posture::{PosturePoller, PostureShared};
use crate::stream::{StreamClient, StreamShared};

/// ストリーム取り込みと姿勢ポーリングの起動・停止を束ねるセッション。
///
/// ポーラーはビューが開いている間ずっと動き、ストリームだけ
/// ユーザー操作でON/OFFされる。start/stop系はすべて冪等で、
/// 停止後にタスクやタイマーが残ることはない。
pub struct MonitorSession {
    runtime: tokio::runtime::Handle,
    stream_config: StreamConfig,
    posture_config: PostureConfig,
    stream: Option<StreamClient>,
    poller: Option<PosturePoller>,
}

impl MonitorSession {
    pub fn new(
        runtime: tokio::runtime::Handle,
        stream_config: StreamConfig,
        posture_config: PostureConfig,
    ) -> Self {
        Self {
            runtime,
            stream_config,
            posture_config,
            stream: None,
            poller: None,
        }
    }

    /// ポーリングを開始する。既に動いていれば何もしない。
    pub fn open(&mut self) -> Result<()> {
        if self.poller.is_none() {
            self.poller = Some(PosturePoller::start(
                &self.runtime,
                self.posture_config.url.clone(),
                Duration::from_millis(self.posture_config.poll_interval_ms),
            )?);
        }
        Ok(())
    }

    /// ストリーム取り込みを開始する。既に動いていれば何もしない。
    pub fn start_stream(&mut self) -> Result<()> {
        if self.stream.is_none() {
            self.stream = Some(StreamClient::connect(
                &self.runtime,
                self.stream_config.clone(),
            )?);
        }
        Ok(())
    }

    pub fn stop_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_config.url
    }

    /// ストリームURLを差し替える。取り込み中なら接続し直す。
    pub fn apply_stream_url(&mut self, url: String) -> Result<()> {
        let was_streaming = self.is_streaming();
        self.stop_stream();
        self.stream_config.url = url;
        if was_streaming {
            self.start_stream()?;
        }
        Ok(())
    }

    /// 姿勢エンドポイントのURLを差し替え、ポーラーを再起動する
    pub fn apply_posture_url(&mut self, url: String) -> Result<()> {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.posture_config.url = url;
        self.open()
    }

    pub fn stream_shared(&self) -> Option<Arc<StreamShared>> {
        self.stream.as_ref().map(|s| s.shared())
    }

    pub fn posture_shared(&self) -> Option<Arc<PostureShared>> {
        self.poller.as_ref().map(|p| p.shared())
    }

    /// すべて停止する。二重呼び出し可。
    pub fn close(&mut self) {
        self.stop_stream();
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> MonitorSession {
        // 到達不能ポート: タスクはすぐ失敗するが、起動・停止の
        // ライフサイクルはネットワークと無関係に検証できる
        MonitorSession::new(
            tokio::runtime::Handle::current(),
            StreamConfig {
                url: "http://127.0.0.1:1/pi-stream/".to_string(),
                ..StreamConfig::default()
            },
            PostureConfig {
                url: "http://127.0.0.1:1/posture".to_string(),
                poll_interval_ms: 10,
            },
        )
    }

    #[tokio::test]
    async fn test_open_and_close_are_idempotent() {
        let mut session = test_session();
        session.open().unwrap();
        session.open().unwrap();
        assert!(session.posture_shared().is_some());
        session.close();
        session.close();
        assert!(session.posture_shared().is_none());
    }

    #[tokio::test]
    async fn test_stream_toggle() {
        let mut session = test_session();
        assert!(!session.is_streaming());
        session.start_stream().unwrap();
        assert!(session.is_streaming());
        session.start_stream().unwrap();
        session.stop_stream();
        assert!(!session.is_streaming());
        assert!(session.stream_shared().is_none());
        session.stop_stream();
    }

    #[tokio::test]
    async fn test_apply_stream_url_when_stopped_stays_stopped() {
        let mut session = test_session();
        session
            .apply_stream_url("http://127.0.0.1:1/other/".to_string())
            .unwrap();
        assert!(!session.is_streaming());
        assert_eq!(session.stream_url(), "http://127.0.0.1:1/other/");
    }

    #[tokio::test]
    async fn test_apply_stream_url_reconnects_when_streaming() {
        let mut session = test_session();
        session.start_stream().unwrap();
        let before = session.stream_shared().unwrap();
        session
            .apply_stream_url("http://127.0.0.1:1/other/".to_string())
            .unwrap();
        assert!(session.is_streaming());
        let after = session.stream_shared().unwrap();
        assert!(!Arc::ptr_eq(&before, &after), "stream should be replaced");
    }
}
