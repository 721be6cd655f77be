use anyhow::{Context, Result};
use futures::{StreamExt, TryStreamExt};
use std::io;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use super::mjpeg::MjpegFrameCodec;
use crate::config::StreamConfig;

/// ストリームの状態。
/// Checking: 最初のフレーム待ち。Ok: 描画ループが1秒間フレームを
/// 描き続けたら昇格させる。Bad: 接続・デコードエラー。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamHealth {
    Checking,
    Ok,
    Bad,
}

impl StreamHealth {
    fn as_u8(self) -> u8 {
        match self {
            StreamHealth::Checking => 0,
            StreamHealth::Ok => 1,
            StreamHealth::Bad => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => StreamHealth::Ok,
            2 => StreamHealth::Bad,
            _ => StreamHealth::Checking,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StreamHealth::Checking => "checking",
            StreamHealth::Ok => "ok",
            StreamHealth::Bad => "bad",
        }
    }
}

/// デコード済みの1フレーム。pixelsは0RGB形式。
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

/// 取り込みタスクが書き、描画ループが読む共有状態。
/// 最新フレーム保持とframe_idカウンタの形はThreadedCameraと同じ。
#[derive(Debug)]
pub struct StreamShared {
    latest: Mutex<Option<Arc<VideoFrame>>>,
    frame_id: AtomicU64,
    health: AtomicU8,
    last_error: Mutex<Option<String>>,
}

impl StreamShared {
    fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            frame_id: AtomicU64::new(0),
            health: AtomicU8::new(StreamHealth::Checking.as_u8()),
            last_error: Mutex::new(None),
        }
    }

    /// 最新フレーム。取り込みタスクが新フレームを書くまで同じものが返る。
    /// 初回フレーム到着前のみNone。
    pub fn latest_frame(&self) -> Option<Arc<VideoFrame>> {
        self.latest.lock().unwrap().clone()
    }

    /// 新フレームが到着するたびにインクリメントされる
    pub fn frame_id(&self) -> u64 {
        self.frame_id.load(Ordering::Acquire)
    }

    pub fn health(&self) -> StreamHealth {
        StreamHealth::from_u8(self.health.load(Ordering::Acquire))
    }

    pub fn set_health(&self, health: StreamHealth) {
        self.health.store(health.as_u8(), Ordering::Release);
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    fn publish(&self, frame: VideoFrame) {
        *self.latest.lock().unwrap() = Some(Arc::new(frame));
        self.frame_id.fetch_add(1, Ordering::Release);
    }

    fn fail(&self, message: String) {
        *self.last_error.lock().unwrap() = Some(message);
        self.set_health(StreamHealth::Bad);
    }
}

/// MJPEGストリームを取り込み、最新フレームを公開し続けるタスクのハンドル。
///
/// エラー時は健全性をBadにしてタスクを終える。自動再接続はしない:
/// 復帰はユーザー操作（トグル or URL変更）によるconnectのやり直し。
pub struct StreamClient {
    shared: Arc<StreamShared>,
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl StreamClient {
    pub fn connect(runtime: &tokio::runtime::Handle, config: StreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("failed to build stream http client")?;
        let shared = Arc::new(StreamShared::new());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(ingest_entry(client, config, Arc::clone(&shared), shutdown_rx));
        Ok(Self {
            shared,
            shutdown,
            task,
        })
    }

    pub fn shared(&self) -> Arc<StreamShared> {
        Arc::clone(&self.shared)
    }

    /// 取り込みを止める。二重呼び出し可。
    /// レスポンスストリームのdropで進行中のHTTP転送もキャンセルされる。
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
        self.task.abort();
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn ingest_entry(
    client: reqwest::Client,
    config: StreamConfig,
    shared: Arc<StreamShared>,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Err(e) = ingest(client, &config, &shared, &mut shutdown).await {
        // 停止要求によるエラーはユーザーに見せない
        if !*shutdown.borrow() {
            shared.fail(format!("{e:#}"));
        }
    }
}

async fn ingest(
    client: reqwest::Client,
    config: &StreamConfig,
    shared: &StreamShared,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<()> {
    let response = client
        .get(&config.url)
        .send()
        .await
        .context("stream request failed")?
        .error_for_status()
        .context("stream endpoint returned error status")?;

    let byte_stream = response
        .bytes_stream()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
    let reader = StreamReader::new(byte_stream);
    let mut frames = FramedRead::new(reader, MjpegFrameCodec::new(config.max_frame_bytes));

    loop {
        tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            next = frames.next() => match next {
                Some(Ok(jpeg)) => {
                    let frame = decode_jpeg(&jpeg).context("jpeg decode failed")?;
                    shared.publish(frame);
                }
                Some(Err(e)) => return Err(e).context("mjpeg stream error"),
                None => anyhow::bail!("stream closed by server"),
            },
        }
    }
}

fn decode_jpeg(data: &[u8]) -> Result<VideoFrame> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)?.to_rgb8();
    let (width, height) = img.dimensions();
    let mut pixels = Vec::with_capacity((width as usize) * (height as usize));
    for p in img.pixels() {
        pixels.push(((p[0] as u32) << 16) | ((p[1] as u32) << 8) | (p[2] as u32));
    }
    Ok(VideoFrame {
        width,
        height,
        pixels,
    })
}
