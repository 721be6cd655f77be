use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use super::history::{DetectionEntry, DetectionHistory};
use super::sample::PostureSample;

/// ポーラーが書き、表示側が読む共有状態。
/// revisionは成功フェッチごとにインクリメントされる（更新通知用）。
#[derive(Debug)]
pub struct PostureShared {
    sample: Mutex<PostureSample>,
    history: Mutex<DetectionHistory>,
    last_updated: Mutex<Option<DateTime<Local>>>,
    revision: AtomicU64,
}

impl PostureShared {
    pub fn new() -> Self {
        Self {
            sample: Mutex::new(PostureSample::default()),
            history: Mutex::new(DetectionHistory::new()),
            last_updated: Mutex::new(None),
            revision: AtomicU64::new(0),
        }
    }

    /// 現在のサンプルのコピー
    pub fn sample(&self) -> PostureSample {
        self.sample.lock().unwrap().clone()
    }

    /// 履歴のコピー（新しい順）
    pub fn history(&self) -> Vec<DetectionEntry> {
        self.history.lock().unwrap().iter().cloned().collect()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        *self.last_updated.lock().unwrap()
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// 新しいサンプルで丸ごと置き換え、履歴と更新時刻を記録する
    pub fn publish(&self, sample: PostureSample, now: DateTime<Local>) {
        self.history.lock().unwrap().record(&sample.position, now);
        *self.sample.lock().unwrap() = sample;
        *self.last_updated.lock().unwrap() = Some(now);
        self.revision.fetch_add(1, Ordering::Release);
    }
}

impl Default for PostureShared {
    fn default() -> Self {
        Self::new()
    }
}

/// 姿勢判定エンドポイントを一定間隔でポーリングするタスクのハンドル。
///
/// ポーリングは逐次実行: 1回のフェッチが完了（成功・失敗どちらでも）して
/// から次の待機を始めるので、リクエストが重なることはない。
/// 失敗時は前回のサンプルを保持したまま黙って次周期に進む。
pub struct PosturePoller {
    shared: Arc<PostureShared>,
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl PosturePoller {
    pub fn start(runtime: &tokio::runtime::Handle, url: String, interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build posture http client")?;
        let shared = Arc::new(PostureShared::new());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(poll_loop(client, url, interval, Arc::clone(&shared), shutdown_rx));
        Ok(Self {
            shared,
            shutdown,
            task,
        })
    }

    pub fn shared(&self) -> Arc<PostureShared> {
        Arc::clone(&self.shared)
    }

    /// ポーリングを止める。二重呼び出し可。
    /// 進行中のフェッチはawait境界で破棄され、停止後に状態が書かれることはない。
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
        self.task.abort();
    }
}

impl Drop for PosturePoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    client: reqwest::Client,
    url: String,
    interval: Duration,
    shared: Arc<PostureShared>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        if let Ok(value) = fetch_sample(&client, &url).await {
            shared.publish(PostureSample::from_json(&value), Local::now());
        }
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

async fn fetch_sample(client: &reqwest::Client, url: &str) -> Result<Value> {
    let response = client
        .get(url)
        .header(reqwest::header::CACHE_CONTROL, "no-cache")
        .send()
        .await
        .context("posture request failed")?
        .error_for_status()
        .context("posture endpoint returned error status")?;
    let value = response.json::<Value>().await.context("invalid posture payload")?;
    Ok(value)
}
