//! ストリーム診断: ウィンドウなしで数秒間取り込み、
//! フレームサイズと実測fpsを報告する。

use anyhow::Result;
use std::time::{Duration, Instant};

use posture_monitor::config::Config;
use posture_monitor::stream::{StreamClient, StreamHealth};
use posture_monitor::telemetry;

const PROBE_SECS: u64 = 5;

fn main() -> Result<()> {
    let config = Config::load_or_default("config.toml");
    println!("=== ストリームプローブ ===");
    println!("URL: {}", config.stream.url);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let client = StreamClient::connect(runtime.handle(), config.stream.clone())?;
    let shared = client.shared();

    let probe_duration = Duration::from_secs(PROBE_SECS);
    let start = Instant::now();
    let mut last_id = 0u64;
    let mut frames = 0u64;
    let mut reported = (0u32, 0u32);

    while start.elapsed() < probe_duration {
        let id = shared.frame_id();
        if id != last_id {
            frames += id - last_id;
            last_id = id;
            if let Some(frame) = shared.latest_frame() {
                if (frame.width, frame.height) != reported {
                    reported = (frame.width, frame.height);
                    println!(
                        "frame: {}x{} ({})",
                        frame.width,
                        frame.height,
                        telemetry::aspect_ratio(frame.width, frame.height)
                    );
                }
            }
        }
        if shared.health() == StreamHealth::Bad {
            println!(
                "stream error: {}",
                shared.last_error().unwrap_or_default()
            );
            client.stop();
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    println!(
        "frames: {} ({:.1} fps)",
        frames,
        frames as f64 / probe_duration.as_secs_f64()
    );
    client.stop();
    Ok(())
}
