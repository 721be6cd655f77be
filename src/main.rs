//! Posture monitor viewer: MJPEGストリームを表示し、姿勢判定の
//! オーバーレイとテレメトリを重ねるメインアプリ。

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use posture_monitor::config::Config;
use posture_monitor::handoff::SessionContext;
use posture_monitor::render::{cover_fit, Key, MinifbRenderer, FALLBACK_RESOLUTION};
use posture_monitor::session::MonitorSession;
use posture_monitor::snapshot;
use posture_monitor::stream::StreamHealth;
use posture_monitor::telemetry;

const CONFIG_PATH: &str = "config.toml";

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

type LogFile = Arc<Mutex<std::io::BufWriter<std::fs::File>>>;

fn open_log_file() -> Result<LogFile> {
    std::fs::create_dir_all("logs")?;
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("logs/viewer_{}.log", ts);
    let file = std::fs::File::create(&path)?;
    eprintln!("Log: {}", path);
    Ok(Arc::new(Mutex::new(std::io::BufWriter::new(file))))
}

macro_rules! log {
    ($logfile:expr, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        eprintln!("{}", msg);
        if let Ok(mut f) = $logfile.lock() {
            let _ = writeln!(f, "{}", msg);
            let _ = f.flush();
        }
    }};
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);
    let logfile = open_log_file()?;
    log!(logfile, "Posture Monitor ({})", env!("GIT_VERSION"));
    log!(
        logfile,
        "[config] stream={} posture={} poll={}ms",
        config.stream.url,
        config.posture.url,
        config.posture.poll_interval_ms
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    let mut session = MonitorSession::new(
        runtime.handle().clone(),
        config.stream.clone(),
        config.posture.clone(),
    );
    session.open()?;
    session.start_stream()?;

    // コンソール入力スレッド: url <URL> / handoff / quit
    let (cmd_tx, cmd_rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            if stdin.read_line(&mut line).is_err() {
                break;
            }
            if cmd_tx.send(line.trim().to_string()).is_err() {
                break;
            }
        }
    });

    println!("操作: [Space] ストリームON/OFF  [O] オーバーレイ  [G] グリッド  [S] スナップショット  [Esc] 終了");
    println!("コマンド: url <URL> (再接続) / handoff (次画面URL) / quit");

    let mut renderer = MinifbRenderer::new(
        "Posture Monitor",
        config.view.window_width,
        config.view.window_height,
    )?;
    let mut show_overlay = config.view.show_overlay;
    let mut show_grid = config.view.show_grid;
    let frame_duration = Duration::from_secs_f64(1.0 / config.view.target_fps.max(1) as f64);

    // FPS計測（1秒のローリングウィンドウ）
    let mut drawn_frames = 0u32;
    let mut fps_timer = Instant::now();
    let mut resolution = (0u32, 0u32);
    let mut last_health: Option<StreamHealth> = None;

    'main: while renderer.is_open() {
        let loop_start = Instant::now();

        // --- キー操作 ---
        if renderer.is_key_pressed(Key::Space) {
            if session.is_streaming() {
                session.stop_stream();
                last_health = None;
                log!(logfile, "[stream] stopped");
            } else {
                session.start_stream()?;
                log!(logfile, "[stream] starting: {}", session.stream_url());
            }
        }
        if renderer.is_key_pressed(Key::O) {
            show_overlay = !show_overlay;
        }
        if renderer.is_key_pressed(Key::G) {
            show_grid = !show_grid;
        }
        if renderer.is_key_pressed(Key::S) {
            let (w, h) = renderer.size();
            match snapshot::save_snapshot(renderer.buffer(), w, h) {
                Ok(path) => log!(logfile, "[snapshot] saved: {}", path.display()),
                Err(e) => log!(logfile, "[snapshot] failed: {e:#}"),
            }
        }

        // --- コンソールコマンド ---
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd.as_str() {
                "" => {}
                "quit" | "q" => break 'main,
                "handoff" => {
                    let context = SessionContext::from_config(
                        &config.session,
                        session.stream_url(),
                        &config.posture.url,
                    );
                    println!("next: {}", context.follow_on_url(&config.session.report_url));
                }
                other => {
                    if let Some(url) = other.strip_prefix("url ") {
                        match session.apply_stream_url(url.trim().to_string()) {
                            Ok(()) => {
                                last_health = None;
                                resolution = (0, 0);
                                log!(logfile, "[stream] url applied: {}", url.trim());
                            }
                            Err(e) => log!(logfile, "[stream] url apply failed: {e:#}"),
                        }
                    } else {
                        println!("不明なコマンド: {}", other);
                    }
                }
            }
        }

        // --- 描画 ---
        if let Some(shared) = session.stream_shared() {
            renderer.sync_size();

            let frame = shared.latest_frame();
            let natural = frame
                .as_ref()
                .map(|f| (f.width, f.height))
                .unwrap_or(FALLBACK_RESOLUTION);
            // 解像度は実寸が変わったときだけ更新する
            if frame.is_some() && natural != resolution {
                resolution = natural;
                log!(
                    logfile,
                    "[stream] resolution {}x{} ({})",
                    natural.0,
                    natural.1,
                    telemetry::aspect_ratio(natural.0, natural.1)
                );
            }

            let (bw, bh) = renderer.size();
            let fit = cover_fit(natural.0, natural.1, bw as u32, bh as u32);
            let sample = session
                .posture_shared()
                .map(|p| p.sample())
                .unwrap_or_default();

            renderer.clear();
            if let Some(ref frame) = frame {
                renderer.draw_frame_cover(frame, fit);
                drawn_frames += 1;
            }
            if show_grid {
                renderer.draw_grid();
            }
            if show_overlay {
                renderer.draw_overlay(&sample, fit, natural.0, natural.1);
            }
            renderer.draw_confidence_bar(telemetry::clamp_confidence(sample.confidence));

            // 1フレーム分の描画エラーでループを殺さない
            if let Err(e) = renderer.update() {
                log!(logfile, "[render] {e:#}");
            }

            // ストリームエラーは遷移時に一度だけ表示する
            let health = shared.health();
            if last_health != Some(health) {
                if health == StreamHealth::Bad {
                    let detail = shared.last_error().unwrap_or_default();
                    log!(
                        logfile,
                        "[stream] Unable to load stream from {}: {}",
                        session.stream_url(),
                        detail
                    );
                }
                last_health = Some(health);
            }
        } else {
            // ストリーム停止中は再描画せず入力イベントだけ処理する
            renderer.update_without_redraw();
        }

        // --- 1秒ごとのテレメトリ ---
        let window = fps_timer.elapsed();
        if window >= Duration::from_secs(1) {
            let fps = drawn_frames as f32 / window.as_secs_f32();

            if let Some(shared) = session.stream_shared() {
                // 1秒間フレームを描き続けられたら健全とみなす
                if shared.health() == StreamHealth::Checking && drawn_frames > 0 {
                    shared.set_health(StreamHealth::Ok);
                }
            }

            let health_label = session
                .stream_shared()
                .map(|s| s.health().label())
                .unwrap_or("stopped");

            let mut line = format!(
                "[view] fps={:.1} {}x{} ({}) health={}",
                fps,
                resolution.0,
                resolution.1,
                telemetry::aspect_ratio(resolution.0, resolution.1),
                health_label
            );
            if let Some(posture) = session.posture_shared() {
                let sample = posture.sample();
                line.push_str(&format!(
                    " | posture={} {:.0}%",
                    sample.position,
                    telemetry::clamp_confidence(sample.confidence)
                ));
                if !sample.suggestions.is_empty() {
                    line.push_str(&format!(" | {}", sample.suggestions.join(" / ")));
                }
                let now = chrono::Local::now();
                let history = posture.history();
                if !history.is_empty() {
                    let entries: Vec<String> = history
                        .iter()
                        .map(|e| {
                            let secs = now
                                .signed_duration_since(e.detected_at)
                                .num_seconds()
                                .max(0) as u64;
                            format!(
                                "{}({})",
                                e.position,
                                telemetry::relative_time(Duration::from_secs(secs))
                            )
                        })
                        .collect();
                    line.push_str(&format!(" | history: {}", entries.join(" ")));
                }
            }
            log!(logfile, "{}", line);

            drawn_frames = 0;
            fps_timer = Instant::now();
        }

        // フレームレート制御
        let elapsed = loop_start.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
    }

    log!(logfile, "Shutting down...");
    session.close();
    Ok(())
}
