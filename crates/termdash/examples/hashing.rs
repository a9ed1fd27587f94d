//! Hash a handful of generated "files" on worker threads, one dashboard line
//! per file.
//!
//! Run with: cargo run -p termdash --example hashing [config.toml]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use termdash::indicator::ProgressIndicator;
use termdash::widgets::AnimationStyle;
use termdash::{AppError, Application, ApplicationConfig, Widget};

const CHUNK: usize = 64 * 1024;

const FILES: &[(&str, usize)] = &[
    ("linux-6.9.tar.xz", 96 * CHUNK),
    ("debian-12.iso", 160 * CHUNK),
    ("photos-2024.zip", 48 * CHUNK),
    ("a-rather-long-backup-archive-name-that-will-not-fit.tar.gz", 128 * CHUNK),
];

/// FNV-1a over one chunk, folded into `state`.
fn fnv1a(state: u64, chunk: &[u8]) -> u64 {
    chunk.iter().fold(state, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn hash_file(indicator: Arc<ProgressIndicator>, size: usize, pace: Duration) -> u64 {
    indicator.set_range(0.0, size as f64);
    indicator.set_value(0.0);

    let mut hash = 0xcbf2_9ce4_8422_2325;
    let mut chunk = vec![0u8; CHUNK];
    let mut done = 0;
    while done < size {
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = (done + i) as u8;
        }
        hash = fnv1a(hash, &chunk);
        done += CHUNK;
        indicator.set_value(done as f64);
        thread::sleep(pace);
    }
    hash
}

fn main() -> Result<(), AppError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let config = match std::env::args().nth(1) {
        Some(path) => ApplicationConfig::load(path)?,
        None => ApplicationConfig::default(),
    };
    let app = Application::new(config);
    app.start()?;

    let workers: Vec<_> = FILES
        .iter()
        .enumerate()
        .map(|(i, &(name, size))| {
            let indicator = Arc::new(ProgressIndicator::with_default_widgets(name));
            indicator.push_front(Widget::animation(AnimationStyle::DOTS));
            indicator.start(&app);

            let pace = Duration::from_millis(15 + 10 * i as u64);
            thread::spawn(move || {
                let hash = hash_file(indicator.clone(), size, pace);
                indicator.stop();
                (name, hash)
            })
        })
        .collect();

    let mut digests = Vec::with_capacity(workers.len());
    for worker in workers {
        if let Ok(digest) = worker.join() {
            digests.push(digest);
        }
    }
    app.stop();

    for (name, hash) in digests {
        println!("{hash:016x}  {name}");
    }
    Ok(())
}
