//! Logger installation for the embedding app.
//!
//! The bridge only ever talks to the `log` facade. Android routes records to
//! logcat; other targets use `env_logger` (honours `RUST_LOG`).

#[cfg(target_os = "android")]
pub fn init() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("unruggable-bridge"),
    );
    log::info!("Android logger initialized with Debug level");
}

#[cfg(not(target_os = "android"))]
pub fn init() {
    // Safe to call more than once; later calls are no-ops.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
