//! Aquarium Web - browser entry point
//!
//! Sets up panic reporting and logging, reads overrides from the page URL,
//! binds the host page's controls and runs the Bevy app on the page canvas.
//! Native builds get [`init_native_logging`] and [`run_native`] for desktop
//! runs.

pub mod app;
#[cfg(target_arch = "wasm32")]
mod dom;
pub mod settings;

pub use settings::QueryOverrides;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// WASM entry point
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    let search = web_sys::window()
        .and_then(|window| window.location().search().ok())
        .unwrap_or_default();
    let overrides = QueryOverrides::from_search(&search);

    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(overrides.log.unwrap_or(tracing::Level::WARN))
            .build(),
    );

    let config = overrides.apply(aquarium_core::AquariumConfig::default());
    tracing::info!(
        fish = config.fish.max,
        visible = config.fish.initial_visible,
        seed = ?config.fish.seed,
        "Starting aquarium"
    );
    app::run(config, "");
}

/// Install a `tracing-subscriber` formatter; `RUST_LOG` wins over `default_filter`
#[cfg(not(target_arch = "wasm32"))]
pub fn init_native_logging(default_filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;
    Ok(())
}

/// Run the app in a desktop window
#[cfg(not(target_arch = "wasm32"))]
pub fn run_native(config: aquarium_core::AquariumConfig, asset_root: &str) -> anyhow::Result<()> {
    config.validate()?;
    tracing::info!(
        fish = config.fish.max,
        visible = config.fish.initial_visible,
        assets = asset_root,
        "Starting aquarium"
    );

    match app::run(config, asset_root) {
        bevy::app::AppExit::Success => Ok(()),
        bevy::app::AppExit::Error(code) => anyhow::bail!("app exited with code {code}"),
    }
}
