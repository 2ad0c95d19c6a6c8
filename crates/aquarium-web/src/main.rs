//! Aquarium desktop runner

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use anyhow::Result;
    use aquarium_core::AquariumConfig;
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Parser, Debug)]
    #[command(name = "aquarium")]
    #[command(about = "3D aquarium with a fish school, squid, mirror and glass cage")]
    #[command(version)]
    struct Args {
        /// Path to configuration file
        #[arg(short, long, default_value = "aquarium.toml")]
        config: PathBuf,

        /// Directory holding the models and images
        #[arg(short, long, default_value = "assets")]
        assets: String,

        /// Number of fish to create
        #[arg(long)]
        fish: Option<usize>,

        /// Seed for the fish randomization
        #[arg(long)]
        seed: Option<u64>,

        /// Log filter used when RUST_LOG is unset
        #[arg(short, long, default_value = "info")]
        log_level: String,
    }

    pub fn main() -> Result<()> {
        let args = Args::parse();
        aquarium_web::init_native_logging(&args.log_level)?;

        let mut config = AquariumConfig::from_file(&args.config)?;
        if let Some(fish) = args.fish {
            config.fish.max = fish;
            config.fish.initial_visible = config.fish.initial_visible.min(fish);
        }
        if let Some(seed) = args.seed {
            config.fish.seed = Some(seed);
        }

        aquarium_web::run_native(config, &args.assets)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::main()
}

// The browser build starts from the library's wasm entry point
#[cfg(target_arch = "wasm32")]
fn main() {}
