use anyhow::Context;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = helmet_showcase::ShowcaseConfig::from_env();
    log::info!("Starting {}", config.window_title);

    helmet_showcase::ShowcaseApp::new(config)
        .context("Failed to start the showcase")?
        .run()
}
