use cask_core::Config;

// Use mimalloc as the global allocator for better performance and lower
// fragmentation, especially on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    cask_core::config::load_dotenv();

    cask_api::telemetry::init_telemetry();

    let config = Config::from_env()?;

    let (_state, router) = cask_api::setup::initialize_app(config.clone()).await?;

    cask_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
