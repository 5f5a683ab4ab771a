use std::sync::Arc;

use porter_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), porter_core::Error> {
    porter_core::logging::init("porter")?;

    let cfg = Arc::new(Config::load()?);

    porter_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| porter_core::Error::Gateway(format!("telegram bot failed: {e}")))?;

    Ok(())
}
