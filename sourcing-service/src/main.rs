use anyhow::Result;
use bigdecimal::BigDecimal;
use clap::Parser;
use sourcing_service::{create_router, AppState};
use std::str::FromStr;
use tracing::info;

#[derive(Parser)]
#[command(name = "sourcing-service")]
struct Args {
    #[arg(long, env = "PORT", default_value = "3001")]
    port: u16,

    #[arg(long, env = "SOURCING_API_TOKEN")]
    api_token: String,

    /// Flat CAD drafting fee added to every payment request.
    #[arg(long, env = "CAD_FEE", default_value = shared::CAD_FEE)]
    cad_fee: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let cad_fee = BigDecimal::from_str(&args.cad_fee)
        .map_err(|e| anyhow::anyhow!("Invalid CAD fee {}: {}", args.cad_fee, e))?;
    info!("CAD fee set to {}", cad_fee);

    let app = create_router(AppState::new(cad_fee, args.api_token));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;

    info!("Sourcing service web server started on port {}", args.port);
    info!("Sourcing service ready to accept HTTP requests at http://0.0.0.0:{}/items", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
