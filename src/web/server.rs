use std::{env, error::Error, net::SocketAddr};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resample_wav::{config, web};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resample_wav=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::load_config()?;
    let state = web::AppState::from_config(&config);

    // Port from the command line wins over config.toml
    let port = parse_port_from_args().unwrap_or(config.server_or_default().port);

    let app = web::app(state);

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Listening on http://localhost:{}", port);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// Parse port from command line arguments
// Format: --port XXXX or -p XXXX
fn parse_port_from_args() -> Option<u16> {
    let args: Vec<String> = env::args().collect();

    args.windows(2)
        .find(|pair| pair[0] == "--port" || pair[0] == "-p")
        .and_then(|pair| pair[1].parse::<u16>().ok())
}
