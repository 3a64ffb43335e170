use gramlens_etl::{config, pipeline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gramlens_etl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = config::Settings::new().expect("Failed to load settings");

    match pipeline::run(&settings) {
        Ok(summary) => {
            tracing::info!(
                posts = summary.load.posts,
                comments = summary.load.comments,
                flat_texts = summary.load.flat_texts,
                "run complete"
            );
        }
        Err(err) => {
            tracing::error!(error = %err, "pipeline failed");
            std::process::exit(1);
        }
    }
}
