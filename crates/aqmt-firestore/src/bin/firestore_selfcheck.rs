use aqmt_firestore::{FirestoreClient, FirestoreConfig, SettingsRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = FirestoreConfig::from_env()?;
    println!(
        "firestore-selfcheck: project={} database={} emulator={}",
        config.project_id,
        config.database_id,
        config.emulator_host.as_deref().unwrap_or("-")
    );

    let client = FirestoreClient::new(config).await?;
    let settings = SettingsRepository::new(client).get().await?;
    println!(
        "firestore-selfcheck: ok (platform: {}, uploads allowed: {})",
        settings.platform_name, settings.allow_video_uploads
    );
    Ok(())
}
