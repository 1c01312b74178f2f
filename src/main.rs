use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use audioscribe::application::ports::JobStore;
use audioscribe::application::services::{
    JobProcessor, JobProcessorConfig, NotificationConsumer, TranscriptionService,
};
use audioscribe::infrastructure::audio::FfmpegTranscoder;
use audioscribe::infrastructure::llm::GeminiSummarizer;
use audioscribe::infrastructure::messaging::NotificationChannelFactory;
use audioscribe::infrastructure::observability::{TracingConfig, init_tracing};
use audioscribe::infrastructure::persistence::{
    InMemoryJobStore, PgJobStore, create_pool, run_migrations,
};
use audioscribe::infrastructure::speech::GoogleSpeechClient;
use audioscribe::infrastructure::storage::StagingStoreFactory;
use audioscribe::presentation::config::StoreProvider;
use audioscribe::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("failed to load settings")?;

    init_tracing(&TracingConfig {
        environment: environment.to_string(),
        json_format: settings.logging.enable_json || TracingConfig::default().json_format,
        level: Some(settings.logging.level.clone()),
    });

    let job_store: Arc<dyn JobStore> = match settings.store.provider {
        StoreProvider::Postgres => {
            let pool = create_pool(&settings.database.url, settings.database.max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            run_migrations(&pool).await?;
            Arc::new(PgJobStore::new(pool))
        }
        StoreProvider::Memory => {
            tracing::warn!("Using in-memory job store; job state is lost on restart");
            Arc::new(InMemoryJobStore::new())
        }
    };

    let channel = NotificationChannelFactory::create(&settings.messaging);
    let staging_store = StagingStoreFactory::create(&settings.storage)?;

    let speech = Arc::new(GoogleSpeechClient::new(
        &settings.speech.endpoint,
        settings.speech.api_key.clone(),
        settings.speech.access_token.clone(),
    ));
    let summarizer = Arc::new(GeminiSummarizer::new(
        &settings.summarization.endpoint,
        settings.summarization.api_key.clone(),
        settings.summarization.model.clone(),
        settings.summarization.prompt_template.clone(),
    ));

    let processor = Arc::new(JobProcessor::new(
        Arc::clone(&job_store),
        speech.clone(),
        summarizer.clone(),
        JobProcessorConfig {
            poll_interval: settings.processor.poll_interval(),
            max_wait: settings.processor.max_wait(),
            language_code: settings.speech.language_code.clone(),
        },
    ));

    let transcription_service = Arc::new(TranscriptionService::new(
        Arc::new(FfmpegTranscoder::new(settings.transcoder.ffmpeg_path.clone())),
        speech,
        summarizer,
        settings.speech.language_code.clone(),
    ));

    let shutdown = CancellationToken::new();

    let consumer = NotificationConsumer::new(
        Arc::clone(&channel.source),
        processor,
        shutdown.clone(),
    );
    // The server stops whenever the consumer does, panics included.
    let consumer_guard = shutdown.clone().drop_guard();
    let consumer_handle = tokio::spawn(async move {
        let _stop_server = consumer_guard;
        let result = consumer.run().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Notification consumer stopped, shutting down");
        }
        result
    });

    let state = AppState {
        job_store,
        publisher: channel.publisher,
        staging_store,
        transcription_service,
        max_upload_bytes: settings.server.max_upload_bytes(),
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown requested");
        signal_token.cancel();
    });

    let server_token = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await?;

    // The server also stops if it fails; make sure the consumer follows.
    shutdown.cancel();
    consumer_handle
        .await
        .context("notification consumer panicked")??;

    Ok(())
}
