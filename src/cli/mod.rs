use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use crate::config::{build_http_client, Config};
use crate::core::{ExtractorEngine, FileFetcher};
use crate::extractors::{FacebookExtractor, TikTokExtractor};
use crate::server::{serve, AppState};

#[derive(Parser)]
#[command(name = "grab-server")]
#[command(about = "Extraction backend serving direct media URLs for TikTok and Facebook videos")]
#[command(version)]
pub struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let config = Config::default();
        let client = build_http_client()?;

        let mut engine = ExtractorEngine::new();
        engine.register_extractor(Box::new(TikTokExtractor::new(client.clone(), config)));
        engine.register_extractor(Box::new(FacebookExtractor::new(client.clone(), config)));

        let fetcher = FileFetcher::new(client, config.download_timeout);
        let state = Arc::new(AppState { engine, fetcher });

        serve(state, &self.host, self.port).await
    }
}
