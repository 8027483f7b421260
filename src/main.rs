use anyhow::Context;
use clap::{Parser, ValueEnum};
use cosmap::movie::Movie;
use cosmap::{
    all_successful, total_execution_time, total_request_charge, BulkOptions, CosmosClient, EntitySerializer,
    InMemoryStore, InMemoryStoreConfig, ProgressCallback, SerializerConfig,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Flat documents
    Document,
    /// Graph vertices
    Vertex,
}

/// Bulk-load a movie catalogue into an in-memory container
#[derive(Parser, Debug)]
#[command(name = "cosmap")]
#[command(about = "Map and bulk-load typed entities", long_about = None)]
struct Args {
    /// JSON file holding an array of movie records
    #[arg(short, long)]
    input: PathBuf,

    /// Wire shape to write
    #[arg(short, long, value_enum, default_value_t = Mode::Document)]
    mode: Mode,

    /// Concurrent write workers
    #[arg(short, long, default_value_t = 4)]
    concurrency: usize,

    /// Seconds between progress reports
    #[arg(long, default_value_t = 10)]
    report_every: u64,

    /// Key the partition key is written under
    #[arg(long, default_value = "PartitionKey")]
    partition_key: String,

    /// Documents per query page
    #[arg(long, default_value_t = 100)]
    page_size: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_movies(path: &Path) -> anyhow::Result<Vec<Movie>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut movies: Vec<Movie> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    for (row, movie) in movies.iter_mut().enumerate() {
        movie.source_row = row;
    }
    Ok(movies)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting cosmap v{}", env!("CARGO_PKG_VERSION"));
    info!("Input: {:?}", args.input);
    info!("Mode: {:?}", args.mode);

    let movies = load_movies(&args.input)?;
    let total = movies.len();
    info!("Loaded {} movies", total);

    let options = BulkOptions::new(args.concurrency, Duration::from_secs(args.report_every));
    options.validate()?;

    let keys = SerializerConfig::with_partition_key(args.partition_key.clone());
    let store = InMemoryStore::new(InMemoryStoreConfig {
        page_size: args.page_size,
        keys: keys.clone(),
        ..Default::default()
    })?;
    let client = CosmosClient::with_serializer(store, EntitySerializer::new(keys));

    let on_progress: ProgressCallback<Value> = Box::new(move |snapshot: &[cosmap::CosmosResponse<Value>]| {
        info!("{}/{} written", snapshot.len(), total);
    });

    let started = Instant::now();
    let results = match args.mode {
        Mode::Document => client.upsert_documents(movies, &options, Some(on_progress)).await?,
        Mode::Vertex => client.upsert_vertices(movies, &options, Some(on_progress)).await?,
    };
    let elapsed = started.elapsed();

    let failed: Vec<_> = results.iter().filter(|r| !r.is_successful).collect();
    info!(
        "Wrote {} of {} in {:?} ({:.2} RU, {:?} store time)",
        results.len() - failed.len(),
        total,
        elapsed,
        total_request_charge(&results),
        total_execution_time(&results),
    );

    if !all_successful(&results) {
        warn!("{} writes failed", failed.len());
        if let Some(error) = failed.first().and_then(|r| r.error.as_ref()) {
            warn!("First failure: {}", error);
        }
    }

    let page = client.execute_sql::<Value>("SELECT * FROM c", None).await;
    if let Some(first) = page.result.as_ref().and_then(|docs| docs.first()) {
        println!("{}", serde_json::to_string_pretty(first)?);
    }

    Ok(())
}
