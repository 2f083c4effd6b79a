use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use courier_core::impls::{ChannelSink, InMemoryQueueTransport};
use courier_core::ports::QueueTransport;
use courier_core::{PollConfig, PollerBuilder, ReceivedMessage, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "courier", about = "Poll a queue and hand messages downstream")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll until Ctrl-C
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Send a demo message to the queue every N seconds
        #[arg(long)]
        produce_every: Option<u64>,
    },

    /// Run a single cycle and print its outcome
    Once {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List queues known to the transport
    Queues {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long)]
        prefix: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    /// JSON poll configuration
    #[arg(long, short)]
    config: PathBuf,

    /// Messages to put on the in-memory queue before polling
    #[arg(long, default_value_t = 0)]
    seed: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            source,
            produce_every,
        } => run(source, produce_every).await,
        Command::Once { source } => once(source).await,
        Command::Queues { source, prefix } => queues(source, prefix).await,
    }
}

fn load_config(path: &Path) -> Result<PollConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

/// Load the config and prepare an in-memory queue for it.
async fn prepare(source: &SourceArgs) -> Result<(PollConfig, Arc<InMemoryQueueTransport>)> {
    let config = load_config(&source.config)?;
    let transport = Arc::new(InMemoryQueueTransport::new());
    transport.create_queue(&config.queue).await;

    for i in 1..=source.seed {
        transport
            .send_message(&config.queue, format!("seed message {i}"))
            .await?;
    }

    Ok((config, transport))
}

fn log_batch(batch: &[ReceivedMessage]) {
    for message in batch {
        tracing::info!(
            message_id = message.message_id.as_deref().unwrap_or("unknown"),
            body = %message.body,
            "received"
        );
    }
}

async fn run(source: SourceArgs, produce_every: Option<u64>) -> Result<()> {
    let (config, transport) = prepare(&source).await?;
    let queue = config.queue.clone();

    let (sink, mut rx) = ChannelSink::channel(16);
    let consumer = tokio::spawn(async move {
        while let Some(batch) = rx.recv().await {
            log_batch(&batch);
        }
    });

    let producer = produce_every.map(|secs| {
        let transport = Arc::clone(&transport);
        let queue = queue.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
            let mut n = 0u64;
            loop {
                ticker.tick().await;
                n += 1;
                if let Err(e) = transport.send_message(&queue, format!("tick {n}")).await {
                    tracing::warn!(error = %e, "producer send failed");
                }
            }
        })
    });

    let poller = PollerBuilder::new(config)
        .transport(transport.clone())
        .sink(Arc::new(sink))
        .build()?;
    tracing::info!(
        queue = %queue,
        delay_ms = poller.delay().as_millis() as u64,
        "polling (Ctrl+C to stop)"
    );
    let handle = poller.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    if let Some(producer) = producer {
        producer.abort();
    }
    let stats = handle.stats();
    handle.stop_and_wait().await?;
    // The poller owned the only sender; the consumer drains and exits.
    let _ = consumer.await;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("remaining in queue: {}", transport.depth(&queue).await?);
    Ok(())
}

async fn once(source: SourceArgs) -> Result<()> {
    let (config, transport) = prepare(&source).await?;
    // one cycle emits at most one batch
    let (sink, mut rx) = ChannelSink::channel(1);

    let poller = PollerBuilder::new(config)
        .transport(transport)
        .sink(Arc::new(sink))
        .build()?;
    let outcome = poller.run_once().await?;

    while let Ok(batch) = rx.try_recv() {
        log_batch(&batch);
    }
    println!("outcome: {:?}", outcome.kind());
    Ok(())
}

async fn queues(source: SourceArgs, prefix: Option<String>) -> Result<()> {
    let (_, transport) = prepare(&source).await?;
    for queue in transport.list_queues(prefix.as_deref()).await? {
        println!("{}\t{}", queue.name, queue.url);
    }
    Ok(())
}
