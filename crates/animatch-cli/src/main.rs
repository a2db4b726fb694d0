//! animatch - analyze anime screenshots from the command line.
//!
//! Results are printed to stdout as JSON; logs and progress go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use animatch_core::{
    AnalysisPipeline, AnalysisResult, AnimatchConfig, CancellationToken, CharacterComparator,
    CharacterPairSimilarity, Embedder, ImageInput, ProgressEvent, ProgressObserver,
    MAX_COMPARE_IMAGES,
};
use animatch_embeddings::EmbedderFactory;
use animatch_vision::RecognizerFactory;

#[derive(Parser, Debug)]
#[command(name = "animatch")]
#[command(about = "Recognize anime characters and find similar ones")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (.toml, .json or .yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Character dataset replacing the built-in one
    #[arg(short, long, global = true, env = "ANIMATCH_KNOWLEDGE_PATH")]
    knowledge: Option<PathBuf>,

    /// Related characters kept per character
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Timeout for each provider call, in seconds (0 disables)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Skip portrait generation
    #[arg(long, global = true)]
    no_images: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one image
    Analyze {
        /// Image path, http(s) URL or data URI
        image: String,
    },
    /// Analyze several images and compare their characters
    Compare {
        /// Image paths, http(s) URLs or data URIs
        #[arg(num_args = 2..=MAX_COMPARE_IMAGES, required = true)]
        images: Vec<String>,
    },
}

#[derive(Serialize)]
struct CompareOutput {
    results: Vec<AnalysisResult>,
    pairs: Vec<CharacterPairSimilarity>,
}

/// Everything a run needs, built once from configuration.
struct App {
    pipeline: AnalysisPipeline,
    embedder: Arc<dyn Embedder>,
    config: AnimatchConfig,
}

impl App {
    fn build(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => AnimatchConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => AnimatchConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        apply_overrides(&mut config, cli);

        let timeout = config.request_timeout();
        let knowledge = Arc::new(config.load_knowledge()?);
        let embedder = EmbedderFactory::from_config(&config.embedder, timeout)?;
        let recognizer = RecognizerFactory::create_with_timeout(config.recognizer.clone(), timeout)?;

        let mut builder = AnalysisPipeline::builder(recognizer, embedder.clone(), knowledge)
            .ranking(config.ranking.clone())
            .config(config.pipeline.clone());
        if config.pipeline.generate_images {
            if let Some(generator) =
                RecognizerFactory::image_generator(config.image_generator.as_ref(), timeout)?
            {
                builder = builder.image_generator(generator);
            }
        }

        Ok(Self {
            pipeline: builder.build(),
            embedder,
            config,
        })
    }

    async fn analyze(&self, image: &str, cancel: &CancellationToken) -> Result<AnalysisResult> {
        let input = parse_image(image)?;
        let observer = |event: &ProgressEvent| {
            eprintln!("[{}] {}", event.phase.label(), event.detail);
        };

        let result = self
            .pipeline
            .analyze_with_cancellation(&input, Some(&observer as &dyn ProgressObserver), cancel)
            .await
            .map_err(|e| match e.suggestion() {
                Some(hint) => anyhow::anyhow!("{} ({})", e, hint),
                None => anyhow::anyhow!(e),
            })?;
        Ok(result)
    }
}

fn apply_overrides(config: &mut AnimatchConfig, cli: &Cli) {
    if let Some(path) = &cli.knowledge {
        config.knowledge.path = Some(path.clone());
    }
    if let Some(top_k) = cli.top_k {
        config.ranking.top_k = top_k;
    }
    if let Some(secs) = cli.timeout {
        config.pipeline.request_timeout_secs = secs;
    }
    if cli.no_images {
        config.pipeline.generate_images = false;
    }
}

/// Interpret an image argument as a URL, a data URI or a file path.
fn parse_image(arg: &str) -> Result<ImageInput> {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        return Ok(ImageInput::from_url(arg));
    }
    if arg.starts_with("data:") {
        return Ok(ImageInput::from_data_uri(arg));
    }
    ImageInput::from_path(arg).with_context(|| format!("failed to read image {}", arg))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info").add_directive("animatch=debug".parse()?),
    };

    // Log to stderr to keep stdout clean for JSON output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let app = App::build(&cli)?;
    tracing::debug!(
        embedder = %app.embedder.model_name(),
        top_k = app.config.ranking.top_k,
        "animatch ready"
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling analysis");
            on_interrupt.cancel();
        }
    });

    match &cli.command {
        Commands::Analyze { image } => {
            let result = app.analyze(image, &cancel).await?;
            print_json(&result, cli.pretty)?;
        }
        Commands::Compare { images } => {
            if images.len() > MAX_COMPARE_IMAGES {
                bail!("at most {} images can be compared", MAX_COMPARE_IMAGES);
            }

            let mut results = Vec::with_capacity(images.len());
            for image in images {
                results.push(app.analyze(image, &cancel).await?);
            }

            let mut comparator = CharacterComparator::new(app.embedder.clone());
            if let Some(timeout) = app.config.request_timeout() {
                comparator = comparator.with_timeout(timeout);
            }
            let pairs = comparator.compare_results(&results).await?;
            print_json(&CompareOutput { results, pairs }, cli.pretty)?;
        }
    }

    Ok(())
}
