use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use didact::{
    read_transcript, AnthropicClient, AnthropicConfig, FilterConfig, HumanDocument, Lexicon,
    MachineDocument, Parser, ParserConfig, Pipeline, PipelineConfig, QaFilter, Ranker,
    RankingConfig, SegmentationConfig, Segmenter,
};

#[derive(ClapParser)]
#[command(name = "didact")]
#[command(author, version, about = "Transcript to instructional-steps pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a transcript into a validated step document
    Process {
        /// Input transcript file (plain text)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the machine-readable document (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for the human-readable document (Markdown)
        #[arg(long)]
        human_readable: Option<PathBuf>,

        /// Writing tone for generated steps
        #[arg(long, default_value = "Professional")]
        tone: String,

        /// Target audience for generated steps
        #[arg(long, default_value = "Technical Users")]
        audience: String,

        /// Knowledge-base URL to fetch as reference material (repeatable)
        #[arg(long = "knowledge-url")]
        knowledge_urls: Vec<String>,

        /// Custom lexicon file (JSON); defaults to the built-in tables
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Keep only the N most important segments
        #[arg(long)]
        keep_top_n: Option<usize>,

        /// Minimum importance score for a segment to survive ranking
        #[arg(long, default_value = "0.3")]
        min_importance: f64,

        /// Skip Q&A filtering
        #[arg(long)]
        no_qa_filter: bool,

        /// Skip importance ranking
        #[arg(long)]
        no_ranking: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze a transcript's segmentation without calling the API
    Analyze {
        /// Input transcript file (plain text)
        #[arg(short, long)]
        input: PathBuf,

        /// Custom lexicon file (JSON)
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            human_readable,
            tone,
            audience,
            knowledge_urls,
            lexicon,
            keep_top_n,
            min_importance,
            no_qa_filter,
            no_ranking,
            verbose,
        } => {
            setup_logging(verbose);
            process_transcript(
                input,
                output,
                human_readable,
                tone,
                audience,
                knowledge_urls,
                lexicon,
                keep_top_n,
                min_importance,
                no_qa_filter,
                no_ranking,
            )
            .await
        }
        Commands::Analyze {
            input,
            lexicon,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_transcript(input, lexicon)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_lexicon(path: Option<PathBuf>) -> Result<Lexicon> {
    match path {
        Some(path) => Lexicon::from_file(&path),
        None => Ok(Lexicon::default()),
    }
}

async fn process_transcript(
    input: PathBuf,
    output: PathBuf,
    human_readable: Option<PathBuf>,
    tone: String,
    audience: String,
    knowledge_urls: Vec<String>,
    lexicon: Option<PathBuf>,
    keep_top_n: Option<usize>,
    min_importance: f64,
    no_qa_filter: bool,
    no_ranking: bool,
) -> Result<()> {
    info!("Loading transcript from {:?}", input);
    let raw = read_transcript(&input)?;
    let lexicon = load_lexicon(lexicon)?;

    let config = PipelineConfig {
        qa_filter: (!no_qa_filter).then(FilterConfig::default),
        ranking: (!no_ranking).then(|| RankingConfig {
            min_importance_threshold: min_importance,
            keep_top_n,
            ..RankingConfig::default()
        }),
        tone,
        audience,
        knowledge_urls,
        ..PipelineConfig::default()
    };

    let api_config = AnthropicConfig::from_env()?;
    let client = AnthropicClient::new(api_config);
    let pipeline =
        Pipeline::new(config, lexicon, client).context("Invalid pipeline configuration")?;

    let outcome = pipeline.run(&raw).await;

    MachineDocument::from_outcome(&outcome).write_json(&output)?;
    info!("Output written to {:?}", output);
    if let Some(human_path) = human_readable {
        HumanDocument::new(&outcome).write_file(&human_path)?;
        info!("Human-readable output written to {:?}", human_path);
    }

    info!(
        "Complete: {} steps from {} segments ({} rejected, {} failed), {} tokens used",
        outcome.steps.len(),
        outcome.metrics.total_segments,
        outcome.metrics.steps_rejected,
        outcome.failures.len(),
        outcome.metrics.token_usage.total_tokens
    );

    Ok(())
}

fn analyze_transcript(input: PathBuf, lexicon: Option<PathBuf>) -> Result<()> {
    info!("Analyzing transcript from {:?}", input);
    let raw = read_transcript(&input)?;
    let lexicon = load_lexicon(lexicon)?;

    let parser = Parser::new(ParserConfig::default(), &lexicon)?;
    let (sentences, metadata) = parser.parse(&raw);

    println!("Transcript Analysis");
    println!("==================");
    println!("Total sentences: {}", metadata.total_sentences);
    println!("Speakers: {:?}", metadata.speaker_names);
    if let Some(duration) = metadata.duration_seconds {
        println!("Duration: {:.1}s", duration);
    }
    if let Some(primary) = &metadata.primary_speaker {
        println!(
            "Primary speaker: {} ({:.0}% of sentences)",
            primary,
            metadata.primary_speaker_ratio * 100.0
        );
    }
    println!("Questions: {}", metadata.question_count);
    println!("Transition phrases: {}", metadata.transition_count);
    println!();

    let segmenter = Segmenter::new(SegmentationConfig::default(), lexicon.clone())?;
    let segments = segmenter.segment(&sentences);

    println!("Segments");
    println!("--------");
    for segment in &segments {
        println!(
            "Segment {}: sentences {}-{}, actions {:.2}, coherence {:.2}, questions {}{}",
            segment.segment_index,
            segment.start_sentence_index(),
            segment.end_sentence_index(),
            segment.action_density,
            segment.coherence_score,
            segment.question_count,
            if segment.fallback_split { " (fallback split)" } else { "" }
        );
    }
    println!();

    let qa_filter = QaFilter::new(FilterConfig::default())?;
    let qa_sections = qa_filter.identify_qa_sections(&segments);
    println!("Q&A Sections");
    println!("------------");
    if qa_sections.is_empty() {
        println!("None detected");
    }
    for section in &qa_sections {
        println!(
            "Segment {}: {}/{} questions ({:.0}%)",
            section.segment_index,
            section.question_count,
            section.total_sentences,
            section.qa_density * 100.0
        );
    }
    println!();

    let ranker = Ranker::new(RankingConfig::default(), lexicon)?;
    let scores = ranker.score_segments(&segments);
    println!("Importance Scores");
    println!("-----------------");
    for score in &scores {
        println!(
            "Segment {}: importance {:.2} (procedural {:.2}, actions {:.2}, coherence {:.2})",
            score.segment_index,
            score.importance_score,
            score.procedural_score,
            score.action_density,
            score.coherence_score
        );
    }

    Ok(())
}
