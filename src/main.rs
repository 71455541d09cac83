use clap::{Parser, Subcommand};
use lectio::core::citation::{SelectedVerse, resolve};
use lectio::core::config::{self, ResolvedConfig};
use lectio::core::corpus::{CorpusIndex, FlatChapterRef, load_corpus};
use lectio::core::{LoadedChapter, WindowBuffer, WindowState};
use lectio::explain::{Explainer, MockExplainer, explain_selection};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lectio", about = "Continuous reader for chaptered texts")]
struct Args {
    /// Corpus JSON file (overrides config and LECTIO_CORPUS)
    #[arg(short, long, global = true)]
    corpus: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a window of chapters
    Read {
        /// Book to jump to (defaults to the start of the corpus)
        #[arg(short, long)]
        book: Option<String>,
        /// Chapter number within --book
        #[arg(long, default_value_t = 1)]
        chapter: u32,
        /// Forward extensions after the initial load
        #[arg(long, default_value_t = 0)]
        more: usize,
        /// Backward extensions after the initial load
        #[arg(long, default_value_t = 0)]
        previous: usize,
    },
    /// Print the citation for a set of verses, e.g. "Genesis 1:1"
    Cite {
        #[arg(required = true)]
        verses: Vec<SelectedVerse>,
    },
    /// Ask the explainer about a passage
    Explain {
        text: String,
        /// Verses the passage was taken from
        #[arg(long = "cite")]
        verses: Vec<SelectedVerse>,
    },
}

fn format_chapter(chapter: &LoadedChapter) -> String {
    let mut out = chapter.title();
    for verse in &chapter.verses {
        out.push_str(&format!("\n{} {}", verse.number, verse.text));
    }
    out
}

fn print_window(window: &WindowState) {
    for chapter in &window.loaded_chapters {
        println!("{}\n", format_chapter(chapter));
    }
    if !window.has_more && !window.loaded_chapters.is_empty() {
        println!("-- end of corpus --");
    }
}

fn read(
    config: &ResolvedConfig,
    book: Option<String>,
    chapter: u32,
    more: usize,
    previous: usize,
) -> Result<(), Box<dyn Error>> {
    let index = Arc::new(CorpusIndex::new(load_corpus(&config.corpus_path)?));
    let buffer = WindowBuffer::from_config(index.clone(), config);

    match book {
        Some(name) => {
            let book_index = index
                .find_book(&name)
                .ok_or_else(|| format!("unknown book '{name}'"))?;
            let chapter_index = index
                .book_at(book_index)?
                .chapters
                .iter()
                .position(|c| c.number == chapter)
                .ok_or_else(|| format!("{name} has no chapter {chapter}"))?;
            let outcome = buffer.jump_to(
                FlatChapterRef::new(book_index, chapter_index),
                config.jump_lookback,
                config.jump_window,
            )?;
            log::info!("Target at window position {:?}", outcome.target_position);
        }
        None => {
            buffer.initialize(config.initial_chapters)?;
        }
    }

    for _ in 0..previous {
        buffer.load_previous()?;
    }
    for _ in 0..more {
        buffer.load_more()?;
    }
    print_window(&buffer.snapshot());
    Ok(())
}

/// Installs the file logger at full verbosity so config loading can log
/// before the configured level is known. Narrowed by `narrow_log_level`.
fn install_logger(path: &Path) {
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create(path) {
        let _ = WriteLogger::init(LevelFilter::Trace, log_config, log_file);
    }
}

fn narrow_log_level(level: LevelFilter) {
    log::set_max_level(level);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Writes to lectio.log in current directory
    install_logger(Path::new("lectio.log"));

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("{e}, using defaults");
        log::warn!("{e}, using defaults");
        Default::default()
    });
    let config = config::resolve(&file_config, args.corpus.as_deref());
    narrow_log_level(config.log_level);

    log::info!("Lectio starting up with corpus {}", config.corpus_path.display());

    match args.command {
        Command::Read {
            book,
            chapter,
            more,
            previous,
        } => read(&config, book, chapter, more, previous)?,
        Command::Cite { verses } => println!("{}", resolve(&verses)),
        Command::Explain { text, verses } => {
            let explainer = MockExplainer;
            log::info!("Explaining with {}", explainer.name());
            let explanation = explain_selection(&explainer, &verses, &text).await?;
            println!("{}\n\n({})", explanation.text, explanation.timestamp.to_rfc3339());
        }
    }
    Ok(())
}
