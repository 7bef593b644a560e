use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::debug;

use moonlight::consts::{AUTHOR, HOMEPAGE, REPO};
use moonlight::grammar::GrammarSource;
use moonlight::logging;
use moonlight::theme::{ThemeSource, builtin_theme_names};
use moonlight::{Bootstrapper, Globals, HighlightConfig};

#[derive(Parser)]
#[command(
    name = "moonlight",
    version,
    author = AUTHOR,
    about = "MoonBit source in, highlighted HTML out.",
    after_help = after_help()
)]
struct Cli {
    /// Source file to highlight (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Language tag (defaults to the configured default language)
    #[arg(short, long)]
    lang: Option<String>,

    /// Theme used for rendering
    #[arg(short, long)]
    theme: Option<String>,

    /// Extra .tmTheme file to load, registered under its file stem (repeatable)
    #[arg(long = "theme-file")]
    theme_files: Vec<PathBuf>,

    /// Extra TextMate grammar JSON to load (repeatable)
    #[arg(short, long = "grammar")]
    grammars: Vec<PathBuf>,

    /// JSON config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also load syntect's bundled syntaxes
    #[arg(long, default_value_t = false)]
    with_defaults: bool,

    /// Print the languages the engine knows and exit
    #[arg(long, default_value_t = false)]
    list_languages: bool,

    /// Print the bundled theme ids and exit
    #[arg(long, default_value_t = false)]
    list_themes: bool,

    /// Only log warnings and errors
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.quiet);

    if cli.list_themes {
        for name in builtin_theme_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => HighlightConfig::load(path)?,
        None => HighlightConfig::default(),
    };
    config
        .themes
        .extend(cli.theme_files.iter().cloned().map(ThemeSource::File));
    config
        .grammars
        .extend(cli.grammars.iter().cloned().map(GrammarSource::File));
    if cli.with_defaults {
        config.include_default_syntaxes = true;
    }
    if let Some(theme) = &cli.theme {
        config = config.with_theme(theme);
    }

    let globals = Arc::new(Globals::new());
    let bootstrapper = Bootstrapper::from_config(config, Arc::clone(&globals));

    // We are our own host: register before starting so the handshake never waits.
    bootstrapper.on_ready(Arc::new(|| debug!("highlighter ready")));
    bootstrapper.start().await?;

    if cli.list_languages {
        let engine = bootstrapper.initialize().await?;
        for language in engine.languages() {
            println!("{language}");
        }
        return Ok(());
    }

    let source = read_source(cli.file.as_deref()).await?;
    let convert = globals
        .converter(bootstrapper.converter_symbol())
        .context("converter was not registered")?;
    let html = convert(&source, cli.lang.as_deref())?;
    println!("{html}");
    Ok(())
}

fn after_help() -> String {
    format!("{AUTHOR}\n{HOMEPAGE}\nSource: {REPO}")
}

async fn read_source(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut source = String::new();
            tokio::io::stdin()
                .read_to_string(&mut source)
                .await
                .context("failed to read stdin")?;
            Ok(source)
        }
    }
}
