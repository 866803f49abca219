//! mdblocks - A block-structured Markdown editor for the terminal

use anyhow::{Context, Result};
use clap::Parser;
use mdblocks_core::{Config, Document, EditorSession};
use mdblocks_tui::App;
use std::path::PathBuf;

/// A block-structured Markdown editor
#[derive(Parser, Debug)]
#[command(name = "mdblocks")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to markdown file (created on first save if missing)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print the rendered blocks as an HTML fragment and exit
    #[arg(long)]
    html: bool,

    /// With --html, fetch link previews for link-only blocks first
    #[arg(long, requires = "html")]
    previews: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Load document
    let doc = Document::open(&args.file)
        .with_context(|| format!("Failed to load document: {}", args.file.display()))?;

    if args.html {
        let html = export_html(&doc, &config, args.previews);
        println!("{}", html);
        return Ok(());
    }

    // Create app
    let app = App::new(config, doc);

    // Run TUI
    mdblocks_tui::run(app).context("TUI application error")?;

    Ok(())
}

fn export_html(doc: &Document, config: &Config, previews: bool) -> String {
    let mut session = EditorSession::new(&doc.text, config);
    if previews {
        fetch_previews(&mut session, config);
    }
    session.export_html()
}

#[cfg(feature = "fetch")]
fn fetch_previews(session: &mut EditorSession, config: &Config) {
    use mdblocks_core::fetch::fetch_preview;
    use mdblocks_core::render::link_only_url;

    let urls: Vec<String> = session
        .blocks()
        .iter()
        .filter_map(|b| link_only_url(&b.content).map(str::to_string))
        .collect();

    for url in urls {
        match fetch_preview(&url, &config.link_preview) {
            Ok(preview) => session.insert_preview(preview),
            Err(e) => log::warn!("{:#}", e),
        }
    }
}

#[cfg(not(feature = "fetch"))]
fn fetch_previews(_session: &mut EditorSession, _config: &Config) {
    log::warn!("built without the fetch feature, skipping link previews");
}
