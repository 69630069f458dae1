use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};
use spdlog::{debug, info, warn};

use cloud_journey::config::Config;
use cloud_journey::content::block_parser::parse_body;
use cloud_journey::content::content_file::ContentFile;
use cloud_journey::content::cover_media::cover_media;
use cloud_journey::logger::configure_logger;
use cloud_journey::media_cache::{MediaUrlCache, PrefixResolver};
use cloud_journey::post_render::{media_paths, render_post};
use cloud_journey::text_utils::{plain_title, read_time_with, speech_text};
use cloud_journey::view::block_renderer::BlockRenderer;
use cloud_journey::view::post_renderer::{PostRenderer, DEFAULT_VIEW_TEMPLATE};

use crate::config::open_config;

mod config;

const CFG_FILE_NAME: &str = "journey.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the content blocks of a post as JSON
    Blocks { file: PathBuf },
    /// Renders a post page through the view template
    Render {
        file: PathBuf,
        /// Writes the page here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Prints the cover media of a post as JSON
    Cover { file: PathBuf },
    /// Prints the estimated reading time in minutes
    ReadTime { file: PathBuf },
    /// Prints the plain title and the text for speech synthesis
    Speech { file: PathBuf },
}

fn load_post(file: PathBuf) -> Result<ContentFile> {
    let display = file.display().to_string();
    ContentFile::from_file(file).with_context(|| format!("Could not load post {}", display))
}

fn render_cmd(config: &Config, file: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let post = load_post(file)?.post;

    let cache = MediaUrlCache::new();
    if let Some(ref base_url) = config.render.media_base_url {
        let resolver = PrefixResolver { base_url: base_url.clone() };
        let ttl = config.render.signed_url_ttl_secs.map(Duration::seconds);
        let parsed = parse_body(&post.content);
        let resolved = cache.resolve_missing(media_paths(&parsed.blocks), &resolver, ttl);
        debug!("Resolved {} media paths", resolved);
    }

    let tpl_src = match config.render.template_path {
        Some(ref path) => fs::read_to_string(path)
            .with_context(|| format!("Could not read template {}", path.display()))?,
        None => DEFAULT_VIEW_TEMPLATE.to_string(),
    };
    let post_renderer = PostRenderer::new(&tpl_src)?;

    let renderer = BlockRenderer::new(&cache);
    let rendered = render_post(&post, &renderer, config.render.words_per_minute);
    let page = post_renderer.render(&post, &rendered);

    match output {
        Some(path) => {
            fs::write(&path, page).with_context(|| format!("Could not write {}", path.display()))?;
            info!("Page written to {}", path.display());
        }
        None => println!("{}", page),
    }
    Ok(())
}

fn run(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Blocks { file } => {
            let parsed = parse_body(&load_post(file)?.post.content);
            println!("{}", serde_json::to_string_pretty(&parsed.blocks)?);
        }
        Command::Render { file, output } => render_cmd(config, file, output)?,
        Command::Cover { file } => {
            let cover = cover_media(&load_post(file)?.post.content);
            println!("{}", serde_json::to_string_pretty(&cover)?);
        }
        Command::ReadTime { file } => {
            let post = load_post(file)?.post;
            println!("{}", read_time_with(&post.content, config.render.words_per_minute));
        }
        Command::Speech { file } => {
            let post = load_post(file)?.post;
            println!("{}", plain_title(&post.title));
            println!();
            println!("{}", speech_text(&post.content));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config_path.map(PathBuf::from);

    let config = match open_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Please run journey --help");
            return Ok(());
        }
    };

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    debug!("Running {:?}", args.command);
    run(&config, args.command)
}
