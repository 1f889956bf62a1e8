use super::{load_store, load_texts, location_at, pick_document, read_json, resolve_path};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use formbind_evaluator::{DataSources, Evaluator, EvaluatorOptions, TextResources};
use formbind_options::{resolve_options, OptionsSource};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct OptionsArgs {
    /// Option source file, e.g. { "group": "people", "value": "people[{0}].id" }
    pub source: PathBuf,

    /// Data file mapping document ids to documents
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    #[arg(long)]
    pub document: Option<String>,

    /// Row the options are shown in, e.g. teams[0]
    #[arg(long)]
    pub at: Option<String>,

    /// Text resource file for plain string labels
    #[arg(long)]
    pub texts: Option<PathBuf>,

    /// Print the options as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn options(args: OptionsArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let source_path = resolve_path(cwd, &args.source);
    let source: OptionsSource = serde_json::from_value(read_json(&source_path)?)
        .with_context(|| format!("{} is not an option source", source_path.display()))?;

    let store = load_store(cwd, args.data.as_deref())?;
    let document = pick_document(args.document, config.default_document.as_deref(), &store);
    let location = location_at(document.as_deref(), args.at.as_deref())?;

    let texts_path = args
        .texts
        .map(|path| resolve_path(cwd, &path))
        .or_else(|| config.get_text_resources(cwd));
    let mut texts = TextResources::new(load_texts(texts_path.as_deref())?, &store);
    let mut sources = DataSources::new(&store)
        .with_language(&config.language)
        .with_location(location.as_ref());
    if let Some(document) = document.as_deref() {
        texts = texts.with_default_document(document);
        sources = sources.with_default_document(document);
    }
    let sources = sources.with_translator(&texts);

    let evaluator = Evaluator::with_options(EvaluatorOptions {
        max_depth: config.max_depth,
    });
    let options = resolve_options(&source, location.as_ref(), &sources, &evaluator)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    if options.is_empty() {
        println!("{} No options", "✗".yellow());
        return Ok(());
    }
    for option in &options {
        println!("{} {}  {}", "✓".green(), option.value.bold(), option.label);
        if let Some(description) = &option.description {
            println!("    {}", description.dimmed());
        }
    }
    Ok(())
}
