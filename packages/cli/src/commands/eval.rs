use super::{load_store, load_texts, location_at, pick_document, resolve_path};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use formbind_evaluator::{
    DataSources, DiagnosticLevel, EvalConfig, Evaluator, EvaluatorOptions, ExprVal, ExprValue,
    TextResources,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Expression as JSON, e.g. '["add", 1, 2]'
    pub expression: String,

    /// Data file mapping document ids to documents
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Default document for dataModel lookups
    #[arg(long)]
    pub document: Option<String>,

    /// Row to evaluate in, e.g. people[1]
    #[arg(long)]
    pub at: Option<String>,

    /// Expected result type (string, number, boolean, any)
    #[arg(short, long, default_value = "any")]
    pub returns: ExprVal,

    /// Fail on the first evaluation error instead of using the default
    #[arg(long)]
    pub strict: bool,

    /// Text resource file for the text function
    #[arg(long)]
    pub texts: Option<PathBuf>,

    /// Language returned by the language function
    #[arg(long)]
    pub language: Option<String>,
}

pub fn eval(args: EvalArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let expression: serde_json::Value =
        serde_json::from_str(&args.expression).context("Expression is not valid JSON")?;

    let store = load_store(cwd, args.data.as_deref())?;
    let document = pick_document(args.document, config.default_document.as_deref(), &store);
    let location = location_at(document.as_deref(), args.at.as_deref())?;

    let texts_path = args
        .texts
        .map(|path| resolve_path(cwd, &path))
        .or_else(|| config.get_text_resources(cwd));
    let mut texts = TextResources::new(load_texts(texts_path.as_deref())?, &store);
    if let Some(document) = document.as_deref() {
        texts = texts.with_default_document(document);
    }

    let language = args.language.unwrap_or(config.language);
    let mut sources = DataSources::new(&store)
        .with_translator(&texts)
        .with_location(location.as_ref())
        .with_language(&language);
    if let Some(document) = document.as_deref() {
        sources = sources.with_default_document(document);
    }

    let mut eval_config = EvalConfig::new(args.returns, ExprValue::Null);
    if args.strict || config.error_as_exception {
        eval_config = eval_config.with_error_as_exception();
    }

    let evaluator = Evaluator::with_options(EvaluatorOptions {
        max_depth: config.max_depth,
    });
    let result = evaluator.evaluate_json(&expression, &sources, &eval_config)?;

    for diagnostic in &result.diagnostics {
        let marker = match diagnostic.level {
            DiagnosticLevel::Error => "✗".red(),
            DiagnosticLevel::Warning => "!".yellow(),
            DiagnosticLevel::Info => "i".blue(),
        };
        eprintln!("{} {}", marker, diagnostic);
    }

    if result.has_errors() {
        return Err(anyhow!(
            "Evaluation failed; the default value {} was used",
            result.value.to_json()
        ));
    }

    println!("{} {}", "✓".green(), result.value.to_json());
    Ok(())
}
