use super::{load_store, pick_document, read_json, resolve_path};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use formbind_hierarchy::{ComponentRegistry, HierarchyGenerator, Layout, LayoutTree, Node};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Layout file: a component array or a page with data.layout
    pub layout: PathBuf,

    /// Data file mapping document ids to documents
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Document that plain string bindings refer to
    #[arg(long)]
    pub document: Option<String>,

    /// Print the tree as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn tree(args: TreeArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let store = load_store(cwd, args.data.as_deref())?;
    let document = pick_document(args.document, config.default_document.as_deref(), &store)
        .ok_or_else(|| anyhow!("No default document; pass --document"))?;

    let registry = ComponentRegistry::standard();
    let layout = Layout::from_json(read_json(&resolve_path(cwd, &args.layout))?, &document, &registry)?;
    let tree = HierarchyGenerator::new().generate(&layout, &store)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(tree.top_level())?);
        return Ok(());
    }

    for node in tree.top_level() {
        print_node(&tree, node, 0);
    }
    println!();
    println!("{} {} components", "✓".green(), tree.len());
    Ok(())
}

fn print_node(tree: &LayoutTree, node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    let hidden = if tree.is_hidden(&node.id) {
        " hidden".dimmed().to_string()
    } else {
        String::new()
    };
    let binding = node
        .simple_binding()
        .or_else(|| node.bindings.values().next())
        .map(|reference| format!(" -> {}", reference).cyan().to_string())
        .unwrap_or_default();

    println!(
        "{}{} ({}){}{}",
        indent,
        node.id.bold(),
        node.component_type,
        binding,
        hidden
    );

    for child in node.rows_before.iter().chain(&node.children) {
        print_node(tree, child, depth + 1);
    }
    for row in node.rows() {
        println!(
            "{}  {} {} {}",
            indent,
            format!("row {}", row.index).yellow(),
            row.uuid.dimmed(),
            row.location
        );
        for item in &row.items {
            print_node(tree, item, depth + 2);
        }
    }
    for child in &node.rows_after {
        print_node(tree, child, depth + 1);
    }
}
