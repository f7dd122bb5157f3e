//! mdcatalog CLI - Markdown Product Catalog

use clap::{Parser, Subcommand};
use mdcatalog::catalog::{CATEGORIES, PRODUCTS};
use mdcatalog::{Catalog, CatalogConfig, CategoryNode, Database, DocumentStore, Filter, NewProduct, SearchParams};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(name = "mdcatalog")]
#[command(about = "A markdown-based git-backed product catalog", long_about = None)]
struct Cli {
    /// Catalog directory (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    database: PathBuf,

    /// Write without recording git commits
    #[arg(long)]
    no_commit: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new catalog
    Init,

    /// Create a product from a JSON request
    Add {
        /// JSON file, or - for stdin
        input: String,
    },

    /// Create every product of a JSON array, in order
    Import {
        /// JSON file, or - for stdin
        input: String,
    },

    /// Show a product with its category
    Get { id: String },

    /// Overwrite fields of a product
    Update {
        id: String,
        /// JSON object of fields, e.g. '{"quantity": 0}'
        patch: String,
    },

    /// Delete a product
    Delete { id: String },

    /// Search products, e.g. "category=shirts&colors=red,blue&pageNumber=2"
    Search {
        #[arg(default_value = "")]
        query: String,
    },

    /// Print the category tree
    Categories,

    /// Show catalog status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = run(&cli).await;
    if let Err(err) = &result {
        if let Some(hint) = err.downcast_ref::<mdcatalog::Error>().and_then(|e| e.suggestion()) {
            eprintln!("hint: {}", hint);
        }
    }
    result
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let path = cli.database.as_path();

    match &cli.command {
        Commands::Init => init_catalog(path, cli.no_commit).await,
        Commands::Add { input } => {
            let catalog = open(path, cli.no_commit).await?;
            let request: NewProduct = serde_json::from_str(&read_input(input).await?)?;
            let product = catalog.create_product(request).await?;
            println!("Created product {}", product.id);
            Ok(())
        }
        Commands::Import { input } => {
            let catalog = open(path, cli.no_commit).await?;
            let requests: Vec<NewProduct> = serde_json::from_str(&read_input(input).await?)?;
            let products = catalog.create_multiple_products(requests).await?;
            println!("Created {} product(s)", products.len());
            Ok(())
        }
        Commands::Get { id } => {
            let catalog = open(path, cli.no_commit).await?;
            let detail = catalog.find_product_by_id(id).await?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
            Ok(())
        }
        Commands::Update { id, patch } => {
            let catalog = open(path, cli.no_commit).await?;
            let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_str(patch)?;
            let product = catalog.update_product(id, fields).await?;
            println!("{}", serde_json::to_string_pretty(&product)?);
            Ok(())
        }
        Commands::Delete { id } => {
            let catalog = open(path, cli.no_commit).await?;
            catalog.delete_product(id).await?;
            println!("Deleted product {}", id);
            Ok(())
        }
        Commands::Search { query } => {
            let catalog = open(path, cli.no_commit).await?;
            let page = catalog.search(SearchParams::from_query_string(query)).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
            Ok(())
        }
        Commands::Categories => list_categories(path, cli.no_commit).await,
        Commands::Status => show_status(path, cli.no_commit).await,
    }
}

async fn open(path: &Path, no_commit: bool) -> anyhow::Result<Catalog> {
    let mut config = CatalogConfig::load(path)?;
    if no_commit {
        config = config.without_commits();
    }
    Ok(Catalog::new(Database::open_with(path, config).await?))
}

async fn read_input(input: &str) -> anyhow::Result<String> {
    let mut content = String::new();
    if input == "-" {
        tokio::io::stdin().read_to_string(&mut content).await?;
    } else {
        content = tokio::fs::read_to_string(input).await?;
    }
    Ok(content)
}

async fn init_catalog(path: &Path, no_commit: bool) -> anyhow::Result<()> {
    println!("Initializing catalog at {:?}...", path);

    let mut config = CatalogConfig::load(path)?;
    if no_commit {
        config = config.without_commits();
    }
    config.save(path)?;

    // Opening creates the git repository when commits are enabled
    let _db = Database::open_with(path, config).await?;

    for collection in [CATEGORIES, PRODUCTS] {
        tokio::fs::create_dir_all(path.join("collections").join(collection)).await?;
    }

    println!("Catalog initialized successfully!");
    println!();
    println!("Directory structure:");
    println!("  collections/categories/ - Category taxonomy");
    println!("  collections/products/   - Products");
    println!("  .mdcatalog/config.yaml  - Catalog configuration");
    println!();
    println!("Get started:");
    println!("  mdcatalog add product.json");
    println!("  mdcatalog search \"category=shirts&sort=price_high\"");

    Ok(())
}

async fn list_categories(path: &Path, no_commit: bool) -> anyhow::Result<()> {
    let catalog = open(path, no_commit).await?;
    let tree = catalog.category_tree().await?;

    if tree.is_empty() {
        println!("No categories found.");
        return Ok(());
    }

    fn print_node(node: &CategoryNode, depth: usize) {
        println!("{}{} ({})", "  ".repeat(depth), node.category.name, node.category.id);
        for child in &node.children {
            print_node(child, depth + 1);
        }
    }

    for node in &tree {
        print_node(node, 0);
    }
    Ok(())
}

async fn show_status(path: &Path, no_commit: bool) -> anyhow::Result<()> {
    let catalog = open(path, no_commit).await?;
    let db = catalog.store();

    println!("mdcatalog Status");
    println!("================");
    println!("Path: {:?}", db.root);
    println!();
    println!("Categories: {}", db.count(CATEGORIES, &Filter::All).await?);
    println!("Products: {}", db.count(PRODUCTS, &Filter::All).await?);

    match db.commit_count().await? {
        Some(commits) => {
            println!("Commits: {}", commits);
            if db.has_uncommitted_changes().await? {
                println!("\nUncommitted changes detected.");
            } else {
                println!("\nNo uncommitted changes.");
            }
        }
        None => println!("\nCommits disabled."),
    }

    Ok(())
}
