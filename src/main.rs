use chrono::DateTime;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, bail};
use retailstore::{Catalog, NewProduct, Product, ProductPatch, export_jsonl, import_jsonl};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "retailstore")]
#[command(about = "Retail product catalog with case-insensitive name uniqueness")]
#[command(version)]
struct Cli {
    /// Path to the catalog directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    store_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a product to the catalog
    Add {
        /// Product name (unique, case-insensitively)
        name: String,
        /// Category the product belongs to
        category: String,
        /// Unit price
        price: f64,
        /// Units in stock
        quantity: i64,
        /// Optional free-form description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List products, optionally narrowed to a category
    List {
        /// Only products in this category (case-insensitive)
        #[arg(short, long)]
        category: Option<String>,
        /// Only products with strictly more than this many units (needs --category)
        #[arg(short, long)]
        min_quantity: Option<i64>,
    },

    /// Show one product by id
    Show { id: i64 },

    /// Find one product by name (case-insensitive)
    Find { name: String },

    /// Replace every field of a product
    Set {
        id: i64,
        name: String,
        category: String,
        price: f64,
        quantity: i64,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Update only the given fields of a product
    Patch {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        quantity: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a product by id
    Rm { id: i64 },

    /// Remove every product from the catalog
    Clear,

    /// Check whether a product id exists (exit code 1 if not)
    Exists { id: i64 },

    /// Dump the catalog to a JSONL file
    Export { path: PathBuf },

    /// Seed the catalog from a JSONL file, skipping colliding names
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut catalog = Catalog::open(&cli.store_path)?;

    match cli.command {
        Commands::Add {
            name,
            category,
            price,
            quantity,
            description,
        } => {
            let candidate = NewProduct {
                product_name: name,
                category,
                price,
                quantity,
                description,
            };
            validate(&candidate)?;
            let product = catalog.create(candidate)?;
            println!("{} product {}", "Created".green(), product.id);
            print_product(&product);
        }
        Commands::List {
            category,
            min_quantity,
        } => {
            let products = match (category, min_quantity) {
                (Some(cat), Some(min)) => catalog.list_by_category_with_min_quantity(&cat, min)?,
                (Some(cat), None) => catalog.list_by_category(&cat)?,
                (None, None) => catalog.list_all()?,
                (None, Some(_)) => bail!("--min-quantity needs --category"),
            };
            if products.is_empty() {
                println!("{}", "No products".dimmed());
            }
            for product in &products {
                print_product_line(product);
            }
        }
        Commands::Show { id } => {
            let product = catalog.get_by_id(id)?;
            print_product(&product);
        }
        Commands::Find { name } => {
            let product = catalog.get_by_product_name(&name)?;
            print_product(&product);
        }
        Commands::Set {
            id,
            name,
            category,
            price,
            quantity,
            description,
        } => {
            let values = NewProduct {
                product_name: name,
                category,
                price,
                quantity,
                description,
            };
            validate(&values)?;
            let product = catalog.replace(id, values)?;
            println!("{} product {}", "Updated".green(), product.id);
            print_product(&product);
        }
        Commands::Patch {
            id,
            name,
            category,
            price,
            quantity,
            description,
        } => {
            let patch = ProductPatch {
                product_name: name,
                category,
                price,
                quantity,
                description,
            };
            validate_patch(&patch)?;
            let product = catalog.merge_update(id, patch)?;
            println!("{} product {}", "Updated".green(), product.id);
            print_product(&product);
        }
        Commands::Rm { id } => {
            catalog.delete(id)?;
            println!("{} product {}", "Deleted".red(), id);
        }
        Commands::Clear => {
            catalog.delete_all()?;
            println!("{}", "Catalog cleared".red());
        }
        Commands::Exists { id } => {
            if catalog.exists_by_id(id)? {
                println!("{}", "exists".green());
            } else {
                println!("{}", "not found".red());
                std::process::exit(1);
            }
        }
        Commands::Export { path } => {
            let count = export_jsonl(&catalog, &path)?;
            println!("Exported {} products to {}", count, path.display());
        }
        Commands::Import { path } => {
            let summary = import_jsonl(&mut catalog, &path)?;
            println!(
                "Imported {} products ({} skipped) from {}",
                summary.created,
                summary.skipped,
                path.display()
            );
        }
    }

    Ok(())
}

/// Caller-side input validation; the catalog itself only owns name uniqueness.
fn validate(candidate: &NewProduct) -> Result<()> {
    if candidate.product_name.trim().is_empty() {
        bail!("product name must not be empty");
    }
    if candidate.price < 0.0 {
        bail!("price must be non-negative");
    }
    if candidate.quantity < 0 {
        bail!("quantity must be non-negative");
    }
    Ok(())
}

fn validate_patch(patch: &ProductPatch) -> Result<()> {
    if patch.is_empty() {
        bail!("nothing to update: pass at least one of --name/--category/--price/--quantity/--description");
    }
    if matches!(&patch.product_name, Some(n) if n.trim().is_empty()) {
        bail!("product name must not be empty");
    }
    if matches!(patch.price, Some(p) if p < 0.0) {
        bail!("price must be non-negative");
    }
    if matches!(patch.quantity, Some(q) if q < 0) {
        bail!("quantity must be non-negative");
    }
    Ok(())
}

fn print_product_line(product: &Product) {
    println!(
        "{:>6}  {}  [{}]  {:.2}  x{}",
        product.id,
        product.product_name.bold(),
        product.category,
        product.price,
        product.quantity
    );
}

fn print_product(product: &Product) {
    print_product_line(product);
    if let Some(desc) = &product.description {
        println!("        {}", desc.dimmed());
    }
    println!(
        "        created {}  updated {}",
        format_ms(product.created_at).dimmed(),
        format_ms(product.updated_at).dimmed()
    );
}

fn format_ms(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}
