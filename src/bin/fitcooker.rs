use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fitcooker::nutrition::{
    convert, normalize_text, nutrients_for_quantity, process_ingredient, ActivityLevel, Bmi,
    BodyMetrics, Goal, KitchenUnit, Macros, ProcessedIngredient, RawIngredient,
};
use fitcooker::{FitCooker, FitCookerConfig};

#[derive(Parser, Debug)]
#[clap(name = "fitcooker", version)]
#[clap(about = "Nutrition calculators and ingredient lookup for FitCooker", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Body mass index and weight class
    Bmi {
        /// Weight in kilograms
        #[clap(long)]
        weight: f64,
        /// Height in centimetres
        #[clap(long)]
        height: f64,
    },
    /// Daily calorie and macro targets
    Macros {
        #[clap(long)]
        age: f64,
        /// Weight in kilograms
        #[clap(long)]
        weight: f64,
        /// Height in centimetres
        #[clap(long)]
        height: f64,
        /// sedentary, light, moderate, intense or very-intense
        #[clap(long, default_value = "moderate")]
        activity: String,
        /// lose, maintain or gain
        #[clap(long, default_value = "maintain")]
        goal: String,
    },
    /// Convert between kitchen units (g, kg, ml, l, xicara, colher-sopa, ...)
    Convert {
        value: f64,
        from: String,
        to: String,
    },
    /// Nutrients for a quantity of an ingredient, from its per-100 g values
    Nutrients {
        quantity: f64,
        unit: String,
        #[clap(long, default_value = "0")]
        calories: f64,
        #[clap(long, default_value = "0")]
        protein: f64,
        #[clap(long, default_value = "0")]
        carbs: f64,
        #[clap(long, default_value = "0")]
        fat: f64,
    },
    /// Normalize an ingredient record given as JSON
    Normalize {
        json: String,
    },
    /// Normalize a name for searching
    Slug {
        text: String,
    },
    /// Search ingredients (needs SUPABASE_URL and SUPABASE_ANON_KEY)
    Search {
        query: String,
        /// Ask the food database directly, bypassing the cache
        #[clap(long)]
        no_cache: bool,
    },
}

async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Bmi { weight, height } => {
            anyhow::ensure!(weight > 0.0 && height > 0.0, "weight and height must be positive");
            let bmi = Bmi::compute(weight, height / 100.0);
            println!("{:.1} ({})", bmi.rounded(), bmi.class.label());
        }
        Commands::Macros {
            age,
            weight,
            height,
            activity,
            goal,
        } => {
            let activity: ActivityLevel = activity.parse()?;
            let goal: Goal = goal.parse()?;
            let metrics = BodyMetrics {
                age_years: age,
                weight_kg: weight,
                height_cm: height,
            };
            let targets = metrics.macro_targets(activity, goal);
            println!("{}", serde_json::to_string_pretty(&targets)?);
        }
        Commands::Convert { value, from, to } => {
            let from: KitchenUnit = from.parse()?;
            let to: KitchenUnit = to.parse()?;
            println!("{} {}", convert(value, from, to), to.label());
        }
        Commands::Nutrients {
            quantity,
            unit,
            calories,
            protein,
            carbs,
            fat,
        } => {
            let per_100 = Macros {
                calories,
                protein,
                carbs,
                fat,
                ..Default::default()
            };
            let result = nutrients_for_quantity(&per_100, quantity, &unit);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Normalize { json } => {
            let raw: RawIngredient =
                serde_json::from_str(&json).context("ingredient must be a JSON object")?;
            println!("{}", serde_json::to_string_pretty(&process_ingredient(&raw))?);
        }
        Commands::Slug { text } => {
            println!("{}", normalize_text(&text, ""));
        }
        Commands::Search { query, no_cache } => {
            let config = FitCookerConfig::from_env()?;
            let fitcooker = FitCooker::new(config)?;

            let found: Vec<ProcessedIngredient> = if no_cache {
                fitcooker
                    .food_source()
                    .search(&query)
                    .await?
                    .iter()
                    .map(process_ingredient)
                    .collect()
            } else {
                fitcooker.catalog().search(&query).await?
            };

            if found.is_empty() {
                println!("No ingredients found for {:?}", query);
            }
            for ingredient in found {
                println!(
                    "{:<40} {:>7.1} kcal  P {:>5.1}  C {:>5.1}  F {:>5.1}  per 100 {}",
                    ingredient.name,
                    ingredient.calories,
                    ingredient.protein,
                    ingredient.carbs,
                    ingredient.fat,
                    ingredient.unit
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
