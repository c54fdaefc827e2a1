use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use soda_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sodalog")]
#[command(about = "Soda consumption tracker with daily and weekly goals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a drink
    Log {
        /// Brand, e.g. "Coca-Cola"
        #[arg(long)]
        brand: String,

        /// Variant within the brand, e.g. "Coca-Cola Classic"
        #[arg(long)]
        variant: String,

        /// Volume in fl oz (12 if neither --oz nor --size is given)
        #[arg(long, allow_negative_numbers = true, conflicts_with = "size")]
        oz: Option<f64>,

        /// Common size such as "Can", "2 Liter" or "16.9 fl oz (Bottle)", or a number
        #[arg(long)]
        size: Option<String>,

        /// When it was consumed (RFC 3339); now if omitted
        #[arg(long)]
        at: Option<String>,
    },

    /// Show today's totals against the daily limit (default)
    Today {
        /// Day to show instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the last seven days
    Week {
        /// Last day of the week (YYYY-MM-DD); today if omitted
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show or change goals
    Goals {
        #[command(subcommand)]
        action: Option<GoalAction>,
    },

    /// List brands, variants and common sizes
    Catalog,

    /// Roll up WAL entries to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum GoalAction {
    /// Change one or more goal values
    Set {
        /// Daily limit in fl oz
        #[arg(long)]
        daily: Option<f64>,

        /// Weekly limit in fl oz
        #[arg(long)]
        weekly: Option<f64>,

        /// Target reduction in percent
        #[arg(long)]
        reduction: Option<f64>,
    },
}

/// Time zone used to cut days
#[derive(Clone, Copy)]
enum Zone {
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    fn today(self) -> NaiveDate {
        match self {
            Zone::Local => Local::now().date_naive(),
            Zone::Fixed(offset) => Utc::now().with_timezone(&offset).date_naive(),
        }
    }
}

/// Everything a command needs, resolved from config and flags
struct Context {
    zone: Zone,
    catalog: Option<Catalog>,
    entries: JsonlEntryStore,
    goals: FileGoalStore,
}

impl Context {
    fn catalog(&self) -> &Catalog {
        self.catalog.as_ref().unwrap_or_else(|| default_catalog())
    }

    fn tracker(&self) -> Tracker<'_, JsonlEntryStore, FileGoalStore> {
        Tracker::new(self.catalog(), &self.entries, &self.goals)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        soda_core::logging::init_with_level("debug");
    } else {
        soda_core::logging::init();
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = build_context(&config, cli.data_dir)?;

    match cli.command {
        Some(Commands::Log {
            brand,
            variant,
            oz,
            size,
            at,
        }) => {
            let volume_oz = match (oz, size) {
                (Some(oz), _) => oz,
                (None, Some(size)) => find_size(&size)?,
                (None, None) => REFERENCE_VOLUME_OZ,
            };
            cmd_log(&ctx, brand, variant, volume_oz, at)
        }
        Some(Commands::Today { date, json }) => cmd_today(&ctx, date, json),
        Some(Commands::Week { end, json }) => cmd_week(&ctx, end, json),
        Some(Commands::Goals { action }) => cmd_goals(&ctx, action),
        Some(Commands::Catalog) => cmd_catalog(&ctx),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&ctx, cleanup),
        None => cmd_today(&ctx, None, false),
    }
}

fn build_context(config: &Config, data_dir: Option<PathBuf>) -> Result<Context> {
    let data_dir = data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    let zone = match config.display.fixed_offset()? {
        Some(offset) => Zone::Fixed(offset),
        None => Zone::Local,
    };

    let catalog = config
        .catalog
        .path
        .as_deref()
        .map(Catalog::load_from)
        .transpose()?;

    tracing::debug!("Using data directory {:?}", data_dir);

    Ok(Context {
        entries: JsonlEntryStore::in_data_dir(&data_dir),
        goals: FileGoalStore::in_data_dir(&data_dir).with_defaults(GoalConfig::from(&config.goals)),
        zone,
        catalog,
    })
}

fn parse_timestamp(at: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("Invalid --at time '{}': {}", at, e)))
}

fn daily(ctx: &Context, day: NaiveDate) -> Result<DailyStats> {
    match ctx.zone {
        Zone::Local => ctx.tracker().daily_stats(day, &Local),
        Zone::Fixed(offset) => ctx.tracker().daily_stats(day, &offset),
    }
}

fn weekly(ctx: &Context, end: NaiveDate) -> Result<WeeklyStats> {
    match ctx.zone {
        Zone::Local => ctx.tracker().weekly_stats(end, &Local),
        Zone::Fixed(offset) => ctx.tracker().weekly_stats(end, &offset),
    }
}

fn local_date(zone: Zone, timestamp: DateTime<Utc>) -> NaiveDate {
    match zone {
        Zone::Local => timestamp.with_timezone(&Local).date_naive(),
        Zone::Fixed(offset) => timestamp.with_timezone(&offset).date_naive(),
    }
}

fn cmd_log(ctx: &Context, brand: String, variant: String, oz: f64, at: Option<String>) -> Result<()> {
    let timestamp = at.as_deref().map(parse_timestamp).transpose()?;

    let entry = ctx.tracker().log(LogRequest {
        volume_oz: oz,
        brand,
        variant,
        timestamp,
    })?;

    println!("✓ Logged {} fl oz of {}", entry.volume_oz, entry.brand_variant_name);
    println!(
        "  {} kcal · {} g sugar · {} g carbs · {} mg caffeine",
        entry.nutrients.calories,
        entry.nutrients.sugar_g,
        entry.nutrients.carbs_g,
        entry.nutrients.caffeine_mg
    );

    let stats = daily(ctx, local_date(ctx.zone, entry.timestamp))?;
    println!("  {}", allowance_line(&stats));
    Ok(())
}

fn allowance_line(stats: &DailyStats) -> String {
    if stats.remaining_allowance_oz >= 0.0 {
        format!("{:.1} fl oz remaining on {}", stats.remaining_allowance_oz, stats.date)
    } else {
        format!(
            "Daily limit exceeded by {:.1} fl oz on {}",
            -stats.remaining_allowance_oz,
            stats.date
        )
    }
}

fn cmd_today(ctx: &Context, date: Option<NaiveDate>, json: bool) -> Result<()> {
    let day = date.unwrap_or_else(|| ctx.zone.today());
    let stats = daily(ctx, day)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n{}", day.format("%A, %B %-d %Y"));
    println!("─────────────────────────────────────────");
    println!(
        "  Consumed:  {:.1} / {:.1} fl oz ({:.0}%)",
        stats.total_volume_oz, stats.daily_limit_oz, stats.progress_percent
    );
    println!("  {}", allowance_line(&stats));
    println!();
    println!("  Calories:  {}", stats.total_calories);
    println!("  Sugar:     {} g", stats.total_sugar_g);
    println!("  Carbs:     {} g", stats.total_carbs_g);
    println!("  Caffeine:  {} mg", stats.total_caffeine_mg);
    println!();
    Ok(())
}

fn cmd_week(ctx: &Context, end: Option<NaiveDate>, json: bool) -> Result<()> {
    let end = end.unwrap_or_else(|| ctx.zone.today());
    let stats = weekly(ctx, end)?;

    if json {
        let view = serde_json::json!({
            "week": stats,
            "sugar_teaspoons": stats.sugar_teaspoons(),
            "meal_equivalents": stats.meal_equivalents(),
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("\nWeek {} to {}", stats.start_date, stats.end_date);
    println!("─────────────────────────────────────────");
    for day in &stats.days {
        println!(
            "  {} {}  {:>6.1} fl oz  {:>5} kcal",
            day.weekday,
            day.date.format("%m-%d"),
            day.volume_oz,
            day.calories
        );
    }
    println!();
    println!(
        "  Total:     {:.1} / {:.1} fl oz ({:.1} remaining)",
        stats.total_volume_oz, stats.weekly_limit_oz, stats.remaining_allowance_oz
    );
    println!(
        "  Sugar:     {} g ({:.1} tsp)",
        stats.total_sugar_g,
        stats.sugar_teaspoons()
    );
    println!(
        "  Calories:  {} ({:.1} meals)",
        stats.total_calories,
        stats.meal_equivalents()
    );
    println!("  Caffeine:  {} mg", stats.total_caffeine_mg);
    println!("  Days over daily limit: {}", stats.days_over_daily_limit);
    println!();
    Ok(())
}

fn cmd_goals(ctx: &Context, action: Option<GoalAction>) -> Result<()> {
    let tracker = ctx.tracker();

    let goals = match action {
        None => tracker.goals()?,
        Some(GoalAction::Set {
            daily,
            weekly,
            reduction,
        }) => {
            let current = tracker.goals()?;
            let updated = GoalConfig {
                daily_limit_oz: daily.unwrap_or(current.daily_limit_oz),
                weekly_limit_oz: weekly.unwrap_or(current.weekly_limit_oz),
                target_reduction_percent: reduction.unwrap_or(current.target_reduction_percent),
            };
            let stored = tracker.set_goals(updated)?;
            println!("✓ Goals updated");
            stored
        }
    };

    println!("  Daily limit:       {} fl oz", goals.daily_limit_oz);
    println!("  Weekly limit:      {} fl oz", goals.weekly_limit_oz);
    println!("  Target reduction:  {}%", goals.target_reduction_percent);
    Ok(())
}

fn cmd_catalog(ctx: &Context) -> Result<()> {
    for brand in ctx.catalog().brands() {
        println!("{}", brand.name);
        for variant in &brand.variants {
            let p = &variant.per_reference;
            println!(
                "  {:<26} {:>4} kcal {:>4} g sugar {:>4} mg caffeine",
                variant.name, p.calories, p.sugar_g, p.caffeine_mg
            );
        }
    }

    println!("\nValues per {} fl oz. Common sizes:", REFERENCE_VOLUME_OZ);
    for size in common_sizes() {
        println!("  {}", size.label);
    }
    Ok(())
}

fn cmd_rollup(ctx: &Context, cleanup: bool) -> Result<()> {
    let wal_path = ctx.entries.wal_path();
    let csv_path = ctx.entries.archive_path();

    if !wal_path.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = soda_core::rollup::wal_to_csv_and_archive(wal_path, csv_path)?;

    if count == 0 {
        println!("WAL is empty - nothing to roll up.");
    } else {
        println!("✓ Rolled up {} entries to CSV", count);
        println!("  CSV: {}", csv_path.display());
    }

    if let (true, Some(wal_dir)) = (cleanup, wal_path.parent()) {
        let cleaned = soda_core::rollup::cleanup_processed_wals(wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}
