// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ecoledger::{
    grand_total, CompanyProfile, EstimationConfig, FactorRegistry, Industry, ReportingSession,
    Scope,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => {
            let csv = args.get(2).context("usage: ecoledger import <entries.csv> [out_dir]")?;
            let out_dir = args.get(3).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            run_import(Path::new(csv), &out_dir)?;
        }
        Some("view") => {
            let csv = args.get(2).context("usage: ecoledger view <entries.csv>")?;
            run_ui_mode(Path::new(csv))?;
        }
        Some("factors") => run_factors()?,
        _ => {
            eprintln!("EcoLedger {}", ecoledger::VERSION);
            eprintln!("   ecoledger import <entries.csv> [out_dir]   compute and export a report");
            eprintln!("   ecoledger view <entries.csv>               browse results in the terminal");
            eprintln!("   ecoledger factors                          list emission factors");
            std::process::exit(2);
        }
    }

    Ok(())
}

// ============================================================================
// STARTUP
// ============================================================================

/// Factors and constants, validated once before any calculation
fn load_engine() -> Result<(Arc<FactorRegistry>, Arc<EstimationConfig>)> {
    let registry = match env::var("ECOLEDGER_FACTORS") {
        Ok(path) => FactorRegistry::from_file(&path)?,
        Err(_) => FactorRegistry::builtin(),
    };

    let config_path = env::var("ECOLEDGER_CONFIG").ok().map(PathBuf::from);
    let config = EstimationConfig::load(config_path.as_deref())?;

    Ok((Arc::new(registry), Arc::new(config)))
}

fn load_profile() -> Result<CompanyProfile> {
    let mut profile = CompanyProfile::default();

    if let Ok(name) = env::var("ECOLEDGER_COMPANY") {
        profile.name = name;
    }
    if let Ok(industry) = env::var("ECOLEDGER_INDUSTRY") {
        profile.industry = match Industry::from_name(&industry) {
            Some(i) => i,
            None => bail!("Unknown industry '{}', expected one of {:?}", industry, Industry::ALL),
        };
    }
    if let Ok(year) = env::var("ECOLEDGER_YEAR") {
        profile.reporting_year = year
            .parse()
            .with_context(|| format!("Invalid ECOLEDGER_YEAR: {}", year))?;
    }

    Ok(profile)
}

fn open_session(csv_path: &Path) -> Result<ReportingSession> {
    let (registry, config) = load_engine()?;
    let profile = load_profile()?;

    let file = std::fs::File::open(csv_path).with_context(|| format!("Failed to open CSV file: {:?}", csv_path))?;
    let mut session = ReportingSession::new(registry, config, profile)?;
    session
        .import_csv(file)
        .with_context(|| format!("Rejected activity file: {:?}", csv_path))?;

    Ok(session)
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_import(csv_path: &Path, out_dir: &Path) -> Result<()> {
    println!("🌿 EcoLedger: activities → emissions report");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load and validate activity rows
    println!("\n📂 Loading activities...");
    let session = open_session(csv_path)?;
    println!("✓ Accepted {} activity rows", session.ledger().len());

    // 2. Enrich + aggregate
    println!("\n🧮 Computing emissions...");
    let rows = session.enriched_rows()?;
    let summary = session.summary()?;
    let by_scope = session.totals_by_scope()?;

    for (scope, quality, t) in summary.groups() {
        println!("   Scope {} | {:<20} {:>12.3} tCO2e", scope, quality, t);
    }
    println!();
    for scope in Scope::ALL {
        if let Some(t) = by_scope.get(&scope.number()) {
            println!("✓ {} total: {:.3} tCO2e", scope, t);
        }
    }
    println!("✓ Grand total: {:.3} tCO2e", grand_total(&rows));

    // 3. Exports
    println!("\n💾 Writing exports...");
    let paths = session.write_exports(out_dir)?;
    println!("✓ {}", paths.csv.display());
    println!("✓ {}", paths.json.display());
    println!("✓ {}", paths.document.display());

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Report for {} ({}) complete", session.profile.name, session.profile.reporting_year);

    Ok(())
}

fn run_factors() -> Result<()> {
    let (registry, _) = load_engine()?;

    println!("{:<28}{:>12}  per", "activity_code", "kg CO2e");
    for ef in registry.list_all() {
        println!("{:<28}{:>12}  {}", ef.activity_code, ef.factor, ef.per_unit);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(csv_path: &Path) -> Result<()> {
    println!("🖥️  Loading EcoLedger results view...\n");

    let session = open_session(csv_path)?;
    let rows = session.enriched_rows()?;
    let summary = session.summary()?;
    let by_scope = session.totals_by_scope()?;

    let mut app = ui::App::new(session.profile.clone(), rows, &summary, by_scope);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_csv_path: &Path) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: ecoledger import <entries.csv>");
    std::process::exit(1);
}
