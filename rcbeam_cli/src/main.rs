//! # rcbeam CLI
//!
//! Command-line shell over `rcbeam_core`. Reads JSON requests from a file
//! (or `-` for stdin), runs the engine and prints JSON results on stdout.
//! Logs go to stderr so stdout stays machine-readable.
//!
//! ```text
//! rcbeam design beam.json
//! rcbeam batch beams.json --settings settings.json
//! rcbeam optimize search.json --threads 4
//! rcbeam beam-line line.json
//! rcbeam demo
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rcbeam_core::calculations::design::BatchRequest;
use rcbeam_core::optimization::BeamLineGroup;
use rcbeam_core::{
    design_batch, design_beam, optimize, standardize, CancelToken, DesignRequest, DesignResult,
    DesignSettings, LoadDemand, Material, OptimizationRequest, Section,
};

#[derive(Parser, Debug)]
#[command(name = "rcbeam")]
#[command(about = "IS 456 reinforced concrete beam design and optimization")]
#[command(version)]
struct Cli {
    /// Design settings JSON (defaults when absent)
    #[arg(long, global = true, env = "RCBEAM_SETTINGS")]
    settings: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Single-line JSON instead of pretty output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Design one beam
    Design {
        /// Design request JSON, or - for stdin
        input: PathBuf,
    },

    /// Design many independent beams
    Batch {
        /// Batch request JSON, or - for stdin
        input: PathBuf,
    },

    /// Search reinforcement options for one beam
    Optimize {
        /// Optimization request JSON, or - for stdin
        input: PathBuf,

        /// Worker threads (overrides the request)
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Standardize bar diameters along a beam line
    BeamLine {
        /// Beam line group JSON, or - for stdin
        input: PathBuf,
    },

    /// Design the 300 x 450 example beam and print a summary
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings(cli.settings.as_deref())?;
    let cancel = CancelToken::new();

    match cli.command {
        Commands::Design { input } => {
            let request: DesignRequest = read_json(&input)?;
            let result = design_beam(&request, &settings);
            if !result.is_ok {
                tracing::warn!(label = ?result.label, errors = result.errors.len(), "design is not ok");
            }
            print_json(&result, cli.compact)?;
        }
        Commands::Batch { input } => {
            let batch: BatchRequest = read_json(&input)?;
            tracing::info!(beams = batch.requests.len(), "designing batch");
            let outcomes = design_batch(&batch, &settings, &cancel)?;
            print_json(&outcomes, cli.compact)?;
        }
        Commands::Optimize { input, threads } => {
            let mut request: OptimizationRequest = read_json(&input)?;
            if let Some(threads) = threads {
                request.config.threads = threads;
            }
            let response = optimize(&request, &settings, &cancel)?;
            tracing::info!(
                enumerated = response.enumerated,
                feasible = response.feasible,
                frontier = response.frontier.len(),
                "optimization finished"
            );
            print_json(&response, cli.compact)?;
        }
        Commands::BeamLine { input } => {
            let group: BeamLineGroup = read_json(&input)?;
            tracing::info!(line = %group.name, members = group.members.len(), "standardizing beam line");
            let report = standardize(&group, &settings, &cancel)?;
            print_json(&report, cli.compact)?;
        }
        Commands::Demo => run_demo(&settings, cli.compact)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "rcbeam_core=debug,rcbeam_cli=debug"
    } else {
        "rcbeam_core=info,rcbeam_cli=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<DesignSettings> {
    let Some(path) = path else {
        return Ok(DesignSettings::default());
    };
    let json = fs::read_to_string(path).with_context(|| format!("reading settings {}", path.display()))?;
    let settings = DesignSettings::from_json(&json).with_context(|| format!("parsing settings {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded settings");
    Ok(settings)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    if text.trim().is_empty() {
        bail!("{} is empty", path.display());
    }
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}

// ============================================================================
// Demo
// ============================================================================

fn run_demo(settings: &DesignSettings, compact: bool) -> Result<()> {
    let request = DesignRequest::new(
        Section::rectangular(300.0, 450.0, 410.0, 25.0),
        Material::new(25.0, 500.0),
        vec![LoadDemand::new(120.0, 90.0).with_id("ULS-1")],
    )
    .with_span(6000.0)
    .with_label("Demo beam");
    let result = design_beam(&request, settings);

    print_summary(&result);
    eprintln!();
    print_json(&result, compact)
}

fn print_summary(result: &DesignResult) {
    eprintln!("═══════════════════════════════════════");
    eprintln!("  RC BEAM DESIGN (IS 456)");
    eprintln!("═══════════════════════════════════════");
    eprintln!("  Section:  300 x 450, d = {:.0} mm", result.effective_depth_mm);
    eprintln!("  Material: M25 / Fe500");
    if let Some(f) = result.governing_flexure() {
        eprintln!(
            "  Flexure:  Mu = {:.1} kN·m, Mu,lim = {:.1} kN·m, Ast = {:.0} mm² {}",
            f.moment_knm,
            f.mu_lim_knm,
            f.ast_required_mm2,
            status_icon(f.is_safe)
        );
    }
    if let Some(s) = result.governing_shear() {
        eprintln!(
            "  Shear:    τv = {:.2} N/mm², τc = {:.2} N/mm², sv = {:.0} mm {}",
            s.tau_v_mpa,
            s.tau_c_mpa,
            s.spacing_mm,
            status_icon(s.is_safe)
        );
    }
    if let Some(d) = &result.detailing {
        if let Some(c) = d.bottom.combination() {
            let bars: Vec<String> = c.groups.iter().map(|g| format!("{}-{}", g.count, g.diameter_mm)).collect();
            eprintln!("  Bottom:   {} ({:.0} mm²)", bars.join(" + "), d.bottom.provided_mm2);
        }
        eprintln!("  Steel:    {:.1} kg/m", d.steel_mass_kg_per_m);
    }
    for e in &result.errors {
        eprintln!("  [{:?}] {}: {}", e.severity, e.clause, e.message);
    }
    eprintln!("═══════════════════════════════════════");
    eprintln!("  RESULT: {}", if result.is_ok { "OK" } else { "NOT OK" });
    eprintln!("═══════════════════════════════════════");
}

fn status_icon(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}
