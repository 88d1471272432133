use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use viscad::assembler::Assembly;
use viscad::doe_file;
use viscad::external;
use viscad::render_svg::export_library_svg;
use viscad::resolver::{IdentifierTable, ResolveInput};
use viscad::settings::RenderSettings;

/// How the input files describe the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputMode {
    /// One CSV with `<identifier>:<token>` cells
    Combined,
    /// Tab separated structure, fixed-width identifier file
    FixedWidth,
    /// Tab separated structure, tab separated identifier file
    Tab,
    /// Library description plus fixed-width equivalence file
    Library,
    /// Numeric design matrix (CSV)
    Matrix,
}

/// Visual DoE: draw every construct of a pathway library.
#[derive(Parser)]
#[command(name = "viscad", version, about = "Visual DoE for pathway libraries")]
struct Cli {
    /// Input DoE file
    doe_file: PathBuf,

    /// Layout of the input files
    #[arg(long, value_enum, default_value = "combined")]
    mode: InputMode,

    /// Identifier file (or equivalence file in library mode)
    #[arg(short = 'i')]
    ids: Option<PathBuf>,

    /// Output folder (default: same as input)
    #[arg(short = 'O')]
    out_dir: Option<PathBuf>,

    /// Do not generate pdf
    #[arg(short = 'p', long = "no-pdf")]
    no_pdf: bool,

    /// Log file the command line is appended to
    #[arg(short = 'l')]
    log: Option<PathBuf>,

    /// Build a LaTeX report around the pdf
    #[arg(short = 'r')]
    report: bool,

    /// Design name shown in the report
    #[arg(short = 'd', default_value = "SBC")]
    design: String,

    /// Library size shown in the report
    #[arg(short = 's', default_value_t = 10)]
    size: usize,

    /// Report template (default: built-in)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Render settings JSON
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Spread gene colours by variant level
    #[arg(long)]
    variant_colors: bool,

    /// Timeout for external tools, in seconds
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Print a JSON summary of the drawing
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct FailureSummary {
    construct: String,
    error: String,
}

#[derive(Serialize)]
struct DrawingSummary {
    svg: String,
    constructs: Vec<String>,
    canvas_width: f64,
    canvas_height: f64,
    failures: Vec<FailureSummary>,
}

fn summarize(assembly: &Assembly, svg: &Path) -> DrawingSummary {
    DrawingSummary {
        svg: svg.display().to_string(),
        constructs: assembly.diagrams.iter().map(|d| d.key.clone()).collect(),
        canvas_width: assembly.canvas_width,
        canvas_height: assembly.canvas_height,
        failures: assembly
            .failures
            .iter()
            .map(|f| FailureSummary {
                construct: f.key.clone(),
                error: f.error.to_string(),
            })
            .collect(),
    }
}

fn required_ids(cli: &Cli) -> Result<&Path> {
    cli.ids
        .as_deref()
        .ok_or_else(|| anyhow!("Mode {:?} needs an identifier file (-i)", cli.mode))
}

fn load_input(cli: &Cli) -> Result<ResolveInput> {
    let doe = &cli.doe_file;
    let input = match cli.mode {
        InputMode::Combined => ResolveInput::CombinedCsv {
            rows: doe_file::read_combined_csv(doe)?,
        },
        InputMode::FixedWidth | InputMode::Tab => {
            let structure = doe_file::read_structural_table(doe)?;
            // Without an identifier file every part is drawn under its token
            let identifiers = match (&cli.ids, cli.mode) {
                (None, _) => None,
                (Some(path), InputMode::Tab) => Some(IdentifierTable::TabElided(
                    doe_file::read_tab_identifiers(path)?,
                )),
                (Some(path), _) => Some(IdentifierTable::FixedWidth(
                    doe_file::read_fixed_width_identifiers(path)?,
                )),
            };
            ResolveInput::TabParallel {
                structure,
                identifiers,
            }
        }
        InputMode::Library => ResolveInput::LibraryEquivalence {
            library: doe_file::read_library_table(doe)?,
            equivalence: doe_file::read_equivalence_lines(required_ids(cli)?)?,
        },
        InputMode::Matrix => ResolveInput::Matrix {
            matrix: doe_file::read_design_matrix(doe)?,
        },
    };
    Ok(input)
}

fn load_settings(cli: &Cli) -> Result<RenderSettings> {
    let mut settings = match &cli.settings {
        Some(path) => RenderSettings::load_from_path(path)
            .with_context(|| format!("Could not load settings '{}'", path.display()))?,
        None => RenderSettings::default(),
    };
    if cli.variant_colors {
        settings.variant_colors = true;
    }
    Ok(settings)
}

fn output_paths(cli: &Cli) -> (PathBuf, PathBuf) {
    let name = cli
        .doe_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "viscad".to_string());
    let dir = cli
        .out_dir
        .clone()
        .or_else(|| cli.doe_file.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    (
        dir.join(format!("{name}.svg")),
        dir.join(format!("{name}.pdf")),
    )
}

fn append_log(path: &Path) -> Result<()> {
    let line = std::env::args()
        .map(|a| format!("\"{a}\""))
        .collect::<Vec<_>>()
        .join(" ");
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file '{}'", path.display()))?;
    writeln!(file, "{line}")?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let input = load_input(&cli)
        .with_context(|| format!("Could not read DoE input '{}'", cli.doe_file.display()))?;

    let assembly = viscad::build_assembly(&input, &settings);
    let (svg_path, pdf_path) = output_paths(&cli);
    if let Some(dir) = svg_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(&svg_path, export_library_svg(&assembly, &settings))
        .with_context(|| format!("Could not write SVG output '{}'", svg_path.display()))?;
    tracing::info!(
        constructs = assembly.diagrams.len(),
        omitted = assembly.failures.len(),
        svg = %svg_path.display(),
        "drawing written"
    );

    if !cli.no_pdf {
        let timeout = Duration::from_secs(cli.timeout);
        external::convert_svg_to_pdf(&svg_path, &pdf_path, timeout)?;
        if cli.report {
            let template = match &cli.template {
                Some(path) => fs::read_to_string(path)
                    .with_context(|| format!("Could not read template '{}'", path.display()))?,
                None => external::DEFAULT_REPORT_TEMPLATE.to_string(),
            };
            let tex = external::write_report_tex(&pdf_path, &cli.design, cli.size, &template)?;
            external::typeset_report(&tex, timeout)?;
        }
    }

    if let Some(log) = &cli.log {
        append_log(log)?;
    }

    if cli.json {
        let text = serde_json::to_string_pretty(&summarize(&assembly, &svg_path))
            .context("Could not serialize JSON output")?;
        println!("{text}");
    }
    if !assembly.failures.is_empty() {
        eprintln!(
            "{} construct(s) omitted from '{}'",
            assembly.failures.len(),
            svg_path.display()
        );
    }
    Ok(())
}
