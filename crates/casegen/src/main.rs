use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use casegen::{
    FsStorage, GenerationProgress, HandlebarsRenderer, JobFile, TemplateCatalog, generate_cases,
    init_logging,
};
use casegen_core::format::format_float;
use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;

#[derive(Parser, Debug)]
#[command(name = "casegen")]
#[command(about = "Generate batches of simulation cases from a parameterized template")]
struct Args {
    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the parameters of a template directory
    Params { template_dir: PathBuf },
    /// Show the batch a job file would produce without writing anything
    Plan {
        job: PathBuf,
        /// Number of cases to list
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Write every case of a job file
    Generate {
        job: PathBuf,
        /// Skip the confirmation prompt for large batches
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level, args.log_file.as_deref())?;

    match args.command {
        Command::Params { template_dir } => show_params(&template_dir),
        Command::Plan { job, limit } => show_plan(&job, limit),
        Command::Generate { job, yes } => generate(&job, yes),
    }
}

fn show_params(template_dir: &Path) -> color_eyre::Result<()> {
    let catalog = TemplateCatalog::open(template_dir)?;
    let params = catalog.params()?;
    let defaults = catalog.load_defaults().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring template defaults");
        Default::default()
    });
    let info = catalog.load_params_info();

    if params.is_empty() {
        println!("No parameters found in {}", catalog.template_path().display());
        return Ok(());
    }

    let width = params.iter().map(String::len).max().unwrap_or(0);
    for name in &params {
        let default = defaults.get(name).copied().unwrap_or(0.0);
        let mut line = format!("{name:<width$}  {}", format_float(default));
        if let Some(info) = info.get(name) {
            if info.name != *name {
                line.push_str(&format!("  [{}]", info.name));
            }
            if !info.description.is_empty() {
                line.push_str(&format!("  {}", info.description));
            }
        }
        println!("{line}");
    }
    Ok(())
}

fn show_plan(job_path: &Path, limit: usize) -> color_eyre::Result<()> {
    let request = JobFile::load(job_path)?.into_request()?;
    let plan = request.plan()?;

    println!("Template:  {}", request.template_dir.display());
    println!("Output:    {}", request.output_dir.display());
    println!("Cases:     {}", plan.len());
    for axis in plan.enabled_variables() {
        let badge = request
            .variables
            .get(&axis.name)
            .map(|field| field.badge_text())
            .unwrap_or_default();
        println!("  {:<16} {badge}", axis.name);
    }
    println!();

    for item in plan.iter().take(limit) {
        let params: Vec<String> = item
            .params
            .iter()
            .map(|(name, value)| format!("{name}={}", format_float(value)))
            .collect();
        println!(
            "{}  {}",
            casegen::case_dir_name(&request.prefix, item.index, plan.len()),
            params.join(" ")
        );
    }
    if plan.len() > limit {
        println!("... {} more", plan.len() - limit);
    }
    Ok(())
}

fn generate(job_path: &Path, yes: bool) -> color_eyre::Result<()> {
    let request = JobFile::load(job_path)?.into_request()?;
    let progress = GenerationProgress::default();

    // First Ctrl-C stops after the case in flight
    let handle = progress.clone();
    if let Err(e) = ctrlc::set_handler(move || handle.cancel()) {
        tracing::warn!(error = %e, "Could not install Ctrl-C handler");
    }

    let report = generate_cases(
        &request,
        &FsStorage,
        &HandlebarsRenderer::new(),
        &progress,
        |total| yes || confirm(total, request.warn_threshold),
    )
    .wrap_err_with(|| format!("job {}", job_path.display()))?;

    println!(
        "Created {} of {} case(s) in {}",
        report.created.len(),
        report.total,
        request.output_dir.display()
    );
    if report.cancelled {
        println!("Cancelled after {} of {} case(s)", progress.completed(), progress.total());
    }
    Ok(())
}

fn confirm(total: usize, threshold: usize) -> bool {
    print!("This will generate {total} cases (more than {threshold}). Continue? [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
