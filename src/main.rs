use clap::{Parser, Subcommand};
use sitemake::config::{self, SiteConfig};
use sitemake::pipeline::Pipeline;
use sitemake::project::{self, Project};
use sitemake::{output, scan};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that work on one project.
#[derive(clap::Args, Clone)]
struct ProjectArgs {
    /// Project (sub-directory of the source root); asked for when omitted
    #[arg(long, short)]
    project: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
#[command(name = "sitemake")]
#[command(about = "Static site generator for Markdown, reStructuredText and annotated Python notes")]
#[command(long_about = "\
Static site generator for Markdown, reStructuredText and annotated Python notes

Each sub-directory of the source root is a project. Building a project
mirrors its tree into <output>/<project>/, turning every .md, .rst and .py
file into an .html page wrapped in the base template.

Project structure:

  source/
  └── notes/
      ├── intro.md              → output/notes/intro.html
      ├── setup.py              → output/notes/setup.html (docstrings as prose)
      ├── .draft/               # Hidden: never published
      └── guide/
          └── usage.rst         → output/notes/guide/usage.html

The output directory of a project is deleted and rebuilt on every run.
The built-in template links /style.css and /script.js, so serve
<output>/<project>/ as the web root to view the site.

Run 'sitemake gen-config' to generate a documented sitemake.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Source root (overrides the config file)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output root (overrides the config file)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Template directory with base.html, style.css and script.js
    #[arg(long, global = true)]
    template_dir: Option<PathBuf>,

    /// Log each stage and page
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: scan → erase → layout → render → index
    Build(ProjectArgs),
    /// Scan a project and show what would be built
    Check(ProjectArgs),
    /// List the projects in the source root
    List,
    /// Print a stock sitemake.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted");
        std::process::exit(130);
    })?;

    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::List => {
            let site_config = load_site_config(&cli)?;
            let projects = project::discover(&site_config.source_root)?;
            output::print_project_list(&projects);
        }
        Command::Check(args) => {
            let site_config = load_site_config(&cli)?;
            let project = select_project(&site_config, args.project.as_deref())?;
            let map = scan::scan(&project.path)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                output::print_scan_output(&map, &project.path);
            }
        }
        Command::Build(args) => {
            let site_config = load_site_config(&cli)?;
            let project = select_project(&site_config, args.project.as_deref())?;
            let report = Pipeline::new(&site_config, &project)?.run()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_build_output(&report);
            }
            if !report.failures.is_empty() {
                return Err(format!("{} page(s) failed to render", report.failures.len()).into());
            }
        }
    }

    Ok(())
}

/// `--verbose` forces `info`; otherwise `RUST_LOG`, falling back to `warn`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file values with the path flags layered on top.
fn load_site_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let overrides = config::path_overrides(
        cli.source.as_deref(),
        cli.output.as_deref(),
        cli.template_dir.as_deref(),
    );
    config::load_config(&cli.config, overrides)
}

/// Resolve `--project`, or ask when it is missing (menu on stderr so
/// `--json` output stays clean).
fn select_project(
    site_config: &SiteConfig,
    name: Option<&str>,
) -> Result<Project, project::ProjectError> {
    let candidates = project::discover(&site_config.source_root)?;
    match name {
        Some(name) => project::find(&candidates, name),
        None => project::prompt(
            &candidates,
            &mut std::io::stdin().lock(),
            &mut std::io::stderr(),
        ),
    }
}
