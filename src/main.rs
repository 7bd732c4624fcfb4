use clap::{Parser, Subcommand};
use folio_lightbox::page::Page;
use folio_lightbox::sim::{Resolver, SimPlatform};
use folio_lightbox::types::ProjectCatalog;
use folio_lightbox::{assets, config, markup, output, script};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio-lightbox")]
#[command(about = "Gallery lightbox and lazy loader for portfolio sites")]
#[command(long_about = "\
Gallery lightbox and lazy loader for portfolio sites

The lightbox reads a projects.json catalog keyed by project id:

  {
    \"riverside\": {
      \"name\": \"Riverside House\",
      \"type\": \"new-construction\",
      \"images\": [\"/img/riverside/01.jpg\", \"/img/riverside/02.jpg\"],
      \"heroImage\": \"/img/riverside/02.jpg\"
    }
  }

The hero image, when it is one of the project's images, opens first.

Commands:
  check       audit the catalog and, with --images, decode every image
  replay      play a session script against a simulated browser
  markup      render the modal or the whole portfolio page
  gen-config  print a documented lightbox.toml

Set RUST_LOG (e.g. RUST_LOG=folio_lightbox=debug) for diagnostics on stderr.")]
#[command(version)]
struct Cli {
    /// Lightbox configuration file; missing means stock defaults
    #[arg(long, default_value = "lightbox.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Audit the project catalog and its image files
    Check {
        /// Project catalog
        #[arg(long, default_value = "projects.json")]
        projects: PathBuf,
        /// Site root that image sources resolve against
        #[arg(long)]
        images: Option<PathBuf>,
        /// Decoder threads (defaults to all cores)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Replay a session script and print what the page did
    Replay {
        /// Project catalog
        #[arg(long, default_value = "projects.json")]
        projects: PathBuf,
        /// Session script, one step per line
        #[arg(long)]
        script: PathBuf,
        /// Decode real files under this root instead of assuming every image loads
        #[arg(long)]
        images: Option<PathBuf>,
        /// Include probes, timers, and load states in the transcript
        #[arg(long)]
        verbose: bool,
    },
    /// Render markup for one project modal or the portfolio page
    Markup {
        /// Project catalog
        #[arg(long, default_value = "projects.json")]
        projects: PathBuf,
        /// Render only this project's modal
        #[arg(long)]
        project: Option<String>,
    },
    /// Print a stock lightbox.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Check {
            projects,
            images,
            threads,
        } => {
            let catalog = ProjectCatalog::load(&projects)?;
            let audits = catalog.audit();
            match images {
                Some(root) => {
                    init_thread_pool(threads);
                    let sources = catalog.all_sources();
                    let checks = assets::verify_images(&root, &sources);
                    let orphans = assets::unreferenced_files(&root, &sources)?;
                    output::print_check(&audits, Some(&checks), Some(&orphans));
                    let failed = checks.iter().filter(|c| !c.is_ok()).count();
                    if failed > 0 {
                        return Err(format!("{failed} image(s) failed to load").into());
                    }
                }
                None => output::print_check(&audits, None, None),
            }
        }
        Command::Replay {
            projects,
            script: script_path,
            images,
            verbose,
        } => {
            let lightbox = config::load_config(&cli.config)?;
            let catalog = ProjectCatalog::load(&projects)?;
            let steps = script::load_script(&script_path)?;
            let mut page = Page::new(simulator(images.as_deref()), lightbox);
            page.set_projects_data(catalog);
            let reports = script::run_script(&mut page, &steps);
            output::print_transcript(&reports, verbose);
        }
        Command::Markup { projects, project } => {
            let lightbox = config::load_config(&cli.config)?;
            let catalog = ProjectCatalog::load(&projects)?;
            let html = match project {
                Some(id) => {
                    let project = catalog
                        .get(&id)
                        .ok_or_else(|| format!("no project '{id}' in {}", projects.display()))?;
                    markup::project_modal(project, &lightbox.lazy)
                }
                None => markup::portfolio_page(&catalog),
            };
            println!("{}", html.into_string());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so they never mix with command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool. Caps at the number of available cores.
fn init_thread_pool(requested: Option<usize>) {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let threads = requested.map_or(cores, |n| n.clamp(1, cores));
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn simulator(images: Option<&Path>) -> SimPlatform {
    match images {
        Some(root) => SimPlatform::new().with_resolver(Resolver::Filesystem {
            root: root.to_path_buf(),
        }),
        None => SimPlatform::new(),
    }
}
