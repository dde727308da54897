//! reportgen CLI - per-student feedback reports from grader remarks

#![deny(warnings)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use reportgen_core::config;
use reportgen_core::{
    generate_reports, render_json, render_text, resolve, PipelineOptions, ResolvedConfig,
    ResponseDictionary, TracingSink,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reportgen")]
#[command(about = "Generate per-student HTML feedback reports from grader remarks")]
#[command(version = env!("REPORTGEN_VERSION"))]
struct Cli {
    /// Increase log verbosity (debug)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate reports for every assignment folder under INPUT_ROOT
    Generate {
        /// Directory containing one folder per assignment question
        input_root: PathBuf,

        /// Output directory (overrides config file, default: INPUT_ROOT/reports)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Manifest file name inside the output directory (overrides config file)
        #[arg(long)]
        manifest: Option<String>,

        /// Path to config file (default: auto-discover in INPUT_ROOT)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Summary output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Resolve the feedback for a single section against a response file
    Resolve {
        /// Path to a response.json file
        #[arg(long)]
        responses: PathBuf,

        /// Section name
        #[arg(long)]
        section: String,

        /// Grader remark (omit for an absent remark)
        #[arg(long)]
        remark: Option<String>,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without generating reports
    Validate {
        /// Input root to discover the config in (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Path to config file (default: auto-discover in the input root)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Input root to discover the config in (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Path to config file (default: auto-discover in the input root)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Generate {
            input_root,
            output,
            manifest,
            config: config_path,
            format,
        } => {
            let input_root = absolutize(input_root)?;
            if !input_root.is_dir() {
                anyhow::bail!("Input root does not exist: {}", input_root.display());
            }

            let resolved = config::load_and_resolve(&input_root, config_path.as_deref())
                .context("failed to load configuration")?;
            if let Some(path) = &resolved.config_path {
                tracing::info!("Using config: {}", path.display());
            }

            // CLI flags override config file values
            let mut options = PipelineOptions::from_config(&input_root, &resolved);
            if let Some(output) = output {
                options.output_root = absolutize(output)?;
            }
            if let Some(manifest) = manifest {
                let check = config::ReportgenConfig {
                    manifest: Some(manifest.clone()),
                    ..Default::default()
                };
                check.validate().context("invalid --manifest")?;
                options.manifest_name = manifest;
            }

            let summary = generate_reports(&options, &resolved, &TracingSink)?;

            match format {
                OutputFormat::Text => print!("{}", render_text(&summary)),
                OutputFormat::Json => println!("{}", render_json(&summary)),
            }
        }
        Commands::Resolve {
            responses,
            section,
            remark,
        } => {
            let dictionary = load_responses(&responses)?;
            println!(
                "{}",
                resolve(&section, remark.as_deref(), &dictionary, &TracingSink)
            );
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { root, path } => {
                let input_root = input_root_or_cwd(root)?;
                match config::load_and_resolve(&input_root, path.as_deref()) {
                    Ok(resolved) => {
                        if let Some(ref p) = resolved.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { root, path } => {
                let input_root = input_root_or_cwd(root)?;
                let resolved = config::load_and_resolve(&input_root, path.as_deref())
                    .context("failed to load configuration")?;
                print!("{}", render_config(&resolved, &input_root));
            }
        },
    }

    Ok(())
}

/// Human-readable view of a resolved config for an input root
fn render_config(resolved: &ResolvedConfig, input_root: &Path) -> String {
    let mut out = String::new();

    let source = match &resolved.config_path {
        Some(p) => p.display().to_string(),
        None => "defaults (no config file found)".to_string(),
    };
    let include = if resolved.include_patterns.is_empty() {
        "all folders".to_string()
    } else {
        resolved.include_patterns.join(", ")
    };
    let exclude_kind = if resolved.default_excludes {
        "default"
    } else {
        "custom"
    };

    out.push_str("Configuration:\n");
    out.push_str(&format!("  Source: {}\n\n", source));
    out.push_str("Output:\n");
    out.push_str(&format!(
        "  directory: {}\n",
        resolved.output_root(input_root).display()
    ));
    out.push_str(&format!("  manifest: {}\n", resolved.manifest_name));
    out.push_str(&format!("  title: {}\n\n", resolved.title));
    out.push_str("Folders:\n");
    out.push_str(&format!("  include: {}\n", include));
    out.push_str(&format!(
        "  exclude: {} ({})\n",
        resolved.exclude_patterns.join(", "),
        exclude_kind
    ));
    out
}

/// Install the stderr log subscriber; RUST_LOG overrides the flags
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_responses(path: &Path) -> anyhow::Result<ResponseDictionary> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn input_root_or_cwd(root: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match root {
        Some(root) => absolutize(root),
        None => Ok(std::env::current_dir()?),
    }
}

/// Normalize a path to absolute against the current directory
fn absolutize(path: PathBuf) -> anyhow::Result<PathBuf> {
    if path.is_relative() {
        Ok(std::env::current_dir()?.join(path))
    } else {
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportgen_core::config::ReportgenConfig;

    fn resolved(json: &str) -> ResolvedConfig {
        serde_json::from_str::<ReportgenConfig>(json)
            .unwrap()
            .resolve()
            .unwrap()
    }

    #[test]
    fn test_render_config_defaults() {
        let out = render_config(&resolved("{}"), Path::new("/data/assignments"));
        assert!(out.contains("  Source: defaults (no config file found)\n"));
        assert!(out.contains("  directory: /data/assignments/reports\n"));
        assert!(out.contains("  include: all folders\n"));
        assert!(out.contains("  exclude: output, reports, .* (default)\n"));
    }

    #[test]
    fn test_render_config_file_without_exclude_shows_default_excludes() {
        let mut config = resolved(r#"{"include": ["q*"], "title": "Capstone"}"#);
        config.config_path = Some(PathBuf::from("/data/assignments/.reportgenrc.json"));

        let out = render_config(&config, Path::new("/data/assignments"));
        assert!(out.contains("  Source: /data/assignments/.reportgenrc.json\n"));
        assert!(out.contains("  title: Capstone\n"));
        assert!(out.contains("  include: q*\n"));
        assert!(out.contains("  exclude: output, reports, .* (default)\n"));
    }

    #[test]
    fn test_render_config_custom_excludes() {
        let out = render_config(
            &resolved(r#"{"exclude": ["drafts", "old-*"], "output": "html"}"#),
            Path::new("/data/assignments"),
        );
        assert!(out.contains("  directory: /data/assignments/html\n"));
        assert!(out.contains("  exclude: drafts, old-* (custom)\n"));
    }

    #[test]
    fn test_config_show_accepts_root() {
        let cli = Cli::try_parse_from(["reportgen", "config", "show", "--root", "assignments"])
            .unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Show { root, path },
            } => {
                assert_eq!(root, Some(PathBuf::from("assignments")));
                assert!(path.is_none());
            }
            _ => panic!("expected config show"),
        }
    }
}
