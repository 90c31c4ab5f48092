use crate::config::GeneratorConfig;
use crate::generator::{extract_endpoints, generate_document, DocumentOptions};
use crate::serializer::{
    render_endpoint_table, render_operation_table, serialize_json, serialize_yaml, write_to_file,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Go OpenAPI Generator - OpenAPI documents and endpoint inventories from Go controllers
#[derive(Parser, Debug)]
#[command(name = "openapi-from-go")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every registered HTTP endpoint
    Endpoints {
        #[command(flatten)]
        common: CommonArgs,

        /// Output format
        #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Generate the OpenAPI document
    Spec {
        #[command(flatten)]
        common: CommonArgs,

        /// Output format
        #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
        format: OutputFormat,

        /// Document title (derived from a single --ms filter or the config when absent)
        #[arg(long)]
        title: Option<String>,

        /// Document version
        #[arg(long = "api-version", default_value = "1.0.0")]
        api_version: String,

        /// Document description
        #[arg(long, default_value = "Auto-generated API documentation")]
        description: String,
    },
}

/// Flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to the Go project root (defaults to the current directory)
    #[arg(short = 'p', long = "project", value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Only analyze microservices whose directory name contains NAME (repeatable)
    #[arg(long = "ms", value_name = "NAME")]
    pub microservices: Vec<String>,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    #[value(alias = "yml")]
    Yaml,
    /// JSON format
    Json,
    /// Aligned text table
    Table,
}

impl CliArgs {
    pub fn common(&self) -> &CommonArgs {
        match &self.command {
            Command::Endpoints { common, .. } | Command::Spec { common, .. } => common,
        }
    }

    pub fn verbose(&self) -> bool {
        self.common().verbose
    }
}

/// Resolves and validates the project root.
pub fn project_root(common: &CommonArgs) -> Result<PathBuf> {
    let root = match &common.project {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to determine the working directory")?,
    };

    if !root.exists() {
        anyhow::bail!("Project path does not exist: {}", root.display());
    }
    if !root.is_dir() {
        anyhow::bail!("Project path is not a directory: {}", root.display());
    }
    Ok(root)
}

/// Run the selected subcommand
pub fn run(args: CliArgs) -> Result<()> {
    debug!("Parsed arguments: {:?}", args);
    let common = args.common();
    let root = project_root(common)?;
    info!("Project path: {}", root.display());

    let config = GeneratorConfig::load(&root)
        .with_context(|| format!("Failed to load configuration from {}", root.display()))?;
    debug!("Configuration: {:?}", config);

    let content = match &args.command {
        Command::Endpoints { format, .. } => {
            let endpoints = extract_endpoints(&root, &config, &common.microservices);
            info!("Serializing {} endpoints as {:?}", endpoints.len(), format);
            match format {
                OutputFormat::Yaml => serialize_yaml(&endpoints)?,
                OutputFormat::Json => serialize_json(&endpoints)?,
                OutputFormat::Table => render_endpoint_table(&endpoints),
            }
        }
        Command::Spec {
            format,
            title,
            api_version,
            description,
            ..
        } => {
            let options = DocumentOptions {
                title: title.clone(),
                version: api_version.clone(),
                description: Some(description.clone()),
                filters: common.microservices.clone(),
            };
            let document = generate_document(&root, &config, &options);
            info!(
                "Serializing {} operations as {:?}",
                document.operation_count(),
                format
            );
            match format {
                OutputFormat::Yaml => serialize_yaml(&document)?,
                OutputFormat::Json => serialize_json(&document)?,
                OutputFormat::Table => render_operation_table(&document),
            }
        }
    };

    emit(&content, common.output.as_deref())
}

fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            info!("Writing output to: {}", path.display());
            write_to_file(content, path)?;
            info!("Successfully wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_spec_defaults() {
        let args = CliArgs::try_parse_from(["openapi-from-go", "spec"]).unwrap();
        match args.command {
            Command::Spec {
                common,
                format,
                title,
                api_version,
                description,
            } => {
                assert_eq!(format, OutputFormat::Yaml);
                assert_eq!(title, None);
                assert_eq!(api_version, "1.0.0");
                assert_eq!(description, "Auto-generated API documentation");
                assert!(common.project.is_none());
                assert!(common.microservices.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_endpoints_defaults_to_json() {
        let args = CliArgs::try_parse_from(["openapi-from-go", "endpoints", "-v"]).unwrap();
        assert!(args.verbose());
        match args.command {
            Command::Endpoints { format, .. } => assert_eq!(format, OutputFormat::Json),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_yml_alias_and_repeated_ms() {
        let args = CliArgs::try_parse_from([
            "openapi-from-go",
            "spec",
            "--format",
            "yml",
            "--ms",
            "orders",
            "--ms",
            "billing",
            "-p",
            "/tmp/project",
        ])
        .unwrap();
        assert_eq!(args.common().microservices, vec!["orders", "billing"]);
        assert_eq!(args.common().project, Some(PathBuf::from("/tmp/project")));
        match args.command {
            Command::Spec { format, .. } => assert_eq!(format, OutputFormat::Yaml),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(CliArgs::try_parse_from(["openapi-from-go", "spec", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_project_root_validation() {
        let temp_dir = TempDir::new().unwrap();
        let common = CommonArgs {
            project: Some(temp_dir.path().join("missing")),
            microservices: vec![],
            output: None,
            verbose: false,
        };
        assert!(project_root(&common).is_err());

        let common = CommonArgs {
            project: Some(temp_dir.path().to_path_buf()),
            ..common
        };
        assert_eq!(project_root(&common).unwrap(), temp_dir.path());
    }

    #[test]
    fn test_run_writes_output_file() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out/openapi.json");
        let args = CliArgs::try_parse_from([
            "openapi-from-go",
            "spec",
            "-f",
            "json",
            "-p",
            temp_dir.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();

        run(args).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["openapi"], "3.0.0");
        assert_eq!(value["info"]["title"], "API");
    }
}
