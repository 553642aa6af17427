//! CLI command definitions and handlers

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use exmat::{Existential, MaterializerConfig, MaterializingReasoner};
use exmat_classifier::{SaturationClassifier, SaturationClassifierFactory, SaturationConfig};
use exmat_owl::{Class, ClassExpression, ObjectProperty, OntologyManager};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "exmat")]
#[command(about = "Expression-materializing reasoner for OWL ontologies")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Ontology inputs shared by the reasoning commands
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct OntologyArgs {
    /// Ontology files (JSON triples); imports first, the last file is the root
    #[arg(short = 'O', long = "ontology", required = true)]
    pub ontologies: Vec<PathBuf>,

    /// Also materialize classes and relations of imported ontologies
    #[arg(long)]
    pub include_imports: bool,

    /// Skip the range axiom rewriting pass
    #[arg(long)]
    pub no_range_rewrite: bool,

    /// Saturation timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Materialize existential restrictions and print the synthetic classes
    Materialize {
        #[command(flatten)]
        input: OntologyArgs,

        /// Relations to materialize (all object properties when omitted)
        #[arg(short, long)]
        relation: Vec<String>,

        /// Output file for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Subsumptions between existential restrictions
    Subsumptions {
        #[command(flatten)]
        input: OntologyArgs,

        /// Relations to compute (all object properties of the root ontology when omitted)
        #[arg(short, long)]
        relation: Vec<String>,

        /// Output file for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Existential superclasses of `relation some class`
    Superclasses {
        #[command(flatten)]
        input: OntologyArgs,

        /// Filler class IRI
        #[arg(long)]
        class: String,

        /// Relation IRI
        #[arg(short, long)]
        relation: String,

        /// Direct superclasses only
        #[arg(long)]
        direct: bool,

        /// Include the restriction itself
        #[arg(long)]
        reflexive: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Fillers D with `class SubClassOf relation some D`
    Over {
        #[command(flatten)]
        input: OntologyArgs,

        /// Class IRI
        #[arg(long)]
        class: String,

        /// Relation IRI
        #[arg(short, long)]
        relation: String,

        /// Direct fillers only
        #[arg(long)]
        direct: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show system information
    Info,
}

/// Output format options
#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
}

/// Configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub materializer: MaterializerConfig,
    pub saturation: SaturationConfig,
}

impl CliConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Command-line flags take precedence over the file
    fn with_overrides(&self, input: &OntologyArgs) -> Self {
        let mut config = self.clone();
        if input.include_imports {
            config.materializer.include_imports = true;
        }
        if input.no_range_rewrite {
            config.materializer.rewrite_range_axioms = false;
        }
        if input.timeout_ms.is_some() {
            config.saturation.timeout_ms = input.timeout_ms;
        }
        config
    }
}

/// Command execution result
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Execute CLI commands
pub struct CommandExecutor {
    config: CliConfig,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::with_config(CliConfig::default())
    }

    pub fn with_config(config: CliConfig) -> Self {
        Self { config }
    }

    /// Execute a CLI command
    pub fn execute(&mut self, command: Commands) -> Result<CommandResult> {
        match command {
            Commands::Materialize { input, relation, output, format } => {
                self.execute_materialize(&input, &relation, output, format)
            }
            Commands::Subsumptions { input, relation, output, format } => {
                self.execute_subsumptions(&input, &relation, output, format)
            }
            Commands::Superclasses { input, class, relation, direct, reflexive, format } => {
                self.execute_superclasses(&input, &class, &relation, direct, reflexive, format)
            }
            Commands::Over { input, class, relation, direct, format } => {
                self.execute_over(&input, &class, &relation, direct, format)
            }
            Commands::Info => self.execute_info(),
        }
    }

    fn build_reasoner(&self, input: &OntologyArgs) -> Result<MaterializingReasoner<SaturationClassifier>> {
        let config = self.config.with_overrides(input);
        let mut manager = OntologyManager::new();
        let mut root = None;
        for path in &input.ontologies {
            let ontology = manager
                .load_file(path)
                .with_context(|| format!("Failed to load ontology from {}", path.display()))?;
            info!("Loaded {} axioms from {}", ontology.axioms.len(), path.display());
            root = Some(ontology);
        }
        let root = root.ok_or_else(|| anyhow!("At least one --ontology file must be specified"))?;

        let factory = SaturationClassifierFactory::new(config.saturation);
        MaterializingReasoner::new(root, &factory, config.materializer).context("Failed to create reasoner")
    }

    fn execute_materialize(
        &mut self,
        input: &OntologyArgs,
        relations: &[String],
        output: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let mut reasoner = self.build_reasoner(input)?;
        let report = if relations.is_empty() {
            reasoner.materialize_all()?
        } else {
            let relations: Vec<ObjectProperty> = relations.iter().map(ObjectProperty::new).collect();
            reasoner.materialize(&relations)?
        };

        let mut synthetic: Vec<_> = reasoner.registry().iter().collect();
        synthetic.sort();
        let classes: Vec<serde_json::Value> = synthetic
            .iter()
            .map(|(class, existential)| {
                serde_json::json!({
                    "iri": class.iri,
                    "label": class.label,
                    "relation": existential.relation,
                    "filler": existential.filler,
                })
            })
            .collect();

        let mut text = format!(
            "Materialized {} relations: {} synthetic classes, {} axioms\n",
            report.relations, report.classes_created, report.axioms_added
        );
        for (class, existential) in &synthetic {
            text.push_str(&format!("  {} = {} ({})\n", class.iri, existential, class.label));
        }

        let data = serde_json::json!({
            "report": report,
            "range_rewrite": reasoner.range_rewrite_report(),
            "synthetic_classes": classes,
            "axioms": reasoner.expanded_ontology().axioms(),
        });
        emit(&text, &data, &format, output.as_deref())?;

        Ok(CommandResult {
            success: true,
            message: format!("Created {} synthetic classes", report.classes_created),
            data: Some(data),
        })
    }

    fn execute_subsumptions(
        &mut self,
        input: &OntologyArgs,
        relations: &[String],
        output: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let mut reasoner = self.build_reasoner(input)?;
        let facts = if relations.is_empty() {
            reasoner.materialize_all()?;
            reasoner.existential_subsumptions_all()?
        } else {
            let relations: Vec<ObjectProperty> = relations.iter().map(ObjectProperty::new).collect();
            reasoner.materialize(&relations)?;
            reasoner.existential_subsumptions(&relations)?
        };

        let mut text = format!("Found {} existential subsumptions:\n", facts.len());
        for fact in &facts {
            text.push_str(&format!("  {} SubClassOf {}\n", fact.sub, fact.sup));
        }
        let data = serde_json::json!({ "subsumptions": facts });
        emit(&text, &data, &format, output.as_deref())?;

        Ok(CommandResult {
            success: true,
            message: format!("Found {} subsumptions", facts.len()),
            data: Some(data),
        })
    }

    fn execute_superclasses(
        &mut self,
        input: &OntologyArgs,
        class: &str,
        relation: &str,
        direct: bool,
        reflexive: bool,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let mut reasoner = self.build_reasoner(input)?;
        let relation = ObjectProperty::new(relation);
        let class = Class::from_iri(class);
        reasoner.materialize_one(&relation)?;

        let mut supers: Vec<Existential> = reasoner
            .existential_superclasses_of_reflexive(&class, &relation, direct, reflexive)?
            .into_iter()
            .collect();
        supers.sort();

        let mut text = format!("{} existential superclasses of {} some {}:\n", supers.len(), relation, class);
        for existential in &supers {
            text.push_str(&format!("  {}\n", existential));
        }
        let data = serde_json::json!({ "superclasses": supers });
        emit(&text, &data, &format, None)?;

        Ok(CommandResult {
            success: true,
            message: format!("Found {} superclasses", supers.len()),
            data: Some(data),
        })
    }

    fn execute_over(
        &mut self,
        input: &OntologyArgs,
        class: &str,
        relation: &str,
        direct: bool,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let mut reasoner = self.build_reasoner(input)?;
        let relation = ObjectProperty::new(relation);
        let ce = ClassExpression::Class(Class::from_iri(class));

        let mut fillers: Vec<Class> = reasoner
            .existential_superclasses_over(&ce, &relation, direct)?
            .into_iter()
            .collect();
        fillers.sort();

        let mut text = format!("{} fillers of {} over {}:\n", fillers.len(), ce, relation);
        for filler in &fillers {
            text.push_str(&format!("  {}\n", filler));
        }
        let data = serde_json::json!({ "fillers": fillers });
        emit(&text, &data, &format, None)?;

        Ok(CommandResult {
            success: true,
            message: format!("Found {} fillers", fillers.len()),
            data: Some(data),
        })
    }

    fn execute_info(&self) -> Result<CommandResult> {
        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "repository": env!("CARGO_PKG_REPOSITORY"),
            "classifier": "EL Saturation Classifier",
            "config": self.config,
        });

        let result = serde_json::to_string_pretty(&info)?;
        println!("{}", result);

        Ok(CommandResult {
            success: true,
            message: "System information".to_string(),
            data: Some(info),
        })
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Render in the requested format, then write to `output` or stdout
fn emit(text: &str, data: &serde_json::Value, format: &OutputFormat, output: Option<&Path>) -> Result<()> {
    let result = match format {
        OutputFormat::Text => text.trim_end().to_string(),
        OutputFormat::Json => serde_json::to_string(data)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(data)?,
    };

    if let Some(output_path) = output {
        std::fs::write(output_path, &result)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
    } else {
        println!("{}", result);
    }
    Ok(())
}
