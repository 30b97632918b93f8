use anyhow::{Context, Result};
use citegraph::analytics::{AnalyticsResult, NodeAnalytics, RankedNode};
use citegraph::config::{find_config_file, get_config, load_config, Config};
use citegraph::models::{BuildResult, GraphData};
use citegraph::sources::PubMedSource;
use citegraph::GraphService;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Attribute, Cell, Table};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// citegraph - build and analyse PubMed citation graphs around a seed article
#[derive(Parser, Debug)]
#[command(name = "citegraph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build and analyse citation graphs around a seed publication", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl the citation neighbourhood of a PubMed id
    Build {
        /// Seed PubMed id
        seed: String,

        /// Requested expansion depth (only direct neighbours are expanded)
        #[arg(long, default_value_t = 1)]
        max_depth: usize,

        /// Override the node budget
        #[arg(long)]
        max_articles: Option<usize>,
    },

    /// Crawl a seed, then print analytics for the graph or one node
    Analyze {
        /// Seed PubMed id
        seed: String,

        /// Show analytics of this node instead of the whole graph
        #[arg(long)]
        node: Option<String>,

        /// Override the node budget
        #[arg(long)]
        max_articles: Option<usize>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("citegraph={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("loading {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()?
    };

    let format = cli.output.resolve();

    match cli.command {
        Commands::Build {
            seed,
            max_depth,
            max_articles,
        } => {
            apply_budget(&mut config, max_articles)?;
            let service = service_for(&config)?;
            let Some((graph_id, result)) = crawl(&service, &seed, max_depth).await? else {
                return Ok(());
            };
            let data = service.get_data(&graph_id).await?;
            output_build(&result, &data, format)?;
        }

        Commands::Analyze {
            seed,
            node,
            max_articles,
        } => {
            apply_budget(&mut config, max_articles)?;
            let service = service_for(&config)?;
            let Some((graph_id, _)) = crawl(&service, &seed, 1).await? else {
                return Ok(());
            };

            match node {
                Some(node_id) => {
                    let analytics = service.get_node_analytics(&graph_id, &node_id).await?;
                    output_node(&analytics, format)?;
                }
                None => {
                    let analytics = service.get_analytics(&graph_id).await?;
                    output_analytics(&analytics, format)?;
                }
            }
        }

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn apply_budget(config: &mut Config, max_articles: Option<usize>) -> Result<()> {
    if let Some(max_articles) = max_articles {
        config.crawl.max_articles = max_articles;
        config.validate()?;
    }
    Ok(())
}

fn service_for(config: &Config) -> Result<GraphService> {
    let source = PubMedSource::from_config(config).context("creating PubMed client")?;
    Ok(GraphService::from_config(config, Arc::new(source)))
}

/// Create and build a graph; `None` when interrupted with Ctrl-C
async fn crawl(
    service: &GraphService,
    seed: &str,
    max_depth: usize,
) -> Result<Option<(String, BuildResult)>> {
    let summary = service.create_graph_auto(seed).await?;
    let build = service.spawn_build(&summary.graph_id, Some(max_depth));

    tokio::select! {
        joined = build => {
            let result = joined.context("build task panicked")??;
            Ok(Some((summary.graph_id, result)))
        }
        _ = tokio::signal::ctrl_c() => {
            let status = service.get_status(&summary.graph_id).await?;
            tracing::warn!(
                "interrupted after processing {} of {} attached articles",
                status.processed_articles,
                status.total_articles
            );
            Ok(None)
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn ranked(node: &Option<RankedNode>) -> String {
    node.as_ref()
        .map(|n| format!("{} ({:.4})", n.id, n.score))
        .unwrap_or_else(|| "-".to_string())
}

fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn output_build(result: &BuildResult, data: &GraphData, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let payload = serde_json::json!({ "result": result, "graph": data });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!(
        "Graph {}: {} ({} articles, {} relationships: {} references, {} citations{})",
        result.graph_id,
        result.status,
        result.total_articles,
        result.total_relationships,
        result.references,
        result.citations,
        if result.limit_reached {
            ", limit reached"
        } else {
            ""
        }
    );

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["PMID", "Title", "Authors", "Journal", "Date"]);
    for node in &data.nodes {
        let id = if node.is_seed {
            Cell::new(format!("{} (seed)", node.id)).add_attribute(Attribute::Bold)
        } else {
            Cell::new(&node.id)
        };
        table.add_row(vec![
            id,
            Cell::new(truncate(&node.title, 60)),
            Cell::new(truncate(&node.authors.join(", "), 30)),
            Cell::new(truncate(&node.journal, 30)),
            Cell::new(&node.pub_date),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn output_analytics(analytics: &AnalyticsResult, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(analytics)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Metric", "Value"]);

    if let Some(summary) = &analytics.summary {
        let metrics = &summary.key_metrics;
        table.add_row(vec!["Articles".to_string(), metrics.total_articles.to_string()]);
        table.add_row(vec!["Connections".to_string(), metrics.total_connections.to_string()]);
        table.add_row(vec!["Density".to_string(), format!("{:.4}", metrics.network_density)]);
        table.add_row(vec!["Weakly connected".to_string(), metrics.is_connected.to_string()]);
        table.add_row(vec!["Most influential".to_string(), ranked(&summary.most_influential_paper)]);
        table.add_row(vec!["Most bridging".to_string(), ranked(&summary.most_bridging_paper)]);
        table.add_row(vec![
            "Clustering coefficient".to_string(),
            optional(summary.clustering_coefficient.map(|c| format!("{:.4}", c))),
        ]);
        table.add_row(vec![
            "Communities".to_string(),
            optional(summary.research_communities),
        ]);
    }
    if let Some(paths) = &analytics.path_analysis {
        table.add_row(vec![
            "Average shortest path".to_string(),
            optional(paths.average_shortest_path.map(|a| format!("{:.3}", a))),
        ]);
        table.add_row(vec!["Diameter".to_string(), optional(paths.diameter)]);
    }
    if let Some(structure) = &analytics.network_structure {
        table.add_row(vec![
            "Reciprocity".to_string(),
            optional(structure.reciprocity.map(|r| format!("{:.4}", r))),
        ]);
        table.add_row(vec!["Hubs".to_string(), structure.node_types.hubs.join(", ")]);
        table.add_row(vec![
            "Authorities".to_string(),
            structure.node_types.authorities.join(", "),
        ]);
    }
    if let Some(insights) = &analytics.research_insights {
        let emerging: Vec<String> = insights
            .emerging_topics
            .iter()
            .map(|e| format!("{} (out {}, in {})", e.id, e.out_degree, e.in_degree))
            .collect();
        table.add_row(vec!["Emerging".to_string(), emerging.join(", ")]);
        table.add_row(vec!["Isolated".to_string(), insights.isolated_nodes.join(", ")]);
    }
    println!("{table}");
    Ok(())
}

fn output_node(node: &NodeAnalytics, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(node)?);
        return Ok(());
    }

    let score = |s: Option<f64>| optional(s.map(|v| format!("{:.4}", v)));
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec![
        Cell::new(format!("Node {}", node.node_id)).add_attribute(Attribute::Bold),
        Cell::new("Value"),
    ]);
    table.add_row(vec![
        "Degree (in/out)".to_string(),
        format!("{} ({}/{})", node.degree, node.in_degree, node.out_degree),
    ]);
    table.add_row(vec!["Cites".to_string(), node.successors.join(", ")]);
    table.add_row(vec!["Cited by".to_string(), node.predecessors.join(", ")]);
    table.add_row(vec!["Degree centrality".to_string(), score(node.degree_centrality_score)]);
    table.add_row(vec!["Betweenness".to_string(), score(node.betweenness_centrality_score)]);
    table.add_row(vec!["Closeness".to_string(), score(node.closeness_centrality_score)]);
    table.add_row(vec!["Eigenvector".to_string(), score(node.eigenvector_centrality_score)]);
    table.add_row(vec!["PageRank".to_string(), score(node.pagerank_score)]);
    table.add_row(vec!["Hub score".to_string(), score(node.hubs_score)]);
    table.add_row(vec!["Authority score".to_string(), score(node.authorities_score)]);
    println!("{table}");
    Ok(())
}
