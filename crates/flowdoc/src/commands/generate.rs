//! `flowdoc generate` command implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use flowdoc_config::{CliSettings, Config};
use flowdoc_model::{ActionTree, Deadline, PageTemplate};
use flowdoc_publish::{IndexReport, PathPatterns, Publisher};
use flowdoc_site::{
    FsContainer, MarkdownContentRenderer, SiteAssembler, Staging, TemplatePageRenderer, materialize,
    render_pages,
};

use super::index::index_site;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the generate command.
#[derive(Args, Default)]
pub(crate) struct GenerateArgs {
    /// Publish directory (overrides config).
    #[arg(short, long)]
    docs_dir: Option<PathBuf>,

    /// Site base URL (overrides config).
    #[arg(long, env = "FLOWDOC_BASE_URL")]
    base_url: Option<String>,

    /// Number of page rendering threads (overrides config).
    #[arg(short, long)]
    workers: Option<usize>,
}

impl GenerateArgs {
    pub(crate) fn execute(self, config_path: Option<&Path>, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            docs_dir: self.docs_dir,
            base_url: self.base_url,
            workers: self.workers,
        };
        let config = Config::load(config_path, Some(&cli_settings))?;

        generate(&config, output)?;
        output.success(&format!(
            "Site generated to {}",
            config.output_resolved.docs_dir.display()
        ));
        Ok(())
    }
}

/// Run the whole pipeline: clean, assemble, render, publish, index.
fn generate(config: &Config, output: &Output) -> Result<IndexReport, CliError> {
    config.require_base_url()?;
    let deadline = Deadline::after(config.build.timeout());
    let publisher = Publisher::new(PathPatterns::new(&config.output_resolved.keep)?).with_deadline(deadline);
    let docs_dir = &config.output_resolved.docs_dir;

    output.highlight("Building site model");
    let started = Instant::now();
    publisher.clean(docs_dir)?;

    let tree = load_tree(config)?;
    let template = load_template(&config.model_resolved.page_template)?;
    let renderer = MarkdownContentRenderer;
    let assembly = SiteAssembler::new(
        &config.site.name,
        Staging::new(&config.output_resolved.staging_dir),
        &renderer,
    )
    .with_deadline(deadline)
    .assemble(&tree)?;
    render_pages(
        &assembly.jobs,
        &TemplatePageRenderer::new(template),
        config.build.workers,
        deadline,
    )?;

    let site_dir = config.output_resolved.site_dir();
    if site_dir.exists() {
        fs::remove_dir_all(&site_dir)?;
    }
    let written = materialize(&assembly.manifest, &FsContainer::new(&site_dir), deadline)?;
    output.info(&format!(
        "Model stage: {written} files in {:.2?}",
        started.elapsed()
    ));

    output.highlight("Publishing");
    let started = Instant::now();
    let summary = publisher.publish(&config.publish_source(), docs_dir)?;
    output.info(&format!(
        "Copied {} files, deleted {} stale entries",
        summary.copied, summary.deleted
    ));
    let report = index_site(config, deadline, output)?;
    output.info(&format!("Publishing stage: {:.2?}", started.elapsed()));
    output.separator();
    Ok(report)
}

/// Load the action tree with the search action appended and the home page set.
fn load_tree(config: &Config) -> Result<ActionTree, CliError> {
    let mut tree = ActionTree::load(&config.model_resolved.actions)?;
    if let Some(path) = &config.model_resolved.search_action {
        tree.append_child(ActionTree::load_node(path)?);
    }
    tree.set_home();
    Ok(tree)
}

fn load_template(path: &Path) -> Result<PageTemplate, CliError> {
    if path.is_file() {
        return Ok(PageTemplate::load(path)?);
    }
    tracing::warn!(path = %path.display(), "Page template not found, using defaults");
    Ok(PageTemplate::default())
}
