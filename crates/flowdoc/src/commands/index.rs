//! `flowdoc index` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use flowdoc_config::{CliSettings, Config};
use flowdoc_model::Deadline;
use flowdoc_publish::{IndexReport, Indexer, IndexerConfig, PathPatterns};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the index command.
#[derive(Args, Default)]
pub(crate) struct IndexArgs {
    /// Publish directory (overrides config).
    #[arg(short, long)]
    docs_dir: Option<PathBuf>,

    /// Site base URL (overrides config).
    #[arg(long, env = "FLOWDOC_BASE_URL")]
    base_url: Option<String>,
}

impl IndexArgs {
    pub(crate) fn execute(self, config_path: Option<&Path>, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            docs_dir: self.docs_dir,
            base_url: self.base_url,
            ..CliSettings::default()
        };
        let config = Config::load(config_path, Some(&cli_settings))?;
        let deadline = Deadline::after(config.build.timeout());

        index_site(&config, deadline, output)?;
        output.success(&format!(
            "Indexed {}",
            config.output_resolved.docs_dir.display()
        ));
        Ok(())
    }
}

/// Write sitemap and search index of the publish directory.
///
/// Every broken link is printed before the run fails.
pub(super) fn index_site(config: &Config, deadline: Deadline, output: &Output) -> Result<IndexReport, CliError> {
    let search = &config.search_resolved;
    let indexer_config = IndexerConfig {
        exclude: PathPatterns::new(&search.exclude)?,
        documents_file: search.documents_file.clone(),
        variable: search.variable.clone(),
        library_url: search.library_url.clone(),
        ..IndexerConfig::new(config.require_base_url()?)
    }
    .load_script(&search.script)?;

    let report = Indexer::new(indexer_config)
        .with_deadline(deadline)
        .index_with(&config.output_resolved.docs_dir, &mut |broken| {
            output.warning(&format!("Broken link in {}: {}", broken.page, broken.link));
        })?;

    output.info(&format!(
        "Indexed {} pages, {} search documents",
        report.pages, report.documents
    ));
    Ok(report)
}
