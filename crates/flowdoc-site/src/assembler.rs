//! Two-pass site assembly.

use std::fs;
use std::path::{Path, PathBuf};

use flowdoc_model::{
    ActionNode, ActionTree, Breadcrumb, Deadline, Diagnostic, PageNode, Relation,
};
use flowdoc_nav::{LocationResolver, Locations, NavError, TREE_ELEMENT_ID, TreeBuilder};
use rayon::prelude::*;

use crate::{
    ContentRenderer, EntrySource, Manifest, PageRenderer, RenderContext, SiteError, Staging,
    escape_html,
};

/// A persisted page waiting to be rendered to HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageJob {
    /// Persisted page (`<pages>/<id>.json`).
    pub page_file: PathBuf,
}

impl PageJob {
    /// Rendered page (`<pages>/<id>.html`).
    #[must_use]
    pub fn output(&self) -> PathBuf {
        self.page_file.with_extension("html")
    }

    /// Find every persisted page in `pages_dir`, sorted by file name.
    pub fn discover(pages_dir: &Path) -> Result<Vec<Self>, SiteError> {
        let mut jobs = Vec::new();
        for entry in fs::read_dir(pages_dir).map_err(SiteError::io(pages_dir))? {
            let path = entry.map_err(SiteError::io(pages_dir))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                jobs.push(Self { page_file: path });
            }
        }
        jobs.sort_by(|a, b| a.page_file.cmp(&b.page_file));
        Ok(jobs)
    }

    fn run(&self, renderer: &dyn PageRenderer) -> Result<PathBuf, SiteError> {
        let page = PageNode::load(&self.page_file)?;
        let dir = self.page_file.parent().unwrap_or(Path::new("."));

        let mut content = String::new();
        for reference in &page.content {
            let path = reference.resolve(dir);
            content.push_str(&fs::read_to_string(&path).map_err(SiteError::io(&path))?);
        }

        let output = self.output();
        fs::write(&output, renderer.render(&page, &content)?).map_err(SiteError::io(&output))?;
        tracing::debug!(page = %page.id, location = %page.location, "Rendered page");
        Ok(output)
    }
}

/// Result of the first assembly pass.
#[derive(Debug)]
pub struct Assembly {
    pub manifest: Manifest,
    /// Page render queue for the second pass.
    pub jobs: Vec<PageJob>,
}

/// Drives the first assembly pass over an action tree.
pub struct SiteAssembler<'a> {
    name: String,
    staging: Staging,
    renderer: &'a dyn ContentRenderer,
    deadline: Deadline,
}

impl<'a> SiteAssembler<'a> {
    /// Create an assembler for the container `name`.
    pub fn new(name: impl Into<String>, staging: Staging, renderer: &'a dyn ContentRenderer) -> Self {
        Self {
            name: name.into(),
            staging,
            renderer,
            deadline: Deadline::none(),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Path of the persisted manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.staging.root().join(format!("{}.json", self.name))
    }

    /// Pass 1: stage content, persist pages and build the manifest.
    ///
    /// Every page action gets one page. Its content is the action's own
    /// content followed by the content of its sections, each under an anchor
    /// equal to the section id. Sections never get pages of their own, but
    /// page actions nested under a section do.
    ///
    /// # Errors
    ///
    /// Fails before writing anything if the tree does not validate, and on the
    /// first rendering or I/O failure afterwards.
    pub fn assemble(&self, tree: &ActionTree) -> Result<Assembly, SiteError> {
        tree.ensure_valid()?;
        self.staging.prepare()?;

        let locations = Locations::compute(tree.root());
        let mut pass = Pass {
            assembler: self,
            root: tree.root(),
            builder: TreeBuilder::new(&locations),
            locations: &locations,
            pages_dir: self.staging.pages_dir(),
            manifest: Manifest::new(&self.name),
            jobs: Vec::new(),
        };
        pass.visit(tree.root(), false, &mut Vec::new())?;

        let Pass { manifest, jobs, .. } = pass;
        manifest.save(&self.manifest_path())?;
        tracing::info!(
            name = %self.name,
            pages = jobs.len(),
            "Assembled site"
        );
        Ok(Assembly { manifest, jobs })
    }
}

struct Pass<'p, 'a> {
    assembler: &'p SiteAssembler<'a>,
    root: &'p ActionNode,
    builder: TreeBuilder<'p, Locations>,
    locations: &'p Locations,
    pages_dir: PathBuf,
    manifest: Manifest,
    jobs: Vec<PageJob>,
}

impl<'p> Pass<'p, '_> {
    fn visit(
        &mut self,
        node: &'p ActionNode,
        section: bool,
        ancestors: &mut Vec<&'p ActionNode>,
    ) -> Result<(), SiteError> {
        self.assembler.deadline.check("assemble")?;

        // Sections are inlined into the owning page by `stage_sections`.
        if node.is_page() && !section {
            self.stage_page(node, ancestors)?;
        }

        ancestors.push(node);
        for (relation, children) in node.containments() {
            for child in children {
                self.visit(child, relation == Relation::Sections, ancestors)?;
            }
        }
        ancestors.pop();
        Ok(())
    }

    fn stage_page(&mut self, node: &ActionNode, ancestors: &[&ActionNode]) -> Result<(), SiteError> {
        let location = self
            .locations
            .location(&node.id)
            .ok_or_else(|| NavError::UnresolvedLocation {
                id: node.id.clone(),
                text: node.text.clone(),
            })?;

        let nav = self.builder.build(self.root, location)?;
        let ctx = RenderContext::new(location, &nav);
        let staging = &self.assembler.staging;

        let mut page = PageNode::new(&node.id, &node.text, location);
        let body = self.assembler.renderer.render(node, &ctx)?;
        page.content.push(staging.write_content(&node.id, &body)?);
        self.stage_sections(node, &ctx, &mut page, 2)?;

        page.breadcrumbs = ancestors
            .iter()
            .map(|ancestor| Breadcrumb {
                text: ancestor.text.clone(),
                location: self.locations.resolve(ancestor, location),
            })
            .collect();
        page.navigation = nav.binding_script(TREE_ELEMENT_ID)?;

        let job = PageJob {
            page_file: page.save(&self.pages_dir)?,
        };
        self.manifest.push(
            node.text.clone(),
            location,
            EntrySource::Staged { path: job.output() },
        );
        self.jobs.push(job);
        Ok(())
    }

    fn stage_sections(
        &self,
        node: &ActionNode,
        ctx: &RenderContext<'_>,
        page: &mut PageNode,
        level: usize,
    ) -> Result<(), SiteError> {
        let level = level.min(6);
        for section in &node.sections {
            let body = self.assembler.renderer.render(section, ctx)?;
            let mut bytes = format!(
                "<section id=\"{id}\" class=\"fd-section\">\n<h{level}>{text}</h{level}>\n",
                id = escape_html(&section.id),
                text = escape_html(&section.text),
            )
            .into_bytes();
            bytes.extend_from_slice(&body);
            bytes.extend_from_slice(b"\n</section>\n");

            page.content.push(self.assembler.staging.write_content(&section.id, &bytes)?);
            self.stage_sections(section, ctx, page, level + 1)?;
        }
        Ok(())
    }
}

/// Pass 2: render every queued page to HTML on `workers` threads.
///
/// Failures of individual pages are collected, so the error reports every
/// failed page rather than only the first.
///
/// # Errors
///
/// Returns [`SiteError::Diagnostic`] listing failed pages, or
/// [`SiteError::Cancelled`] if the deadline expires.
pub fn render_pages(
    jobs: &[PageJob],
    renderer: &dyn PageRenderer,
    workers: usize,
    deadline: Deadline,
) -> Result<usize, SiteError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()?;

    let results: Vec<Result<PathBuf, SiteError>> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                deadline.check("render pages")?;
                job.run(renderer)
            })
            .collect()
    });

    let mut diagnostic = Diagnostic::ok("Page rendering");
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(_) => {}
            Err(SiteError::Cancelled(cancelled)) => return Err(cancelled.into()),
            Err(err) => diagnostic.push(
                Diagnostic::error(err.to_string()).with_source(job.page_file.display().to_string()),
            ),
        }
    }
    if diagnostic.is_error() {
        return Err(SiteError::Diagnostic {
            step: "Page rendering".to_owned(),
            diagnostic,
        });
    }

    tracing::info!(pages = jobs.len(), workers, "Rendered pages");
    Ok(jobs.len())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use flowdoc_model::{ActionKind, ModelError};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{FsContainer, MarkdownContentRenderer, TemplatePageRenderer, materialize};

    fn tree() -> ActionTree {
        let mut tree = ActionTree::new(
            ActionNode::new("root", "Demo")
                .with_kind(ActionKind::Container)
                .with(
                    Relation::Children,
                    ActionNode::new("home", "Home")
                        .with_content("Welcome. See [guide](${base-uri}guide/index.html).")
                        .with(
                            Relation::Sections,
                            ActionNode::new("details", "Details").with_content("Section body"),
                        )
                        .with(
                            Relation::Children,
                            ActionNode::new("guide", "Guide")
                                .with_location("guide/index.html")
                                .with_content("Guide body"),
                        ),
                ),
        );
        tree.set_home();
        tree.append_child(ActionNode::new("search", "Search").with_location("search.html"));
        tree
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_assemble_stages_pages_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = MarkdownContentRenderer;
        let assembler = SiteAssembler::new("flow", Staging::new(dir.path()), &renderer);

        let assembly = assembler.assemble(&tree()).unwrap();

        let locations: Vec<_> = assembly.manifest.entries.iter().map(|e| e.location.as_str()).collect();
        assert_eq!(
            locations,
            vec!["flow/index.html", "flow/guide/index.html", "flow/search.html"]
        );
        assert_eq!(assembly.jobs.len(), 3);
        assert!(assembly.jobs.iter().all(|job| job.page_file.is_file()));
        assert!(dir.path().join("content/home.html").is_file());
        assert!(dir.path().join("content/details.html").is_file());
        assert_eq!(Manifest::load(&assembler.manifest_path()).unwrap(), assembly.manifest);
    }

    #[test]
    fn test_page_node_carries_breadcrumbs_and_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = MarkdownContentRenderer;
        let assembler = SiteAssembler::new("flow", Staging::new(dir.path()), &renderer);

        let assembly = assembler.assemble(&tree()).unwrap();
        let guide = PageNode::load(&assembly.jobs[1].page_file).unwrap();

        assert_eq!(guide.action_id, "guide");
        assert_eq!(guide.location, "guide/index.html");
        assert_eq!(
            guide.breadcrumbs,
            vec![
                Breadcrumb { text: "Demo".to_owned(), location: None },
                Breadcrumb { text: "Home".to_owned(), location: Some("../index.html".to_owned()) },
            ]
        );
        assert!(guide.navigation.contains("\"href\":\"../search.html\""));
    }

    #[test]
    fn test_pages_nested_under_sections_are_staged() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = MarkdownContentRenderer;
        let assembler = SiteAssembler::new("flow", Staging::new(dir.path()), &renderer);
        let mut tree = ActionTree::new(
            ActionNode::new("root", "Demo")
                .with_kind(ActionKind::Container)
                .with(
                    Relation::Children,
                    ActionNode::new("home", "Home")
                        .with_content("See [deep](${base-uri}deep.html).")
                        .with(
                            Relation::Sections,
                            ActionNode::new("sec", "Sec")
                                .with(Relation::Children, ActionNode::new("deep", "Deep").with_content("Deep body")),
                        ),
                ),
        );
        tree.set_home();

        let assembly = assembler.assemble(&tree).unwrap();

        let locations: Vec<_> = assembly.manifest.entries.iter().map(|e| e.location.as_str()).collect();
        assert_eq!(locations, vec!["flow/index.html", "flow/deep.html"]);
        let deep = PageNode::load(&assembly.jobs[1].page_file).unwrap();
        assert_eq!(deep.action_id, "deep");
        assert_eq!(
            deep.breadcrumbs.last(),
            Some(&Breadcrumb { text: "Sec".to_owned(), location: Some("index.html#sec".to_owned()) })
        );
        assert_eq!(assembly.jobs.len(), 2);
    }

    #[test]
    fn test_two_passes_and_materialize() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path().join("staging"));
        let renderer = MarkdownContentRenderer;
        let assembler = SiteAssembler::new("flow", staging, &renderer);
        let assembly = assembler.assemble(&tree()).unwrap();

        let rendered = render_pages(
            &assembly.jobs,
            &TemplatePageRenderer::default(),
            2,
            Deadline::none(),
        )
        .unwrap();
        let site = FsContainer::new(dir.path().join("site"));
        materialize(&assembly.manifest, &site, Deadline::none()).unwrap();

        assert_eq!(rendered, 3);
        let home = read(&dir.path().join("site/flow/index.html"));
        assert!(home.contains("<a href=\"guide/index.html\">guide</a>"));
        assert!(home.contains("<section id=\"details\" class=\"fd-section\">\n<h2>Details</h2>"));
        assert!(home.find("Welcome") < home.find("Section body"));
        assert!(read(&dir.path().join("site/flow/guide/index.html")).contains("Guide body"));
        assert!(dir.path().join("site/flow/search.html").is_file());
    }

    #[test]
    fn test_pass_two_from_discovered_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());
        let renderer = MarkdownContentRenderer;
        let assembly = SiteAssembler::new("flow", staging.clone(), &renderer)
            .assemble(&tree())
            .unwrap();

        let mut discovered = PageJob::discover(&staging.pages_dir()).unwrap();
        let mut queued = assembly.jobs;
        discovered.sort_by(|a, b| a.page_file.cmp(&b.page_file));
        queued.sort_by(|a, b| a.page_file.cmp(&b.page_file));
        assert_eq!(discovered, queued);

        render_pages(&discovered, &TemplatePageRenderer::default(), 1, Deadline::none()).unwrap();
        assert!(discovered.iter().all(|job| job.output().is_file()));
    }

    #[test]
    fn test_invalid_tree_aborts_before_staging() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = MarkdownContentRenderer;
        let assembler = SiteAssembler::new("flow", Staging::new(dir.path()), &renderer);
        let tree = ActionTree::new(
            ActionNode::new("root", "Root")
                .with(Relation::Children, ActionNode::new("a", "A"))
                .with(Relation::Children, ActionNode::new("a", "B")),
        );

        let err = assembler.assemble(&tree).unwrap_err();

        assert!(matches!(err, SiteError::Model(ModelError::Validation(_))));
        assert!(err.diagnostic().is_some());
        assert!(!dir.path().join("pages").exists());
    }

    #[test]
    fn test_missing_content_is_reported_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path());
        let renderer = MarkdownContentRenderer;
        let assembly = SiteAssembler::new("flow", staging.clone(), &renderer)
            .assemble(&tree())
            .unwrap();
        fs::remove_file(staging.content_dir().join("guide.html")).unwrap();

        let err = render_pages(&assembly.jobs, &TemplatePageRenderer::default(), 2, Deadline::none())
            .unwrap_err();

        let SiteError::Diagnostic { diagnostic, .. } = err else {
            panic!("expected a diagnostic error");
        };
        assert_eq!(diagnostic.children.len(), 1);
    }

    #[test]
    fn test_expired_deadline_cancels_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = MarkdownContentRenderer;
        let assembler = SiteAssembler::new("flow", Staging::new(dir.path()), &renderer)
            .with_deadline(Deadline::after(Duration::ZERO));

        let err = assembler.assemble(&tree()).unwrap_err();

        assert!(matches!(err, SiteError::Cancelled(_)));
    }
}
