//! End-to-end builds through the public API.
//!
//! Each test lays out `source/<project>/` in a temp directory, runs the
//! pipeline and inspects `output/<project>/`.

use sitemake::config::{CollisionPolicy, SiteConfig};
use sitemake::pipeline::{Pipeline, PipelineError, SiteReport, Stage};
use sitemake::project::{self, Project};
use sitemake::template::TemplateAssets;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

// =========================================================================
// Helpers
// =========================================================================

fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
    }
}

/// Relative `/`-separated paths of every file below `root`, sorted.
fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

struct Site {
    tmp: TempDir,
    config: SiteConfig,
}

impl Site {
    fn new(project_files: &[(&str, &str)]) -> Site {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("source/notes");
        fs::create_dir_all(&project).unwrap();
        write_tree(&project, project_files);
        let config = SiteConfig {
            source_root: tmp.path().join("source"),
            output_root: tmp.path().join("output"),
            ..SiteConfig::default()
        };
        Site { tmp, config }
    }

    fn project(&self) -> Project {
        let candidates = project::discover(&self.config.source_root).unwrap();
        project::find(&candidates, "notes").unwrap()
    }

    fn source(&self) -> std::path::PathBuf {
        self.tmp.path().join("source/notes")
    }

    fn out(&self) -> std::path::PathBuf {
        self.tmp.path().join("output/notes")
    }

    fn build(&self) -> Result<SiteReport, PipelineError> {
        let project = self.project();
        Pipeline::new(&self.config, &project)?.run()
    }

    fn page(&self, rel: &str) -> String {
        fs::read_to_string(self.out().join(rel)).unwrap()
    }
}

// =========================================================================
// Mirroring
// =========================================================================

#[test]
fn mirrors_project_into_output() {
    let site = Site::new(&[
        ("intro.md", "# Intro\n\nWelcome."),
        ("guide/usage.rst", "Usage\n=====\n\nRun it.\n"),
        ("guide/tool.py", "\"\"\"Helper script.\"\"\"\nprint('hi')\n"),
        ("todo.txt", "not a page"),
    ]);

    let report = site.build().unwrap();

    assert_eq!(report.stage, Stage::Done);
    assert_eq!(
        list_files(&site.out()),
        vec![
            "guide/tool.html",
            "guide/usage.html",
            "intro.html",
            "script.js",
            "style.css",
        ]
    );
    assert!(site.page("intro.html").contains("<h1>Intro</h1>"));
    assert!(site.page("guide/usage.html").contains("<p>Run it.</p>"));
    assert!(site.page("guide/tool.html").contains("<p>Helper script.</p>"));
    assert!(site.page("guide/tool.html").contains("print('hi')"));
}

#[test]
fn every_page_is_wrapped_in_the_base_template() {
    let site = Site::new(&[("a.md", "alpha"), ("b.rst", "beta\n")]);
    site.build().unwrap();

    for page in ["a.html", "b.html"] {
        let html = site.page(page);
        assert!(html.starts_with("<!DOCTYPE html>"), "{page}");
        assert!(html.contains(r#"href="/style.css""#), "{page}");
        assert!(!html.contains("body_content"), "{page}");
    }
}

#[test]
fn hidden_entries_never_published() {
    let site = Site::new(&[
        ("a.md", "a"),
        (".draft/secret.md", "secret"),
        ("sub/.wip.rst", "wip"),
        ("sub/b.md", "b"),
    ]);

    let report = site.build().unwrap();

    let files = list_files(&site.out());
    assert!(files.iter().all(|f| !f.contains("secret") && !f.contains("wip")));
    assert!(!site.out().join(".draft").exists());
    let nav: Vec<&str> = report.navigation.iter().map(|n| n.as_str()).collect();
    assert_eq!(nav, vec!["site/a.html", "site/sub/b.html"]);
}

#[test]
fn one_destination_per_source() {
    let site = Site::new(&[
        ("a.md", ""),
        ("x/b.rst", ""),
        ("x/y/c.py", ""),
        ("x/y/z/d.md", ""),
    ]);

    let report = site.build().unwrap();

    assert_eq!(report.pages.len(), 4);
    for page in &report.pages {
        let rel_source = page.source.strip_prefix(&report.project_root).unwrap();
        let rel_dest = page.destination.strip_prefix(site.out()).unwrap();
        assert_eq!(rel_source.parent(), rel_dest.parent());
        assert_eq!(rel_source.file_stem(), rel_dest.file_stem());
        assert_eq!(rel_dest.extension().unwrap(), "html");
    }
}

#[test]
fn empty_project_yields_only_assets() {
    let site = Site::new(&[]);

    let report = site.build().unwrap();

    assert!(report.pages.is_empty());
    assert!(report.navigation.is_empty());
    assert_eq!(list_files(&site.out()), vec!["script.js", "style.css"]);
}

// =========================================================================
// Rebuilds
// =========================================================================

#[test]
fn rebuild_is_idempotent() {
    let site = Site::new(&[("a.md", "# A"), ("sub/b.rst", "B\n")]);

    site.build().unwrap();
    let first: Vec<(String, String)> = list_files(&site.out())
        .into_iter()
        .map(|f| {
            let body = site.page(&f);
            (f, body)
        })
        .collect();

    site.build().unwrap();
    let second: Vec<(String, String)> = list_files(&site.out())
        .into_iter()
        .map(|f| {
            let body = site.page(&f);
            (f, body)
        })
        .collect();

    assert_eq!(first, second);
}

#[test]
fn rebuild_leaves_no_stale_files() {
    let site = Site::new(&[("keep.md", "k"), ("old/gone.md", "g")]);
    site.build().unwrap();
    assert!(site.out().join("old/gone.html").exists());

    fs::remove_dir_all(site.source().join("old")).unwrap();
    write_tree(&site.out(), &[("manual/extra.txt", "hand-made")]);
    site.build().unwrap();

    assert_eq!(
        list_files(&site.out()),
        vec!["keep.html", "script.js", "style.css"]
    );
    assert!(!site.out().join("old").exists());
    assert!(!site.out().join("manual").exists());
}

// =========================================================================
// Collisions and failures
// =========================================================================

#[test]
fn collision_keeps_later_source_and_reports_it() {
    let site = Site::new(&[("x.md", "from markdown"), ("x.rst", "from rst\n")]);

    let report = site.build().unwrap();

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.collisions.len(), 1);
    assert!(report.collisions[0].kept.ends_with("x.rst"));
    assert!(site.page("x.html").contains("from rst"));
    assert!(!site.page("x.html").contains("from markdown"));
}

#[test]
fn collision_fail_policy_stops_the_build() {
    let mut site = Site::new(&[("x.md", "a"), ("x.rst", "b\n")]);
    site.config.on_collision = CollisionPolicy::Fail;

    let err = site.build().unwrap_err();
    assert!(matches!(err, PipelineError::Layout(_)));
    assert_eq!(err.stage(), Stage::Cleaned);
}

#[test]
fn bad_page_does_not_stop_the_rest() {
    let site = Site::new(&[
        ("a.md", "fine"),
        ("broken.rst", "Heading that is long\n=====\n"),
        ("z.py", "\"\"\"never closed\n"),
    ]);

    let report = site.build().unwrap();

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(site.page("broken.html"), "");
    assert_eq!(site.page("z.html"), "");
    assert!(site.page("a.html").contains("fine"));
    assert_eq!(report.navigation.len(), 3);
}

// =========================================================================
// Templates and configuration
// =========================================================================

#[test]
fn custom_template_directory() {
    let mut site = Site::new(&[("a.md", "hello")]);
    let theme = site.tmp.path().join("theme");
    write_tree(
        &theme,
        &[
            ("base.html", "<html><body class=\"mine\">{{ body_content }}</body></html>"),
            ("style.css", "/* mine */"),
            ("script.js", "// mine"),
        ],
    );
    site.config.template_dir = Some(theme);

    site.build().unwrap();

    assert_eq!(
        site.page("a.html"),
        "<html><body class=\"mine\"><p>hello</p>\n</body></html>"
    );
    assert_eq!(site.page("style.css"), "/* mine */");
    assert_eq!(site.page("script.js"), "// mine");
}

#[test]
fn template_without_placeholder_fails_before_touching_output() {
    let mut site = Site::new(&[("a.md", "hello")]);
    site.build().unwrap();
    let theme = site.tmp.path().join("theme");
    write_tree(
        &theme,
        &[("base.html", "<html></html>"), ("style.css", ""), ("script.js", "")],
    );
    site.config.template_dir = Some(theme);

    let err = site.build().unwrap_err();

    assert!(matches!(err, PipelineError::Template(_)));
    assert!(site.page("a.html").contains("hello"));
}

#[test]
fn navigation_uses_configured_namespace() {
    let mut site = Site::new(&[("a.md", ""), ("sub/b.md", "")]);
    site.config.nav_namespace = "docs".into();

    let report = site.build().unwrap();
    let nav: Vec<&str> = report.navigation.iter().map(|n| n.as_str()).collect();

    assert_eq!(nav, vec!["docs/a.html", "docs/sub/b.html"]);
}

#[test]
fn builtin_assets_match_output() {
    let site = Site::new(&[]);
    site.build().unwrap();

    let assets = TemplateAssets::builtin();
    assert_eq!(fs::read(site.out().join("style.css")).unwrap(), assets.style);
    assert_eq!(fs::read(site.out().join("script.js")).unwrap(), assets.script);
}
