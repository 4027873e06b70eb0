//! Pipeline integration tests
//!
//! These tests run the whole pipeline against temporary package trees with
//! the `MockBuild` double standing in for Cython:
//! - Exclusion precedence and selective copying
//! - Selective and compile-all manifests
//! - numba downgrade
//! - Empty manifest and missing artifact handling
//! - Reruns and source tree cleanup

use partcy::build::{ArtifactSuffix, MockBehavior, MockBuild};
use partcy::classify::{ClassifierRules, PatternSet};
use partcy::manifest::{MANIFEST_FILE_NAME, SelectionStrategy};
use partcy::pipeline::{PipelineOptions, PipelineOrchestrator, RunReport, RunStatus};
use partcy::progress::{ProgressEvent, ProgressHandler};
use partcy::{PartcyConfig, PipelineError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use walkdir::WalkDir;

const SUFFIX: &str = ".cpython-311-x86_64-linux-gnu.so";
const MARKER: &str = "# obfuscate_with_cython: True";

fn suffix() -> ArtifactSuffix {
    ArtifactSuffix::new(SUFFIX)
}

fn write(base: &Path, rel: &str, content: &str) {
    let path = base.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Project layout used by most tests:
///
/// ```text
/// project/
///   pkg/__init__.py
///   pkg/mod_a.py          (marked)
///   pkg/mod_b.py          (unmarked)
///   pkg/jit.py            (marked, imports numba)
///   pkg/secret_key.py     (marked, excluded)
///   pkg/data/info.csv
///   pkg/data/secret.csv   (excluded)
///   pkg/notes.md
///   pkg/sub/__init__.py
///   pkg/sub/deep.py       (marked)
///   tests/test_pkg.py
/// ```
fn create_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    write(base, "pkg/__init__.py", &format!("{}\nfrom .mod_a import *\n", MARKER));
    write(base, "pkg/mod_a.py", &format!("{}\ndef a():\n    return 1\n", MARKER));
    write(base, "pkg/mod_b.py", "def b():\n    return 2\n");
    write(
        base,
        "pkg/jit.py",
        &format!("{}\nfrom numba import njit\n\n@njit\ndef f(x):\n    return x\n", MARKER),
    );
    write(base, "pkg/secret_key.py", &format!("{}\nKEY = 'x'\n", MARKER));
    write(base, "pkg/data/info.csv", "a,b\n1,2\n");
    write(base, "pkg/data/secret.csv", "hidden\n");
    write(base, "pkg/notes.md", "# notes\n");
    write(base, "pkg/sub/__init__.py", "");
    write(base, "pkg/sub/deep.py", &format!("{}\nDEPTH = 2\n", MARKER));
    write(base, "tests/test_pkg.py", "def test_a():\n    assert True\n");
    dir
}

fn rules() -> ClassifierRules {
    ClassifierRules {
        always_exclude: PatternSet::new(&["*secret*"]).unwrap(),
        include_data: PatternSet::new(&["*.csv"]).unwrap(),
        never_obfuscate: PatternSet::empty(),
        artifact_suffix: suffix(),
    }
}

fn options(strategy: SelectionStrategy) -> PipelineOptions {
    PipelineOptions::new(rules()).with_strategy(strategy)
}

fn run(
    project: &TempDir,
    dest: &Path,
    options: PipelineOptions,
    build: &MockBuild,
) -> Result<RunReport, PipelineError> {
    PipelineOrchestrator::new(options, build).execute(&project.path().join("pkg"), dest)
}

fn artifact(stem: &str) -> String {
    format!("{}{}", stem, SUFFIX)
}

/// Relative path -> contents for every file under `root`
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressHandler for RecordingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[test]
fn test_excluded_files_never_reach_destination() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    let report = run(&project, &dest, options(SelectionStrategy::CompileAll), &build).unwrap();

    assert!(!dest.join("pkg/secret_key.py").exists());
    assert!(!dest.join(format!("pkg/{}", artifact("secret_key"))).exists());
    assert!(!dest.join("pkg/data/secret.csv").exists());
    assert!(report.ignored.contains(&PathBuf::from("pkg/data/secret.csv")));

    let submitted = build.calls();
    assert!(!submitted[0].contains(&PathBuf::from("pkg/secret_key.py")));
}

#[test]
fn test_marked_modules_are_replaced_by_artifacts() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    run(&project, &dest, options(SelectionStrategy::Selective), &build).unwrap();

    for stem in ["pkg/mod_a", "pkg/sub/deep"] {
        let native = dest.join(artifact(stem));
        assert!(native.is_file(), "missing {}", native.display());
        assert!(!dest.join(format!("{}.py", stem)).exists());
        assert_eq!(
            fs::read_to_string(native).unwrap(),
            MockBuild::artifact_contents(Path::new(&format!("{}.py", stem)))
        );
    }
}

#[test]
fn test_unmarked_modules_are_copied_verbatim() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    run(&project, &dest, options(SelectionStrategy::Selective), &build).unwrap();

    assert_eq!(
        fs::read(dest.join("pkg/mod_b.py")).unwrap(),
        fs::read(project.path().join("pkg/mod_b.py")).unwrap()
    );
    assert!(!dest.join(format!("pkg/{}", artifact("mod_b"))).exists());

    // Package markers are never compiled, even when marked
    assert!(dest.join("pkg/__init__.py").is_file());
    assert!(!dest.join(format!("pkg/{}", artifact("__init__"))).exists());
}

#[test]
fn test_compile_all_ignores_markers() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    let report = run(&project, &dest, options(SelectionStrategy::CompileAll), &build).unwrap();

    let expected: Vec<PathBuf> = ["pkg/mod_a.py", "pkg/mod_b.py", "pkg/sub/deep.py"]
        .iter()
        .map(PathBuf::from)
        .collect();
    assert_eq!(report.manifest.entries(), expected.as_slice());
    assert!(dest.join(format!("pkg/{}", artifact("mod_b"))).is_file());
    assert!(!dest.join("pkg/mod_b.py").exists());
    assert!(dest.join("pkg/__init__.py").is_file());
    assert!(dest.join("pkg/sub/__init__.py").is_file());
}

#[test]
fn test_numba_module_is_never_compiled() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());
    let handler = RecordingHandler::default();

    let report = PipelineOrchestrator::new(options(SelectionStrategy::CompileAll), &build)
        .with_progress(&handler)
        .execute(&project.path().join("pkg"), &dest)
        .unwrap();

    assert!(!build.calls()[0].contains(&PathBuf::from("pkg/jit.py")));
    assert_eq!(
        fs::read(dest.join("pkg/jit.py")).unwrap(),
        fs::read(project.path().join("pkg/jit.py")).unwrap()
    );
    assert_eq!(report.runtime_annotated, vec![PathBuf::from("pkg/jit.py")]);
    assert!(report.warnings.iter().any(|w| w.contains("pkg/jit.py")));

    let events = handler.events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::RuntimeAnnotationDetected { module } if module == "pkg/jit.py"
    )));
}

#[test]
fn test_empty_manifest_leaves_destination_untouched() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(dir.path(), "pkg/plain.py", "x = 1\n");
    let out = TempDir::new().unwrap();
    let build = MockBuild::new(suffix());

    // Absent destination stays absent
    let dest = out.path().join("dist");
    let report = PipelineOrchestrator::new(options(SelectionStrategy::Selective), &build)
        .execute(&dir.path().join("pkg"), &dest)
        .unwrap();
    assert_eq!(report.status, RunStatus::NothingToCompile);
    assert!(!dest.exists());
    assert_eq!(build.call_count(), 0);
    assert!(!dir.path().join(MANIFEST_FILE_NAME).exists());

    // Existing destination keeps its contents
    let existing = out.path().join("existing");
    write(&existing, "keep.txt", "old");
    PipelineOrchestrator::new(options(SelectionStrategy::Selective), &build)
        .execute(&dir.path().join("pkg"), &existing)
        .unwrap();
    assert_eq!(fs::read_to_string(existing.join("keep.txt")).unwrap(), "old");
}

#[test]
fn test_selective_scenario() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(dir.path(), "pkg/mod_a.py", &format!("{}\nx = 1\n", MARKER));
    write(dir.path(), "pkg/mod_b.py", "y = 2\n");
    write(dir.path(), "pkg/data/info.csv", "a,b\n");
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    let options = PipelineOptions::new(ClassifierRules {
        include_data: PatternSet::new(&["*.csv"]).unwrap(),
        ..ClassifierRules::new(suffix())
    });
    let report = PipelineOrchestrator::new(options, &build)
        .execute(&dir.path().join("pkg"), &dest)
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert!(dest.join(format!("pkg/{}", artifact("mod_a"))).is_file());
    assert!(dest.join("pkg/mod_b.py").is_file());
    assert!(dest.join("pkg/data/info.csv").is_file());
    assert!(!dest.join("pkg/mod_a.py").exists());
}

#[test]
fn test_rerun_produces_identical_tree() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    let cleaning = || options(SelectionStrategy::Selective).with_clean(true);

    run(&project, &dest, cleaning(), &build).unwrap();
    let first = snapshot(&dest);

    // A stray file in the destination must not survive the rerun
    write(&dest, "stray.txt", "leftover");

    run(&project, &dest, cleaning(), &build).unwrap();
    let second = snapshot(&dest);

    assert_eq!(first, second);
    assert!(!dest.join("stray.txt").exists());
}

#[test]
fn test_missing_artifact_aborts_run() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::with_behavior(
        suffix(),
        MockBehavior::Skip(vec![PathBuf::from("pkg/sub/deep.py")]),
    );

    let err = run(&project, &dest, options(SelectionStrategy::Selective), &build).unwrap_err();

    match err {
        PipelineError::MissingArtifact { module } => {
            assert_eq!(module, PathBuf::from("pkg/sub/deep.py"));
        }
        other => panic!("Expected MissingArtifact, got {:?}", other),
    }
    assert!(!dest.join(format!("pkg/sub/{}", artifact("deep"))).exists());
    assert!(!dest.join("pkg/sub/deep.py").exists());
}

#[test]
fn test_build_failure_is_fatal() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");

    // A stale artifact from an earlier run must not mask the failure
    write(project.path(), &format!("pkg/{}", artifact("mod_a")), "stale");
    let build = MockBuild::with_behavior(suffix(), MockBehavior::Fail("boom".to_string()));

    let err = run(&project, &dest, options(SelectionStrategy::Selective), &build).unwrap_err();
    assert!(matches!(err, PipelineError::Build(_)));
    assert!(!dest.exists());
}

#[test]
fn test_auxiliary_directory_is_copied() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    run(&project, &dest, options(SelectionStrategy::Selective), &build).unwrap();

    assert_eq!(
        fs::read_to_string(dest.join("tests/test_pkg.py")).unwrap(),
        "def test_a():\n    assert True\n"
    );
}

#[test]
fn test_unselected_files_stay_out() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    run(&project, &dest, options(SelectionStrategy::Selective), &build).unwrap();

    assert!(!dest.join("pkg/notes.md").exists());
    assert!(!dest.join(MANIFEST_FILE_NAME).exists());
}

#[test]
fn test_clean_removes_byproducts() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    let report = run(
        &project,
        &dest,
        options(SelectionStrategy::Selective).with_clean(true),
        &build,
    )
    .unwrap();

    let src = project.path();
    assert!(!src.join(format!("pkg/{}", artifact("mod_a"))).exists());
    assert!(!src.join("pkg/mod_a.c").exists());
    assert!(!src.join(MANIFEST_FILE_NAME).exists());
    assert!(src.join("pkg/mod_a.py").is_file());
    assert!(report.cleaned.is_some());

    // Destination keeps its artifacts
    assert!(dest.join(format!("pkg/{}", artifact("mod_a"))).is_file());
}

#[test]
fn test_without_clean_byproducts_remain() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    run(&project, &dest, options(SelectionStrategy::Selective), &build).unwrap();

    assert!(project
        .path()
        .join(format!("pkg/{}", artifact("mod_a")))
        .is_file());
    assert!(project.path().join(MANIFEST_FILE_NAME).is_file());
}

#[test]
fn test_destination_inside_package_is_rejected() {
    let project = create_project();
    let build = MockBuild::new(suffix());
    let dest = project.path().join("pkg/dist");

    let err = run(&project, &dest, options(SelectionStrategy::Selective), &build).unwrap_err();
    assert!(matches!(err, PipelineError::DestinationOverlapsSource { .. }));
    assert_eq!(build.call_count(), 0);
}

#[test]
fn test_destination_overlapping_aux_dir_is_rejected() {
    let project = create_project();
    let build = MockBuild::new(suffix());
    let original = fs::read(project.path().join("tests/test_pkg.py")).unwrap();

    for rel in ["tests", "tests/out"] {
        let dest = project.path().join(rel);
        let err = run(&project, &dest, options(SelectionStrategy::Selective), &build).unwrap_err();
        assert!(
            matches!(err, PipelineError::DestinationOverlapsSource { .. }),
            "{} was accepted",
            rel
        );
    }

    assert_eq!(build.call_count(), 0);
    assert_eq!(fs::read(project.path().join("tests/test_pkg.py")).unwrap(), original);
    assert!(!project.path().join("tests/out").exists());
    assert_eq!(snapshot(&project.path().join("tests")).len(), 1);
}

#[test]
fn test_options_from_config_file() {
    let project = create_project();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("dist");
    let build = MockBuild::new(suffix());

    let config_path = project.path().join("partcy.toml");
    fs::write(
        &config_path,
        "compile_all = true\ninclude_data = [\"*.csv\"]\nalways_exclude = [\"*secret*\"]\nnever_obfuscate = [\"pkg/mod_b.py\"]\n",
    )
    .unwrap();

    let config = PartcyConfig::from_file(&config_path).unwrap();
    let options = PipelineOptions::from_config(&config, suffix()).unwrap();
    let report = run(&project, &dest, options, &build).unwrap();

    assert!(!report.manifest.contains(Path::new("pkg/mod_b.py")));
    assert!(dest.join("pkg/mod_b.py").is_file());
    assert!(dest.join(format!("pkg/{}", artifact("mod_a"))).is_file());
}
