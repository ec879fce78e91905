use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use cwc_scan::{
    Candidate, CompoundMatcher, FileGatherOptions, FileGatherer, FileNode, GatherConfig,
    GatherError, MatchError, MemoryFileSystem, PathMatcher, RegexMatcher, gather_files,
    generate_file_tree,
};
use tempfile::TempDir;

/// Fails every check the way a broken git invocation does.
#[derive(Debug)]
struct BrokenTool;

impl PathMatcher for BrokenTool {
    fn matches(&self, candidate: &Candidate<'_>) -> Result<bool, MatchError> {
        Err(MatchError::ExternalTool {
            tool: "git".to_string(),
            path: candidate.path.to_path_buf(),
            message: "fatal: index file corrupt".to_string(),
        })
    }
}

/// Log sink shared with a test subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn go_project() -> MemoryFileSystem {
    MemoryFileSystem::new()
        .with_file("cmd/main.go", "package main\n")
        .with_file("cmd/README.md", "# cmd\n")
        .with_file("pkg/api/api.go", "package api\n")
        .with_file("pkg/api/api_test.go", "package api\n")
        .with_file("pkg/vendor/dep.go", "package dep\n")
        .with_file("pkg/vendor/nested/deep.go", "package nested\n")
        .with_dir("pkg/empty")
}

fn go_options() -> FileGatherOptions {
    let mut exclude = CompoundMatcher::empty();
    exclude.push(RegexMatcher::new("vendor/").unwrap());
    FileGatherOptions::new(["./cmd", "./pkg"])
        .with_include(RegexMatcher::new(r".*\.go$").unwrap())
        .with_exclude(exclude)
}

#[test]
fn test_include_exclude_scenario() {
    let gatherer = FileGatherer::with_fs(go_project());
    let gathered = gatherer.gather(&go_options()).unwrap();

    let paths: Vec<&str> = gathered.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["main.go", "api/api.go", "api/api_test.go"]);

    let main = &gathered.files[0];
    assert_eq!(main.file_type, "go");
    assert_eq!(main.data, b"package main\n");

    // Two scopes: synthetic root with one child per scope
    assert_eq!(gathered.root.name.as_str(), ".");
    assert!(gathered.root.find("pkg/vendor").is_none());
    assert!(!gathered.root.leaf_paths().iter().any(|p| p.contains("dep.go")));

    // Non-matching files stay in the tree, just not in the selection
    assert!(gathered.root.find("cmd/README.md").is_some_and(FileNode::is_file));
}

#[test]
fn test_slash_pattern_prunes_directory() {
    let fs = go_project();
    let gatherer = FileGatherer::with_fs(fs.clone());
    gatherer.gather(&go_options()).unwrap();

    let accessed = fs.accessed();
    assert!(accessed.contains(&PathBuf::from("pkg/api")));
    assert!(!accessed.iter().any(|p| p.starts_with("pkg/vendor")));
}

#[test]
fn test_excluded_directory_is_never_read() {
    let fs = go_project();
    let gatherer = FileGatherer::with_fs(fs.clone());

    let mut exclude = CompoundMatcher::empty();
    exclude.push(RegexMatcher::new("^vendor$").unwrap());
    let options = FileGatherOptions::new(["pkg"]).with_exclude(exclude);
    gatherer.gather(&options).unwrap();

    let accessed = fs.accessed();
    assert!(accessed.contains(&PathBuf::from("pkg/api")));
    assert!(!accessed.iter().any(|p| p.starts_with("pkg/vendor")));
}

#[test]
fn test_pruning_beats_include() {
    // The include pattern would select dep.go, the exclude on its parent wins
    let gatherer = FileGatherer::with_fs(go_project());
    let mut exclude = CompoundMatcher::empty();
    exclude.push(RegexMatcher::new("^vendor$").unwrap());
    let options = FileGatherOptions::new(["pkg"])
        .with_include(RegexMatcher::new("dep").unwrap())
        .with_exclude(exclude);

    let gathered = gatherer.gather(&options).unwrap();
    assert!(gathered.files.is_empty());
    assert!(gathered.root.find("vendor").is_none());
}

#[test]
fn test_unreadable_excluded_directory_is_fine() {
    let fs = go_project().deny("pkg/vendor");
    let gatherer = FileGatherer::with_fs(fs);
    let mut exclude = CompoundMatcher::empty();
    exclude.push(RegexMatcher::new("^vendor$").unwrap());

    let result = gatherer.gather(&FileGatherOptions::new(["pkg"]).with_exclude(exclude));
    assert!(result.is_ok());

    let fs = go_project().deny("pkg/vendor");
    let result = FileGatherer::with_fs(fs).gather(&go_options());
    assert!(result.is_ok());
}

#[test]
fn test_tree_and_selection_are_consistent() {
    let gatherer = FileGatherer::with_fs(go_project());
    let gathered = gatherer.gather(&FileGatherOptions::new(["."])).unwrap();

    assert_eq!(gathered.files.len(), gathered.root.file_count());
    for file in &gathered.files {
        let node = gathered.root.find(&file.path).unwrap();
        assert!(node.is_file(), "{} should be a leaf", file.path);
    }
    let selected: Vec<String> = gathered.files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(selected, gathered.root.leaf_paths());
}

#[test]
fn test_gather_is_idempotent() {
    let gatherer = FileGatherer::with_fs(go_project());
    let options = go_options();

    let first = gatherer.gather(&options).unwrap();
    let second = gatherer.gather(&options).unwrap();

    assert_eq!(first, second);
    assert_eq!(generate_file_tree(&first.root), generate_file_tree(&second.root));
}

#[test]
fn test_overlapping_scopes_are_not_deduplicated() {
    let gatherer = FileGatherer::with_fs(go_project());
    let options = FileGatherOptions::new(["cmd", "cmd/main.go"]);

    let gathered = gatherer.gather(&options).unwrap();
    let mains = gathered.files.iter().filter(|f| f.path == "main.go").count();
    assert_eq!(mains, 2);
    assert_eq!(gathered.root.child_count(), 2);
}

#[test]
fn test_rendered_tree() {
    let gatherer = FileGatherer::with_fs(go_project());
    let gathered = gatherer.gather(&go_options()).unwrap();

    let expected = "\
.
├── cmd
│   ├── README.md
│   └── main.go
└── pkg
    ├── api
    │   ├── api.go
    │   └── api_test.go
    └── empty
";
    assert_eq!(generate_file_tree(&gathered.root), expected);
}

#[test]
fn test_unreadable_directory_aborts() {
    let fs = go_project().deny("pkg/api");
    let gatherer = FileGatherer::with_fs(fs);

    let err = gatherer.gather(&FileGatherOptions::new(["pkg"])).unwrap_err();
    match err {
        GatherError::PermissionDenied { path } => assert_eq!(path, Path::new("pkg/api")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unreadable_file_aborts() {
    let fs = go_project().deny("cmd/main.go");
    let gatherer = FileGatherer::with_fs(fs);

    let err = gatherer.gather(&FileGatherOptions::new(["cmd"])).unwrap_err();
    assert!(matches!(err, GatherError::PermissionDenied { .. }));
}

#[test]
fn test_matcher_failure_aborts_gather() {
    let gatherer = FileGatherer::with_fs(go_project());
    let mut exclude = CompoundMatcher::empty();
    exclude.push(RegexMatcher::new("^vendor$").unwrap());
    exclude.push(BrokenTool);
    let options = FileGatherOptions::new(["pkg"]).with_exclude(exclude);

    let err = gatherer.gather(&options).unwrap_err();
    match err {
        GatherError::Matcher { path, source } => {
            assert_eq!(path, Path::new("pkg"));
            assert!(matches!(source, MatchError::ExternalTool { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_git_is_skipped_with_warning() {
    let config = GatherConfig::builder()
        .exclude(Some("vendor/".to_string()))
        .git_program("cwc-no-such-git-binary")
        .build()
        .unwrap();

    let logs = CapturedLogs::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || sink.clone())
        .with_ansi(false)
        .finish();
    let options = tracing::subscriber::with_default(subscriber, || {
        FileGatherOptions::from_config(&config)
    })
    .unwrap();

    // exclude regex + .git directory; the gitignore matcher is dropped
    assert_eq!(options.exclude.len(), 2);
    let logs = logs.contents();
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("cwc-no-such-git-binary not found in PATH"), "{logs}");

    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("vendor")).unwrap();
    fs::write(temp.path().join("vendor/dep.go"), "package dep").unwrap();
    fs::write(temp.path().join("main.go"), "package main").unwrap();

    let options = FileGatherOptions {
        scopes: vec![temp.path().to_path_buf()],
        ..options
    };
    let (files, _) = gather_files(&options).unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["main.go"]);
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_file_names_are_read() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("ok.txt"), "fine").unwrap();
    fs::write(temp.path().join(OsStr::from_bytes(b"bad\xff.txt")), "raw").unwrap();

    let (files, tree) = gather_files(&FileGatherOptions::new([temp.path()])).unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["bad\u{fffd}.txt", "ok.txt"]);
    assert_eq!(files[0].data, b"raw");
    assert!(tree.find("bad\u{fffd}.txt").is_some_and(FileNode::is_file));
}

#[test]
fn test_real_filesystem_git_dir_excluded() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join(".git/objects")).unwrap();
    fs::write(root.join(".git/HEAD"), "ref: refs/heads/main").unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/lib.rs"), "pub fn f() {}").unwrap();

    let config = GatherConfig::builder()
        .paths(vec![root.to_path_buf()])
        .exclude_from_gitignore(false)
        .build()
        .unwrap();
    let options = FileGatherOptions::from_config(&config).unwrap();
    let (files, tree) = gather_files(&options).unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "src/lib.rs");
    assert_eq!(files[0].file_type, "rs");
    assert!(tree.find(".git").is_none());
}

#[test]
fn test_gitignore_prunes_ignored_directory() {
    if which_git().is_none() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let status = Command::new("git")
        .args(["init", "-q"])
        .current_dir(root)
        .status()
        .unwrap();
    assert!(status.success());

    fs::write(root.join(".gitignore"), "target/\n*.tmp\n").unwrap();
    fs::create_dir_all(root.join("target/debug")).unwrap();
    fs::write(root.join("target/debug/app"), "binary").unwrap();
    fs::write(root.join("scratch.tmp"), "tmp").unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();

    let config = GatherConfig::builder()
        .paths(vec![root.to_path_buf()])
        .build()
        .unwrap();
    let options = FileGatherOptions::from_config(&config).unwrap();
    let (files, tree) = gather_files(&options).unwrap();

    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, [".gitignore", "src/main.rs"]);
    assert!(tree.find("target").is_none());
    assert!(tree.find(".git").is_none());
}

fn which_git() -> Option<()> {
    Command::new("git").arg("--version").output().ok().map(|_| ())
}
