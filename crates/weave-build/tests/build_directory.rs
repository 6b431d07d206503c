//! Integration tests for package directory builds.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rhizome_weave_build::{
    BuildAggregator, BuildError, BuildPlan, CommandInstaller, InstallPolicy, InstallStatus,
    PackageInstaller, build_plan,
};
use rhizome_weave_codegen_js::{
    CompilationUnit, CompileContext, Fragment, MacroInvocation, OutputMode, SourceMap, UnitFlags,
    UnitSource, compile_unit,
};
use rhizome_weave_ir::Node;
use serde_json::Value;

/// Installer double that records where it was run.
struct RecordingInstaller {
    status: InstallStatus,
    calls: Mutex<Vec<PathBuf>>,
}

impl RecordingInstaller {
    fn new(status: InstallStatus) -> Self {
        Self {
            status,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

impl PackageInstaller for RecordingInstaller {
    async fn install(&self, dir: &Path) -> InstallStatus {
        self.calls.lock().unwrap().push(dir.to_path_buf());
        self.status.clone()
    }
}

fn aggregator(status: InstallStatus) -> BuildAggregator<RecordingInstaller> {
    BuildAggregator::new(RecordingInstaller::new(status))
}

fn source(filename: &str, fragments: Vec<Fragment>) -> UnitSource {
    UnitSource {
        filename: filename.to_string(),
        flags: UnitFlags::default(),
        source_map: None,
        fragments,
    }
}

fn code(text: &str) -> Fragment {
    Fragment::Code {
        text: text.to_string(),
    }
}

fn npm_dependency(name: &str, version: &str) -> Fragment {
    Fragment::Macro(MacroInvocation::new(
        "JS",
        "npm_dependency",
        vec![Node::str(name), Node::str(version)],
    ))
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

fn read_json(path: impl AsRef<Path>) -> Value {
    serde_json::from_str(&read(path)).unwrap()
}

#[tokio::test]
async fn test_later_dependency_declaration_wins() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = CompileContext::new(OutputMode::CommonJs);
    let units = vec![
        compile_unit(
            &mut ctx,
            source("a.rb", vec![npm_dependency("pkg", "1.0.0"), code(";\n")]),
        )
        .unwrap(),
        compile_unit(
            &mut ctx,
            source("b.rb", vec![npm_dependency("pkg", "2.0.0"), code(";\n")]),
        )
        .unwrap(),
    ];
    assert_eq!(units[0].code(), "null;\n");

    let aggregator = aggregator(InstallStatus::Succeeded);
    let report = aggregator
        .build_directory(&ctx, dir.path(), &units, false)
        .await
        .unwrap();

    let manifest = read_json(dir.path().join("package.json"));
    assert_eq!(manifest["dependencies"]["pkg"], "2.0.0");
    assert_eq!(manifest["private"], true);
    assert_eq!(manifest["main"], "./index.js");
    assert_eq!(report.manifest.dependencies["pkg"], "2.0.0");
    assert_eq!(report.install, Some(InstallStatus::Succeeded));
    assert_eq!(aggregator.installer().calls(), vec![dir.path().to_path_buf()]);
}

#[tokio::test]
async fn test_eager_load_index_follows_flags() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CompileContext::new(OutputMode::CommonJs);
    let units = vec![
        CompilationUnit::new("main.rb", "main();\n", UnitFlags::default()),
        CompilationUnit::new(
            "lib/helper.rb",
            "helper();\n",
            UnitFlags {
                load: false,
                requirable: true,
            },
        ),
        CompilationUnit::new(
            "lib/boot.rb",
            "boot();\n",
            UnitFlags {
                load: true,
                requirable: true,
            },
        ),
    ];

    let report = aggregator(InstallStatus::Succeeded)
        .build_directory(&ctx, dir.path(), &units, true)
        .await
        .unwrap();

    assert_eq!(report.manifest.eager_load_index, vec!["main", "lib/boot"]);
    assert_eq!(
        read(dir.path().join("index.js")),
        "require(\"./main.js\");\nrequire(\"./lib/boot.js\");\n"
    );
    assert_eq!(read(dir.path().join("lib/helper.js")), "helper();\n");
    assert!(!dir.path().join("index.html").exists());
    assert!(!dir.path().join("index.mjs").exists());
}

#[tokio::test]
async fn test_esm_build_writes_module_files_and_html() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CompileContext::new(OutputMode::EsModule);
    let units = vec![
        CompilationUnit::new("first.rb", "export {};\n", UnitFlags::default()),
        CompilationUnit::new("second.rb", "export {};\n", UnitFlags::default()),
    ];

    let report = aggregator(InstallStatus::Succeeded)
        .build_directory(&ctx, dir.path(), &units, false)
        .await
        .unwrap();

    assert!(dir.path().join("first.mjs").exists());
    assert!(dir.path().join("second.mjs").exists());
    assert_eq!(
        read(dir.path().join("index.mjs")),
        "import \"./first.mjs\";\nimport \"./second.mjs\";\n"
    );

    let html = read(dir.path().join("index.html"));
    assert_eq!(html.matches("<script type=\"module\"").count(), 2);
    let first = html.find("src=\"./first.mjs\"").unwrap();
    let second = html.find("src=\"./second.mjs\"").unwrap();
    assert!(first < second);

    let manifest = read_json(dir.path().join("package.json"));
    assert_eq!(manifest["type"], "module");
    assert_eq!(manifest["main"], "./index.mjs");
    assert_eq!(report.files.len(), 5);
}

#[tokio::test]
async fn test_commonjs_manifest_type() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CompileContext::new(OutputMode::CommonJs);
    aggregator(InstallStatus::Succeeded)
        .build_directory(&ctx, dir.path(), &[], false)
        .await
        .unwrap();
    assert_eq!(read_json(dir.path().join("package.json"))["type"], "commonjs");
}

#[tokio::test]
async fn test_empty_build() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let ctx = CompileContext::new(OutputMode::CommonJs);
    let aggregator = aggregator(InstallStatus::Succeeded);

    let report = aggregator
        .build_directory(&ctx, &out, &[], true)
        .await
        .unwrap();

    assert!(report.manifest.eager_load_index.is_empty());
    assert!(report.manifest.dependencies.is_empty());
    assert_eq!(report.install, None);
    assert!(aggregator.installer().calls().is_empty());
    assert_eq!(read(out.join("index.js")), "\n");
    let manifest = read_json(out.join("package.json"));
    assert_eq!(manifest["dependencies"], serde_json::json!({}));
}

#[tokio::test]
async fn test_source_map_embedding() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CompileContext::new(OutputMode::CommonJs);
    let units = vec![
        CompilationUnit::new("mapped.rb", "x();", UnitFlags::default())
            .with_source_map(SourceMap::new(serde_json::json!({"version": 3}))),
        CompilationUnit::new("plain.rb", "y();", UnitFlags::default()),
    ];
    let aggregator = aggregator(InstallStatus::Succeeded);

    aggregator
        .build_directory(&ctx, dir.path(), &units, true)
        .await
        .unwrap();
    assert_eq!(
        read(dir.path().join("mapped.js")),
        "x();\n//# sourceMappingURL=data:application/json;charset=utf-8,%7B%22version%22%3A3%7D"
    );
    assert_eq!(read(dir.path().join("plain.js")), "y();");

    aggregator
        .build_directory(&ctx, dir.path(), &units, false)
        .await
        .unwrap();
    assert_eq!(read(dir.path().join("mapped.js")), "x();");
}

#[tokio::test]
async fn test_install_failure_warns_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = CompileContext::new(OutputMode::CommonJs);
    let units =
        vec![compile_unit(&mut ctx, source("a.rb", vec![npm_dependency("pkg", "1.0.0")])).unwrap()];
    let failed = InstallStatus::Failed { code: Some(1) };

    let report = aggregator(failed.clone())
        .build_directory(&ctx, dir.path(), &units, false)
        .await
        .unwrap();
    assert_eq!(report.install, Some(failed));
}

#[tokio::test]
async fn test_install_failure_is_fatal_when_strict() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = CompileContext::new(OutputMode::CommonJs);
    let units =
        vec![compile_unit(&mut ctx, source("a.rb", vec![npm_dependency("pkg", "1.0.0")])).unwrap()];

    let err = aggregator(InstallStatus::Failed { code: Some(1) })
        .with_policy(InstallPolicy::Strict)
        .build_directory(&ctx, dir.path(), &units, false)
        .await
        .unwrap_err();

    match err {
        BuildError::Install { dir: failed_in, status } => {
            assert_eq!(failed_in, dir.path());
            assert_eq!(status, InstallStatus::Failed { code: Some(1) });
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(dir.path().join("package.json").exists());
}

#[tokio::test]
async fn test_install_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = CompileContext::new(OutputMode::CommonJs);
    let units =
        vec![compile_unit(&mut ctx, source("a.rb", vec![npm_dependency("pkg", "1.0.0")])).unwrap()];
    let aggregator = aggregator(InstallStatus::Succeeded).with_install(false);

    let report = aggregator
        .build_directory(&ctx, dir.path(), &units, false)
        .await
        .unwrap();
    assert_eq!(report.install, None);
    assert!(aggregator.installer().calls().is_empty());
    assert_eq!(report.manifest.dependencies["pkg"], "1.0.0");
}

#[tokio::test]
async fn test_build_plan_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let plan = BuildPlan::from_json(
        r#"{
            "units": [
                {
                    "filename": "app/main.rb",
                    "fragments": [
                        {"kind": "code", "text": "const fs = "},
                        {"kind": "macro", "namespace": "JS", "selector": "dynimport",
                         "args": [{"type": "str", "value": "node:fs"}]},
                        {"kind": "code", "text": ";\n"}
                    ]
                },
                {
                    "filename": "app/deps.rb",
                    "flags": {"requirable": true},
                    "fragments": [
                        {"kind": "macro", "namespace": "JS", "selector": "npm_dependency",
                         "args": [{"type": "str", "value": "left-pad"}]}
                    ]
                }
            ]
        }"#,
    )
    .unwrap();
    let aggregator = aggregator(InstallStatus::Succeeded);

    let report = build_plan(&aggregator, OutputMode::EsModule, plan, dir.path(), true)
        .await
        .unwrap();

    assert_eq!(
        read(dir.path().join("app/main.mjs")),
        "const fs = import(\"node:fs\").then(_mod => _mod.default);\n"
    );
    assert_eq!(report.manifest.eager_load_index, vec!["app/main"]);
    assert_eq!(report.manifest.dependencies["left-pad"], "latest");
    assert_eq!(aggregator.installer().calls().len(), 1);
}

#[tokio::test]
async fn test_build_plan_reports_failing_unit() {
    let dir = tempfile::tempdir().unwrap();
    let plan = BuildPlan {
        units: vec![source(
            "broken.rb",
            vec![Fragment::Macro(MacroInvocation::new(
                "JS",
                "import",
                vec![Node::other("lvar", vec![])],
            ))],
        )],
    };

    let err = build_plan(
        &aggregator(InstallStatus::Succeeded),
        OutputMode::CommonJs,
        plan,
        dir.path(),
        false,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BuildError::Unit(ref unit) if unit.filename == "broken.rb"));
    assert!(err.to_string().contains("broken.rb"));
    assert!(!dir.path().join("package.json").exists());
}

#[tokio::test]
async fn test_empty_module_name_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("dist");
    let ctx = CompileContext::new(OutputMode::CommonJs);
    let units = vec![
        CompilationUnit::new("main.rb", "main();\n", UnitFlags::default()),
        CompilationUnit::new("..", "up();\n", UnitFlags::default()),
    ];

    let err = aggregator(InstallStatus::Succeeded)
        .build_directory(&ctx, &out, &units, false)
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::EmptyModuleName { ref filename } if filename == ".."));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_colliding_module_names_fail_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CompileContext::new(OutputMode::EsModule);
    let units = vec![
        CompilationUnit::new("x.rb", "first();\n", UnitFlags::default()),
        CompilationUnit::new("../x.rb", "second();\n", UnitFlags::default()),
    ];
    assert_eq!(units[0].module_name(), units[1].module_name());

    let aggregator = aggregator(InstallStatus::Succeeded);
    let err = aggregator
        .build_directory(&ctx, dir.path(), &units, false)
        .await
        .unwrap_err();

    match &err {
        BuildError::DuplicateModule {
            module,
            filename,
            first,
        } => {
            assert_eq!(module, "x");
            assert_eq!(filename, "../x.rb");
            assert_eq!(first, "x.rb");
        }
        other => panic!("expected duplicate module error, got {:?}", other),
    }
    assert!(err.to_string().contains("../x.rb"));
    assert!(!dir.path().join("x.mjs").exists());
    assert!(!dir.path().join("index.mjs").exists());
    assert!(aggregator.installer().calls().is_empty());
}

#[test]
fn test_invalid_plan_json() {
    let err = BuildPlan::from_json(r#"{"units": [{"fragments": []}]}"#).unwrap_err();
    assert!(matches!(err, BuildError::Plan(_)));
}

#[tokio::test]
async fn test_missing_installer_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let installer = CommandInstaller::new(
        "weave-test-no-such-installer",
        vec!["install".to_string()],
        Duration::from_secs(5),
    );
    let status = installer.install(dir.path()).await;
    assert!(matches!(status, InstallStatus::Unavailable { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn test_installer_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let installer = CommandInstaller::new(
        "sh",
        vec!["-c".to_string(), "exit 3".to_string()],
        Duration::from_secs(30),
    );
    assert_eq!(
        installer.install(dir.path()).await,
        InstallStatus::Failed { code: Some(3) }
    );

    let installer = CommandInstaller::new(
        "sh",
        vec!["-c".to_string(), "test -d .".to_string()],
        Duration::from_secs(30),
    );
    assert_eq!(installer.install(dir.path()).await, InstallStatus::Succeeded);
}

#[cfg(unix)]
#[tokio::test]
async fn test_installer_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let timeout = Duration::from_millis(200);
    let installer = CommandInstaller::new(
        "sh",
        vec!["-c".to_string(), "sleep 10".to_string()],
        timeout,
    );
    assert_eq!(
        installer.install(dir.path()).await,
        InstallStatus::TimedOut { after: timeout }
    );
}
