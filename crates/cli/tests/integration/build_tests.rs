//! Tests for `extbuild build`.

use predicates::prelude::*;

use crate::common::{BROKEN_CYTHON, CYTHONFN_TARGET, FAKE_CYTHON, TestEnv};

#[test]
fn build_succeeds_and_places_artifact() {
  let env = TestEnv::new(FAKE_CYTHON);
  env.write_config(CYTHONFN_TARGET);

  env
    .extbuild_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("cythonfn"))
    .stdout(predicate::str::contains("Build complete"));

  let artifact = env.build_dir().join("lib").join("cythonfn.so");
  let cc_args = std::fs::read_to_string(&artifact).unwrap();
  assert!(cc_args.contains("-I/usr/include/numeric"));
  assert!(cc_args.contains("-DNPY_NO_DEPRECATED_API=NPY_1_7_API_VERSION"));
}

#[test]
fn language_level_override_reaches_translator() {
  let env = TestEnv::new(FAKE_CYTHON);
  env.write_config(CYTHONFN_TARGET);

  env
    .extbuild_cmd()
    .args(["build", "--language-level", "2"])
    .assert()
    .success();

  let lowered = std::fs::read_to_string(env.build_dir().join("temp/cythonfn/cythonfn.c")).unwrap();
  assert!(lowered.contains("-2"));
}

#[test]
fn build_dir_override_is_used() {
  let env = TestEnv::new(FAKE_CYTHON);
  env.write_config(CYTHONFN_TARGET);
  let out = env.root().join("out");

  env.extbuild_cmd().arg("build").arg("--build-dir").arg(&out).assert().success();

  assert!(out.join("lib").join("cythonfn.so").exists());
  assert!(!env.build_dir().exists());
}

#[test]
fn translator_failure_exits_nonzero_with_diagnostic() {
  let env = TestEnv::new(BROKEN_CYTHON);
  env.write_config(CYTHONFN_TARGET);

  env
    .extbuild_cmd()
    .arg("build")
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("undeclared name not builtin: prange"))
    .stdout(predicate::str::contains("Build failed"));

  assert!(!env.build_dir().join("lib").join("cythonfn.so").exists());
}

#[test]
fn failing_target_does_not_stop_the_next() {
  let env = TestEnv::new(FAKE_CYTHON);
  env.write_file("helper.c", "int helper(void) { return 1; }\n");
  env.write_config(&format!(
    r#"
[[target]]
name = "missing"
sources = ["missing.pyx"]

[[target]]
name = "helper"
sources = ["helper.c"]
{}"#,
    CYTHONFN_TARGET
  ));

  env
    .extbuild_cmd()
    .arg("build")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("source not found"));

  assert!(env.build_dir().join("lib").join("helper.so").exists());
  assert!(env.build_dir().join("lib").join("cythonfn.so").exists());
}

#[test]
fn each_failure_is_reported_once() {
  let env = TestEnv::new(FAKE_CYTHON);
  env.write_config(
    r#"
[[target]]
name = "missing"
sources = ["missing.pyx"]
"#,
  );

  let output = env.extbuild_cmd().arg("build").output().unwrap();

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert_eq!(stderr.matches("source not found").count(), 1, "stderr was:\n{}", stderr);
}

#[test]
fn json_report_has_one_result_per_target() {
  let env = TestEnv::new(FAKE_CYTHON);
  env.write_config(CYTHONFN_TARGET);

  let output = env.extbuild_cmd().args(["--format", "json", "build"]).output().unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["success"], true);
  assert_eq!(report["language_level"], 3);
  assert_eq!(report["results"][0]["target"], "cythonfn");
  assert_eq!(report["results"][0]["status"], "succeeded");
  assert_eq!(
    report["results"][0]["states"],
    serde_json::json!(["pending", "translating", "compiling", "succeeded"])
  );
}

#[test]
fn duplicate_target_names_reject_the_build() {
  let env = TestEnv::new(FAKE_CYTHON);
  env.write_config(&format!("{0}{0}", CYTHONFN_TARGET));

  env
    .extbuild_cmd()
    .arg("build")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("duplicate target name: cythonfn"));

  assert!(!env.build_dir().exists());
}

#[test]
fn clean_after_build_removes_artifacts() {
  let env = TestEnv::new(FAKE_CYTHON);
  env.write_config(CYTHONFN_TARGET);

  env.extbuild_cmd().arg("build").assert().success();
  assert!(env.build_dir().exists());

  env.extbuild_cmd().arg("clean").assert().success();
  assert!(!env.build_dir().exists());
}
