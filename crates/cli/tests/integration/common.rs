//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Writes `--output-file=` with the full command line followed by the source.
pub const FAKE_CYTHON: &str = r#"
out=""
src=""
for arg in "$@"; do
  case "$arg" in
    --output-file=*) out="${arg#--output-file=}" ;;
    -*) ;;
    *) src="$arg" ;;
  esac
done
echo "/* cython $* */" > "$out"
cat "$src" >> "$out"
"#;

/// Writes its argument list into the `-o` file.
pub const FAKE_CC: &str = r#"
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
echo "$@" > "$out"
"#;

pub const BROKEN_CYTHON: &str = r#"
echo "cythonfn.pyx:2:4: undeclared name not builtin: prange" >&2
exit 1
"#;

/// Isolated project directory.
///
/// Holds fake tools, one annotated source and the build file.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// Project whose translator behaves like `translator_script`.
  pub fn new(translator_script: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("extbuild.toml");
    let env = Self { temp, config_path };
    env.write_file("tools/cython.sh", translator_script);
    env.write_file("tools/cc.sh", FAKE_CC);
    env.write_file(
      "cythonfn.pyx",
      "def calculate_z(int maxiter, double complex[:] zs):\n    pass\n",
    );
    env
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Write the build file: fake tools plus the given `[[target]]` tables.
  pub fn write_config(&self, targets: &str) {
    let config = format!(
      r#"
language_level = 3
artifact_suffix = ".so"

[translator]
program = "/bin/sh"
args = ["{root}/tools/cython.sh"]

[compiler]
program = "/bin/sh"
args = ["{root}/tools/cc.sh", "-shared", "-fPIC"]

[[include_provider]]
name = "numpy"
command = ["/bin/sh", "-c", "echo /usr/include/numeric"]

{targets}
"#,
      root = self.root().display(),
      targets = targets
    );
    std::fs::write(&self.config_path, config).unwrap();
  }

  pub fn build_dir(&self) -> PathBuf {
    self.root().join("build")
  }

  /// A Command for the extbuild binary, run from the project directory.
  pub fn extbuild_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("extbuild");
    cmd.current_dir(self.root());
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

pub const CYTHONFN_TARGET: &str = r#"
[[target]]
name = "cythonfn"
sources = ["cythonfn.pyx"]
extra_compile_args = ["-fopenmp"]
extra_link_args = ["-fopenmp"]
define_macros = [["NPY_NO_DEPRECATED_API", "NPY_1_7_API_VERSION"]]
"#;
