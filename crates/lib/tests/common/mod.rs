//! Shared helpers for the build integration tests.
//!
//! Shell scripts stand in for the translator and the C compiler.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Copies the last positional argument to `--output-file=`, prefixed with the
/// full command line.
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

pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new(translator_script: &str) -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("cython.sh"), translator_script).unwrap();
    std::fs::write(temp.path().join("cc.sh"), FAKE_CC).unwrap();
    std::fs::write(
      temp.path().join("cythonfn.pyx"),
      "def calculate_z(int maxiter, double complex[:] zs):\n    pass\n",
    )
    .unwrap();
    Self { temp }
  }

  /// Replace the translator script between builds.
  pub fn set_translator(&self, translator_script: &str) {
    std::fs::write(self.root().join("cython.sh"), translator_script).unwrap();
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn write_config(&self, targets: &str) -> PathBuf {
    self.write_config_with_settings("", targets)
  }

  /// Like [`Project::write_config`], with extra top-level settings.
  pub fn write_config_with_settings(&self, settings: &str, targets: &str) -> PathBuf {
    let config = format!(
      r#"
language_level = 3
artifact_suffix = ".so"
{settings}

[translator]
program = "/bin/sh"
args = ["{root}/cython.sh"]

[compiler]
program = "/bin/sh"
args = ["{root}/cc.sh", "-shared", "-fPIC"]

[[include_provider]]
name = "numpy"
command = ["/bin/sh", "-c", "echo /usr/include/numeric"]

[[include_provider]]
name = "local"
dirs = ["include"]

{targets}
"#,
      root = self.root().display(),
      settings = settings,
      targets = targets
    );
    let path = self.root().join("extbuild.toml");
    std::fs::write(&path, config).unwrap();
    path
  }
}
