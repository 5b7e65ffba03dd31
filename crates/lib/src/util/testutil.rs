//! Test utilities for extbuild-lib.
//!
//! Cross-platform helpers for tests that run shell commands, plus fake
//! translator and compiler scripts that mimic the real tools' command lines.

use std::path::{Path, PathBuf};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Write a shell script into `dir` and return its path.
///
/// Scripts are run as `/bin/sh <path> ...`, so no executable bit is needed.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, body).unwrap();
  path
}

/// A translator stand-in: copies the source named last to `--output-file=`.
pub const FAKE_TRANSLATOR: &str = r#"
out=""
src=""
for arg in "$@"; do
  case "$arg" in
    --output-file=*) out="${arg#--output-file=}" ;;
    -*) ;;
    *) src="$arg" ;;
  esac
done
echo "/* translated from $src with: $* */" > "$out"
cat "$src" >> "$out"
"#;

/// A compiler stand-in: writes its full argument list into the `-o` file.
pub const FAKE_COMPILER: &str = r#"
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
echo "$@" > "$out"
"#;

/// A tool that always fails with a diagnostic on stderr.
pub const FAILING_TOOL: &str = r#"
echo "error: something went wrong" >&2
exit 1
"#;
