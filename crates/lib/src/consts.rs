pub const APP_NAME: &str = "extbuild";

/// Default build file looked up by the CLI.
pub const CONFIG_FILE_NAME: &str = "extbuild.toml";

/// Default build-output directory, relative to the build file.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Subdirectory of the build dir holding translated sources and staged artifacts.
pub const TEMP_DIR_NAME: &str = "temp";

/// Subdirectory of the build dir holding finished artifacts.
pub const LIB_DIR_NAME: &str = "lib";

pub const DEFAULT_TRANSLATOR: &str = "cython";

pub const DEFAULT_COMPILER: &str = "cc";

/// Environment variable consulted for the compiler when the build file names none.
pub const COMPILER_ENV_VAR: &str = "CC";

/// Source extensions that must go through the translator.
pub const ANNOTATED_EXTENSIONS: &[&str] = &["pyx", "py"];
