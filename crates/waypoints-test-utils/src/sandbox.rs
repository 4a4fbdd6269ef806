//! sandbox.rs
//!
//! Hermetic working directory for running workspace binaries in tests.
//! - Fixture files are written relative to the sandbox root
//! - Commands get a minimal environment: `PATH`, a private `HOME`, `NO_COLOR`
//! - Run cargo binaries with `run` / `output`, or system binaries via `duct` with `cmd()`
//!
//! Everything lives under an `assert_fs::TempDir` and is cleaned up on drop.
//!
//! ## Quick example
//! ```no_run
//! use waypoints_test_utils::sandbox::Sandbox;
//!
//! let mut sb = Sandbox::new();
//! sb.write(
//!     "worlds/iris_arducopter_runway.world",
//!     r#"<world><model name="pad"><pose>5 0 0 0 0 0</pose></model></world>"#,
//! );
//!
//! let stdout = sb
//!     .run("calc-waypoints", ["-l", "-35.3632621,149.1652374"])
//!     .unwrap();
//! assert!(stdout.contains("Coordinate for pad"));
//! ```

use assert_fs::fixture::PathChild;
use assert_fs::TempDir;
use duct::Expression;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Sandbox {
    root: TempDir,
    pub home: PathBuf,
    default_cwd: PathBuf,
    extra_env: HashMap<String, String>,
}

/// Captured result of a command that was allowed to fail.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// Create a new sandbox; all state is under an auto-cleaned TempDir.
    pub fn new() -> Self {
        let root = TempDir::new().expect("create sandbox TempDir");
        let home = root.child("home").to_path_buf();
        fs::create_dir_all(&home).expect("create home dir");

        let default_cwd = root.path().to_path_buf();

        Self {
            root,
            home,
            default_cwd,
            extra_env: HashMap::new(),
        }
    }

    /// Add an environment variable to every command run from this sandbox.
    pub fn with_env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.extra_env.insert(key.into(), value.into());
        self
    }

    /// Get the current default working directory for commands.
    pub fn default_cwd(&self) -> &Path {
        &self.default_cwd
    }

    /// Set the default working directory for commands. Path is relative to sandbox root if not absolute.
    pub fn set_default_cwd<P: AsRef<Path>>(&mut self, cwd: P) -> &mut Self {
        let cwd = cwd.as_ref();
        self.default_cwd = if cwd.is_absolute() {
            cwd.to_path_buf()
        } else {
            self.root_path().join(cwd)
        };
        self
    }

    /// Absolute path to the sandbox root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write/overwrite a file relative to the sandbox root.
    pub fn write<P: AsRef<Path>, S: AsRef<[u8]>>(&mut self, rel: P, contents: S) -> &mut Self {
        let p = self.root_path().join(rel);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(p, contents).expect("write file");
        self
    }

    /// Build a `duct::Expression` pre-wired with the sandbox env and default cwd.
    /// Useful for system binaries. You can chain `.dir()`, etc. and then `.run()` or `.read()`.
    pub fn cmd<S: AsRef<OsStr>, I: IntoIterator>(&self, program: S, args: I) -> Expression
    where
        I::Item: AsRef<OsStr>,
    {
        let program_str = program.as_ref().to_string_lossy();
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().to_string())
            .collect();
        let expr = duct::cmd(program_str.as_ref(), args).dir(&self.default_cwd);
        self.inject_env(expr)
    }

    /// Run a cargo binary inside this sandbox and return stdout as String.
    /// Errors if the process exits with non-zero status.
    pub fn run<I>(&self, program: &str, args: I) -> Result<String, String>
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        self.cargo_cmd(program, args)
            .read()
            .map_err(|e| format!("command failed: {e}"))
    }

    /// Run a cargo binary and capture its exit code, stdout and stderr whatever the outcome.
    pub fn output<I>(&self, program: &str, args: I) -> CommandOutput
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let output = self
            .cargo_cmd(program, args)
            .unchecked()
            .stdout_capture()
            .stderr_capture()
            .run()
            .unwrap_or_else(|e| panic!("failed to spawn {program}: {e}"));

        CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).replace("\r\n", "\n"),
            stderr: String::from_utf8_lossy(&output.stderr).replace("\r\n", "\n"),
        }
    }

    /// Run a cargo binary and render the outcome as text suitable for a snapshot.
    pub fn snapshot_run<I>(&self, program: &str, args: I) -> String
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let output = self.output(program, args);
        let code = output
            .code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        let root = self.root_path().to_string_lossy().into_owned();

        format!(
            "exit code: {code}\n--- stdout ---\n{}--- stderr ---\n{}",
            output.stdout,
            output.stderr.replace(&root, "<SANDBOX>")
        )
    }

    fn cargo_cmd<I>(&self, program: &str, args: I) -> Expression
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let cargo_bin_path = assert_cmd::cargo::cargo_bin(program)
            .to_string_lossy()
            .to_string();
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().to_string())
            .collect();

        let expr = duct::cmd(&cargo_bin_path, args).dir(&self.default_cwd);
        self.inject_env(expr)
    }

    pub fn inject_env(&self, expr: Expression) -> Expression {
        let mut env_map: HashMap<String, String> = HashMap::new();
        if let Ok(path) = std::env::var("PATH") {
            env_map.insert("PATH".into(), path);
        }
        env_map.insert("HOME".into(), self.home.to_string_lossy().into_owned());
        env_map.insert("NO_COLOR".into(), "1".into());
        env_map.extend(self.extra_env.clone());

        expr.full_env(&env_map)
    }
}
