use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on the pool size; the pool is meant to stay small.
pub const MAX_WORKERS: usize = 16;

const DEFAULT_WORKER_COUNT: usize = 2;
const DEFAULT_WORKER_PROGRAM: &str = "java";
const DEFAULT_WORKER_ARGS: &str = "-jar out/artifacts/node_gephi_lgl_jar/node-gephi-lgl.jar";
const DEFAULT_SCRATCH_DIR: &str = "workspace";
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 300;

/// How to launch one layout worker. The allocated port is appended as the
/// final positional argument.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child process (current dir if `None`).
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables set on the child process.
    pub env_vars: Vec<(String, String)>,
}

/// Pool configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub worker_count: usize,
    pub worker: WorkerCommand,
    /// Command run to completion before any worker is spawned, so stale
    /// workers from an earlier run release their ports.
    pub kill_command: Option<Vec<String>>,
    /// Directory holding per-job input/output files.
    pub scratch_dir: PathBuf,
    /// How long a worker may take to print its readiness line.
    pub startup_timeout: Duration,
    /// Deadline for a single `/calculate` call.
    pub rpc_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got \"{value}\"")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env_vars: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            worker: WorkerCommand {
                program: DEFAULT_WORKER_PROGRAM.to_string(),
                args: split_words(DEFAULT_WORKER_ARGS),
                working_dir: None,
                env_vars: Vec::new(),
            },
            kill_command: None,
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                                  |
    /// |----------------------------|----------------------------------------------------------|
    /// | `LGL_WORKER_COUNT`         | `2`                                                      |
    /// | `LGL_WORKER_PROGRAM`       | `java`                                                   |
    /// | `LGL_WORKER_ARGS`          | `-jar out/artifacts/node_gephi_lgl_jar/node-gephi-lgl.jar` |
    /// | `LGL_WORKER_DIR`           | unset                                                    |
    /// | `LGL_KILL_COMMAND`         | unset                                                    |
    /// | `LGL_SCRATCH_DIR`          | `workspace`                                              |
    /// | `LGL_STARTUP_TIMEOUT_SECS` | `30`                                                     |
    /// | `LGL_RPC_TIMEOUT_SECS`     | `300`                                                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let worker_count = match lookup("LGL_WORKER_COUNT") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if (1..=MAX_WORKERS).contains(&n) => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "LGL_WORKER_COUNT",
                        expected: "an integer between 1 and 16",
                        value: raw,
                    })
                }
            },
            None => defaults.worker_count,
        };

        let worker = WorkerCommand {
            program: lookup("LGL_WORKER_PROGRAM")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.worker.program),
            args: lookup("LGL_WORKER_ARGS")
                .map(|raw| split_words(&raw))
                .unwrap_or(defaults.worker.args),
            working_dir: lookup("LGL_WORKER_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            env_vars: Vec::new(),
        };

        let kill_command = lookup("LGL_KILL_COMMAND")
            .map(|raw| split_words(&raw))
            .filter(|words| !words.is_empty());

        let scratch_dir = lookup("LGL_SCRATCH_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.scratch_dir);

        let startup_timeout = secs(&lookup, "LGL_STARTUP_TIMEOUT_SECS")?
            .unwrap_or(defaults.startup_timeout);
        let rpc_timeout = secs(&lookup, "LGL_RPC_TIMEOUT_SECS")?.unwrap_or(defaults.rpc_timeout);

        Ok(Self {
            worker_count,
            worker,
            kill_command,
            scratch_dir,
            startup_timeout,
            rpc_timeout,
        })
    }
}

fn secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(Duration::from_secs(n))),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a positive number of seconds",
            value: raw,
        }),
    }
}

fn split_words(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<PoolConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PoolConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_launch_the_lgl_jar() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.worker.program, "java");
        assert_eq!(config.worker.args[0], "-jar");
        assert!(config.kill_command.is_none());
        assert_eq!(config.scratch_dir, PathBuf::from("workspace"));
        assert_eq!(config.rpc_timeout, Duration::from_secs(300));
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("LGL_WORKER_COUNT", "4"),
            ("LGL_WORKER_PROGRAM", "/opt/lgl/run"),
            ("LGL_WORKER_ARGS", "--headless  --verbose"),
            ("LGL_KILL_COMMAND", "sh kill.sh"),
            ("LGL_STARTUP_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.worker.program, "/opt/lgl/run");
        assert_eq!(config.worker.args, vec!["--headless", "--verbose"]);
        assert_eq!(
            config.kill_command,
            Some(vec!["sh".to_string(), "kill.sh".to_string()])
        );
        assert_eq!(config.startup_timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_kill_command_is_disabled() {
        let config = config_from(&[("LGL_KILL_COMMAND", "   ")]).unwrap();
        assert!(config.kill_command.is_none());
    }

    #[test]
    fn worker_count_out_of_range_is_rejected() {
        assert_matches!(
            config_from(&[("LGL_WORKER_COUNT", "0")]),
            Err(ConfigError::Invalid { var: "LGL_WORKER_COUNT", .. })
        );
        assert_matches!(
            config_from(&[("LGL_WORKER_COUNT", "17")]),
            Err(ConfigError::Invalid { var: "LGL_WORKER_COUNT", .. })
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert_matches!(
            config_from(&[("LGL_RPC_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid { var: "LGL_RPC_TIMEOUT_SECS", .. })
        );
    }
}
