//! System executor: maps catalog functions onto desktop tools
//!
//! Targets a Linux desktop (`pactl`, `brightnessctl`, `xdg-open`, `gsettings`,
//! `nmcli`, `loginctl`). Launchers are spawned detached; everything else is
//! awaited under the configured timeout.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use super::{CommandExecutor, ExecutionResult, catalog};
use crate::config::ExecutorConfig;
use crate::router::Args;
use crate::{Error, Result};

/// What a validated function call turns into
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    /// Run a program; wait for it unless `detach`
    Spawn {
        program: String,
        args: Vec<String>,
        detach: bool,
        done: String,
    },
    /// Create a directory
    CreateDir(PathBuf),
    /// Answer without side effects
    Reply(String),
}

/// Executes catalog functions on the local machine
pub struct SystemExecutor {
    config: ExecutorConfig,
}

impl SystemExecutor {
    /// Create a new executor
    #[must_use]
    pub const fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.command_timeout_secs)
    }

    async fn run(&self, action: Action) -> Result<Value> {
        match action {
            Action::Reply(text) => Ok(Value::String(text)),
            Action::CreateDir(path) => {
                if self.config.dry_run {
                    return Ok(Value::String(format!("would create {}", path.display())));
                }
                tokio::fs::create_dir_all(&path).await?;
                Ok(Value::String(format!("created {}", path.display())))
            }
            Action::Spawn {
                program,
                args,
                detach,
                done,
            } => {
                if self.config.dry_run {
                    return Ok(Value::String(format!(
                        "would run: {program} {}",
                        args.join(" ")
                    )));
                }
                self.spawn(&program, &args, detach).await?;
                Ok(Value::String(done))
            }
        }
    }

    async fn spawn(&self, program: &str, args: &[String], detach: bool) -> Result<()> {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args);

        if detach {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
            cmd.spawn()
                .map_err(|e| Error::Executor(format!("failed to launch {program}: {e}")))?;
            return Ok(());
        }

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = cmd
            .spawn()
            .map_err(|e| Error::Executor(format!("failed to spawn {program}: {e}")))?;

        let output = tokio::time::timeout(self.timeout(), child.wait_with_output())
            .await
            .map_err(|_| Error::Executor(format!("{program} timed out")))?
            .map_err(|e| Error::Executor(format!("{program} process error: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Executor(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }

    async fn run_code(&self, code: &str) -> Result<String> {
        let mut child = tokio::process::Command::new(&self.config.interpreter)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Executor(format!(
                    "failed to spawn interpreter {}: {e}",
                    self.config.interpreter
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await?;
            // Dropping stdin closes the pipe so the interpreter sees EOF
        }

        let output = tokio::time::timeout(self.timeout(), child.wait_with_output())
            .await
            .map_err(|_| Error::Executor("generated code timed out".to_string()))?
            .map_err(|e| Error::Executor(format!("interpreter process error: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Executor(format!(
                "generated code exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(&self, function: &str, args: &Args) -> ExecutionResult {
        let Some(spec) = catalog::lookup(function) else {
            tracing::warn!(function, "unknown function");
            return ExecutionResult::failed(Error::UnknownFunction(function.to_string()).to_string());
        };

        let action = match spec
            .validate(args)
            .and_then(|valid| plan(function, &valid, &self.config.workspace_dir))
        {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(function, error = %e, "rejected function call");
                return ExecutionResult::failed(e.to_string());
            }
        };

        tracing::debug!(function, ?action, dry_run = self.config.dry_run, "executing");

        match self.run(action).await {
            Ok(value) => ExecutionResult::ok(value),
            Err(e) => {
                tracing::warn!(function, error = %e, "execution failed");
                ExecutionResult::failed(e.to_string())
            }
        }
    }

    async fn execute_raw(&self, code: &str) -> ExecutionResult {
        let code = strip_code_fences(code);
        if code.is_empty() {
            return ExecutionResult::failed("no code to run");
        }

        if !self.config.allow_generated_code {
            tracing::warn!("generated code execution is disabled");
            return ExecutionResult::failed("generated code execution is disabled");
        }

        if self.config.dry_run {
            return ExecutionResult::ok(format!(
                "would run {} lines with {}",
                code.lines().count(),
                self.config.interpreter
            ));
        }

        tracing::debug!(lines = code.lines().count(), "running generated code");

        match self.run_code(code).await {
            Ok(stdout) => ExecutionResult::ok(stdout),
            Err(e) => {
                tracing::warn!(error = %e, "generated code failed");
                ExecutionResult::failed(e.to_string())
            }
        }
    }
}

/// Remove a surrounding Markdown code fence (```python ... ```), if present
#[must_use]
pub fn strip_code_fences(code: &str) -> &str {
    let trimmed = code.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "python") on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Turn a validated call into an action
fn plan(function: &str, args: &Args, workspace: &Path) -> Result<Action> {
    let int = |key: &str| args.get(key).and_then(Value::as_i64).unwrap_or_default();
    let flag = |key: &str| args.get(key).and_then(Value::as_bool).unwrap_or_default();
    let text = |key: &str| {
        args.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let action = match function {
        "set_system_volume" => {
            let level = int("level");
            spawn(
                "pactl",
                &["set-sink-volume", "@DEFAULT_SINK@", &format!("{level}%")],
                format!("volume set to {level}%"),
            )
        }
        "adjust_volume" => {
            let change = int("change");
            spawn(
                "pactl",
                &["set-sink-volume", "@DEFAULT_SINK@", &format!("{change:+}%")],
                format!("volume changed by {change:+}%"),
            )
        }
        "mute_system_volume" => spawn(
            "pactl",
            &["set-sink-mute", "@DEFAULT_SINK@", "1"],
            "muted".to_string(),
        ),
        "unmute_system_volume" => spawn(
            "pactl",
            &["set-sink-mute", "@DEFAULT_SINK@", "0"],
            "unmuted".to_string(),
        ),
        "set_brightness" => {
            let level = int("level");
            spawn(
                "brightnessctl",
                &["set", &format!("{level}%")],
                format!("brightness set to {level}%"),
            )
        }
        "adjust_brightness" => {
            let change = int("change");
            let step = if change < 0 {
                format!("{}%-", change.unsigned_abs())
            } else {
                format!("{change}%+")
            };
            spawn(
                "brightnessctl",
                &["set", &step],
                format!("brightness changed by {change:+}%"),
            )
        }
        "open_application" => {
            let app = text("app_name");
            Action::Spawn {
                program: resolve_program(&app),
                args: Vec::new(),
                detach: true,
                done: format!("opened {app}"),
            }
        }
        "close_application" => {
            let app = text("app_name");
            spawn("pkill", &["-f", &resolve_program(&app)], format!("closed {app}"))
        }
        "take_screenshot" => spawn("gnome-screenshot", &[], "screenshot saved".to_string()),
        "open_camera_app" => Action::Spawn {
            program: "cheese".to_string(),
            args: Vec::new(),
            detach: true,
            done: "camera opened".to_string(),
        },
        "lock_workstation" => spawn("loginctl", &["lock-session"], "locked".to_string()),
        "hide_desktop_icons" | "show_desktop_icons" => {
            let show = function == "show_desktop_icons";
            spawn(
                "gsettings",
                &[
                    "set",
                    "org.gnome.desktop.background",
                    "show-desktop-icons",
                    if show { "true" } else { "false" },
                ],
                format!("desktop icons {}", if show { "shown" } else { "hidden" }),
            )
        }
        "toggle_night_light" => {
            let enable = flag("enable");
            spawn(
                "gsettings",
                &[
                    "set",
                    "org.gnome.settings-daemon.plugins.color",
                    "night-light-enabled",
                    if enable { "true" } else { "false" },
                ],
                format!("night light {}", on_off(enable)),
            )
        }
        "toggle_airplane_mode_advanced" => {
            let enable = flag("enable");
            // Airplane mode on means radios off
            spawn(
                "nmcli",
                &["radio", "all", if enable { "off" } else { "on" }],
                format!("airplane mode {}", on_off(enable)),
            )
        }
        "play_youtube_video_ultra_direct" => {
            let term = text("search_term");
            Action::Spawn {
                program: "xdg-open".to_string(),
                args: vec![format!(
                    "https://www.youtube.com/results?search_query={}",
                    urlencoding::encode(&term)
                )],
                detach: true,
                done: format!("playing {term} on YouTube"),
            }
        }
        "create_folder" => Action::CreateDir(workspace.join(folder_component(&text("folder_name"))?)),
        "create_powerpoint_presentation" => {
            let topic = text("topic");
            Action::Spawn {
                program: "libreoffice".to_string(),
                args: vec!["--impress".to_string()],
                detach: true,
                done: format!("presentation on {topic} started"),
            }
        }
        "tell_time" => Action::Reply(format!(
            "It's {}",
            chrono::Local::now().format("%-I:%M %p")
        )),
        other => return Err(Error::UnknownFunction(other.to_string())),
    };

    Ok(action)
}

fn spawn(program: &str, args: &[&str], done: String) -> Action {
    Action::Spawn {
        program: program.to_string(),
        args: args.iter().map(ToString::to_string).collect(),
        detach: false,
        done,
    }
}

const fn on_off(enable: bool) -> &'static str {
    if enable { "on" } else { "off" }
}

/// Map a spoken application name to an executable
fn resolve_program(app: &str) -> String {
    let name = app.trim().to_lowercase();
    match name.as_str() {
        "chrome" | "google chrome" => "google-chrome".to_string(),
        "browser" | "web browser" => "x-www-browser".to_string(),
        "files" | "file manager" | "explorer" | "file explorer" => "nautilus".to_string(),
        "terminal" | "command prompt" | "console" => "x-terminal-emulator".to_string(),
        "calculator" => "gnome-calculator".to_string(),
        "vs code" | "vscode" | "visual studio code" => "code".to_string(),
        "notepad" | "text editor" => "gedit".to_string(),
        _ => name.replace(' ', "-"),
    }
}

/// A folder name must be a single plain path component
fn folder_component(name: &str) -> Result<PathBuf> {
    let path = Path::new(name.trim());
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) => Ok(PathBuf::from(c)),
        _ => Err(Error::InvalidArgument {
            name: "folder_name".to_string(),
            reason: "must be a single folder name".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dry_run(workspace: &Path) -> SystemExecutor {
        SystemExecutor::new(ExecutorConfig {
            dry_run: true,
            workspace_dir: workspace.to_path_buf(),
            ..ExecutorConfig::default()
        })
    }

    fn args(v: Value) -> Args {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fences("  print(2)  "), "print(2)");
        assert_eq!(strip_code_fences("```\nx = 1\ny = 2\n```\n"), "x = 1\ny = 2");
    }

    #[test]
    fn plans_volume_and_brightness() {
        let ws = Path::new("/tmp");
        assert_eq!(
            plan("set_system_volume", &args(json!({"level": 40})), ws).unwrap(),
            spawn(
                "pactl",
                &["set-sink-volume", "@DEFAULT_SINK@", "40%"],
                "volume set to 40%".to_string()
            )
        );

        let Action::Spawn { args: a, .. } =
            plan("adjust_brightness", &args(json!({"change": -20})), ws).unwrap()
        else {
            panic!("expected spawn");
        };
        assert_eq!(a, ["set", "20%-"]);
    }

    #[test]
    fn resolves_common_apps() {
        assert_eq!(resolve_program("Chrome"), "google-chrome");
        assert_eq!(resolve_program("spotify"), "spotify");
        assert_eq!(resolve_program("libre office"), "libre-office");
    }

    #[test]
    fn folder_name_must_be_single_component() {
        assert!(folder_component("projects").is_ok());
        assert!(folder_component("../etc").is_err());
        assert!(folder_component("a/b").is_err());
        assert!(folder_component("/abs").is_err());
    }

    #[tokio::test]
    async fn timed_out_code_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let executor = SystemExecutor::new(ExecutorConfig {
            interpreter: "sh".to_string(),
            command_timeout_secs: 1,
            workspace_dir: dir.path().to_path_buf(),
            ..ExecutorConfig::default()
        });

        let code = format!("sleep 3; touch {}", marker.display());
        let result = executor.execute_raw(&code).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));

        tokio::time::sleep(std::time::Duration::from_secs(4)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn unknown_function_fails_without_raising() {
        let dir = tempfile::tempdir().unwrap();
        let result = dry_run(dir.path()).execute("format_disk", &Args::new()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("unknown function"));
    }

    #[tokio::test]
    async fn invalid_args_fail_without_raising() {
        let dir = tempfile::tempdir().unwrap();
        let result = dry_run(dir.path())
            .execute("set_brightness", &args(json!({"level": 300})))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("level"));
    }

    #[tokio::test]
    async fn dry_run_reports_command() {
        let dir = tempfile::tempdir().unwrap();
        let result = dry_run(dir.path())
            .execute("mute_system_volume", &Args::new())
            .await;
        assert!(result.success);
        assert_eq!(
            result.result,
            Some(json!("would run: pactl set-sink-mute @DEFAULT_SINK@ 1"))
        );
    }

    #[tokio::test]
    async fn creates_folder_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let executor = SystemExecutor::new(ExecutorConfig {
            workspace_dir: dir.path().to_path_buf(),
            ..ExecutorConfig::default()
        });

        let result = executor
            .execute("create_folder", &args(json!({"folder_name": "test"})))
            .await;
        assert!(result.success, "{result:?}");
        assert!(dir.path().join("test").is_dir());
    }

    #[tokio::test]
    async fn tell_time_replies() {
        let dir = tempfile::tempdir().unwrap();
        let result = dry_run(dir.path()).execute("tell_time", &Args::new()).await;
        assert!(result.success);
        assert!(result.summary().starts_with("It's "));
    }

    #[tokio::test]
    async fn raw_code_respects_policy() {
        let disabled = SystemExecutor::new(ExecutorConfig {
            allow_generated_code: false,
            ..ExecutorConfig::default()
        });
        let result = disabled.execute_raw("print('hi')").await;
        assert!(!result.success);

        let dir = tempfile::tempdir().unwrap();
        let result = dry_run(dir.path()).execute_raw("```python\nprint('hi')\n```").await;
        assert!(result.success);
        assert_eq!(result.summary(), "would run 1 lines with python3");

        let result = dry_run(dir.path()).execute_raw("``` ```").await;
        assert!(!result.success);
    }
}
