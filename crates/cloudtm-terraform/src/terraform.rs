//! terraform CLI wrapper
//!
//! Every subcommand runs with the terminal attached. `apply` additionally
//! tees stdout into memory so the caller can read the change summary.

use crate::error::{Result, TerraformError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::sync::mpsc;

pub const DEFAULT_PROGRAM: &str = "terraform";
pub const AUTO_APPROVE_FLAG: &str = "--auto-approve";

/// How `apply` / `destroy` should confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    /// Terraform prompts; terminal input is relayed to it.
    Interactive,
    /// `--auto-approve` is passed.
    Auto,
}

impl Approval {
    pub fn from_flag(auto_approve: bool) -> Self {
        if auto_approve {
            Approval::Auto
        } else {
            Approval::Interactive
        }
    }
}

/// Captured result of a teed run
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
}

impl CapturedOutput {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// terraform CLI wrapper
#[derive(Debug, Clone)]
pub struct Terraform {
    program: String,
    working_dir: Option<PathBuf>,
}

impl Default for Terraform {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Terraform {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            working_dir: None,
        }
    }

    /// Same program, run inside `dir` instead of the current directory.
    pub fn in_dir(&self, dir: impl AsRef<Path>) -> Self {
        Self {
            program: self.program.clone(),
            working_dir: Some(dir.as_ref().to_path_buf()),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Resolve the program on `PATH`.
    pub fn locate(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|_| TerraformError::NotFound {
            program: self.program.clone(),
        })
    }

    /// `terraform init [args]`
    pub async fn init(&self, extra_args: &[String]) -> Result<()> {
        let mut args = vec!["init".to_string()];
        args.extend_from_slice(extra_args);
        self.run_attached(&args).await
    }

    /// `terraform apply [--auto-approve] [args]`, returning what it printed.
    pub async fn apply(&self, approval: Approval, extra_args: &[String]) -> Result<CapturedOutput> {
        let mut args = vec!["apply".to_string()];
        if approval == Approval::Auto && !has_auto_approve(extra_args) {
            args.push(AUTO_APPROVE_FLAG.to_string());
        }
        args.extend_from_slice(extra_args);
        self.run_teed(&args, approval == Approval::Interactive).await
    }

    /// `terraform destroy [--auto-approve]`
    pub async fn destroy(&self, approval: Approval) -> Result<()> {
        let mut args = vec!["destroy".to_string()];
        if approval == Approval::Auto {
            args.push(AUTO_APPROVE_FLAG.to_string());
        }
        self.run_attached(&args).await
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        tracing::debug!(
            "Running: {} {} (in {})",
            self.program,
            args.join(" "),
            self.working_dir
                .as_deref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| ".".to_string())
        );
        cmd
    }

    fn spawn_error(&self, args: &[String]) -> impl FnOnce(std::io::Error) -> TerraformError {
        let program = self.program.clone();
        let command = args.join(" ");
        move |source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                TerraformError::NotFound { program }
            } else {
                TerraformError::Spawn {
                    program,
                    command,
                    source,
                }
            }
        }
    }

    /// Run with stdin/stdout/stderr inherited.
    async fn run_attached(&self, args: &[String]) -> Result<()> {
        let status = self
            .command(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(self.spawn_error(args))?;

        if !status.success() {
            return Err(TerraformError::CommandFailed {
                command: args.first().cloned().unwrap_or_default(),
                status,
            });
        }
        Ok(())
    }

    /// Run with stdout streamed to the terminal and copied into memory.
    async fn run_teed(&self, args: &[String], relay_input: bool) -> Result<CapturedOutput> {
        let mut child = self
            .command(args)
            .stdin(if relay_input {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(self.spawn_error(args))?;

        let relay = child.stdin.take().map(|stdin| tokio::spawn(relay_terminal_input(stdin)));

        let mut captured = CapturedOutput::default();
        let drained = match child.stdout.take() {
            Some(stdout) => tee(stdout, tokio::io::stdout(), &mut captured.stdout).await,
            None => Ok(()),
        };

        // 出力側が壊れても terraform の終了は待つ
        let status = child.wait().await?;
        if let Some(relay) = relay {
            relay.abort();
        }
        drained?;

        if !status.success() {
            return Err(TerraformError::CommandFailed {
                command: args.first().cloned().unwrap_or_default(),
                status,
            });
        }
        Ok(captured)
    }
}

/// Copy `reader` to `terminal` and into `captured` until EOF.
///
/// A terminal write failure (closed pipe) stops the mirroring only; the
/// child's output is still drained so it never blocks on a full pipe.
async fn tee<R, W>(mut reader: R, mut terminal: W, captured: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut mirror = true;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if mirror {
            let written = match terminal.write_all(&buf[..n]).await {
                Ok(()) => terminal.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                tracing::warn!(error = %e, "Terminal output closed, capturing only");
                mirror = false;
            }
        }
        captured.extend_from_slice(&buf[..n]);
    }
    Ok(())
}

/// Whether the arguments already ask Terraform to skip approval.
pub fn has_auto_approve(args: &[String]) -> bool {
    args.iter().any(|a| a.contains("-auto-approve"))
}

/// Forward terminal lines to the child until either side closes.
///
/// Lines are read on a plain thread: a blocked terminal read cannot be
/// cancelled and must not hold the runtime open after the child exits.
async fn relay_terminal_input(mut stdin: ChildStdin) {
    let (tx, mut rx) = mpsc::channel::<String>(16);

    std::thread::spawn(move || {
        let mut line = String::new();
        loop {
            line.clear();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.blocking_send(line.clone()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    while let Some(line) = rx.recv().await {
        let line = normalize_answer(&line);
        if stdin.write_all(line.as_bytes()).await.is_err() {
            break;
        }
        let _ = stdin.flush().await;
    }
}

/// `yes` in any case or padding is passed on as a plain `yes`.
fn normalize_answer(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("yes") {
        "yes\n".to_string()
    } else {
        format!("{}\n", trimmed)
    }
}
