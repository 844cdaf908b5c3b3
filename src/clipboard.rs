use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard tool available (tried {0})")]
    Unavailable(String),
    #[error("clipboard tool {tool} failed: {reason}")]
    Failed { tool: String, reason: String },
}

/// Write-only access to the system clipboard
#[async_trait]
pub trait Clipboard: Send {
    async fn copy(&mut self, text: &str) -> Result<(), ClipboardError>;
}

const NO_ARGS: &[&str] = &[];
const XCLIP_ARGS: &[&str] = &["-selection", "clipboard"];

/// Pipes text into the first platform copy tool that runs
pub struct SystemClipboard {
    candidates: Vec<(&'static str, &'static [&'static str])>,
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self {
            candidates: vec![
                ("pbcopy", NO_ARGS),
                ("wl-copy", NO_ARGS),
                ("xclip", XCLIP_ARGS),
                ("clip.exe", NO_ARGS),
            ],
        }
    }

    async fn pipe_to(tool: &str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
        let failed = |reason: String| ClipboardError::Failed {
            tool: tool.to_string(),
            reason,
        };

        let mut child = Command::new(tool)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| failed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| failed(e.to_string()))?;
        }

        let status = child.wait().await.map_err(|e| failed(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(failed(format!("exited with {}", status)))
        }
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        for (tool, args) in &self.candidates {
            match Self::pipe_to(tool, args, text).await {
                Ok(()) => return Ok(()),
                Err(err) => tracing::debug!(error = %err, "clipboard candidate failed"),
            }
        }

        let tried: Vec<&str> = self.candidates.iter().map(|(tool, _)| *tool).collect();
        Err(ClipboardError::Unavailable(tried.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[tokio::test]
    async fn test_missing_tools_report_unavailable() {
        let mut clipboard = SystemClipboard {
            candidates: vec![("vts-chat-no-such-copy-tool", NO_ARGS)],
        };
        let err = clipboard.copy("hello").await.unwrap_err();
        assert!(matches!(err, ClipboardError::Unavailable(ref tried) if tried.contains("no-such")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_tool_leaves_runtime_free() {
        const SLEEP_ARGS: &[&str] = &["1"];
        let mut clipboard = SystemClipboard {
            candidates: vec![("sleep", SLEEP_ARGS)],
        };

        let copy = tokio::spawn(async move { clipboard.copy("hello").await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!copy.is_finished());

        assert!(copy.await.unwrap().is_ok());
    }
}
