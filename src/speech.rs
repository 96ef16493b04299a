use std::process::Stdio;

/// Speaks location names aloud.
pub trait Speaker {
    fn speak(&self, text: &str);
}

/// Runs an external synthesizer (`espeak`, `say`, ...) with the text as its
/// last argument. Never waits for the child.
#[derive(Debug, Clone, Default)]
pub struct CommandSpeaker {
    program: Option<String>,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// `command` is split on whitespace; `None` or blank only logs.
    pub fn new(command: Option<&str>) -> Self {
        let mut parts = command.unwrap_or_default().split_whitespace().map(str::to_string);
        Self {
            program: parts.next(),
            args: parts.collect(),
        }
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) {
        let Some(program) = &self.program else {
            tracing::info!(text, "speak");
            return;
        };
        let spawned = tokio::process::Command::new(program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false)
            .spawn();
        if let Err(e) = spawned {
            tracing::warn!(program = %program, error = %e, "speech synthesizer failed to start");
        }
    }
}
