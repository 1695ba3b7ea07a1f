//! Mirroring warnings and errors to an operator.

use crate::logging::{tag_for, TIMESTAMP_FORMAT};
use chrono::Local;
use std::fmt::{self, Write as _};
use std::io::Write as _;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Receives every WARNING and ERROR line.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, level: Level, line: &str);
}

/// Forwards WARN and ERROR events to a [`Notifier`].
pub struct NotifyLayer<N> {
    notifier: N,
}

impl<N: Notifier> NotifyLayer<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }
}

impl<S: Subscriber, N: Notifier> Layer<S> for NotifyLayer<N> {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > Level::WARN {
            return;
        }

        let mut message = MessageVisitor::default();
        event.record(&mut message);

        let line = format!(
            "[{}][{}] {}",
            Local::now().format(TIMESTAMP_FORMAT),
            tag_for(&level),
            message.into_line()
        );
        self.notifier.notify(level, &line);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn into_line(self) -> String {
        self.message + &self.fields
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }
}

const MAIL_TIMEOUT: Duration = Duration::from_secs(10);
const MAIL_POLL: Duration = Duration::from_millis(50);

/// Sends each line through the local `mail` command.
///
/// The layer calls this synchronously, so a hung mailer is abandoned after
/// the timeout instead of stalling the run.
pub struct MailNotifier {
    program: String,
    recipient: String,
    subject: String,
    timeout: Duration,
}

impl MailNotifier {
    pub fn new(recipient: impl Into<String>, domain: &str) -> Self {
        Self {
            program: "mail".to_string(),
            recipient: recipient.into(),
            subject: format!(
                "Error updating DNS records for {} from {}",
                domain,
                hostname()
            ),
            timeout: MAIL_TIMEOUT,
        }
    }

    /// Use a different mailer. It is invoked as `<program> -s <subject> <recipient>`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    fn send(&self, body: &str) -> std::io::Result<()> {
        let mut child = Command::new(&self.program)
            .arg("-s")
            .arg(&self.subject)
            .arg(&self.recipient)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(wrap(body, 70).as_bytes())?;
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                if !status.success() {
                    return Err(std::io::Error::other(format!(
                        "{} exited with {}",
                        self.program, status
                    )));
                }
                return Ok(());
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("{} did not finish within {:?}", self.program, self.timeout),
                ));
            }
            std::thread::sleep(MAIL_POLL);
        }
    }
}

impl Notifier for MailNotifier {
    fn notify(&self, _level: Level, line: &str) {
        // Never log from here: the event would come straight back.
        if let Err(e) = self.send(line) {
            eprintln!("Could not mail notification to {}: {}", self.recipient, e);
        }
    }
}

fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| std::fs::read_to_string("/etc/hostname"))
        .map(|name| name.trim().to_string())
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "unknown host".to_string())
}

/// Wrap text at `width` columns on word boundaries, CRLF line endings.
fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\r\n")
}
