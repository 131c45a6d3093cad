use crate::error::{ConvertError, UserFriendlyError};
use crate::pipeline::RunSummary;
use crate::scanner::format_bytes;
use console::{style, Emoji, Term};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static PAGE: Emoji = Emoji("📄 ", "> ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", PAGE, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &ConvertError) {
        self.print_error_report(&error.user_message(), error);
    }

    /// Prints the status line of a failed run together with the error details.
    pub fn print_failure(&self, status: &str, error: &ConvertError) {
        self.print_error_report(status, error);
    }

    fn print_error_report(&self, headline: &str, error: &ConvertError) {
        if self.mode == OutputMode::Json {
            self.print_json_object(&serde_json::json!({
                "type": "error",
                "kind": error.kind().to_string(),
                "message": headline,
                "details": error.to_string(),
                "suggestion": error.suggestion(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }));
            return;
        }

        self.error(headline);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
                OutputMode::Json => {}
            }
        }
    }

    /// Lists the PDFs that a failed run wrote before stopping.
    pub fn print_partial_outputs(&self, written: &[PathBuf]) {
        if written.is_empty() || self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "partial",
                    "written": written,
                }));
            }
            _ => {
                eprintln!("PDFs written before the failure:");
                for path in written {
                    eprintln!("  {}", path.display());
                }
            }
        }
    }

    pub fn print_run_summary(&self, summary: &RunSummary) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_summary(summary),
            OutputMode::Json => self.print_json_summary(summary),
            OutputMode::Plain => self.print_plain_summary(summary),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => println!("{}", "-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if self.use_colors {
            let (emoji, styled) = match msg_type {
                MessageType::Success => (&CHECKMARK, style(message).green().bold()),
                MessageType::Error => (&CROSS, style(message).red().bold()),
                MessageType::Warning => (&WARNING, style(message).yellow().bold()),
                MessageType::Info => (&INFO, style(message).cyan()),
            };

            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, styled),
                _ => println!("{}{}", emoji, styled),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn highlight(&self, value: String) -> String {
        if self.use_colors {
            style(value).cyan().bold().to_string()
        } else {
            value
        }
    }

    fn print_human_summary(&self, summary: &RunSummary) {
        self.print_separator();

        if self.verbose_level >= 1 {
            for document in &summary.documents {
                println!(
                    "  {} -> {} ({} page{})",
                    document.source.display(),
                    document.output.display(),
                    document.pages,
                    if document.pages == 1 { "" } else { "s" }
                );
            }
            if !summary.documents.is_empty() {
                println!();
            }
        }

        println!(
            "  Documents converted: {}",
            self.highlight(summary.converted().to_string())
        );
        println!(
            "  Pages written:       {}",
            self.highlight(summary.total_pages().to_string())
        );
        println!(
            "  Files extracted:     {} ({})",
            self.highlight(summary.extraction.files_written.to_string()),
            format_bytes(summary.extraction.bytes_written)
        );
        println!(
            "  Output directory:    {}",
            summary.output_directory.display()
        );
        println!(
            "  Time taken:          {}",
            self.highlight(format_duration(Duration::from_millis(
                summary.duration_ms.min(u64::MAX as u128) as u64
            )))
        );

        self.print_separator();
    }

    fn print_json_summary(&self, summary: &RunSummary) {
        let mut value = serde_json::to_value(summary).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(object) = value.as_object_mut() {
            object.insert("type".to_string(), serde_json::json!("summary"));
            object.insert("total_pages".to_string(), serde_json::json!(summary.total_pages()));
        }
        self.print_json_object(&value);
    }

    fn print_plain_summary(&self, summary: &RunSummary) {
        println!("COMPLETED: {}", summary.archive.display());
        for document in &summary.documents {
            println!(
                "CONVERTED: {} -> {} ({} pages)",
                document.source.display(),
                document.output.display(),
                document.pages
            );
        }
        println!("Documents: {}", summary.converted());
        println!("Pages: {}", summary.total_pages());
        println!("Duration: {}ms", summary.duration_ms);
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
