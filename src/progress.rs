/// Progress feedback for network operations.
///
/// Shows an animated spinner on a terminal; otherwise stays silent and leaves
/// reporting to the log lines.
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        if !std::io::stderr().is_terminal() {
            return Spinner { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("  {spinner:.green} {msg}")
            .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "))
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Spinner { bar: Some(bar) }
    }

    /// Stops the spinner and prints a closing line.
    pub fn finish(self, message: &str) {
        match self.bar {
            Some(bar) => bar.finish_with_message(message.to_string()),
            None => eprintln!("{}", message),
        }
    }

    /// Stops the spinner without leaving a line behind.
    pub fn clear(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_matches_terminal_state() {
        let spinner = Spinner::start("Fetching");
        assert_eq!(spinner.bar.is_some(), std::io::stderr().is_terminal());
        spinner.clear();
    }
}
