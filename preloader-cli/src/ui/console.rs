//! Console helper view: an `indicatif` bar plus `dialoguer` selects.
//!
//! Everything is drawn on stdout because stderr is captured by the
//! supervisor for its log.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use preloader::coordination::{Decision, ProgressMessage};
use preloader::helper::{HelperView, Prompt};
use tracing::warn;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% | {prefix:.bold} {msg}";

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Helper view drawing to the terminal.
pub struct ConsoleView {
    term: Term,
    bar: Option<ProgressBar>,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            bar: None,
        }
    }

    fn bar(&mut self) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stdout());
            bar.set_style(bar_style());
            bar
        })
    }

    fn write_line(&self, line: &str) {
        if let Err(e) = self.term.write_line(line) {
            warn!(error = %e, "Failed to write prompt text");
        }
    }

    /// Show the prompt. Esc dismisses it (`None`); a prompt that cannot be
    /// shown at all answers with the prompt's safe decision.
    fn select(&self, prompt: &Prompt) -> Option<Decision> {
        let labels: Vec<&str> = prompt.choices.iter().map(|(label, _)| *label).collect();

        self.write_line("");
        self.write_line(&style(&prompt.title).bold().yellow().to_string());
        self.write_line(&prompt.message);

        match Select::with_theme(&ColorfulTheme::default())
            .items(&labels)
            .default(0)
            .interact_on_opt(&self.term)
        {
            Ok(choice) => choice
                .and_then(|i| prompt.choices.get(i))
                .map(|(_, decision)| *decision),
            Err(e) => {
                let decision = prompt.safe_decision();
                warn!(error = %e, action = decision.as_str(), "Prompt failed, using safe answer");
                Some(decision)
            }
        }
    }
}

impl Default for ConsoleView {
    fn default() -> Self {
        Self::new()
    }
}

impl HelperView for ConsoleView {
    fn render(&mut self, message: &ProgressMessage) {
        let done = message.done;
        let bar = self.bar();
        bar.set_prefix(message.phase.clone());
        bar.set_position(u64::from(message.percent()));
        bar.set_message(message.message.clone());
        if done {
            bar.finish();
        } else {
            bar.tick();
        }
    }

    fn ask(&mut self, prompt: &Prompt) -> Option<Decision> {
        // Keep the bar from redrawing over the select.
        match self.bar.as_ref() {
            Some(bar) => bar.suspend(|| self.select(prompt)),
            None => self.select(prompt),
        }
    }

    fn dispose(&mut self) {
        if let Some(bar) = self.bar.take() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }
}
