use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use nr_lambda_layers::Prompt;

/// Interactive disambiguation through the terminal.
///
/// Declines to choose when the process is not attached to a terminal, which makes ambiguous
/// selections fail fast instead of hanging a pipeline.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn choose(&self, message: &str, options: &[String]) -> Option<usize> {
        if !console::user_attended() {
            return None;
        }

        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .items(options)
            .default(0)
            .interact_opt()
            .ok()
            .flatten()
    }
}
