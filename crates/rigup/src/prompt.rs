//! dialoguer-backed operator prompts

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use rigup_deploy::{DeployError, Interaction};

pub struct ConsolePrompter {
    theme: ColorfulTheme,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

fn prompt_error(error: dialoguer::Error) -> DeployError {
    DeployError::Prompt(error.to_string())
}

impl Interaction for ConsolePrompter {
    fn confirm(&mut self, message: &str) -> rigup_deploy::Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .interact()
            .map_err(prompt_error)
    }

    fn select(&mut self, message: &str, items: &[String]) -> rigup_deploy::Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(items)
            .default(0)
            .interact()
            .map_err(prompt_error)
    }

    fn input(&mut self, message: &str) -> rigup_deploy::Result<String> {
        Input::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    fn password(&mut self, message: &str) -> rigup_deploy::Result<String> {
        Password::with_theme(&self.theme)
            .with_prompt(message)
            .interact()
            .map_err(prompt_error)
    }

    fn pause(&mut self, message: &str) -> rigup_deploy::Result<()> {
        Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(&["OK"])
            .default(0)
            .interact()
            .map_err(prompt_error)?;
        Ok(())
    }
}
