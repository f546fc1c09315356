use std::io;

use dialoguer::{theme::ColorfulTheme, Confirm};

fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

pub fn ask_confirm(prompt: &str, default: bool) -> io::Result<bool> {
    Confirm::with_theme(&theme())
        .with_prompt(prompt)
        .default(default)
        .interact()
}
