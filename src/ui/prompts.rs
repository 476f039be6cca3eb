//! Interactive prompts.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, MultiSelect};

use crate::error::{ArmoryError, Result};

use super::{parse_bool, Prompt, PromptOption, PromptResult, PromptType};

fn map_dialoguer_err(e: dialoguer::Error) -> ArmoryError {
    ArmoryError::Io(e.into())
}

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

/// Ask the operator on `term`. Blocks until answered.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    match &prompt.prompt_type {
        PromptType::Confirm => prompt_confirm(prompt, term),
        PromptType::MultiSelect { options } => prompt_multiselect(prompt, options, term),
    }
}

fn prompt_confirm(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let default = prompt.default.as_deref().map(parse_bool).unwrap_or(false);

    let result = Confirm::with_theme(&prompt_theme())
        .with_prompt(&prompt.question)
        .default(default)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    Ok(PromptResult::Bool(result))
}

fn prompt_multiselect(
    prompt: &Prompt,
    options: &[PromptOption],
    term: &Term,
) -> Result<PromptResult> {
    let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
    let defaults = default_selection(prompt, options);

    let selections = MultiSelect::with_theme(&prompt_theme())
        .with_prompt(&prompt.question)
        .items(&labels)
        .defaults(&defaults)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    // dialoguer returns indices in selection order; keep menu order.
    let mut selections = selections;
    selections.sort_unstable();
    let values = selections
        .into_iter()
        .map(|i| options[i].value.clone())
        .collect();

    Ok(PromptResult::Strings(values))
}

/// Pre-checked items from a comma-separated `default`.
fn default_selection(prompt: &Prompt, options: &[PromptOption]) -> Vec<bool> {
    let wanted: Vec<&str> = prompt
        .default
        .as_deref()
        .map(|d| d.split(',').map(str::trim).collect())
        .unwrap_or_default();
    options
        .iter()
        .map(|o| wanted.contains(&o.value.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(value: &str) -> PromptOption {
        PromptOption {
            label: value.to_uppercase(),
            value: value.to_string(),
        }
    }

    #[test]
    fn default_selection_marks_listed_values() {
        let options = vec![option("nmap"), option("ffuf"), option("docker")];
        let prompt = Prompt {
            key: "steps".into(),
            question: "Select steps".into(),
            prompt_type: PromptType::MultiSelect {
                options: options.clone(),
            },
            default: Some("docker, nmap".into()),
        };

        assert_eq!(
            default_selection(&prompt, &options),
            vec![true, false, true]
        );
    }

    #[test]
    fn no_default_selects_nothing() {
        let options = vec![option("nmap")];
        let prompt = Prompt {
            key: "steps".into(),
            question: "Select steps".into(),
            prompt_type: PromptType::MultiSelect {
                options: options.clone(),
            },
            default: None,
        };
        assert_eq!(default_selection(&prompt, &options), vec![false]);
    }
}
