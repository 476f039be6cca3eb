//! Step selection menu and the reboot question.

use crate::catalog::StepCatalog;
use crate::error::Result;

use super::{Prompt, PromptOption, PromptType, UserInterface};

/// Menu entries in catalog order, labelled with their keys.
pub fn step_options(catalog: &StepCatalog) -> Vec<PromptOption> {
    catalog
        .all()
        .iter()
        .map(|step| {
            let key = step.key.map(|k| k.to_string()).unwrap_or_else(|| " ".into());
            PromptOption {
                label: format!("[{}] {} - {}", key, step.id, step.description),
                value: step.id.clone(),
            }
        })
        .collect()
}

/// Ask which steps to run. Returns ids in menu order.
pub fn select_steps(ui: &mut dyn UserInterface, catalog: &StepCatalog) -> Result<Vec<String>> {
    let prompt = Prompt {
        key: "steps".to_string(),
        question: "Select steps to run (space to toggle, enter to confirm)".to_string(),
        prompt_type: PromptType::MultiSelect {
            options: step_options(catalog),
        },
        default: None,
    };
    let picked = ui.prompt(&prompt)?.into_strings();
    Ok(catalog.resolve_selection(&picked))
}

/// Ask whether to reboot now. Defaults to no.
pub fn confirm_reboot(ui: &mut dyn UserInterface) -> Result<bool> {
    let prompt = Prompt {
        key: "reboot".to_string(),
        question: "Services still need a restart. Reboot now?".to_string(),
        prompt_type: PromptType::Confirm,
        default: Some("no".to_string()),
    };
    Ok(ui.prompt(&prompt)?.as_bool().unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::ui::MockUI;
    use std::path::Path;

    fn catalog() -> StepCatalog {
        let yaml = r#"
steps:
  - id: nmap
    description: Network scanner
    check: { binary_on_path: nmap }
    action: { package: { packages: [nmap] } }
  - id: ffuf
    key: f
    description: Web fuzzer
    check: { binary_on_path: ffuf }
    action: { shell: { run: "go install ffuf" } }
"#;
        let config = parse_config(yaml, Path::new("test.yml")).unwrap();
        StepCatalog::from_config(&config).unwrap()
    }

    #[test]
    fn options_follow_catalog_order_with_keys() {
        let options = step_options(&catalog());
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(
            labels,
            ["[a] nmap - Network scanner", "[f] ffuf - Web fuzzer"]
        );
        assert_eq!(options[1].value, "ffuf");
    }

    #[test]
    fn select_steps_accepts_keys_and_ids() {
        let catalog = catalog();
        let mut ui = MockUI::new();
        ui.set_prompt_response("steps", "f,nmap");

        let ids = select_steps(&mut ui, &catalog).unwrap();

        assert_eq!(ids, vec!["ffuf", "nmap"]);
        assert_eq!(ui.prompts_shown(), &["steps"]);
    }

    #[test]
    fn reboot_defaults_to_no() {
        let mut ui = MockUI::new();
        assert!(!confirm_reboot(&mut ui).unwrap());

        ui.set_prompt_response("reboot", "y");
        assert!(confirm_reboot(&mut ui).unwrap());
    }
}
