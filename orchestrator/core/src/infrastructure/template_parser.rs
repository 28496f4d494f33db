// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

// Checklist Template Parser
//
// Loads a checklist template from a YAML artifact and validates it before it
// reaches the domain. Deployments that don't ship an artifact use
// `ChecklistTemplate::default()`.

use std::path::Path;

use crate::domain::checklist::{ChecklistError, ChecklistTemplate};

pub struct TemplateParser;

#[derive(Debug, thiserror::Error)]
pub enum TemplateParseError {
    #[error("failed to read template file {0}: {1}")]
    Io(String, String),

    #[error("invalid template YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Invalid(#[from] ChecklistError),
}

impl TemplateParser {
    /// Parse a template from a YAML string
    pub fn parse_yaml(yaml: &str) -> Result<ChecklistTemplate, TemplateParseError> {
        let template: ChecklistTemplate = serde_yaml::from_str(yaml)?;
        template.validate()?;
        Ok(template)
    }

    /// Parse a template from a YAML file
    pub fn parse_file(path: impl AsRef<Path>) -> Result<ChecklistTemplate, TemplateParseError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TemplateParseError::Io(path.display().to_string(), e.to_string()))?;
        Self::parse_yaml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_template() {
        let yaml = r#"
phases:
  - name: "Kickoff"
    tasks:
      - "Agree on goals"
      - "Pick the team"
  - name: "Wrap-up"
    tasks:
      - "Write the retro"
"#;
        let template = TemplateParser::parse_yaml(yaml).unwrap();
        assert_eq!(template.phases.len(), 2);
        assert_eq!(template.phases[0].tasks.len(), 2);

        let checklist = template.instantiate();
        assert_eq!(checklist.phase_count(), 2);
        assert_eq!(checklist.phase(2).unwrap().name, "Wrap-up");
    }

    #[test]
    fn rejects_empty_and_duplicate_templates() {
        assert!(matches!(
            TemplateParser::parse_yaml("phases: []"),
            Err(TemplateParseError::Invalid(ChecklistError::EmptyTemplate))
        ));

        let duplicated = r#"
phases:
  - name: "Kickoff"
    tasks: ["same", "same"]
"#;
        assert!(matches!(
            TemplateParser::parse_yaml(duplicated),
            Err(TemplateParseError::Invalid(ChecklistError::DuplicateTask(_)))
        ));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(
            TemplateParser::parse_yaml("phases: [not-a-phase"),
            Err(TemplateParseError::Yaml(_))
        ));
    }
}
