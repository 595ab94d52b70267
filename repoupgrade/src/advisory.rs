//! Maintainer advisories.
//!
//! The classifier records "create tag" instructions while it works; once all
//! packages are converted the accumulated [`AdvisoryState`] is turned into a
//! single closing message.

use crate::schema::{SchemaVersion, TargetSchema};

/// Per-conversion advisory accumulator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisoryState {
    instructions: Vec<String>,
    saw_explicit_release: bool,
}

impl AdvisoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an instruction unless an identical one was already recorded.
    pub fn add_instruction(&mut self, instruction: String) {
        if !self.instructions.contains(&instruction) {
            self.instructions.push(instruction);
        }
    }

    pub fn mark_explicit_release(&mut self) {
        self.saw_explicit_release = true;
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn saw_explicit_release(&self) -> bool {
        self.saw_explicit_release
    }

    /// Build the closing message, if any.
    pub fn compose(self, source: &SchemaVersion, target: TargetSchema) -> Option<String> {
        if !self.instructions.is_empty() {
            return Some(instructions_message(&self.instructions, target));
        }
        if !self.saw_explicit_release && *source != SchemaVersion::V2 {
            return Some(all_tags_message(target));
        }
        None
    }
}

fn tags_intro(target: TargetSchema) -> String {
    format!(
        "This packages.json has been updated to use features from schema_version {} \
         of Package Control, so any tags in the format MAJOR.MINOR.PATCH will \
         automatically be added as a release.",
        target
    )
}

const FUTURE_RELEASES: &str = "To make future releases, simply create a new tag in your \
    repository in the format MAJOR.MINOR.PATCH. You will no longer need to update this \
    packages.json file.";

const MOVE_TO_DEFAULT_CHANNEL: &str = "Since you no longer need to manually update this \
    packages.json file, the best place for package information moving forward is the \
    default Package Control repository that is part of the default channel.\n\n\
    Please consider adding the package information to the appropriate JSON file in the \
    ./repository/ folder of the default channel and removing your repository URL from \
    the channel.json.";

fn instructions_message(instructions: &[String], target: TargetSchema) -> String {
    let (article, plural) = if instructions.len() == 1 {
        ("a ", "")
    } else {
        ("", "s")
    };
    let list = instructions
        .iter()
        .enumerate()
        .map(|(i, instruction)| format!("{}. {}", i + 1, instruction))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\n\
         Please perform the following operation{plural} to create {article}tag{plural} for \
         your release{plural} so that this new repository JSON will properly expose your \
         package downloads:\n\n{}\n\n{}\n\n{}",
        tags_intro(target),
        list,
        FUTURE_RELEASES,
        MOVE_TO_DEFAULT_CHANNEL,
        plural = plural,
        article = article,
    )
}

fn all_tags_message(target: TargetSchema) -> String {
    format!(
        "We\u{2018}ve detected that your package is currently using tags for releases, great!\n\n\
         {}\n\n{}\n\n{}",
        tags_intro(target),
        FUTURE_RELEASES,
        MOVE_TO_DEFAULT_CHANNEL
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy() -> SchemaVersion {
        SchemaVersion::Legacy("1.2".to_string())
    }

    #[test]
    fn test_instructions_are_deduplicated_in_order() {
        let mut state = AdvisoryState::new();
        state.add_instruction("b".to_string());
        state.add_instruction("a".to_string());
        state.add_instruction("b".to_string());
        assert_eq!(state.instructions(), &["b", "a"]);
    }

    #[test]
    fn test_single_instruction_is_singular() {
        let mut state = AdvisoryState::new();
        state.add_instruction("Create tag 1.0.0 and push to BitBucket".to_string());
        let msg = state.compose(&legacy(), TargetSchema::V3).unwrap();
        assert!(msg.contains("create a tag for your release so"));
        assert!(msg.contains("1. Create tag 1.0.0 and push to BitBucket"));
        assert!(msg.contains("schema_version 3.0.0"));
    }

    #[test]
    fn test_multiple_instructions_are_plural() {
        let mut state = AdvisoryState::new();
        state.add_instruction("one".to_string());
        state.add_instruction("two".to_string());
        let msg = state.compose(&legacy(), TargetSchema::V3).unwrap();
        assert!(msg.contains("operations to create tags for your releases"));
        assert!(msg.contains("1. one\n2. two"));
    }

    #[test]
    fn test_congratulates_when_everything_inferred() {
        let msg = AdvisoryState::new()
            .compose(&legacy(), TargetSchema::V3)
            .unwrap();
        assert!(msg.contains("great!"));
        assert!(msg.contains("You will no longer need to update"));
    }

    #[test]
    fn test_explicit_release_suppresses_congratulations() {
        let mut state = AdvisoryState::new();
        state.mark_explicit_release();
        assert_eq!(state.compose(&legacy(), TargetSchema::V3), None);
    }

    #[test]
    fn test_no_congratulations_for_v2_source() {
        assert_eq!(
            AdvisoryState::new().compose(&SchemaVersion::V2, TargetSchema::V3),
            None
        );
    }
}
