// Replay script format.
//
// Users are declared once under a key; every step refers to users, questions,
// answers and edits by the keys given to them earlier in the script. A key
// whose creating step was refused stays known as refused, so the steps that
// use it are refused as well instead of stopping the run.
//
// {
//   "users": { "artur": { "id": 1, "name": "Artur", "email": "artur@x.com" } },
//   "steps": [
//     { "action": "ask", "key": "q1", "user": "artur", "title": "...", "description": "...", "tags": ["rust"] },
//     { "action": "vote", "target": { "question": "q1" }, "user": "leo", "vote": "up" }
//   ]
// }

use crate::core::flags::FlagType;
use crate::core::users::User;
use crate::core::voting::VoteType;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    pub users: BTreeMap<String, User>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ReplayScript {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Something that can be voted on, flagged or removed, by script key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKey {
    Question(String),
    Answer(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Ask {
        key: String,
        user: String,
        title: String,
        description: String,
        #[serde(default)]
        tags: Vec<String>,
    },
    SuggestEdit {
        question: String,
        user: String,
        title: String,
        description: String,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        comment: Option<String>,
        /// Key to approve or reject this edit by later
        #[serde(default)]
        edit: Option<String>,
    },
    Approve {
        edit: String,
        user: String,
    },
    Reject {
        edit: String,
        user: String,
    },
    Answer {
        key: String,
        question: String,
        user: String,
        text: String,
    },
    SuggestAnswerEdit {
        answer: String,
        user: String,
        text: String,
        #[serde(default)]
        comment: Option<String>,
        #[serde(default)]
        edit: Option<String>,
    },
    Vote {
        target: TargetKey,
        user: String,
        vote: VoteType,
    },
    Flag {
        target: TargetKey,
        user: String,
        flag: FlagType,
        #[serde(default)]
        reason: Option<String>,
    },
    MarkSolution {
        question: String,
        answer: String,
        user: String,
    },
    Remove {
        target: TargetKey,
        user: String,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::Ask { .. } => "ask",
            Step::SuggestEdit { .. } => "suggest_edit",
            Step::Approve { .. } => "approve",
            Step::Reject { .. } => "reject",
            Step::Answer { .. } => "answer",
            Step::SuggestAnswerEdit { .. } => "suggest_answer_edit",
            Step::Vote { .. } => "vote",
            Step::Flag { .. } => "flag",
            Step::MarkSolution { .. } => "mark_solution",
            Step::Remove { .. } => "remove",
        }
    }

    /// Key this step hands out when it goes through.
    pub fn created_key(&self) -> Option<&str> {
        match self {
            Step::Ask { key, .. } | Step::Answer { key, .. } => Some(key.as_str()),
            Step::SuggestEdit { edit, .. } | Step::SuggestAnswerEdit { edit, .. } => {
                edit.as_deref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::users::UserRole;

    #[test]
    fn test_parse_script() {
        let raw = r#"{
            "users": {
                "artur": { "id": 1, "name": "Artur", "email": "artur@x.com" },
                "mod": { "id": 3, "name": "Mod", "email": "mod@x.com", "role": "moderator" }
            },
            "steps": [
                { "action": "ask", "key": "q1", "user": "artur",
                  "title": "How do I borrow twice?", "description": "long enough", "tags": ["rust"] },
                { "action": "vote", "target": { "question": "q1" }, "user": "mod", "vote": "down" },
                { "action": "approve", "edit": "e1", "user": "mod" }
            ]
        }"#;

        let script = ReplayScript::from_json(raw).unwrap();
        assert_eq!(script.users["mod"].role, UserRole::Moderator);
        assert_eq!(script.users["artur"].role, UserRole::Normal);
        assert_eq!(script.steps.len(), 3);
        assert_eq!(script.steps[1].action(), "vote");
        assert!(matches!(
            &script.steps[1],
            Step::Vote { target: TargetKey::Question(key), vote: VoteType::Down, .. } if key == "q1"
        ));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let raw = r#"{ "users": {}, "steps": [ { "action": "delete_everything" } ] }"#;
        assert!(ReplayScript::from_json(raw).is_err());
    }
}
