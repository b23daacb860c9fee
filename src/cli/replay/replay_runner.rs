// Replay runner - applies a script to a ForumService and reports the result.
//
// Refusals from the service (a non-moderator approving, a duplicate flag...)
// are part of the replay and are recorded per step. A key whose creating step
// was refused is remembered, and later steps using it are recorded as refused
// too. A script that refers to a key it never defined is broken and stops the
// run.

use super::script::{ReplayScript, Step, TargetKey};
use crate::core::content::Sequence;
use crate::core::moderation::{ForumError, ForumService, ForumStore, PendingEdit, QuestionDraft};
use crate::core::questions::{AnswerId, ContentRef, QuestionId};
use crate::core::users::{User, UserId};
use crate::core::voting::Votable;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A step used a key whose creating step was refused.
#[derive(Debug, Error)]
#[error("'{0}' does not exist: the step creating it was refused")]
pub struct RefusedKey(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AnswerReport {
    pub key: Option<String>,
    pub author: UserId,
    pub votes: i64,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionReport {
    pub key: String,
    pub title: String,
    pub meta_description: String,
    pub votes: i64,
    /// Tags of the approved content with their system-wide usage
    pub tags: Vec<TagReport>,
    pub answers: Vec<AnswerReport>,
    pub pending_edits: Vec<PendingEdit>,
    pub last_touched_by: UserId,
    /// Script key of the accepted answer
    pub solution: Option<String>,
    pub flags: usize,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagReport {
    pub name: String,
    pub usage_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub questions: Vec<QuestionReport>,
    pub tags: Vec<TagReport>,
}

/// Keys handed out while the script runs.
#[derive(Default)]
struct Keys {
    users: BTreeMap<String, User>,
    questions: HashMap<String, QuestionId>,
    answers: HashMap<String, AnswerId>,
    edits: HashMap<String, (ContentRef, Sequence)>,
    /// Keys whose creating step was refused
    refused: HashSet<String>,
}

impl Keys {
    fn missing(&self, kind: &str, key: &str) -> anyhow::Error {
        if self.refused.contains(key) {
            RefusedKey(key.to_string()).into()
        } else {
            anyhow!("Unknown {kind} key '{key}'")
        }
    }

    fn user(&self, key: &str) -> Result<&User> {
        self.users
            .get(key)
            .ok_or_else(|| anyhow!("Unknown user key '{key}'"))
    }

    fn question(&self, key: &str) -> Result<QuestionId> {
        self.questions
            .get(key)
            .copied()
            .ok_or_else(|| self.missing("question", key))
    }

    fn answer(&self, key: &str) -> Result<AnswerId> {
        self.answers
            .get(key)
            .copied()
            .ok_or_else(|| self.missing("answer", key))
    }

    fn edit(&self, key: &str) -> Result<(ContentRef, Sequence)> {
        self.edits
            .get(key)
            .copied()
            .ok_or_else(|| self.missing("edit", key))
    }

    fn target(&self, target: &TargetKey) -> Result<ContentRef> {
        Ok(match target {
            TargetKey::Question(key) => ContentRef::Question(self.question(key)?),
            TargetKey::Answer(key) => ContentRef::Answer(self.answer(key)?),
        })
    }

    fn answer_key(&self, id: AnswerId) -> Option<String> {
        self.answers
            .iter()
            .find(|(_, answer)| **answer == id)
            .map(|(key, _)| key.clone())
    }
}

/// Run every step in order, then report the final state of the forum.
pub async fn run_script<S: ForumStore>(
    service: &ForumService<S>,
    script: ReplayScript,
) -> Result<ReplayReport> {
    let mut keys = Keys {
        users: script.users,
        ..Keys::default()
    };
    let mut steps = Vec::with_capacity(script.steps.len());
    // Question keys in the order they were asked
    let mut asked: Vec<String> = Vec::new();

    for (index, step) in script.steps.into_iter().enumerate() {
        let action = step.action();
        let created = step.created_key().map(str::to_string);
        let report = match apply(service, &mut keys, &mut asked, step).await {
            Ok(detail) => StepReport {
                index,
                action,
                ok: true,
                detail,
            },
            // Only the service's own refusals, and what follows from them, are recoverable
            Err(err)
                if err.downcast_ref::<ForumError>().is_some()
                    || err.downcast_ref::<RefusedKey>().is_some() =>
            {
                warn!(index, action, error = %err, "Step refused");
                if let Some(key) = created {
                    keys.refused.insert(key);
                }
                StepReport {
                    index,
                    action,
                    ok: false,
                    detail: Some(err.to_string()),
                }
            }
            Err(err) => return Err(err.context(format!("Step {index} ({action}) failed"))),
        };
        steps.push(report);
    }

    let mut questions = Vec::with_capacity(asked.len());
    for key in asked {
        let id = keys.question(&key)?;
        let question = service
            .store()
            .get_question(id)
            .await?
            .with_context(|| format!("Question '{key}' disappeared from the store"))?;

        let answers = service
            .store()
            .answers_for(id)
            .await?
            .into_iter()
            .map(|answer| AnswerReport {
                key: keys.answer_key(answer.id()),
                author: answer.author().id,
                votes: answer.vote_count(),
                removed: answer.is_removed(),
            })
            .collect();

        questions.push(QuestionReport {
            title: question.title().to_string(),
            meta_description: question
                .meta_description_with_limit(service.config().meta_description_limit),
            votes: question.vote_count(),
            tags: question
                .tags()
                .iter()
                .map(|tag| TagReport {
                    name: tag.name().to_string(),
                    usage_count: tag.usage_count(),
                })
                .collect(),
            answers,
            pending_edits: question
                .pending_edits()
                .iter()
                .map(|edit| PendingEdit::from_revision(edit, edit.is_before_current(&question)))
                .collect(),
            last_touched_by: question.last_touched_by().id,
            solution: question.solution().and_then(|id| keys.answer_key(id)),
            flags: question.flags().len(),
            removed: question.is_removed(),
            key,
        });
    }

    let tags = service
        .store()
        .all_tags()
        .await?
        .into_iter()
        .map(|tag| TagReport {
            name: tag.name().to_string(),
            usage_count: tag.usage_count(),
        })
        .collect();

    info!(steps = steps.len(), questions = questions.len(), "Replay finished");
    Ok(ReplayReport {
        steps,
        questions,
        tags,
    })
}

async fn apply<S: ForumStore>(
    service: &ForumService<S>,
    keys: &mut Keys,
    asked: &mut Vec<String>,
    step: Step,
) -> Result<Option<String>> {
    match step {
        Step::Ask {
            key,
            user,
            title,
            description,
            tags,
        } => {
            let author = keys.user(&user)?.clone();
            let draft = QuestionDraft {
                title,
                description,
                tags,
                comment: None,
            };
            let question = service.ask(&author, draft).await?;
            keys.questions.insert(key.clone(), question.id());
            asked.push(key);
            Ok(None)
        }
        Step::SuggestEdit {
            question,
            user,
            title,
            description,
            tags,
            comment,
            edit,
        } => {
            let id = keys.question(&question)?;
            let editor = keys.user(&user)?.clone();
            let draft = QuestionDraft {
                title,
                description,
                tags,
                comment,
            };
            let outcome = service.suggest_edit(id, &editor, draft).await?;
            if let Some(edit) = edit {
                keys.edits
                    .insert(edit, (ContentRef::Question(id), outcome.sequence));
            }
            Ok(Some(format!("revision {} {}", outcome.sequence, outcome.status)))
        }
        Step::Approve { edit, user } => {
            let (target, sequence) = keys.edit(&edit)?;
            let moderator = keys.user(&user)?;
            match target {
                ContentRef::Question(id) => service.approve_edit(id, sequence, moderator).await?,
                ContentRef::Answer(id) => {
                    service.approve_answer_edit(id, sequence, moderator).await?
                }
            }
            Ok(None)
        }
        Step::Reject { edit, user } => {
            let (target, sequence) = keys.edit(&edit)?;
            let moderator = keys.user(&user)?;
            match target {
                ContentRef::Question(id) => service.reject_edit(id, sequence, moderator).await?,
                ContentRef::Answer(id) => {
                    service.reject_answer_edit(id, sequence, moderator).await?
                }
            }
            Ok(None)
        }
        Step::Answer {
            key,
            question,
            user,
            text,
        } => {
            let id = keys.question(&question)?;
            let author = keys.user(&user)?.clone();
            let answer = service.answer(id, &author, &text).await?;
            keys.answers.insert(key, answer.id());
            Ok(None)
        }
        Step::SuggestAnswerEdit {
            answer,
            user,
            text,
            comment,
            edit,
        } => {
            let id = keys.answer(&answer)?;
            let editor = keys.user(&user)?.clone();
            let outcome = service
                .suggest_answer_edit(id, &editor, &text, comment.as_deref())
                .await?;
            if let Some(edit) = edit {
                keys.edits.insert(edit, (ContentRef::Answer(id), outcome.sequence));
            }
            Ok(Some(format!("revision {} {}", outcome.sequence, outcome.status)))
        }
        Step::Vote { target, user, vote } => {
            let target = keys.target(&target)?;
            let count = service.vote(target, keys.user(&user)?, vote).await?;
            Ok(Some(format!("count {count}")))
        }
        Step::Flag {
            target,
            user,
            flag,
            reason,
        } => {
            let target = keys.target(&target)?;
            let added = service.flag(target, keys.user(&user)?, flag, reason).await?;
            Ok((!added).then(|| "already flagged".to_string()))
        }
        Step::MarkSolution {
            question,
            answer,
            user,
        } => {
            let question = keys.question(&question)?;
            let answer = keys.answer(&answer)?;
            service
                .mark_solution(question, answer, keys.user(&user)?)
                .await?;
            Ok(None)
        }
        Step::Remove { target, user } => {
            let target = keys.target(&target)?;
            service.remove(target, keys.user(&user)?).await?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::ModerationConfig;
    use crate::infra::forum::InMemoryForumStore;

    fn service() -> ForumService<InMemoryForumStore> {
        ForumService::new(InMemoryForumStore::new(), ModerationConfig::default())
    }

    const USERS: &str = r#"
        "artur": { "id": 1, "name": "Artur", "email": "artur@x.com" },
        "leo": { "id": 2, "name": "Leo", "email": "leo@x.com" },
        "mod": { "id": 3, "name": "Mod", "email": "mod@x.com", "role": "moderator" }
    "#;

    fn script(steps: &str) -> ReplayScript {
        let raw = format!(r#"{{ "users": {{ {USERS} }}, "steps": [ {steps} ] }}"#);
        ReplayScript::from_json(&raw).unwrap()
    }

    const ASK: &str = r#"
        { "action": "ask", "key": "q1", "user": "artur",
          "title": "How do I borrow twice?",
          "description": "The borrow checker refuses my second mutable borrow.",
          "tags": ["ruby"] }
    "#;

    #[tokio::test]
    async fn test_edit_approval_moves_tag_usage() {
        let steps = format!(
            r#"{ASK},
            {{ "action": "suggest_edit", "question": "q1", "user": "leo", "edit": "e1",
               "title": "How do I borrow mutably twice?",
               "description": "The borrow checker refuses my second mutable borrow.",
               "tags": ["java"] }},
            {{ "action": "approve", "edit": "e1", "user": "leo" }},
            {{ "action": "approve", "edit": "e1", "user": "mod" }}"#
        );

        let report = run_script(&service(), script(&steps)).await.unwrap();

        assert!(report.steps[1].ok);
        assert!(!report.steps[2].ok);
        assert!(report.steps[3].ok);

        let question = &report.questions[0];
        assert_eq!(question.title, "How do I borrow mutably twice?");
        assert_eq!(question.last_touched_by, UserId(2));
        assert!(question.pending_edits.is_empty());
        assert_eq!(question.tags.len(), 1);
        assert_eq!(question.tags[0].name, "java");
        assert_eq!(question.tags[0].usage_count, 1);

        let usage: HashMap<&str, u64> = report
            .tags
            .iter()
            .map(|t| (t.name.as_str(), t.usage_count))
            .collect();
        assert_eq!(usage["ruby"], 0);
        assert_eq!(usage["java"], 1);
    }

    #[tokio::test]
    async fn test_votes_and_solution() {
        let steps = format!(
            r#"{ASK},
            {{ "action": "answer", "key": "a1", "question": "q1", "user": "leo",
               "text": "Split the work into two scopes so the borrows never overlap." }},
            {{ "action": "vote", "target": {{ "question": "q1" }}, "user": "leo", "vote": "up" }},
            {{ "action": "vote", "target": {{ "question": "q1" }}, "user": "leo", "vote": "down" }},
            {{ "action": "vote", "target": {{ "question": "q1" }}, "user": "artur", "vote": "up" }},
            {{ "action": "mark_solution", "question": "q1", "answer": "a1", "user": "artur" }}"#
        );

        let report = run_script(&service(), script(&steps)).await.unwrap();

        assert_eq!(report.steps[3].detail.as_deref(), Some("count -1"));
        assert!(!report.steps[4].ok);

        let question = &report.questions[0];
        assert_eq!(question.votes, -1);
        assert_eq!(question.answers.len(), 1);
        assert_eq!(question.answers[0].key.as_deref(), Some("a1"));
        assert_eq!(question.answers[0].author, UserId(2));
        assert_eq!(question.solution.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_unknown_key_stops_the_run() {
        let steps = r#"{ "action": "vote", "target": { "question": "nope" }, "user": "leo", "vote": "up" }"#;
        let result = run_script(&service(), script(steps)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_pending_edit_is_reported_stale() {
        let steps = format!(
            r#"{ASK},
            {{ "action": "suggest_edit", "question": "q1", "user": "leo",
               "title": "A suggestion from long ago",
               "description": "The borrow checker refuses my second mutable borrow." }},
            {{ "action": "suggest_edit", "question": "q1", "user": "mod",
               "title": "How do I borrow, really?",
               "description": "The borrow checker refuses my second mutable borrow." }}"#
        );

        let report = run_script(&service(), script(&steps)).await.unwrap();

        let question = &report.questions[0];
        assert_eq!(question.pending_edits.len(), 1);
        assert!(question.pending_edits[0].stale);
        assert_eq!(question.last_touched_by, UserId(3));
    }

    #[tokio::test]
    async fn test_steps_after_a_refused_ask_are_refused() {
        let steps = r#"
            { "action": "ask", "key": "q1", "user": "artur",
              "title": "Help", "description": "too short" },
            { "action": "answer", "key": "a1", "question": "q1", "user": "leo",
              "text": "Split the work into two scopes so the borrows never overlap." },
            { "action": "vote", "target": { "answer": "a1" }, "user": "artur", "vote": "up" }"#;

        let report = run_script(&service(), script(steps)).await.unwrap();

        assert_eq!(report.steps.len(), 3);
        assert!(report.steps.iter().all(|step| !step.ok));
        assert!(report.steps[1]
            .detail
            .as_deref()
            .is_some_and(|detail| detail.contains("'q1'")));
        assert!(report.questions.is_empty());
    }
}
