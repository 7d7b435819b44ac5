use serde_json::{Map, Value, json};

use crate::step::{JobKind, StepKind, WorkflowStep};

const GLUE_START_JOB_RUN_SYNC: &str = "arn:aws:states:::glue:startJobRun.sync";
const BATCH_SUBMIT_JOB_SYNC: &str = "arn:aws:states:::batch:submitJob.sync";

/// Link `first` to `second` and return `first` as the chain head.
pub fn chain(mut first: WorkflowStep, second: WorkflowStep) -> WorkflowStep {
  first.next = Some(Box::new(second));
  first
}

/// Assembles the ETL chain and renders it as a state-machine definition.
#[derive(Debug, Clone)]
pub struct WorkflowAssembler {
  comment: String,
  timeout_seconds: Option<u64>,
}

impl WorkflowAssembler {
  pub fn new(comment: impl Into<String>) -> Self {
    Self {
      comment: comment.into(),
      timeout_seconds: None,
    }
  }

  pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
    self.timeout_seconds = Some(seconds);
    self
  }

  /// Chain the extraction and processing steps.
  pub fn assemble(&self, extract: WorkflowStep, process: WorkflowStep) -> WorkflowStep {
    chain(extract, process)
  }

  /// Render the chain starting at `head`.
  ///
  /// Real steps use the synchronous job integrations so each job finishes
  /// before the next state starts. No retry or catch clauses are emitted: a
  /// failed job fails the execution.
  pub fn definition(&self, head: &WorkflowStep) -> Value {
    let mut states = Map::new();
    for step in head.iter() {
      let mut state = state_for(step);
      match &step.next {
        Some(next) => {
          state.insert("Next".to_string(), Value::String(next.name.clone()));
        }
        None => {
          state.insert("End".to_string(), Value::Bool(true));
        }
      }
      states.insert(step.name.clone(), Value::Object(state));
    }

    let mut definition = Map::new();
    definition.insert("Comment".to_string(), Value::String(self.comment.clone()));
    definition.insert("StartAt".to_string(), Value::String(head.name.clone()));
    definition.insert("States".to_string(), Value::Object(states));
    if let Some(seconds) = self.timeout_seconds {
      definition.insert("TimeoutSeconds".to_string(), Value::from(seconds));
    }
    Value::Object(definition)
  }
}

fn state_for(step: &WorkflowStep) -> Map<String, Value> {
  let mut state = Map::new();
  let job = match &step.kind {
    StepKind::Placeholder => {
      state.insert("Type".to_string(), json!("Pass"));
      return state;
    }
    StepKind::Real(job) => job,
  };

  let (resource, parameters) = match job.job_kind {
    JobKind::Glue => (GLUE_START_JOB_RUN_SYNC, json!({ "JobName": job.job_ref })),
    JobKind::Batch => (
      BATCH_SUBMIT_JOB_SYNC,
      json!({
        "JobName": step.name,
        "JobDefinition": job.job_ref,
        "JobQueue": job.job_queue,
      }),
    ),
  };
  state.insert("Type".to_string(), json!("Task"));
  state.insert("Resource".to_string(), json!(resource));
  state.insert("Parameters".to_string(), parameters);
  state
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::step::JobStep;

  #[test]
  fn test_chain_links_two_steps() {
    let head = chain(
      WorkflowStep::glue("Extract", "etl-v1"),
      WorkflowStep::batch("Process", "arn:job-def", "arn:queue"),
    );

    assert_eq!(head.chain_len(), 2);
    assert_eq!(
      head.job(),
      Some(&JobStep {
        job_kind: JobKind::Glue,
        job_ref: "etl-v1".to_string(),
        job_queue: None,
      })
    );

    let tail = head.next.as_deref().unwrap();
    assert_eq!(tail.job().map(|j| (j.job_kind, j.job_ref.as_str())), Some((JobKind::Batch, "arn:job-def")));
    assert!(tail.is_terminal());
  }

  #[test]
  fn test_placeholder_chain() {
    let head = chain(
      WorkflowStep::placeholder("Extract"),
      WorkflowStep::placeholder("Process"),
    );
    assert_eq!(head.chain_len(), 2);
    assert!(head.iter().all(WorkflowStep::is_placeholder));
  }

  #[test]
  fn test_definition_for_real_steps() {
    let assembler = WorkflowAssembler::new("omics etl").with_timeout_seconds(3600);
    let head = assembler.assemble(
      WorkflowStep::glue("Extract", "etl-v1"),
      WorkflowStep::batch("Process", "arn:job-def", "arn:queue"),
    );

    assert_eq!(
      assembler.definition(&head),
      json!({
        "Comment": "omics etl",
        "StartAt": "Extract",
        "TimeoutSeconds": 3600,
        "States": {
          "Extract": {
            "Type": "Task",
            "Resource": "arn:aws:states:::glue:startJobRun.sync",
            "Parameters": { "JobName": "etl-v1" },
            "Next": "Process"
          },
          "Process": {
            "Type": "Task",
            "Resource": "arn:aws:states:::batch:submitJob.sync",
            "Parameters": {
              "JobName": "Process",
              "JobDefinition": "arn:job-def",
              "JobQueue": "arn:queue"
            },
            "End": true
          }
        }
      })
    );
  }

  #[test]
  fn test_definition_for_mixed_steps() {
    let assembler = WorkflowAssembler::new("omics etl");
    let head = assembler.assemble(
      WorkflowStep::placeholder("Extract"),
      WorkflowStep::batch("Process", "arn:job-def", "arn:queue"),
    );

    let definition = assembler.definition(&head);
    assert_eq!(
      definition["States"]["Extract"],
      json!({ "Type": "Pass", "Next": "Process" })
    );
    assert_eq!(definition["States"]["Process"]["End"], json!(true));
    assert!(definition.get("TimeoutSeconds").is_none());
  }

  #[test]
  fn test_state_for_carries_no_transition() {
    let glue = state_for(&WorkflowStep::glue("Extract", "etl-v1"));
    assert_eq!(
      Value::Object(glue),
      json!({
        "Type": "Task",
        "Resource": GLUE_START_JOB_RUN_SYNC,
        "Parameters": { "JobName": "etl-v1" },
      })
    );

    let pass = state_for(&WorkflowStep::placeholder("Process"));
    assert_eq!(pass.len(), 1);
    assert_eq!(pass["Type"], "Pass");
  }
}
