use serde::Serialize;

/// The job service a real step runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
  Glue,
  Batch,
}

/// A job launched by a real step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStep {
  pub job_kind: JobKind,
  /// Glue job name or Batch job definition ARN.
  pub job_ref: String,
  /// Batch job queue ARN. Unused for Glue.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub job_queue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
  Real(JobStep),
  Placeholder,
}

/// One position of the ETL chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowStep {
  /// State name within the workflow definition.
  pub name: String,
  pub kind: StepKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<Box<WorkflowStep>>,
}

impl WorkflowStep {
  pub fn glue(name: impl Into<String>, job_name: impl Into<String>) -> Self {
    Self::real(
      name,
      JobStep {
        job_kind: JobKind::Glue,
        job_ref: job_name.into(),
        job_queue: None,
      },
    )
  }

  pub fn batch(
    name: impl Into<String>,
    job_definition_arn: impl Into<String>,
    job_queue_arn: impl Into<String>,
  ) -> Self {
    Self::real(
      name,
      JobStep {
        job_kind: JobKind::Batch,
        job_ref: job_definition_arn.into(),
        job_queue: Some(job_queue_arn.into()),
      },
    )
  }

  pub fn placeholder(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: StepKind::Placeholder,
      next: None,
    }
  }

  fn real(name: impl Into<String>, job: JobStep) -> Self {
    Self {
      name: name.into(),
      kind: StepKind::Real(job),
      next: None,
    }
  }

  pub fn is_placeholder(&self) -> bool {
    matches!(self.kind, StepKind::Placeholder)
  }

  pub fn job(&self) -> Option<&JobStep> {
    match &self.kind {
      StepKind::Real(job) => Some(job),
      StepKind::Placeholder => None,
    }
  }

  pub fn is_terminal(&self) -> bool {
    self.next.is_none()
  }

  /// Walk the chain from this step.
  pub fn iter(&self) -> impl Iterator<Item = &WorkflowStep> {
    std::iter::successors(Some(self), |step| step.next.as_deref())
  }

  /// Number of steps from this one to the terminal step, inclusive.
  pub fn chain_len(&self) -> usize {
    self.iter().count()
  }
}
