//! The review state machine.
//!
//! | current  | approve  | reject   |
//! |----------|----------|----------|
//! | pending  | approved | rejected |
//! | approved | illegal  | illegal  |
//! | rejected | illegal  | illegal  |
//!
//! There is no path back to `pending`. Re-opening a decision means creating a
//! new submission.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::submission::{ReviewStatus, UnknownVariant};

/// A moderator's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
  Approve,
  Reject,
}

impl Verb {
  /// The terminal status this verb moves a pending submission to.
  pub fn target(self) -> ReviewStatus {
    match self {
      Self::Approve => ReviewStatus::Approved,
      Self::Reject => ReviewStatus::Rejected,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Approve => "approve",
      Self::Reject => "reject",
    }
  }
}

impl fmt::Display for Verb {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Verb {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "approve" => Ok(Self::Approve),
      "reject" => Ok(Self::Reject),
      other => Err(UnknownVariant::new("verb", other)),
    }
  }
}

/// The requested verb is not permitted from `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {verb} a submission that is already {from}")]
pub struct IllegalTransition {
  pub from: ReviewStatus,
  pub verb: Verb,
}

impl IllegalTransition {
  /// `true` when the submission already holds exactly the status `verb`
  /// would have produced, i.e. the request is a replay.
  pub fn is_replay(&self) -> bool { self.from == self.verb.target() }
}

/// Compute the status that `verb` moves `current` to.
pub fn next_status(
  current: ReviewStatus,
  verb: Verb,
) -> Result<ReviewStatus, IllegalTransition> {
  match current {
    ReviewStatus::Pending => Ok(verb.target()),
    ReviewStatus::Approved | ReviewStatus::Rejected => {
      Err(IllegalTransition { from: current, verb })
    }
  }
}
