use thiserror::Error;

use crate::steps::Step;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// A required element is absent from the page, or is not unique where it must be
    #[error("{step} step: no match for `{what}`")]
    SelectorMiss { step: Step, what: &'static str },
}

impl StepError {
    pub(crate) fn miss(step: Step, what: &'static str) -> Self {
        Self::SelectorMiss { step, what }
    }
}
