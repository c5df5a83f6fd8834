use crate::arms::{Arm, Strategy, configuration_for};
use std::fmt;

/// Statements that make the host planner behave like a given arm.
///
/// Only strategies the arm disables produce a statement; the host default
/// for every strategy is assumed to be "on".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    disabled: Vec<Strategy>,
}

impl Hint {
    pub fn strategies(&self) -> &[Strategy] {
        &self.disabled
    }

    pub fn statements(&self) -> impl Iterator<Item = String> + '_ {
        self.disabled
            .iter()
            .map(|strategy| format!("SET {} TO off;", strategy.setting_name()))
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in self.statements() {
            write!(f, "{statement} ")?;
        }
        Ok(())
    }
}

/// Derive the hint for `arm`. `None` when the arm disables nothing.
pub fn hint_for(arm: Arm) -> Option<Hint> {
    let disabled: Vec<Strategy> = configuration_for(arm).disabled().collect();
    if disabled.is_empty() {
        None
    } else {
        Some(Hint { disabled })
    }
}
