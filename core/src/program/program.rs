use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::Step;
use crate::{String, Vec, format};

/// An ordered, append-only sequence of steps.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    steps: Vec<Step>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// Appends a step and returns its index.
    pub(crate) fn push(&mut self, step: Step) -> usize {
        self.steps.push(step);
        self.steps.len() - 1
    }

    pub(crate) fn step_mut(&mut self, index: usize) -> Option<&mut Step> {
        self.steps.get_mut(index)
    }

    /// Where execution continues when the jump at `index` is taken.
    pub fn target_of(&self, index: usize) -> Option<usize> {
        let offset = self.steps.get(index)?.jump_offset()?;
        usize::try_from(index as i64 + 1 + offset as i64).ok()
    }

    /// Where execution continues when the comprehension step at `index`
    /// takes its error exit.
    pub fn error_target_of(&self, index: usize) -> Option<usize> {
        let offset = self.steps.get(index)?.error_jump_offset()?;
        usize::try_from(index as i64 + 1 + offset as i64).ok()
    }

    pub fn jump_count(&self) -> usize {
        self.steps.iter().filter(|step| step.is_jump()).count()
    }

    /// Index of the first jump with an offset still unset.
    pub fn first_unpatched_jump(&self) -> Option<usize> {
        self.steps.iter().position(|step| !step.is_patched())
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Step;
    type IntoIter = core::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl core::fmt::Debug for Program {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // First pass: collect every jump target so it can be labelled.
        let mut targets: Vec<usize> = (0..self.steps.len())
            .flat_map(|index| [self.target_of(index), self.error_target_of(index)])
            .flatten()
            .collect();
        targets.sort_unstable();
        targets.dedup();
        let labels: HashMap<usize, usize> =
            targets
                .into_iter()
                .enumerate()
                .map(|(label, addr)| (addr, label))
                .collect();
        let label_of = |target: usize| {
            labels
                .get(&target)
                .map(|label| format!("L{}", label))
                .unwrap_or_else(|| format!("@{}", target))
        };

        writeln!(f, "Program {{")?;
        writeln!(f, "  steps:")?;
        for (addr, step) in self.steps.iter().enumerate() {
            let label_prefix = match labels.get(&addr) {
                Some(label) => format!("L{}:", label),
                None => String::new(),
            };
            write!(
                f,
                "    {:4} {:>4}  {}  ; {}",
                addr,
                label_prefix,
                step,
                step.id()
            )?;
            if let Some(target) = self.target_of(addr) {
                write!(f, " (to {})", label_of(target))?;
            }
            if let Some(target) = self.error_target_of(addr) {
                write!(f, " (error to {})", label_of(target))?;
            }
            writeln!(f)?;
        }
        // A jump to the end of the program targets the slot after the last step.
        if let Some(label) = labels.get(&self.steps.len()) {
            writeln!(
                f,
                "    {:4} {:>4}",
                self.steps.len(),
                format!("L{}:", label)
            )?;
        }
        write!(f, "}}")
    }
}
