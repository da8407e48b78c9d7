//! Content fingerprints for synthesis caching.
//!
//! A fingerprint is a stable SHA-256 over the sorted `(worker_id, text)`
//! pairs, the task, and the tier. Sorting by worker id guarantees that
//! dispatch-order differences under concurrency never change the key.
//! Every field is length-prefixed before hashing so concatenation
//! ambiguities cannot collide.

use crate::core::task::Task;
use crate::output::WorkerOutput;
use crate::synthesis::tier::Tier;
use sha2::{Digest, Sha256};

/// Compute the cache fingerprint for one synthesis computation.
///
/// Error-stub outputs are excluded; they contribute nothing to the
/// synthesis prompt and must not perturb the key.
pub fn synthesis_fingerprint(outputs: &[WorkerOutput], task: &Task, tier: Tier) -> String {
    let mut pairs: Vec<(&str, &str)> = outputs
        .iter()
        .filter(|o| o.is_success())
        .map(|o| (o.worker_id.as_str(), o.text.as_str()))
        .collect();
    pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut hasher = Sha256::new();
    for (worker_id, text) in pairs {
        update_framed(&mut hasher, worker_id);
        update_framed(&mut hasher, text);
    }
    update_framed(&mut hasher, task.content());
    update_framed(&mut hasher, tier.as_str());

    format!("{:x}", hasher.finalize())
}

fn update_framed(hasher: &mut Sha256, field: &str) {
    hasher.update(field.len().to_le_bytes());
    hasher.update(field.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TokenUsage;
    use crate::worker::Worker;

    fn output(id: &str, text: &str) -> WorkerOutput {
        let worker = Worker::new(id, id.to_uppercase(), "gpt-4o");
        WorkerOutput::success(&worker, text, TokenUsage::default(), 0.0)
    }

    #[test]
    fn permutation_invariant() {
        let task = Task::try_new("Evaluate the market").unwrap();
        let a = output("a", "growing");
        let b = output("b", "risky");
        let c = output("c", "stable");

        let forward = synthesis_fingerprint(&[a.clone(), b.clone(), c.clone()], &task, Tier::Balanced);
        let reversed = synthesis_fingerprint(&[c, b, a], &task, Tier::Balanced);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn text_change_changes_fingerprint() {
        let task = Task::try_new("Evaluate the market").unwrap();
        let base = synthesis_fingerprint(&[output("a", "growing")], &task, Tier::Balanced);
        let changed = synthesis_fingerprint(&[output("a", "shrinking")], &task, Tier::Balanced);
        assert_ne!(base, changed);
    }

    #[test]
    fn tier_and_task_are_part_of_the_key() {
        let task = Task::try_new("Evaluate the market").unwrap();
        let other_task = Task::try_new("Evaluate the team").unwrap();
        let outputs = [output("a", "growing")];

        let balanced = synthesis_fingerprint(&outputs, &task, Tier::Balanced);
        let deep = synthesis_fingerprint(&outputs, &task, Tier::Deep);
        let other = synthesis_fingerprint(&outputs, &other_task, Tier::Balanced);

        assert_ne!(balanced, deep);
        assert_ne!(balanced, other);
    }

    #[test]
    fn framing_prevents_concatenation_collisions() {
        let task = Task::try_new("t").unwrap();
        let left = synthesis_fingerprint(&[output("a", "bc")], &task, Tier::Quick);
        let right = synthesis_fingerprint(&[output("ab", "c")], &task, Tier::Quick);
        assert_ne!(left, right);
    }

    #[test]
    fn error_stubs_do_not_perturb_the_key() {
        let task = Task::try_new("Evaluate the market").unwrap();
        let worker = Worker::new("b", "B", "gpt-4o");
        let with_stub = vec![output("a", "growing"), WorkerOutput::failure(&worker, "timeout")];
        let without_stub = vec![output("a", "growing")];

        assert_eq!(
            synthesis_fingerprint(&with_stub, &task, Tier::Balanced),
            synthesis_fingerprint(&without_stub, &task, Tier::Balanced)
        );
    }
}
