//! Trial result collection.

use crate::profile::{parse_counter_line, read_text, Profile, VERSION_MARKER};
use crate::result::{HarnessError, HarnessResult};
use std::path::Path;
use tracing::{debug, warn};

/// Profiles accumulated across the trials of one pass.
///
/// Append-only: trials are never reordered, replaced or deduplicated, and
/// every profile shares the key set of the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSet {
    trials: Vec<Profile>,
}

impl ProfileSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one trial.
    ///
    /// Fails without modifying the set when the key set differs from the
    /// first trial's.
    pub fn push(&mut self, profile: Profile) -> HarnessResult<()> {
        if let Some(first) = self.trials.first() {
            if !first.same_keys(&profile) {
                return Err(HarnessError::format(
                    "<trial profile>",
                    format!(
                        "trial {} has keys [{}], expected [{}]",
                        self.trials.len() + 1,
                        profile.keys().collect::<Vec<_>>().join(", "),
                        first.keys().collect::<Vec<_>>().join(", ")
                    ),
                ));
            }
        }
        self.trials.push(profile);
        Ok(())
    }

    /// Trials in collection order
    #[must_use]
    pub fn trials(&self) -> &[Profile] {
        &self.trials
    }

    /// First collected trial
    #[must_use]
    pub fn first(&self) -> Option<&Profile> {
        self.trials.first()
    }

    /// Number of trials collected
    #[must_use]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// True when nothing has been collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

/// Read one trial's profile and append it to `accumulator`.
///
/// The header only has to start with the version marker; the count line is
/// skipped without validation. On any error the accumulator is left as it
/// was.
pub fn collect(profile_path: &Path, accumulator: &mut ProfileSet) -> HarnessResult<()> {
    debug!(path = %profile_path.display(), "collecting profile");
    let content = read_text(profile_path)?;
    let mut lines = content.lines();

    if !lines.next().is_some_and(|l| l.starts_with(VERSION_MARKER)) {
        warn!(path = %profile_path.display(), "incorrect profile format");
        return Err(HarnessError::format(
            profile_path,
            format!("first line must start with `{VERSION_MARKER}`"),
        ));
    }
    let _count = lines.next();

    let mut current = Profile::new();
    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = parse_counter_line(line, idx + 3, profile_path)?;
        current.insert(key, value);
    }

    accumulator.push(current).map_err(|e| match e {
        HarnessError::Format { message, .. } => HarnessError::format(profile_path, message),
        other => other,
    })?;
    debug!(trials = accumulator.len(), "profile collected");
    Ok(())
}
