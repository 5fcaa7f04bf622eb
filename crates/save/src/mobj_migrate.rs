// ---------------------------------------------------------------------------
// Mobj migration registry: validated upgrade chain for old mobj records
// ---------------------------------------------------------------------------
//
// Each step is a function `fn(&mut Mobj, &MobjInfo)` that upgrades a restored
// mobj from record version N to N+1. The registry validates at construction
// time that the chain is contiguous (no gaps, no duplicates). The reader fills
// fields an old record lacks with markers or zeros; the steps replace them
// with the type defaults.

use simulation::config::DDMAXINT;
use simulation::mobj::{Mobj, MobjFlags, MobjInfo};

use crate::save_error::SaveError;

/// Mobj record version written by this build.
pub const MOBJ_RECORD_VERSION: u32 = 8;

/// Oldest mobj record layout that can be read.
pub const MIN_MOBJ_RECORD_VERSION: u32 = 1;

/// A single migration step: upgrades a mobj from `from_version` to `from_version + 1`.
#[derive(Debug)]
pub struct MigrationStep {
    pub from_version: u32,
    pub description: &'static str,
    pub migrate_fn: fn(&mut Mobj, &MobjInfo),
}

/// Result of running the migration chain on one mobj.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub original_version: u32,
    pub final_version: u32,
    pub steps_applied: u32,
    pub step_descriptions: Vec<&'static str>,
}

/// Ordered, validated chain of mobj migration steps.
#[derive(Debug)]
pub struct MobjMigrations {
    steps: Vec<MigrationStep>,
    first_version: u32,
    current_version: u32,
}

impl MobjMigrations {
    /// # Panics
    ///
    /// Panics if the chain has gaps or duplicate source versions, or does not
    /// span `first_version..current_version`.
    pub fn new(steps: Vec<MigrationStep>, first_version: u32, current_version: u32) -> Self {
        let mut seen = std::collections::HashSet::new();
        for step in &steps {
            assert!(
                seen.insert(step.from_version),
                "Duplicate migration step for version {}",
                step.from_version
            );
        }

        for v in first_version..current_version {
            assert!(
                seen.contains(&v),
                "Missing migration step from v{} to v{}. The migration chain must be \
                 contiguous from v{} to v{}.",
                v,
                v + 1,
                first_version,
                current_version
            );
        }

        let mut steps = steps;
        steps.sort_by_key(|s| s.from_version);

        Self {
            steps,
            first_version,
            current_version,
        }
    }

    /// Runs every step from `version` up to the current record version.
    ///
    /// # Errors
    ///
    /// `VersionMismatch` for a record newer than this build,
    /// `UnsupportedVersion` for one older than the chain.
    pub fn migrate(
        &self,
        mo: &mut Mobj,
        info: &MobjInfo,
        version: u32,
    ) -> Result<MigrationReport, SaveError> {
        if version > self.current_version {
            return Err(SaveError::VersionMismatch {
                expected_max: self.current_version,
                found: version,
            });
        }
        if version < self.first_version {
            return Err(SaveError::UnsupportedVersion {
                what: "mobj record",
                found: version,
            });
        }

        let mut at = version;
        let mut step_descriptions = Vec::new();
        for step in &self.steps {
            if at >= self.current_version {
                break;
            }
            if step.from_version == at {
                (step.migrate_fn)(mo, info);
                at += 1;
                step_descriptions.push(step.description);
            }
        }

        debug_assert_eq!(at, self.current_version);

        Ok(MigrationReport {
            original_version: version,
            final_version: at,
            steps_applied: step_descriptions.len() as u32,
            step_descriptions,
        })
    }

    #[cfg(test)]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    #[cfg(test)]
    pub fn current_version(&self) -> u32 {
        self.current_version
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn migrate_v5_to_v6(mo: &mut Mobj, info: &MobjInfo) {
    // The two brightness bits traded places in format 6.
    let shadow = mo.flags.contains(MobjFlags::BRIGHTSHADOW);
    let explode = mo.flags.contains(MobjFlags::BRIGHTEXPLODE);
    if shadow != explode {
        mo.flags.toggle(MobjFlags::BRIGHTSHADOW | MobjFlags::BRIGHTEXPLODE);
    }
    mo.flags.remove(MobjFlags::V6_OBSOLETE);
    mo.flags2 = info.flags2;
    if mo.damage == DDMAXINT {
        mo.damage = info.damage;
    }
}

fn migrate_v6_to_v7(mo: &mut Mobj, info: &MobjInfo) {
    mo.flags3 = info.flags3;
}

fn migrate_v7_to_v8(mo: &mut Mobj, _info: &MobjInfo) {
    mo.special1 = 0;
    mo.special2 = 0;
    mo.special3 = 0;
    mo.last_enemy = None;
    mo.generator = None;
}

/// The full chain from the oldest readable record to the current one.
pub fn build_mobj_migrations() -> MobjMigrations {
    let steps = vec![
        MigrationStep {
            from_version: 1,
            description: "own thing id and target reference",
            migrate_fn: |_, _| {},
        },
        MigrationStep {
            from_version: 2,
            description: "internal flags, drop-off z and gear",
            migrate_fn: |_, _| {},
        },
        MigrationStep {
            from_version: 3,
            description: "translucency",
            migrate_fn: |_, _| {},
        },
        MigrationStep {
            from_version: 4,
            description: "tracer, on-mobj, vis target and floor clip",
            migrate_fn: |_, _| {},
        },
        MigrationStep {
            from_version: 5,
            description: "swap brightness flags, secondary flags and damage from type info",
            migrate_fn: migrate_v5_to_v6,
        },
        MigrationStep {
            from_version: 6,
            description: "tertiary flags from type info",
            migrate_fn: migrate_v6_to_v7,
        },
        MigrationStep {
            from_version: 7,
            description: "special counters, last enemy and generator",
            migrate_fn: migrate_v7_to_v8,
        },
    ];
    MobjMigrations::new(steps, MIN_MOBJ_RECORD_VERSION, MOBJ_RECORD_VERSION)
}
