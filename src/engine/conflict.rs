//! Conflict resolution: pick the winning specifier for each property.

use std::collections::BTreeMap;

use tracing::trace;

use crate::specifier::{Priority, Specifier};
use crate::{Error, Result};

/// Winning specifiers for one property, as indices into the input slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Winner {
    /// Supplies the base value, committed first.
    pub base: usize,
    /// Recomputes the committed base value, if any.
    pub modifier: Option<usize>,
}

/// Pick one base (and at most one modifier) per property.
///
/// The highest priority among all contributors decides. Two plain
/// specifiers, or two modifiers, sharing that priority are a duplicate.
/// A modifier alone at the top recomputes the strongest plain specifier
/// below it; if that tier is itself tied, the modifier stands alone.
///
/// Iteration is by property name, so the first error reported is the same
/// on every run.
pub(crate) fn resolve_conflicts(specs: &[Specifier]) -> Result<BTreeMap<String, Winner>> {
    let mut contributions: BTreeMap<&str, Vec<(usize, Priority)>> = BTreeMap::new();
    for (idx, spec) in specs.iter().enumerate() {
        for (prop, prio) in spec.priorities() {
            contributions.entry(prop.as_str()).or_default().push((idx, *prio));
        }
    }

    let mut winners = BTreeMap::new();
    for (prop, contribs) in contributions {
        let Some(top) = contribs.iter().map(|(_, p)| *p).max() else { continue };
        let (modifiers, plain): (Vec<_>, Vec<_>) =
            contribs.into_iter().partition(|(idx, _)| specs[*idx].modifies(prop));

        let plain_top = unique_at(specs, prop, &plain, top)?;
        let modifier_top = unique_at(specs, prop, &modifiers, top)?;

        let winner = match (plain_top, modifier_top) {
            (Some(base), modifier) => Winner { base, modifier },
            (None, Some(modifier)) => {
                let lower = plain.iter().map(|(_, p)| *p).max();
                match lower.map(|p| at_priority(&plain, p)) {
                    Some(tier) if tier.len() == 1 => Winner { base: tier[0], modifier: Some(modifier) },
                    Some(tier) => {
                        for idx in tier {
                            trace!(property = prop, specifier = specs[idx].name(), "tied specifier shadowed");
                        }
                        Winner { base: modifier, modifier: None }
                    }
                    None => Winner { base: modifier, modifier: None },
                }
            }
            (None, None) => continue,
        };

        for (idx, p) in modifiers.iter().filter(|(_, p)| *p < top) {
            trace!(property = prop, specifier = specs[*idx].name(), priority = %p, "modifier shadowed");
        }
        winners.insert(prop.to_owned(), winner);
    }
    Ok(winners)
}

/// Indices of the candidates at exactly `prio`, in input order.
fn at_priority(candidates: &[(usize, Priority)], prio: Priority) -> Vec<usize> {
    candidates.iter().filter(|(_, p)| *p == prio).map(|(idx, _)| *idx).collect()
}

/// The single candidate at `prio`, if any; two or more are a duplicate.
fn unique_at(
    specs: &[Specifier],
    prop: &str,
    candidates: &[(usize, Priority)],
    prio: Priority,
) -> Result<Option<usize>> {
    match at_priority(candidates, prio)[..] {
        [] => Ok(None),
        [only] => Ok(Some(only)),
        [first, second, ..] => Err(duplicate(specs, prop, first, second)),
    }
}

fn duplicate(specs: &[Specifier], prop: &str, a: usize, b: usize) -> Error {
    Error::DuplicateSpecification {
        property: prop.to_owned(),
        first: specs[a].name().to_owned(),
        second: specs[b].name().to_owned(),
    }
}
