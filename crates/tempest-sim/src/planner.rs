//! Shortest-path planning over the weather constraint graph.
//!
//! The catalog induces a directed graph with an edge A -> B whenever
//! `can_transition(A, B)` holds. The planner returns only the first
//! hop of the shortest path toward a goal: catalog windows can shift
//! between calls, and re-planning every selection is cheap (the
//! catalog is small and static, worst case O(types^2)).

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use tempest_common::WeatherTag;

use crate::catalog::{WeatherCatalog, WeatherType};

/// Compute the next single hop from `from` toward `goal`.
///
/// Returns `goal` itself when a direct transition is allowed.
/// Otherwise runs breadth-first search and returns the first step of
/// the shortest path, or `None` when the goal is currently
/// unreachable. Never revisits a tag, so cyclic constraint graphs
/// terminate.
#[must_use]
pub fn next_hop(
    catalog: &WeatherCatalog,
    from: &WeatherTag,
    goal: &WeatherTag,
) -> Option<WeatherTag> {
    let from_ty = catalog.get(from)?;
    let goal_ty = catalog.get(goal)?;

    if from_ty.can_transition_to(goal_ty) {
        return Some(goal_ty.tag.clone());
    }

    let mut visited: AHashSet<&WeatherTag> = AHashSet::new();
    visited.insert(&from_ty.tag);

    let mut queue: VecDeque<&WeatherType> = VecDeque::new();
    queue.push_back(from_ty);

    // Predecessor on the discovered shortest path, keyed by tag.
    let mut predecessor: AHashMap<&WeatherTag, &WeatherTag> = AHashMap::new();

    while let Some(current) = queue.pop_front() {
        for candidate in catalog.iter() {
            if visited.contains(&candidate.tag) {
                continue;
            }
            if !current.can_transition_to(candidate) {
                continue;
            }

            if candidate.tag == goal_ty.tag {
                // Walk the predecessor chain back to the hop whose
                // predecessor is `from`. `current` is never `from`
                // here: a depth-one discovery is the direct-edge case
                // handled above.
                let mut hop = &current.tag;
                while let Some(prev) = predecessor.get(hop) {
                    if *prev == &from_ty.tag {
                        break;
                    }
                    hop = *prev;
                }
                return Some(hop.clone());
            }

            visited.insert(&candidate.tag);
            predecessor.insert(&candidate.tag, &current.tag);
            queue.push_back(candidate);
        }
    }

    debug!(%from, %goal, "goal weather unreachable");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WeatherType;

    fn ty(
        tag: &'static str,
        prior: Option<&'static str>,
        subsequent: Option<&'static str>,
    ) -> WeatherType {
        WeatherType {
            tag: WeatherTag::new(tag),
            requires_prior: prior.map(WeatherTag::new),
            requires_subsequent: subsequent.map(WeatherTag::new),
            month_range: (1, 12),
            duration_minutes: (25.0, 60.0),
            scalar_attributes: Vec::new(),
            color_attributes: Vec::new(),
            fog_density: (0.02, 0.02),
            fog_height_falloff: (0.2, 0.2),
        }
    }

    fn tag(s: &'static str) -> WeatherTag {
        WeatherTag::new(s)
    }

    /// Clear -> Cloudy -> Rain, with rain requiring cloudy before it.
    fn chain_catalog() -> WeatherCatalog {
        WeatherCatalog::new(vec![
            ty("clear", None, None),
            ty("cloudy", None, None),
            ty("rain", Some("cloudy"), None),
        ])
        .expect("valid catalog")
    }

    #[test]
    fn test_direct_hop() {
        let catalog = chain_catalog();
        assert_eq!(
            next_hop(&catalog, &tag("cloudy"), &tag("rain")),
            Some(tag("rain"))
        );
    }

    #[test]
    fn test_two_hop_path() {
        let catalog = chain_catalog();
        // Clear cannot reach rain directly; the first step is cloudy.
        assert_eq!(
            next_hop(&catalog, &tag("clear"), &tag("rain")),
            Some(tag("cloudy"))
        );
    }

    #[test]
    fn test_three_hop_path_returns_first_step() {
        // clear -> cloudy -> rain -> storm, each forced by priors.
        let catalog = WeatherCatalog::new(vec![
            ty("clear", None, None),
            ty("cloudy", None, None),
            ty("rain", Some("cloudy"), None),
            ty("storm", Some("rain"), None),
        ])
        .expect("valid catalog");

        assert_eq!(
            next_hop(&catalog, &tag("clear"), &tag("storm")),
            Some(tag("cloudy"))
        );
        assert_eq!(
            next_hop(&catalog, &tag("cloudy"), &tag("storm")),
            Some(tag("rain"))
        );
    }

    #[test]
    fn test_unreachable_goal() {
        // Island: nothing may transition into "aurora".
        let catalog = WeatherCatalog::new(vec![
            ty("clear", None, None),
            ty("aurora", Some("nonexistent"), None),
        ])
        .expect("valid catalog");

        assert_eq!(next_hop(&catalog, &tag("clear"), &tag("aurora")), None);
    }

    #[test]
    fn test_unknown_tags() {
        let catalog = chain_catalog();
        assert_eq!(next_hop(&catalog, &tag("missing"), &tag("rain")), None);
        assert_eq!(next_hop(&catalog, &tag("clear"), &tag("missing")), None);
    }

    #[test]
    fn test_terminates_on_cycles() {
        // fog <-> mist force a two-cycle; storm is unreachable.
        let catalog = WeatherCatalog::new(vec![
            ty("fog", None, Some("mist")),
            ty("mist", None, Some("fog")),
            ty("storm", Some("thunder"), None),
        ])
        .expect("valid catalog");

        assert_eq!(next_hop(&catalog, &tag("fog"), &tag("storm")), None);
    }

    #[test]
    fn test_forced_chain_via_subsequent() {
        // calm must exit to breeze; gale requires breeze before it.
        let catalog = WeatherCatalog::new(vec![
            ty("calm", None, Some("breeze")),
            ty("breeze", None, None),
            ty("gale", Some("breeze"), None),
        ])
        .expect("valid catalog");

        assert_eq!(
            next_hop(&catalog, &tag("calm"), &tag("gale")),
            Some(tag("breeze"))
        );
    }
}
