use std::collections::{HashSet, VecDeque};

use xln_core::{Amount, EntityId, TokenId};

use crate::error::RoutingError;

/// Capacity and topology accessor the pathfinder reads from. Implemented
/// over whatever holds the live entity/account maps (the server); kept as
/// a trait so the pathfinder has no dependency on how that storage is
/// shaped.
pub trait CapacityView {
    /// `outCapacity(from -> to)` for `token_id`, or 0 if no account exists
    /// between the pair.
    fn out_capacity(&self, from: EntityId, to: EntityId, token_id: TokenId) -> Amount;

    /// Counterparties `of` has an account with.
    fn neighbors(&self, of: EntityId) -> Vec<EntityId>;
}

/// Pluggable edge cost. The reference implementation is plain hop count;
/// this trait leaves room for fee- or reliability-weighted routing
/// without changing the two-phase protocol (spec §9 open question).
pub trait RouteCost {
    fn cost(&self, from: EntityId, to: EntityId) -> u64;
}

/// Hop-count cost: every edge costs 1.
pub struct HopCountCost;

impl RouteCost for HopCountCost {
    fn cost(&self, _from: EntityId, _to: EntityId) -> u64 {
        1
    }
}

/// Bounded BFS over the account graph: find a path from `sender` to
/// `receiver` such that every hop's `outCapacity` is at least `amount`,
/// within `max_hops` edges (spec §4.4 "Route selection").
pub fn find_route(
    graph: &impl CapacityView,
    sender: EntityId,
    receiver: EntityId,
    token_id: TokenId,
    amount: Amount,
    max_hops: u8,
) -> Result<Vec<EntityId>, RoutingError> {
    if sender == receiver {
        return Ok(vec![sender]);
    }

    let mut visited: HashSet<EntityId> = HashSet::new();
    visited.insert(sender);
    let mut queue: VecDeque<Vec<EntityId>> = VecDeque::new();
    queue.push_back(vec![sender]);

    while let Some(path) = queue.pop_front() {
        if path.len() as u8 > max_hops {
            continue;
        }
        let tail = *path.last().expect("path is never empty");
        for next in graph.neighbors(tail) {
            if visited.contains(&next) {
                continue;
            }
            if graph.out_capacity(tail, next, token_id) < amount {
                continue;
            }
            let mut extended = path.clone();
            extended.push(next);
            if next == receiver {
                return Ok(extended);
            }
            if extended.len() as u8 <= max_hops {
                visited.insert(next);
                queue.push_back(extended);
            }
        }
    }

    Err(RoutingError::NoRoute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct MockGraph {
        edges: BTreeMap<(EntityId, EntityId), Amount>,
    }

    impl CapacityView for MockGraph {
        fn out_capacity(&self, from: EntityId, to: EntityId, _token_id: TokenId) -> Amount {
            *self.edges.get(&(from, to)).unwrap_or(&0)
        }

        fn neighbors(&self, of: EntityId) -> Vec<EntityId> {
            self.edges
                .keys()
                .filter_map(|(f, t)| if *f == of { Some(*t) } else { None })
                .collect()
        }
    }

    fn eid(n: u8) -> EntityId {
        EntityId([n; 32])
    }

    // Scenario C topology: 1-2-3-4, each hop with ample capacity.
    #[test]
    fn finds_three_hop_route() {
        let mut edges = BTreeMap::new();
        edges.insert((eid(1), eid(2)), 1000);
        edges.insert((eid(2), eid(3)), 1000);
        edges.insert((eid(3), eid(4)), 1000);
        let graph = MockGraph { edges };
        let path = find_route(&graph, eid(1), eid(4), 1, 200, 4).unwrap();
        assert_eq!(path, vec![eid(1), eid(2), eid(3), eid(4)]);
    }

    // Scenario D topology: final hop capacity too small.
    #[test]
    fn insufficient_capacity_at_final_hop_yields_no_route() {
        let mut edges = BTreeMap::new();
        edges.insert((eid(1), eid(2)), 1000);
        edges.insert((eid(2), eid(3)), 1000);
        edges.insert((eid(3), eid(4)), 100);
        let graph = MockGraph { edges };
        let err = find_route(&graph, eid(1), eid(4), 1, 200, 4).unwrap_err();
        assert_eq!(err, RoutingError::NoRoute);
    }

    #[test]
    fn respects_max_hops_bound() {
        let mut edges = BTreeMap::new();
        edges.insert((eid(1), eid(2)), 1000);
        edges.insert((eid(2), eid(3)), 1000);
        edges.insert((eid(3), eid(4)), 1000);
        let graph = MockGraph { edges };
        let err = find_route(&graph, eid(1), eid(4), 1, 200, 2).unwrap_err();
        assert_eq!(err, RoutingError::NoRoute);
    }
}
