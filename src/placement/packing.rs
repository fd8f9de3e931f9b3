use crate::math::CURRENT_TOLERANCE;

/// Chooses a circuit for each strip of one edge.
///
/// Each strip goes to the circuit with the most remaining headroom that
/// can hold it, preferring circuits not already used by an earlier strip
/// of the same edge. Ties go to the lowest circuit index. Returns `None`
/// if some strip fits nowhere.
#[must_use]
pub fn pack_edge_strips(headrooms: &[f64], currents: &[f64]) -> Option<Vec<usize>> {
    let mut room = headrooms.to_vec();
    let mut used = vec![false; room.len()];
    let mut slots = Vec::with_capacity(currents.len());

    for &amps in currents {
        let slot = roomiest(&room, amps, |i| !used[i]).or_else(|| roomiest(&room, amps, |_| true))?;
        room[slot] -= amps;
        used[slot] = true;
        slots.push(slot);
    }
    Some(slots)
}

fn roomiest(room: &[f64], amps: f64, allowed: impl Fn(usize) -> bool) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &r) in room.iter().enumerate() {
        if !allowed(i) || r + CURRENT_TOLERANCE < amps {
            continue;
        }
        if best.map_or(true, |b| r > room[b]) {
            best = Some(i);
        }
    }
    best
}

/// Returns `true` if all `currents` can be packed into `headrooms`.
///
/// The total headroom must cover the total draw, and every strip must land
/// whole on one circuit.
#[must_use]
pub fn can_fit_strips(headrooms: &[f64], currents: &[f64]) -> bool {
    let free: f64 = headrooms.iter().sum();
    let needed: f64 = currents.iter().sum();
    free + CURRENT_TOLERANCE >= needed && pack_edge_strips(headrooms, currents).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreads_strips_over_distinct_circuits() {
        let slots = pack_edge_strips(&[15.0, 15.0, 15.0, 15.0], &[2.0, 2.0, 2.0]).unwrap_or_default();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn prefers_roomiest_circuit() {
        let slots = pack_edge_strips(&[3.0, 10.0, 7.0], &[2.0, 2.0]).unwrap_or_default();
        assert_eq!(slots, vec![1, 2]);
    }

    #[test]
    fn reuses_a_circuit_when_no_alternative_fits() {
        let slots = pack_edge_strips(&[15.0, 1.0], &[3.0, 3.0, 3.0]).unwrap_or_default();
        assert_eq!(slots, vec![0, 0, 0]);
    }

    #[test]
    fn strip_too_large_for_any_circuit() {
        assert!(pack_edge_strips(&[2.0, 2.0], &[3.0]).is_none());
    }

    #[test]
    fn total_headroom_is_not_enough_when_fragmented() {
        // 4 A free in total but no single circuit holds a 3 A strip.
        assert!(!can_fit_strips(&[2.0, 2.0], &[3.0]));
        assert!(can_fit_strips(&[2.0, 3.0], &[3.0]));
    }

    #[test]
    fn thirteen_amp_circuit_rejects_three_amp_strip() {
        assert_eq!(pack_edge_strips(&[2.0, 15.0], &[3.0]).unwrap_or_default(), vec![1]);
        assert!(pack_edge_strips(&[2.0], &[3.0]).is_none());
    }
}
