use crate::model::VertexId;

use super::junction_box::JunctionBoxId;

slotmap::new_key_type! {
    /// Unique identifier for an AC outlet bank.
    pub struct OutletBankId;
}

/// A specific outlet: bank, circuit within the bank, outlet within the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutletRef {
    pub bank: OutletBankId,
    pub circuit: usize,
    pub outlet: usize,
}

/// A fused pair (or more) of AC outlets.
#[derive(Debug, Clone)]
pub struct OutletCircuit {
    /// The box plugged into each outlet, if any.
    pub outlets: Vec<Option<JunctionBoxId>>,
}

impl OutletCircuit {
    fn new(outlets: usize) -> Self {
        Self {
            outlets: vec![None; outlets],
        }
    }

    /// Number of outlets with a box plugged in.
    #[must_use]
    pub fn claimed(&self) -> usize {
        self.outlets.iter().filter(|o| o.is_some()).count()
    }

    fn first_free(&self) -> Option<usize> {
        self.outlets.iter().position(Option::is_none)
    }
}

/// A bank of 110V outlets fed by the generator.
#[derive(Debug, Clone)]
pub struct OutletBankData {
    pub label: u32,
    pub vertex: VertexId,
    pub circuits: Vec<OutletCircuit>,
}

impl OutletBankData {
    /// Creates a bank with every outlet free.
    #[must_use]
    pub fn new(label: u32, vertex: VertexId, circuits: usize, outlets_per_circuit: usize) -> Self {
        Self {
            label,
            vertex,
            circuits: (0..circuits)
                .map(|_| OutletCircuit::new(outlets_per_circuit))
                .collect(),
        }
    }

    /// Label as printed on the build sheets.
    #[must_use]
    pub fn decorated_label(&self) -> String {
        format!("O{}", self.label)
    }

    /// Returns `true` if any outlet is still free.
    #[must_use]
    pub fn has_free_outlet(&self) -> bool {
        self.circuits.iter().any(|c| c.first_free().is_some())
    }

    /// The free outlet on the circuit with the fewest boxes plugged in.
    /// Ties go to the lowest circuit index.
    #[must_use]
    pub fn least_loaded_free_outlet(&self) -> Option<(usize, usize)> {
        self.circuits
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.first_free().map(|o| (i, o, c.claimed())))
            .min_by_key(|&(i, _, claimed)| (claimed, i))
            .map(|(i, o, _)| (i, o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreads_across_circuits_before_doubling_up() {
        let mut bank = OutletBankData::new(1, VertexId::default(), 2, 2);
        let (c0, o0) = bank.least_loaded_free_outlet().unwrap_or_default();
        bank.circuits[c0].outlets[o0] = Some(JunctionBoxId::default());
        let (c1, _) = bank.least_loaded_free_outlet().unwrap_or_default();
        assert_eq!((c0, c1), (0, 1));
    }

    #[test]
    fn full_bank_has_nothing_free() {
        let mut bank = OutletBankData::new(1, VertexId::default(), 1, 2);
        bank.circuits[0].outlets = vec![Some(JunctionBoxId::default()); 2];
        assert!(!bank.has_free_outlet());
        assert!(bank.least_loaded_free_outlet().is_none());
    }
}
