use std::collections::HashMap;

/// Hands out `<vertex>-<n>` labels, counting separately per vertex.
///
/// The second box at vertex 100 is `100-1`.
#[derive(Debug, Default, Clone)]
pub struct LabelAllocator {
    next: HashMap<u32, u32>,
}

impl LabelAllocator {
    /// Creates an allocator with every vertex counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next label at `vertex_label`.
    pub fn allocate(&mut self, vertex_label: u32) -> String {
        let counter = self.next.entry(vertex_label).or_insert(0);
        let label = format!("{vertex_label}-{counter}");
        *counter += 1;
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_vertex() {
        let mut labels = LabelAllocator::new();
        assert_eq!(labels.allocate(100), "100-0");
        assert_eq!(labels.allocate(100), "100-1");
        assert_eq!(labels.allocate(7), "7-0");
        assert_eq!(labels.allocate(100), "100-2");
    }
}
