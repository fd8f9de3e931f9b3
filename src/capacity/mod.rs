pub mod allocator;
pub mod circuit;
pub mod controller;
pub mod junction_box;
pub mod outlet_bank;

pub use allocator::LabelAllocator;
pub use circuit::{CircuitData, CircuitId};
pub use controller::{ControllerData, ControllerId};
pub use junction_box::{JunctionBoxData, JunctionBoxId};
pub use outlet_bank::{OutletBankData, OutletBankId, OutletCircuit, OutletRef};

use std::collections::HashMap;

use slotmap::{SecondaryMap, SlotMap};

use crate::config::PlannerParams;
use crate::error::{ModelError, PlacementError, Result};
use crate::model::{EdgeId, PanelId, StripId, StripOwner, VehicleModel, VertexId};

/// Fixed capacity limits applied to every entity in a plan.
#[derive(Debug, Clone, Copy)]
pub struct CapacityLimits {
    pub circuits_per_box: usize,
    pub circuit_max_current: f64,
    pub max_controllers_per_box: usize,
    pub max_channels_per_controller: usize,
    pub outlet_circuits_per_bank: usize,
    pub outlets_per_circuit: usize,
}

impl From<&PlannerParams> for CapacityLimits {
    fn from(params: &PlannerParams) -> Self {
        Self {
            circuits_per_box: params.placement.circuits_per_box,
            circuit_max_current: params.electrical.circuit_max_current,
            max_controllers_per_box: params.placement.max_controllers_per_box,
            max_channels_per_controller: params.placement.max_channels_per_controller,
            outlet_circuits_per_bank: params.power.circuits_per_bank,
            outlets_per_circuit: params.power.outlets_per_circuit,
        }
    }
}

/// Central arena for everything a planning run creates: junction boxes,
/// their circuits, controllers, and outlet banks, plus the strip-to-circuit
/// assignment.
///
/// All mutation goes through methods that enforce the capacity limits, so
/// no intermediate state ever exceeds them.
#[derive(Debug)]
pub struct WiringPlan {
    limits: CapacityLimits,
    boxes: SlotMap<JunctionBoxId, JunctionBoxData>,
    circuits: SlotMap<CircuitId, CircuitData>,
    controllers: SlotMap<ControllerId, ControllerData>,
    outlet_banks: SlotMap<OutletBankId, OutletBankData>,
    strip_circuits: SecondaryMap<StripId, CircuitId>,
    boxes_by_vertex: HashMap<VertexId, Vec<JunctionBoxId>>,
    controllers_by_vertex: HashMap<VertexId, Vec<ControllerId>>,
    box_labels: LabelAllocator,
    controller_labels: LabelAllocator,
}

impl WiringPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new(limits: CapacityLimits) -> Self {
        Self {
            limits,
            boxes: SlotMap::with_key(),
            circuits: SlotMap::with_key(),
            controllers: SlotMap::with_key(),
            outlet_banks: SlotMap::with_key(),
            strip_circuits: SecondaryMap::new(),
            boxes_by_vertex: HashMap::new(),
            controllers_by_vertex: HashMap::new(),
            box_labels: LabelAllocator::new(),
            controller_labels: LabelAllocator::new(),
        }
    }

    /// The limits this plan enforces.
    #[must_use]
    pub fn limits(&self) -> &CapacityLimits {
        &self.limits
    }

    // --- Junction boxes ---

    /// Creates an empty box with a full set of circuits at `vertex`.
    pub fn add_junction_box(&mut self, vertex: VertexId, vertex_label: u32) -> JunctionBoxId {
        let label = self.box_labels.allocate(vertex_label);
        let id = self.boxes.insert(JunctionBoxData {
            label,
            vertex,
            circuits: Vec::with_capacity(self.limits.circuits_per_box),
            controllers: Vec::new(),
            outlet: None,
        });
        let circuits: Vec<CircuitId> = (0..self.limits.circuits_per_box)
            .map(|index| {
                self.circuits
                    .insert(CircuitData::new(id, index, self.limits.circuit_max_current))
            })
            .collect();
        if let Some(data) = self.boxes.get_mut(id) {
            data.circuits = circuits;
        }
        self.boxes_by_vertex.entry(vertex).or_default().push(id);
        id
    }

    /// Returns a reference to the box data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the plan.
    pub fn junction_box(&self, id: JunctionBoxId) -> Result<&JunctionBoxData> {
        self.boxes
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("junction box {id:?}")).into())
    }

    /// Iterates over all boxes in creation order.
    pub fn junction_boxes(&self) -> impl Iterator<Item = (JunctionBoxId, &JunctionBoxData)> {
        self.boxes.iter()
    }

    /// IDs of all boxes in creation order.
    #[must_use]
    pub fn junction_box_ids(&self) -> Vec<JunctionBoxId> {
        self.boxes.keys().collect()
    }

    /// Number of boxes placed so far.
    #[must_use]
    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Boxes at `vertex`, in creation order.
    #[must_use]
    pub fn boxes_at(&self, vertex: VertexId) -> &[JunctionBoxId] {
        self.boxes_by_vertex.get(&vertex).map_or(&[], Vec::as_slice)
    }

    /// Total assigned current across a box's circuits.
    ///
    /// # Errors
    ///
    /// Returns an error if the box is unknown.
    pub fn box_current(&self, id: JunctionBoxId) -> Result<f64> {
        let mut total = 0.0;
        for c in self.box_circuits(id)? {
            total += self.circuit(c)?.current;
        }
        Ok(total)
    }

    /// Average circuit utilization of a box.
    ///
    /// # Errors
    ///
    /// Returns an error if the box is unknown.
    pub fn box_utilization(&self, id: JunctionBoxId) -> Result<f64> {
        let circuits = self.box_circuits(id)?;
        if circuits.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for c in &circuits {
            total += self.circuit(*c)?.utilization();
        }
        #[allow(clippy::cast_precision_loss)]
        let count = circuits.len() as f64;
        Ok(total / count)
    }

    /// Remaining headroom of each circuit in a box, in circuit order.
    ///
    /// # Errors
    ///
    /// Returns an error if the box is unknown.
    pub fn circuit_headrooms(&self, id: JunctionBoxId) -> Result<Vec<f64>> {
        self.box_circuits(id)?
            .into_iter()
            .map(|c| self.circuit(c).map(CircuitData::headroom))
            .collect()
    }

    fn box_circuits(&self, id: JunctionBoxId) -> Result<Vec<CircuitId>> {
        Ok(self.junction_box(id)?.circuits.clone())
    }

    // --- Circuits and strips ---

    /// Returns a reference to the circuit data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the plan.
    pub fn circuit(&self, id: CircuitId) -> Result<&CircuitData> {
        self.circuits
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("circuit {id:?}")).into())
    }

    /// Iterates over all circuits.
    pub fn circuits(&self) -> impl Iterator<Item = (CircuitId, &CircuitData)> {
        self.circuits.iter()
    }

    /// The circuit a strip is assigned to, if any.
    #[must_use]
    pub fn strip_circuit(&self, strip: StripId) -> Option<CircuitId> {
        self.strip_circuits.get(strip).copied()
    }

    /// Returns `true` once a strip has a circuit.
    #[must_use]
    pub fn is_assigned(&self, strip: StripId) -> bool {
        self.strip_circuits.contains_key(strip)
    }

    /// Number of strips assigned so far.
    #[must_use]
    pub fn assigned_strip_count(&self) -> usize {
        self.strip_circuits.len()
    }

    /// Puts a strip on a circuit.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::CapacityExceeded`] if the circuit cannot
    /// take the strip's current, and
    /// [`PlacementError::DataIntegrityMismatch`] if the strip already has a
    /// circuit. Strips are never reassigned.
    pub fn assign_strip(
        &mut self,
        model: &VehicleModel,
        strip: StripId,
        circuit: CircuitId,
    ) -> Result<()> {
        let data = model.strip(strip)?;
        if let Some(existing) = self.strip_circuit(strip) {
            let owner = self.circuit_label(existing)?;
            return Err(PlacementError::DataIntegrityMismatch(format!(
                "strip {} is already assigned to {owner}",
                data.label
            ))
            .into());
        }
        let target = self.circuit_label(circuit)?;
        let slot = self
            .circuits
            .get_mut(circuit)
            .ok_or_else(|| ModelError::EntityNotFound(format!("circuit {circuit:?}")))?;
        if !slot.fits(data.current) {
            return Err(PlacementError::CapacityExceeded {
                target: format!("circuit {target} (strip {})", data.label),
                requested: data.current,
                available: slot.headroom(),
            }
            .into());
        }
        slot.current += data.current;
        match data.owner {
            StripOwner::Edge { .. } => slot.edge_strips.push(strip),
            StripOwner::Panel { .. } => slot.panel_strips.push(strip),
        }
        self.strip_circuits.insert(strip, circuit);
        Ok(())
    }

    /// `<box label>/<circuit index>`, for messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the circuit or its box is unknown.
    pub fn circuit_label(&self, id: CircuitId) -> Result<String> {
        let circuit = self.circuit(id)?;
        let owner = self.junction_box(circuit.junction_box)?;
        Ok(format!("{}/{}", owner.label, circuit.index))
    }

    /// The box a strip's circuit belongs to, if assigned.
    #[must_use]
    pub fn strip_box(&self, strip: StripId) -> Option<JunctionBoxId> {
        let circuit = self.strip_circuit(strip)?;
        self.circuits.get(circuit).map(|c| c.junction_box)
    }

    // --- Controllers ---

    /// Creates a controller at `vertex` with a fresh `<vertex>-<n>` label.
    pub fn add_controller(&mut self, vertex: VertexId, vertex_label: u32) -> ControllerId {
        let label = self.controller_labels.allocate(vertex_label);
        let id = self.controllers.insert(ControllerData::new(label, vertex));
        self.controllers_by_vertex.entry(vertex).or_default().push(id);
        id
    }

    /// Returns a reference to the controller data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the plan.
    pub fn controller(&self, id: ControllerId) -> Result<&ControllerData> {
        self.controllers
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("controller {id:?}")).into())
    }

    /// Iterates over all controllers in creation order.
    pub fn controllers(&self) -> impl Iterator<Item = (ControllerId, &ControllerData)> {
        self.controllers.iter()
    }

    /// Number of controllers.
    #[must_use]
    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Controllers located at `vertex`, in creation order.
    #[must_use]
    pub fn controllers_at(&self, vertex: VertexId) -> &[ControllerId] {
        self.controllers_by_vertex
            .get(&vertex)
            .map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if the controller has room for `channels` more.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller is unknown.
    pub fn controller_fits(&self, id: ControllerId, channels: usize) -> Result<bool> {
        Ok(self.controller(id)?.channels + channels <= self.limits.max_channels_per_controller)
    }

    /// Makes the controller inject signal into an edge (one channel).
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::CapacityExceeded`] if the controller has
    /// no channel left.
    pub fn drive_edge(&mut self, id: ControllerId, edge: EdgeId) -> Result<()> {
        self.reserve_channels(id, 1)?;
        if let Some(c) = self.controllers.get_mut(id) {
            c.edges.push(edge);
        }
        Ok(())
    }

    /// Makes the controller drive a panel over `channels` channels.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::CapacityExceeded`] if the panel's
    /// channels do not fit.
    pub fn drive_panel(&mut self, id: ControllerId, panel: PanelId, channels: usize) -> Result<()> {
        self.reserve_channels(id, channels)?;
        if let Some(c) = self.controllers.get_mut(id) {
            c.panels.push(panel);
        }
        Ok(())
    }

    fn reserve_channels(&mut self, id: ControllerId, channels: usize) -> Result<()> {
        let max = self.limits.max_channels_per_controller;
        let controller = self
            .controllers
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("controller {id:?}")))?;
        if controller.channels + channels > max {
            #[allow(clippy::cast_precision_loss)]
            let (requested, available) = (
                channels as f64,
                max.saturating_sub(controller.channels) as f64,
            );
            return Err(PlacementError::CapacityExceeded {
                target: format!("controller {}", controller.decorated_label()),
                requested,
                available,
            }
            .into());
        }
        controller.channels += channels;
        Ok(())
    }

    /// Houses a controller in a box.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::CapacityExceeded`] if the box is full, and
    /// [`PlacementError::DataIntegrityMismatch`] if the controller is
    /// already housed.
    pub fn house_controller(&mut self, controller: ControllerId, target: JunctionBoxId) -> Result<()> {
        let max = self.limits.max_controllers_per_box;
        let data = self.controller(controller)?;
        if data.junction_box.is_some() {
            return Err(PlacementError::DataIntegrityMismatch(format!(
                "controller {} is already housed",
                data.decorated_label()
            ))
            .into());
        }
        let slot = self
            .boxes
            .get_mut(target)
            .ok_or_else(|| ModelError::EntityNotFound(format!("junction box {target:?}")))?;
        if slot.controllers.len() >= max {
            return Err(PlacementError::CapacityExceeded {
                target: format!("junction box {} controller slots", slot.label),
                requested: 1.0,
                available: 0.0,
            }
            .into());
        }
        slot.controllers.push(controller);
        if let Some(c) = self.controllers.get_mut(controller) {
            c.junction_box = Some(target);
        }
        Ok(())
    }

    // --- Outlet banks ---

    /// Creates an outlet bank with every outlet free.
    pub fn add_outlet_bank(&mut self, vertex: VertexId, vertex_label: u32) -> OutletBankId {
        self.outlet_banks.insert(OutletBankData::new(
            vertex_label,
            vertex,
            self.limits.outlet_circuits_per_bank,
            self.limits.outlets_per_circuit,
        ))
    }

    /// Returns a reference to the outlet bank, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the plan.
    pub fn outlet_bank(&self, id: OutletBankId) -> Result<&OutletBankData> {
        self.outlet_banks
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("outlet bank {id:?}")).into())
    }

    /// Iterates over all outlet banks.
    pub fn outlet_banks(&self) -> impl Iterator<Item = (OutletBankId, &OutletBankData)> {
        self.outlet_banks.iter()
    }

    /// Plugs a box into the least-loaded free outlet of a bank.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::NoEligibleTarget`] if the bank is full and
    /// [`PlacementError::DataIntegrityMismatch`] if the box already has
    /// power.
    pub fn claim_outlet(&mut self, bank: OutletBankId, target: JunctionBoxId) -> Result<OutletRef> {
        if let Some(existing) = self.junction_box(target)?.outlet {
            return Err(PlacementError::DataIntegrityMismatch(format!(
                "junction box {} is already powered from {:?}",
                self.junction_box(target)?.label,
                existing
            ))
            .into());
        }
        let data = self
            .outlet_banks
            .get_mut(bank)
            .ok_or_else(|| ModelError::EntityNotFound(format!("outlet bank {bank:?}")))?;
        let (circuit, outlet) = data.least_loaded_free_outlet().ok_or_else(|| {
            PlacementError::NoEligibleTarget(format!(
                "outlet bank {} has no free outlet",
                data.decorated_label()
            ))
        })?;
        data.circuits[circuit].outlets[outlet] = Some(target);
        let reference = OutletRef {
            bank,
            circuit,
            outlet,
        };
        if let Some(b) = self.boxes.get_mut(target) {
            b.outlet = Some(reference);
        }
        Ok(reference)
    }
}
