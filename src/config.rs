use std::path::Path;

use serde::Deserialize;

use crate::error::{InputError, Result};

/// Every tunable constant of a planning run.
///
/// Missing TOML keys fall back to [`Default`], so a config file only needs
/// to list what it overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerParams {
    pub electrical: ElectricalParams,
    pub placement: PlacementParams,
    pub power: PowerParams,
    pub cables: CableParams,
}

/// LED density and current draw.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElectricalParams {
    /// Parallel LED strips run along every edge.
    pub strips_per_edge: usize,
    /// 60 LEDs per meter.
    pub leds_per_micron: f64,
    pub leds_per_square_micron: f64,
    /// Worst-case draw of one LED, in amps.
    pub max_current_per_led: f64,
    /// Fuse rating of a junction-box circuit, in amps.
    pub circuit_max_current: f64,
    /// Panel strips are cut at this fraction of a circuit's rating.
    pub panel_strip_scale: f64,
}

impl Default for ElectricalParams {
    fn default() -> Self {
        Self {
            strips_per_edge: 3,
            leds_per_micron: 0.000_06,
            leds_per_square_micron: 462.0 / 1e12,
            max_current_per_led: 0.03,
            circuit_max_current: 15.0,
            panel_strip_scale: 0.8,
        }
    }
}

impl ElectricalParams {
    /// Largest current a single panel strip may draw.
    #[must_use]
    pub fn panel_strip_current(&self) -> f64 {
        self.circuit_max_current * self.panel_strip_scale
    }
}

/// Junction-box placement and controller limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
    pub circuits_per_box: usize,
    pub max_controllers_per_box: usize,
    pub max_channels_per_controller: usize,
    /// 1V drop over 12 AWG.
    pub voltage_drop_limit_feet: f64,
    /// Hops searched around an edge for an existing box.
    pub neighbor_search_hops: usize,
    /// Mounting points hidden by the crow's-nest platform.
    pub crows_nest_vertices: Vec<u32>,
    pub max_controller_to_pixel_feet: f64,
    /// Measured coordinates are never exactly symmetric.
    pub mirror_tolerance_microns: f64,
    pub expected_controller_count: Option<usize>,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            circuits_per_box: 16,
            max_controllers_per_box: 4,
            max_channels_per_controller: 8,
            voltage_drop_limit_feet: 17.0,
            neighbor_search_hops: 2,
            crows_nest_vertices: vec![31, 42],
            max_controller_to_pixel_feet: 7.1,
            mirror_tolerance_microns: 1_000.0,
            expected_controller_count: None,
        }
    }
}

/// AC power sources.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PowerParams {
    pub outlet_bank_vertices: Vec<u32>,
    pub circuits_per_bank: usize,
    pub outlets_per_circuit: usize,
}

impl Default for PowerParams {
    fn default() -> Self {
        Self {
            outlet_bank_vertices: Vec::new(),
            circuits_per_bank: 10,
            outlets_per_circuit: 2,
        }
    }
}

/// Cable manifest bucketing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CableParams {
    pub bucket_width_feet: u32,
    pub bucket_count: u32,
    /// Extra AC cable for rigging around the structure.
    pub ac_rigging_allowance_feet: f64,
    pub controller_power_fudge_factor: f64,
}

impl Default for CableParams {
    fn default() -> Self {
        Self {
            bucket_width_feet: 5,
            bucket_count: 10,
            ac_rigging_allowance_feet: 10.0,
            controller_power_fudge_factor: 1.10,
        }
    }
}

impl PlannerParams {
    /// Parses parameters from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for these parameters,
    /// or if the resulting values are inconsistent.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let params: Self = toml::from_str(text).map_err(InputError::from)?;
        params.validate()?;
        Ok(params)
    }

    /// Reads parameters from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(InputError::from)?;
        Self::from_toml_str(&text)
    }

    /// Rejects settings no plan could satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidConfig`] naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        let e = &self.electrical;
        if e.circuit_max_current <= 0.0 {
            return Err(invalid("electrical.circuit_max_current must be positive"));
        }
        if !(e.panel_strip_scale > 0.0 && e.panel_strip_scale <= 1.0) {
            return Err(invalid("electrical.panel_strip_scale must be in (0, 1]"));
        }
        if e.strips_per_edge == 0 {
            return Err(invalid("electrical.strips_per_edge must be at least 1"));
        }
        let p = &self.placement;
        if p.circuits_per_box == 0 || p.max_controllers_per_box == 0 {
            return Err(invalid("placement limits must be at least 1"));
        }
        if p.max_channels_per_controller == 0 {
            return Err(invalid("placement.max_channels_per_controller must be at least 1"));
        }
        let power = &self.power;
        if power.circuits_per_bank == 0 || power.outlets_per_circuit == 0 {
            return Err(invalid("power outlet counts must be at least 1"));
        }
        if self.cables.bucket_width_feet == 0 || self.cables.bucket_count == 0 {
            return Err(invalid("cables buckets must be non-empty"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> crate::error::PlannerError {
    InputError::InvalidConfig(message.into()).into()
}
