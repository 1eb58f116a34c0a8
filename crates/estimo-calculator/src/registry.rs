//! Process-wide calculator registry.
//!
//! The host builds one registry at startup, calls [`CalculatorRegistry::register_all`]
//! and then shares it read-only (typically behind an `Arc`) with every pipeline run.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::built_in::{
    DigitalPrintCalculator, DimensionsCalculator, LaminationCalculator, PriceMarkupCalculator,
    dimensions,
};
use crate::descriptor::{CalculatorDescriptor, OptionSpec};
use crate::plugin::CalculatorPlugin;

const BUILT_IN_GROUPS: &[(&str, &str)] = &[
    ("general", "General"),
    ("printing", "Printing"),
    ("finishing", "Finishing"),
    ("pricing", "Pricing"),
];

/// Display group of calculators.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupInfo {
    pub id: String,
    pub title: String,
}

/// A display group together with its member descriptors.
#[derive(Debug, Clone, Serialize)]
pub struct CalculatorGroup<'a> {
    #[serde(flatten)]
    pub group: GroupInfo,
    pub calculators: Vec<&'a CalculatorDescriptor>,
}

/// Where a calculator may sit in a sequence.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionConstraints {
    pub can_be_first: bool,
    pub requires_before: Vec<String>,
    pub supports_chain: bool,
    pub supports_finalization: bool,
}

/// Detail view of a single calculator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorConfig {
    pub code: String,
    pub title: String,
    pub group: GroupInfo,
    pub fields: Vec<OptionSpec>,
    pub extra_options: HashMap<String, bool>,
    pub position_constraints: PositionConstraints,
}

pub struct CalculatorRegistry {
    plugins: Vec<Box<dyn CalculatorPlugin>>,
    index: HashMap<String, usize>,
    groups: Vec<GroupInfo>,
    built_ins_registered: bool,
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CalculatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorRegistry")
            .field("calculators", &self.plugins.iter().map(|p| p.code()).collect::<Vec<_>>())
            .field("built_ins_registered", &self.built_ins_registered)
            .finish()
    }
}

impl CalculatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { plugins: Vec::new(), index: HashMap::new(), groups: Vec::new(), built_ins_registered: false }
    }

    /// A registry populated with the built-in calculators.
    pub fn with_built_ins() -> Self {
        let mut registry = Self::new();
        registry.register_all();
        registry
    }

    /// Register the built-in calculators. Calling it again is a no-op.
    ///
    /// Built-ins are registered in code order, the way a plugin directory scan
    /// would find them.
    pub fn register_all(&mut self) {
        if self.built_ins_registered {
            return;
        }
        for (id, title) in BUILT_IN_GROUPS {
            self.register_group(id, title);
        }
        self.register(Box::new(DigitalPrintCalculator::new()));
        self.register(Box::new(DimensionsCalculator::new()));
        self.register(Box::new(LaminationCalculator::new()));
        self.register(Box::new(PriceMarkupCalculator::new()));
        self.built_ins_registered = true;
    }

    /// Register one calculator.
    ///
    /// # Panics
    ///
    /// Panics when a calculator with the same code is already registered.
    /// Registration only happens at startup, so a duplicate is a programming error.
    pub fn register(&mut self, plugin: Box<dyn CalculatorPlugin>) {
        let code = plugin.code().to_string();
        assert!(
            !self.index.contains_key(&code),
            "calculator '{code}' is already registered"
        );
        debug!(code = %code, group = %plugin.descriptor().group, "Registered calculator");
        self.index.insert(code, self.plugins.len());
        self.plugins.push(plugin);
    }

    /// Declare a display group title. Re-declaring an id updates its title.
    pub fn register_group(&mut self, id: &str, title: &str) {
        match self.groups.iter_mut().find(|g| g.id == id) {
            Some(group) => group.title = title.to_string(),
            None => self.groups.push(GroupInfo { id: id.to_string(), title: title.to_string() }),
        }
    }

    pub fn get_by_code(&self, code: &str) -> Option<&dyn CalculatorPlugin> {
        self.index.get(code).map(|&i| self.plugins[i].as_ref())
    }

    pub fn descriptor(&self, code: &str) -> Option<&CalculatorDescriptor> {
        self.get_by_code(code).map(|p| p.descriptor())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// All descriptors in registration order, except that the dimension
    /// normalization stage always comes first.
    pub fn get_all(&self) -> Vec<&CalculatorDescriptor> {
        let mut all: Vec<_> = self.plugins.iter().map(|p| p.descriptor()).collect();
        all.sort_by_key(|d| d.code != dimensions::CODE);
        all
    }

    /// Descriptors partitioned into display groups. Groups appear in the order
    /// their first member appears in [`get_all`](Self::get_all).
    pub fn get_grouped_list(&self) -> Vec<CalculatorGroup<'_>> {
        let mut grouped: Vec<CalculatorGroup<'_>> = Vec::new();
        for descriptor in self.get_all() {
            match grouped.iter_mut().find(|g| g.group.id == descriptor.group) {
                Some(group) => group.calculators.push(descriptor),
                None => grouped.push(CalculatorGroup {
                    group: self.group_info(&descriptor.group),
                    calculators: vec![descriptor],
                }),
            }
        }
        grouped
    }

    /// Groups that have at least one calculator.
    pub fn list_groups(&self) -> Vec<GroupInfo> {
        self.get_grouped_list().into_iter().map(|g| g.group).collect()
    }

    /// Descriptors for a UI builder. System calculators are hidden unless asked for.
    pub fn list_calculators(&self, include_system: bool) -> Vec<&CalculatorDescriptor> {
        self.get_all().into_iter().filter(|d| include_system || !d.is_system).collect()
    }

    pub fn get_calculator_config(&self, code: &str) -> Option<CalculatorConfig> {
        let descriptor = self.descriptor(code)?;
        let extra_options = HashMap::from([
            ("canChangePrice".to_string(), descriptor.can_change_price),
            ("isSystem".to_string(), descriptor.is_system),
        ]);
        Some(CalculatorConfig {
            code: descriptor.code.clone(),
            title: descriptor.title.clone(),
            group: self.group_info(&descriptor.group),
            fields: descriptor.options_spec.clone(),
            extra_options,
            position_constraints: PositionConstraints {
                can_be_first: descriptor.can_be_first,
                requires_before: descriptor.requires_before.clone(),
                supports_chain: descriptor.supports_chain,
                supports_finalization: descriptor.supports_finalization,
            },
        })
    }

    fn group_info(&self, id: &str) -> GroupInfo {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .unwrap_or_else(|| GroupInfo { id: id.to_string(), title: id.to_string() })
    }
}
