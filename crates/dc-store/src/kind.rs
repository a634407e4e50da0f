//! Entity kinds and their backend routing.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    MeterGroup,
    Meter,
    Scenario,
    RatePlan,
    DerConfiguration,
    DerStrategy,
    GhgRate,
    CaisoRate,
}

/// Routing facts for one kind: `/{domain}/{resource}/` and the key its
/// collection uses when side-loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindInfo {
    pub kind: EntityKind,
    pub name: &'static str,
    pub domain: &'static str,
    pub resource: &'static str,
    pub sideload_key: &'static str,
}

const fn row(
    kind: EntityKind,
    name: &'static str,
    domain: &'static str,
    resource: &'static str,
    sideload_key: &'static str,
) -> KindInfo {
    KindInfo {
        kind,
        name,
        domain,
        resource,
        sideload_key,
    }
}

/// One row per kind. A new kind needs a variant and a row here.
static KINDS: [KindInfo; 8] = [
    row(EntityKind::MeterGroup, "meter_group", "load", "meter_group", "meter_groups"),
    row(EntityKind::Meter, "meter", "load", "meter", "meters"),
    row(EntityKind::Scenario, "scenario", "cost", "scenario", "scenarios"),
    row(EntityKind::RatePlan, "rate_plan", "cost", "rate_plan", "rate_plans"),
    row(
        EntityKind::DerConfiguration,
        "der_configuration",
        "der",
        "configuration",
        "der_configurations",
    ),
    row(EntityKind::DerStrategy, "der_strategy", "der", "strategy", "der_strategies"),
    row(EntityKind::GhgRate, "ghg_rate", "cost", "ghg_rate", "ghg_rates"),
    row(EntityKind::CaisoRate, "caiso_rate", "cost", "caiso_rate", "caiso_rates"),
];

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::MeterGroup,
        EntityKind::Meter,
        EntityKind::Scenario,
        EntityKind::RatePlan,
        EntityKind::DerConfiguration,
        EntityKind::DerStrategy,
        EntityKind::GhgRate,
        EntityKind::CaisoRate,
    ];

    pub fn info(self) -> &'static KindInfo {
        // KINDS is declared in the same order as the enum
        &KINDS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn sideload_key(self) -> &'static str {
        self.info().sideload_key
    }

    /// Kind whose side-load collection is stored under `key`.
    pub fn from_sideload_key(key: &str) -> Option<Self> {
        KINDS.iter().find(|s| s.sideload_key == key).map(|s| s.kind)
    }

    /// `/{domain}/{resource}/`
    pub fn list_route(self) -> String {
        let info = self.info();
        format!("/{}/{}/", info.domain, info.resource)
    }

    /// `/{domain}/{resource}/{id}/`
    pub fn detail_route(self, id: &dc_core::EntityId) -> String {
        format!("{}{}/", self.list_route(), urlencoding::encode(&id.to_string()))
    }
}

impl FromStr for EntityKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace('-', "_");
        KINDS
            .iter()
            .find(|info| info.name == needle || info.sideload_key == needle)
            .map(|info| info.kind)
            .ok_or_else(|| StoreError::UnknownKind {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
