//! Service categories offered by mechanics and requested by customers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of on-site work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    CarMechanic,
    BikeMechanic,
    TruckMechanic,
    AutoElectrician,
    TyreService,
    Towing,
}

impl ServiceCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::CarMechanic,
        Self::BikeMechanic,
        Self::TruckMechanic,
        Self::AutoElectrician,
        Self::TyreService,
        Self::Towing,
    ];

    /// Stable wire and storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CarMechanic => "car_mechanic",
            Self::BikeMechanic => "bike_mechanic",
            Self::TruckMechanic => "truck_mechanic",
            Self::AutoElectrician => "auto_electrician",
            Self::TyreService => "tyre_service",
            Self::Towing => "towing",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name a known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for ServiceCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}
