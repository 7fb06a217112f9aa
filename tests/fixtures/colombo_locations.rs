//! Colombo-area locations for realistic test fixtures.
//!
//! Coordinates are approximate positions of public landmarks, longitude first.

use pickup_planner::model::Location;

/// A named location with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Place {
    pub name: &'static str,
    pub lng: f64,
    pub lat: f64,
}

impl Place {
    pub const fn new(name: &'static str, lng: f64, lat: f64) -> Self {
        Self { name, lng, lat }
    }

    pub const fn location(&self) -> Location {
        Location::new(self.lng, self.lat)
    }
}

pub const DEPOT: Place = Place::new("Colombo Fort", 79.8428, 6.9344);

// ============================================================================
// Central Colombo
// ============================================================================

pub const CENTRAL: &[Place] = &[
    Place::new("Pettah Market", 79.8522, 6.9366),
    Place::new("Galle Face Green", 79.8450, 6.9248),
    Place::new("Slave Island", 79.8530, 6.9253),
    Place::new("Kollupitiya", 79.8497, 6.9113),
    Place::new("Viharamahadevi Park", 79.8612, 6.9135),
    Place::new("Borella", 79.8780, 6.9147),
    Place::new("Maradana", 79.8650, 6.9290),
];

// ============================================================================
// Southern suburbs
// ============================================================================

pub const SOUTH: &[Place] = &[
    Place::new("Bambalapitiya", 79.8544, 6.8894),
    Place::new("Wellawatte", 79.8600, 6.8746),
    Place::new("Dehiwala Zoo", 79.8724, 6.8567),
    Place::new("Mount Lavinia", 79.8630, 6.8389),
    Place::new("Nugegoda", 79.8997, 6.8649),
];

// ============================================================================
// Northern and eastern suburbs
// ============================================================================

pub const NORTH_EAST: &[Place] = &[
    Place::new("Kotahena", 79.8610, 6.9480),
    Place::new("Grandpass", 79.8735, 6.9503),
    Place::new("Rajagiriya", 79.8960, 6.9090),
    Place::new("Battaramulla", 79.9180, 6.9010),
    Place::new("Kelaniya Temple", 79.9190, 6.9530),
];

pub fn all_places() -> Vec<Place> {
    CENTRAL
        .iter()
        .chain(SOUTH)
        .chain(NORTH_EAST)
        .copied()
        .collect()
}
