use std::fmt;
use std::str::FromStr;

use log::*;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Atm,
    Bank,
    Partner,
}

impl LocationType {
    pub fn all() -> [LocationType; 3] {
        [LocationType::Atm, LocationType::Bank, LocationType::Partner]
    }

    pub fn to_alpha(&self) -> &'static str {
        match self {
            LocationType::Atm => "atm",
            LocationType::Bank => "bank",
            LocationType::Partner => "partner",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_alpha())
    }
}

impl FromStr for LocationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocationType::all()
            .into_iter()
            .find(|kind| kind.to_alpha().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownLocationType(s.to_owned()))
    }
}

/// Place where cash can be withdrawn
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: u32,
    pub name: String,
    pub address: String,
    /// Kilometers from the user
    pub distance: f64,
    #[serde(rename = "type")]
    pub kind: LocationType,
    pub services: Vec<String>,
    pub rating: f64,
    pub is_favorite: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocationFilter {
    /// Case insensitive part of the name or the address
    pub search: String,
    pub kind: Option<LocationType>,
}

impl LocationFilter {
    pub fn matches(&self, location: &Location) -> bool {
        let search = self.search.to_lowercase();
        (location.name.to_lowercase().contains(&search)
            || location.address.to_lowercase().contains(&search))
            && self.kind.map_or(true, |kind| kind == location.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDirectory {
    locations: Vec<Location>,
}

impl LocationDirectory {
    pub fn new(locations: Vec<Location>) -> Self {
        LocationDirectory { locations }
    }

    pub fn demo() -> Self {
        use LocationType::*;
        #[rustfmt::skip]
        let rows = [
            ("CityBank ATM", "123 Main Street, New York, NY 10001", 0.3, Atm, &["Cash Withdrawal", "24/7 Access", "Deposit"][..], 4.5, true),
            ("Global Bank Branch", "456 Park Avenue, New York, NY 10022", 0.7, Bank, &["Cash Withdrawal", "Currency Exchange", "Loans", "Customer Service"][..], 4.2, false),
            ("QuickCash Partner", "789 Broadway, New York, NY 10003", 1.2, Partner, &["Cash Withdrawal", "Mobile Top-Up"][..], 3.8, false),
            ("Metro ATM", "321 5th Avenue, New York, NY 10016", 1.5, Atm, &["Cash Withdrawal", "24/7 Access"][..], 4.0, true),
            ("EuroBank Branch", "654 Madison Avenue, New York, NY 10065", 2.1, Bank, &["Cash Withdrawal", "Currency Exchange", "Loans", "Safe Deposit Box"][..], 4.7, false),
        ];
        let locations = rows
            .into_iter()
            .zip(1..)
            .map(
                |((name, address, distance, kind, services, rating, is_favorite), id)| Location {
                    id,
                    name: name.to_owned(),
                    address: address.to_owned(),
                    distance,
                    kind,
                    services: services.iter().map(|s| s.to_string()).collect(),
                    rating,
                    is_favorite,
                },
            )
            .collect();
        LocationDirectory::new(locations)
    }

    /// Matching locations in directory order
    pub fn search(&self, filter: &LocationFilter) -> Vec<&Location> {
        let found: Vec<&Location> = self
            .locations
            .iter()
            .filter(|location| filter.matches(location))
            .collect();
        debug!("{} of {} locations match {filter:?}", found.len(), self.locations.len());
        found
    }

    pub fn favorites(&self) -> Vec<&Location> {
        self.locations.iter().filter(|l| l.is_favorite).collect()
    }

    /// Flip the favourite mark of a location, returns the new mark
    pub fn toggle_favorite(&mut self, id: u32) -> Result<bool, Error> {
        let location = self
            .locations
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(Error::UnknownLocation(id))?;
        location.is_favorite = !location.is_favorite;
        info!("Location {} favourite: {}", location.name, location.is_favorite);
        Ok(location.is_favorite)
    }
}
