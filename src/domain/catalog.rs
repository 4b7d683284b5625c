//! Static department and ward tables mirroring the portal backend's seed data.

use crate::domain::complaint::Priority;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: &'static str,
    pub sla_hours: i64,
    pub priority: Priority,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ward {
    pub id: i64,
    pub number: i64,
    pub area_name: &'static str,
    pub zone: &'static str,
}

pub static DEPARTMENTS: [Department; 8] = [
    Department {
        id: 1,
        name: "Water Supply",
        sla_hours: 24,
        priority: Priority::High,
        description: "No water, leakage, low pressure",
    },
    Department {
        id: 2,
        name: "Sanitation",
        sla_hours: 36,
        priority: Priority::Medium,
        description: "Public toilets, cleanliness",
    },
    Department {
        id: 3,
        name: "Roads",
        sla_hours: 72,
        priority: Priority::Low,
        description: "Potholes, damaged roads",
    },
    Department {
        id: 4,
        name: "Electricity",
        sla_hours: 24,
        priority: Priority::High,
        description: "Street lights, power issues",
    },
    Department {
        id: 5,
        name: "Waste Management",
        sla_hours: 12,
        priority: Priority::Critical,
        description: "Garbage collection",
    },
    Department {
        id: 6,
        name: "Public Safety",
        sla_hours: 6,
        priority: Priority::Critical,
        description: "Open manholes, hazards",
    },
    Department {
        id: 7,
        name: "Health",
        sla_hours: 48,
        priority: Priority::Medium,
        description: "Mosquitoes, hygiene",
    },
    Department {
        id: 8,
        name: "Education",
        sla_hours: 96,
        priority: Priority::Low,
        description: "School infrastructure",
    },
];

pub static WARDS: [Ward; 5] = [
    Ward {
        id: 1,
        number: 1,
        area_name: "Shivaji Nagar",
        zone: "Central",
    },
    Ward {
        id: 2,
        number: 2,
        area_name: "Kothrud",
        zone: "West",
    },
    Ward {
        id: 3,
        number: 3,
        area_name: "Hadapsar",
        zone: "East",
    },
    Ward {
        id: 4,
        number: 4,
        area_name: "Baner",
        zone: "North",
    },
    Ward {
        id: 5,
        number: 5,
        area_name: "Kasba Peth",
        zone: "Central",
    },
];

pub fn find_department(id: i64) -> Option<&'static Department> {
    DEPARTMENTS.iter().find(|d| d.id == id)
}

pub fn find_ward(id: i64) -> Option<&'static Ward> {
    WARDS.iter().find(|w| w.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_sla_hours_range() {
        let min = DEPARTMENTS.iter().map(|d| d.sla_hours).min();
        let max = DEPARTMENTS.iter().map(|d| d.sla_hours).max();
        assert_eq!(min, Some(6));
        assert_eq!(max, Some(96));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(find_department(6).map(|d| d.name), Some("Public Safety"));
        assert_eq!(find_ward(2).map(|w| w.area_name), Some("Kothrud"));
        assert_eq!(find_ward(4).map(|w| w.zone), Some("North"));
        assert!(find_department(99).is_none());
        assert!(find_ward(0).is_none());
    }
}
