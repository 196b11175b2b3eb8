//! The fixed two-subject curriculum the tracker is seeded from.

use crate::models::{ResourceKind, Subject};

pub const PHYSICAL_CHEMISTRY_CHAPTERS: &[(&str, i64)] = &[
    ("First Law of Thermodynamics", 1),
    ("Second Law of Thermodynamics", 2),
    ("Multicomponent System Thermodynamics", 3),
    ("Chemical Equilibrium", 4),
    ("Phase Equilibrium", 5),
    ("Chemical Kinetics", 6),
    ("Electrochemistry", 7),
    ("Interfacial Phenomena", 8),
    ("Colloid Chemistry", 9),
];

pub const ELECTRICAL_ENGINEERING_CHAPTERS: &[(&str, i64)] = &[
    ("Circuit Concepts and Basic Laws", 1),
    ("Circuit Analysis Methods", 2),
    ("Sinusoidal AC Circuits", 3),
    ("Three-Phase AC Circuits", 4),
    ("Transient Circuit Analysis", 5),
    ("Magnetic Circuits and Iron-Core Coils", 6),
    ("Asynchronous Motors", 7),
    ("Relay-Contactor Control Systems", 8),
    ("Semiconductor Devices", 9),
    ("Transistors and Basic Amplifiers", 10),
    ("Integrated Op-Amp Circuits", 11),
    ("Feedback in Electronic Circuits", 12),
    ("Regulated DC Power Supplies", 13),
];

pub const RESOURCE_KINDS: [ResourceKind; 2] = [ResourceKind::Slides, ResourceKind::Homework];

pub fn chapters(subject: Subject) -> &'static [(&'static str, i64)] {
    match subject {
        Subject::PhysicalChemistry => PHYSICAL_CHEMISTRY_CHAPTERS,
        Subject::ElectricalEngineering => ELECTRICAL_ENGINEERING_CHAPTERS,
    }
}
