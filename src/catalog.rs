//! Vehicle and environment tables
//!
//! The menu hands us plain string identifiers; anything we don't recognize
//! falls back to a default instead of failing the run.

use serde::{Deserialize, Serialize};

/// Convert a 0xRRGGBB literal to a linear RGBA color
pub const fn rgb(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Selectable cars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Vehicle {
    #[default]
    Porsche,
    Bmw,
    GWagon,
    Supra,
    Bolero,
    MahindraMarshal,
    /// Unrecognized identifier
    Unknown,
}

impl Vehicle {
    pub const ALL: [Vehicle; 6] = [
        Vehicle::Porsche,
        Vehicle::Bmw,
        Vehicle::GWagon,
        Vehicle::Supra,
        Vehicle::Bolero,
        Vehicle::MahindraMarshal,
    ];

    pub fn from_id(id: &str) -> Self {
        match id {
            "Porsche" => Vehicle::Porsche,
            "BMW" => Vehicle::Bmw,
            "G-Wagon" => Vehicle::GWagon,
            "Supra" => Vehicle::Supra,
            "Bolero" => Vehicle::Bolero,
            "Mahindra Marshal" => Vehicle::MahindraMarshal,
            _ => Vehicle::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vehicle::Porsche => "Porsche",
            Vehicle::Bmw => "BMW",
            Vehicle::GWagon => "G-Wagon",
            Vehicle::Supra => "Supra",
            Vehicle::Bolero => "Bolero",
            Vehicle::MahindraMarshal => "Mahindra Marshal",
            Vehicle::Unknown => "Unknown",
        }
    }

    /// Body color for the player car
    pub fn color(&self) -> [f32; 4] {
        match self {
            Vehicle::Porsche => rgb(0xd32f2f),
            Vehicle::Bmw => rgb(0x1976d2),
            Vehicle::GWagon => rgb(0x9e9e9e),
            Vehicle::Supra => rgb(0xff9800),
            Vehicle::Bolero => rgb(0x2e7d32),
            Vehicle::MahindraMarshal => rgb(0x7b1fa2),
            Vehicle::Unknown => rgb(0xe53935),
        }
    }
}

/// Road/divider/background/traffic colors for one environment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvPalette {
    pub road: [f32; 4],
    pub divider: [f32; 4],
    /// Background gradient (top, bottom)
    pub background: [[f32; 4]; 2],
    pub obstacles: [[f32; 4]; 3],
}

/// Selectable driving environments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Environment {
    #[default]
    City,
    Village,
    Highway,
    Market,
}

impl Environment {
    pub const ALL: [Environment; 4] = [
        Environment::City,
        Environment::Village,
        Environment::Highway,
        Environment::Market,
    ];

    /// Unknown identifiers drive through the city
    pub fn from_id(id: &str) -> Self {
        match id {
            "Village" => Environment::Village,
            "Highway" => Environment::Highway,
            "Market" => Environment::Market,
            _ => Environment::City,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::City => "City",
            Environment::Village => "Village",
            Environment::Highway => "Highway",
            Environment::Market => "Market",
        }
    }

    /// Only village roads have cows wandering onto them
    pub fn has_cows(&self) -> bool {
        matches!(self, Environment::Village)
    }

    pub fn palette(&self) -> EnvPalette {
        match self {
            Environment::City => EnvPalette {
                road: rgb(0x2b2e34),
                divider: rgb(0xffffff),
                background: [rgb(0x0a0a0a), rgb(0x141414)],
                obstacles: [rgb(0x90caf9), rgb(0xef9a9a), rgb(0xa5d6a7)],
            },
            Environment::Village => EnvPalette {
                road: rgb(0x3a2e20),
                divider: rgb(0xf4e5b2),
                background: [rgb(0x0a0f09), rgb(0x141b10)],
                obstacles: [rgb(0x8d6e63), rgb(0xa1887f), rgb(0x795548)],
            },
            Environment::Highway => EnvPalette {
                road: rgb(0x20232a),
                divider: rgb(0xd9d9d9),
                background: [rgb(0x050505), rgb(0x0f0f10)],
                obstacles: [rgb(0xcfd8dc), rgb(0x90a4ae), rgb(0x78909c)],
            },
            Environment::Market => EnvPalette {
                road: rgb(0x2d2330),
                divider: rgb(0xffd54f),
                background: [rgb(0x0a0710), rgb(0x140e1e)],
                obstacles: [rgb(0xf48fb1), rgb(0xba68c8), rgb(0xce93d8)],
            },
        }
    }
}
