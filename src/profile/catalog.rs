use crate::game::modifiers::{ModifierEffect, ModifierSpec};
use serde::Serialize;
use std::collections::HashMap;

pub const STARTER_COSMETIC: &str = "default";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkinVisual {
    #[default]
    Classic,
    Shine,
    Rgb,
}

impl SkinVisual {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Classic => "snake-cell",
            Self::Shine => "snake-cell bg-blue-400 animate-pulse",
            Self::Rgb => "snake-cell bg-purple-500 animate-rgb-shift",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cosmetic {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: u32,
    pub visual: SkinVisual,
}

/// Read-only shop inventory.
pub trait Catalog: Send + Sync {
    fn modifiers(&self) -> &[ModifierSpec];
    fn cosmetics(&self) -> &[Cosmetic];

    fn modifier(&self, id: &str) -> Option<&ModifierSpec> {
        self.modifiers().iter().find(|spec| spec.id == id)
    }

    fn cosmetic(&self, id: &str) -> Option<&Cosmetic> {
        self.cosmetics().iter().find(|item| item.id == id)
    }

    /// Visual for a cosmetic id; ids the shop does not know render as classic.
    fn visual(&self, id: &str) -> SkinVisual {
        self.cosmetic(id).map(|item| item.visual).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    modifiers: Vec<ModifierSpec>,
    cosmetics: Vec<Cosmetic>,
    modifier_index: HashMap<String, usize>,
    cosmetic_index: HashMap<String, usize>,
}

impl MemoryCatalog {
    pub fn new(modifiers: Vec<ModifierSpec>, cosmetics: Vec<Cosmetic>) -> Self {
        let modifier_index = index_by_id(modifiers.iter().map(|spec| spec.id.as_str()));
        let cosmetic_index = index_by_id(cosmetics.iter().map(|item| item.id.as_str()));
        Self {
            modifiers,
            cosmetics,
            modifier_index,
            cosmetic_index,
        }
    }

    /// The arcade's stock inventory.
    pub fn seeded() -> Self {
        let modifiers = vec![
            modifier(
                "lemon",
                "Lemon Boost",
                "Apples are worth 5 points for 10 seconds",
                100,
                ModifierEffect::PointBoost,
                Some(10),
            ),
            modifier(
                "timeFreeze",
                "Time Freeze",
                "Pass through yourself and opponents for 5 seconds",
                200,
                ModifierEffect::Immunity,
                Some(5),
            ),
            modifier(
                "multipleApples",
                "Apple Feast",
                "Increases apples on the board",
                150,
                ModifierEffect::MoreFood,
                None,
            ),
            modifier(
                "speedBoost",
                "Speed Boost",
                "Move faster for 15 seconds",
                120,
                ModifierEffect::Speed,
                Some(15),
            ),
        ];
        let cosmetics = vec![
            cosmetic(
                STARTER_COSMETIC,
                "Classic Snake",
                "The original snake skin",
                0,
                SkinVisual::Classic,
            ),
            cosmetic(
                "shine",
                "Shining Snake",
                "A shimmering snake skin",
                300,
                SkinVisual::Shine,
            ),
            cosmetic(
                "rgb",
                "RGB Snake",
                "The ultimate color-shifting snake",
                1000,
                SkinVisual::Rgb,
            ),
        ];
        Self::new(modifiers, cosmetics)
    }
}

impl Catalog for MemoryCatalog {
    fn modifiers(&self) -> &[ModifierSpec] {
        &self.modifiers
    }

    fn cosmetics(&self) -> &[Cosmetic] {
        &self.cosmetics
    }

    fn modifier(&self, id: &str) -> Option<&ModifierSpec> {
        self.modifier_index
            .get(id)
            .and_then(|index| self.modifiers.get(*index))
    }

    fn cosmetic(&self, id: &str) -> Option<&Cosmetic> {
        self.cosmetic_index
            .get(id)
            .and_then(|index| self.cosmetics.get(*index))
    }
}

fn index_by_id<'a>(ids: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    ids.enumerate()
        .map(|(index, id)| (id.to_string(), index))
        .collect()
}

fn modifier(
    id: &str,
    name: &str,
    description: &str,
    price: u32,
    effect: ModifierEffect,
    duration_secs: Option<u32>,
) -> ModifierSpec {
    ModifierSpec {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        effect,
        duration_secs,
    }
}

fn cosmetic(id: &str, name: &str, description: &str, price: u32, visual: SkinVisual) -> Cosmetic {
    Cosmetic {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        visual,
    }
}
