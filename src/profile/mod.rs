pub mod catalog;

use catalog::{Catalog, Cosmetic, STARTER_COSMETIC};
use crate::game::modifiers::ModifierSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MAX_NAME_LENGTH: usize = 20;
pub const DEFAULT_NAME: &str = "Player";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("Unknown item {0}")]
    UnknownItem(String),
    #[error("You already own {0}")]
    AlreadyOwned(String),
    #[error("Not enough points: {name} costs {price}, you have {balance}")]
    InsufficientFunds {
        name: String,
        price: u32,
        balance: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub id: String,
    pub name: String,
    pub price: u32,
}

/// Logged-in player. Serialized as-is into the stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub points: u32,
    pub high_score: u32,
    pub total_score: u32,
    pub purchased_skins: Vec<String>,
    pub purchased_power_ups: Vec<String>,
    #[serde(default = "starter_cosmetic")]
    pub active_skin: String,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub points: Option<u32>,
    pub high_score: Option<u32>,
    pub total_score: Option<u32>,
    pub purchased_skins: Option<Vec<String>>,
    pub purchased_power_ups: Option<Vec<String>>,
    pub active_skin: Option<String>,
}

/// Catalog entries the profile does not own yet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Offers {
    pub modifiers: Vec<ModifierSpec>,
    pub cosmetics: Vec<Cosmetic>,
}

fn starter_cosmetic() -> String {
    STARTER_COSMETIC.to_string()
}

pub fn sanitize_name(name: &str) -> String {
    let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return DEFAULT_NAME.to_string();
    }
    cleaned.chars().take(MAX_NAME_LENGTH).collect()
}

impl Profile {
    pub fn starter(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: sanitize_name(name),
            points: 0,
            high_score: 0,
            total_score: 0,
            purchased_skins: vec![starter_cosmetic()],
            purchased_power_ups: Vec::new(),
            active_skin: starter_cosmetic(),
        }
    }

    pub fn owns_modifier(&self, id: &str) -> bool {
        self.purchased_power_ups.iter().any(|owned| owned == id)
    }

    pub fn owns_cosmetic(&self, id: &str) -> bool {
        self.purchased_skins.iter().any(|owned| owned == id)
    }

    /// Credits a finished round: best score, lifetime total and spendable points.
    pub fn fold_score(&mut self, score: u32) {
        self.high_score = self.high_score.max(score);
        self.total_score = self.total_score.saturating_add(score);
        self.points = self.points.saturating_add(score);
    }

    pub fn purchase_modifier<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        id: &str,
    ) -> Result<Purchase, PurchaseError> {
        let spec = catalog
            .modifier(id)
            .ok_or_else(|| PurchaseError::UnknownItem(id.to_string()))?;
        if self.owns_modifier(id) {
            return Err(PurchaseError::AlreadyOwned(spec.name.clone()));
        }
        self.charge(&spec.name, spec.price)?;
        self.purchased_power_ups.push(spec.id.clone());
        Ok(Purchase {
            id: spec.id.clone(),
            name: spec.name.clone(),
            price: spec.price,
        })
    }

    pub fn purchase_cosmetic<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        id: &str,
    ) -> Result<Purchase, PurchaseError> {
        let item = catalog
            .cosmetic(id)
            .ok_or_else(|| PurchaseError::UnknownItem(id.to_string()))?;
        if self.owns_cosmetic(id) {
            return Err(PurchaseError::AlreadyOwned(item.name.clone()));
        }
        self.charge(&item.name, item.price)?;
        self.purchased_skins.push(item.id.clone());
        Ok(Purchase {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
        })
    }

    fn charge(&mut self, name: &str, price: u32) -> Result<(), PurchaseError> {
        let balance = self.points;
        self.points = balance
            .checked_sub(price)
            .ok_or_else(|| PurchaseError::InsufficientFunds {
                name: name.to_string(),
                price,
                balance,
            })?;
        Ok(())
    }

    /// Equips an owned cosmetic. Returns false when the id is not owned.
    pub fn equip(&mut self, id: &str) -> bool {
        if !self.owns_cosmetic(id) {
            return false;
        }
        self.active_skin = id.to_string();
        true
    }

    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(username) = patch.username {
            self.username = sanitize_name(&username);
        }
        if let Some(points) = patch.points {
            self.points = points;
        }
        if let Some(high_score) = patch.high_score {
            self.high_score = high_score;
        }
        if let Some(total_score) = patch.total_score {
            self.total_score = total_score;
        }
        if let Some(skins) = patch.purchased_skins {
            self.purchased_skins = skins;
        }
        if let Some(power_ups) = patch.purchased_power_ups {
            self.purchased_power_ups = power_ups;
        }
        if let Some(active_skin) = patch.active_skin {
            self.active_skin = active_skin;
        }
    }

    pub fn offers<C: Catalog + ?Sized>(&self, catalog: &C) -> Offers {
        Offers {
            modifiers: catalog
                .modifiers()
                .iter()
                .filter(|spec| !self.owns_modifier(&spec.id))
                .cloned()
                .collect(),
            cosmetics: catalog
                .cosmetics()
                .iter()
                .filter(|item| !self.owns_cosmetic(&item.id))
                .cloned()
                .collect(),
        }
    }

    pub fn skin_class<C: Catalog + ?Sized>(&self, catalog: &C) -> &'static str {
        catalog.visual(&self.active_skin).css_class()
    }
}

#[cfg(test)]
mod tests {
    use super::catalog::MemoryCatalog;
    use super::*;

    fn rich(points: u32) -> Profile {
        let mut profile = Profile::starter("ana");
        profile.points = points;
        profile
    }

    #[test]
    fn starter_owns_only_the_classic_skin() {
        let profile = Profile::starter("  ana   banana ");
        assert_eq!(profile.username, "ana banana");
        assert_eq!(profile.points, 0);
        assert_eq!(profile.purchased_skins, vec!["default".to_string()]);
        assert!(profile.purchased_power_ups.is_empty());
        assert_eq!(profile.active_skin, "default");
    }

    #[test]
    fn names_are_collapsed_and_capped() {
        assert_eq!(sanitize_name("   "), "Player");
        assert_eq!(sanitize_name("a\tb\nc"), "a b c");
        assert_eq!(sanitize_name(&"x".repeat(40)).len(), MAX_NAME_LENGTH);
    }

    #[test]
    fn fold_score_tracks_best_and_totals() {
        let mut profile = rich(5);
        profile.fold_score(12);
        profile.fold_score(7);
        assert_eq!(profile.high_score, 12);
        assert_eq!(profile.total_score, 19);
        assert_eq!(profile.points, 24);
    }

    #[test]
    fn insufficient_funds_leaves_profile_unchanged() {
        let catalog = MemoryCatalog::seeded();
        let mut profile = rich(50);
        let before = profile.clone();
        let err = profile.purchase_modifier(&catalog, "lemon").unwrap_err();
        assert!(matches!(
            err,
            PurchaseError::InsufficientFunds {
                price: 100,
                balance: 50,
                ..
            }
        ));
        assert_eq!(profile, before);
    }

    #[test]
    fn purchase_debits_and_records_ownership() {
        let catalog = MemoryCatalog::seeded();
        let mut profile = rich(250);
        let purchase = profile.purchase_modifier(&catalog, "lemon").unwrap();
        assert_eq!(purchase.price, 100);
        assert_eq!(profile.points, 150);
        assert!(profile.owns_modifier("lemon"));
    }

    #[test]
    fn owned_items_are_never_charged_twice() {
        let catalog = MemoryCatalog::seeded();
        let mut profile = rich(1000);
        profile.purchase_cosmetic(&catalog, "shine").unwrap();
        let err = profile.purchase_cosmetic(&catalog, "shine").unwrap_err();
        assert_eq!(err, PurchaseError::AlreadyOwned("Shining Snake".to_string()));
        assert_eq!(profile.points, 700);
        assert_eq!(
            profile
                .purchased_skins
                .iter()
                .filter(|id| id.as_str() == "shine")
                .count(),
            1
        );
    }

    #[test]
    fn unknown_items_are_rejected() {
        let catalog = MemoryCatalog::seeded();
        let mut profile = rich(1000);
        assert_eq!(
            profile.purchase_cosmetic(&catalog, "plaid"),
            Err(PurchaseError::UnknownItem("plaid".to_string()))
        );
        assert_eq!(profile.points, 1000);
    }

    #[test]
    fn equip_requires_ownership() {
        let mut profile = rich(0);
        assert!(!profile.equip("rgb"));
        assert_eq!(profile.active_skin, "default");
        profile.purchased_skins.push("rgb".to_string());
        assert!(profile.equip("rgb"));
        assert_eq!(profile.active_skin, "rgb");
    }

    #[test]
    fn patch_touches_only_given_fields() {
        let mut profile = rich(40);
        let before = profile.clone();
        let patch: ProfilePatch =
            serde_json::from_str(r#"{"points": 90, "activeSkin": "shine"}"#).unwrap();
        profile.apply(patch);
        assert_eq!(profile.points, 90);
        assert_eq!(profile.active_skin, "shine");
        assert_eq!(profile.username, before.username);
        assert_eq!(profile.high_score, before.high_score);
        assert_eq!(profile.purchased_skins, before.purchased_skins);
        assert_eq!(profile.id, before.id);
    }

    #[test]
    fn offers_exclude_owned_items() {
        let catalog = MemoryCatalog::seeded();
        let mut profile = rich(0);
        profile.purchased_power_ups.push("speedBoost".to_string());
        let offers = profile.offers(&catalog);
        assert_eq!(offers.modifiers.len(), 3);
        assert!(offers.modifiers.iter().all(|spec| spec.id != "speedBoost"));
        let skins: Vec<_> = offers.cosmetics.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(skins, ["shine", "rgb"]);
    }

    #[test]
    fn snapshot_uses_flat_camel_case_keys() {
        let profile = rich(3);
        let value = serde_json::to_value(&profile).unwrap();
        for key in [
            "id",
            "username",
            "points",
            "highScore",
            "totalScore",
            "purchasedSkins",
            "purchasedPowerUps",
            "activeSkin",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        let restored: Profile = serde_json::from_value(value).unwrap();
        assert_eq!(restored, profile);
    }

    #[test]
    fn snapshot_without_active_skin_defaults_to_classic() {
        let json = r#"{"id":"6f1c1c5e-8d1a-4a57-9d0f-5b8a2f6b6c11","username":"old","points":1,
            "highScore":2,"totalScore":3,"purchasedSkins":["default"],"purchasedPowerUps":[]}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.active_skin, "default");
    }
}
