use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifierEffect {
    PointBoost,
    Immunity,
    MoreFood,
    Speed,
}

/// Purchasable power-up as listed in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierSpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: u32,
    pub effect: ModifierEffect,
    /// Seconds of effect; `None` lasts until the session ends.
    pub duration_secs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveModifier {
    pub id: String,
    pub name: String,
    pub effect: ModifierEffect,
    pub time_left: Option<u32>,
}

/// Modifiers currently in force for one session. Membership means active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActiveModifiers {
    entries: Vec<ActiveModifier>,
}

impl ActiveModifiers {
    pub fn is_active(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn has_effect(&self, effect: ModifierEffect) -> bool {
        self.entries.iter().any(|entry| entry.effect == effect)
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&ActiveModifier> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveModifier> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds an instance of `spec`. Returns false when it is already running;
    /// instances never stack.
    pub fn activate(&mut self, spec: &ModifierSpec) -> bool {
        if self.is_active(&spec.id) {
            return false;
        }
        self.entries.push(ActiveModifier {
            id: spec.id.clone(),
            name: spec.name.clone(),
            effect: spec.effect,
            time_left: spec.duration_secs,
        });
        true
    }

    /// One second of countdown. Timed entries that reach zero are removed and
    /// returned; untimed entries are left alone.
    pub fn countdown(&mut self) -> Vec<ActiveModifier> {
        let mut expired = Vec::new();
        self.entries.retain_mut(|entry| {
            let Some(time_left) = entry.time_left.as_mut() else { return true };
            *time_left = time_left.saturating_sub(1);
            if *time_left == 0 {
                expired.push(entry.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, effect: ModifierEffect, duration_secs: Option<u32>) -> ModifierSpec {
        ModifierSpec {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            price: 10,
            effect,
            duration_secs,
        }
    }

    #[test]
    fn activation_does_not_stack() {
        let mut active = ActiveModifiers::default();
        let boost = spec("lemon", ModifierEffect::PointBoost, Some(10));
        assert!(active.activate(&boost));
        assert!(!active.activate(&boost));
        assert_eq!(active.len(), 1);
        assert_eq!(active.get("lemon").and_then(|entry| entry.time_left), Some(10));
    }

    #[test]
    fn timed_modifier_expires_after_its_duration() {
        let mut active = ActiveModifiers::default();
        active.activate(&spec("timeFreeze", ModifierEffect::Immunity, Some(3)));
        assert!(active.countdown().is_empty());
        assert!(active.countdown().is_empty());
        assert_eq!(active.get("timeFreeze").and_then(|entry| entry.time_left), Some(1));
        let expired = active.countdown();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, "timeFreeze");
        assert!(!active.has_effect(ModifierEffect::Immunity));
    }

    #[test]
    fn untimed_modifier_survives_countdown() {
        let mut active = ActiveModifiers::default();
        active.activate(&spec("multipleApples", ModifierEffect::MoreFood, None));
        for _ in 0..100 {
            assert!(active.countdown().is_empty());
        }
        assert!(active.has_effect(ModifierEffect::MoreFood));
        active.clear();
        assert!(active.is_empty());
    }
}
