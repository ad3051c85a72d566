use super::constants::SCHEDULER_QUANTUM_MS;

/// Which sub-intervals fire on a given quantum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub movement: bool,
    pub bots: bool,
    pub modifiers: bool,
}

/// Multiplexes the movement, bot and modifier clocks onto one fixed quantum by
/// counting elapsed quanta. Each clock keeps its own counter so a change of
/// movement speed never shifts the other two.
#[derive(Debug, Clone)]
pub struct Scheduler {
    movement_every: u64,
    fast_movement_every: u64,
    bots_every: u64,
    modifiers_every: u64,
    since_movement: u64,
    since_bots: u64,
    since_modifiers: u64,
}

impl Scheduler {
    pub fn new(tick_ms: u64, speed_tick_ms: u64, bot_tick_ms: u64, modifier_tick_ms: u64) -> Self {
        Self {
            movement_every: quanta(tick_ms),
            fast_movement_every: quanta(speed_tick_ms),
            bots_every: quanta(bot_tick_ms),
            modifiers_every: quanta(modifier_tick_ms),
            since_movement: 0,
            since_bots: 0,
            since_modifiers: 0,
        }
    }

    pub fn quantum_ms() -> u64 {
        SCHEDULER_QUANTUM_MS
    }

    /// Advances one quantum.
    pub fn tick(&mut self, fast: bool) -> Due {
        let movement_every = if fast {
            self.fast_movement_every
        } else {
            self.movement_every
        };
        Due {
            movement: advance(&mut self.since_movement, movement_every),
            bots: advance(&mut self.since_bots, self.bots_every),
            modifiers: advance(&mut self.since_modifiers, self.modifiers_every),
        }
    }

    pub fn reset(&mut self) {
        self.since_movement = 0;
        self.since_bots = 0;
        self.since_modifiers = 0;
    }
}

fn quanta(period_ms: u64) -> u64 {
    (period_ms / SCHEDULER_QUANTUM_MS).max(1)
}

fn advance(counter: &mut u64, every: u64) -> bool {
    *counter += 1;
    if *counter >= every {
        *counter = 0;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_scheduler() -> Scheduler {
        Scheduler::new(150, 100, 300, 1000)
    }

    fn count(scheduler: &mut Scheduler, quanta: usize, fast: bool) -> (usize, usize, usize) {
        let mut totals = (0, 0, 0);
        for _ in 0..quanta {
            let due = scheduler.tick(fast);
            totals.0 += due.movement as usize;
            totals.1 += due.bots as usize;
            totals.2 += due.modifiers as usize;
        }
        totals
    }

    #[test]
    fn default_periods_over_three_seconds() {
        let mut scheduler = default_scheduler();
        let (movement, bots, modifiers) = count(&mut scheduler, 60, false);
        assert_eq!(movement, 20);
        assert_eq!(bots, 10);
        assert_eq!(modifiers, 3);
    }

    #[test]
    fn speed_shortens_only_movement() {
        let mut scheduler = default_scheduler();
        let (movement, bots, modifiers) = count(&mut scheduler, 60, true);
        assert_eq!(movement, 30);
        assert_eq!(bots, 10);
        assert_eq!(modifiers, 3);
    }

    #[test]
    fn first_movement_fires_after_one_full_period() {
        let mut scheduler = default_scheduler();
        assert!(!scheduler.tick(false).movement);
        assert!(!scheduler.tick(false).movement);
        assert!(scheduler.tick(false).movement);
    }

    #[test]
    fn periods_shorter_than_a_quantum_fire_every_quantum() {
        let mut scheduler = Scheduler::new(10, 10, 10, 10);
        let due = scheduler.tick(false);
        assert!(due.movement && due.bots && due.modifiers);
    }

    #[test]
    fn reset_restarts_every_clock() {
        let mut scheduler = default_scheduler();
        scheduler.tick(false);
        scheduler.tick(false);
        scheduler.reset();
        assert!(!scheduler.tick(false).movement);
    }
}
