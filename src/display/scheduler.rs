/*
 *  display/scheduler.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Screen scheduler - rotates the plugin screens and interleaves the
 *	info screen, driven by one tick per wall-clock second
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use super::{PluginKind, ScreenMode};
use log::{debug, info};
use thiserror::Error;

/// Timing thresholds for the scheduler, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// How long the info screen stays up before returning to the default plugin
    pub info_pause: u32,

    /// How long the plugin screens rotate before the info screen is shown
    pub info_delay: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            info_pause: 300,
            info_delay: 900,
        }
    }
}

/// An enabled plugin and its pause weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginSlot {
    pub kind: PluginKind,
    pub pause: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("at least one plugin must be enabled")]
    NoEnabledPlugins,
    #[error("plugin '{0}' is listed more than once")]
    Duplicate(PluginKind),
}

/// Ordered list of enabled plugins. Rotation follows this order and wraps.
///
/// Never empty, the first slot is the default screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    slots: Vec<PluginSlot>,
}

impl RotationPlan {
    pub fn new(slots: impl IntoIterator<Item = PluginSlot>) -> Result<Self, PlanError> {
        let mut plan: Vec<PluginSlot> = Vec::new();
        for slot in slots {
            if plan.iter().any(|s| s.kind == slot.kind) {
                return Err(PlanError::Duplicate(slot.kind));
            }
            plan.push(slot);
        }
        if plan.is_empty() {
            return Err(PlanError::NoEnabledPlugins);
        }
        Ok(Self { slots: plan })
    }

    pub fn slots(&self) -> &[PluginSlot] {
        &self.slots
    }

    pub fn default_plugin(&self) -> PluginKind {
        self.slots[0].kind
    }

    fn position(&self, kind: PluginKind) -> Option<usize> {
        self.slots.iter().position(|s| s.kind == kind)
    }
}

/// Screen rotation state machine
///
/// States are the enabled plugin screens plus the info screen. While a plugin
/// is showing, `rotation_elapsed` counts up until `info_delay` is exceeded and
/// the info screen takes over; while info is showing, `info_pause_elapsed`
/// counts up until `info_pause` is exceeded and the default plugin returns.
/// Between plugins the switch period is the sum of `view count * pause` over
/// all plugins, measured from the last transition.
#[derive(Debug, Clone)]
pub struct ScreenScheduler {
    config: SchedulerConfig,
    plan: RotationPlan,
    current_mode: ScreenMode,
    counters: Vec<u32>, // parallel to plan.slots
    seconds_in_phase: u32,
    info_pause_elapsed: u32,
    rotation_elapsed: u32,
}

impl ScreenScheduler {
    /// Start on the default plugin with its view count at 1
    pub fn new(config: SchedulerConfig, plan: RotationPlan) -> Self {
        let mut counters = vec![0; plan.slots.len()];
        counters[0] = 1;
        let current_mode = ScreenMode::Plugin(plan.default_plugin());
        info!("Screen scheduler starting on {} ({} plugin(s) in rotation)",
            current_mode, plan.slots.len());
        Self {
            config,
            plan,
            current_mode,
            counters,
            seconds_in_phase: 0,
            info_pause_elapsed: 0,
            rotation_elapsed: 0,
        }
    }

    /// Get current screen mode
    pub fn current_mode(&self) -> ScreenMode {
        self.current_mode
    }

    pub fn default_mode(&self) -> ScreenMode {
        ScreenMode::Plugin(self.plan.default_plugin())
    }

    pub fn plan(&self) -> &RotationPlan {
        &self.plan
    }

    /// View count for a plugin, 0 for plugins outside the rotation
    pub fn counter(&self, kind: PluginKind) -> u32 {
        self.plan.position(kind).map_or(0, |i| self.counters[i])
    }

    pub fn info_pause_elapsed(&self) -> u32 {
        self.info_pause_elapsed
    }

    pub fn rotation_elapsed(&self) -> u32 {
        self.rotation_elapsed
    }

    pub fn seconds_in_phase(&self) -> u32 {
        self.seconds_in_phase
    }

    /// Sum of view count * pause over the rotation
    pub fn switch_period(&self) -> u64 {
        self.plan.slots.iter()
            .zip(&self.counters)
            .map(|(slot, &count)| u64::from(count) * u64::from(slot.pause))
            .sum()
    }

    /// Explicit user request for a screen.
    /// Returns false (and changes nothing) when the target is not in the rotation.
    pub fn on_manual_switch(&mut self, target: ScreenMode) -> bool {
        let target_index = match target {
            ScreenMode::Info => None,
            ScreenMode::Plugin(kind) => match self.plan.position(kind) {
                Some(i) => Some(i),
                None => {
                    debug!("Ignoring switch to {}: not enabled", kind);
                    return false;
                }
            },
        };

        self.counters.iter_mut().for_each(|c| *c = 0);
        if let Some(i) = target_index {
            self.counters[i] = 1;
        }
        self.info_pause_elapsed = 0;
        self.rotation_elapsed = 0;

        info!("Manual switch: {} -> {}", self.current_mode, target);
        self.enter(target);
        true
    }

    /// Advance one second. Returns true if the screen mode changed.
    pub fn on_tick(&mut self) -> bool {
        match self.current_mode {
            ScreenMode::Info => self.tick_info(),
            ScreenMode::Plugin(kind) => self.tick_plugin(kind),
        }
    }

    fn tick_info(&mut self) -> bool {
        self.rotation_elapsed = 0;
        self.counters.iter_mut().for_each(|c| *c = 0);
        self.info_pause_elapsed += 1;
        self.seconds_in_phase += 1;

        if self.info_pause_elapsed > self.config.info_pause {
            let target = self.default_mode();
            info!("Switching from INFO screen to {} screen at {} seconds",
                target.to_string().to_uppercase(), self.info_pause_elapsed);
            self.counters[0] = 1;
            self.info_pause_elapsed = 0;
            self.enter(target);
            return true;
        }
        false
    }

    fn tick_plugin(&mut self, kind: PluginKind) -> bool {
        self.info_pause_elapsed = 0;
        self.rotation_elapsed += 1;
        self.seconds_in_phase += 1;

        if self.rotation_elapsed > self.config.info_delay {
            info!("Switching to INFO screen at {} seconds", self.rotation_elapsed);
            self.rotation_elapsed = 0;
            self.enter(ScreenMode::Info);
            return true;
        }

        let period = self.switch_period();
        if period == 0 || u64::from(self.seconds_in_phase) % period != 0 {
            return false;
        }

        let current = self.plan.position(kind).unwrap_or(0);
        let next = (current + 1) % self.plan.slots.len();
        let target = self.plan.slots[next].kind;
        self.counters[next] += 1;
        debug!("Rotation period {}s reached, {} view count now {}", period, target, self.counters[next]);

        if next == current {
            // single plugin: restart its phase, nothing to switch to
            self.seconds_in_phase = 0;
            return false;
        }

        info!("Switching from {} screen to {} screen at {} seconds",
            kind.name().to_uppercase(), target.name().to_uppercase(), self.rotation_elapsed);
        self.enter(ScreenMode::Plugin(target));
        true
    }

    fn enter(&mut self, mode: ScreenMode) {
        self.current_mode = mode;
        self.seconds_in_phase = 0;
    }
}
