//! Session driver
//!
//! Owns the world, the settings and the save store. Converts frame time into
//! fixed ticks with an accumulator and does everything that must happen
//! strictly between ticks: saving, loading, shop purchases, pausing.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::economy::{Auxiliary, AuxiliaryOutcome, UpgradeKind};
use crate::persistence::{SaveData, SaveSlot, SaveStore};
use crate::platform::input::ActionState;
use crate::settings::Settings;
use crate::sim::{RunPhase, ShipClass, World, tick};

pub struct Session {
    world: World,
    settings: Settings,
    /// `None` runs without touching the disk
    store: Option<SaveStore>,
    slot: SaveSlot,
    class: ShipClass,
    accumulator: f32,
}

impl Session {
    /// In-memory session with a fresh ledger
    pub fn new(seed: u64, class: ShipClass) -> Self {
        Self {
            world: World::new(seed, class, Default::default()),
            settings: Settings::default(),
            store: None,
            slot: SaveSlot::Manual(1),
            class,
            accumulator: 0.0,
        }
    }

    /// Session backed by `store`, starting from whatever `slot` holds
    pub fn with_store(store: SaveStore, slot: SaveSlot, seed: u64, class: ShipClass) -> Self {
        let mut session = Self::new(seed, class);
        session.store = Some(store);
        session.load(slot);
        session
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn slot(&self) -> SaveSlot {
        self.slot
    }

    /// Feed one frame. Runs up to [`MAX_SUBSTEPS`] ticks and returns how many ran.
    pub fn update(&mut self, frame_dt: f32, input: &ActionState) -> u32 {
        if matches!(self.world.phase, RunPhase::Paused | RunPhase::GameOver) {
            self.accumulator = 0.0;
            return 0;
        }

        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.world, input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            if self.world.autosave_due {
                self.autosave();
            }
        }
        substeps
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.world.set_paused(paused);
    }

    /// Everything the save envelope carries, as of now
    pub fn save_data(&self) -> SaveData {
        SaveData::capture(
            &self.world.ledger,
            &self.settings,
            self.world.achievements.unlocked_ids(),
        )
    }

    /// Write the autosave slot. Failures are logged, never propagated.
    pub fn autosave(&mut self) -> bool {
        self.world.autosave_due = false;
        self.write(SaveSlot::Auto)
    }

    /// Save to the current manual slot
    pub fn save(&mut self) -> bool {
        self.write(self.slot)
    }

    /// Save to manual `slot` and make it the current one. The autosave slot
    /// is reserved for the system and is refused.
    pub fn save_to(&mut self, slot: SaveSlot) -> bool {
        if slot == SaveSlot::Auto {
            log::warn!("Refusing manual save to {}", slot.file_name());
            return false;
        }
        self.slot = slot;
        self.write(slot)
    }

    fn write(&self, slot: SaveSlot) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        match store.save(slot, &self.save_data()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Saving {} failed: {}", slot.file_name(), e);
                false
            }
        }
    }

    /// Replace ledger, achievements and settings with the contents of `slot`
    /// and start a new run on top of them
    pub fn load(&mut self, slot: SaveSlot) {
        let data = match self.store.as_ref() {
            Some(store) => store.load(slot),
            None => SaveData::default(),
        };
        if slot != SaveSlot::Auto {
            self.slot = slot;
        }
        self.apply(data);
    }

    /// Wipe progress and start over in `slot`. Returns whether the wiped
    /// state reached the disk.
    pub fn new_game(&mut self, slot: SaveSlot) -> bool {
        if slot != SaveSlot::Auto {
            self.slot = slot;
        }
        self.apply(SaveData {
            volume: self.settings.master_volume,
            keys: self.settings.raw_bindings(),
            ..SaveData::default()
        });
        let saved = self.save();
        if !saved && self.store.is_some() {
            log::warn!("New game in {} was not saved; old progress remains on disk", self.slot.file_name());
        }
        saved
    }

    fn apply(&mut self, data: SaveData) {
        self.settings = data.settings();
        let mut world = World::new(self.world.seed, self.class, data.ledger());
        world.achievements.restore(&data.achievements);
        self.world = world;
        self.accumulator = 0.0;
    }

    /// New run with the same ledger
    pub fn restart(&mut self, class: ShipClass) {
        self.class = class;
        self.world.restart_run(class);
        self.accumulator = 0.0;
    }

    /// Buy an upgrade and save right away
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> bool {
        let bought = self.world.purchase_upgrade(kind);
        if bought {
            self.save();
        }
        bought
    }

    /// Buy or toggle an auxiliary; any change is saved right away
    pub fn purchase_or_toggle(&mut self, aux: Auxiliary) -> AuxiliaryOutcome {
        let outcome = self.world.purchase_or_toggle_aux(aux);
        if outcome != AuxiliaryOutcome::InsufficientFunds {
            self.save();
        }
        outcome
    }
}
