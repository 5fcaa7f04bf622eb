//! Shared worlds for unit and scenario tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use simulation::game_mode::GameRules;
use simulation::level::Level;
use simulation::map::{Bounds, Line, Map, MapLibrary, Plane, Polyobj, Sector, Side, Surface};
use simulation::materials::{MaterialGroup, MaterialRegistry};
use simulation::mobj::{
    Mobj, MobjFlags, MobjFlags2, MobjFlags3, MobjInfo, MobjInfoTable, State, StateId, StateTable,
};
use simulation::specials::{
    AcsScript, Ceiling, CeilingState, Door, Glow, HexenLight, LightFlash, Phase, PolyEvent,
};
use simulation::thinker::{ThinkerId, ThinkerKind};
use simulation::{GameMode, GameSession, MapId, Players};

use crate::archive_session::{ArchiveSession, GameTables, ReadContext, WriteContext};
use crate::game_profile::GameProfile;

pub const FIXTURE_MAP: MapId = MapId { episode: 1, map: 1 };

pub fn materials() -> MaterialRegistry {
    let mut reg = MaterialRegistry::default();
    reg.register("FLOOR4_8", MaterialGroup::Flats);
    reg.register("CEIL3_5", MaterialGroup::Flats);
    reg.register("NUKAGE1", MaterialGroup::Flats);
    reg.register("STARTAN3", MaterialGroup::Textures);
    reg.register("BIGDOOR1", MaterialGroup::Textures);
    reg
}

/// Two sectors side by side, three sides, two lines and two polyobjects.
pub fn base_map(reg: &MaterialRegistry) -> Map {
    let flat = |name| reg.find(name, MaterialGroup::Flats);
    let tex = |name| reg.find(name, MaterialGroup::Textures);
    Map {
        sectors: vec![
            Sector::new(
                Plane::new(0.0, flat("FLOOR4_8")),
                Plane::new(128.0, flat("CEIL3_5")),
                Bounds::new([0.0, 0.0], [256.0, 256.0]),
            ),
            Sector::new(
                Plane::new(16.0, flat("NUKAGE1")),
                Plane::new(96.0, flat("CEIL3_5")),
                Bounds::new([256.0, 0.0], [512.0, 256.0]),
            ),
        ],
        sides: vec![
            Side::new(
                Surface::new(None),
                Surface::new(tex("STARTAN3")),
                Surface::new(None),
            ),
            Side::new(
                Surface::new(tex("BIGDOOR1")),
                Surface::new(None),
                Surface::new(tex("STARTAN3")),
            ),
            Side::new(
                Surface::new(tex("STARTAN3")),
                Surface::new(None),
                Surface::new(None),
            ),
        ],
        lines: vec![Line::new(Some(0), None), Line::new(Some(1), Some(2))],
        polyobjs: vec![Polyobj::new(1, [64.0, 64.0]), Polyobj::new(7, [300.0, 32.0])],
        script_count: 2,
    }
}

pub fn infos() -> MobjInfoTable {
    let info = |health, radius, height, damage, flags2| MobjInfo {
        spawn_health: health,
        spawn_state: StateId(1),
        radius,
        height,
        damage,
        flags: MobjFlags::SOLID | MobjFlags::SHOOTABLE,
        flags2,
        flags3: MobjFlags3::empty(),
        special2_is_mobj: false,
    };
    MobjInfoTable {
        infos: vec![
            // Player body.
            info(100, 16.0, 56.0, 0, MobjFlags2::FOOTCLIP),
            info(20, 20.0, 56.0, 0, MobjFlags2::empty()),
            info(60, 20.0, 56.0, 3, MobjFlags2::PASSMOBJ),
            // Projectile.
            MobjInfo {
                spawn_health: 1000,
                spawn_state: StateId(4),
                radius: 6.0,
                height: 8.0,
                damage: 5,
                flags: MobjFlags::MISSILE | MobjFlags::NOGRAVITY,
                flags2: MobjFlags2::empty(),
                flags3: MobjFlags3::NOSPLASH,
                special2_is_mobj: false,
            },
            // Lightning zap: special2 names the lightning column it trails.
            MobjInfo {
                spawn_health: 1000,
                spawn_state: StateId(4),
                radius: 15.0,
                height: 16.0,
                damage: 2,
                flags: MobjFlags::MISSILE | MobjFlags::NOGRAVITY,
                flags2: MobjFlags2::empty(),
                flags3: MobjFlags3::empty(),
                special2_is_mobj: true,
            },
        ],
    }
}

pub fn states() -> StateTable {
    StateTable {
        states: (0..8)
            .map(|i| State {
                sprite: i / 2,
                frame: i % 2,
                tics: 4,
                next: StateId(((i + 1) % 8) as u32),
            })
            .collect(),
    }
}

#[derive(Debug)]
pub struct Fixture {
    pub session: GameSession,
    pub profile: GameProfile,
    pub level: Level,
    pub players: Players,
    pub library: MapLibrary,
    pub materials: MaterialRegistry,
    pub infos: MobjInfoTable,
    pub states: StateTable,
}

impl Fixture {
    /// An empty level on the fixture map with player 0 connected.
    pub fn new(mode: GameMode) -> Self {
        let materials = materials();
        let map = base_map(&materials);
        let mut library = MapLibrary::default();
        library.insert(FIXTURE_MAP, map.clone());
        let profile = GameProfile::for_mode(mode);
        let mut players = Players::new(profile.layout);
        players.join(0, 1);
        Self {
            session: GameSession::new_game(
                mode,
                GameRules {
                    skill: 2,
                    ..Default::default()
                },
                FIXTURE_MAP,
                17,
            ),
            profile,
            level: Level::new(map),
            players,
            library,
            materials,
            infos: infos(),
            states: states(),
        }
    }

    pub fn tables(&self) -> GameTables<'_> {
        GameTables {
            materials: &self.materials,
            infos: &self.infos,
            states: &self.states,
        }
    }

    pub fn write_ctx<'a>(&'a self, session: &'a mut ArchiveSession) -> WriteContext<'a> {
        WriteContext::new(&self.level, self.tables(), session)
    }

    pub fn read_ctx<'a>(&'a mut self, session: &'a mut ArchiveSession) -> ReadContext<'a> {
        ReadContext {
            level: &mut self.level,
            players: &mut self.players,
            tables: GameTables {
                materials: &self.materials,
                infos: &self.infos,
                states: &self.states,
            },
            session,
        }
    }

    pub fn mobj(&self, type_id: i32, pos: [f32; 3]) -> Mobj {
        let info = &self.infos.infos[type_id as usize];
        Mobj::from_info(type_id, info, pos)
    }

    pub fn spawn(&mut self, type_id: i32, pos: [f32; 3]) -> ThinkerId {
        let mo = self.mobj(type_id, pos);
        self.level
            .spawn_mobj(mo)
            .unwrap_or_else(|| panic!("fixture mobj at {pos:?} is outside the map"))
    }

    /// Gives player `slot` a body at `pos`.
    pub fn spawn_player(&mut self, slot: usize, pos: [f32; 3]) -> ThinkerId {
        let mut mo = self.mobj(0, pos);
        mo.player = Some(slot);
        let id = self.level.spawn_mobj(mo).expect("player start inside map");
        let player = &mut self.players.slots[slot].player;
        player.mo = Some(id);
        player.state = simulation::player::PlayerState::Live;
        id
    }

    /// Fills the level with a seeded mix of mobjs, references and specials.
    pub fn populate(&mut self, seed: u64, monsters: usize) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let player = self.spawn_player(0, [32.0, 32.0, 0.0]);

        let mut ids = vec![player];
        for _ in 0..monsters {
            let type_id = rng.gen_range(1..=3);
            let pos = [
                rng.gen_range(1.0..511.0_f32).floor(),
                rng.gen_range(1.0..255.0_f32).floor(),
                0.0,
            ];
            let id = self.spawn(type_id, pos);
            let mo = self.level.thinkers.mobj_mut(id).expect("just spawned");
            mo.angle = rng.gen::<u32>() & 0xffff_0000;
            mo.health = rng.gen_range(1..200);
            mo.mom = [rng.gen_range(-8..8) as f32 * 0.5, 0.25, 0.0];
            mo.tics = rng.gen_range(-1..30);
            mo.state = StateId(rng.gen_range(0..8));
            mo.special2 = rng.gen_range(0..100);
            ids.push(id);
        }
        // Forward and backward references, including to the player.
        for i in 1..ids.len() {
            let target = ids[rng.gen_range(0..ids.len())];
            let tracer = ids[(i + 1) % ids.len()];
            let mo = self.level.thinkers.mobj_mut(ids[i]).expect("mobj");
            mo.target = Some(target);
            if i % 3 == 0 {
                mo.tracer = Some(tracer);
            }
            if i % 4 == 0 {
                mo.last_enemy = Some(ids[0]);
            }
        }

        self.level
            .add_special(ThinkerKind::Door(Door {
                kind: 1,
                sector: 0,
                top_height: 124.0,
                speed: 2.0,
                state: 1,
                top_wait: 150,
                top_countdown: 35,
            }))
            .expect("sector 0 free");
        let ceiling = self
            .level
            .add_special(ThinkerKind::Ceiling(Ceiling {
                kind: 2,
                sector: 1,
                bottom_height: 24.0,
                top_height: 96.0,
                speed: 1.0,
                crush: true,
                state: CeilingState::Down,
                old_state: CeilingState::Up,
                tag: 5,
            }))
            .expect("sector 1 free");
        self.level.thinkers.set_stasis(ceiling, true);
        self.level.thinkers.add(ThinkerKind::Glow(Glow {
            sector: 1,
            max_light: 1.0,
            min_light: rng.gen_range(0..200) as f32 / 255.0,
            direction: -1,
        }));
        self.level.thinkers.add(ThinkerKind::Flash(LightFlash {
            sector: 0,
            count: 3,
            max_light: 200.0 / 255.0,
            min_light: 40.0 / 255.0,
            max_time: 64,
            min_time: 7,
        }));

        self.level.map.sectors[0].sound_target = Some(player);
        self.level.map.sectors[1].sound_target = ids.last().copied();
        self.level.map.sectors[1].light_level = 160.0 / 255.0;
        self.level.map.sectors[0].floor.offset = [8.0, 0.5];
        self.level.map.lines[1].mapped[0] = true;
        self.level.map.sides[1].top.offset = [4.0, -2.0];
        self.level.brain.targets = ids.iter().skip(1).take(2).copied().collect();
        self.level.brain.target_on = 1;

        if self.profile.has_polyobjs {
            let mut script = AcsScript::new(1, 0, 96);
            script.activator = ids.get(1).copied();
            script.line = Some(1);
            script.stack[0] = 42;
            script.stack_ptr = 1;
            script.vars[3] = -7;
            self.level
                .thinkers
                .add(ThinkerKind::Script(Box::new(script)));
            self.level.thinkers.add(ThinkerKind::RotatePoly(PolyEvent {
                polyobj: 7,
                int_speed: 4,
                dist: 90,
                fangle: 0x1000_0000,
                speed: [0.0, 0.0],
            }));
            self.level.thinkers.add(ThinkerKind::Light(HexenLight {
                kind: 3,
                sector: 0,
                value1: 1.0,
                value2: 64.0 / 255.0,
                tics1: 8,
                tics2: 16,
                count: 2,
            }));
            self.level.thinkers.add(ThinkerKind::Phase(Phase {
                sector: 1,
                index: 5,
                base_value: 128.0 / 255.0,
            }));
            let zap = self.spawn(4, [100.0, 100.0, 0.0]);
            if let Some(mo) = self.level.thinkers.mobj_mut(zap) {
                mo.special2_mobj = ids.get(1).copied();
            }
            self.level.map.polyobjs[1].angle = 0x4000_0000;
            self.level.map.polyobjs[1].pos = [310.0, 40.5];
            self.level.acs.scripts[1].state = 2;
            self.level.acs.scripts[1].wait_value = 9;
            self.level.acs.map_vars[4] = 1234;
            self.level.acs.world_vars[63] = -1;
            self.level.local_quakes[0] = 20;
        }
    }
}
