//! Save/load throughput for populated levels.
//!
//! Builds a grid map of 64x64 sectors filled with monsters that target each
//! other, with a door on every fourth sector, and measures the full save
//! (archive + LZ4 + checksum) and the full load back onto the base map.
//!
//! Run with: `cargo bench -p save --bench save_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use save::{load_game, save_game, GameProfile, GameTables, LoadRequest, SaveOptions, SaveRequest};
use simulation::game_mode::GameRules;
use simulation::map::{Bounds, Line, Map, MapLibrary, Plane, Sector, Side, Surface};
use simulation::materials::{MaterialGroup, MaterialRegistry};
use simulation::mobj::{
    Mobj, MobjFlags, MobjFlags2, MobjFlags3, MobjInfo, MobjInfoTable, State, StateId, StateTable,
};
use simulation::specials::Door;
use simulation::thinker::ThinkerKind;
use simulation::{GameMode, GameSession, Level, MapId, Players};

const SECTOR_SIZE: f32 = 64.0;
const GRID: usize = 32;
const MAP: MapId = MapId { episode: 0, map: 1 };

// ---------------------------------------------------------------------------
// Helpers: build a synthetic game at various scales
// ---------------------------------------------------------------------------

struct BenchGame {
    session: GameSession,
    players: Players,
    level: Level,
    library: MapLibrary,
    profile: GameProfile,
    materials: MaterialRegistry,
    infos: MobjInfoTable,
    states: StateTable,
}

impl BenchGame {
    fn tables(&self) -> GameTables<'_> {
        GameTables {
            materials: &self.materials,
            infos: &self.infos,
            states: &self.states,
        }
    }
}

fn grid_map(materials: &MaterialRegistry) -> Map {
    let floor = materials.find("FLOOR4_8", MaterialGroup::Flats);
    let ceiling = materials.find("CEIL3_5", MaterialGroup::Flats);
    let wall = materials.find("STARTAN3", MaterialGroup::Textures);

    let mut map = Map::default();
    for y in 0..GRID {
        for x in 0..GRID {
            let min = [x as f32 * SECTOR_SIZE, y as f32 * SECTOR_SIZE];
            let max = [min[0] + SECTOR_SIZE, min[1] + SECTOR_SIZE];
            map.sectors.push(Sector::new(
                Plane::new(0.0, floor),
                Plane::new(128.0, ceiling),
                Bounds::new(min, max),
            ));
            let side = map.sides.len();
            map.sides
                .push(Side::new(Surface::new(None), Surface::new(wall), Surface::new(None)));
            map.lines.push(Line::new(Some(side), None));
        }
    }
    map
}

fn build_game(monsters: usize) -> BenchGame {
    let mut materials = MaterialRegistry::default();
    materials.register("FLOOR4_8", MaterialGroup::Flats);
    materials.register("CEIL3_5", MaterialGroup::Flats);
    materials.register("STARTAN3", MaterialGroup::Textures);

    let infos = MobjInfoTable {
        infos: (0..4)
            .map(|i| MobjInfo {
                spawn_health: 20 + i * 20,
                spawn_state: StateId(0),
                radius: 20.0,
                height: 56.0,
                damage: i,
                flags: MobjFlags::SOLID | MobjFlags::SHOOTABLE,
                flags2: MobjFlags2::empty(),
                flags3: MobjFlags3::empty(),
                special2_is_mobj: false,
            })
            .collect(),
    };
    let states = StateTable {
        states: (0..16)
            .map(|i| State {
                sprite: i / 4,
                frame: i % 4,
                tics: 6,
                next: StateId(((i + 1) % 16) as u32),
            })
            .collect(),
    };

    let map = grid_map(&materials);
    let mut library = MapLibrary::default();
    library.insert(MAP, map.clone());
    let mut level = Level::new(map);

    let mode = GameMode::DoomCommercial;
    let profile = GameProfile::for_mode(mode);
    let mut players = Players::new(profile.layout);
    players.join(0, 1);

    let mut rng = ChaCha8Rng::seed_from_u64(monsters as u64);
    let extent = GRID as f32 * SECTOR_SIZE;
    let mut ids = Vec::with_capacity(monsters);
    for _ in 0..monsters {
        let type_id = rng.gen_range(0..4);
        let pos = [
            rng.gen_range(0.0..extent).floor(),
            rng.gen_range(0.0..extent).floor(),
            0.0,
        ];
        let mut mo = Mobj::from_info(type_id, &infos.infos[type_id as usize], pos);
        mo.angle = rng.gen();
        mo.state = StateId(rng.gen_range(0..16));
        if let Some(id) = level.spawn_mobj(mo) {
            ids.push(id);
        }
    }
    for (i, &id) in ids.iter().enumerate() {
        let target = ids[rng.gen_range(0..ids.len())];
        if let Some(mo) = level.thinkers.mobj_mut(id) {
            mo.target = Some(target);
            mo.tracer = ids.get(i + 1).copied();
        }
    }
    for sector in (0..GRID * GRID).step_by(4) {
        let door = Door {
            kind: 1,
            sector,
            top_height: 124.0,
            speed: 2.0,
            state: 1,
            top_wait: 150,
            top_countdown: 0,
        };
        let _ = level.add_special(ThinkerKind::Door(door));
    }

    BenchGame {
        session: GameSession::new_game(mode, GameRules::default(), MAP, 1),
        players,
        level,
        library,
        profile,
        materials,
        infos,
        states,
    }
}

fn save_bytes(game: &BenchGame) -> Vec<u8> {
    save_game(&SaveRequest {
        session: &game.session,
        players: &game.players,
        level: &game.level,
        tables: game.tables(),
        profile: &game.profile,
        options: SaveOptions::default(),
        description: "bench",
    })
    .unwrap()
}

const SCALES: [usize; 3] = [1_000, 5_000, 20_000];

// ---------------------------------------------------------------------------
// 1. FULL SAVE: archive + compress + checksum
// ---------------------------------------------------------------------------

fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_game");
    group.sample_size(10);

    for &count in &SCALES {
        let game = build_game(count);
        group.bench_with_input(
            BenchmarkId::new("save", format!("{count}_mobjs")),
            &game,
            |b, game| {
                b.iter(|| black_box(save_bytes(game).len()));
            },
        );
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 2. FULL LOAD: verify + decompress + rebuild level
// ---------------------------------------------------------------------------

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_game");
    group.sample_size(10);

    for &count in &SCALES {
        let game = build_game(count);
        let bytes = save_bytes(&game);
        group.bench_with_input(
            BenchmarkId::new("load", format!("{count}_mobjs")),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let loaded = load_game(&LoadRequest {
                        bytes,
                        session: &game.session,
                        players: &game.players,
                        library: &game.library,
                        tables: game.tables(),
                        profile: &game.profile,
                    })
                    .unwrap();
                    black_box(loaded.thinkers)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_save, bench_load);
criterion_main!(benches);
