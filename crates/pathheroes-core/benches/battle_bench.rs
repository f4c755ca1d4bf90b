use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pathheroes_core::battle::Battle;
use pathheroes_core::catalog::{hero_roster, LevelId};
use pathheroes_core::config::BattleConfig;
use pathheroes_core::context::Encounter;

const PARTY: [(&str, u8); 5] = [
    ("executioner", 10),
    ("bastin", 10),
    ("anubis", 10),
    ("geomis", 10),
    ("starlord", 10),
];

fn started(island: u8, level: u8, seed: u64) -> Battle {
    let level = LevelId::new(island, level).unwrap();
    let mut battle = Battle::new(BattleConfig::default(), Encounter::new(level)).with_seed(seed);
    battle.load_player_roster(&hero_roster(&PARTY).unwrap()).unwrap();
    battle.generate_enemies().unwrap();
    battle.start(0).unwrap();
    battle
}

fn bench_full_battle(c: &mut Criterion) {
    c.bench_function("full_battle_1_5", |b| {
        b.iter(|| {
            let mut battle = started(1, 5, black_box(7));
            black_box(battle.run_until_resolved(1_000_000))
        })
    });
}

fn bench_boss_battle(c: &mut Criterion) {
    // Summons keep the timer table busy
    c.bench_function("boss_battle_4_10", |b| {
        b.iter(|| {
            let mut battle = started(4, 10, black_box(7));
            black_box(battle.run_until_resolved(1_000_000))
        })
    });
}

fn bench_single_step(c: &mut Criterion) {
    let mut battle = started(9, 10, 7);

    c.bench_function("single_step", |b| {
        b.iter(|| black_box(battle.step()))
    });
}

criterion_group!(benches, bench_full_battle, bench_boss_battle, bench_single_step);
criterion_main!(benches);
