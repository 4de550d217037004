use grazers_core::{GrazersConfig, NullDisplay, WorldState};
use grazers_storage::{JournalPipeline, read_genome_log, read_info_log};
use tempfile::tempdir;

#[test]
fn world_rollover_lands_in_both_logs() {
    let temp = tempdir().expect("tempdir");
    let dir = temp.path().join("logs");

    // Founders cannot eat or breed, so all of them starve on tick 4.
    let config = GrazersConfig {
        grid_width: 20,
        grid_height: 10,
        initial_population: 6,
        initial_food: 0,
        reseed_food: 5,
        cohort_size: 2,
        initial_health: 4,
        bite_heal: 0,
        rng_seed: Some(13),
        ..GrazersConfig::default()
    };

    {
        let pipeline = JournalPipeline::open(&dir).expect("pipeline");
        let mut world = WorldState::with_sinks(
            config,
            Box::new(NullDisplay::default()),
            Box::new(pipeline),
        )
        .expect("world");

        let mut rolled = false;
        for _ in 0..5 {
            rolled |= world.step().expect("step").epoch_rolled;
        }
        assert!(rolled, "expected an epoch rollover within five steps");
    }

    let genomes = read_genome_log(&dir).expect("genome log");
    assert_eq!(genomes.len(), 1);
    assert_eq!(genomes[0].epoch, 1);
    assert_eq!(genomes[0].genomes.len(), 2);
    assert_eq!(genomes[0].brains().count(), 2);

    let info = read_info_log(&dir).expect("info log");
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].epoch, 1);
    assert_eq!(info[0].steps, 4);
}
