use proptest::prelude::*;
use river_common::checkpoint::{CheckpointStore, CheckpointedDriver, RunStatus, TraversalConfig};
use river_common::structures::ReachTable;
use river_common::utils::write_atomically;
use river_common::TopologyError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

// Two basins. Sources 1, 2, 3, 4, 40 and 41. 5 and 6 are confluences, 9 and 50 outlets.
// 77 is an isolated outlet and 88 has a missing downstream link.
const LINKS: &str = "HYRIV_ID,NEXT_DOWN,UPLAND_SKM\n\
                     1,5,1.0\n\
                     2,5,2.0\n\
                     3,6,3.0\n\
                     4,7,4.0\n\
                     5,6,5.0\n\
                     6,7,6.0\n\
                     7,8,7.0\n\
                     8,9,8.0\n\
                     9,0,9.0\n\
                     40,50,1.0\n\
                     41,50,1.0\n\
                     50,0,2.0\n\
                     77,0,0.1\n\
                     88,,0.1\n";

fn run(dir: &Path, chunk_size: usize, max_chunks: Option<usize>) -> Result<RunStatus, TopologyError> {
    run_table(LINKS, dir, chunk_size, max_chunks)
}

fn run_table(
    links: &str,
    dir: &Path,
    chunk_size: usize,
    max_chunks: Option<usize>,
) -> Result<RunStatus, TopologyError> {
    let table = ReachTable::from_reader(links.as_bytes(), "HYRIV_ID", "NEXT_DOWN")?;
    let graph = table.to_graph();
    let store = CheckpointStore::new(dir.join("partial.csv"));
    let mut driver = CheckpointedDriver::resume(&graph, store, TraversalConfig { chunk_size })?;
    let status = driver.run_chunks(max_chunks, |_| {})?;
    if status == RunStatus::Complete {
        let assignments = driver.committed_assignments()?;
        write_atomically(dir.join("out.csv"), |w| table.write_merged(w, &assignments))?;
        driver.complete()?;
    }
    Ok(status)
}

#[test]
fn resumed_run_output_is_byte_identical() {
    let single = tempfile::tempdir().unwrap();
    assert_eq!(run(single.path(), 2, None).unwrap(), RunStatus::Complete);
    let expected = fs::read(single.path().join("out.csv")).unwrap();

    for stop_after in 1..3 {
        let split = tempfile::tempdir().unwrap();
        assert_eq!(
            run(split.path(), 2, Some(stop_after)).unwrap(),
            RunStatus::Interrupted
        );
        assert!(split.path().join("partial.csv").exists());
        assert!(!split.path().join("out.csv").exists());
        assert_eq!(run(split.path(), 2, None).unwrap(), RunStatus::Complete);
        assert_eq!(fs::read(split.path().join("out.csv")).unwrap(), expected);
        assert!(!split.path().join("partial.csv").exists());
    }
}

#[test]
fn merged_output_has_first_source_wins_threads() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), 2, None).unwrap();
    let text = fs::read_to_string(dir.path().join("out.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "HYRIV_ID,NEXT_DOWN,UPLAND_SKM,River_ID,Order");
    assert_eq!(lines[1], "1,5,1.0,River_1,0");
    assert_eq!(lines[2], "2,5,2.0,River_2,0");
    assert_eq!(lines[3], "3,6,3.0,River_3,0");
    assert_eq!(lines[5], "5,6,5.0,River_1,1");
    assert_eq!(lines[9], "9,0,9.0,River_1,5");
    assert_eq!(lines[10], "40,50,1.0,River_5,0");
    assert_eq!(lines[12], "50,0,2.0,River_5,1");
    // isolated and unlinked reaches are not part of any traversal
    assert_eq!(lines[13], "77,0,0.1,,");
    assert_eq!(lines[14], "88,,0.1,,");
}

#[test]
fn interrupted_chunk_write_is_not_counted_as_progress() {
    let single = tempfile::tempdir().unwrap();
    run(single.path(), 2, None).unwrap();
    let expected = fs::read(single.path().join("out.csv")).unwrap();

    let crashed = tempfile::tempdir().unwrap();
    run(crashed.path(), 2, Some(1)).unwrap();
    // a second chunk that died halfway through its write
    let mut f = OpenOptions::new()
        .append(true)
        .open(crashed.path().join("partial.csv"))
        .unwrap();
    f.write_all(b"3,River_3,0\n6,River_3,1\n7,Riv").unwrap();
    drop(f);

    assert_eq!(run(crashed.path(), 2, None).unwrap(), RunStatus::Complete);
    assert_eq!(fs::read(crashed.path().join("out.csv")).unwrap(), expected);
}

#[test]
fn corrupt_checkpoint_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), 2, Some(1)).unwrap();
    let path = dir.path().join("partial.csv");
    // claim more rows than the chunk holds
    let text = fs::read_to_string(&path).unwrap().replace("#commit,1,", "#commit,1,9");
    fs::write(&path, text).unwrap();

    let err = run(dir.path(), 2, None).unwrap_err();
    assert!(matches!(err, TopologyError::CheckpointCorrupt { .. }));
    assert!(path.exists());
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn chunk_size_changes_cadence_not_result() {
    let small = tempfile::tempdir().unwrap();
    run(small.path(), 1, None).unwrap();
    let large = tempfile::tempdir().unwrap();
    run(large.path(), 200, None).unwrap();
    assert_eq!(
        fs::read(small.path().join("out.csv")).unwrap(),
        fs::read(large.path().join("out.csv")).unwrap()
    );
}

/// Link table for a random river forest over reaches `1..=n`: each reach
/// drains to a higher id, to an outlet (0), or has a blank link.
fn forest_table() -> impl Strategy<Value = String> {
    (1usize..30)
        .prop_flat_map(|n| prop::collection::vec(0usize..40, n))
        .prop_map(|picks| {
            let n = picks.len();
            let mut text = String::from("HYRIV_ID,NEXT_DOWN\n");
            for (i, pick) in picks.into_iter().enumerate() {
                let id = i + 1;
                let down = match pick {
                    0..=3 => "0".to_string(),
                    4 => String::new(),
                    p if id + p % 8 < n => (id + 1 + p % 8).to_string(),
                    _ => "0".to_string(),
                };
                text.push_str(&format!("{},{}\n", id, down));
            }
            text
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_split_runs_match_single_pass(
        links in forest_table(),
        chunk_size in 1usize..5,
        stop_after in 1usize..4,
    ) {
        let single = tempfile::tempdir().unwrap();
        prop_assert_eq!(
            run_table(&links, single.path(), 1000, None).unwrap(),
            RunStatus::Complete
        );
        let expected = fs::read(single.path().join("out.csv")).unwrap();

        let split = tempfile::tempdir().unwrap();
        let mut status = run_table(&links, split.path(), chunk_size, Some(stop_after)).unwrap();
        // keep restarting with one chunk per run until done
        while status == RunStatus::Interrupted {
            status = run_table(&links, split.path(), chunk_size, Some(1)).unwrap();
        }
        prop_assert_eq!(fs::read(split.path().join("out.csv")).unwrap(), expected);
        prop_assert!(!split.path().join("partial.csv").exists());
    }
}
