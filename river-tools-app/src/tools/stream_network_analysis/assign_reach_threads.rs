/*
This tool is part of the RiverTools stream network library.
Created: 18/10/2026
License: MIT
*/

use crate::tools::*;
use river_common::checkpoint::{
    CheckpointStore, CheckpointedDriver, TraversalConfig, DEFAULT_CHUNK_SIZE,
};
use river_common::structures::{ReachTable, DEFAULT_DOWNSTREAM_FIELD, DEFAULT_ID_FIELD};
use river_common::utils::{get_formatted_elapsed_time, write_atomically};
use river_common::TopologyError;
use std::io::{Error, ErrorKind};
use std::path::Path;
use std::time::Instant;

/// This tool labels a hydrography link table (one row per reach, with the id of the
/// next reach downstream, e.g. HydroRIVERS `HYRIV_ID`/`NEXT_DOWN`) with river threads.
/// Starting from every headwater reach (a reach no other reach drains into), in
/// ascending id order, the network is walked downstream breadth-first. Each reach
/// reached for the first time gets the headwater's `River_ID` (`River_<n>`, the n-th
/// headwater) and an `Order` equal to its hop count from that headwater. A confluence
/// belongs to the lowest-numbered headwater whose walk reaches it.
///
/// Headwaters are processed in chunks of `--chunk_size`. After each chunk the new
/// assignments are appended to a checkpoint file (`--checkpoint`) and synced to disk,
/// so an interrupted run picks up after the last completed chunk when rerun with the
/// same arguments. The checkpoint is deleted once the output is written.
///
/// A downstream value of 0 marks an outlet. Blank or NaN values are treated as
/// outlets too but reported as missing links. Reaches that take part in no link
/// get empty `River_ID` and `Order` cells.
pub struct AssignReachThreads {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl AssignReachThreads {
    pub fn new() -> AssignReachThreads {
        let name = "AssignReachThreads".to_string();
        let toolbox = "Stream Network Analysis".to_string();
        let description =
            "Assigns river thread IDs and downstream order to a reach link table, resumably."
                .to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Input Reach Table".to_owned(),
            flags: vec!["-i".to_owned(), "--input".to_owned()],
            description: "Input CSV link table.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Csv),
            default_value: None,
            optional: false,
        });
        parameters.push(ToolParameter {
            name: "Output File".to_owned(),
            flags: vec!["-o".to_owned(), "--output".to_owned()],
            description: "Output CSV file.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Csv),
            default_value: None,
            optional: false,
        });
        parameters.push(ToolParameter {
            name: "Reach ID Field".to_owned(),
            flags: vec!["--id_field".to_owned()],
            description: "Column holding the reach identifier.".to_owned(),
            parameter_type: ParameterType::String,
            default_value: Some(DEFAULT_ID_FIELD.to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Downstream Field".to_owned(),
            flags: vec!["--downstream_field".to_owned()],
            description: "Column holding the next downstream reach (0 = outlet).".to_owned(),
            parameter_type: ParameterType::String,
            default_value: Some(DEFAULT_DOWNSTREAM_FIELD.to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Chunk Size".to_owned(),
            flags: vec!["--chunk_size".to_owned()],
            description: "Headwaters traversed between checkpoint commits.".to_owned(),
            parameter_type: ParameterType::Integer,
            default_value: Some(DEFAULT_CHUNK_SIZE.to_string()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Checkpoint File".to_owned(),
            flags: vec!["--checkpoint".to_owned()],
            description: "Checkpoint file; defaults to <output>.partial.csv.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Csv),
            default_value: None,
            optional: true,
        });

        let short_exe = short_exe_name();
        let usage = format!(
            ">>.*{0} -r={1} -v --wd=\"*path*to*data*\" -i=Rivers.csv -o=Rivers_with_RiverID.csv --chunk_size=200",
            short_exe, name
        )
        .replace("*", &std::path::MAIN_SEPARATOR.to_string());

        AssignReachThreads {
            name,
            description,
            toolbox,
            parameters,
            example_usage: usage,
        }
    }
}

impl RiverTool for AssignReachThreads {
    fn get_source_file(&self) -> String {
        String::from(file!())
    }

    fn get_tool_name(&self) -> String {
        self.name.clone()
    }

    fn get_tool_description(&self) -> String {
        self.description.clone()
    }

    fn get_tool_parameters(&self) -> String {
        parameters_to_json(&self.parameters)
    }

    fn get_example_usage(&self) -> String {
        self.example_usage.clone()
    }

    fn get_toolbox(&self) -> String {
        self.toolbox.clone()
    }

    fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error> {
        let mut input_file = String::new();
        let mut output_file = String::new();
        let mut checkpoint_file = String::new();
        let mut id_field = DEFAULT_ID_FIELD.to_string();
        let mut downstream_field = DEFAULT_DOWNSTREAM_FIELD.to_string();
        let mut chunk_size = DEFAULT_CHUNK_SIZE;

        if args.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            ));
        }
        for (flag, value) in parse_args(&args) {
            if flag == "-i" || flag == "-input" {
                input_file = value.unwrap_or_default();
            } else if flag == "-o" || flag == "-output" {
                output_file = value.unwrap_or_default();
            } else if flag == "-checkpoint" {
                checkpoint_file = value.unwrap_or_default();
            } else if flag == "-id_field" {
                id_field = value.unwrap_or(id_field);
            } else if flag == "-downstream_field" {
                downstream_field = value.unwrap_or(downstream_field);
            } else if flag == "-chunk_size" {
                chunk_size = parse_number(&flag, &value)?;
            }
        }

        if input_file.is_empty() {
            return Err(missing_parameter("Input reach table (--input) not specified."));
        }
        if output_file.is_empty() {
            return Err(missing_parameter("Output file (--output) not specified."));
        }

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let input_file = resolve_path(&input_file, working_directory);
        let output_file = resolve_path(&output_file, working_directory);
        let checkpoint_file = if checkpoint_file.is_empty() {
            Path::new(&output_file)
                .with_extension("partial.csv")
                .to_string_lossy()
                .into_owned()
        } else {
            resolve_path(&checkpoint_file, working_directory)
        };

        if verbose {
            println!("Reading reach table...");
        }
        let table = ReachTable::from_path(&input_file, &id_field, &downstream_field)
            .map_err(Error::from)?;
        if table.is_empty() {
            return Err(TopologyError::EmptyInput.into());
        }

        let start = Instant::now();

        let missing = table.missing_downstream_count();
        if missing > 0 {
            tracing::warn!(
                rows = missing,
                field = downstream_field.as_str(),
                "rows have no downstream value; treated as outlets"
            );
            if verbose {
                println!(
                    "Warning: {} rows have an empty {} value and are treated as outlets.",
                    missing, downstream_field
                );
            }
        }

        let graph = table.to_graph();
        if graph.is_empty() {
            tracing::warn!("reach table contains no downstream links; nothing to traverse");
        }
        if verbose {
            println!(
                "Built network: {} reaches, {} links.",
                graph.node_count(),
                graph.edge_count()
            );
        }

        let store = CheckpointStore::new(&checkpoint_file);
        let mut driver = CheckpointedDriver::resume(&graph, store, TraversalConfig { chunk_size })
            .map_err(Error::from)?;
        if verbose {
            println!(
                "Headwater sources: {} ({} already processed, {} to process).",
                driver.sources_total(),
                driver.sources_resumed(),
                driver.sources_pending()
            );
        }

        let to_process = driver.sources_pending();
        let mut old_progress: usize = 1;
        driver
            .run(|p| {
                if verbose && to_process > 0 {
                    let progress = (100.0_f64 * p.sources_processed as f64 / to_process as f64) as usize;
                    if progress != old_progress {
                        println!("Processing in chunks: {}% (chunk {})", progress, p.chunk);
                        old_progress = progress;
                    }
                }
            })
            .map_err(Error::from)?;

        let assignments = driver.committed_assignments().map_err(Error::from)?;
        let elapsed_time = get_formatted_elapsed_time(start);

        if verbose {
            println!("Saving data...");
        }
        let assigned = write_atomically(&output_file, |w| table.write_merged(w, &assignments))
            .map_err(Error::from)?;
        driver.complete().map_err(Error::from)?;

        if verbose {
            println!(
                "Assigned {} of {} rows ({} unassigned).",
                assigned,
                table.len(),
                table.len() - assigned
            );
            println!("Output file written");
            println!("Elapsed Time (excluding I/O): {}", elapsed_time);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn working_dir(dir: &Path) -> String {
        format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR)
    }

    #[test]
    fn test_assigns_threads_and_removes_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Rivers.csv"),
            "HYRIV_ID,NEXT_DOWN\n1,2\n2,3\n3,0\n",
        )
        .unwrap();
        AssignReachThreads::new()
            .run(
                args(&["-i=Rivers.csv", "-o=out.csv", "--chunk_size=1"]),
                &working_dir(dir.path()),
                false,
            )
            .unwrap();
        let text = fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(
            text,
            "HYRIV_ID,NEXT_DOWN,River_ID,Order\n1,2,River_1,0\n2,3,River_1,1\n3,0,River_1,2\n"
        );
        assert!(!dir.path().join("out.partial.csv").exists());
    }

    #[test]
    fn test_custom_field_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("links.csv"), "id,down\n10,20\n20,0\n").unwrap();
        AssignReachThreads::new()
            .run(
                args(&["-i", "links.csv", "-o", "out.csv", "--id_field=id", "--downstream_field=down"]),
                &working_dir(dir.path()),
                false,
            )
            .unwrap();
        let text = fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert!(text.contains("20,0,River_1,1"));
    }

    #[test]
    fn test_missing_schema_and_cycles_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let wd = working_dir(dir.path());
        fs::write(dir.path().join("noschema.csv"), "HYRIV_ID,DOWN\n1,2\n").unwrap();
        let err = AssignReachThreads::new()
            .run(args(&["-i=noschema.csv", "-o=out.csv"]), &wd, false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("NEXT_DOWN"));

        fs::write(dir.path().join("cycle.csv"), "HYRIV_ID,NEXT_DOWN\n1,2\n2,1\n").unwrap();
        let err = AssignReachThreads::new()
            .run(args(&["-i=cycle.csv", "-o=out.csv"]), &wd, false)
            .unwrap_err();
        assert!(err.to_string().contains("no source reaches"));

        fs::write(dir.path().join("empty.csv"), "HYRIV_ID,NEXT_DOWN\n").unwrap();
        let err = AssignReachThreads::new()
            .run(args(&["-i=empty.csv", "-o=out.csv"]), &wd, false)
            .unwrap_err();
        assert!(err.to_string().contains("no data rows"));
        assert!(!dir.path().join("out.csv").exists());
    }
}
