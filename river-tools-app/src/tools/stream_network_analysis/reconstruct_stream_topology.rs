/*
This tool is part of the RiverTools stream network library.
Created: 18/10/2026
License: MIT
*/

use crate::tools::*;
use geojson::{Feature, FeatureCollection, GeoJson, Value as GeoValue};
use river_common::algorithms::reconstruct_streams;
use river_common::structures::{Point2D, Segment, DEFAULT_PRECISION, MAX_PRECISION, NO_BASIN};
use river_common::utils::{get_formatted_elapsed_time, write_atomically};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::fs;
use std::io::{Error, ErrorKind, Write};
use std::time::Instant;

/// This tool assembles disconnected stream segments (e.g. the line output of a
/// raster-to-vector stream extraction) into river threads. Segments whose first or
/// last vertex coincide, after rounding each axis to `--precision` decimal digits,
/// are joined; every connected set of segments within one basin receives a River_ID.
/// IDs start at 1 and increase across basins in ascending basin order.
///
/// The input is a GeoJSON FeatureCollection of LineStrings carrying an integer basin
/// attribute (`--basin_field`, default `basin_group`) from a prior spatial join with
/// basin polygons; 0 or a missing value means the segment lies in no basin. Such
/// segments keep River_ID 0.
///
/// Each output feature gets `River_ID`, `length`, `basin_group` and
/// `cumulative_distance`, the running sum of segment length within its thread taken
/// in input order. Input order is not flow order, so `cumulative_distance` is only
/// an approximate distance along the thread.
pub struct ReconstructStreamTopology {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl ReconstructStreamTopology {
    pub fn new() -> ReconstructStreamTopology {
        let name = "ReconstructStreamTopology".to_string();
        let toolbox = "Stream Network Analysis".to_string();
        let description =
            "Joins stream segments that share endpoints into river threads and assigns River_IDs and cumulative distances."
                .to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Input Streams File".to_owned(),
            flags: vec!["-i".to_owned(), "--input".to_owned()],
            description: "Input GeoJSON file of stream segment lines.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Line,
            )),
            default_value: None,
            optional: false,
        });
        parameters.push(ToolParameter {
            name: "Output File".to_owned(),
            flags: vec!["-o".to_owned(), "--output".to_owned()],
            description: "Output GeoJSON file.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Vector(
                VectorGeometryType::Line,
            )),
            default_value: None,
            optional: false,
        });
        parameters.push(ToolParameter {
            name: "Basin Field".to_owned(),
            flags: vec!["--basin_field".to_owned()],
            description: "Integer feature property holding each segment's basin group.".to_owned(),
            parameter_type: ParameterType::String,
            default_value: Some("basin_group".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Endpoint Precision".to_owned(),
            flags: vec!["--precision".to_owned()],
            description: "Decimal digits kept when matching segment endpoints.".to_owned(),
            parameter_type: ParameterType::Integer,
            default_value: Some(DEFAULT_PRECISION.to_string()),
            optional: true,
        });

        let short_exe = short_exe_name();
        let usage = format!(
            ">>.*{0} -r={1} -v --wd=\"*path*to*data*\" -i=streams.geojson -o=streams_topo.geojson --precision=6",
            short_exe, name
        )
        .replace("*", &std::path::MAIN_SEPARATOR.to_string());

        ReconstructStreamTopology {
            name,
            description,
            toolbox,
            parameters,
            example_usage: usage,
        }
    }
}

impl RiverTool for ReconstructStreamTopology {
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
        let mut basin_field = "basin_group".to_string();
        let mut precision = DEFAULT_PRECISION;

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
            } else if flag == "-basin_field" {
                basin_field = value.unwrap_or(basin_field);
            } else if flag == "-precision" {
                precision = parse_number(&flag, &value)?;
            }
        }

        if input_file.is_empty() {
            return Err(missing_parameter("Input streams file (--input) not specified."));
        }
        if output_file.is_empty() {
            return Err(missing_parameter("Output file (--output) not specified."));
        }
        if precision > MAX_PRECISION {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("--precision may not exceed {} decimal digits.", MAX_PRECISION),
            ));
        }

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let input_file = resolve_path(&input_file, working_directory);
        let output_file = resolve_path(&output_file, working_directory);

        if verbose {
            println!("Reading stream segments...");
        }
        let text = fs::read_to_string(&input_file)?;
        let collection = match text.parse::<GeoJson>() {
            Ok(GeoJson::FeatureCollection(fc)) => fc,
            Ok(_) => {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    "The input GeoJSON must be a FeatureCollection.",
                ))
            }
            Err(e) => {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("Error reading {}: {}", input_file, e),
                ))
            }
        };

        let start = Instant::now();

        let num_features = collection.features.len();
        let mut segments: Vec<Segment> = Vec::with_capacity(num_features);
        let mut kept: Vec<usize> = Vec::with_capacity(num_features);
        let mut skipped = 0usize;
        let mut progress: usize;
        let mut old_progress: usize = 1;
        for (i, feature) in collection.features.iter().enumerate() {
            let points: Vec<Point2D> = match feature.geometry.as_ref().map(|g| &g.value) {
                Some(GeoValue::LineString(coords)) => coords
                    .iter()
                    .filter(|c| c.len() >= 2)
                    .map(|c| Point2D::new(c[0], c[1]))
                    .collect(),
                None => vec![],
                Some(_) => {
                    skipped += 1;
                    continue;
                }
            };
            let basin_group = read_basin_group(feature, &basin_field, i)?;
            segments.push(Segment::new(segments.len(), points, basin_group));
            kept.push(i);
            if verbose && num_features > 1 {
                progress = (100.0_f64 * i as f64 / (num_features - 1) as f64) as usize;
                if progress != old_progress {
                    println!("Extracting segments: {}%", progress);
                    old_progress = progress;
                }
            }
        }
        if skipped > 0 {
            tracing::warn!(features = skipped, "non-LineString features excluded");
            if verbose {
                println!("Warning: {} non-LineString features were excluded.", skipped);
            }
        }

        if verbose {
            println!("Joining segments into river threads...");
        }
        let topology = reconstruct_streams(&segments, precision).map_err(Error::from)?;
        let elapsed_time = get_formatted_elapsed_time(start);

        let mut features: Vec<Feature> = Vec::with_capacity(kept.len());
        for (pos, &i) in kept.iter().enumerate() {
            let source = &collection.features[i];
            let mut properties: JsonMap<String, JsonValue> =
                source.properties.clone().unwrap_or_default();
            properties.insert("River_ID".to_string(), json!(topology.river_ids[pos]));
            properties.insert(
                "cumulative_distance".to_string(),
                json!(topology.cumulative_distances[pos]),
            );
            properties.insert("length".to_string(), json!(topology.lengths[pos]));
            properties.insert("basin_group".to_string(), json!(segments[pos].basin_group));
            features.push(Feature {
                bbox: source.bbox.clone(),
                geometry: source.geometry.clone(),
                id: source.id.clone(),
                properties: Some(properties),
                foreign_members: source.foreign_members.clone(),
            });
        }
        let output = GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features,
            foreign_members: collection.foreign_members.clone(),
        });

        if verbose {
            println!("Saving data...");
        }
        write_atomically(&output_file, |w| w.write_all(output.to_string().as_bytes()))?;

        if verbose {
            let networks = topology.river_network_count();
            println!("Total stream segments: {}", segments.len());
            println!("Total river networks: {}", networks);
            if networks > 0 {
                let labelled = segments.len() - topology.unassigned_segments;
                println!(
                    "Average segments per river: {:.2}",
                    labelled as f64 / networks as f64
                );
            }
            println!(
                "Max cumulative distance: {:.2}",
                topology.max_cumulative_distance()
            );
            println!(
                "Segments with distance > 0: {}",
                topology
                    .cumulative_distances
                    .iter()
                    .filter(|&&d| d > 0.0)
                    .count()
            );
            if topology.unassigned_segments > 0 {
                println!(
                    "Warning: {} streams don't intersect any basin",
                    topology.unassigned_segments
                );
            }
            if topology.sentinel_segments > 0 {
                println!(
                    "Warning: {} segments have no usable geometry",
                    topology.sentinel_segments
                );
            }
            for basin in &topology.basins {
                println!(
                    "  Basin {}: {} stream segments, {} river networks",
                    basin.basin_group, basin.segments, basin.river_networks
                );
            }
            println!("Output file written");
            println!("Elapsed Time (excluding I/O): {}", elapsed_time);
        }

        Ok(())
    }
}

/// Basin attribute of a feature. Null or absent is `NO_BASIN`; integral
/// numbers (also as text, as left by a join that produced floats) are accepted.
fn read_basin_group(feature: &Feature, field: &str, feature_index: usize) -> Result<u32, Error> {
    let value = match feature.properties.as_ref().and_then(|p| p.get(field)) {
        None | Some(JsonValue::Null) => return Ok(NO_BASIN),
        Some(v) => v,
    };
    let number = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_nan() => Ok(NO_BASIN),
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(n as u32),
        _ => Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "Feature {} has an invalid '{}' value: {}",
                feature_index, field, value
            ),
        )),
    }
}
