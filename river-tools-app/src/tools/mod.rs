pub mod stream_network_analysis;

use serde_derive::{Deserialize, Serialize};
use std::io::{Error, ErrorKind};
use std::path;

pub trait RiverTool {
    fn get_source_file(&self) -> String;
    fn get_tool_name(&self) -> String;
    fn get_tool_description(&self) -> String;
    fn get_tool_parameters(&self) -> String;
    fn get_example_usage(&self) -> String;
    fn get_toolbox(&self) -> String;
    fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error>;
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolParameter {
    pub name: String,
    pub flags: Vec<String>,
    pub description: String,
    pub parameter_type: ParameterType,
    pub default_value: Option<String>,
    pub optional: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ParameterType {
    String,
    Integer,
    ExistingFile(ParameterFileType),
    NewFile(ParameterFileType),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ParameterFileType {
    Csv,
    Vector(VectorGeometryType),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum VectorGeometryType {
    Line,
}

pub struct ToolManager {
    pub working_dir: String,
    pub verbose: bool,
    tool_names: Vec<String>,
}

impl ToolManager {
    pub fn new<'a>(working_directory: &'a str, verbose_mode: &'a bool) -> Result<ToolManager, Error> {
        let tool_names = vec![
            "AssignReachThreads".to_string(),
            "ReconstructStreamTopology".to_string(),
        ];
        Ok(ToolManager {
            working_dir: working_directory.to_string(),
            verbose: *verbose_mode,
            tool_names,
        })
    }

    fn get_tool(&self, tool_name: &str) -> Option<Box<dyn RiverTool + 'static>> {
        match tool_name.to_lowercase().replace("_", "").as_ref() {
            "assignreachthreads" => Some(Box::new(
                stream_network_analysis::AssignReachThreads::new(),
            )),
            "reconstructstreamtopology" => Some(Box::new(
                stream_network_analysis::ReconstructStreamTopology::new(),
            )),
            _ => None,
        }
    }

    pub fn run_tool(&self, tool_name: String, args: Vec<String>) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => tool.run(args, &self.working_dir, self.verbose),
            None => Err(Error::new(
                ErrorKind::NotFound,
                format!("Unrecognized tool name {}.", tool_name),
            )),
        }
    }

    pub fn tool_help(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => {
                println!("{}", get_help(tool));
                Ok(())
            }
            None => Err(Error::new(
                ErrorKind::NotFound,
                format!("Unrecognized tool name {}.", tool_name),
            )),
        }
    }

    pub fn tool_parameters(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => {
                println!("{}", tool.get_tool_parameters());
                Ok(())
            }
            None => Err(Error::new(
                ErrorKind::NotFound,
                format!("Unrecognized tool name {}.", tool_name),
            )),
        }
    }

    pub fn get_tool_source_code(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => {
                println!("{}", tool.get_source_file());
                Ok(())
            }
            None => Err(Error::new(
                ErrorKind::NotFound,
                format!("Unrecognized tool name {}.", tool_name),
            )),
        }
    }

    pub fn list_tools(&self) {
        let mut tool_details: Vec<(String, String)> = Vec::new();
        for val in &self.tool_names {
            if let Some(tool) = self.get_tool(val) {
                tool_details.push((tool.get_tool_name(), tool.get_tool_description()));
            }
        }
        let mut ret = format!("All {} Available Tools:\n", tool_details.len());
        for (name, description) in &tool_details {
            ret.push_str(&format!("{}: {}\n\n", name, description));
        }
        println!("{}", ret);
    }
}

fn get_help<'a>(tool: Box<dyn RiverTool + 'a>) -> String {
    let tool_name = tool.get_tool_name();
    let description = tool.get_tool_description();
    let parameters = tool.get_tool_parameters();
    let toolbox = tool.get_toolbox();
    let example = tool.get_example_usage();
    let mut s = format!("{}\n{}\nToolbox: {}\nParameters:\n", tool_name, description, toolbox);
    match serde_json::from_str::<serde_json::Value>(&parameters) {
        Ok(v) => {
            if let Some(params) = v["parameters"].as_array() {
                for p in params {
                    let flags: Vec<String> = p["flags"]
                        .as_array()
                        .map(|f| f.iter().filter_map(|x| x.as_str()).map(String::from).collect())
                        .unwrap_or_default();
                    s.push_str(&format!(
                        "\n{:<24}{}",
                        flags.join(", "),
                        p["description"].as_str().unwrap_or("")
                    ));
                }
            }
        }
        Err(e) => s.push_str(&format!("{:?}", e)),
    }
    if !example.is_empty() {
        s.push_str(&format!("\n\nExample usage:\n{}", example));
    }
    s
}

/// Serialises tool parameters the way every tool reports them.
pub fn parameters_to_json(parameters: &[ToolParameter]) -> String {
    match serde_json::to_string(parameters) {
        Ok(json_str) => format!("{{\"parameters\":{}}}", json_str),
        Err(err) => format!("{:?}", err),
    }
}

/// Name of the running executable without directory or extension, for usage strings.
pub fn short_exe_name() -> String {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let exe = match std::env::current_exe() {
        Ok(p) => p,
        Err(_) => return "river_tools".to_string(),
    };
    let e = format!("{}", exe.display());
    let mut parent = exe.clone();
    parent.pop();
    let p = format!("{}", parent.display());
    let mut short_exe = e
        .replace(&p, "")
        .replace(".exe", "")
        .replace(".", "")
        .replace(&sep, "");
    if e.contains(".exe") {
        short_exe += ".exe";
    }
    short_exe
}

pub fn print_welcome(tool_name: &str) {
    let welcome_len = format!("* Welcome to {} *", tool_name).len().max(28);
    // 28 = minimum banner width.
    println!("{}", "*".repeat(welcome_len));
    println!(
        "* Welcome to {} {}*",
        tool_name,
        " ".repeat(welcome_len - 15 - tool_name.len())
    );
    println!("* Powered by RiverTools {}*", " ".repeat(welcome_len - 25));
    println!("{}", "*".repeat(welcome_len));
}

/// Prefixes `file` with the working directory unless it already names a directory.
pub fn resolve_path(file: &str, working_directory: &str) -> String {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    if !file.contains(&sep) && !file.contains('/') {
        format!("{}{}", working_directory, file)
    } else {
        file.to_string()
    }
}

/// Splits `--flag=value` / `--flag value` argument lists into normalised
/// `(flag, value)` pairs; flags are lowercased with `--` folded to `-`.
pub fn parse_args(args: &[String]) -> Vec<(String, Option<String>)> {
    let mut parsed = vec![];
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].replace('\"', "").replace('\'', "");
        let vec = arg.splitn(2, '=').collect::<Vec<&str>>();
        let flag = vec[0].to_lowercase().replace("--", "-");
        if vec.len() > 1 {
            parsed.push((flag, Some(vec[1].to_string())));
        } else if i + 1 < args.len() && !args[i + 1].starts_with('-') {
            parsed.push((flag, Some(args[i + 1].replace('\"', "").replace('\'', ""))));
            i += 1;
        } else {
            parsed.push((flag, None));
        }
        i += 1;
    }
    parsed
}

pub fn missing_parameter(message: &str) -> Error {
    Error::new(ErrorKind::InvalidInput, message.to_string())
}

pub fn parse_number<T: std::str::FromStr>(flag: &str, value: &Option<String>) -> Result<T, Error> {
    value
        .as_deref()
        .and_then(|v| v.trim().parse::<T>().ok())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid or missing value for {}.", flag),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_handles_both_forms() {
        let args: Vec<String> = ["--input=rivers.csv", "-o", "out.csv", "--chunk_size", "50", "--flag"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let parsed = parse_args(&args);
        assert_eq!(
            parsed,
            vec![
                ("-input".to_string(), Some("rivers.csv".to_string())),
                ("-o".to_string(), Some("out.csv".to_string())),
                ("-chunk_size".to_string(), Some("50".to_string())),
                ("-flag".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_resolve_path_respects_directories() {
        assert_eq!(resolve_path("a.csv", "/data/"), "/data/a.csv");
        assert_eq!(resolve_path("/tmp/a.csv", "/data/"), "/tmp/a.csv");
    }

    #[test]
    fn test_tool_lookup_ignores_case_and_underscores() {
        let tm = ToolManager::new("", &false).unwrap();
        assert!(tm.get_tool("assign_reach_threads").is_some());
        assert!(tm.get_tool("ReconstructStreamTopology").is_some());
        assert!(tm.get_tool("FillDepressions").is_none());
    }
}
