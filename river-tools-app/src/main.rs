/*
RiverTools command-line runner.
Created: 18/10/2026
License: MIT
*/

mod logging;
pub mod tools;

use crate::tools::ToolManager;
use std::env;
use std::io::{Error, ErrorKind};
use std::path;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}

fn run() -> Result<(), Error> {
    let sep: &str = &path::MAIN_SEPARATOR.to_string();
    let mut working_dir = String::new();
    let mut tool_name = String::new();
    let mut run_tool = false;
    let mut tool_help = false;
    let mut tool_parameters = false;
    let mut list_tools = false;
    let mut view_code = false;
    let mut verbose = false;
    let mut tool_args_vec: Vec<String> = vec![];

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        help();
        return Ok(());
    }
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        let flag_val = arg.to_lowercase().replace("--", "-");
        let flag = flag_val.split('=').next().unwrap_or("");
        if flag_val == "-h" || flag_val == "-help" {
            help();
            return Ok(());
        } else if flag_val == "-version" {
            println!("river_tools v{}", VERSION);
            return Ok(());
        } else if flag == "-wd" || flag == "-working_directory" {
            working_dir = flag_value(&args, &mut i)?;
            if !working_dir.is_empty() && !working_dir.ends_with(sep) {
                working_dir.push_str(sep);
            }
        } else if flag == "-r" || flag == "-run" {
            tool_name = flag_value(&args, &mut i)?;
            run_tool = true;
        } else if flag == "-toolhelp" {
            tool_name = flag_value(&args, &mut i)?;
            tool_help = true;
        } else if flag == "-toolparameters" {
            tool_name = flag_value(&args, &mut i)?;
            tool_parameters = true;
        } else if flag == "-viewcode" {
            tool_name = flag_value(&args, &mut i)?;
            view_code = true;
        } else if flag_val == "-listtools" {
            list_tools = true;
        } else if flag_val == "-v" || flag_val == "-verbose" {
            verbose = true;
        } else {
            tool_args_vec.push(arg.clone());
        }
        i += 1;
    }

    logging::init(if verbose { "info" } else { "warn" });

    let tm = ToolManager::new(&working_dir, &verbose)?;
    if run_tool {
        tm.run_tool(tool_name, tool_args_vec)
    } else if tool_help {
        tm.tool_help(tool_name)
    } else if tool_parameters {
        tm.tool_parameters(tool_name)
    } else if view_code {
        tm.get_tool_source_code(tool_name)
    } else if list_tools {
        tm.list_tools();
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::InvalidInput,
            "Unrecognized command. Use --help for usage.",
        ))
    }
}

/// Value of the command flag at `args[*i]`, given either as `--flag=value` or
/// as `--flag value`. In the second form `i` is advanced past the value.
fn flag_value(args: &[String], i: &mut usize) -> Result<String, Error> {
    let arg = &args[*i];
    let value = match arg.split_once('=') {
        Some((_, v)) => v.to_string(),
        None => match args.get(*i + 1) {
            Some(next) if !next.starts_with('-') => {
                *i += 1;
                next.clone()
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("{} requires a value.", arg),
                ))
            }
        },
    };
    Ok(value.replace('\"', "").replace('\'', ""))
}

fn help() {
    let s = r#"river_tools Help

Commands:

--listtools           Lists all available tools.
-r, --run             Runs a tool; used in conjunction with --wd flag; -r="ReconstructStreamTopology".
--toolhelp            Prints the help associated with a tool; --toolhelp="AssignReachThreads".
--toolparameters      Prints the parameters (in json form) for a specific tool.
--viewcode            Prints the source file of a specific tool.
-v, --verbose         Verbose mode. Without this flag, tool outputs will not be printed.
--version             Prints the version information.
--wd                  Changes the working directory; used in conjunction with --run flag.
-h, --help            Prints help information.

Example Usage:
>> ./river_tools -r=AssignReachThreads -v --wd="/path/to/data/" -i=Rivers.csv -o=Rivers_with_RiverID.csv
"#;
    println!("{}", s);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flag_value_accepts_both_forms() {
        let a = args(&["--wd=\"/data/\"", "--wd", "/other/", "-r", "AssignReachThreads"]);
        let mut i = 0;
        assert_eq!(flag_value(&a, &mut i).unwrap(), "/data/");
        assert_eq!(i, 0);
        i = 1;
        assert_eq!(flag_value(&a, &mut i).unwrap(), "/other/");
        assert_eq!(i, 2);
        i = 3;
        assert_eq!(flag_value(&a, &mut i).unwrap(), "AssignReachThreads");
        assert_eq!(i, 4);
    }

    #[test]
    fn test_flag_value_without_value_is_an_error() {
        let a = args(&["--wd", "-v"]);
        let mut i = 0;
        let err = flag_value(&a, &mut i).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(flag_value(&args(&["--run"]), &mut 0).is_err());
    }
}
