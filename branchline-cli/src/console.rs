//! Console host: prints dialogue to stdout and reads choices from stdin.

use std::io::BufRead;

use branchline_common::{Program, Value};
use branchline_vm::{Flow, Functions, Host};
use tracing::debug;

/// Prints lines and numbered choices. Never pauses.
#[derive(Debug, Default)]
pub struct Console;

impl Host for Console {
    fn node_entered(&mut self, name: &str) -> Flow {
        debug!(node = name, "enter");
        Flow::Continue
    }

    fn node_exited(&mut self, name: &str) -> Flow {
        debug!(node = name, "exit");
        Flow::Continue
    }

    fn line_shown(&mut self, text: &str) -> Flow {
        println!("{text}");
        Flow::Continue
    }

    fn choices_shown(&mut self, choices: &[String]) {
        for (i, text) in choices.iter().enumerate() {
            println!("  {}) {text}", i + 1);
        }
    }

    fn dialogue_ended(&mut self) {
        debug!("dialogue ended");
    }
}

/// Register a stub for every function the program declares. Each stub
/// echoes its call to stderr and continues.
pub fn echo_functions(program: &Program) -> Functions {
    let mut functions = Functions::new();
    for name in program.functions.keys() {
        let label = name.clone();
        functions.register(name.as_str(), move |args: &[Value]| {
            let rendered: Vec<String> = args.iter().map(render_arg).collect();
            eprintln!("call {label}({})", rendered.join(", "));
            Flow::Continue
        });
    }
    functions
}

fn render_arg(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

/// Read a 1-based choice from `input` and return it zero-based.
///
/// Re-prompts on anything that is not a number in range. `None` means the
/// input ended first.
pub fn read_choice(input: &mut impl BufRead, available: usize) -> Option<usize> {
    let mut buf = String::new();
    loop {
        buf.clear();
        match input.read_line(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        match buf.trim().parse::<usize>() {
            Ok(n) if (1..=available).contains(&n) => return Some(n - 1),
            _ => eprintln!("enter a number between 1 and {available}"),
        }
    }
}
