//! Interactive query panel on the terminal

use std::io::{BufRead, Write};

use super::CliError;
use crate::{AppContext, host::LineSource, host::Notifier, host::WriterSink};

const HELP: &str = "\
Commands:
  query     edit the query (finish with a line containing only '.')
  helpers   edit the helper code (finish with a line containing only '.')
  run       execute the query against the input
  clear     reset the query to the default (helpers are kept)
  show      print the current query and helpers
  help      show this help
  quit      leave the shell
";

/// Read lines up to a lone `.` or end of input.
fn read_block(input: &mut impl BufRead) -> Result<String, CliError> {
    let mut lines = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim_end_matches(['\n', '\r']);
        if text == "." {
            break;
        }
        lines.push(text.to_string());
    }
    Ok(lines.join("\n"))
}

/// Drive the query panel from `input` until `quit` or end of input.
pub fn run_shell<N: Notifier>(
    ctx: &mut AppContext<N>,
    source: &dyn LineSource,
    mut input: impl BufRead,
    mut output: impl Write,
) -> Result<(), CliError> {
    ctx.open_panel();
    writeln!(output, "lineq shell. Type 'help' for commands.")?;

    let mut command = String::new();
    loop {
        write!(output, "lineq> ")?;
        output.flush()?;

        command.clear();
        if input.read_line(&mut command)? == 0 {
            break;
        }

        let (panel, engine, notifier) = ctx.parts();
        let Some(panel) = panel else {
            break;
        };

        match command.trim() {
            "" => {}
            "query" => {
                let text = read_block(&mut input)?;
                panel.set_query(text);
            }
            "helpers" => {
                let text = read_block(&mut input)?;
                panel.set_helpers(text);
            }
            "run" => {
                let mut sink = WriterSink::new(&mut output);
                panel.execute(engine, source, &mut sink, notifier);
            }
            "clear" => panel.clear(),
            "show" => {
                writeln!(output, "-- query --\n{}", panel.query())?;
                writeln!(output, "-- helpers --\n{}", panel.helpers())?;
            }
            "help" => write!(output, "{}", HELP)?,
            "quit" | "exit" => break,
            other => writeln!(output, "Unknown command '{}'. Type 'help'.", other)?,
        }
    }
    Ok(())
}
