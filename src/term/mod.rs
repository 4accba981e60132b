/*!
## PL/0C terminal module

Interactive source entry for the command line driver.

*/

use rustyline::error::ReadlineError;
use rustyline::Editor;

/// Read a program through the line editor until a line ending in the
/// program terminator `.` (or EOF). Returns `None` when entry is
/// abandoned.
pub fn read_program() -> Option<String> {
    let mut editor = Editor::<()>::new();
    let mut source = String::new();
    loop {
        match editor.readline("> ") {
            Ok(line) => {
                editor.add_history_entry(line.as_str());
                let terminated = line.trim_end().ends_with('.');
                source.push_str(&line);
                source.push('\n');
                if terminated {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => return None,
            Err(ReadlineError::Eof) => break,
            Err(error) => {
                eprintln!("{:?}", error);
                return None;
            }
        }
    }
    Some(source)
}
