//! Interactive REPL

use crate::error::{report_error, report_runtime_error};
use crate::interp::Interpreter;
use crate::lexer::tokenize;
use crate::parser::parse_with_ids;
use crate::resolver::resolve;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".loam_history";

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    interpreter: Interpreter,
    /// First reference id for the next input line. Each line's tree gets
    /// fresh ids so resolution entries from earlier lines stay valid.
    next_id: u32,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new() -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let interpreter = Interpreter::new();
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            interpreter,
            next_id: 0,
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("loam repl");
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.eval_source(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :). Returns true to exit.
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                self.print_help();
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL");
        println!("  :clear          Clear the screen");
        println!();
        println!("You can enter statements and declarations:");
        println!("  print 1 + 2;");
        println!("  var x = 10;");
        println!("  fun greet(name) {{ print \"hi, \" + name; }}");
        println!("  class Point {{ init(x, y) {{ this.x = x; this.y = y; }} }}");
        println!();
        println!("Definitions persist across lines.");
        println!();
        println!("Built-in functions:");
        println!("  clock()         Seconds since the Unix epoch");
    }

    /// Run one input line against the persistent interpreter
    fn eval_source(&mut self, source: &str) {
        let tokens = match tokenize(source) {
            Ok(tokens) => tokens,
            Err(err) => {
                report_error("<repl>", source, &err);
                return;
            }
        };

        let (program, next_id) = match parse_with_ids(tokens, self.next_id) {
            Ok(parsed) => parsed,
            Err(err) => {
                report_error("<repl>", source, &err);
                return;
            }
        };
        self.next_id = next_id;

        let resolutions = match resolve(&program) {
            Ok(resolutions) => resolutions,
            Err(err) => {
                report_error("<repl>", source, &err);
                return;
            }
        };
        self.interpreter.add_resolutions(resolutions);

        if let Err(err) = self.interpreter.interpret(&program) {
            report_runtime_error("<repl>", source, &err);
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new().expect("Failed to create REPL")
    }
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
