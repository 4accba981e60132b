//! Command line driver for the PL/0C toolchain.

use ansi_term::Style;
use getopts::Options;
use pl0c::mach::{compile, disasm, Instr, Runtime};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let progname = args
        .first()
        .and_then(|path| path.rsplit('/').next())
        .unwrap_or("pl0c")
        .to_string();

    let mut opts = Options::new();
    opts.optflag("v", "verbose", "trace scanning, code emission, and execution");
    opts.optflag("h", "help", "print this help menu");
    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{}: {}", progname, fail);
            process::exit(2);
        }
    };
    if matches.opt_present("h") {
        print!(
            "{}",
            opts.usage(&format!("Usage: {} [-v] [-] [sourcefile]", progname))
        );
        return;
    }
    let verbose = matches.opt_present("v");

    let source: Box<dyn BufRead> = match matches.free.first().map(String::as_str) {
        Some("-") => Box::new(BufReader::new(io::stdin())),
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(error) => {
                eprintln!(
                    "{}: error opening source file '{}': {}",
                    progname, path, error
                );
                process::exit(1);
            }
        },
        None => match pl0c::term::read_program() {
            Some(text) => Box::new(Cursor::new(text)),
            None => return,
        },
    };

    let mut code: Vec<Instr> = vec![];
    let nerrors = compile(&progname, source, &mut code, verbose);
    if nerrors > 0 {
        eprintln!(
            "{}: {} error{}",
            progname,
            nerrors,
            if nerrors == 1 { "" } else { "s" }
        );
        process::exit(nerrors.min(255) as i32);
    }
    if verbose {
        println!();
        for (loc, instr) in code.iter().enumerate() {
            println!("{}", disasm(loc, instr, ""));
        }
        println!();
    }

    let mut runtime = Runtime::new();
    match runtime.run(&code, verbose) {
        Ok(cycles) => {
            if verbose {
                println!("{}: {} cycles", progname, cycles);
            }
        }
        Err(error) => {
            let message = format!("{}: {}", progname, error);
            eprintln!("{}", Style::new().bold().paint(message));
            process::exit(1);
        }
    }
}
