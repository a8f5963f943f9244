extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
use ansi_term::Style;
use bc::lang::Error;
use bc::mach::{Config, Event, Runtime};
use linefeed::{Interface, ReadResult};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{debug, warn};

pub struct Options {
    pub files: Vec<PathBuf>,
    pub interactive: bool,
    pub quiet: bool,
}

enum Outcome {
    Continue,
    Quit,
    Fatal,
}

/// Runs the files, then standard input. Returns the process exit code.
pub fn main(config: Config, options: Options) -> i32 {
    let mut runtime = Runtime::new(config);
    let interrupted = runtime.interrupt_handle();
    if let Err(error) = ctrlc::set_handler(move || {
        interrupted.store(true, Ordering::SeqCst);
    }) {
        warn!(%error, "interrupt handler not installed");
    }
    match main_loop(&mut runtime, &options) {
        Ok(Outcome::Fatal) => 1,
        Ok(_) => 0,
        Err(error) => {
            eprintln!("{}", error);
            1
        }
    }
}

fn main_loop(runtime: &mut Runtime, options: &Options) -> io::Result<Outcome> {
    for path in &options.files {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => {
                debug!(%error, "open failed");
                eprintln!("File {} is unavailable.", path.display());
                return Ok(Outcome::Fatal);
            }
        };
        runtime.set_source(Some(&path.display().to_string()));
        runtime.enter(&text);
        runtime.end_of_input();
        match drain_plain(runtime)? {
            Outcome::Continue => {}
            outcome => return Ok(outcome),
        }
    }
    runtime.set_source(None);
    if options.interactive {
        if !options.quiet {
            println!("bc {}", env!("CARGO_PKG_VERSION"));
        }
        interactive_loop(runtime)
    } else {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            runtime.enter(&line?);
            match drain_plain(runtime)? {
                Outcome::Continue => {}
                outcome => return Ok(outcome),
            }
        }
        runtime.end_of_input();
        drain_plain(runtime)
    }
}

fn interactive_loop(runtime: &mut Runtime) -> io::Result<Outcome> {
    let interface = Interface::new("bc")?;
    interface.set_prompt("")?;
    loop {
        let outcome = drain(
            runtime,
            &mut |s: &str| interface.write_fmt(format_args!("{}", s)),
            &mut |error: &Error| {
                interface.write_fmt(format_args!(
                    "{}\n",
                    Style::new().bold().paint(error.to_string())
                ))
            },
        )?;
        match outcome {
            Outcome::Continue => {}
            outcome => return Ok(outcome),
        }
        match interface.read_line()? {
            ReadResult::Input(line) => {
                if !line.trim().is_empty() {
                    interface.add_history_unique(line.clone());
                }
                runtime.enter(&line);
            }
            ReadResult::Signal(_) | ReadResult::Eof => {
                runtime.end_of_input();
                return drain_plain(runtime);
            }
        }
    }
}

fn drain_plain(runtime: &mut Runtime) -> io::Result<Outcome> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    drain(
        runtime,
        &mut |s: &str| {
            let mut out = stdout.lock();
            out.write_all(s.as_bytes())?;
            out.flush()
        },
        &mut |error: &Error| {
            stdout.lock().flush()?;
            writeln!(stderr.lock(), "{}", error)
        },
    )
}

/// Runs everything queued, passing output and diagnostics along.
fn drain(
    runtime: &mut Runtime,
    print: &mut dyn FnMut(&str) -> io::Result<()>,
    report: &mut dyn FnMut(&Error) -> io::Result<()>,
) -> io::Result<Outcome> {
    loop {
        match runtime.execute(5000) {
            Event::Stopped => return Ok(Outcome::Continue),
            Event::Running => {}
            Event::Print(s) => print(&s)?,
            Event::Errors(errors) => {
                for error in errors.iter() {
                    report(error)?;
                    if error.is_fatal() {
                        return Ok(Outcome::Fatal);
                    }
                }
            }
            Event::Quit => return Ok(Outcome::Quit),
        }
    }
}
