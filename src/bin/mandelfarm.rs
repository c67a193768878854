extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate mandelfarm;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use std::str::FromStr;

use mandelfarm::bmp;
use mandelfarm::config::{default_workers, parse_complex, parse_pair, DEFAULT_OUTPUT};
use mandelfarm::{render, render_local, Domain, RenderConfig, RenderError};

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const ITERATIONS: &str = "iterations";
const WORKERS: &str = "workers";
const MULTIPLIER: &str = "multiplier";
const THREADS: &str = "threads";
const FORMAT: &str = "format";
const LOCAL: &str = "local";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get().max(1) * 4;

    App::new("mandelfarm")
        .version("0.1.0")
        .about("Renders the Mandelbrot set across a coordinator and a group of workers")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value(DEFAULT_OUTPUT)
                .help("Output file"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x800")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image, WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.5,-1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the rendered plane"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1.0,1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the rendered plane"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iterations before a point is taken to be inside the set"),
        )
        .arg(
            Arg::with_name(WORKERS)
                .long(WORKERS)
                .short("w")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1024,
                        "Could not parse worker count",
                        "Worker count must be between 1 and 1024",
                    )
                })
                .help("Number of workers, not counting the coordinator"),
        )
        .arg(
            Arg::with_name(MULTIPLIER)
                .long(MULTIPLIER)
                .short("k")
                .takes_value(true)
                .default_value("10")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1000,
                        "Could not parse strip multiplier",
                        "Strip multiplier must be between 1 and 1000",
                    )
                })
                .help("Strips per worker"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Threads inside each worker"),
        )
        .arg(
            Arg::with_name(FORMAT)
                .long(FORMAT)
                .short("f")
                .takes_value(true)
                .possible_values(&["bmp", "pnm"])
                .default_value("bmp")
                .help("Output format"),
        )
        .arg(
            Arg::with_name(LOCAL)
                .long(LOCAL)
                .help("Render in this process without any workers"),
        )
        .get_matches()
}

// The validators have already run, so a value that fails to parse here
// is a bug in this file.
fn config_from(matches: &ArgMatches) -> Result<RenderConfig, RenderError> {
    let bad = |what: &str| RenderError::Config(format!("could not parse {}", what));

    let (width, height) =
        parse_pair::<usize>(matches.value_of(SIZE).unwrap_or(""), 'x').ok_or_else(|| bad(SIZE))?;
    let leftlower =
        parse_complex(matches.value_of(LEFTLOWER).unwrap_or("")).ok_or_else(|| bad(LEFTLOWER))?;
    let rightupper =
        parse_complex(matches.value_of(RIGHTUPPER).unwrap_or("")).ok_or_else(|| bad(RIGHTUPPER))?;
    let number = |name: &str| -> Result<usize, RenderError> {
        usize::from_str(matches.value_of(name).unwrap_or("")).map_err(|_| bad(name))
    };

    Ok(RenderConfig {
        domain: Domain::from_corners(leftlower, rightupper)?,
        width,
        height,
        max_iter: number(ITERATIONS)? as u32,
        num_workers: match matches.value_of(WORKERS) {
            Some(_) => number(WORKERS)?,
            None => default_workers(),
        },
        multiplier: number(MULTIPLIER)?,
        threads_per_worker: number(THREADS)?,
    })
}

fn run(matches: &ArgMatches) -> Result<(), RenderError> {
    let config = config_from(matches)?;
    let output = matches.value_of(OUTPUT).unwrap_or(DEFAULT_OUTPUT);

    let image = if matches.is_present(LOCAL) {
        info!("rendering {}x{} locally", config.width, config.height);
        render_local(&config)?
    } else {
        info!(
            "rendering {}x{} across {} workers",
            config.width, config.height, config.num_workers
        );
        render(&config)?
    };

    match matches.value_of(FORMAT) {
        Some("pnm") => image.save_pnm(output)?,
        _ => bmp::write(output, &image)?,
    }
    info!("done");
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();

    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
