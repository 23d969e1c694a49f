use clap::{App, Arg, SubCommand};
use ecm::arith::miller_rabin;
use ecm::driver;
use ecm::{ecm_multithreaded, ecm_singlethreaded};
use log::info;
use rug::Integer;
use std::str::FromStr;
use std::sync::Arc;
extern crate hwloc;
use hwloc::{ObjectType, Topology};

fn init_logging(matches: &clap::ArgMatches) {
    if matches.is_present("debug") {
        simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Debug)
            .init()
            .unwrap();
    } else if matches.is_present("verbose") {
        simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Info)
            .init()
            .unwrap();
    }
}

fn run_ecm(matches: &clap::ArgMatches) {
    init_logging(matches);
    let n = match matches.value_of("number").map(Integer::from_str) {
        Some(Ok(n)) => n,
        _ => {
            println!("Wrong input");
            return;
        }
    };
    let b1: u64 = matches.value_of("b1_bound").and_then(|s| s.parse().ok()).unwrap_or(10000);
    let b2: u64 = matches.value_of("b2_bound").and_then(|s| s.parse().ok()).unwrap_or(100 * b1);
    let curves = Arc::new(matches.value_of("num_curves").and_then(|s| Integer::from_str(s).ok()));
    let sigma = matches.value_of("sigma").and_then(|s| Integer::from_str(s).ok());

    if matches.is_present("single_threaded") || sigma.is_some() {
        match ecm_singlethreaded(&n, &curves, b1, b2, &Arc::new(sigma)) {
            Ok(Some(f)) => println!("Found factor {}.", f),
            Ok(None) => println!("No factor found."),
            Err(e) => println!("Error: {}", e),
        }
    } else {
        let topology = Topology::new();
        let cores = topology.objects_with_type(&ObjectType::Core);
        let nthreads = cores.map(|c| c.len()).unwrap_or(1);
        info!("Found {} cores, spawning {} threads", nthreads, nthreads);
        match ecm_multithreaded(&n, &curves, b1, b2, &Arc::new(sigma), nthreads) {
            Some(f) => println!("Found factor {}.", f),
            None => println!("No factor found."),
        }
    }
}

fn run_factorize(matches: &clap::ArgMatches) {
    init_logging(matches);
    let n = match matches.value_of("number").map(Integer::from_str) {
        Some(Ok(n)) => n,
        _ => {
            println!("Wrong input");
            return;
        }
    };
    let witness_count: usize = matches.value_of("witnesses").and_then(|s| s.parse().ok()).unwrap_or(100);
    let witnesses = miller_rabin::witness_primes(witness_count);

    match driver::factorize(&n, &witnesses) {
        Ok((factors, unresolved)) => {
            let mut factors: Vec<_> = factors.into_iter().collect();
            factors.sort();
            for (p, e) in factors {
                println!("{}^{}", p, e);
            }
            let mut unresolved: Vec<_> = unresolved.into_iter().collect();
            unresolved.sort();
            for (c, e) in unresolved {
                println!("{}^{} (unresolved)", c, e);
            }
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn main() {
    let number_arg = Arg::new("number")
        .about("Number to factor")
        .takes_value(true)
        .short('n')
        .long("number")
        .required(true);
    let debug_arg = Arg::new("debug").about("Debug information").long("debug");
    let verbose_arg = Arg::new("verbose").about("Detailed execution").short('v').long("verbose");

    let matches = App::new("ECM Factorization")
        .version("1.0")
        .about("Factors integers using the Elliptic Curve Method")
        .subcommand(
            SubCommand::with_name("ecm")
                .about("Run a single ECM search (one or more curves) against a number")
                .arg(number_arg.clone())
                .arg(debug_arg.clone())
                .arg(verbose_arg.clone())
                .arg(Arg::new("num_curves").about("Number of curves to try out").takes_value(true).short('c').long("num_curves"))
                .arg(Arg::new("b1_bound").about("Stage 1 bound").takes_value(true).long("b1"))
                .arg(Arg::new("b2_bound").about("Stage 2 bound").takes_value(true).long("b2"))
                .arg(Arg::new("sigma").about("Curve's parameter").takes_value(true).short('s').long("sigma"))
                .arg(
                    Arg::new("single_threaded")
                        .about("Run on a single thread\nNote: the program is multi-threaded by default, using as many threads as there are cores available")
                        .long("single_threaded"),
                ),
        )
        .subcommand(
            SubCommand::with_name("factorize")
                .about("Fully factor a number: trial division, perfect powers, then escalating ECM")
                .arg(number_arg)
                .arg(debug_arg)
                .arg(verbose_arg)
                .arg(
                    Arg::new("witnesses")
                        .about("Number of Miller-Rabin witnesses used to confirm primality of the final factors")
                        .takes_value(true)
                        .long("witnesses"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("ecm", Some(sub)) => run_ecm(sub),
        ("factorize", Some(sub)) => run_factorize(sub),
        _ => println!("Run with `ecm` or `factorize`; see --help."),
    }
}
