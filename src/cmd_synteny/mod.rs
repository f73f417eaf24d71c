//! Subcommand modules for the `synteny` binary.

pub mod cluster;
pub mod cscore;
pub mod family;
pub mod merge;
pub mod score;

use clap::{Arg, ArgMatches};
use synteny::libs::params::{Metric, Params};

pub fn arg_outfile() -> Arg {
    Arg::new("outfile")
        .long("outfile")
        .short('o')
        .num_args(1)
        .default_value("stdout")
        .help("Output filename. [stdout] for screen")
}

pub fn arg_nmax() -> Arg {
    Arg::new("nmax")
        .long("nmax")
        .num_args(1)
        .default_value("40")
        .value_parser(clap::value_parser!(i64))
        .help("Max distance between two chained anchors, in ranks")
}

pub fn arg_tandem_nmax() -> Arg {
    Arg::new("tandem_nmax")
        .long("tandem-nmax")
        .num_args(1)
        .default_value("10")
        .value_parser(clap::value_parser!(i64))
        .help("Genes closer than half this rank distance count as one copy")
}

pub fn arg_min_size() -> Arg {
    Arg::new("min_size")
        .long("min-size")
        .short('n')
        .num_args(1)
        .default_value("3")
        .value_parser(clap::value_parser!(usize))
        .help("Minimum number of anchors in a reported cluster")
}

pub fn arg_cscore_cutoff() -> Arg {
    Arg::new("cscore_cutoff")
        .long("cscore-cutoff")
        .num_args(1)
        .default_value("0.2")
        .value_parser(clap::value_parser!(f64))
        .help("Minimum c-score of a pair")
}

pub fn arg_synteny_cutoff() -> Arg {
    Arg::new("synteny_cutoff")
        .long("synteny-cutoff")
        .num_args(1)
        .default_value("1.5")
        .value_parser(clap::value_parser!(f64))
        .help("Minimum synteny score of a pair")
}

pub fn arg_metric() -> Arg {
    Arg::new("metric")
        .long("metric")
        .short('p')
        .num_args(1)
        .default_value("2")
        .value_parser(clap::value_parser!(u8))
        .help("Distance function: 1. Manhattan; 2. Euclidean")
}

pub fn arg_neighbors() -> Arg {
    Arg::new("neighbors")
        .long("neighbors")
        .short('k')
        .num_args(1)
        .default_value("64")
        .value_parser(clap::value_parser!(usize))
        .help("Neighbors looked up per anchor, itself included")
}

pub fn arg_max_iter() -> Arg {
    Arg::new("max_iter")
        .long("max-iter")
        .num_args(1)
        .default_value("100")
        .value_parser(clap::value_parser!(usize))
        .help("Upper bound on refinement rounds")
}

/// Builds `Params` from whichever tunables the subcommand declares.
pub fn params_from_args(args: &ArgMatches) -> anyhow::Result<Params> {
    let mut params = Params::default();

    if let Ok(Some(v)) = args.try_get_one::<i64>("nmax") {
        params.nmax = *v;
    }
    if let Ok(Some(v)) = args.try_get_one::<i64>("tandem_nmax") {
        params.tandem_nmax = *v;
    }
    if let Ok(Some(v)) = args.try_get_one::<usize>("min_size") {
        params.min_cluster_size = *v;
    }
    if let Ok(Some(v)) = args.try_get_one::<f64>("cscore_cutoff") {
        params.cscore_cutoff = *v;
    }
    if let Ok(Some(v)) = args.try_get_one::<f64>("synteny_cutoff") {
        params.synteny_cutoff = *v;
    }
    if let Ok(Some(v)) = args.try_get_one::<u8>("metric") {
        params.metric = Metric::from_p(*v)?;
    }
    if let Ok(Some(v)) = args.try_get_one::<usize>("neighbors") {
        params.k = *v;
    }
    if let Ok(Some(v)) = args.try_get_one::<usize>("max_iter") {
        params.max_iter = *v;
    }

    params.validate()?;
    Ok(params)
}
