use clap::*;
use synteny::libs::linkage::{read_clusters, recursive_merge_clusters};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("merge")
        .about("Merge collinear blocks split by inversions")
        .after_help(
            r###"
Two blocks on the same chromosome pair merge when the gap between their
extremes is at most --nmax on the x axis and the x and y gaps together stay
within --nmax. Rounds repeat until nothing merges.

Input is a .cluster file; output has the same shape with
"# mergedcluster score" headers.

Examples:
  synteny merge data/athaliana_grape.cluster -o data/athaliana_grape.mergedcluster

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("The .cluster file"),
        )
        .arg(super::arg_nmax())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let params = super::params_from_args(args)?;
    let infile = args.get_one::<String>("infile").unwrap();

    let mut clusters = read_clusters(infile)?;
    let chain = recursive_merge_clusters(&mut clusters, params.nmax);
    log::info!("{} clusters merged into {} blocks", clusters.len(), chain.len());

    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    for c in chain {
        clusters[c].write(&mut writer, "mergedcluster")?;
    }

    Ok(())
}
