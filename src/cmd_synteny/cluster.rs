use clap::*;
use synteny::libs::genes::GeneOrder;
use synteny::libs::linkage::{cluster_points, collect_points};
use synteny::libs::score::read_synteny_scores;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("cluster")
        .about("Single-linkage clustering of syntenic anchors into collinear blocks")
        .after_help(
            r###"
Pairs with synteny_score >= --synteny-cutoff are placed on the rank grid of
their chromosome pair. Two anchors are linked when
|dx| + |dy| <= --nmax; linked groups of at least --min-size anchors are
reported. A score of "n.a." is read as --cscore-cutoff.

For a self comparison (same genes file twice) only the lower triangle is used.

Output:
  # cluster score <sum of synteny scores>
  chr1 pos1 chr2 pos2 synteny_score
  ...

Examples:
  synteny cluster data/athaliana.genes.filtered data/grape.genes.filtered \
      data/athaliana_grape.synteny_score -o data/athaliana_grape.cluster

"###,
        )
        .arg(
            Arg::new("genes1")
                .required(true)
                .index(1)
                .help("Gene order of the first genome"),
        )
        .arg(
            Arg::new("genes2")
                .required(true)
                .index(2)
                .help("Gene order of the second genome"),
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(3)
                .help("The .synteny_score file"),
        )
        .arg(super::arg_nmax())
        .arg(super::arg_min_size())
        .arg(super::arg_synteny_cutoff())
        .arg(super::arg_cscore_cutoff())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let params = super::params_from_args(args)?;
    let genes1_file = args.get_one::<String>("genes1").unwrap();
    let genes2_file = args.get_one::<String>("genes2").unwrap();
    let infile = args.get_one::<String>("infile").unwrap();

    let self_match = genes1_file == genes2_file;
    if self_match {
        log::info!("comparing self");
    }
    let genes1 = GeneOrder::from_file(genes1_file)?;
    let genes2 = if self_match {
        genes1.clone()
    } else {
        GeneOrder::from_file(genes2_file)?
    };

    let records = read_synteny_scores(infile, params.cscore_cutoff)?;
    let points = collect_points(
        &records,
        &genes1,
        &genes2,
        self_match,
        params.synteny_cutoff,
    );
    let clusters = cluster_points(points, params.nmax, params.min_cluster_size);

    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    for cluster in &clusters {
        cluster.write(&mut writer, "cluster")?;
    }
    log::info!("{} clusters found", clusters.len());

    Ok(())
}
