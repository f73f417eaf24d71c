use clap::*;
use synteny::libs::cscore::read_cscores;
use synteny::libs::error::SyntenyError;
use synteny::libs::genes::GeneOrder;
use synteny::libs::score::{synteny_scores, write_synteny_scores};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("score")
        .about("Synteny score of each pair from the anchors around it")
        .after_help(
            r###"
Pairs are placed on the rank grid of their chromosome pair. For each anchor
the nearest neighbors within --nmax are split into four quadrants, each
neighbor adding w(d) * cscore to its quadrant:

    synteny_score = cscore + max(Q1, Q2, Q3, Q4)

w(d) = 2 * (1 - Phi(d; 0, nmax / 2)) decays with distance. Neighbors on the
same row or column as the anchor (tandem copies) are ignored.

Output:
  gene_a gene_b cscore synteny_score

Examples:
  synteny score data/athaliana.genes.filtered data/grape.genes.filtered \
      data/athaliana_grape.cscore -o data/athaliana_grape.synteny_score

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
                .help("The .cscore file"),
        )
        .arg(super::arg_nmax())
        .arg(super::arg_metric())
        .arg(super::arg_neighbors())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let params = super::params_from_args(args)?;
    let genes1_file = args.get_one::<String>("genes1").unwrap();
    let genes2_file = args.get_one::<String>("genes2").unwrap();
    let infile = args.get_one::<String>("infile").unwrap();

    let genes1 = GeneOrder::from_file(genes1_file)?;
    let genes2 = if genes1_file == genes2_file {
        genes1.clone()
    } else {
        GeneOrder::from_file(genes2_file)?
    };

    let pairs = read_cscores(infile)?;
    if pairs.is_empty() {
        return Err(SyntenyError::EmptyInput(infile.to_string()).into());
    }

    let records = synteny_scores(&pairs, &genes1, &genes2, &params)?;

    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    write_synteny_scores(&mut writer, &records)?;
    log::info!("synteny score written ({} pairs)", records.len());

    Ok(())
}
