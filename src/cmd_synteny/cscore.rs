use clap::*;
use synteny::libs::cscore::{cscore_pairs, read_hits, write_cscores, HitPool, HitReduction, HitResolver};
use synteny::libs::genes::GeneOrder;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("cscore")
        .about("Filter pairwise hits by c-score, a continuous reciprocal-best-hit measure")
        .after_help(
            r###"
c-score = score(a, b) / max(best(a), best(b))

best(x) is the highest score of x against any partner, in either direction.
Mutual best hits get 1.

Processing:
  1. Hit ids are mapped onto tandem representatives; unknown genes and hits
     collapsing onto one representative are dropped.
  2. Each query keeps its best target (or every target with --all-targets).
  3. One row per gene pair is written, sorted, when c-score >= cutoff.

Give the same genes file twice for a self comparison.

Input:
  * genes files: chr gene start stop size tandem_rep chr:rank
  * hit files: query target ... bitscore (tabular BLAST/LAST output)

Output:
  gene_a gene_b raw_score cscore

Examples:
  synteny cscore data/athaliana.genes.filtered data/grape.genes.filtered \
      athaliana_grape.blastp grape_athaliana.blastp -o data/athaliana_grape.cscore

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
            Arg::new("hits")
                .required(true)
                .num_args(1..=2)
                .index(3)
                .help("Hit files, one per direction"),
        )
        .arg(
            Arg::new("all_targets")
                .long("all-targets")
                .action(ArgAction::SetTrue)
                .help("Keep every target of a query, not only the best one"),
        )
        .arg(
            Arg::new("isoform")
                .long("isoform")
                .action(ArgAction::SetTrue)
                .help("Strip splice-variant suffixes from hit ids"),
        )
        .arg(super::arg_cscore_cutoff())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let params = super::params_from_args(args)?;
    let genes1_file = args.get_one::<String>("genes1").unwrap();
    let genes2_file = args.get_one::<String>("genes2").unwrap();
    let reduction = if args.get_flag("all_targets") {
        HitReduction::AllTargets
    } else {
        HitReduction::BestTarget
    };

    //----------------------------
    // Load
    //----------------------------
    let self_match = genes1_file == genes2_file;
    let genes1 = GeneOrder::from_file(genes1_file)?;
    let genes2 = if self_match {
        genes1.clone()
    } else {
        GeneOrder::from_file(genes2_file)?
    };

    let resolver = HitResolver {
        genes1: &genes1,
        genes2: &genes2,
        self_match,
        isoform: args.get_flag("isoform"),
    };

    let mut pool = HitPool::new(reduction);
    for infile in args.get_many::<String>("hits").unwrap() {
        read_hits(infile, &resolver, &mut pool)?;
    }
    log::info!("{} records read", pool.len());

    //----------------------------
    // Output
    //----------------------------
    let pairs = cscore_pairs(&pool, &resolver, params.cscore_cutoff);
    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    write_cscores(&mut writer, &pairs)?;
    log::info!("{} pairs written", pairs.len());

    Ok(())
}
