use anyhow::Context;
use clap::*;
use std::path::Path;
use synteny::libs::error::SyntenyError;
use synteny::libs::family::{families, write_families, FamilyBuilder, Quota};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("family")
        .about("Build multi-genome gene families that respect copy-number quotas")
        .after_help(
            r###"
Syntenic pairs of every genome comparison are merged into families, strongest
synteny score first. A merge is refused when a species would exceed its quota;
genes of one species within --tandem-nmax / 2 ranks on a chromosome count once.

Files read from --data, species sorted, a < b:
  * <species>.genes.filtered
  * <a>_<b>.synteny_score, and <a>_<a>.synteny_score when quota(a) > 1
  * <a>_<b>.cscore (with --refine)

Quotas pair with species position by position, in the order given to
--species; the list is not sorted first. `-s grape:athaliana -q 1:4` gives
athaliana four copies and grape one.

--refine rebuilds the scores from family members only, writing them into
--work, and repeats until the number of gene groups stops shrinking.

Output:
  one family per line, comma separated gene ids

Examples:
  synteny family -s athaliana:grape -q 4:1 -o quota_family
  synteny family -s athaliana:grape:papaya:poplar -q 4:1:1:2 --refine -o quota_family

"###,
        )
        .arg(
            Arg::new("species")
                .long("species")
                .short('s')
                .num_args(1)
                .default_value("all")
                .help("Species separated by ':'; [all] for every genes file in --data"),
        )
        .arg(
            Arg::new("quota")
                .long("quota")
                .short('q')
                .num_args(1)
                .required(true)
                .help("Expected gene copies per species, in the order of --species"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .num_args(1)
                .default_value("data")
                .help("Directory of gene orders and scores"),
        )
        .arg(
            Arg::new("work")
                .long("work")
                .num_args(1)
                .default_value("work")
                .help("Directory for refined scores, distinct from --data"),
        )
        .arg(
            Arg::new("refine")
                .long("refine")
                .short('r')
                .action(ArgAction::SetTrue)
                .help("Recompute scores from family members until convergence"),
        )
        .arg(super::arg_tandem_nmax())
        .arg(super::arg_synteny_cutoff())
        .arg(super::arg_cscore_cutoff())
        .arg(super::arg_nmax())
        .arg(super::arg_metric())
        .arg(super::arg_neighbors())
        .arg(super::arg_max_iter())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let params = super::params_from_args(args)?;
    let data_dir = args.get_one::<String>("data").unwrap();
    let work_dir = args.get_one::<String>("work").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();
    let is_refine = args.get_flag("refine");

    let species = match args.get_one::<String>("species").unwrap().as_str() {
        "all" => list_species(data_dir)?.join(":"),
        s => s.to_string(),
    };
    let quota = Quota::parse(&species, args.get_one::<String>("quota").unwrap())?;

    if is_refine && same_dir(data_dir, work_dir) {
        return Err(SyntenyError::Config(format!(
            "work directory must differ from data directory {}",
            data_dir
        ))
        .into());
    }

    //----------------------------
    // Families
    //----------------------------
    let builder = FamilyBuilder::load(data_dir, &quota, &params)?;
    let pairs = builder.read_pairs(data_dir)?;
    let g = builder.build(pairs);

    let save = |fams: &[Vec<String>]| -> anyhow::Result<()> {
        let mut writer = intspan::writer(outfile);
        write_families(&mut writer, fams)?;
        log::info!("{} gene families written to {}", fams.len(), outfile);
        Ok(())
    };

    if !is_refine {
        return save(&families(&g));
    }

    //----------------------------
    // Refinement
    //----------------------------
    std::fs::create_dir_all(work_dir)
        .with_context(|| format!("could not create {}", work_dir))?;

    let to_screen = outfile == "stdout";
    if !to_screen {
        save(&families(&g))?;
    }

    let result = builder.refine(data_dir, work_dir, g, |fams| {
        if to_screen {
            Ok(())
        } else {
            save(fams)
        }
    })?;
    log::info!(
        "refinement stopped after {} iterations ({} gene groups)",
        result.iterations,
        result.families.len()
    );

    if to_screen {
        save(&families(&result.families))?;
    }

    Ok(())
}

// Species with a <species>.genes.filtered file in `dir`, sorted
fn list_species(dir: &str) -> anyhow::Result<Vec<String>> {
    let mut species = vec![];
    for entry in std::fs::read_dir(dir).with_context(|| format!("could not read {}", dir))? {
        let name = entry?.file_name().to_string_lossy().to_string();
        if let Some(sp) = name.strip_suffix(".genes.filtered") {
            species.push(sp.to_string());
        }
    }
    species.sort();
    Ok(species)
}

fn same_dir(a: &str, b: &str) -> bool {
    if Path::new(a) == Path::new(b) {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
