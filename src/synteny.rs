extern crate clap;
use clap::*;

mod cmd_synteny;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let app = Command::new("synteny")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`synteny` - Syntenic anchors, collinear blocks and quota gene families")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_synteny::cscore::make_subcommand())
        .subcommand(cmd_synteny::score::make_subcommand())
        .subcommand(cmd_synteny::cluster::make_subcommand())
        .subcommand(cmd_synteny::merge::make_subcommand())
        .subcommand(cmd_synteny::family::make_subcommand())
        .after_help(
            r###"Subcommands, in pipeline order:

* cscore  - Reciprocal-best-hit filtering of pairwise hits
* score   - Synteny score from the density of nearby anchors
* cluster - Single-linkage collinear blocks
* merge   - Stitch blocks split by inversions
* family  - Multi-genome gene families under copy-number quotas

Logging goes to stderr; set RUST_LOG=debug for more detail.

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("cscore", sub_matches)) => cmd_synteny::cscore::execute(sub_matches),
        Some(("score", sub_matches)) => cmd_synteny::score::execute(sub_matches),
        Some(("cluster", sub_matches)) => cmd_synteny::cluster::execute(sub_matches),
        Some(("merge", sub_matches)) => cmd_synteny::merge::execute(sub_matches),
        Some(("family", sub_matches)) => cmd_synteny::family::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
