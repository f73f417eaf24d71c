//! Multi-genome gene families under per-species copy-number quotas.
//!
//! Syntenic pairs from every genome comparison are merged greedily, strongest
//! synteny score first. A merge is refused when the joined family would hold
//! more copies of a species than its quota allows; genes sitting within
//! `tandem_nmax / 2` ranks of each other on one chromosome count once.

use crate::libs::cscore::{read_cscores, write_cscores, ScoredPair};
use crate::libs::error::SyntenyError;
use crate::libs::genes::GeneOrder;
use crate::libs::grouper::Grouper;
use crate::libs::params::Params;
use crate::libs::score::{read_synteny_scores, synteny_scores, write_synteny_scores, SyntenyRecord};
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

/// Expected copy number of each species.
#[derive(Clone, Debug)]
pub struct Quota {
    quota: BTreeMap<String, usize>,
}

impl Quota {
    /// Pairs `"a:b:c"` with `"4:1:2"` position by position.
    ///
    /// ```
    /// use synteny::libs::family::Quota;
    ///
    /// let quota = Quota::parse("grape:athaliana", "1:4").unwrap();
    /// assert_eq!(quota.get("athaliana"), Some(4));
    /// assert_eq!(quota.species(), vec!["athaliana", "grape"]);
    ///
    /// assert!(Quota::parse("grape:athaliana", "1").is_err());
    /// ```
    pub fn parse(species: &str, quota: &str) -> Result<Self, SyntenyError> {
        let species: Vec<&str> = species.split(':').filter(|s| !s.is_empty()).collect();
        let counts: Vec<&str> = quota.split(':').filter(|s| !s.is_empty()).collect();

        if species.is_empty() {
            return Err(SyntenyError::Config("no species given".to_string()));
        }
        if species.len() != counts.len() {
            return Err(SyntenyError::Config(format!(
                "{} species but {} quotas",
                species.len(),
                counts.len()
            )));
        }

        let mut map = BTreeMap::new();
        for (sp, count) in species.iter().zip(counts.iter()) {
            let n: usize = count
                .parse()
                .map_err(|_| SyntenyError::Config(format!("invalid quota {} for {}", count, sp)))?;
            if n == 0 {
                return Err(SyntenyError::Config(format!("quota of {} must be positive", sp)));
            }
            if map.insert(sp.to_string(), n).is_some() {
                return Err(SyntenyError::Config(format!("species {} given twice", sp)));
            }
        }

        Ok(Self { quota: map })
    }

    pub fn get(&self, species: &str) -> Option<usize> {
        self.quota.get(species).copied()
    }

    /// Species in sorted order.
    pub fn species(&self) -> Vec<&str> {
        self.quota.keys().map(|s| s.as_str()).collect()
    }

    /// Genome comparisons to read: every sorted pair `(a, b)` with `a < b`, and
    /// the self comparison `(a, a)` ahead of them when `a` expects duplicates.
    pub fn comparisons(&self) -> Vec<(String, String)> {
        let species = self.species();
        let mut comparisons = vec![];
        for (i, si) in species.iter().enumerate() {
            if self.quota[*si] > 1 {
                comparisons.push((si.to_string(), si.to_string()));
            }
            for sj in &species[i + 1..] {
                comparisons.push((si.to_string(), sj.to_string()));
            }
        }
        comparisons
    }
}

/// Where a gene sits: species, chromosome and rank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneLocus {
    pub species: String,
    pub chr: String,
    pub rank: i64,
}

/// Number of tandem-collapsed units of each species among `genes`.
///
/// Genes of one species on one chromosome within `tandem_nmax / 2` ranks are
/// one unit; they likely stem from a single duplication.
pub fn species_units<'g>(
    genes: impl IntoIterator<Item = &'g String>,
    loci: &HashMap<String, GeneLocus>,
    tandem_nmax: i64,
) -> HashMap<String, usize> {
    let members: Vec<&GeneLocus> = genes.into_iter().filter_map(|g| loci.get(g)).collect();

    let mut units = Grouper::new();
    for (i, gi) in members.iter().enumerate() {
        units.add(i);
        for (j, gj) in members.iter().enumerate().skip(i + 1) {
            if gi.species == gj.species
                && gi.chr == gj.chr
                && (gi.rank - gj.rank).abs() <= tandem_nmax / 2
            {
                units.join(i, j);
            }
        }
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for unit in units.groups() {
        *counts.entry(members[unit[0]].species.clone()).or_default() += 1;
    }
    counts
}

/// Whether two groups can become one family without breaking a quota.
pub fn mergeable(
    group1: &[String],
    group2: &[String],
    loci: &HashMap<String, GeneLocus>,
    quota: &Quota,
    tandem_nmax: i64,
) -> bool {
    species_units(group1.iter().chain(group2.iter()), loci, tandem_nmax)
        .iter()
        .all(|(sp, &count)| count <= quota.get(sp).unwrap_or(0))
}

/// Greedy family clustering. `pairs` are visited by descending synteny score;
/// equal scores keep their input order. A refused merge is never retried.
pub fn make_family(
    mut pairs: Vec<SyntenyRecord>,
    loci: &HashMap<String, GeneLocus>,
    quota: &Quota,
    params: &Params,
) -> Grouper<String> {
    log::info!("... gene family clustering started");
    let mut g = Grouper::new();

    pairs.sort_by(|a, b| b.synteny_score.total_cmp(&a.synteny_score));
    for pair in pairs {
        g.add(pair.gene_a.clone());
        g.add(pair.gene_b.clone());
        if g.joined(&pair.gene_a, &pair.gene_b) {
            continue;
        }

        let ok = match (g.group(&pair.gene_a), g.group(&pair.gene_b)) {
            (Some(group1), Some(group2)) => {
                mergeable(group1, group2, loci, quota, params.tandem_nmax)
            }
            _ => false,
        };
        if ok {
            g.join(pair.gene_a, pair.gene_b);
        }
    }

    g
}

/// Families with at least two genes; genes sorted in each, families sorted.
pub fn families(g: &Grouper<String>) -> Vec<Vec<String>> {
    g.groups()
        .filter(|f| f.len() > 1)
        .map(|f| f.iter().cloned().sorted().collect::<Vec<_>>())
        .sorted()
        .collect()
}

pub fn write_families(writer: &mut dyn Write, families: &[Vec<String>]) -> anyhow::Result<()> {
    for family in families {
        writeln!(writer, "{}", family.join(","))?;
    }
    Ok(())
}

/// Score rows whose two genes share a family, in family order.
pub fn filter_cscores(families: &[Vec<String>], pairs: &[ScoredPair]) -> Vec<ScoredPair> {
    let by_genes: IndexMap<(&str, &str), &ScoredPair> = pairs
        .iter()
        .map(|p| ((p.gene_a.as_str(), p.gene_b.as_str()), p))
        .collect();

    let mut filtered = vec![];
    for family in families {
        for (gi, gj) in family.iter().tuple_combinations() {
            for key in [(gi.as_str(), gj.as_str()), (gj.as_str(), gi.as_str())] {
                if let Some(&p) = by_genes.get(&key) {
                    filtered.push(p.clone());
                }
            }
        }
    }
    filtered
}

/// Outcome of the refinement loop.
#[derive(Debug)]
pub struct Refinement {
    pub families: Grouper<String>,
    /// Rounds run, the final non-improving one included
    pub iterations: usize,
    pub converged: bool,
}

/// Gene orders and quotas of one family run.
///
/// Expects `<data>/<species>.genes.filtered` for every species, and for each
/// comparison `<a>_<b>` a `.cscore` and a `.synteny_score` file.
pub struct FamilyBuilder<'a> {
    pub quota: &'a Quota,
    pub params: &'a Params,
    orders: BTreeMap<String, GeneOrder>,
    loci: HashMap<String, GeneLocus>,
}

impl<'a> FamilyBuilder<'a> {
    pub fn load(data_dir: &str, quota: &'a Quota, params: &'a Params) -> anyhow::Result<Self> {
        let mut orders = BTreeMap::new();
        for species in quota.species() {
            let path = genes_path(data_dir, species);
            orders.insert(species.to_string(), GeneOrder::from_file(&path)?);
        }
        Ok(Self::from_orders(orders, quota, params))
    }

    pub fn from_orders(
        orders: BTreeMap<String, GeneOrder>,
        quota: &'a Quota,
        params: &'a Params,
    ) -> Self {
        let mut loci = HashMap::new();
        for (species, order) in &orders {
            for (gene, (chr, rank)) in order.iter() {
                loci.insert(
                    gene.clone(),
                    GeneLocus {
                        species: species.clone(),
                        chr: chr.clone(),
                        rank: *rank,
                    },
                );
            }
        }

        for species in quota.species() {
            log::info!("{} {} copies", species, quota.get(species).unwrap_or(0));
        }

        Self {
            quota,
            params,
            orders,
            loci,
        }
    }

    /// Keeps pairs above the synteny cutoff whose genes are known.
    fn syntenic(&self, records: Vec<SyntenyRecord>, pairs: &mut Vec<SyntenyRecord>) {
        let mut skipped = 0;
        for record in records {
            if record.synteny_score < self.params.synteny_cutoff {
                continue;
            }
            if !self.loci.contains_key(&record.gene_a) || !self.loci.contains_key(&record.gene_b) {
                skipped += 1;
                continue;
            }
            pairs.push(record);
        }
        if skipped > 0 {
            log::debug!("{} pairs skipped, genes not in gene order", skipped);
        }
    }

    /// Syntenic pairs of every comparison, read from `dir`.
    pub fn read_pairs(&self, dir: &str) -> anyhow::Result<Vec<SyntenyRecord>> {
        let mut pairs = vec![];
        for (si, sj) in self.quota.comparisons() {
            let path = comparison_path(dir, &si, &sj, "synteny_score");
            let records = read_synteny_scores(&path, self.params.cscore_cutoff)?;
            self.syntenic(records, &mut pairs);
        }
        log::info!("{} syntenic pairs imported", pairs.len());
        Ok(pairs)
    }

    pub fn build(&self, pairs: Vec<SyntenyRecord>) -> Grouper<String> {
        make_family(pairs, &self.loci, self.quota, self.params)
    }

    /// Recomputes scores from the `<data>` c-scores of family members only,
    /// writing both files of each comparison into `<work>`.
    pub fn rescore(
        &self,
        data_dir: &str,
        work_dir: &str,
        families: &[Vec<String>],
    ) -> anyhow::Result<Vec<SyntenyRecord>> {
        let mut pairs = vec![];
        for (si, sj) in self.quota.comparisons() {
            let cscores = read_cscores(&comparison_path(data_dir, &si, &sj, "cscore"))?;
            let filtered = filter_cscores(families, &cscores);

            let out = comparison_path(work_dir, &si, &sj, "cscore");
            log::info!("Make refined scores {}", out);
            let mut writer = intspan::writer(&out);
            write_cscores(&mut writer, &filtered)?;

            let records = synteny_scores(&filtered, &self.orders[&si], &self.orders[&sj], self.params)?;
            let out = comparison_path(work_dir, &si, &sj, "synteny_score");
            let mut writer = intspan::writer(&out);
            write_synteny_scores(&mut writer, &records)?;
            log::info!("synteny score written to {}", out);

            self.syntenic(records, &mut pairs);
        }
        log::info!("{} syntenic pairs imported", pairs.len());
        Ok(pairs)
    }

    /// Rebuilds families from their own members until the number of groups
    /// stops shrinking or `params.max_iter` rounds have run.
    ///
    /// `on_improve` sees the families of every round that shrank the count;
    /// the last of them is the result.
    pub fn refine<F>(
        &self,
        data_dir: &str,
        work_dir: &str,
        initial: Grouper<String>,
        mut on_improve: F,
    ) -> anyhow::Result<Refinement>
    where
        F: FnMut(&[Vec<String>]) -> anyhow::Result<()>,
    {
        let mut best = initial;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.params.max_iter {
            iterations += 1;
            log::info!("=== Refinement iteration {} ===", iterations);

            let pairs = self.rescore(data_dir, work_dir, &families(&best))?;
            let g = self.build(pairs);
            if g.len() >= best.len() {
                converged = true;
                break;
            }
            on_improve(&families(&g))?;
            best = g;
        }

        if !converged {
            log::warn!(
                "refinement did not converge after {} iterations, keeping the last result",
                iterations
            );
        }

        Ok(Refinement {
            families: best,
            iterations,
            converged,
        })
    }
}

pub fn genes_path(dir: &str, species: &str) -> String {
    Path::new(dir)
        .join(format!("{}.genes.filtered", species))
        .to_string_lossy()
        .to_string()
}

pub fn comparison_path(dir: &str, species1: &str, species2: &str, ext: &str) -> String {
    Path::new(dir)
        .join(format!("{}_{}.{}", species1, species2, ext))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locus(species: &str, chr: &str, rank: i64) -> GeneLocus {
        GeneLocus {
            species: species.to_string(),
            chr: chr.to_string(),
            rank,
        }
    }

    fn genes(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn record(a: &str, b: &str, s: f64) -> SyntenyRecord {
        SyntenyRecord {
            gene_a: a.to_string(),
            gene_b: b.to_string(),
            cscore: 1.0,
            synteny_score: s,
        }
    }

    fn test_loci() -> HashMap<String, GeneLocus> {
        let mut loci = HashMap::new();
        loci.insert("x1".to_string(), locus("X", "chr1", 0));
        loci.insert("x2".to_string(), locus("X", "chr1", 50));
        loci.insert("x3".to_string(), locus("X", "chr2", 0));
        loci.insert("x4".to_string(), locus("X", "chr1", 3));
        loci.insert("y1".to_string(), locus("Y", "chrA", 0));
        loci.insert("y2".to_string(), locus("Y", "chrA", 40));
        loci
    }

    #[test]
    fn test_quota_parse() {
        let quota = Quota::parse("b:a", "1:2").unwrap();
        assert_eq!(quota.species(), vec!["a", "b"]);
        assert_eq!(quota.get("a"), Some(2));
        assert_eq!(quota.get("b"), Some(1));
        assert_eq!(
            quota.comparisons(),
            vec![
                ("a".to_string(), "a".to_string()),
                ("a".to_string(), "b".to_string())
            ]
        );

        assert!(matches!(Quota::parse("a:b", "1:2:3"), Err(SyntenyError::Config(_))));
        assert!(matches!(Quota::parse("a:b", "1:x"), Err(SyntenyError::Config(_))));
        assert!(matches!(Quota::parse("a:b", "1:0"), Err(SyntenyError::Config(_))));
        assert!(matches!(Quota::parse("a:a", "1:1"), Err(SyntenyError::Config(_))));
    }

    #[test]
    fn test_mergeable_quota() {
        let loci = test_loci();
        let quota = Quota::parse("X:Y", "2:1").unwrap();

        // X already has two units, a third one is refused
        assert!(!mergeable(&genes(&["x1", "x2", "y1"]), &genes(&["x3"]), &loci, &quota, 10));
        // x4 is a tandem neighbor of x1 and counts with it
        assert!(mergeable(&genes(&["x1", "x2", "y1"]), &genes(&["x4"]), &loci, &quota, 10));
        // with a narrower tandem window it becomes a unit of its own
        assert!(!mergeable(&genes(&["x1", "x2", "y1"]), &genes(&["x4"]), &loci, &quota, 4));
        // two Y copies
        assert!(!mergeable(&genes(&["x1", "y1"]), &genes(&["y2"]), &loci, &quota, 10));
    }

    #[test]
    fn test_make_family() {
        let loci = test_loci();
        let quota = Quota::parse("X:Y", "2:1").unwrap();
        let params = Params::default();

        let pairs = vec![
            record("x1", "y1", 3.0),
            record("x3", "y1", 2.0),
            record("x2", "y1", 4.0),
            record("x3", "y2", 1.8),
        ];
        let g = make_family(pairs, &loci, &quota, &params);

        // x2-y1 and x1-y1 come first; x3 would be a third X unit
        let fams = families(&g);
        assert_eq!(fams, vec![genes(&["x1", "x2", "y1"]), genes(&["x3", "y2"])]);
        assert_eq!(g.len(), 2);

        for family in &fams {
            for (sp, count) in species_units(family, &loci, params.tandem_nmax) {
                assert!(count <= quota.get(&sp).unwrap());
            }
        }
    }

    #[test]
    fn test_ties_keep_input_order() {
        let loci = test_loci();
        let quota = Quota::parse("X:Y", "1:1").unwrap();
        let params = Params::default();

        let g = make_family(
            vec![record("x2", "y1", 2.0), record("x1", "y1", 2.0)],
            &loci,
            &quota,
            &params,
        );
        assert_eq!(families(&g), vec![genes(&["x2", "y1"])]);

        let g = make_family(
            vec![record("x1", "y1", 2.0), record("x2", "y1", 2.0)],
            &loci,
            &quota,
            &params,
        );
        assert_eq!(families(&g), vec![genes(&["x1", "y1"])]);
    }

    #[test]
    fn test_filter_cscores() {
        let pair = |a: &str, b: &str| ScoredPair {
            gene_a: a.to_string(),
            gene_b: b.to_string(),
            raw_score: 10.0,
            cscore: 1.0,
        };
        let pairs = vec![pair("x1", "y1"), pair("y2", "x2"), pair("x1", "y2"), pair("x3", "y1")];
        let fams = vec![genes(&["x1", "y1"]), genes(&["x2", "y2"])];

        let filtered = filter_cscores(&fams, &pairs);
        assert_eq!(filtered, vec![pair("x1", "y1"), pair("y2", "x2")]);
    }

    // a1..a3 are collinear with b1..b3; a9 sits on another chromosome and its
    // strong score with b2 blocks the a2-b2 merge until refinement drops it
    fn write_noisy_data(dir: &Path) -> anyhow::Result<()> {
        std::fs::write(
            dir.join("sp1.genes.filtered"),
            "\
chr1\ta1\t1\t2\t10\ta1\tchr1:00000
chr1\ta2\t3\t4\t10\ta2\tchr1:00001
chr1\ta3\t5\t6\t10\ta3\tchr1:00002
chr9\ta9\t1\t2\t10\ta9\tchr9:00000
",
        )?;
        std::fs::write(
            dir.join("sp2.genes.filtered"),
            "\
ctgA\tb1\t1\t2\t10\tb1\tctgA:00000
ctgA\tb2\t3\t4\t10\tb2\tctgA:00001
ctgA\tb3\t5\t6\t10\tb3\tctgA:00002
",
        )?;
        std::fs::write(
            dir.join("sp1_sp2.cscore"),
            "a1\tb1\t100.0\t1.000\na2\tb2\t100.0\t1.000\na3\tb3\t100.0\t1.000\na9\tb2\t90.0\t0.900\n",
        )?;
        std::fs::write(
            dir.join("sp1_sp2.synteny_score"),
            "a9\tb2\t0.900\t5.000\na1\tb1\t1.000\t3.000\na2\tb2\t1.000\t3.000\na3\tb3\t1.000\t3.000\n",
        )?;
        Ok(())
    }

    #[test]
    fn test_refine_improves_then_converges() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let data = temp.path().join("data");
        let work = temp.path().join("work");
        std::fs::create_dir_all(&data)?;
        std::fs::create_dir_all(&work)?;
        write_noisy_data(&data)?;
        let data = data.to_string_lossy().to_string();
        let work = work.to_string_lossy().to_string();

        let quota = Quota::parse("sp1:sp2", "1:1")?;
        let params = Params::default();
        let builder = FamilyBuilder::load(&data, &quota, &params)?;
        let initial = builder.build(builder.read_pairs(&data)?);

        // a2 is left alone
        assert_eq!(initial.len(), 4);
        assert_eq!(
            families(&initial),
            vec![genes(&["a1", "b1"]), genes(&["a3", "b3"]), genes(&["a9", "b2"])]
        );

        let mut improved = vec![];
        let result = builder.refine(&data, &work, initial.clone(), |fams| {
            improved.push(fams.to_vec());
            Ok(())
        })?;

        assert!(result.converged);
        assert_eq!(result.iterations, 2);
        assert_eq!(improved, vec![vec![genes(&["a1", "b1"]), genes(&["a3", "b3"])]]);
        assert_eq!(result.families.len(), 2);
        assert_eq!(families(&result.families), improved[0]);

        let refined = std::fs::read_to_string(comparison_path(&work, "sp1", "sp2", "cscore"))?;
        assert_eq!(refined, "a1\tb1\t100.0\t1.000\na3\tb3\t100.0\t1.000\n");

        // capped after the first, improving, round
        let params = Params {
            max_iter: 1,
            ..Params::default()
        };
        let builder = FamilyBuilder::load(&data, &quota, &params)?;
        let mut rounds = 0;
        let result = builder.refine(&data, &work, initial, |_| {
            rounds += 1;
            Ok(())
        })?;

        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(rounds, 1);
        assert_eq!(result.families.len(), 2);

        Ok(())
    }

    #[test]
    fn test_write_families() {
        let mut buf: Vec<u8> = vec![];
        write_families(&mut buf, &[genes(&["a", "b"]), genes(&["c", "d", "e"])]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a,b\nc,d,e\n");
    }
}
