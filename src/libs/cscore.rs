//! Reciprocal-best-hit filtering.
//!
//! The c-score of a hit generalizes the mutual best hit:
//!
//! ```text
//! cscore(a, b) = score(a, b) / max(best(a), best(b))
//! ```
//!
//! where `best(x)` is the highest score of `x` against any partner, in either
//! direction. Mutual best hits get 1; lower values mean one side has a
//! stronger alternative elsewhere.

use crate::libs::error::SyntenyError;
use crate::libs::genes::{gene_name, GeneOrder};
use crate::libs::io::parse_score;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::io::Write;

/// How many targets a source gene keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitReduction {
    /// Only the highest scoring target; the first one seen wins ties
    BestTarget,
    /// Every target, each with its best score
    AllTargets,
}

/// A pair of genes with its raw alignment score and c-score.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredPair {
    pub gene_a: String,
    pub gene_b: String,
    pub raw_score: f64,
    pub cscore: f64,
}

impl ScoredPair {
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{:.1}\t{:.3}",
            self.gene_a, self.gene_b, self.raw_score, self.cscore
        )
    }
}

/// Directed hits after reduction, keyed by source gene.
#[derive(Clone, Debug)]
pub struct HitPool {
    reduction: HitReduction,
    targets: IndexMap<String, IndexMap<String, f64>>,
}

impl HitPool {
    pub fn new(reduction: HitReduction) -> Self {
        Self {
            reduction,
            targets: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, gene_a: &str, gene_b: &str, score: f64) {
        let targets = self.targets.entry(gene_a.to_string()).or_default();

        match self.reduction {
            HitReduction::AllTargets => {
                let entry = targets.entry(gene_b.to_string()).or_insert(score);
                if score > *entry {
                    *entry = score;
                }
            }
            HitReduction::BestTarget => {
                let best = targets.values().next().copied();
                if best.map_or(true, |best| score > best) {
                    targets.clear();
                    targets.insert(gene_b.to_string(), score);
                }
            }
        }
    }

    /// Number of source genes.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Iterates over `(source, target, score)`.
    pub fn hits(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.targets.iter().flat_map(|(a, targets)| {
            targets
                .iter()
                .map(move |(b, &score)| (a.as_str(), b.as_str(), score))
        })
    }

    /// The best score of every gene against any partner, in either direction.
    pub fn best_scores(&self) -> HashMap<&str, f64> {
        let mut best: HashMap<&str, f64> = HashMap::new();
        for (a, b, score) in self.hits() {
            for gene in [a, b] {
                let entry = best.entry(gene).or_insert(score);
                if score > *entry {
                    *entry = score;
                }
            }
        }
        best
    }

    /// One `ScoredPair` per undirected pair with `cscore >= cutoff`.
    ///
    /// A pair seen in both directions takes the larger raw score. Genes of a
    /// pair are ordered by name; callers orient them afterwards.
    pub fn score(&self, cutoff: f64) -> Vec<ScoredPair> {
        let best = self.best_scores();

        let mut raw: IndexMap<(&str, &str), f64> = IndexMap::new();
        for (a, b, score) in self.hits() {
            let key = if a <= b { (a, b) } else { (b, a) };
            let entry = raw.entry(key).or_insert(score);
            if score > *entry {
                *entry = score;
            }
        }

        let mut pairs = vec![];
        for ((a, b), raw_score) in raw {
            if raw_score <= 0.0 {
                continue;
            }
            let denom = best[a].max(best[b]);
            let cscore = raw_score / denom;
            if cscore < cutoff {
                continue;
            }
            pairs.push(ScoredPair {
                gene_a: a.to_string(),
                gene_b: b.to_string(),
                raw_score,
                cscore,
            });
        }
        pairs
    }
}

/// Maps hit ids onto tandem representatives of two genomes.
///
/// For a self comparison pass the same table twice and `self_match = true`.
pub struct HitResolver<'a> {
    pub genes1: &'a GeneOrder,
    pub genes2: &'a GeneOrder,
    pub self_match: bool,
    pub isoform: bool,
}

impl<'a> HitResolver<'a> {
    /// Representatives of a hit, in hit direction. `None` when either gene is
    /// unknown, both sit in the same genome of a cross comparison, or they
    /// collapse into the same representative.
    pub fn resolve(&self, query: &str, target: &str) -> Option<(&'a str, &'a str)> {
        let (query, target) = if self.isoform {
            (gene_name(query), gene_name(target))
        } else {
            (query, target)
        };

        let pair = if self.self_match {
            match (
                self.genes1.representative(query),
                self.genes1.representative(target),
            ) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            }
        } else {
            match (
                self.genes1.representative(query),
                self.genes2.representative(target),
            ) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => match (
                    self.genes2.representative(query),
                    self.genes1.representative(target),
                ) {
                    (Some(a), Some(b)) => Some((a, b)),
                    _ => None,
                },
            }
        };

        pair.filter(|(a, b)| a != b)
    }

    /// Puts `gene_a` on the first genome; for self comparisons `gene_a` is
    /// the one with the smaller locus.
    pub fn orient(&self, mut pair: ScoredPair) -> Option<ScoredPair> {
        let swap = if self.self_match {
            let la = self.genes1.locus(&pair.gene_a)?;
            let lb = self.genes1.locus(&pair.gene_b)?;
            la > lb
        } else if self.genes1.contains(&pair.gene_a) && self.genes2.contains(&pair.gene_b) {
            false
        } else if self.genes2.contains(&pair.gene_a) && self.genes1.contains(&pair.gene_b) {
            true
        } else {
            return None;
        };

        if swap {
            std::mem::swap(&mut pair.gene_a, &mut pair.gene_b);
        }
        Some(pair)
    }
}

/// Loads a tabular hit file (query, target, ..., bitscore) into `pool`.
///
/// Returns `(lines read, hits kept)`.
pub fn read_hits(
    path: &str,
    resolver: &HitResolver,
    pool: &mut HitPool,
) -> anyhow::Result<(usize, usize)> {
    let mut lines = 0;
    let mut kept = 0;

    for record in crate::libs::io::data_lines(path)? {
        let (line_no, fields) = record?;
        lines += 1;
        if lines % 100_000 == 0 {
            log::debug!("{} read...", lines);
        }

        if fields.len() < 3 {
            return Err(SyntenyError::parse(
                path,
                line_no,
                format!("expected at least 3 fields, found {}", fields.len()),
            )
            .into());
        }
        let score = parse_score(path, line_no, &fields[fields.len() - 1])?;

        if let Some((a, b)) = resolver.resolve(&fields[0], &fields[1]) {
            pool.insert(a, b, score);
            kept += 1;
        }
    }

    if lines == 0 {
        return Err(SyntenyError::EmptyInput(path.to_string()).into());
    }
    log::info!("Read hit file {} (total {} lines, {} kept)", path, lines, kept);

    Ok((lines, kept))
}

/// Orients, sorts by `(gene_a, gene_b)` and returns the pairs of `pool`.
pub fn cscore_pairs(pool: &HitPool, resolver: &HitResolver, cutoff: f64) -> Vec<ScoredPair> {
    let mut pairs: Vec<ScoredPair> = pool
        .score(cutoff)
        .into_iter()
        .filter_map(|p| resolver.orient(p))
        .collect();
    pairs.sort_by(|x, y| (&x.gene_a, &x.gene_b).cmp(&(&y.gene_a, &y.gene_b)));
    pairs
}

/// Reads a `.cscore` file: `gene_a gene_b raw_score cscore`.
pub fn read_cscores(path: &str) -> anyhow::Result<Vec<ScoredPair>> {
    log::info!("Import {}", path);

    let mut pairs = vec![];
    for record in crate::libs::io::data_lines(path)? {
        let (line_no, fields) = record?;
        if fields.len() != 4 {
            return Err(SyntenyError::parse(
                path,
                line_no,
                format!("expected 4 fields, found {}", fields.len()),
            )
            .into());
        }
        pairs.push(ScoredPair {
            raw_score: parse_score(path, line_no, &fields[2])?,
            cscore: parse_score(path, line_no, &fields[3])?,
            gene_a: fields[0].clone(),
            gene_b: fields[1].clone(),
        });
    }

    Ok(pairs)
}

pub fn write_cscores(writer: &mut dyn Write, pairs: &[ScoredPair]) -> anyhow::Result<()> {
    for pair in pairs {
        writeln!(writer, "{}", pair.to_line())?;
    }
    Ok(())
}
